//! The machine-code taxonomy for the document gateway (spec §7).
//!
//! Each constant is a pure [`ErrDef`] — status, title, machine code — with no
//! knowledge of HTTP framework types beyond `http::StatusCode`. Handlers call
//! `TAXONOMY_CONST.as_problem(detail)` to get a [`Problem`] ready to return.

use crate::catalog::ErrDef;
use http::StatusCode;

macro_rules! err_def {
    ($name:ident, $status:expr, $title:literal, $code:literal) => {
        pub const $name: ErrDef = ErrDef {
            status: $status,
            title: $title,
            code: $code,
            type_url: concat!("https://errors.doc-gateway.internal/", $code),
        };
    };
}

// --- request shape / missing input (400) ---
err_def!(INVALID_REQUEST_BODY, 400, "Invalid request body", "invalid_request_body");
err_def!(MISSING_FIELD, 400, "Missing field", "missing_field");
err_def!(MISSING_ELEMENTS, 400, "Missing elements", "missing_elements");
err_def!(MISSING_INCREMENT_BY, 400, "Missing incrementBy", "missing_increment_by");
err_def!(MISSING_ORGANIZATION_ID, 400, "Missing organization id", "missing_organization_id");
err_def!(MISSING_PROJECT, 400, "Missing project id", "missing_project");
err_def!(MISSING_COLLECTION_ID, 400, "Missing collection id", "missing_collection_id");
err_def!(MISSING_DATABASE, 400, "Missing database id", "missing_database");

// --- format violations (400) ---
err_def!(INVALID_ORGANIZATION_ID, 400, "Invalid organization id", "invalid_organization_id");
err_def!(INVALID_PROJECT_ID, 400, "Invalid project id", "invalid_project_id");
err_def!(INVALID_DATABASE_ID, 400, "Invalid database id", "invalid_database_id");

// --- query-layer validation (400) ---
err_def!(
    MISSING_STRUCTURED_AGGREGATION_QUERY,
    400,
    "Missing structuredAggregationQuery",
    "missing_structured_aggregation_query"
);
err_def!(MISSING_AGGREGATIONS, 400, "Missing aggregations", "missing_aggregations");
err_def!(INVALID_AGGREGATION_FORMAT, 400, "Invalid aggregation format", "invalid_aggregation_format");
err_def!(INVALID_OPERATOR, 400, "Invalid operator", "invalid_operator");

// --- auth (401) ---
err_def!(AUTHENTICATION_REQUIRED, 401, "Authentication required", "authentication_required");
err_def!(INVALID_AUTHENTICATION_TOKEN, 401, "Invalid authentication token", "invalid_authentication_token");

// --- policy (401/403) ---
err_def!(UNAUTHORIZED, 401, "Unauthorized", "unauthorized");
err_def!(FORBIDDEN, 403, "Forbidden", "forbidden");

// --- lookup (404) ---
err_def!(DOCUMENT_NOT_FOUND, 404, "Document not found", "document_not_found");
err_def!(ORGANIZATION_NOT_FOUND, 404, "Organization not found", "organization_not_found");
err_def!(PROJECT_NOT_FOUND, 404, "Project not found", "project_not_found");

// --- conflict (409) ---
err_def!(DOCUMENT_ALREADY_EXISTS, 409, "Document already exists", "document_already_exists");
err_def!(ORGANIZATION_ALREADY_EXISTS, 409, "Organization already exists", "organization_already_exists");
err_def!(QUOTA_EXCEEDED, 409, "Organization quota exceeded", "quota_exceeded");

// --- downstream / internal (500) ---
err_def!(CONTEXT_ERROR, 500, "Internal context error", "context_error");
err_def!(ATOMIC_INCREMENT_FAILED, 500, "Atomic increment failed", "atomic_increment_failed");
err_def!(ATOMIC_ARRAY_UNION_FAILED, 500, "Atomic array union failed", "atomic_array_union_failed");
err_def!(ATOMIC_ARRAY_REMOVE_FAILED, 500, "Atomic array remove failed", "atomic_array_remove_failed");
err_def!(ATOMIC_SERVER_TIMESTAMP_FAILED, 500, "Atomic server timestamp failed", "atomic_server_timestamp_failed");
err_def!(CREATE_FAILED, 500, "Create failed", "create_failed");
err_def!(UPDATE_FAILED, 500, "Update failed", "update_failed");
err_def!(DELETE_FAILED, 500, "Delete failed", "delete_failed");
err_def!(LIST_FAILED, 500, "List failed", "list_failed");
err_def!(QUERY_FAILED, 500, "Query failed", "query_failed");
err_def!(AGGREGATION_FAILED, 500, "Aggregation failed", "aggregation_failed");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_def_carries_a_valid_status() {
        for def in [
            INVALID_REQUEST_BODY,
            MISSING_ORGANIZATION_ID,
            INVALID_ORGANIZATION_ID,
            AUTHENTICATION_REQUIRED,
            FORBIDDEN,
            DOCUMENT_NOT_FOUND,
            DOCUMENT_ALREADY_EXISTS,
            CONTEXT_ERROR,
        ] {
            assert!(StatusCode::from_u16(def.status).is_ok());
        }
    }

    #[test]
    fn as_problem_carries_the_machine_code() {
        let p = MISSING_FIELD.as_problem("field \"field\" is required");
        assert_eq!(p.code, "missing_field");
        assert_eq!(p.status, StatusCode::BAD_REQUEST);
    }
}
