//! The HTTP-boundary mapping from every collaborator/codec error type this
//! binary sees to the spec §7 taxonomy (SPEC_FULL §4.K). [`GatewayError`] is
//! the one error type every handler returns; it implements
//! `axum::response::IntoResponse` directly, the way the teacher's `Problem`
//! does, so handlers can simply propagate with `?`.

use axum::response::{IntoResponse, Response};

use doc_collab::{AuthError, OperationError, OrganizationError, SecurityError};
use doc_context::ContextError;
use doc_identifiers::ValidationError;
use doc_wire::WireError;
use gateway_errors::{taxonomy, ApiError, ErrDef};

#[derive(Debug, Clone)]
pub struct GatewayError(pub ApiError);

impl GatewayError {
    pub fn from_def(def: ErrDef, detail: impl Into<String>) -> Self {
        Self(def.as_api_error(detail))
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.code, self.0.message)
    }
}

impl std::error::Error for GatewayError {}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

impl From<ApiError> for GatewayError {
    fn from(e: ApiError) -> Self {
        Self(e)
    }
}

impl From<WireError> for GatewayError {
    fn from(e: WireError) -> Self {
        let def = match e.code() {
            "missing_field" => taxonomy::MISSING_FIELD,
            "missing_elements" => taxonomy::MISSING_ELEMENTS,
            "missing_increment_by" => taxonomy::MISSING_INCREMENT_BY,
            "invalid_operator" => taxonomy::INVALID_OPERATOR,
            "missing_structured_aggregation_query" => taxonomy::MISSING_STRUCTURED_AGGREGATION_QUERY,
            "missing_aggregations" => taxonomy::MISSING_AGGREGATIONS,
            "invalid_aggregation_format" => taxonomy::INVALID_AGGREGATION_FORMAT,
            _ => taxonomy::INVALID_REQUEST_BODY,
        };
        Self(def.as_api_error(e.detail()))
    }
}

impl From<ContextError> for GatewayError {
    fn from(e: ContextError) -> Self {
        Self(taxonomy::CONTEXT_ERROR.as_api_error(e.to_string()))
    }
}

impl From<ValidationError> for GatewayError {
    fn from(e: ValidationError) -> Self {
        let def = match e.code {
            "invalid_organization_id" => taxonomy::INVALID_ORGANIZATION_ID,
            "invalid_project_id" => taxonomy::INVALID_PROJECT_ID,
            "invalid_database_id" => taxonomy::INVALID_DATABASE_ID,
            _ => taxonomy::MISSING_COLLECTION_ID,
        };
        Self(def.as_api_error(e.message))
    }
}

impl From<AuthError> for GatewayError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidToken => {
                Self(taxonomy::INVALID_AUTHENTICATION_TOKEN.as_api_error("invalid authentication token"))
            }
            AuthError::Unavailable(detail) => Self(taxonomy::AUTHENTICATION_REQUIRED.as_api_error(detail)),
        }
    }
}

impl From<SecurityError> for GatewayError {
    fn from(e: SecurityError) -> Self {
        match e {
            SecurityError::Unauthorized => Self(taxonomy::UNAUTHORIZED.as_api_error("unauthorized")),
            SecurityError::Forbidden => Self(taxonomy::FORBIDDEN.as_api_error("forbidden")),
        }
    }
}

/// Maps a classified [`OperationError`] to the taxonomy (spec §7 propagation
/// policy), letting each call site supply the entity-specific "not found"
/// and "failed" codes (e.g. `DOCUMENT_NOT_FOUND`/`CREATE_FAILED` for document
/// create, `PROJECT_NOT_FOUND`/`UPDATE_FAILED` for a project update).
pub fn map_operation_error(err: OperationError, not_found: ErrDef, conflict: ErrDef, failed: ErrDef) -> GatewayError {
    match err {
        OperationError::NotFound => GatewayError::from_def(not_found, "the requested resource was not found"),
        OperationError::Conflict => GatewayError::from_def(conflict, "the resource already exists"),
        OperationError::Unauthorized => GatewayError::from_def(taxonomy::UNAUTHORIZED, "unauthorized"),
        OperationError::Forbidden => GatewayError::from_def(taxonomy::FORBIDDEN, "forbidden"),
        OperationError::Failed(detail) => GatewayError::from_def(failed, detail),
    }
}

/// Maps an [`OrganizationError`] to the taxonomy, parameterized by the
/// "failed" code for the call site (organization CRUD reuses the generic
/// `create_failed`/`update_failed`/`delete_failed`/`list_failed` codes).
pub fn map_organization_error(err: OrganizationError, failed: ErrDef) -> GatewayError {
    match err {
        OrganizationError::NotFound => {
            GatewayError::from_def(taxonomy::ORGANIZATION_NOT_FOUND, "organization not found")
        }
        OrganizationError::AlreadyExists => {
            GatewayError::from_def(taxonomy::ORGANIZATION_ALREADY_EXISTS, "organization already exists")
        }
        OrganizationError::Failed(detail) => GatewayError::from_def(failed, detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_not_found_maps_to_supplied_def() {
        let err = map_operation_error(
            OperationError::NotFound,
            taxonomy::DOCUMENT_NOT_FOUND,
            taxonomy::DOCUMENT_ALREADY_EXISTS,
            taxonomy::CREATE_FAILED,
        );
        assert_eq!(err.0.code, "document_not_found");
        assert_eq!(err.0.status.as_u16(), 404);
    }

    #[test]
    fn operation_failed_carries_the_detail_message() {
        let err = map_operation_error(
            OperationError::Failed("disk full".into()),
            taxonomy::DOCUMENT_NOT_FOUND,
            taxonomy::DOCUMENT_ALREADY_EXISTS,
            taxonomy::CREATE_FAILED,
        );
        assert_eq!(err.0.code, "create_failed");
        assert_eq!(err.0.message, "disk full");
    }

    #[test]
    fn wire_error_missing_field_maps_to_missing_field_code() {
        let err: GatewayError = WireError::MissingField("field".into()).into();
        assert_eq!(err.0.code, "missing_field");
    }
}
