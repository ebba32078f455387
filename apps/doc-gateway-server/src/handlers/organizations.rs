//! Organization admin handlers (spec §4.G): CRUD, admin-email-filtered list,
//! and the usage view. These routes read `organizationId` as an ordinary
//! axum path parameter — they are the admin surface itself, not data-plane
//! traffic scoped by the tenant middleware, so they never go through
//! [`tenant_gateway`].

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::SecondsFormat;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use doc_collab::{
    CreateOrganizationRequest, ListOrganizationsRequest, Organization, OrganizationState, UpdateOrganizationRequest,
};
use gateway_errors::taxonomy;

use crate::state::AppState;
use crate::wire_errors::{map_organization_error, GatewayError};

fn encode_organization(org: &Organization) -> JsonValue {
    let state = match org.state {
        OrganizationState::Active => "active",
        OrganizationState::Suspended => "suspended",
        OrganizationState::Deleted => "deleted",
    };
    serde_json::json!({
        "organizationId": org.organization_id,
        "displayName": org.display_name,
        "billingEmail": org.billing_email,
        "adminEmails": org.admin_emails,
        "defaultLocation": org.default_location,
        "state": state,
        "createdTime": org.created_time.to_rfc3339_opts(SecondsFormat::Nanos, true),
        "updatedTime": org.updated_time.to_rfc3339_opts(SecondsFormat::Nanos, true),
        "projectCount": org.project_count,
        "usage": {
            "projects": org.usage.projects,
            "databases": org.usage.databases,
            "storageBytes": org.usage.storage_bytes,
        },
        "quotas": {
            "maxProjects": org.quotas.max_projects,
            "maxDatabases": org.quotas.max_databases,
            "maxStorageBytes": org.quotas.max_storage_bytes,
        },
    })
}

fn required_str(body: &JsonValue, key: &str) -> Result<String, GatewayError> {
    body.get(key)
        .and_then(JsonValue::as_str)
        .map(str::to_owned)
        .ok_or_else(|| GatewayError::from_def(taxonomy::MISSING_FIELD, format!("'{key}' is required")))
}

fn string_list(body: &JsonValue, key: &str) -> Vec<String> {
    body.get(key)
        .and_then(JsonValue::as_array)
        .map(|arr| arr.iter().filter_map(JsonValue::as_str).map(str::to_owned).collect())
        .unwrap_or_default()
}

pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    Json(body): Json<JsonValue>,
) -> Result<Response, GatewayError> {
    let req = CreateOrganizationRequest {
        organization_id: required_str(&body, "organizationId")?,
        display_name: required_str(&body, "displayName")?,
        billing_email: required_str(&body, "billingEmail")?,
        admin_emails: string_list(&body, "adminEmails"),
        default_location: body
            .get("defaultLocation")
            .and_then(JsonValue::as_str)
            .unwrap_or("us-central")
            .to_owned(),
    };

    let org = state
        .organizations
        .create(req)
        .await
        .map_err(|e| map_organization_error(e, taxonomy::CREATE_FAILED))?;

    Ok((StatusCode::CREATED, Json(encode_organization(&org))).into_response())
}

pub async fn get_organization(
    State(state): State<Arc<AppState>>,
    Path(organization_id): Path<String>,
) -> Result<Response, GatewayError> {
    let org = state
        .organizations
        .get(&organization_id)
        .await
        .map_err(|e| map_organization_error(e, taxonomy::LIST_FAILED))?;
    Ok(Json(encode_organization(&org)).into_response())
}

pub async fn update_organization(
    State(state): State<Arc<AppState>>,
    Path(organization_id): Path<String>,
    Json(body): Json<JsonValue>,
) -> Result<Response, GatewayError> {
    let req = UpdateOrganizationRequest {
        display_name: body.get("displayName").and_then(JsonValue::as_str).map(str::to_owned),
        billing_email: body.get("billingEmail").and_then(JsonValue::as_str).map(str::to_owned),
        admin_emails: body.get("adminEmails").map(|_| string_list(&body, "adminEmails")),
        default_location: body.get("defaultLocation").and_then(JsonValue::as_str).map(str::to_owned),
    };

    let org = state
        .organizations
        .update(&organization_id, req)
        .await
        .map_err(|e| map_organization_error(e, taxonomy::UPDATE_FAILED))?;
    Ok(Json(encode_organization(&org)).into_response())
}

pub async fn delete_organization(
    State(state): State<Arc<AppState>>,
    Path(organization_id): Path<String>,
) -> Result<Response, GatewayError> {
    state
        .organizations
        .delete(&organization_id)
        .await
        .map_err(|e| map_organization_error(e, taxonomy::DELETE_FAILED))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn list_organizations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, GatewayError> {
    let page_size = state.config.clamp_org_page_size(params.get("pageSize").and_then(|s| s.parse().ok()));
    let offset = params.get("offset").and_then(|s| s.parse::<i64>().ok()).filter(|v| *v >= 0).unwrap_or(0) as u32;
    let admin_email = params.get("admin_email").cloned();

    let resp = state
        .organizations
        .list(ListOrganizationsRequest { page_size, offset, admin_email })
        .await
        .map_err(|e| map_organization_error(e, taxonomy::LIST_FAILED))?;

    let organizations: Vec<JsonValue> = resp.organizations.iter().map(encode_organization).collect();
    Ok(Json(serde_json::json!({ "organizations": organizations, "total": resp.total })).into_response())
}

pub async fn get_organization_usage(
    State(state): State<Arc<AppState>>,
    Path(organization_id): Path<String>,
) -> Result<Response, GatewayError> {
    let org = state
        .organizations
        .get(&organization_id)
        .await
        .map_err(|e| map_organization_error(e, taxonomy::LIST_FAILED))?;

    Ok(Json(serde_json::json!({
        "projects": org.usage.projects,
        "databases": org.usage.databases,
        "storageBytes": org.usage.storage_bytes,
        "quotas": {
            "maxProjects": org.quotas.max_projects,
            "maxDatabases": org.quotas.max_databases,
            "maxStorageBytes": org.quotas.max_storage_bytes,
        },
    }))
    .into_response())
}
