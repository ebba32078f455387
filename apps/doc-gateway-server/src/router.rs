//! Route table assembly (spec §4.E, §6 "URL surface"). Two data-plane trees
//! — org-scoped (preferred) and the `/firestore/projects/` header-fallback
//! form — share one route table and middleware stack; only the mount prefix
//! differs, which is exactly what drives [`tenant_gateway`]'s organization-id
//! resolution order (path segment first, header/token/query otherwise).

use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use tenant_gateway::{database_middleware, organization_middleware, project_middleware};

use crate::auth::auth_gate;
use crate::handlers::{documents, health, organizations};
use crate::logging::observe;
use crate::state::AppState;

fn document_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/documents/{collectionId}",
            post(documents::create_document).get(documents::list_documents),
        )
        .route(
            "/documents/{collectionId}/{documentId}",
            get(documents::get_document)
                .put(documents::update_document)
                .patch(documents::update_document)
                .delete(documents::delete_document),
        )
        .route("/documents:runQuery", post(documents::run_query))
        .route("/documents:runAggregationQuery", post(documents::run_aggregation_query))
        .route("/documents:beginTransaction", post(documents::begin_transaction))
        .route("/documents:commit", post(documents::commit_transaction))
        .route(
            "/documents/{collectionId}/{documentId}:atomicIncrement",
            post(documents::atomic_increment),
        )
        .route(
            "/documents/{collectionId}/{documentId}:atomicArrayUnion",
            post(documents::atomic_array_union),
        )
        .route(
            "/documents/{collectionId}/{documentId}:atomicArrayRemove",
            post(documents::atomic_array_remove),
        )
        .route(
            "/documents/{collectionId}/{documentId}:atomicServerTimestamp",
            post(documents::atomic_server_timestamp),
        )
}

/// Layers the tenant-hierarchy chain (spec §4.C) under the authentication
/// gate (spec §4.E) — request order is auth first, then organization,
/// project, database, matching the `.layer()` stacking order the tenant
/// middleware's own tests use (outermost `.layer()` call runs first).
fn with_tenant_stack(router: Router<Arc<AppState>>, state: Arc<AppState>) -> Router<Arc<AppState>> {
    router
        .layer(from_fn(database_middleware))
        .layer(from_fn(project_middleware))
        .layer(from_fn(organization_middleware))
        .layer(from_fn_with_state(state, auth_gate))
}

fn organization_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/organizations",
            post(organizations::create_organization).get(organizations::list_organizations),
        )
        .route(
            "/organizations/{organizationId}",
            get(organizations::get_organization)
                .put(organizations::update_organization)
                .delete(organizations::delete_organization),
        )
        .route("/organizations/{organizationId}/usage", get(organizations::get_organization_usage))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let org_scoped = with_tenant_stack(document_routes(), state.clone());
    let header_fallback = with_tenant_stack(document_routes(), state.clone());
    let admin = organization_routes().layer(from_fn_with_state(state.clone(), auth_gate));

    Router::new()
        .nest(
            "/v1/organizations/{organizationId}/projects/{projectId}/databases/{databaseId}",
            org_scoped,
        )
        .nest("/v1/firestore/projects/{projectId}/databases/{databaseId}", header_fallback)
        .nest("/v1", admin)
        .route("/healthz", get(health::health))
        .layer(from_fn_with_state(state.clone(), observe))
        .layer(RequestBodyLimitLayer::new(state.config.request_body_limit_bytes))
        .with_state(state)
}
