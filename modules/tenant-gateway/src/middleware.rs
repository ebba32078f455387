//! The tenant & hierarchy middleware chain (spec §4.C): populates the
//! tenant triple in the request context before any handler runs. Each layer
//! is idempotent — re-invocation on an already-populated context is a no-op,
//! never an overwrite (mirrors [`doc_context::RequestContext`]'s own
//! single-shot write semantics).

use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use doc_identifiers::IdentifierRules;
use gateway_errors::taxonomy;
use uuid::Uuid;

use doc_context::RequestContext;

use crate::resolve::{resolve_database_id, resolve_organization_id, resolve_project_id};

/// Fetch the request's context, creating and inserting one on first touch.
/// Subsequent middleware layers in the same request see the same instance.
fn ensure_context(req: &mut Request) -> Arc<RequestContext> {
    if let Some(ctx) = req.extensions().get::<Arc<RequestContext>>() {
        return ctx.clone();
    }
    let ctx = Arc::new(RequestContext::new(Uuid::new_v4().to_string()));
    req.extensions_mut().insert(ctx.clone());
    ctx
}

/// Organization middleware (spec §4.C). Idempotent: if the context already
/// carries an organization id, this layer does not re-resolve or touch it.
pub async fn organization_middleware(mut req: Request, next: Next) -> Response {
    let ctx = ensure_context(&mut req);
    if ctx.organization_id_opt().is_some() {
        return next.run(req).await;
    }

    let (mut parts, body) = req.into_parts();
    let organization_id = resolve_organization_id(&mut parts).await;
    let req = Request::from_parts(parts, body);

    let Some(organization_id) = organization_id else {
        return taxonomy::MISSING_ORGANIZATION_ID
            .as_api_error("no organization id found in path, header, token, or query")
            .into_response();
    };

    if let Err(e) =
        doc_identifiers::validate_organization_id(&organization_id, &IdentifierRules::default())
    {
        return taxonomy::INVALID_ORGANIZATION_ID
            .as_api_error(e.message)
            .into_response();
    }

    ctx.set_organization_id(organization_id);
    next.run(req).await
}

/// Project middleware (spec §4.C): requires the `projectId` path parameter.
pub async fn project_middleware(mut req: Request, next: Next) -> Response {
    let ctx = ensure_context(&mut req);
    if ctx.project_id_opt().is_some() {
        return next.run(req).await;
    }

    let (mut parts, body) = req.into_parts();
    let project_id = resolve_project_id(&mut parts).await;
    let req = Request::from_parts(parts, body);

    let Some(project_id) = project_id else {
        return taxonomy::MISSING_PROJECT
            .as_api_error("no 'projectId' path parameter present")
            .into_response();
    };

    if let Err(e) = doc_identifiers::validate_project_id(&project_id, &IdentifierRules::default()) {
        return taxonomy::INVALID_PROJECT_ID
            .as_api_error(e.message)
            .into_response();
    }

    ctx.set_project_id(project_id);
    next.run(req).await
}

/// Database middleware (spec §4.C): requires the `databaseId` path parameter.
pub async fn database_middleware(mut req: Request, next: Next) -> Response {
    let ctx = ensure_context(&mut req);
    if ctx.database_id_opt().is_some() {
        return next.run(req).await;
    }

    let (mut parts, body) = req.into_parts();
    let database_id = resolve_database_id(&mut parts).await;
    let req = Request::from_parts(parts, body);

    let Some(database_id) = database_id else {
        return taxonomy::MISSING_DATABASE
            .as_api_error("no 'databaseId' path parameter present")
            .into_response();
    };

    if let Err(e) = doc_identifiers::validate_database_id(&database_id, &IdentifierRules::default())
    {
        return taxonomy::INVALID_DATABASE_ID
            .as_api_error(e.message)
            .into_response();
    }

    ctx.set_database_id(database_id);
    next.run(req).await
}
