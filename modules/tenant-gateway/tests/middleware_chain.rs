//! End-to-end exercises of the tenant-hierarchy middleware chain against a
//! real axum `Router`, covering spec §4.C's four organization-id sources,
//! the missing/invalid-id rejections (spec §7, testable properties #1-#3),
//! and idempotent re-entrancy.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Extension;
use axum::http::{Request, StatusCode};
use axum::middleware::{from_fn, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use doc_context::RequestContext;
use tenant_gateway::{database_middleware, organization_middleware, project_middleware};

async fn echo_ids(Extension(ctx): Extension<Arc<RequestContext>>) -> String {
    format!(
        "{}/{}/{}",
        ctx.organization_id_opt().unwrap_or("-"),
        ctx.project_id_opt().unwrap_or("-"),
        ctx.database_id_opt().unwrap_or("-"),
    )
}

fn full_router() -> Router {
    Router::new()
        .route(
            "/organizations/{organizationId}/projects/{projectId}/databases/{databaseId}/documents",
            get(echo_ids),
        )
        .layer(from_fn(database_middleware))
        .layer(from_fn(project_middleware))
        .layer(from_fn(organization_middleware))
}

async fn body_text(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn resolves_full_triple_from_path_params() {
    let resp = full_router()
        .oneshot(
            Request::builder()
                .uri("/organizations/org-abc/projects/proj-123456/databases/db-xyz/documents")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "org-abc/proj-123456/db-xyz");
}

#[tokio::test]
async fn default_database_segment_is_accepted() {
    let resp = full_router()
        .oneshot(
            Request::builder()
                .uri("/organizations/org-abc/projects/proj-123456/databases/(default)/documents")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "org-abc/proj-123456/(default)");
}

#[tokio::test]
async fn header_fallback_path_resolves_organization_from_header() {
    let router = Router::new()
        .route(
            "/firestore/projects/{projectId}/databases/{databaseId}/documents",
            get(echo_ids),
        )
        .layer(from_fn(database_middleware))
        .layer(from_fn(project_middleware))
        .layer(from_fn(organization_middleware));

    let resp = router
        .oneshot(
            Request::builder()
                .uri("/firestore/projects/proj-123456/databases/(default)/documents")
                .header("X-Organization-ID", "org-from-header")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "org-from-header/proj-123456/(default)");
}

#[tokio::test]
async fn missing_organization_id_is_rejected_with_wire_shaped_body() {
    let router = Router::new()
        .route("/firestore/projects/{projectId}/databases/{databaseId}/documents", get(echo_ids))
        .layer(from_fn(organization_middleware));

    let resp = router
        .oneshot(
            Request::builder()
                .uri("/firestore/projects/proj-123456/databases/(default)/documents")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let text = body_text(resp).await;
    assert!(text.contains("\"missing_organization_id\""));
}

#[tokio::test]
async fn malformed_organization_id_is_rejected() {
    let resp = full_router()
        .oneshot(
            Request::builder()
                .uri("/organizations/x/projects/proj-123456/databases/(default)/documents")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let text = body_text(resp).await;
    assert!(text.contains("\"invalid_organization_id\""));
}

#[tokio::test]
async fn missing_project_id_is_rejected() {
    let router = Router::new()
        .route("/organizations/{organizationId}/documents", get(echo_ids))
        .layer(from_fn(project_middleware))
        .layer(from_fn(organization_middleware));

    let resp = router
        .oneshot(
            Request::builder()
                .uri("/organizations/org-abc/documents")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(resp).await.contains("\"missing_project\""));
}

/// Re-entrancy: a layer that pre-seeds the context must not be overwritten
/// by a later middleware in the chain (spec §4.C idempotence requirement).
#[tokio::test]
async fn preseeded_context_is_not_overwritten() {
    async fn seed(mut req: Request<Body>, next: Next) -> Response {
        let ctx = Arc::new(RequestContext::new("fixed-correlation-id"));
        ctx.set_organization_id("org-preseeded");
        req.extensions_mut().insert(ctx);
        next.run(req).await
    }

    let router = Router::new()
        .route(
            "/organizations/{organizationId}/projects/{projectId}/databases/{databaseId}/documents",
            get(echo_ids),
        )
        .layer(from_fn(database_middleware))
        .layer(from_fn(project_middleware))
        .layer(from_fn(organization_middleware))
        .layer(from_fn(seed));

    let resp = router
        .oneshot(
            Request::builder()
                .uri("/organizations/org-real/projects/proj-123456/databases/(default)/documents")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "org-preseeded/proj-123456/(default)");
}
