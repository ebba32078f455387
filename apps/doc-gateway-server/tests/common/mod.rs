//! Shared test scaffolding: build a router wired to fresh in-memory
//! collaborators, and small helpers for driving it with `tower::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use doc_collab::memory::{
    InMemoryAuthClient, InMemoryOperationService, InMemoryOrganizationRepository,
    PermissiveSecurityEvaluator,
};
use doc_gateway_server::config::GatewayConfig;
use doc_gateway_server::router::build_router;
use doc_gateway_server::state::AppState;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

#[allow(dead_code)]
pub fn test_router() -> Router {
    let state = Arc::new(AppState::new(
        Arc::new(GatewayConfig::default()),
        Arc::new(InMemoryOperationService::new()),
        Arc::new(InMemoryAuthClient::new()),
        Arc::new(PermissiveSecurityEvaluator::new()),
        Arc::new(InMemoryOrganizationRepository::new()),
    ));
    build_router(state)
}

#[allow(dead_code)]
pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp: Response<Body> = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[allow(dead_code)]
pub fn json_req(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub fn empty_req(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}
