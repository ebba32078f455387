//! Per-request observability (spec §4.H, SPEC_FULL §4.J): one structured
//! log line per request plus the metrics recording the health view reads
//! back. Applied as the outermost layer so it sees the final response
//! status regardless of which inner layer produced it.
//!
//! State machine per spec §4.H: `received → authenticated → hierarchy-
//! validated → body-decoded → executed → encoded → logged`. This layer only
//! instruments the two ends of that chain (`received` and `logged`); the
//! intermediate states are implicit in which layer rejected the request.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use doc_context::RequestContext;
use tracing::{field, Instrument};
use uuid::Uuid;

use crate::labels::endpoint_label;
use crate::state::AppState;

/// Fetches or creates the request's context. Cloning the `Arc` before moving
/// `req` into `next.run()` keeps a live handle on the same
/// [`doc_context::RequestContext`] instance the downstream middleware chain
/// populates — its `OnceLock` fields are readable through this handle once
/// `next.run()` returns, even though the `Request` itself was consumed.
///
/// `observe` is the outermost layer on every route (it sees the final
/// response status regardless of which inner layer produced it), so it runs
/// before `auth_gate` and is therefore where a request's context — and its
/// cancellation token, a child of `AppState::root_cancellation` (spec §5) —
/// actually first comes into being; `auth_gate`'s own `ensure_context` just
/// finds it already present and reuses it.
fn ensure_context(state: &AppState, req: &mut Request) -> Arc<RequestContext> {
    if let Some(ctx) = req.extensions().get::<Arc<RequestContext>>() {
        return ctx.clone();
    }
    let ctx = Arc::new(RequestContext::with_cancellation(
        Uuid::new_v4().to_string(),
        state.root_cancellation.clone(),
    ));
    req.extensions_mut().insert(ctx.clone());
    ctx
}

pub async fn observe(State(state): State<Arc<AppState>>, mut req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let ctx = ensure_context(&state, &mut req);
    let endpoint = endpoint_label(&path);
    let body_size_hint = req
        .headers()
        .get(http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    let span = tracing::info_span!(
        "request",
        method = %method,
        path = %path,
        endpoint,
        org_id = field::Empty,
        project_id = field::Empty,
        database_id = field::Empty,
        request_id = field::Empty,
    );

    let start = Instant::now();
    let response = next.run(req).instrument(span.clone()).await;
    let duration = start.elapsed();
    let status = response.status().as_u16();

    span.record("org_id", ctx.organization_id_opt().unwrap_or("-"));
    span.record("project_id", ctx.project_id_opt().unwrap_or("-"));
    span.record("database_id", ctx.database_id_opt().unwrap_or("-"));
    span.record("request_id", ctx.correlation_id());

    state.metrics.record(endpoint, duration, status);

    let response_size = response
        .headers()
        .get(http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(body_size_hint);

    tracing::info!(
        target: "request",
        method = %method,
        path = %path,
        endpoint,
        duration_ms = duration.as_millis() as u64,
        status,
        body_size = response_size,
        "request handled"
    );

    response
}
