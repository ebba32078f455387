//! Authentication gate (spec §4.E): extracts a bearer token from one of
//! three sources, forwards it to the [`doc_collab::AuthClient`] collaborator,
//! and records the authenticated [`doc_context::Subject`] on the request
//! context. Applied only to the route groups the router layers it onto
//! (queries, writes, admin) — never to the health endpoint.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use doc_context::RequestContext;
use gateway_errors::taxonomy;
use uuid::Uuid;

use crate::state::AppState;

/// `observe` (the logging layer) wraps every route one level further out
/// than the auth gate and runs first, so it has usually already created the
/// request's context by the time this runs; this falls back to creating one
/// itself — with the same `root_cancellation`-derived token (spec §5) — for
/// any route that for some reason isn't wrapped in `observe`.
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

/// `Authorization: Bearer <token>` header, stripping the organization-id
/// suffix the tenant middleware reads from the same header (spec §4.C
/// source 3) if present.
fn token_from_bearer_header(req: &Request) -> Option<String> {
    let header = req.headers().get(http::header::AUTHORIZATION)?.to_str().ok()?;
    let raw = header.strip_prefix("Bearer ")?;
    match raw.rsplit_once('@') {
        Some((token, org_suffix)) if !org_suffix.is_empty() => Some(token.to_owned()),
        _ => Some(raw.to_owned()),
    }
}

fn token_from_cookie(req: &Request) -> Option<String> {
    let header = req.headers().get(http::header::COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == "auth_token").then(|| value.to_owned())
    })
}

fn token_from_query(req: &Request) -> Option<String> {
    let query = req.uri().query()?;
    url_decode_pairs(query).find_map(|(k, v)| (k == "access_token").then_some(v))
}

fn url_decode_pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    query.split('&').filter_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        Some((k.to_owned(), v.replace('+', " ")))
    })
}

/// Extracts the caller's token from (a) the `Authorization: Bearer` header,
/// (b) an auth cookie, (c) an `access_token` query parameter — spec §4.E
/// order. Validates it against the auth collaborator and records the
/// resulting [`Subject`] on the request context before continuing.
pub async fn auth_gate(State(state): State<Arc<AppState>>, mut req: Request, next: Next) -> Response {
    let ctx = ensure_context(&state, &mut req);

    let token = token_from_bearer_header(&req)
        .or_else(|| token_from_cookie(&req))
        .or_else(|| token_from_query(&req));

    let Some(token) = token else {
        return taxonomy::AUTHENTICATION_REQUIRED
            .as_api_error("no authentication token present in header, cookie, or query parameter")
            .into_response();
    };

    match state.auth.validate(&token, &ctx).await {
        Ok(subject) => {
            ctx.set_subject(subject);
            next.run(req).await
        }
        Err(_) => taxonomy::INVALID_AUTHENTICATION_TOKEN
            .as_api_error("authentication token was rejected")
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    fn req_with_header(name: &str, value: &str) -> Request {
        HttpRequest::builder()
            .uri("/v1/organizations/org-abc/projects/p/databases/(default)/documents:runQuery")
            .header(name, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn bearer_header_strips_org_suffix() {
        let req = req_with_header("authorization", "Bearer tok123@org-abc");
        assert_eq!(token_from_bearer_header(&req), Some("tok123".to_owned()));
    }

    #[test]
    fn bearer_header_without_org_suffix_is_used_whole() {
        let req = req_with_header("authorization", "Bearer tok123");
        assert_eq!(token_from_bearer_header(&req), Some("tok123".to_owned()));
    }

    #[test]
    fn cookie_token_is_extracted_by_name() {
        let req = req_with_header("cookie", "session=abc; auth_token=tok999; other=1");
        assert_eq!(token_from_cookie(&req), Some("tok999".to_owned()));
    }

    #[test]
    fn query_token_is_extracted() {
        let req = HttpRequest::builder()
            .uri("/v1/organizations/org-abc/projects/p/databases/(default)/documents:runQuery?access_token=tokq")
            .body(Body::empty())
            .unwrap();
        assert_eq!(token_from_query(&req), Some("tokq".to_owned()));
    }
}
