//! Source-by-source identifier extraction (spec §4.C).

use std::collections::HashMap;

use axum::extract::{Query, RawPathParams};
use axum::extract::FromRequestParts;
use http::request::Parts;

fn path_param(params: &RawPathParams, name: &str) -> Option<String> {
    params
        .iter()
        .find(|(key, _)| key.as_ref() == name)
        .map(|(_, value)| value.as_str().to_owned())
}

async fn raw_path_params(parts: &mut Parts) -> RawPathParams {
    RawPathParams::from_request_parts(parts, &())
        .await
        .unwrap_or_else(|_| RawPathParams::default())
}

async fn query_params(parts: &mut Parts) -> HashMap<String, String> {
    Query::<HashMap<String, String>>::from_request_parts(parts, &())
        .await
        .map(|Query(map)| map)
        .unwrap_or_default()
}

/// `Authorization: Bearer <token>@<orgId>` suffix, split on the last `@`
/// (spec §4.C source 3).
fn organization_id_from_bearer_suffix(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    let (_, org_id) = token.rsplit_once('@')?;
    if org_id.is_empty() {
        None
    } else {
        Some(org_id.to_owned())
    }
}

/// Organization-ID resolution order (spec §4.C), first non-empty wins:
/// 1. URL path segment `organizationId`.
/// 2. Header `X-Organization-ID`.
/// 3. `Authorization: Bearer <token>@<orgId>` suffix.
/// 4. Query parameter `organization_id`.
pub async fn resolve_organization_id(parts: &mut Parts) -> Option<String> {
    let params = raw_path_params(parts).await;
    if let Some(id) = path_param(&params, "organizationId").filter(|s| !s.is_empty()) {
        return Some(id);
    }
    if let Some(id) = parts
        .headers
        .get("X-Organization-ID")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
    {
        return Some(id.to_owned());
    }
    if let Some(id) = organization_id_from_bearer_suffix(parts) {
        return Some(id);
    }
    let query = query_params(parts).await;
    query
        .get("organization_id")
        .filter(|s| !s.is_empty())
        .cloned()
}

pub async fn resolve_project_id(parts: &mut Parts) -> Option<String> {
    let params = raw_path_params(parts).await;
    path_param(&params, "projectId").filter(|s| !s.is_empty())
}

pub async fn resolve_database_id(parts: &mut Parts) -> Option<String> {
    let params = raw_path_params(parts).await;
    path_param(&params, "databaseId").filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, Request};

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/v1/documents:runQuery");
        for (k, v) in headers {
            builder = builder.header(*k, HeaderValue::from_str(v).unwrap());
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn bearer_suffix_yields_org_id() {
        let mut parts = parts_with_headers(&[("authorization", "Bearer abc123@org-xyz")]);
        assert_eq!(
            resolve_organization_id(&mut parts).await,
            Some("org-xyz".to_owned())
        );
    }

    #[tokio::test]
    async fn header_takes_priority_over_bearer_suffix() {
        let mut parts = parts_with_headers(&[
            ("x-organization-id", "org-from-header"),
            ("authorization", "Bearer abc123@org-from-token"),
        ]);
        assert_eq!(
            resolve_organization_id(&mut parts).await,
            Some("org-from-header".to_owned())
        );
    }

    #[tokio::test]
    async fn no_source_present_yields_none() {
        let mut parts = parts_with_headers(&[]);
        assert_eq!(resolve_organization_id(&mut parts).await, None);
    }
}
