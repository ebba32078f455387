//! Per-endpoint metrics/log labels (spec §4.H: "increment request counter
//! keyed by endpoint label").
//!
//! `axum::extract::MatchedPath` is populated during inner route dispatch, by
//! which point an outer `Router::layer()` middleware has already handed the
//! request to `next.run(req)` and lost the chance to read it back out before
//! the response is produced. The teacher's ingress module hits the same wall
//! for its route-policy lookup and works around it with a standalone
//! `matchit::Router` built once at startup from the same path templates
//! (`api_ingress::auth::RouteMatcher`, `convert_axum_path_to_matchit`); this
//! does the same, built directly in matchit's own `{param}` syntax since we
//! target matchit and axum 0.8 — both already the same syntax.

use std::sync::OnceLock;

use matchit::Router as MatchRouter;

/// `(path template, label)`. Order doesn't matter; matchit resolves by
/// specificity. Literal colon-verb segments (`documents:runQuery`) are plain
/// static segments to matchit, same as to axum.
const ROUTES: &[(&str, &str)] = &[
    ("/v1/organizations", "listOrCreateOrganizations"),
    ("/v1/organizations/{organizationId}", "getUpdateDeleteOrganization"),
    ("/v1/organizations/{organizationId}/usage", "organizationUsage"),
    (
        "/v1/organizations/{organizationId}/projects/{projectId}/databases/{databaseId}/documents/{collectionId}",
        "createOrListDocuments",
    ),
    (
        "/v1/organizations/{organizationId}/projects/{projectId}/databases/{databaseId}/documents/{collectionId}/{documentId}",
        "getUpdateDeleteDocument",
    ),
    (
        "/v1/organizations/{organizationId}/projects/{projectId}/databases/{databaseId}/documents:runQuery",
        "runQuery",
    ),
    (
        "/v1/organizations/{organizationId}/projects/{projectId}/databases/{databaseId}/documents:runAggregationQuery",
        "runAggregationQuery",
    ),
    (
        "/v1/organizations/{organizationId}/projects/{projectId}/databases/{databaseId}/documents:beginTransaction",
        "beginTransaction",
    ),
    (
        "/v1/organizations/{organizationId}/projects/{projectId}/databases/{databaseId}/documents:commit",
        "commitTransaction",
    ),
    (
        "/v1/organizations/{organizationId}/projects/{projectId}/databases/{databaseId}/documents/{collectionId}/{documentId}:atomicIncrement",
        "atomicIncrement",
    ),
    (
        "/v1/organizations/{organizationId}/projects/{projectId}/databases/{databaseId}/documents/{collectionId}/{documentId}:atomicArrayUnion",
        "atomicArrayUnion",
    ),
    (
        "/v1/organizations/{organizationId}/projects/{projectId}/databases/{databaseId}/documents/{collectionId}/{documentId}:atomicArrayRemove",
        "atomicArrayRemove",
    ),
    (
        "/v1/organizations/{organizationId}/projects/{projectId}/databases/{databaseId}/documents/{collectionId}/{documentId}:atomicServerTimestamp",
        "atomicServerTimestamp",
    ),
    ("/v1/firestore/projects/{projectId}/databases/{databaseId}/documents/{collectionId}", "createOrListDocuments"),
    (
        "/v1/firestore/projects/{projectId}/databases/{databaseId}/documents/{collectionId}/{documentId}",
        "getUpdateDeleteDocument",
    ),
    ("/v1/firestore/projects/{projectId}/databases/{databaseId}/documents:runQuery", "runQuery"),
    (
        "/v1/firestore/projects/{projectId}/databases/{databaseId}/documents:runAggregationQuery",
        "runAggregationQuery",
    ),
    ("/v1/firestore/projects/{projectId}/databases/{databaseId}/documents:beginTransaction", "beginTransaction"),
    ("/v1/firestore/projects/{projectId}/databases/{databaseId}/documents:commit", "commitTransaction"),
    (
        "/v1/firestore/projects/{projectId}/databases/{databaseId}/documents/{collectionId}/{documentId}:atomicIncrement",
        "atomicIncrement",
    ),
    (
        "/v1/firestore/projects/{projectId}/databases/{databaseId}/documents/{collectionId}/{documentId}:atomicArrayUnion",
        "atomicArrayUnion",
    ),
    (
        "/v1/firestore/projects/{projectId}/databases/{databaseId}/documents/{collectionId}/{documentId}:atomicArrayRemove",
        "atomicArrayRemove",
    ),
    (
        "/v1/firestore/projects/{projectId}/databases/{databaseId}/documents/{collectionId}/{documentId}:atomicServerTimestamp",
        "atomicServerTimestamp",
    ),
    ("/healthz", "health"),
];

fn build_router() -> MatchRouter<&'static str> {
    let mut router = MatchRouter::new();
    for (pattern, label) in ROUTES {
        // Duplicate inserts (the org-scoped and header-fallback trees sharing
        // a label) are expected; matchit only rejects conflicting captures on
        // the exact same pattern, which never happens here.
        let _ = router.insert(*pattern, *label);
    }
    router
}

static LABEL_ROUTER: OnceLock<MatchRouter<&'static str>> = OnceLock::new();

/// Resolve the metrics/log label for a request path, falling back to the raw
/// path when it matches nothing in the table (still useful as a label, just
/// not aggregated across differing ids).
pub fn endpoint_label(path: &str) -> &'static str {
    let router = LABEL_ROUTER.get_or_init(build_router);
    router.at(path).map(|m| *m.value).unwrap_or("unmatched")
}
