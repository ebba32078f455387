//! End-to-end exercises of the concrete scenarios (spec §8 S1-S6), driven
//! through the assembled router with `tower::ServiceExt::oneshot` — no real
//! network socket, same in-process pattern the tenant-gateway middleware
//! tests use.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{empty_req, json_req, send, test_router};

const ORG_URL: &str = "/v1/organizations";

async fn create_org(router: &axum::Router, org_id: &str) {
    let (status, _) = send(
        router,
        json_req(
            "POST",
            ORG_URL,
            Some("admin-token"),
            json!({
                "organizationId": org_id,
                "displayName": "Scenario Org",
                "billingEmail": "owner@example.com",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

/// S1 Atomic increment: a document that already carries `count: 40` is
/// incremented by 2 and returns `{"newValue": 42}`.
#[tokio::test]
async fn s1_atomic_increment() {
    let router = test_router();
    create_org(&router, "org-abc").await;

    let create_doc_url =
        "/v1/organizations/org-abc/projects/proj-one/databases/db-one/documents/counters?documentId=c1";
    let (status, _) = send(
        &router,
        json_req("POST", create_doc_url, Some("t"), json!({"fields": {"count": {"integerValue": 40}}})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let increment_url =
        "/v1/organizations/org-abc/projects/proj-one/databases/db-one/documents/counters/c1:atomicIncrement";
    let (status, body) = send(
        &router,
        json_req("POST", increment_url, Some("t"), json!({"field": "count", "incrementBy": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"newValue": 42}));
}

/// S2 Missing field: an increment body without `field` is rejected before
/// any document lookup happens.
#[tokio::test]
async fn s2_missing_field() {
    let router = test_router();
    create_org(&router, "org-abc").await;

    let increment_url =
        "/v1/organizations/org-abc/projects/proj-one/databases/db-one/documents/counters/c1:atomicIncrement";
    let (status, body) =
        send(&router, json_req("POST", increment_url, Some("t"), json!({"incrementBy": 2}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("missing_field"));
}

/// S3 Invalid org id: a path segment too short for the identifier rules is
/// rejected by the tenant middleware before the handler runs.
#[tokio::test]
async fn s3_invalid_org_id() {
    let router = test_router();
    let url = "/v1/organizations/x/projects/proj-one/databases/db-one/documents/counters";
    let (status, body) = send(&router, empty_req("GET", url, Some("t"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("invalid_organization_id"));
}

/// S4 Query routing disambiguation: an aggregation-shaped body posted to
/// `:runQuery` is rejected without ever reaching the operation service.
#[tokio::test]
async fn s4_query_routing_disambiguation() {
    let router = test_router();
    create_org(&router, "org-abc").await;

    let url = "/v1/organizations/org-abc/projects/proj-one/databases/db-one/documents:runQuery";
    let body = json!({
        "structuredAggregationQuery": {
            "structuredQuery": {"from": [{"collectionId": "counters"}]},
            "aggregations": [{"alias": "count_all", "count": {}}],
        }
    });
    let (status, resp) = send(&router, json_req("POST", url, Some("t"), body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"], json!("invalid_request_body"));
}

/// S5 Organization lifecycle: create, read, partial update (billing email
/// unchanged), delete, then a 404 on the next read.
#[tokio::test]
async fn s5_organization_lifecycle() {
    let router = test_router();
    let (status, created) = send(
        &router,
        json_req(
            "POST",
            ORG_URL,
            Some("t"),
            json!({
                "organizationId": "lifecycle-test-org",
                "displayName": "X",
                "billingEmail": "b@x",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["displayName"], json!("X"));

    let get_url = format!("{ORG_URL}/lifecycle-test-org");
    let (status, fetched) = send(&router, empty_req("GET", &get_url, Some("t"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["organizationId"], json!("lifecycle-test-org"));

    let (status, updated) =
        send(&router, json_req("PUT", &get_url, Some("t"), json!({"displayName": "Y"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["displayName"], json!("Y"));
    assert_eq!(updated["billingEmail"], json!("b@x"));

    let (status, _) = send(&router, empty_req("DELETE", &get_url, Some("t"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, not_found) = send(&router, empty_req("GET", &get_url, Some("t"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(not_found["error"], json!("organization_not_found"));
}

/// S6 Typed value round trip, at the codec boundary the dispatcher relies on.
#[test]
fn s6_typed_value_round_trip() {
    let wire = json!({"arrayValue":{"values":[
        {"stringValue":"a"},
        {"integerValue":"42"},
        {"booleanValue":true}
    ]}});
    let decoded = doc_wire::decode_typed_value(&wire).unwrap();
    assert_eq!(
        decoded,
        doc_wire::Value::Array(vec![
            doc_wire::Value::String("a".into()),
            doc_wire::Value::Integer(42),
            doc_wire::Value::Bool(true),
        ])
    );
    assert_eq!(doc_wire::encode_typed_value(&decoded), wire);
}
