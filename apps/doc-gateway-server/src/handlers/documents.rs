//! Document & collection handlers (spec §4.F). Each handler: pulls
//! identifiers from path parameters (enforcing the required-identifier
//! matrix), decodes the body via the wire codec, authorizes the call with
//! the security evaluator, invokes the operation service, and maps the
//! result back to the wire shape.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use doc_collab::model::DocumentId;
use doc_collab::{
    AtomicTransformRequest, BeginTransactionRequest, CommitTransactionRequest, CreateDatabaseRequest,
    CreateDocumentRequest, CreateProjectRequest, ListDocumentsRequest, Operation, OperationError,
    ResourcePath, RunAggregationQueryRequest, RunQueryRequest, UpdateDocumentRequest,
};
use doc_context::RequestContext;
use doc_identifiers::validate_path_segment;
use doc_wire::{
    decode_array_remove, decode_array_union, decode_increment, decode_run_aggregation_query_request,
    decode_run_query_request, decode_server_timestamp, decode_typed_value, detect_query_shape, encode_document,
    encode_raw, AtomicTransform, DocumentEnvelope, QueryBodyShape, Value as WireValue,
};
use gateway_errors::taxonomy;

use crate::state::AppState;
use crate::wire_errors::{map_operation_error, GatewayError};

fn tenant_triple(ctx: &RequestContext) -> Result<(String, String, String), GatewayError> {
    Ok((
        ctx.organization_id()?.to_owned(),
        ctx.project_id()?.to_owned(),
        ctx.database_id()?.to_owned(),
    ))
}

fn require_collection_id(collection_id: &str) -> Result<(), GatewayError> {
    validate_path_segment("collection", collection_id)
        .map_err(|_| GatewayError::from_def(taxonomy::MISSING_COLLECTION_ID, "a valid collectionId path segment is required"))
}

/// Invokes the security evaluator collaborator for the authenticated subject
/// (spec §6 "Collaborator interfaces"). The auth gate guarantees a subject is
/// present on every route this is reachable from; a missing subject here is
/// itself a contract bug, surfaced the same way a missing context value is.
async fn authorize(
    state: &AppState,
    ctx: &RequestContext,
    resource: String,
    operation: Operation,
) -> Result<(), GatewayError> {
    let subject = ctx
        .subject()
        .ok_or_else(|| GatewayError::from_def(taxonomy::AUTHENTICATION_REQUIRED, "no authenticated subject on context"))?;
    state
        .security
        .check(subject, &ResourcePath(resource), operation, ctx)
        .await?;
    Ok(())
}

fn to_envelope(doc: doc_collab::DocumentRecord) -> DocumentEnvelope {
    DocumentEnvelope {
        name: doc.name,
        fields: doc.fields,
        create_time: doc.create_time,
        update_time: doc.update_time,
    }
}

fn decode_fields(body: &JsonValue) -> Result<IndexMap<String, WireValue>, GatewayError> {
    let fields = body
        .get("fields")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| GatewayError::from_def(taxonomy::INVALID_REQUEST_BODY, "'fields' object is required"))?;
    let mut out = IndexMap::with_capacity(fields.len());
    for (k, v) in fields {
        out.insert(k.clone(), decode_typed_value(v).map_err(GatewayError::from)?);
    }
    Ok(out)
}

/// Creates the project and/or database record on first use if either is
/// absent, subject to the organization's quota (SPEC_FULL §4.M): the
/// distilled spec names "create project"/"create database" as the enforced
/// operations but exposes no standalone lifecycle endpoints for them, so the
/// boundary the core owns is the first document write under a given
/// project/database pair.
async fn ensure_project_and_database(
    state: &AppState,
    ctx: &RequestContext,
    organization_id: &str,
    project_id: &str,
    database_id: &str,
) -> Result<(), GatewayError> {
    match state.operations.get_project(organization_id, project_id, ctx).await {
        Ok(_) => {}
        Err(OperationError::NotFound) => {
            let org = state
                .organizations
                .get(organization_id)
                .await
                .map_err(|e| crate::wire_errors::map_organization_error(e, taxonomy::CREATE_FAILED))?;
            if org.usage.projects >= org.quotas.max_projects {
                return Err(GatewayError::from_def(taxonomy::QUOTA_EXCEEDED, "organization project quota exceeded"));
            }
            state
                .operations
                .create_project(
                    CreateProjectRequest {
                        organization_id: organization_id.to_owned(),
                        project_id: project_id.to_owned(),
                        display_name: project_id.to_owned(),
                    },
                    ctx,
                )
                .await
                .map_err(|e| {
                    map_operation_error(e, taxonomy::PROJECT_NOT_FOUND, taxonomy::DOCUMENT_ALREADY_EXISTS, taxonomy::CREATE_FAILED)
                })?;
        }
        Err(e) => {
            return Err(map_operation_error(
                e,
                taxonomy::PROJECT_NOT_FOUND,
                taxonomy::DOCUMENT_ALREADY_EXISTS,
                taxonomy::CREATE_FAILED,
            ))
        }
    }

    match state.operations.get_database(organization_id, project_id, database_id, ctx).await {
        Ok(_) => {}
        Err(OperationError::NotFound) => {
            let org = state
                .organizations
                .get(organization_id)
                .await
                .map_err(|e| crate::wire_errors::map_organization_error(e, taxonomy::CREATE_FAILED))?;
            if org.usage.databases >= org.quotas.max_databases {
                return Err(GatewayError::from_def(taxonomy::QUOTA_EXCEEDED, "organization database quota exceeded"));
            }
            state
                .operations
                .create_database(
                    CreateDatabaseRequest {
                        organization_id: organization_id.to_owned(),
                        project_id: project_id.to_owned(),
                        database_id: database_id.to_owned(),
                    },
                    ctx,
                )
                .await
                .map_err(|e| {
                    map_operation_error(e, taxonomy::PROJECT_NOT_FOUND, taxonomy::DOCUMENT_ALREADY_EXISTS, taxonomy::CREATE_FAILED)
                })?;
        }
        Err(e) => {
            return Err(map_operation_error(
                e,
                taxonomy::PROJECT_NOT_FOUND,
                taxonomy::DOCUMENT_ALREADY_EXISTS,
                taxonomy::CREATE_FAILED,
            ))
        }
    }
    Ok(())
}

pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Path(collection_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<JsonValue>,
) -> Result<Response, GatewayError> {
    require_collection_id(&collection_id)?;
    let (organization_id, project_id, database_id) = tenant_triple(&ctx)?;
    ensure_project_and_database(&state, &ctx, &organization_id, &project_id, &database_id).await?;

    let resource = format!("organizations/{organization_id}/projects/{project_id}/databases/{database_id}/documents/{collection_id}");
    authorize(&state, &ctx, resource, Operation::Create).await?;

    let fields = decode_fields(&body)?;
    let document_id = params.get("documentId").cloned();

    let record = state
        .operations
        .create_document(
            CreateDocumentRequest {
                organization_id,
                project_id,
                database_id,
                collection_id,
                document_id,
                fields,
            },
            &ctx,
        )
        .await
        .map_err(|e| {
            map_operation_error(e, taxonomy::DOCUMENT_NOT_FOUND, taxonomy::DOCUMENT_ALREADY_EXISTS, taxonomy::CREATE_FAILED)
        })?;

    Ok((StatusCode::CREATED, Json(encode_document(&to_envelope(record)))).into_response())
}

fn build_document_id(ctx: &RequestContext, collection_id: String, document_id: String) -> Result<DocumentId, GatewayError> {
    let (organization_id, project_id, database_id) = tenant_triple(ctx)?;
    Ok(DocumentId {
        organization_id,
        project_id,
        database_id,
        collection_id,
        document_id,
    })
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Path((collection_id, document_id)): Path<(String, String)>,
) -> Result<Response, GatewayError> {
    require_collection_id(&collection_id)?;
    let id = build_document_id(&ctx, collection_id, document_id)?;
    authorize(&state, &ctx, id.resource_name(), Operation::Read).await?;

    let record = state
        .operations
        .get_document(&id, &ctx)
        .await
        .map_err(|e| map_operation_error(e, taxonomy::DOCUMENT_NOT_FOUND, taxonomy::DOCUMENT_ALREADY_EXISTS, taxonomy::QUERY_FAILED))?;

    Ok(Json(encode_document(&to_envelope(record))).into_response())
}

pub async fn update_document(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Path((collection_id, document_id)): Path<(String, String)>,
    Json(body): Json<JsonValue>,
) -> Result<Response, GatewayError> {
    require_collection_id(&collection_id)?;
    let id = build_document_id(&ctx, collection_id, document_id)?;
    authorize(&state, &ctx, id.resource_name(), Operation::Update).await?;
    let fields = decode_fields(&body)?;

    let record = state
        .operations
        .update_document(UpdateDocumentRequest { document: id, fields }, &ctx)
        .await
        .map_err(|e| map_operation_error(e, taxonomy::DOCUMENT_NOT_FOUND, taxonomy::DOCUMENT_ALREADY_EXISTS, taxonomy::UPDATE_FAILED))?;

    Ok(Json(encode_document(&to_envelope(record))).into_response())
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Path((collection_id, document_id)): Path<(String, String)>,
) -> Result<Response, GatewayError> {
    require_collection_id(&collection_id)?;
    let id = build_document_id(&ctx, collection_id, document_id)?;
    authorize(&state, &ctx, id.resource_name(), Operation::Delete).await?;

    state
        .operations
        .delete_document(&id, &ctx)
        .await
        .map_err(|e| map_operation_error(e, taxonomy::DOCUMENT_NOT_FOUND, taxonomy::DOCUMENT_ALREADY_EXISTS, taxonomy::DELETE_FAILED))?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Path(collection_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, GatewayError> {
    require_collection_id(&collection_id)?;
    let (organization_id, project_id, database_id) = tenant_triple(&ctx)?;
    let resource = format!("organizations/{organization_id}/projects/{project_id}/databases/{database_id}/documents/{collection_id}");
    authorize(&state, &ctx, resource, Operation::Read).await?;

    let page_size = state.config.clamp_page_size(params.get("pageSize").and_then(|s| s.parse().ok()));
    let page_token = params.get("pageToken").cloned();

    let resp = state
        .operations
        .list_documents(
            ListDocumentsRequest {
                organization_id,
                project_id,
                database_id,
                collection_id,
                page_size,
                page_token,
            },
            &ctx,
        )
        .await
        .map_err(|e| map_operation_error(e, taxonomy::DOCUMENT_NOT_FOUND, taxonomy::DOCUMENT_ALREADY_EXISTS, taxonomy::LIST_FAILED))?;

    let documents: Vec<JsonValue> = resp.documents.into_iter().map(|d| encode_document(&to_envelope(d))).collect();
    Ok(Json(serde_json::json!({
        "documents": documents,
        "nextPageToken": resp.next_page_token,
    }))
    .into_response())
}

pub async fn run_query(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Json(body): Json<JsonValue>,
) -> Result<Response, GatewayError> {
    let (organization_id, project_id, database_id) = tenant_triple(&ctx)?;
    let resource = format!("organizations/{organization_id}/projects/{project_id}/databases/{database_id}/documents");
    authorize(&state, &ctx, resource, Operation::Query).await?;

    // Routed strictly by URL verb (never by body shape, spec §9 "Dynamic
    // dispatch"); this is the post-routing body-shape check spec §4.E and
    // §8 S4/property #7 require: an aggregation-shaped or dual-shaped body
    // posted to `:runQuery` is rejected before the operation service is
    // ever invoked.
    match detect_query_shape(&body) {
        QueryBodyShape::AggregationQuery | QueryBodyShape::Both => {
            return Err(GatewayError::from_def(
                taxonomy::INVALID_REQUEST_BODY,
                "'structuredQuery' request body must not carry 'structuredAggregationQuery'",
            ));
        }
        QueryBodyShape::Query | QueryBodyShape::Neither => {}
    }

    let query = decode_run_query_request(&body)?;
    let results = state
        .operations
        .run_query(
            RunQueryRequest { organization_id, project_id, database_id, query },
            &ctx,
        )
        .await
        .map_err(|e| map_operation_error(e, taxonomy::DOCUMENT_NOT_FOUND, taxonomy::DOCUMENT_ALREADY_EXISTS, taxonomy::QUERY_FAILED))?;

    let documents: Vec<JsonValue> = results.into_iter().map(|d| encode_document(&to_envelope(d))).collect();
    Ok(Json(serde_json::json!({ "documents": documents })).into_response())
}

pub async fn run_aggregation_query(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Json(body): Json<JsonValue>,
) -> Result<Response, GatewayError> {
    let (organization_id, project_id, database_id) = tenant_triple(&ctx)?;
    let resource = format!("organizations/{organization_id}/projects/{project_id}/databases/{database_id}/documents");
    authorize(&state, &ctx, resource, Operation::Query).await?;

    match detect_query_shape(&body) {
        QueryBodyShape::Query | QueryBodyShape::Both => {
            return Err(GatewayError::from_def(
                taxonomy::INVALID_REQUEST_BODY,
                "'structuredAggregationQuery' request body must not carry 'structuredQuery'",
            ));
        }
        QueryBodyShape::AggregationQuery | QueryBodyShape::Neither => {}
    }

    let query = decode_run_aggregation_query_request(&body)?;
    let rows = state
        .operations
        .run_aggregation_query(
            RunAggregationQueryRequest { organization_id, project_id, database_id, query },
            &ctx,
        )
        .await
        .map_err(|e| map_operation_error(e, taxonomy::DOCUMENT_NOT_FOUND, taxonomy::DOCUMENT_ALREADY_EXISTS, taxonomy::AGGREGATION_FAILED))?;

    let encoded: Vec<JsonValue> = rows
        .into_iter()
        .map(|row| {
            let mut map = serde_json::Map::with_capacity(row.values.len());
            for (k, v) in row.values {
                map.insert(k, encode_raw(&v));
            }
            JsonValue::Object(map)
        })
        .collect();
    Ok(Json(serde_json::json!({ "result": encoded })).into_response())
}

async fn run_atomic_transform(
    state: &AppState,
    ctx: &RequestContext,
    collection_id: String,
    document_id_str: String,
    transform: AtomicTransform,
    failed: gateway_errors::ErrDef,
) -> Result<Response, GatewayError> {
    require_collection_id(&collection_id)?;
    let id = build_document_id(ctx, collection_id, document_id_str)?;
    authorize(state, ctx, id.resource_name(), Operation::Update).await?;

    let request = match transform {
        AtomicTransform::Increment { field, amount } => AtomicTransformRequest::Increment { document: id, field, amount },
        AtomicTransform::ArrayUnion { field, elements } => AtomicTransformRequest::ArrayUnion { document: id, field, elements },
        AtomicTransform::ArrayRemove { field, elements } => AtomicTransformRequest::ArrayRemove { document: id, field, elements },
        AtomicTransform::ServerTimestamp { field } => AtomicTransformRequest::ServerTimestamp { document: id, field },
    };

    let result = state
        .operations
        .apply_atomic_transform(request, ctx)
        .await
        .map_err(|e| map_operation_error(e, taxonomy::DOCUMENT_NOT_FOUND, taxonomy::DOCUMENT_ALREADY_EXISTS, failed))?;

    Ok(Json(serde_json::json!({ "newValue": encode_raw(&result.new_value) })).into_response())
}

pub async fn atomic_increment(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Path((collection_id, document_id)): Path<(String, String)>,
    Json(body): Json<JsonValue>,
) -> Result<Response, GatewayError> {
    let transform = decode_increment(&body)?;
    run_atomic_transform(&state, &ctx, collection_id, document_id, transform, taxonomy::ATOMIC_INCREMENT_FAILED).await
}

pub async fn atomic_array_union(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Path((collection_id, document_id)): Path<(String, String)>,
    Json(body): Json<JsonValue>,
) -> Result<Response, GatewayError> {
    let transform = decode_array_union(&body)?;
    run_atomic_transform(&state, &ctx, collection_id, document_id, transform, taxonomy::ATOMIC_ARRAY_UNION_FAILED).await
}

pub async fn atomic_array_remove(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Path((collection_id, document_id)): Path<(String, String)>,
    Json(body): Json<JsonValue>,
) -> Result<Response, GatewayError> {
    let transform = decode_array_remove(&body)?;
    run_atomic_transform(&state, &ctx, collection_id, document_id, transform, taxonomy::ATOMIC_ARRAY_REMOVE_FAILED).await
}

pub async fn atomic_server_timestamp(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Path((collection_id, document_id)): Path<(String, String)>,
    Json(body): Json<JsonValue>,
) -> Result<Response, GatewayError> {
    let transform = decode_server_timestamp(&body)?;
    run_atomic_transform(&state, &ctx, collection_id, document_id, transform, taxonomy::ATOMIC_SERVER_TIMESTAMP_FAILED).await
}

pub async fn begin_transaction(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<Arc<RequestContext>>,
) -> Result<Response, GatewayError> {
    let organization_id = ctx.organization_id()?.to_owned();
    let project_id = ctx.project_id()?.to_owned();
    let resource = format!("organizations/{organization_id}/projects/{project_id}");
    authorize(&state, &ctx, resource, Operation::Update).await?;

    let token = state
        .operations
        .begin_transaction(BeginTransactionRequest { organization_id, project_id }, &ctx)
        .await
        .map_err(|e| map_operation_error(e, taxonomy::PROJECT_NOT_FOUND, taxonomy::DOCUMENT_ALREADY_EXISTS, taxonomy::CREATE_FAILED))?;

    Ok(Json(serde_json::json!({ "transaction": token })).into_response())
}

pub async fn commit_transaction(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Json(body): Json<JsonValue>,
) -> Result<Response, GatewayError> {
    let organization_id = ctx.organization_id()?.to_owned();
    let project_id = ctx.project_id()?.to_owned();
    let resource = format!("organizations/{organization_id}/projects/{project_id}");
    authorize(&state, &ctx, resource, Operation::Update).await?;

    let transaction = body
        .get("transaction")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| GatewayError::from_def(taxonomy::MISSING_FIELD, "'transaction' is required"))?
        .to_owned();

    let resp = state
        .operations
        .commit_transaction(CommitTransactionRequest { organization_id, project_id, transaction }, &ctx)
        .await
        .map_err(|e| map_operation_error(e, taxonomy::PROJECT_NOT_FOUND, taxonomy::DOCUMENT_ALREADY_EXISTS, taxonomy::UPDATE_FAILED))?;

    Ok(Json(serde_json::json!({
        "commitTime": resp.commit_time.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true),
    }))
    .into_response())
}
