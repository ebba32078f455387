//! The operation-service contract (spec §6): the storage/query/aggregation
//! engine the core forwards every data-plane request to, once identifiers are
//! validated and the body is decoded. Out of scope for the core itself —
//! this module only defines the boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use doc_context::RequestContext;
use doc_wire::{AggregationQuery, StructuredQuery, Value};

use crate::model::DocumentId;

pub use crate::model::DocumentRecord;

/// The classified shape every downstream failure collapses to (spec §7
/// propagation policy): a typed "not found" maps to 404, "conflict" to 409,
/// "unauthorized"/"forbidden" to 401/403, everything else to 500 with a
/// `*_failed` code. The human message may carry the downstream detail; the
/// machine code never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    NotFound,
    Conflict,
    Unauthorized,
    Forbidden,
    Failed(String),
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationError::NotFound => write!(f, "not found"),
            OperationError::Conflict => write!(f, "conflict"),
            OperationError::Unauthorized => write!(f, "unauthorized"),
            OperationError::Forbidden => write!(f, "forbidden"),
            OperationError::Failed(detail) => write!(f, "failed: {detail}"),
        }
    }
}

impl std::error::Error for OperationError {}

#[derive(Debug, Clone)]
pub struct CreateDocumentRequest {
    pub organization_id: String,
    pub project_id: String,
    pub database_id: String,
    pub collection_id: String,
    /// Caller-supplied document id; `None` asks the service to mint one.
    pub document_id: Option<String>,
    pub fields: IndexMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct UpdateDocumentRequest {
    pub document: DocumentId,
    pub fields: IndexMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct ListDocumentsRequest {
    pub organization_id: String,
    pub project_id: String,
    pub database_id: String,
    pub collection_id: String,
    pub page_size: u32,
    pub page_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListDocumentsResponse {
    pub documents: Vec<DocumentRecord>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunQueryRequest {
    pub organization_id: String,
    pub project_id: String,
    pub database_id: String,
    pub query: StructuredQuery,
}

#[derive(Debug, Clone)]
pub struct RunAggregationQueryRequest {
    pub organization_id: String,
    pub project_id: String,
    pub database_id: String,
    pub query: AggregationQuery,
}

/// One row of an aggregation result: the group-by key values (if any) plus
/// one value per requested aggregation alias.
#[derive(Debug, Clone)]
pub struct AggregationRow {
    pub values: IndexMap<String, Value>,
}

#[derive(Debug, Clone)]
pub enum AtomicTransformRequest {
    Increment {
        document: DocumentId,
        field: String,
        amount: Value,
    },
    ArrayUnion {
        document: DocumentId,
        field: String,
        elements: Vec<Value>,
    },
    ArrayRemove {
        document: DocumentId,
        field: String,
        elements: Vec<Value>,
    },
    ServerTimestamp {
        document: DocumentId,
        field: String,
    },
}

/// Result of an atomic transform (spec §8 S1): the field's new value after
/// the mutation, e.g. the post-increment number.
#[derive(Debug, Clone)]
pub struct AtomicTransformResult {
    pub new_value: Value,
}

#[derive(Debug, Clone)]
pub struct BeginTransactionRequest {
    pub organization_id: String,
    pub project_id: String,
}

#[derive(Debug, Clone)]
pub struct CommitTransactionRequest {
    pub organization_id: String,
    pub project_id: String,
    pub transaction: String,
}

#[derive(Debug, Clone)]
pub struct CommitTransactionResponse {
    /// Set by the storage layer at commit time, never by the request
    /// (spec §9: commit timestamp is the collaborator's, not a stub literal).
    pub commit_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub organization_id: String,
    pub project_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct CreateProjectRequest {
    pub organization_id: String,
    pub project_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseRecord {
    pub organization_id: String,
    pub project_id: String,
    pub database_id: String,
}

#[derive(Debug, Clone)]
pub struct CreateDatabaseRequest {
    pub organization_id: String,
    pub project_id: String,
    pub database_id: String,
}

/// The storage engine, query/aggregation executor, and transaction manager,
/// viewed as one collaborator contract (spec §6). Every method takes the
/// already-validated request context so the implementation can scope or
/// audit the call without re-deriving the tenant triple.
#[async_trait]
pub trait OperationService: Send + Sync {
    async fn create_document(
        &self,
        req: CreateDocumentRequest,
        ctx: &RequestContext,
    ) -> Result<DocumentRecord, OperationError>;

    async fn get_document(
        &self,
        id: &DocumentId,
        ctx: &RequestContext,
    ) -> Result<DocumentRecord, OperationError>;

    async fn update_document(
        &self,
        req: UpdateDocumentRequest,
        ctx: &RequestContext,
    ) -> Result<DocumentRecord, OperationError>;

    async fn delete_document(
        &self,
        id: &DocumentId,
        ctx: &RequestContext,
    ) -> Result<(), OperationError>;

    async fn list_documents(
        &self,
        req: ListDocumentsRequest,
        ctx: &RequestContext,
    ) -> Result<ListDocumentsResponse, OperationError>;

    async fn run_query(
        &self,
        req: RunQueryRequest,
        ctx: &RequestContext,
    ) -> Result<Vec<DocumentRecord>, OperationError>;

    async fn run_aggregation_query(
        &self,
        req: RunAggregationQueryRequest,
        ctx: &RequestContext,
    ) -> Result<Vec<AggregationRow>, OperationError>;

    async fn apply_atomic_transform(
        &self,
        req: AtomicTransformRequest,
        ctx: &RequestContext,
    ) -> Result<AtomicTransformResult, OperationError>;

    async fn begin_transaction(
        &self,
        req: BeginTransactionRequest,
        ctx: &RequestContext,
    ) -> Result<String, OperationError>;

    async fn commit_transaction(
        &self,
        req: CommitTransactionRequest,
        ctx: &RequestContext,
    ) -> Result<CommitTransactionResponse, OperationError>;

    async fn create_project(
        &self,
        req: CreateProjectRequest,
        ctx: &RequestContext,
    ) -> Result<ProjectRecord, OperationError>;

    async fn get_project(
        &self,
        organization_id: &str,
        project_id: &str,
        ctx: &RequestContext,
    ) -> Result<ProjectRecord, OperationError>;

    async fn delete_project(
        &self,
        organization_id: &str,
        project_id: &str,
        ctx: &RequestContext,
    ) -> Result<(), OperationError>;

    async fn list_projects(
        &self,
        organization_id: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<ProjectRecord>, OperationError>;

    async fn create_database(
        &self,
        req: CreateDatabaseRequest,
        ctx: &RequestContext,
    ) -> Result<DatabaseRecord, OperationError>;

    async fn get_database(
        &self,
        organization_id: &str,
        project_id: &str,
        database_id: &str,
        ctx: &RequestContext,
    ) -> Result<DatabaseRecord, OperationError>;

    async fn delete_database(
        &self,
        organization_id: &str,
        project_id: &str,
        database_id: &str,
        ctx: &RequestContext,
    ) -> Result<(), OperationError>;

    async fn list_databases(
        &self,
        organization_id: &str,
        project_id: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<DatabaseRecord>, OperationError>;
}
