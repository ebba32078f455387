//! In-memory reference implementations of the four collaborator traits.
//!
//! These are a reference/test double, not a product feature: the real
//! storage engine, query executor, auth provider, security-rules evaluator,
//! and organization repository are deployment-specific and live outside this
//! crate. What's here exists so the dispatcher and handlers can be exercised
//! end-to-end in tests without a real backend, the way the teacher's
//! `tenant-resolver`'s `local_client.rs` wraps an in-process `Service` behind
//! the same trait a remote implementation would satisfy.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::Mutex;

use doc_context::{RequestContext, Subject};
use doc_wire::{deep_eq, Filter, Operator, Value};

use crate::auth::{AuthClient, AuthError};
use crate::model::{DocumentId, DocumentRecord, Organization, OrganizationState, Quotas, UsageSnapshot};
use crate::operation::{
    AggregationRow, AtomicTransformRequest, AtomicTransformResult, BeginTransactionRequest,
    CommitTransactionRequest, CommitTransactionResponse, CreateDatabaseRequest,
    CreateDocumentRequest, CreateProjectRequest, DatabaseRecord, ListDocumentsRequest,
    ListDocumentsResponse, OperationError, OperationService, ProjectRecord,
    RunAggregationQueryRequest, RunQueryRequest, UpdateDocumentRequest,
};
use crate::organization::{
    CreateOrganizationRequest, ListOrganizationsRequest, ListOrganizationsResponse,
    OrganizationError, OrganizationRepository, UpdateOrganizationRequest,
};
use crate::security::{Operation, ResourcePath, SecurityEvaluator, SecurityError};

/// Cooperative check for every mutating collaborator call (spec §5
/// "Cancellation and timeouts"): a request whose context has already been
/// cancelled must not go on to produce an observable side effect. Read-only
/// calls don't need this — there's nothing to protect by refusing them.
fn check_cancelled(ctx: &RequestContext) -> Result<(), OperationError> {
    if ctx.is_cancelled() {
        return Err(OperationError::Failed("request cancelled".into()));
    }
    Ok(())
}

/// A single-process, non-persistent stand-in for the storage/query engine.
#[derive(Default)]
pub struct InMemoryOperationService {
    documents: DashMap<DocumentId, DocumentRecord>,
    projects: DashMap<(String, String), ProjectRecord>,
    databases: DashMap<(String, String, String), DatabaseRecord>,
    next_document_seq: AtomicU64,
    next_transaction_seq: AtomicU64,
}

impl InMemoryOperationService {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_document_id(&self) -> String {
        let n = self.next_document_seq.fetch_add(1, Ordering::Relaxed);
        format!("auto-{n}")
    }

    fn matches(doc: &DocumentRecord, filter: &Filter) -> bool {
        match filter {
            Filter::Field { field, op, value } => {
                let Some(actual) = doc.fields.get(field) else {
                    return false;
                };
                match op {
                    Operator::Eq => deep_eq(actual, value),
                    Operator::NotEq => !deep_eq(actual, value),
                    Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => {
                        match (actual.as_number(), value.as_number()) {
                            (Some(a), Some(b)) => {
                                let a = a.as_f64().unwrap_or_default();
                                let b = b.as_f64().unwrap_or_default();
                                match op {
                                    Operator::Lt => a < b,
                                    Operator::Lte => a <= b,
                                    Operator::Gt => a > b,
                                    Operator::Gte => a >= b,
                                    _ => unreachable!(),
                                }
                            }
                            _ => false,
                        }
                    }
                    Operator::ArrayContains => matches!(actual, Value::Array(items) if items.iter().any(|i| deep_eq(i, value))),
                    Operator::ArrayContainsAny => match (actual, value) {
                        (Value::Array(items), Value::Array(candidates)) => {
                            candidates.iter().any(|c| items.iter().any(|i| deep_eq(i, c)))
                        }
                        _ => false,
                    },
                    Operator::In => match value {
                        Value::Array(candidates) => candidates.iter().any(|c| deep_eq(actual, c)),
                        _ => false,
                    },
                    Operator::NotIn => match value {
                        Value::Array(candidates) => !candidates.iter().any(|c| deep_eq(actual, c)),
                        _ => true,
                    },
                }
            }
            Filter::Or(children) => children.iter().any(|c| Self::matches(doc, c)),
        }
    }
}

#[async_trait]
impl OperationService for InMemoryOperationService {
    async fn create_document(
        &self,
        req: CreateDocumentRequest,
        ctx: &RequestContext,
    ) -> Result<DocumentRecord, OperationError> {
        check_cancelled(ctx)?;
        let document_id = req.document_id.unwrap_or_else(|| self.mint_document_id());
        let id = DocumentId {
            organization_id: req.organization_id,
            project_id: req.project_id,
            database_id: req.database_id,
            collection_id: req.collection_id,
            document_id,
        };
        if self.documents.contains_key(&id) {
            return Err(OperationError::Conflict);
        }
        let now = Utc::now();
        let record = DocumentRecord {
            name: id.resource_name(),
            fields: req.fields,
            create_time: now,
            update_time: now,
        };
        self.documents.insert(id, record.clone());
        Ok(record)
    }

    async fn get_document(
        &self,
        id: &DocumentId,
        _ctx: &RequestContext,
    ) -> Result<DocumentRecord, OperationError> {
        self.documents
            .get(id)
            .map(|r| r.clone())
            .ok_or(OperationError::NotFound)
    }

    async fn update_document(
        &self,
        req: UpdateDocumentRequest,
        ctx: &RequestContext,
    ) -> Result<DocumentRecord, OperationError> {
        check_cancelled(ctx)?;
        let mut entry = self
            .documents
            .get_mut(&req.document)
            .ok_or(OperationError::NotFound)?;
        for (k, v) in req.fields {
            entry.fields.insert(k, v);
        }
        entry.update_time = Utc::now();
        Ok(entry.clone())
    }

    async fn delete_document(
        &self,
        id: &DocumentId,
        ctx: &RequestContext,
    ) -> Result<(), OperationError> {
        check_cancelled(ctx)?;
        self.documents
            .remove(id)
            .map(|_| ())
            .ok_or(OperationError::NotFound)
    }

    async fn list_documents(
        &self,
        req: ListDocumentsRequest,
        _ctx: &RequestContext,
    ) -> Result<ListDocumentsResponse, OperationError> {
        let mut matching: Vec<DocumentRecord> = self
            .documents
            .iter()
            .filter(|e| {
                let id = e.key();
                id.organization_id == req.organization_id
                    && id.project_id == req.project_id
                    && id.database_id == req.database_id
                    && id.collection_id == req.collection_id
            })
            .map(|e| e.value().clone())
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));

        let start = req
            .page_token
            .as_deref()
            .and_then(|t| t.parse::<usize>().ok())
            .unwrap_or(0);
        let page_size = req.page_size as usize;
        let page: Vec<DocumentRecord> = matching.iter().skip(start).take(page_size).cloned().collect();
        let next_page_token = if start + page.len() < matching.len() {
            Some((start + page.len()).to_string())
        } else {
            None
        };
        Ok(ListDocumentsResponse {
            documents: page,
            next_page_token,
        })
    }

    async fn run_query(
        &self,
        req: RunQueryRequest,
        _ctx: &RequestContext,
    ) -> Result<Vec<DocumentRecord>, OperationError> {
        let Some(selector) = req.query.from.first() else {
            return Ok(Vec::new());
        };
        let mut matching: Vec<DocumentRecord> = self
            .documents
            .iter()
            .filter(|e| {
                let id = e.key();
                id.organization_id == req.organization_id
                    && id.project_id == req.project_id
                    && id.database_id == req.database_id
                    && id.collection_id == selector.collection_id
            })
            .map(|e| e.value().clone())
            .filter(|doc| req.query.filters.iter().all(|f| Self::matches(doc, f)))
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(limit) = req.query.limit {
            matching.truncate(limit.max(0) as usize);
        }
        Ok(matching)
    }

    async fn run_aggregation_query(
        &self,
        req: RunAggregationQueryRequest,
        ctx: &RequestContext,
    ) -> Result<Vec<AggregationRow>, OperationError> {
        let rows = self
            .run_query(
                RunQueryRequest {
                    organization_id: req.organization_id,
                    project_id: req.project_id,
                    database_id: req.database_id,
                    query: req.query.structured_query,
                },
                ctx,
            )
            .await?;

        let mut values = IndexMap::new();
        for aggregation in &req.query.aggregations {
            let result = match &aggregation.kind {
                doc_wire::AggregationKind::Count => Value::Integer(rows.len() as i64),
                doc_wire::AggregationKind::Sum(field) => {
                    let sum: f64 = rows
                        .iter()
                        .filter_map(|d| d.fields.get(field).and_then(Value::as_number))
                        .filter_map(|n| n.as_f64())
                        .sum();
                    Value::Double(sum)
                }
                doc_wire::AggregationKind::Avg(field) => {
                    let nums: Vec<f64> = rows
                        .iter()
                        .filter_map(|d| d.fields.get(field).and_then(Value::as_number))
                        .filter_map(|n| n.as_f64())
                        .collect();
                    let avg = if nums.is_empty() {
                        0.0
                    } else {
                        nums.iter().sum::<f64>() / nums.len() as f64
                    };
                    Value::Double(avg)
                }
                doc_wire::AggregationKind::Min(field) => rows
                    .iter()
                    .filter_map(|d| d.fields.get(field).and_then(Value::as_number))
                    .filter_map(|n| n.as_f64())
                    .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.min(v))))
                    .map(Value::Double)
                    .unwrap_or(Value::Null),
                doc_wire::AggregationKind::Max(field) => rows
                    .iter()
                    .filter_map(|d| d.fields.get(field).and_then(Value::as_number))
                    .filter_map(|n| n.as_f64())
                    .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
                    .map(Value::Double)
                    .unwrap_or(Value::Null),
            };
            values.insert(aggregation.alias.clone(), result);
        }
        Ok(vec![AggregationRow { values }])
    }

    async fn apply_atomic_transform(
        &self,
        req: AtomicTransformRequest,
        ctx: &RequestContext,
    ) -> Result<AtomicTransformResult, OperationError> {
        check_cancelled(ctx)?;
        match req {
            AtomicTransformRequest::Increment {
                document,
                field,
                amount,
            } => {
                let mut entry = self.documents.get_mut(&document).ok_or(OperationError::NotFound)?;
                let existing = entry.fields.get(&field).cloned().unwrap_or(Value::Integer(0));
                let new_value = match (&existing, &amount) {
                    (Value::Integer(a), Value::Integer(b)) => Value::Integer(a + b),
                    (a, b) => {
                        let a = a.as_number().and_then(|n| n.as_f64()).unwrap_or(0.0);
                        let b = b.as_number().and_then(|n| n.as_f64()).unwrap_or(0.0);
                        Value::Double(a + b)
                    }
                };
                entry.fields.insert(field, new_value.clone());
                entry.update_time = Utc::now();
                Ok(AtomicTransformResult { new_value })
            }
            AtomicTransformRequest::ArrayUnion {
                document,
                field,
                elements,
            } => {
                let mut entry = self.documents.get_mut(&document).ok_or(OperationError::NotFound)?;
                let mut items = match entry.fields.get(&field) {
                    Some(Value::Array(items)) => items.clone(),
                    _ => Vec::new(),
                };
                for element in elements {
                    if !items.iter().any(|i| deep_eq(i, &element)) {
                        items.push(element);
                    }
                }
                let new_value = Value::Array(items);
                entry.fields.insert(field, new_value.clone());
                entry.update_time = Utc::now();
                Ok(AtomicTransformResult { new_value })
            }
            AtomicTransformRequest::ArrayRemove {
                document,
                field,
                elements,
            } => {
                let mut entry = self.documents.get_mut(&document).ok_or(OperationError::NotFound)?;
                let items = match entry.fields.get(&field) {
                    Some(Value::Array(items)) => items.clone(),
                    _ => Vec::new(),
                };
                let retained: Vec<Value> = items
                    .into_iter()
                    .filter(|i| !elements.iter().any(|e| deep_eq(i, e)))
                    .collect();
                let new_value = Value::Array(retained);
                entry.fields.insert(field, new_value.clone());
                entry.update_time = Utc::now();
                Ok(AtomicTransformResult { new_value })
            }
            AtomicTransformRequest::ServerTimestamp { document, field } => {
                let mut entry = self.documents.get_mut(&document).ok_or(OperationError::NotFound)?;
                let new_value = Value::Timestamp(Utc::now());
                entry.fields.insert(field, new_value.clone());
                entry.update_time = Utc::now();
                Ok(AtomicTransformResult { new_value })
            }
        }
    }

    async fn begin_transaction(
        &self,
        _req: BeginTransactionRequest,
        ctx: &RequestContext,
    ) -> Result<String, OperationError> {
        check_cancelled(ctx)?;
        let n = self.next_transaction_seq.fetch_add(1, Ordering::Relaxed);
        Ok(format!("txn-{n}"))
    }

    async fn commit_transaction(
        &self,
        req: CommitTransactionRequest,
        ctx: &RequestContext,
    ) -> Result<CommitTransactionResponse, OperationError> {
        check_cancelled(ctx)?;
        if req.transaction.is_empty() {
            return Err(OperationError::Failed("empty transaction token".into()));
        }
        Ok(CommitTransactionResponse {
            commit_time: Utc::now(),
        })
    }

    async fn create_project(
        &self,
        req: CreateProjectRequest,
        ctx: &RequestContext,
    ) -> Result<ProjectRecord, OperationError> {
        check_cancelled(ctx)?;
        let key = (req.organization_id.clone(), req.project_id.clone());
        if self.projects.contains_key(&key) {
            return Err(OperationError::Conflict);
        }
        let record = ProjectRecord {
            organization_id: req.organization_id,
            project_id: req.project_id,
            display_name: req.display_name,
        };
        self.projects.insert(key, record.clone());
        Ok(record)
    }

    async fn get_project(
        &self,
        organization_id: &str,
        project_id: &str,
        _ctx: &RequestContext,
    ) -> Result<ProjectRecord, OperationError> {
        self.projects
            .get(&(organization_id.to_owned(), project_id.to_owned()))
            .map(|r| r.clone())
            .ok_or(OperationError::NotFound)
    }

    async fn delete_project(
        &self,
        organization_id: &str,
        project_id: &str,
        ctx: &RequestContext,
    ) -> Result<(), OperationError> {
        check_cancelled(ctx)?;
        self.projects
            .remove(&(organization_id.to_owned(), project_id.to_owned()))
            .map(|_| ())
            .ok_or(OperationError::NotFound)
    }

    async fn list_projects(
        &self,
        organization_id: &str,
        _ctx: &RequestContext,
    ) -> Result<Vec<ProjectRecord>, OperationError> {
        Ok(self
            .projects
            .iter()
            .filter(|e| e.key().0 == organization_id)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn create_database(
        &self,
        req: CreateDatabaseRequest,
        ctx: &RequestContext,
    ) -> Result<DatabaseRecord, OperationError> {
        check_cancelled(ctx)?;
        let key = (
            req.organization_id.clone(),
            req.project_id.clone(),
            req.database_id.clone(),
        );
        if self.databases.contains_key(&key) {
            return Err(OperationError::Conflict);
        }
        let record = DatabaseRecord {
            organization_id: req.organization_id,
            project_id: req.project_id,
            database_id: req.database_id,
        };
        self.databases.insert(key, record.clone());
        Ok(record)
    }

    async fn get_database(
        &self,
        organization_id: &str,
        project_id: &str,
        database_id: &str,
        _ctx: &RequestContext,
    ) -> Result<DatabaseRecord, OperationError> {
        self.databases
            .get(&(
                organization_id.to_owned(),
                project_id.to_owned(),
                database_id.to_owned(),
            ))
            .map(|r| r.clone())
            .ok_or(OperationError::NotFound)
    }

    async fn delete_database(
        &self,
        organization_id: &str,
        project_id: &str,
        database_id: &str,
        ctx: &RequestContext,
    ) -> Result<(), OperationError> {
        check_cancelled(ctx)?;
        self.databases
            .remove(&(
                organization_id.to_owned(),
                project_id.to_owned(),
                database_id.to_owned(),
            ))
            .map(|_| ())
            .ok_or(OperationError::NotFound)
    }

    async fn list_databases(
        &self,
        organization_id: &str,
        project_id: &str,
        _ctx: &RequestContext,
    ) -> Result<Vec<DatabaseRecord>, OperationError> {
        Ok(self
            .databases
            .iter()
            .filter(|e| e.key().0 == organization_id && e.key().1 == project_id)
            .map(|e| e.value().clone())
            .collect())
    }
}

/// Accepts any non-empty bearer token; the subject id is derived from the
/// token itself. A real auth client would call out to an identity provider.
#[derive(Default)]
pub struct InMemoryAuthClient;

impl InMemoryAuthClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuthClient for InMemoryAuthClient {
    async fn validate(&self, token: &str, _ctx: &RequestContext) -> Result<Subject, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(Subject {
            subject_id: format!("subject:{token}"),
            raw_token: token.to_owned(),
        })
    }
}

/// Always permits. The real evaluator is a rules engine external to the
/// core (spec §1 "Out of scope"); this stands in for tests that need a
/// subject to clear the gate without modeling actual rule semantics.
#[derive(Default)]
pub struct PermissiveSecurityEvaluator;

impl PermissiveSecurityEvaluator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecurityEvaluator for PermissiveSecurityEvaluator {
    async fn check(
        &self,
        _subject: &Subject,
        _path: &ResourcePath,
        _operation: Operation,
        _ctx: &RequestContext,
    ) -> Result<(), SecurityError> {
        Ok(())
    }
}

/// A single-process organization repository backed by a map, guarded the way
/// the teacher guards its own small shared maps: one lock per mutating
/// section, never held across an await.
#[derive(Default)]
pub struct InMemoryOrganizationRepository {
    organizations: Mutex<IndexMap<String, Organization>>,
}

impl InMemoryOrganizationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryOrganizationRepository {
    async fn create(
        &self,
        req: CreateOrganizationRequest,
    ) -> Result<Organization, OrganizationError> {
        let mut orgs = self.organizations.lock();
        if orgs.contains_key(&req.organization_id) {
            return Err(OrganizationError::AlreadyExists);
        }
        let now = Utc::now();
        let org = Organization {
            organization_id: req.organization_id.clone(),
            display_name: req.display_name,
            billing_email: req.billing_email,
            admin_emails: req.admin_emails,
            default_location: req.default_location,
            state: OrganizationState::Active,
            created_time: now,
            updated_time: now,
            project_count: 0,
            usage: UsageSnapshot::default(),
            quotas: Quotas::default(),
        };
        orgs.insert(req.organization_id, org.clone());
        Ok(org)
    }

    async fn get(&self, organization_id: &str) -> Result<Organization, OrganizationError> {
        self.organizations
            .lock()
            .get(organization_id)
            .cloned()
            .ok_or(OrganizationError::NotFound)
    }

    async fn list(
        &self,
        req: ListOrganizationsRequest,
    ) -> Result<ListOrganizationsResponse, OrganizationError> {
        let orgs = self.organizations.lock();
        let filtered: Vec<Organization> = orgs
            .values()
            .filter(|o| match &req.admin_email {
                Some(email) => o.admin_emails.iter().any(|e| e == email),
                None => true,
            })
            .cloned()
            .collect();
        let total = filtered.len() as u64;
        let page = filtered
            .into_iter()
            .skip(req.offset as usize)
            .take(req.page_size as usize)
            .collect();
        Ok(ListOrganizationsResponse {
            organizations: page,
            total,
        })
    }

    async fn update(
        &self,
        organization_id: &str,
        req: UpdateOrganizationRequest,
    ) -> Result<Organization, OrganizationError> {
        let mut orgs = self.organizations.lock();
        let org = orgs
            .get_mut(organization_id)
            .ok_or(OrganizationError::NotFound)?;
        if let Some(display_name) = req.display_name {
            org.display_name = display_name;
        }
        if let Some(billing_email) = req.billing_email {
            org.billing_email = billing_email;
        }
        if let Some(admin_emails) = req.admin_emails {
            org.admin_emails = admin_emails;
        }
        if let Some(default_location) = req.default_location {
            org.default_location = default_location;
        }
        org.updated_time = Utc::now();
        Ok(org.clone())
    }

    async fn delete(&self, organization_id: &str) -> Result<(), OrganizationError> {
        self.organizations
            .lock()
            .shift_remove(organization_id)
            .map(|_| ())
            .ok_or(OrganizationError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_context::RequestContext;

    fn ctx() -> RequestContext {
        RequestContext::new("test")
    }

    #[tokio::test]
    async fn cancelled_context_rejects_create_without_a_side_effect() {
        let svc = InMemoryOperationService::new();
        let ctx = ctx();
        ctx.cancellation_token().cancel();

        let err = svc
            .create_document(
                CreateDocumentRequest {
                    organization_id: "org-abc".into(),
                    project_id: "proj-one".into(),
                    database_id: "db-one".into(),
                    collection_id: "counters".into(),
                    document_id: Some("c1".into()),
                    fields: IndexMap::new(),
                },
                &ctx,
            )
            .await
            .unwrap_err();
        assert_eq!(err, OperationError::Failed("request cancelled".into()));

        let id = DocumentId {
            organization_id: "org-abc".into(),
            project_id: "proj-one".into(),
            database_id: "db-one".into(),
            collection_id: "counters".into(),
            document_id: "c1".into(),
        };
        assert_eq!(svc.get_document(&id, &ctx).await, Err(OperationError::NotFound));
    }

    #[tokio::test]
    async fn atomic_increment_accumulates_from_zero() {
        let svc = InMemoryOperationService::new();
        let ctx = ctx();
        let doc = svc
            .create_document(
                CreateDocumentRequest {
                    organization_id: "org-abc".into(),
                    project_id: "proj-one".into(),
                    database_id: "db-one".into(),
                    collection_id: "counters".into(),
                    document_id: Some("c1".into()),
                    fields: IndexMap::new(),
                },
                &ctx,
            )
            .await
            .unwrap();
        let id = DocumentId {
            organization_id: "org-abc".into(),
            project_id: "proj-one".into(),
            database_id: "db-one".into(),
            collection_id: "counters".into(),
            document_id: "c1".into(),
        };
        assert_eq!(doc.name, id.resource_name());

        let result = svc
            .apply_atomic_transform(
                AtomicTransformRequest::Increment {
                    document: id.clone(),
                    field: "count".into(),
                    amount: Value::Integer(42),
                },
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(result.new_value, Value::Integer(42));
    }

    #[tokio::test]
    async fn get_and_delete_of_nonexistent_document_both_404() {
        let svc = InMemoryOperationService::new();
        let ctx = ctx();
        let id = DocumentId {
            organization_id: "org-abc".into(),
            project_id: "proj-one".into(),
            database_id: "db-one".into(),
            collection_id: "counters".into(),
            document_id: "missing".into(),
        };
        assert_eq!(
            svc.get_document(&id, &ctx).await.unwrap_err(),
            OperationError::NotFound
        );
        assert_eq!(
            svc.delete_document(&id, &ctx).await.unwrap_err(),
            OperationError::NotFound
        );
    }

    #[tokio::test]
    async fn array_union_deduplicates_with_deep_equality() {
        let svc = InMemoryOperationService::new();
        let ctx = ctx();
        let id = DocumentId {
            organization_id: "o".into(),
            project_id: "p".into(),
            database_id: "d".into(),
            collection_id: "c".into(),
            document_id: "doc-1".into(),
        };
        svc.create_document(
            CreateDocumentRequest {
                organization_id: id.organization_id.clone(),
                project_id: id.project_id.clone(),
                database_id: id.database_id.clone(),
                collection_id: id.collection_id.clone(),
                document_id: Some(id.document_id.clone()),
                fields: IndexMap::new(),
            },
            &ctx,
        )
        .await
        .unwrap();

        svc.apply_atomic_transform(
            AtomicTransformRequest::ArrayUnion {
                document: id.clone(),
                field: "tags".into(),
                elements: vec![Value::String("a".into()), Value::String("b".into())],
            },
            &ctx,
        )
        .await
        .unwrap();
        let result = svc
            .apply_atomic_transform(
                AtomicTransformRequest::ArrayUnion {
                    document: id,
                    field: "tags".into(),
                    elements: vec![Value::String("a".into()), Value::String("c".into())],
                },
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(
            result.new_value,
            Value::Array(vec![
                Value::String("a".into()),
                Value::String("b".into()),
                Value::String("c".into())
            ])
        );
    }

    #[tokio::test]
    async fn auth_client_rejects_empty_token() {
        let auth = InMemoryAuthClient::new();
        assert_eq!(
            auth.validate("", &ctx()).await.unwrap_err(),
            AuthError::InvalidToken
        );
        assert!(auth.validate("t", &ctx()).await.is_ok());
    }

    #[tokio::test]
    async fn organization_lifecycle_matches_scenario_s5() {
        let repo = InMemoryOrganizationRepository::new();
        let created = repo
            .create(CreateOrganizationRequest {
                organization_id: "lifecycle-test-org".into(),
                display_name: "X".into(),
                billing_email: "b@x".into(),
                admin_emails: vec![],
                default_location: "us".into(),
            })
            .await
            .unwrap();
        assert_eq!(created.display_name, "X");

        let updated = repo
            .update(
                "lifecycle-test-org",
                UpdateOrganizationRequest {
                    display_name: Some("Y".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.display_name, "Y");
        assert_eq!(updated.billing_email, "b@x");

        repo.delete("lifecycle-test-org").await.unwrap();
        assert_eq!(
            repo.get("lifecycle-test-org").await.unwrap_err(),
            OrganizationError::NotFound
        );
    }
}
