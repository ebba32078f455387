//! Scoped request context (spec §3 "Request context", §4.B).
//!
//! A [`RequestContext`] is created by the dispatcher when a request enters,
//! populated incrementally by the middleware chain, read by handlers, and
//! dropped with the request. Each field is single-shot: the first middleware
//! to set a value wins, and re-invocation on an already-populated context is
//! a silent no-op (idempotent/re-entrant per spec §4.C), never an overwrite.
//! A read of a field that was never set is a contract bug, not a runtime
//! surprise — it surfaces as [`ContextError::MissingValue`], which the HTTP
//! boundary maps to a 500 `context_error` (spec §4.B).
//!
//! Modeled on the teacher framework's `ModuleCtx`: a small bag of shared
//! state, handed out by reference, with read accessors doing the one
//! fallible thing (here: "was this ever written") that a module/handler
//! needs to reason about. It also carries a `tokio_util::sync::CancellationToken`
//! child of the process's root token, the same `root_token.child_token()`
//! shape `ModuleCtx` derives its own token from — every collaborator method
//! that takes `&RequestContext` can read it to cooperate with cancellation
//! (spec §5).

use std::sync::OnceLock;

use tokio_util::sync::CancellationToken;

/// The authenticated caller, once the auth gate has run (spec §4.E).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub subject_id: String,
    pub raw_token: String,
}

/// Keys a [`RequestContext`] read can fail to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKey {
    OrganizationId,
    ProjectId,
    DatabaseId,
    Subject,
}

impl ContextKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ContextKey::OrganizationId => "organization_id",
            ContextKey::ProjectId => "project_id",
            ContextKey::DatabaseId => "database_id",
            ContextKey::Subject => "subject",
        }
    }
}

/// A read of an unset context key — a bug-class failure (spec §4.B).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextError {
    pub key: ContextKey,
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "context value '{}' was read before it was set",
            self.key.as_str()
        )
    }
}

impl std::error::Error for ContextError {}

/// Carries the tenant triple, the authenticated subject (once known), and a
/// correlation id through the lifetime of one request. Created on entry,
/// immutable thereafter, destroyed with the request — never shared across
/// requests (spec §5 "Shared mutable state").
#[derive(Debug)]
pub struct RequestContext {
    correlation_id: String,
    organization_id: OnceLock<String>,
    project_id: OnceLock<String>,
    database_id: OnceLock<String>,
    subject: OnceLock<Subject>,
    cancellation_token: CancellationToken,
}

impl RequestContext {
    /// Create a fresh, empty context for one incoming request, with its own
    /// unparented cancellation token. Used where no process-wide root token
    /// is reachable (standalone middleware tests); production request entry
    /// points should prefer [`RequestContext::with_cancellation`] so a
    /// process-wide shutdown cascades into every in-flight request.
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self::with_cancellation(correlation_id, CancellationToken::new())
    }

    /// Create a context whose cancellation token is a child of the caller's
    /// token (spec §5 "Suspension points"/"Cancellation and timeouts"):
    /// cancelling the parent — e.g. a root token tied to process shutdown —
    /// cancels every request context derived from it. Mirrors the teacher
    /// framework's `root_token.child_token()` per-module-context pattern.
    pub fn with_cancellation(correlation_id: impl Into<String>, parent: CancellationToken) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            organization_id: OnceLock::new(),
            project_id: OnceLock::new(),
            database_id: OnceLock::new(),
            subject: OnceLock::new(),
            cancellation_token: parent.child_token(),
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// The cancellation signal derived from this request (spec §5): every
    /// downstream call into a collaborator accepts `&RequestContext` and may
    /// read this to cooperatively abort rather than produce a side effect
    /// after the caller has gone away.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Single-shot write. Re-invocation with an already-set value is a no-op
    /// (idempotent middleware re-entry, spec §4.C) — it never overwrites.
    pub fn set_organization_id(&self, value: impl Into<String>) {
        let _ = self.organization_id.set(value.into());
    }

    pub fn set_project_id(&self, value: impl Into<String>) {
        let _ = self.project_id.set(value.into());
    }

    pub fn set_database_id(&self, value: impl Into<String>) {
        let _ = self.database_id.set(value.into());
    }

    pub fn set_subject(&self, subject: Subject) {
        let _ = self.subject.set(subject);
    }

    pub fn organization_id(&self) -> Result<&str, ContextError> {
        self.organization_id
            .get()
            .map(String::as_str)
            .ok_or(ContextError {
                key: ContextKey::OrganizationId,
            })
    }

    pub fn project_id(&self) -> Result<&str, ContextError> {
        self.project_id.get().map(String::as_str).ok_or(ContextError {
            key: ContextKey::ProjectId,
        })
    }

    pub fn database_id(&self) -> Result<&str, ContextError> {
        self.database_id.get().map(String::as_str).ok_or(ContextError {
            key: ContextKey::DatabaseId,
        })
    }

    /// The authenticated subject, if the auth gate has run for this route.
    /// Unlike the tenant triple, a missing subject is a normal state (public
    /// or pre-auth-gate routes), so this returns `Option`, not `Result`.
    pub fn subject(&self) -> Option<&Subject> {
        self.subject.get()
    }

    pub fn organization_id_opt(&self) -> Option<&str> {
        self.organization_id.get().map(String::as_str)
    }

    pub fn project_id_opt(&self) -> Option<&str> {
        self.project_id.get().map(String::as_str)
    }

    pub fn database_id_opt(&self) -> Option<&str> {
        self.database_id.get().map(String::as_str)
    }
}

/// A request whose handling future is dropped before completion (e.g. the
/// caller disconnects mid-body-read) drops its last `Arc<RequestContext>`
/// without ever reaching a handler's return path. Cancelling here, rather
/// than relying on a handler to do so on every exit, is what lets
/// cancellation propagate for suspension points the handler itself never
/// gets to observe (spec §5 "Cancellation and timeouts").
impl Drop for RequestContext {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
