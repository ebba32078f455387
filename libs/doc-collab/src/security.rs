//! The security-rules-evaluator contract (spec §6, §1 "Out of scope").

use async_trait::async_trait;

use doc_context::{RequestContext, Subject};

/// The verb the evaluator is asked to authorize for a given resource path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
    Query,
    Admin,
}

/// A fully-qualified resource path, e.g.
/// `organizations/o/projects/p/databases/(default)/documents/c/d`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath(pub String);

impl std::fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityError {
    Unauthorized,
    Forbidden,
}

impl std::fmt::Display for SecurityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityError::Unauthorized => write!(f, "unauthorized"),
            SecurityError::Forbidden => write!(f, "forbidden"),
        }
    }
}

impl std::error::Error for SecurityError {}

#[async_trait]
pub trait SecurityEvaluator: Send + Sync {
    async fn check(
        &self,
        subject: &Subject,
        path: &ResourcePath,
        operation: Operation,
        ctx: &RequestContext,
    ) -> Result<(), SecurityError>;
}
