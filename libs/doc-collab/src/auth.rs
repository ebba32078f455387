//! The auth-client contract (spec §4.E, §6): validates the bearer token the
//! dispatcher extracted and returns the authenticated subject.

use async_trait::async_trait;

use doc_context::{RequestContext, Subject};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    InvalidToken,
    Unavailable(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidToken => write!(f, "invalid authentication token"),
            AuthError::Unavailable(detail) => write!(f, "auth collaborator unavailable: {detail}"),
        }
    }
}

impl std::error::Error for AuthError {}

#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn validate(&self, token: &str, ctx: &RequestContext) -> Result<Subject, AuthError>;
}
