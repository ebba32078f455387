//! Shared application state (SPEC_FULL §4.I), handed to every handler as
//! `axum::extract::State<Arc<AppState>>`: the collaborator contracts (held
//! as trait objects, since the concrete implementation is swappable — the
//! in-memory doubles here, a real backend in a production deployment), the
//! loaded configuration, and the metrics registry.

use std::sync::Arc;

use doc_collab::{AuthClient, OperationService, OrganizationRepository, SecurityEvaluator};
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::metrics::MetricsRegistry;

pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub operations: Arc<dyn OperationService>,
    pub auth: Arc<dyn AuthClient>,
    pub security: Arc<dyn SecurityEvaluator>,
    pub organizations: Arc<dyn OrganizationRepository>,
    pub metrics: Arc<MetricsRegistry>,
    /// Root of every request's cancellation token (spec §5): cancelling this
    /// — tied to process shutdown in `main.rs` — cascades into every
    /// in-flight request's `RequestContext::cancellation_token()`.
    pub root_cancellation: CancellationToken,
}

impl AppState {
    pub fn new(
        config: Arc<GatewayConfig>,
        operations: Arc<dyn OperationService>,
        auth: Arc<dyn AuthClient>,
        security: Arc<dyn SecurityEvaluator>,
        organizations: Arc<dyn OrganizationRepository>,
    ) -> Self {
        Self {
            config,
            operations,
            auth,
            security,
            organizations,
            metrics: Arc::new(MetricsRegistry::new()),
            root_cancellation: CancellationToken::new(),
        }
    }
}
