//! Health view endpoint (spec §4.H): `{status, version, metrics summary,
//! active endpoints, security enabled}`. Never wrapped in the auth gate or
//! tenant middleware — it has to answer even when auth is unavailable.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::metrics::HealthView;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthView> {
    Json(HealthView::build(&state.metrics, state.config.require_auth_by_default))
}
