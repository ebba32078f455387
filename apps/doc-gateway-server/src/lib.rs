//! Library surface of the gateway binary: the router assembly, shared state,
//! middleware, handlers, and configuration, split out from `main.rs` so
//! integration tests can drive the assembled [`axum::Router`] in-process
//! (`tower::ServiceExt::oneshot`) without spawning the real binary.

pub mod auth;
pub mod config;
pub mod handlers;
pub mod labels;
pub mod logging;
pub mod metrics;
pub mod router;
pub mod state;
pub mod wire_errors;
