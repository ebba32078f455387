//! Tenant & hierarchy resolution middleware (spec §4.C).
//!
//! Three idempotent axum middleware layers populate the organization,
//! project, and database ids on the request's [`doc_context::RequestContext`]
//! before any handler runs, rejecting with the spec §6/§7 wire error shape
//! when a required identifier is missing or malformed.

mod middleware;
mod path_family;
mod resolve;

pub use middleware::{database_middleware, organization_middleware, project_middleware};
pub use path_family::{path_family, PathFamily};
pub use resolve::{resolve_database_id, resolve_organization_id, resolve_project_id};
