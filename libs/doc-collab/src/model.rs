//! Shared value types for the collaborator contracts (spec §3, §6).

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use doc_wire::Value;

/// Addresses a single document across the full tenant hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId {
    pub organization_id: String,
    pub project_id: String,
    pub database_id: String,
    pub collection_id: String,
    pub document_id: String,
}

impl DocumentId {
    pub fn resource_name(&self) -> String {
        format!(
            "organizations/{}/projects/{}/databases/{}/documents/{}/{}",
            self.organization_id,
            self.project_id,
            self.database_id,
            self.collection_id,
            self.document_id
        )
    }
}

/// A stored document as the operation service hands it back.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub name: String,
    pub fields: IndexMap<String, Value>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// Administrative state of an organization (spec §3 "Organization").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationState {
    Active,
    Suspended,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct UsageSnapshot {
    pub projects: u64,
    pub databases: u64,
    pub storage_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quotas {
    pub max_projects: u64,
    pub max_databases: u64,
    pub max_storage_bytes: u64,
}

impl Default for Quotas {
    fn default() -> Self {
        Self {
            max_projects: 100,
            max_databases: 100,
            max_storage_bytes: 10 * 1024 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Organization {
    pub organization_id: String,
    pub display_name: String,
    pub billing_email: String,
    pub admin_emails: Vec<String>,
    pub default_location: String,
    pub state: OrganizationState,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,
    pub project_count: u64,
    pub usage: UsageSnapshot,
    pub quotas: Quotas,
}
