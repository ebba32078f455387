//! The organization-repository contract (spec §4.G, §6): CRUD, the
//! admin-email filter, and the usage snapshot read backing `GET .../usage`.

use async_trait::async_trait;

use crate::model::Organization;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationError {
    NotFound,
    AlreadyExists,
    Failed(String),
}

impl std::fmt::Display for OrganizationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrganizationError::NotFound => write!(f, "organization not found"),
            OrganizationError::AlreadyExists => write!(f, "organization already exists"),
            OrganizationError::Failed(detail) => write!(f, "failed: {detail}"),
        }
    }
}

impl std::error::Error for OrganizationError {}

#[derive(Debug, Clone)]
pub struct CreateOrganizationRequest {
    pub organization_id: String,
    pub display_name: String,
    pub billing_email: String,
    pub admin_emails: Vec<String>,
    pub default_location: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOrganizationRequest {
    pub display_name: Option<String>,
    pub billing_email: Option<String>,
    pub admin_emails: Option<Vec<String>>,
    pub default_location: Option<String>,
}

/// Pagination/filter parameters for `GET /organizations` (spec §4.G).
#[derive(Debug, Clone)]
pub struct ListOrganizationsRequest {
    pub page_size: u32,
    pub offset: u32,
    pub admin_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListOrganizationsResponse {
    pub organizations: Vec<Organization>,
    pub total: u64,
}

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn create(
        &self,
        req: CreateOrganizationRequest,
    ) -> Result<Organization, OrganizationError>;

    async fn get(&self, organization_id: &str) -> Result<Organization, OrganizationError>;

    async fn list(
        &self,
        req: ListOrganizationsRequest,
    ) -> Result<ListOrganizationsResponse, OrganizationError>;

    async fn update(
        &self,
        organization_id: &str,
        req: UpdateOrganizationRequest,
    ) -> Result<Organization, OrganizationError>;

    async fn delete(&self, organization_id: &str) -> Result<(), OrganizationError>;
}
