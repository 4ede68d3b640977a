//! Deployment tracking API boundary

use async_trait::async_trait;
use deployments_api::{
    CreateDeploymentRequest, CreateDeploymentStatusRequest, DeploymentRecord, DeploymentStatus,
};

use crate::errors::ActionError;

/// Repository coordinates (`owner/name`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::str::FromStr for RepoRef {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(owner, name))
            }
            _ => Err(ActionError::ConfigError(format!(
                "Invalid repository '{}', expected owner/name",
                s
            ))),
        }
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Acknowledgement of a mutating call.
///
/// Callers compare `status` with the code they expect; a 2xx that is not the
/// expected code (e.g. 202 for a deferred deployment) carries no `data`.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn new(status: u16, data: Option<T>) -> Self {
        Self {
            status,
            data,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Return the payload when the call was acknowledged with `expected`
    pub fn expect_status(self, expected: u16) -> Result<T, String> {
        match self.data {
            Some(data) if self.status == expected => Ok(data),
            _ => Err(match self.message {
                Some(message) => format!("expected {}, got {}: {}", expected, self.status, message),
                None => format!("expected {}, got {}", expected, self.status),
            }),
        }
    }
}

/// Operations the replacement needs from the deployment tracking service
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /// List deployments of `environment` created at commit `sha`
    async fn list_deployments(
        &self,
        repo: &RepoRef,
        sha: &str,
        environment: &str,
    ) -> Result<Vec<DeploymentRecord>, ActionError>;

    /// List the status history of a deployment, in no particular order
    async fn list_deployment_statuses(
        &self,
        repo: &RepoRef,
        deployment_id: u64,
    ) -> Result<Vec<DeploymentStatus>, ActionError>;

    /// Create a deployment, acknowledged with 201
    async fn create_deployment(
        &self,
        repo: &RepoRef,
        request: &CreateDeploymentRequest,
    ) -> Result<ApiResponse<DeploymentRecord>, ActionError>;

    /// Append a status to a deployment, acknowledged with 201
    async fn create_deployment_status(
        &self,
        repo: &RepoRef,
        deployment_id: u64,
        request: &CreateDeploymentStatusRequest,
    ) -> Result<ApiResponse<DeploymentStatus>, ActionError>;

    /// Delete a deployment, acknowledged with 204
    async fn delete_deployment(
        &self,
        repo: &RepoRef,
        deployment_id: u64,
    ) -> Result<ApiResponse<()>, ActionError>;
}
