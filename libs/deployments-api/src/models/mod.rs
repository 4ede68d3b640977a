//! API models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account that created a deployment or status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub login: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Deployment as returned by `GET /repos/{owner}/{repo}/deployments`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: u64,
    pub sha: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub environment: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub creator: Option<Actor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeploymentRecord {
    /// Login of the account that created the deployment
    pub fn created_by(&self) -> Option<&str> {
        self.creator.as_ref().map(|actor| actor.login.as_str())
    }
}

/// Deployment status state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    Pending,
    InProgress,
    Success,
    Failure,
    Error,
    Inactive,
    Queued,
}

impl DeploymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentState::Pending => "pending",
            DeploymentState::InProgress => "in_progress",
            DeploymentState::Success => "success",
            DeploymentState::Failure => "failure",
            DeploymentState::Error => "error",
            DeploymentState::Inactive => "inactive",
            DeploymentState::Queued => "queued",
        }
    }
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry of a deployment's status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentStatus {
    pub id: u64,
    pub state: DeploymentState,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub log_url: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /repos/{owner}/{repo}/deployments`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDeploymentRequest {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub description: String,
    pub environment: String,
    pub auto_merge: bool,
    /// An empty list skips commit status checks
    pub required_contexts: Vec<String>,
}

impl CreateDeploymentRequest {
    /// Request for a deployment that bypasses merge and status-check gating
    pub fn ungated(git_ref: &str, description: &str, environment: &str) -> Self {
        Self {
            git_ref: git_ref.to_string(),
            description: description.to_string(),
            environment: environment.to_string(),
            auto_merge: false,
            required_contexts: Vec::new(),
        }
    }
}

/// Body of `POST /repos/{owner}/{repo}/deployments/{id}/statuses`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDeploymentStatusRequest {
    pub state: DeploymentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_inactive: Option<bool>,
}

impl CreateDeploymentStatusRequest {
    /// Bare `inactive` status
    pub fn inactive() -> Self {
        Self {
            state: DeploymentState::Inactive,
            log_url: None,
            description: None,
            auto_inactive: None,
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default)]
    pub documentation_url: Option<String>,
}
