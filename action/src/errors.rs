//! Error types for the replace-deployment action

use thiserror::Error;

/// Main error type for the action
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Could not find a deployment to replace for {environment} at {sha}")]
    NoDeploymentsFound { environment: String, sha: String },

    #[error("Failed to create a new deployment for {environment}: {reason}")]
    CreateDeploymentFailed { environment: String, reason: String },

    #[error("Failed to set status of deployment {deployment_id}: {reason}")]
    SetStatusFailed { deployment_id: u64, reason: String },

    #[error("Failed to delete deployment {deployment_id}: {reason}")]
    DeleteFailed { deployment_id: u64, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
