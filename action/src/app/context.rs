//! Ambient context provided by the workflow runner

use std::path::PathBuf;

use crate::deploy::api::RepoRef;
use crate::errors::ActionError;

const DEFAULT_SERVER_URL: &str = "https://github.com";
const DEFAULT_API_URL: &str = "https://api.github.com";

/// Read-only facts about the triggering run
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// Repository the workflow runs in
    pub repo: RepoRef,

    /// Commit that triggered the run
    pub sha: String,

    /// Workflow run id
    pub run_id: String,

    /// Web URL of the GitHub server
    pub server_url: String,

    /// REST API base URL
    pub api_url: String,

    /// File step outputs are appended to
    pub output_file: Option<PathBuf>,

    /// Step debug logging is on
    pub runner_debug: bool,
}

impl ActionContext {
    /// Read the context from the process environment
    pub fn from_env() -> Result<Self, ActionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the context through `lookup`; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ActionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| {
                ActionError::ConfigError(format!("Missing environment variable {}", key))
            })
        };

        Ok(Self {
            repo: require("GITHUB_REPOSITORY")?.parse()?,
            sha: require("GITHUB_SHA")?,
            run_id: require("GITHUB_RUN_ID")?,
            server_url: get("GITHUB_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            api_url: get("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            output_file: get("GITHUB_OUTPUT").map(PathBuf::from),
            runner_debug: get("RUNNER_DEBUG").as_deref() == Some("1"),
        })
    }

    /// Link to the triggering run
    pub fn run_url(&self) -> String {
        format!(
            "{}/{}/{}/actions/runs/{}",
            self.server_url.trim_end_matches('/'),
            self.repo.owner,
            self.repo.name,
            self.run_id
        )
    }
}
