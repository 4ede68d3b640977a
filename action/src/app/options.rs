//! Action inputs and validated options

use std::time::Duration;

use std::collections::HashMap;

use clap::Parser;
use secrecy::SecretString;

use crate::app::context::ActionContext;
use crate::errors::ActionError;
use crate::logs::{LogLevel, LogOptions};
use crate::utils::{sanitize_environment_name, split_list};

/// Login GitHub Actions creates deployments as when using `GITHUB_TOKEN`
pub const DEFAULT_AUTOMATION_ACTOR: &str = "github-actions[bot]";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Raw inputs, read from flags or from the `INPUT_*` variables set by the runner
#[derive(Parser, Clone)]
#[command(name = "replace-deployment")]
#[command(version, about, long_about = None)]
pub struct Inputs {
    /// Environment(s) to replace the deployment in, comma or newline separated
    #[arg(long, env = "INPUT_ENVIRONMENT")]
    pub environment: String,

    /// Git ref of the new deployment
    #[arg(long = "ref", env = "INPUT_REF")]
    pub git_ref: String,

    /// Description of the new deployment
    #[arg(long, env = "INPUT_DESCRIPTION")]
    pub description: String,

    /// Token for the GitHub API
    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Only deployments created by this login are replaced [default: github-actions[bot]]
    #[arg(long, env = "INPUT_AUTOMATION_ACTOR")]
    pub automation_actor: Option<String>,

    /// Create a deployment even if there is none to replace (true or false)
    #[arg(long, env = "INPUT_CREATE_IF_MISSING")]
    pub create_if_missing: Option<String>,

    /// trace, debug, info, warn or error
    #[arg(long, env = "INPUT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log as JSON lines (true or false)
    #[arg(long, env = "INPUT_LOG_JSON")]
    pub log_json: Option<String>,

    /// Per-request timeout for the GitHub API in seconds [default: 30]
    #[arg(long, env = "INPUT_HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: Option<String>,
}

/// Validated options for one run
#[derive(Debug, Clone)]
pub struct ReplaceOptions {
    /// Environments to replace in
    pub environments: Vec<String>,

    /// Git ref of the new deployments
    pub git_ref: String,

    /// Description of the new deployments
    pub description: String,

    /// API token
    pub token: SecretString,

    /// Login automated deployments are created by
    pub automation_actor: String,

    /// Create a deployment where there is nothing to replace
    pub create_if_missing: bool,

    /// Logging configuration
    pub log: LogOptions,

    /// Per-request HTTP timeout
    pub http_timeout: Duration,
}

fn required(name: &str, value: &str) -> Result<String, ActionError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ActionError::ValidationError(format!(
            "Input required and not supplied: {}",
            name
        )));
    }
    Ok(value.to_string())
}

/// Optional input, `None` when unset or blank
fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Boolean input: `true` or `false` in any case, blank means `false`
fn boolean(name: &str, value: Option<&str>) -> Result<bool, ActionError> {
    match optional(value) {
        None => Ok(false),
        Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
        Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
        Some(value) => Err(ActionError::ValidationError(format!(
            "Input {} must be true or false, got: {}",
            name, value
        ))),
    }
}

/// Environments whose output names would overwrite each other are refused
fn check_output_names(environments: &[String]) -> Result<(), ActionError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for environment in environments {
        let name = sanitize_environment_name(environment);
        if let Some(previous) = seen.insert(name.clone(), environment) {
            return Err(ActionError::ValidationError(format!(
                "Environments {} and {} share the output deployment_id_{}",
                previous, environment, name
            )));
        }
    }
    Ok(())
}

impl ReplaceOptions {
    /// Validate raw inputs
    pub fn from_inputs(inputs: Inputs, context: &ActionContext) -> Result<Self, ActionError> {
        let environments = split_list(&required("environment", &inputs.environment)?);
        if environments.is_empty() {
            return Err(ActionError::ValidationError(
                "Input required and not supplied: environment".to_string(),
            ));
        }
        check_output_names(&environments)?;

        let log_level = match optional(inputs.log_level.as_deref()) {
            Some(level) => level.parse::<LogLevel>().map_err(ActionError::ValidationError)?,
            None if context.runner_debug => LogLevel::Debug,
            None => LogLevel::default(),
        };

        let http_timeout_secs = match optional(inputs.http_timeout_secs.as_deref()) {
            Some(secs) => secs.parse::<u64>().map_err(|e| {
                ActionError::ValidationError(format!("Invalid http_timeout_secs {}: {}", secs, e))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };
        if http_timeout_secs == 0 {
            return Err(ActionError::ValidationError(
                "http_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            environments,
            git_ref: required("ref", &inputs.git_ref)?,
            description: required("description", &inputs.description)?,
            token: SecretString::from(required("token", &inputs.token)?),
            automation_actor: optional(inputs.automation_actor.as_deref())
                .unwrap_or(DEFAULT_AUTOMATION_ACTOR)
                .to_string(),
            create_if_missing: boolean("create_if_missing", inputs.create_if_missing.as_deref())?,
            log: LogOptions {
                log_level,
                json_format: boolean("log_json", inputs.log_json.as_deref())?,
            },
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}
