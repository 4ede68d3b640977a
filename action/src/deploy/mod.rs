//! Deployment replacement
//!
//! Selector → status resolution → grouper → replacer.

pub mod api;
pub mod fsm;
pub mod grouper;
pub mod replacer;
pub mod selector;
pub mod status;

use tracing::{info, warn};

use crate::deploy::api::{DeploymentApi, RepoRef};
use crate::deploy::grouper::group_by_environment;
use crate::deploy::replacer::replace_all;
use crate::deploy::selector::{select_deployments, Selection};
use crate::deploy::status::resolve_candidates;
use crate::errors::ActionError;
use crate::models::deployment::{GroupOutcome, ReplacementGroup};

/// Everything one run needs to know
#[derive(Debug, Clone)]
pub struct ReplaceRequest {
    pub repo: RepoRef,

    /// Commit the deployments to replace were created at
    pub sha: String,

    /// Environments to replace in, without duplicates
    pub environments: Vec<String>,

    /// Ref and description of the new deployments
    pub git_ref: String,
    pub description: String,

    /// Link to the triggering run, attached to the new deployments' status
    pub log_url: String,

    /// Login of the account that creates automated deployments
    pub automation_actor: String,

    /// Create a deployment even where there is nothing to replace
    pub create_if_missing: bool,
}

/// Aggregate of one run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Groups that produced a new deployment
    pub outcomes: Vec<GroupOutcome>,

    /// Groups that failed before producing one, and requested environments
    /// that had nothing to replace
    pub errors: Vec<ActionError>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.outcomes.iter().all(GroupOutcome::is_clean)
    }

    /// Human readable failure, `None` when everything went through
    pub fn failure_message(&self) -> Option<String> {
        let mut messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();

        for outcome in &self.outcomes {
            for failure in outcome
                .activation_failure
                .iter()
                .chain(&outcome.inactive_failures)
            {
                messages.push(
                    ActionError::SetStatusFailed {
                        deployment_id: failure.deployment_id,
                        reason: failure.reason.clone(),
                    }
                    .to_string(),
                );
            }
            for failure in &outcome.delete_failures {
                messages.push(
                    ActionError::DeleteFailed {
                        deployment_id: failure.deployment_id,
                        reason: failure.reason.clone(),
                    }
                    .to_string(),
                );
            }
        }

        if messages.is_empty() {
            None
        } else {
            Some(messages.join("; "))
        }
    }
}

/// Replace the automated deployments of `request.sha` in every requested environment
pub async fn replace_deployments<A>(
    api: &A,
    request: &ReplaceRequest,
) -> Result<RunReport, ActionError>
where
    A: DeploymentApi + ?Sized,
{
    let selection = Selection {
        sha: &request.sha,
        environments: &request.environments,
        automation_actor: &request.automation_actor,
    };
    let records = select_deployments(api, &request.repo, &selection).await?;

    if records.is_empty() && !request.create_if_missing {
        return Err(ActionError::NoDeploymentsFound {
            environment: request.environments.join(", "),
            sha: request.sha.clone(),
        });
    }

    let candidates = resolve_candidates(api, &request.repo, records).await?;
    let mut groups = group_by_environment(candidates);
    let mut report = RunReport::default();

    for environment in &request.environments {
        if groups.iter().any(|group| group.environment == *environment) {
            continue;
        }
        warn!("Nothing to replace in {}", environment);
        if request.create_if_missing {
            groups.push(ReplacementGroup::without_predecessor(environment.clone()));
        } else {
            report.errors.push(ActionError::NoDeploymentsFound {
                environment: environment.clone(),
                sha: request.sha.clone(),
            });
        }
    }

    info!("Replacing deployments in {} environment(s)", groups.len());

    for result in replace_all(api, request, &groups).await {
        match result {
            Ok(outcome) => report.outcomes.push(outcome),
            Err(e) => report.errors.push(e),
        }
    }

    Ok(report)
}
