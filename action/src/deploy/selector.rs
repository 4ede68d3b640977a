//! Selection of the deployments eligible for replacement

use std::collections::HashSet;

use deployments_api::DeploymentRecord;
use futures::future::try_join_all;
use tracing::{debug, info};

use crate::deploy::api::{DeploymentApi, RepoRef};
use crate::errors::ActionError;

/// What makes a deployment eligible
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub sha: &'a str,
    pub environments: &'a [String],

    /// Login of the account automated deployments are created by
    pub automation_actor: &'a str,
}

impl Selection<'_> {
    /// Whether a record belongs to this run and was created by automation
    pub fn is_eligible(&self, record: &DeploymentRecord) -> bool {
        record.sha == self.sha
            && self.environments.iter().any(|env| *env == record.environment)
            && record
                .created_by()
                .is_some_and(|login| login.eq_ignore_ascii_case(self.automation_actor))
    }

    /// Keep eligible records, preserving order
    pub fn filter(&self, records: Vec<DeploymentRecord>) -> Vec<DeploymentRecord> {
        records
            .into_iter()
            .filter(|record| {
                let eligible = self.is_eligible(record);
                if !eligible {
                    debug!(
                        "Skipping deployment {} ({}, created by {:?})",
                        record.id,
                        record.environment,
                        record.created_by()
                    );
                }
                eligible
            })
            .collect()
    }
}

/// Fetch every requested environment's deployments and keep the eligible ones.
///
/// Returns an empty list when nothing qualifies; the caller decides whether
/// that is fatal.
pub async fn select_deployments<A>(
    api: &A,
    repo: &RepoRef,
    selection: &Selection<'_>,
) -> Result<Vec<DeploymentRecord>, ActionError>
where
    A: DeploymentApi + ?Sized,
{
    let listings = try_join_all(
        selection
            .environments
            .iter()
            .map(|environment| api.list_deployments(repo, selection.sha, environment)),
    )
    .await?;

    let records: Vec<DeploymentRecord> = listings.into_iter().flatten().collect();
    let listed = records.len();

    let mut eligible = selection.filter(records);
    let mut seen = HashSet::new();
    eligible.retain(|record| seen.insert(record.id));

    info!(
        "Found {} eligible of {} deployments at {} for {}",
        eligible.len(),
        listed,
        selection.sha,
        selection.environments.join(", ")
    );

    Ok(eligible)
}
