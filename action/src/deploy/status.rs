//! Latest-status resolution

use deployments_api::{DeploymentRecord, DeploymentStatus};
use futures::future::try_join_all;
use tracing::debug;

use crate::deploy::api::{DeploymentApi, RepoRef};
use crate::errors::ActionError;
use crate::models::deployment::ReplacementCandidate;

/// Most recent entry of an unordered status history.
///
/// Sorted descending on `updated_at`; equal timestamps go to the higher id.
pub fn latest_status(mut statuses: Vec<DeploymentStatus>) -> Option<DeploymentStatus> {
    statuses.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    statuses.into_iter().next()
}

/// Fetch every record's status history concurrently and pair it with its latest status
pub async fn resolve_candidates<A>(
    api: &A,
    repo: &RepoRef,
    records: Vec<DeploymentRecord>,
) -> Result<Vec<ReplacementCandidate>, ActionError>
where
    A: DeploymentApi + ?Sized,
{
    let histories = try_join_all(
        records
            .iter()
            .map(|record| api.list_deployment_statuses(repo, record.id)),
    )
    .await?;

    Ok(records
        .into_iter()
        .zip(histories)
        .map(|(record, statuses)| {
            let latest_status = latest_status(statuses);
            debug!(
                "Deployment {} latest status: {}",
                record.id,
                latest_status
                    .as_ref()
                    .map(|s| s.state.as_str())
                    .unwrap_or("none")
            );
            ReplacementCandidate {
                record,
                latest_status,
            }
        })
        .collect())
}
