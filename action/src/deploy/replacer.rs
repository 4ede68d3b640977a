//! Replacement of one environment's deployments
//!
//! Per group the steps run in a fixed order, tracked by [`ReplacementFsm`]:
//! create the new deployment, give it the carried-over status, mark every old
//! deployment inactive, then delete the ones that were marked. Creation and the
//! new deployment's status are fatal for the group. Once the new deployment
//! exists the group always yields an outcome carrying its id. Marking and
//! deleting old deployments is attempted for every record and failures are
//! collected.

use deployments_api::{CreateDeploymentRequest, CreateDeploymentStatusRequest, DeploymentState};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::deploy::api::DeploymentApi;
use crate::deploy::fsm::{ReplacementEvent, ReplacementFsm};
use crate::deploy::ReplaceRequest;
use crate::errors::ActionError;
use crate::models::deployment::{GroupOutcome, RecordFailure, ReplacementGroup};

const CREATED: u16 = 201;
const NO_CONTENT: u16 = 204;

fn advance(fsm: &mut ReplacementFsm, event: ReplacementEvent) -> Result<(), ActionError> {
    fsm.process(event).map_err(ActionError::Internal)
}

/// Outcome of a group whose new deployment was created but never got a status
fn failed_activation(
    fsm: &ReplacementFsm,
    environment: &str,
    state: DeploymentState,
) -> Result<GroupOutcome, ActionError> {
    let deployment_id = fsm
        .deployment_id()
        .ok_or_else(|| ActionError::Internal(format!("No deployment created in {}", environment)))?;

    Ok(GroupOutcome {
        environment: environment.to_string(),
        deployment_id,
        state,
        superseded: Vec::new(),
        deleted: Vec::new(),
        activation_failure: Some(RecordFailure {
            deployment_id,
            reason: fsm.error().unwrap_or_default().to_string(),
        }),
        inactive_failures: Vec::new(),
        delete_failures: Vec::new(),
        stage: fsm.stage(),
    })
}

/// Replace every group concurrently; one result per group, in input order
pub async fn replace_all<A>(
    api: &A,
    request: &ReplaceRequest,
    groups: &[ReplacementGroup],
) -> Vec<Result<GroupOutcome, ActionError>>
where
    A: DeploymentApi + ?Sized,
{
    join_all(groups.iter().map(|group| replace_group(api, request, group))).await
}

/// Replace the deployments of one environment with a single new deployment
pub async fn replace_group<A>(
    api: &A,
    request: &ReplaceRequest,
    group: &ReplacementGroup,
) -> Result<GroupOutcome, ActionError>
where
    A: DeploymentApi + ?Sized,
{
    let repo = &request.repo;
    let environment = group.environment.as_str();
    let mut fsm = ReplacementFsm::new();
    let state = group.carried_state();

    match group.representative() {
        Some(representative) => info!(
            "Replacing deployment {}: {}",
            representative.record.id,
            representative.record.description.as_deref().unwrap_or("")
        ),
        None => info!("No deployment to replace in {}, creating a fresh one", environment),
    }

    // 1. New deployment
    let create = CreateDeploymentRequest::ungated(&request.git_ref, &request.description, environment);
    let created = match api.create_deployment(repo, &create).await {
        Ok(response) => response.expect_status(CREATED),
        Err(e) => Err(e.to_string()),
    };
    let deployment = match created {
        Ok(deployment) => deployment,
        Err(reason) => {
            debug!("Create new deployment for {} returned: {}", environment, reason);
            advance(&mut fsm, ReplacementEvent::Fail(reason.clone()))?;
            return Err(ActionError::CreateDeploymentFailed {
                environment: environment.to_string(),
                reason,
            });
        }
    };
    advance(&mut fsm, ReplacementEvent::Created(deployment.id))?;
    info!("Created deployment {} in {}", deployment.id, environment);

    // 2. Carry the status over
    let activate = CreateDeploymentStatusRequest {
        state,
        log_url: Some(request.log_url.clone()),
        description: Some(request.description.clone()),
        auto_inactive: Some(true),
    };
    let activated = match api
        .create_deployment_status(repo, deployment.id, &activate)
        .await
    {
        Ok(response) => response.expect_status(CREATED).map(|_| ()),
        Err(e) => Err(e.to_string()),
    };
    if let Err(reason) = activated {
        error!(
            "Failed to set status of new deployment {}: {}",
            deployment.id, reason
        );
        advance(&mut fsm, ReplacementEvent::Fail(reason))?;
        return failed_activation(&fsm, environment, state);
    }
    advance(&mut fsm, ReplacementEvent::Activated)?;
    info!("Deployment {} set to {}", deployment.id, state);

    // 3. Mark every old deployment inactive
    let inactive = CreateDeploymentStatusRequest::inactive();
    let inactive = &inactive;
    let marks = join_all(group.candidates.iter().map(|candidate| async move {
        let id = candidate.record.id;
        let result = match api.create_deployment_status(repo, id, inactive).await {
            Ok(response) => response.expect_status(CREATED).map(|_| ()),
            Err(e) => Err(e.to_string()),
        };
        (id, result)
    }))
    .await;

    let mut superseded = Vec::new();
    let mut inactive_failures = Vec::new();
    for (deployment_id, result) in marks {
        match result {
            Ok(()) => {
                debug!("Deployment {} marked inactive", deployment_id);
                superseded.push(deployment_id);
            }
            Err(reason) => {
                warn!("Failed to mark deployment {} inactive: {}", deployment_id, reason);
                inactive_failures.push(RecordFailure {
                    deployment_id,
                    reason,
                });
            }
        }
    }
    advance(
        &mut fsm,
        ReplacementEvent::Superseded {
            failed: inactive_failures.len(),
        },
    )?;

    // 4. Delete what was superseded, all-settled
    let deletions = join_all(superseded.iter().map(|&id| async move {
        let result = match api.delete_deployment(repo, id).await {
            Ok(response) => response.expect_status(NO_CONTENT),
            Err(e) => Err(e.to_string()),
        };
        (id, result)
    }))
    .await;

    let mut deleted = Vec::new();
    let mut delete_failures = Vec::new();
    for (deployment_id, result) in deletions {
        match result {
            Ok(()) => deleted.push(deployment_id),
            Err(reason) => {
                error!("Failed to delete deployment {}: {}", deployment_id, reason);
                delete_failures.push(RecordFailure {
                    deployment_id,
                    reason,
                });
            }
        }
    }
    advance(
        &mut fsm,
        ReplacementEvent::Cleaned {
            failed: delete_failures.len(),
        },
    )?;

    if fsm.is_clean() {
        info!(
            "Replaced {} deployment(s) in {} with {}",
            deleted.len(),
            environment,
            deployment.id
        );
    } else {
        warn!(
            "Replaced deployments in {} with {}, {} old deployment(s) left behind",
            environment,
            deployment.id,
            fsm.soft_failures()
        );
    }

    Ok(GroupOutcome {
        environment: environment.to_string(),
        deployment_id: deployment.id,
        state,
        superseded,
        deleted,
        activation_failure: None,
        inactive_failures,
        delete_failures,
        stage: fsm.stage(),
    })
}
