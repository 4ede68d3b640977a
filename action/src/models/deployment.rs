//! In-run replacement models

use deployments_api::{DeploymentRecord, DeploymentState, DeploymentStatus};

use crate::deploy::fsm::ReplacementStage;

/// An eligible deployment paired with its most recent status
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementCandidate {
    pub record: DeploymentRecord,

    /// `None` when the deployment has no status history
    pub latest_status: Option<DeploymentStatus>,
}

impl ReplacementCandidate {
    /// State carried over to the replacement, `success` when unknown
    pub fn carried_state(&self) -> DeploymentState {
        self.latest_status
            .as_ref()
            .map(|status| status.state)
            .unwrap_or(DeploymentState::Success)
    }
}

/// Eligible deployments of one environment
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementGroup {
    pub environment: String,

    /// In selector order. Empty only for a group without predecessor.
    pub candidates: Vec<ReplacementCandidate>,
}

impl ReplacementGroup {
    /// Group for an environment that has nothing to replace
    pub fn without_predecessor(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            candidates: Vec::new(),
        }
    }

    /// The candidate whose status the replacement inherits.
    ///
    /// Newest `created_at` wins, ties go to the highest id.
    pub fn representative(&self) -> Option<&ReplacementCandidate> {
        self.candidates
            .iter()
            .max_by_key(|candidate| (candidate.record.created_at, candidate.record.id))
    }

    /// State for the new deployment's first status
    pub fn carried_state(&self) -> DeploymentState {
        self.representative()
            .map(ReplacementCandidate::carried_state)
            .unwrap_or(DeploymentState::Success)
    }

    pub fn deployment_ids(&self) -> Vec<u64> {
        self.candidates.iter().map(|c| c.record.id).collect()
    }
}

/// A per-record failure that did not abort the group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub deployment_id: u64,
    pub reason: String,
}

/// Result of replacing one group that got as far as creating a deployment
#[derive(Debug, Clone, PartialEq)]
pub struct GroupOutcome {
    pub environment: String,

    /// Id of the newly created deployment
    pub deployment_id: u64,

    /// State given to the new deployment
    pub state: DeploymentState,

    /// Old deployments marked inactive
    pub superseded: Vec<u64>,

    /// Old deployments deleted
    pub deleted: Vec<u64>,

    /// Set when the new deployment's status was rejected; nothing old was
    /// touched then
    pub activation_failure: Option<RecordFailure>,

    pub inactive_failures: Vec<RecordFailure>,
    pub delete_failures: Vec<RecordFailure>,

    /// Last stage reached
    pub stage: ReplacementStage,
}

impl GroupOutcome {
    pub fn is_clean(&self) -> bool {
        self.activation_failure.is_none()
            && self.inactive_failures.is_empty()
            && self.delete_failures.is_empty()
    }
}
