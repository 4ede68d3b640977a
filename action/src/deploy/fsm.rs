//! Finite State Machine for replacing one environment's deployment

use serde::{Deserialize, Serialize};

/// Replacement stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementStage {
    /// Nothing written yet
    Pending,

    /// New deployment exists
    Created,

    /// New deployment carries its first status
    Activated,

    /// Old deployments were marked inactive
    Superseded,

    /// Old deployments were deleted
    Cleaned,

    /// A fatal step was rejected
    Failed,
}

/// Replacement event
#[derive(Debug, Clone)]
pub enum ReplacementEvent {
    /// Remote acknowledged the new deployment
    Created(u64),

    /// Remote acknowledged the new deployment's status
    Activated,

    /// Inactive status attempted on every old deployment
    Superseded { failed: usize },

    /// Deletion attempted on every superseded deployment
    Cleaned { failed: usize },

    /// Fatal rejection
    Fail(String),
}

/// Replacement FSM
#[derive(Debug, Clone)]
pub struct ReplacementFsm {
    stage: ReplacementStage,
    deployment_id: Option<u64>,
    error: Option<String>,
    soft_failures: usize,
}

impl ReplacementFsm {
    /// Create a new FSM in pending stage
    pub fn new() -> Self {
        Self {
            stage: ReplacementStage::Pending,
            deployment_id: None,
            error: None,
            soft_failures: 0,
        }
    }

    /// Get current stage
    pub fn stage(&self) -> ReplacementStage {
        self.stage
    }

    /// Id of the new deployment once created
    pub fn deployment_id(&self) -> Option<u64> {
        self.deployment_id
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of per-record failures tolerated so far
    pub fn soft_failures(&self) -> usize {
        self.soft_failures
    }

    /// Process an event and transition stage
    pub fn process(&mut self, event: ReplacementEvent) -> Result<(), String> {
        let new_stage = match (self.stage, &event) {
            (ReplacementStage::Pending, ReplacementEvent::Created(id)) => {
                self.deployment_id = Some(*id);
                ReplacementStage::Created
            }
            (ReplacementStage::Created, ReplacementEvent::Activated) => ReplacementStage::Activated,
            (ReplacementStage::Activated, ReplacementEvent::Superseded { failed }) => {
                self.soft_failures += failed;
                ReplacementStage::Superseded
            }
            (ReplacementStage::Superseded, ReplacementEvent::Cleaned { failed }) => {
                self.soft_failures += failed;
                ReplacementStage::Cleaned
            }

            (ReplacementStage::Cleaned | ReplacementStage::Failed, ReplacementEvent::Fail(_)) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", self.stage, event));
            }
            (_, ReplacementEvent::Fail(err)) => {
                self.error = Some(err.clone());
                ReplacementStage::Failed
            }

            // Invalid transitions
            (stage, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", stage, event));
            }
        };

        self.stage = new_stage;
        Ok(())
    }

    /// Whether the replacement finished with every old deployment gone
    pub fn is_clean(&self) -> bool {
        self.stage == ReplacementStage::Cleaned && self.soft_failures == 0
    }
}

impl Default for ReplacementFsm {
    fn default() -> Self {
        Self::new()
    }
}
