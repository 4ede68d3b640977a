//! Step outputs and failure reporting

use std::path::PathBuf;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::errors::ActionError;
use crate::models::deployment::GroupOutcome;
use crate::utils::sanitize_environment_name;

/// Output name used when a single environment was replaced
pub const DEPLOYMENT_ID_OUTPUT: &str = "deployment_id";

/// Name/value pairs to publish for the replaced groups
pub fn outputs_for(outcomes: &[GroupOutcome]) -> Vec<(String, String)> {
    let mut outputs: Vec<(String, String)> = outcomes
        .iter()
        .map(|outcome| {
            (
                format!(
                    "{}_{}",
                    DEPLOYMENT_ID_OUTPUT,
                    sanitize_environment_name(&outcome.environment)
                ),
                outcome.deployment_id.to_string(),
            )
        })
        .collect();

    if let [only] = outcomes {
        outputs.push((DEPLOYMENT_ID_OUTPUT.to_string(), only.deployment_id.to_string()));
    }

    outputs
}

/// Escape a message for a workflow command
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Destination of step outputs
#[derive(Debug, Clone)]
pub struct ActionOutputs {
    output_file: Option<PathBuf>,
}

impl ActionOutputs {
    /// Write to `output_file` when the runner provides one, otherwise to stdout
    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self { output_file }
    }

    pub async fn set_output(&self, name: &str, value: &str) -> Result<(), ActionError> {
        match &self.output_file {
            Some(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(format!("{}={}\n", name, value).as_bytes())
                    .await?;
                file.flush().await?;
            }
            None => println!("::set-output name={}::{}", name, escape_data(value)),
        }
        Ok(())
    }

    pub async fn set_outputs(&self, outputs: &[(String, String)]) -> Result<(), ActionError> {
        for (name, value) in outputs {
            self.set_output(name, value).await?;
        }
        Ok(())
    }
}

/// Report the run as failed
pub fn set_failed(message: &str) {
    println!("::error::{}", escape_data(message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::fsm::ReplacementStage;
    use deployments_api::DeploymentState;

    fn outcome(environment: &str, deployment_id: u64) -> GroupOutcome {
        GroupOutcome {
            environment: environment.to_string(),
            deployment_id,
            state: DeploymentState::Success,
            superseded: vec![],
            deleted: vec![],
            activation_failure: None,
            inactive_failures: vec![],
            delete_failures: vec![],
            stage: ReplacementStage::Cleaned,
        }
    }

    #[test]
    fn test_single_group_also_sets_plain_output() {
        let outputs = outputs_for(&[outcome("Production", 42)]);
        assert_eq!(
            outputs,
            vec![
                ("deployment_id_production".to_string(), "42".to_string()),
                ("deployment_id".to_string(), "42".to_string()),
            ]
        );
    }

    #[test]
    fn test_multiple_groups_are_keyed_by_environment() {
        let outputs = outputs_for(&[outcome("production", 1), outcome("staging-eu", 2)]);
        let names: Vec<&str> = outputs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["deployment_id_production", "deployment_id_staging_eu"]);
    }

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("50% done\nnext"), "50%25 done%0Anext");
    }

    #[tokio::test]
    async fn test_outputs_append_to_file() {
        let path = std::env::temp_dir().join(format!(
            "replace-deployment-outputs-{}-{}",
            std::process::id(),
            line!()
        ));
        let _ = tokio::fs::remove_file(&path).await;

        let outputs = ActionOutputs::new(Some(path.clone()));
        outputs.set_output("deployment_id", "1").await.unwrap();
        outputs
            .set_outputs(&[("deployment_id_staging".to_string(), "2".to_string())])
            .await
            .unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, "deployment_id=1\ndeployment_id_staging=2\n");
        let _ = tokio::fs::remove_file(&path).await;
    }
}
