//! Replace Deployment - Entry Point
//!
//! Runs as a workflow step: inputs come from `INPUT_*` variables (or flags),
//! the run's context from `GITHUB_*` variables.

use std::process::ExitCode;

use clap::Parser;

use replace_deployment::app::context::ActionContext;
use replace_deployment::app::options::{Inputs, ReplaceOptions};
use replace_deployment::app::outputs::set_failed;
use replace_deployment::app::run::run;
use replace_deployment::logs::init_logging;
use replace_deployment::utils::version_info;

use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let inputs = Inputs::parse();

    let context = match ActionContext::from_env() {
        Ok(context) => context,
        Err(e) => {
            set_failed(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let options = match ReplaceOptions::from_inputs(inputs, &context) {
        Ok(options) => options,
        Err(e) => {
            set_failed(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(options.log.clone()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!("Running replace-deployment {:?}", version_info());

    match run(options, context).await {
        Ok(report) => match report.failure_message() {
            None => {
                info!("Replaced deployments in {} environment(s)", report.outcomes.len());
                ExitCode::SUCCESS
            }
            Some(message) => {
                error!("Replacement finished with failures: {}", message);
                set_failed(&message);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            error!("Failed to replace deployments: {e}");
            set_failed(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
