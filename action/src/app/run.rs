//! Run entry point

use tracing::info;

use crate::app::context::ActionContext;
use crate::app::options::ReplaceOptions;
use crate::app::outputs::{outputs_for, ActionOutputs};
use crate::deploy::api::DeploymentApi;
use crate::deploy::{replace_deployments, ReplaceRequest, RunReport};
use crate::errors::ActionError;
use crate::http::client::HttpClient;

/// Combine options and context into the request for one run
pub fn build_request(options: &ReplaceOptions, context: &ActionContext) -> ReplaceRequest {
    ReplaceRequest {
        repo: context.repo.clone(),
        sha: context.sha.clone(),
        environments: options.environments.clone(),
        git_ref: options.git_ref.clone(),
        description: options.description.clone(),
        log_url: context.run_url(),
        automation_actor: options.automation_actor.clone(),
        create_if_missing: options.create_if_missing,
    }
}

/// Run the replacement against the GitHub API
pub async fn run(options: ReplaceOptions, context: ActionContext) -> Result<RunReport, ActionError> {
    let client = HttpClient::new(&context.api_url, options.token.clone(), options.http_timeout)?;
    run_with(&client, &options, &context).await
}

/// Run the replacement against `api` and publish the outputs of every
/// group that produced a deployment
pub async fn run_with<A>(
    api: &A,
    options: &ReplaceOptions,
    context: &ActionContext,
) -> Result<RunReport, ActionError>
where
    A: DeploymentApi + ?Sized,
{
    let request = build_request(options, context);
    info!(
        "Replacing deployments of {} at {} in {}",
        request.repo,
        request.sha,
        request.environments.join(", ")
    );

    let report = replace_deployments(api, &request).await?;

    let outputs = ActionOutputs::new(context.output_file.clone());
    outputs.set_outputs(&outputs_for(&report.outcomes)).await?;

    Ok(report)
}
