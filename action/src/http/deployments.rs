//! Deployment API client

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use deployments_api::{
    CreateDeploymentRequest, CreateDeploymentStatusRequest, DeploymentRecord, DeploymentStatus,
};

use crate::deploy::api::{ApiResponse, DeploymentApi, RepoRef};
use crate::errors::ActionError;
use crate::http::client::HttpClient;

/// Largest page the API serves
const PER_PAGE: usize = 100;

impl HttpClient {
    /// Fetch every page of a list endpoint
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ActionError> {
        let mut items = Vec::new();
        let mut page = 1usize;

        loop {
            let mut paged = query.to_vec();
            paged.push(("per_page", PER_PAGE.to_string()));
            paged.push(("page", page.to_string()));

            let batch: Vec<T> = self.get(path, &paged).await?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);

            if done {
                return Ok(items);
            }
            page += 1;
        }
    }
}

fn deployments_path(repo: &RepoRef) -> String {
    format!("/repos/{}/{}/deployments", repo.owner, repo.name)
}

#[async_trait]
impl DeploymentApi for HttpClient {
    async fn list_deployments(
        &self,
        repo: &RepoRef,
        sha: &str,
        environment: &str,
    ) -> Result<Vec<DeploymentRecord>, ActionError> {
        let query = [
            ("sha", sha.to_string()),
            ("environment", environment.to_string()),
        ];
        self.get_all(&deployments_path(repo), &query).await
    }

    async fn list_deployment_statuses(
        &self,
        repo: &RepoRef,
        deployment_id: u64,
    ) -> Result<Vec<DeploymentStatus>, ActionError> {
        let path = format!("{}/{}/statuses", deployments_path(repo), deployment_id);
        self.get_all(&path, &[]).await
    }

    async fn create_deployment(
        &self,
        repo: &RepoRef,
        request: &CreateDeploymentRequest,
    ) -> Result<ApiResponse<DeploymentRecord>, ActionError> {
        let (status, body) = self.post(&deployments_path(repo), request).await?;
        Ok(into_response(status.as_u16(), body))
    }

    async fn create_deployment_status(
        &self,
        repo: &RepoRef,
        deployment_id: u64,
        request: &CreateDeploymentStatusRequest,
    ) -> Result<ApiResponse<DeploymentStatus>, ActionError> {
        let path = format!("{}/{}/statuses", deployments_path(repo), deployment_id);
        let (status, body) = self.post(&path, request).await?;
        Ok(into_response(status.as_u16(), body))
    }

    async fn delete_deployment(
        &self,
        repo: &RepoRef,
        deployment_id: u64,
    ) -> Result<ApiResponse<()>, ActionError> {
        let path = format!("{}/{}", deployments_path(repo), deployment_id);
        let status = self.delete(&path).await?;
        Ok(ApiResponse::new(status.as_u16(), Some(())))
    }
}

fn into_response<T>(status: u16, body: Result<T, String>) -> ApiResponse<T> {
    match body {
        Ok(data) => ApiResponse::new(status, Some(data)),
        Err(message) => ApiResponse::new(status, None).with_message(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let repo = RepoRef::new("octo", "app");
        assert_eq!(deployments_path(&repo), "/repos/octo/app/deployments");
    }

    #[test]
    fn test_deferred_creation_has_no_data() {
        let response = into_response::<u64>(202, Err("Auto-merged main into topic".to_string()));
        assert_eq!(response.status, 202);
        assert!(response.data.is_none());
        assert!(response.expect_status(201).is_err());
    }
}
