//! In-memory deployment tracking service for tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use deployments_api::{
    Actor, CreateDeploymentRequest, CreateDeploymentStatusRequest, DeploymentRecord,
    DeploymentState, DeploymentStatus,
};
use replace_deployment::deploy::api::{ApiResponse, DeploymentApi, RepoRef};
use replace_deployment::deploy::ReplaceRequest;
use replace_deployment::errors::ActionError;

pub const BOT: &str = "github-actions[bot]";
pub const SHA: &str = "abc123";

/// Remote call, in the order it reached the fake
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List { environment: String },
    ListStatuses(u64),
    Create { environment: String },
    SetStatus(u64, DeploymentState),
    Delete(u64),
}

#[derive(Default)]
struct State {
    deployments: Vec<DeploymentRecord>,
    statuses: HashMap<u64, Vec<DeploymentStatus>>,
    status_requests: HashMap<u64, Vec<CreateDeploymentStatusRequest>>,
    ref_shas: HashMap<String, String>,
    reject_create: HashSet<String>,
    defer_create: HashSet<String>,
    reject_status: HashSet<u64>,
    reject_delete: HashSet<u64>,
    reject_list: HashSet<String>,
    reject_list_statuses: HashSet<u64>,
    list_oldest_first: bool,
    next_id: u64,
    clock: i64,
    calls: Vec<Call>,
}

impl State {
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(self.clock)
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn latest_state(&self, id: u64) -> Option<DeploymentState> {
        self.statuses
            .get(&id)?
            .iter()
            .max_by_key(|s| (s.updated_at, s.id))
            .map(|s| s.state)
    }
}

/// Mimics the GitHub deployments API closely enough for the replacement:
/// listing filters by sha and environment, newest first, and deleting a
/// deployment that is not inactive is refused.
pub struct FakeDeploymentApi {
    state: Mutex<State>,
}

impl FakeDeploymentApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 100,
                ..Default::default()
            }),
        }
    }

    /// Add an existing deployment; returns its id
    pub fn seed(&self, environment: &str, sha: &str, creator: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let at = state.tick();
        state.deployments.push(DeploymentRecord {
            id,
            sha: sha.to_string(),
            git_ref: "main".to_string(),
            environment: environment.to_string(),
            description: Some(format!("deploy {}", id)),
            creator: Some(Actor {
                login: creator.to_string(),
                kind: "Bot".to_string(),
            }),
            created_at: at,
            updated_at: at,
        });
        id
    }

    /// Add a status `minutes` into May 2024, before anything the fake writes
    /// itself. Stored at the front of the history so storage order never
    /// matches time order.
    pub fn seed_status(&self, deployment_id: u64, state_value: DeploymentState, minutes: i64) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes);
        state.statuses.entry(deployment_id).or_default().insert(
            0,
            DeploymentStatus {
                id,
                state: state_value,
                description: None,
                log_url: None,
                environment: None,
                created_at: at,
                updated_at: at,
            },
        );
    }

    pub fn resolve_ref(&self, git_ref: &str, sha: &str) {
        let mut state = self.state.lock().unwrap();
        state.ref_shas.insert(git_ref.to_string(), sha.to_string());
    }

    pub fn reject_create(&self, environment: &str) {
        self.state.lock().unwrap().reject_create.insert(environment.to_string());
    }

    pub fn defer_create(&self, environment: &str) {
        self.state.lock().unwrap().defer_create.insert(environment.to_string());
    }

    pub fn reject_status(&self, deployment_id: u64) {
        self.state.lock().unwrap().reject_status.insert(deployment_id);
    }

    pub fn reject_delete(&self, deployment_id: u64) {
        self.state.lock().unwrap().reject_delete.insert(deployment_id);
    }

    pub fn reject_list(&self, environment: &str) {
        self.state.lock().unwrap().reject_list.insert(environment.to_string());
    }

    pub fn reject_list_statuses(&self, deployment_id: u64) {
        self.state.lock().unwrap().reject_list_statuses.insert(deployment_id);
    }

    pub fn list_oldest_first(&self) {
        self.state.lock().unwrap().list_oldest_first = true;
    }

    pub fn deployments(&self) -> Vec<DeploymentRecord> {
        self.state.lock().unwrap().deployments.clone()
    }

    pub fn deployment(&self, id: u64) -> Option<DeploymentRecord> {
        self.deployments().into_iter().find(|d| d.id == id)
    }

    pub fn latest_state(&self, id: u64) -> Option<DeploymentState> {
        self.state.lock().unwrap().latest_state(id)
    }

    pub fn status_requests(&self, id: u64) -> Vec<CreateDeploymentStatusRequest> {
        self.state
            .lock()
            .unwrap()
            .status_requests
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::List { .. } | Call::ListStatuses(_)))
            .collect()
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }
}

#[async_trait]
impl DeploymentApi for FakeDeploymentApi {
    async fn list_deployments(
        &self,
        _repo: &RepoRef,
        sha: &str,
        environment: &str,
    ) -> Result<Vec<DeploymentRecord>, ActionError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List {
            environment: environment.to_string(),
        });

        if state.reject_list.contains(environment) {
            return Err(ActionError::ApiError {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }

        let mut found: Vec<DeploymentRecord> = state
            .deployments
            .iter()
            .filter(|d| d.sha == sha && d.environment == environment)
            .cloned()
            .collect();
        found.sort_by_key(|d| std::cmp::Reverse(d.id));
        if state.list_oldest_first {
            found.reverse();
        }
        Ok(found)
    }

    async fn list_deployment_statuses(
        &self,
        _repo: &RepoRef,
        deployment_id: u64,
    ) -> Result<Vec<DeploymentStatus>, ActionError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListStatuses(deployment_id));

        if state.reject_list_statuses.contains(&deployment_id) {
            return Err(ActionError::ApiError {
                status: 502,
                message: "Bad Gateway".to_string(),
            });
        }
        Ok(state.statuses.get(&deployment_id).cloned().unwrap_or_default())
    }

    async fn create_deployment(
        &self,
        _repo: &RepoRef,
        request: &CreateDeploymentRequest,
    ) -> Result<ApiResponse<DeploymentRecord>, ActionError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create {
            environment: request.environment.clone(),
        });

        if state.reject_create.contains(&request.environment) {
            return Err(ActionError::ApiError {
                status: 409,
                message: "Conflict: Commit status checks failed".to_string(),
            });
        }
        if state.defer_create.contains(&request.environment) {
            return Ok(ApiResponse::new(202, None).with_message("Auto-merged main into topic"));
        }
        assert!(!request.auto_merge);
        assert!(request.required_contexts.is_empty());

        let id = state.next_id();
        let at = state.tick();
        let sha = state
            .ref_shas
            .get(&request.git_ref)
            .cloned()
            .unwrap_or_else(|| request.git_ref.clone());
        let record = DeploymentRecord {
            id,
            sha,
            git_ref: request.git_ref.clone(),
            environment: request.environment.clone(),
            description: Some(request.description.clone()),
            creator: Some(Actor {
                login: BOT.to_string(),
                kind: "Bot".to_string(),
            }),
            created_at: at,
            updated_at: at,
        };
        state.deployments.push(record.clone());
        Ok(ApiResponse::new(201, Some(record)))
    }

    async fn create_deployment_status(
        &self,
        _repo: &RepoRef,
        deployment_id: u64,
        request: &CreateDeploymentStatusRequest,
    ) -> Result<ApiResponse<DeploymentStatus>, ActionError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::SetStatus(deployment_id, request.state));

        if state.reject_status.contains(&deployment_id)
            || !state.deployments.iter().any(|d| d.id == deployment_id)
        {
            return Err(ActionError::ApiError {
                status: 404,
                message: "Not Found".to_string(),
            });
        }

        let id = state.next_id();
        let at = state.tick();
        let status = DeploymentStatus {
            id,
            state: request.state,
            description: request.description.clone(),
            log_url: request.log_url.clone(),
            environment: None,
            created_at: at,
            updated_at: at,
        };
        state.statuses.entry(deployment_id).or_default().push(status.clone());
        state
            .status_requests
            .entry(deployment_id)
            .or_default()
            .push(request.clone());
        Ok(ApiResponse::new(201, Some(status)))
    }

    async fn delete_deployment(
        &self,
        _repo: &RepoRef,
        deployment_id: u64,
    ) -> Result<ApiResponse<()>, ActionError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete(deployment_id));

        if state.reject_delete.contains(&deployment_id) {
            return Err(ActionError::ApiError {
                status: 500,
                message: "Server Error".to_string(),
            });
        }
        if state.latest_state(deployment_id) != Some(DeploymentState::Inactive) {
            return Err(ActionError::ApiError {
                status: 422,
                message: "We cannot delete an active deployment unless it is the only deployment in a given environment.".to_string(),
            });
        }

        state.deployments.retain(|d| d.id != deployment_id);
        state.statuses.remove(&deployment_id);
        Ok(ApiResponse::new(204, Some(())))
    }
}

pub fn request(environments: &[&str]) -> ReplaceRequest {
    ReplaceRequest {
        repo: RepoRef::new("octo", "app"),
        sha: SHA.to_string(),
        environments: environments.iter().map(|e| e.to_string()).collect(),
        git_ref: "v1.2.0".to_string(),
        description: "release".to_string(),
        log_url: "https://github.com/octo/app/actions/runs/7".to_string(),
        automation_actor: BOT.to_string(),
        create_if_missing: false,
    }
}
