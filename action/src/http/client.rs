//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use deployments_api::ErrorResponse;

use crate::errors::ActionError;

const USER_AGENT: &str = concat!("replace-deployment/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

/// HTTP client for the GitHub REST API
pub struct HttpClient {
    client: Client,
    base_url: Url,
    token: SecretString,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, token: SecretString, timeout: Duration) -> Result<Self, ActionError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static(API_VERSION),
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        // A trailing slash keeps the last path segment when joining
        let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ActionError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }

    /// Make a GET request, failing on any non-success status
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ActionError> {
        let url = self.url(path)?;
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, self.bearer())
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error("GET", response).await);
        }

        decode(response).await
    }

    /// Make a POST request.
    ///
    /// Returns the status with the body when the call succeeded; a success
    /// code other than 201 keeps only the remote message.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(StatusCode, Result<T, String>), ActionError> {
        let url = self.url(path)?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header(header::AUTHORIZATION, self.bearer())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error("POST", response).await);
        }

        if status == StatusCode::CREATED {
            Ok((status, Ok(decode(response).await?)))
        } else {
            let text = response.text().await.unwrap_or_default();
            Ok((status, Err(remote_message(&text))))
        }
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<StatusCode, ActionError> {
        let url = self.url(path)?;
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(url)
            .header(header::AUTHORIZATION, self.bearer())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error("DELETE", response).await);
        }

        Ok(response.status())
    }
}

/// Decode a JSON body; a malformed body surfaces as `JsonError`
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ActionError> {
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

fn remote_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string())
}

async fn api_error(method: &str, response: Response) -> ActionError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!("HTTP {} failed: {} - {}", method, status, body);
    ActionError::ApiError {
        status: status.as_u16(),
        message: remote_message(&body),
    }
}
