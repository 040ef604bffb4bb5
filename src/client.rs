//! HTTP client for the hosted backlog store.
//!
//! The store exposes a PostgREST-style REST surface over the backlog
//! tables. Configuration is via environment variables:
//! - `BACKLOG_API_URL` - Base URL of the store (default: `http://localhost:54321`)
//! - `BACKLOG_API_KEY` - API key, sent as both `apikey` and bearer token
//! - `BACKLOG_PROJECT_ID` - Project scope for all list queries (optional)

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;

/// Default URL for a local store instance.
const DEFAULT_URL: &str = "http://localhost:54321";

/// Project scope used when `BACKLOG_PROJECT_ID` is not set.
const DEFAULT_PROJECT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: API key required or invalid")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),

    #[error("Invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// The three flat record sets as delivered by one full load.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub stories: Vec<UserStory>,
    pub features: Vec<Feature>,
    pub tasks: Vec<Task>,
}

/// HTTP client for the backlog store API.
#[derive(Debug, Clone)]
pub struct BacklogClient {
    base_url: String,
    api_key: Option<String>,
    project_id: Uuid,
    client: Client,
}

impl BacklogClient {
    /// Create client from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var("BACKLOG_API_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let api_key = std::env::var("BACKLOG_API_KEY").ok();
        let project_id = std::env::var("BACKLOG_PROJECT_ID")
            .ok()
            .and_then(|s| Uuid::parse_str(&s).ok())
            .unwrap_or_else(|| Uuid::parse_str(DEFAULT_PROJECT_ID).expect("valid constant"));
        Self::new(base_url, api_key, project_id)
    }

    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, project_id: Uuid) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            project_id,
            client: Client::new(),
        }
    }

    /// Build a request with the store's auth headers.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/rest/v1{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.header("apikey", key).bearer_auth(key);
        }
        req
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            match status {
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(body)),
                StatusCode::BAD_REQUEST => Err(ClientError::BadRequest(body)),
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                _ => Err(ClientError::Server(format!("{}: {}", status, body))),
            }
        }
    }

    /// Handle response that may return empty body (204 No Content).
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            match status {
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(body)),
                StatusCode::BAD_REQUEST => Err(ClientError::BadRequest(body)),
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                _ => Err(ClientError::Server(format!("{}: {}", status, body))),
            }
        }
    }

    /// List one backlog table, scoped to the project and ordered by the
    /// store (sequence index ascending).
    async fn list<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>, ClientError> {
        let path = format!(
            "/{}?select=*&project_id=eq.{}&order=order_index.asc",
            table, self.project_id
        );
        let response = self.request(reqwest::Method::GET, &path).send().await?;
        self.handle_response(response).await
    }

    /// Issue a partial-field update by primary key.
    ///
    /// The access layer stamps `updated_at` on every update; the stamp is
    /// returned so the caller can patch its committed copy to match.
    async fn patch(
        &self,
        table: &str,
        id: Uuid,
        input: &impl Serialize,
    ) -> Result<DateTime<Utc>, ClientError> {
        let now = Utc::now();
        let mut body = serde_json::to_value(input)?;
        body.as_object_mut()
            .ok_or_else(|| ClientError::Server("update payload must be an object".to_string()))?
            .insert("updated_at".to_string(), serde_json::json!(now.to_rfc3339()));

        let response = self
            .request(reqwest::Method::PATCH, &format!("/{}?id=eq.{}", table, id))
            .json(&body)
            .send()
            .await?;
        self.handle_empty_response(response).await?;
        Ok(now)
    }

    // ============================================================
    // Story operations
    // ============================================================

    /// List all stories in the project, sequence-index order.
    pub async fn list_stories(&self) -> Result<Vec<UserStory>, ClientError> {
        self.list("user_stories").await
    }

    /// Update a story's editable fields.
    pub async fn update_story(
        &self,
        id: Uuid,
        input: &UpdateStoryInput,
    ) -> Result<DateTime<Utc>, ClientError> {
        self.patch("user_stories", id, input).await
    }

    // ============================================================
    // Feature operations
    // ============================================================

    /// List all features in the project, sequence-index order.
    pub async fn list_features(&self) -> Result<Vec<Feature>, ClientError> {
        self.list("features").await
    }

    /// Update a feature's editable fields.
    pub async fn update_feature(
        &self,
        id: Uuid,
        input: &UpdateFeatureInput,
    ) -> Result<DateTime<Utc>, ClientError> {
        self.patch("features", id, input).await
    }

    // ============================================================
    // Task operations
    // ============================================================

    /// List all tasks in the project, sequence-index order.
    pub async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        self.list("tasks").await
    }

    /// Update a task's editable fields.
    pub async fn update_task(
        &self,
        id: Uuid,
        input: &UpdateTaskInput,
    ) -> Result<DateTime<Utc>, ClientError> {
        self.patch("tasks", id, input).await
    }

    // ============================================================
    // Full load
    // ============================================================

    /// Fetch all three record sets concurrently.
    ///
    /// Fail-fast: if any fetch fails the whole load fails and the caller
    /// is expected to retry all three, never a partial subset.
    pub async fn load_all(&self) -> Result<Snapshot, ClientError> {
        let (stories, features, tasks) =
            tokio::try_join!(self.list_stories(), self.list_features(), self.list_tasks())?;
        Ok(Snapshot {
            stories,
            features,
            tasks,
        })
    }
}
