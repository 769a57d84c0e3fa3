//! reqwest-backed implementation of [`PlannerStore`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{AiPrompt, AiReply, ApiError, PlannerStore, Resource};
use crate::models::{DailyFocus, Goal, Lesson, Note, RecordId, ScheduleEntry, Task};

/// HTTP client bound to one deployed backend origin.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    /// Build a client for `base_url`. No request timeout is applied unless
    /// one is given.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::Config(base_url));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), "request failed");
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self.send(&url, self.http.get(&url)).await?;
        Self::decode(&url, response).await
    }

    #[instrument(skip(self, body))]
    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: &Value,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.url(path);
        debug!(url = %url, method = %method, "sending JSON body");
        self.send(&url, self.http.request(method, &url).json(body)).await
    }
}

#[async_trait]
impl PlannerStore for RestClient {
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.get_json(Resource::Tasks.path()).await
    }

    async fn list_goals(&self) -> Result<Vec<Goal>, ApiError> {
        self.get_json(Resource::Goals.path()).await
    }

    async fn list_lessons(&self) -> Result<Vec<Lesson>, ApiError> {
        self.get_json(Resource::Lessons.path()).await
    }

    async fn list_notes(&self) -> Result<Vec<Note>, ApiError> {
        self.get_json(Resource::Notes.path()).await
    }

    async fn list_schedule(&self) -> Result<Vec<ScheduleEntry>, ApiError> {
        self.get_json(Resource::Schedule.path()).await
    }

    async fn create(&self, resource: Resource, body: &Value) -> Result<(), ApiError> {
        self.send_json(Method::POST, resource.path(), body).await?;
        Ok(())
    }

    async fn update(
        &self,
        resource: Resource,
        id: &RecordId,
        body: &Value,
    ) -> Result<(), ApiError> {
        let path = format!("{}/{}", resource.path(), id);
        self.send_json(Method::PUT, &path, body).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, resource: Resource, id: &RecordId) -> Result<(), ApiError> {
        let url = self.url(&format!("{}/{}", resource.path(), id));
        debug!(url = %url, "DELETE");
        self.send(&url, self.http.delete(&url)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn focus(&self, date: &str) -> Result<Option<DailyFocus>, ApiError> {
        let url = self.url("/focus");
        let request = self.http.get(&url).query(&[("date", date)]);
        let response = match self.send(&url, request).await {
            Ok(response) => response,
            Err(ApiError::Status { status, .. }) => {
                debug!(status, "no focus stored for {}", date);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let focus: Option<DailyFocus> = Self::decode(&url, response).await?;
        Ok(focus.filter(|f| !f.focus.trim().is_empty()))
    }

    async fn save_focus(&self, focus: &DailyFocus) -> Result<(), ApiError> {
        let body = serde_json::to_value(focus)?;
        self.send_json(Method::POST, "/focus", &body).await?;
        Ok(())
    }

    async fn ask(&self, prompt: &str) -> Result<AiReply, ApiError> {
        let body = serde_json::to_value(AiPrompt { prompt })?;
        let response = self.send_json(Method::POST, "/ai", &body).await?;
        Self::decode(&format!("{}/ai", self.base_url), response).await
    }
}
