use async_trait::async_trait;
use reqwest::{header, Client, Response};
use std::time::Duration;
use tracing::debug;

use super::{ApiError, AuthResponse, LoginRequest, RegisterRequest, TaskApi};
use crate::tasks::{Task, TaskDraft};

/// The reqwest-backed gateway. When a session token is present it is
/// installed as a default `Authorization: Bearer` header, so every request
/// carries it; without a token requests go out unauthenticated.
#[derive(Debug)]
pub struct HttpTaskApi {
    http: Client,
    base_url: String,
}

impl HttpTaskApi {
    pub fn new(base_url: impl Into<String>, token: Option<&str>) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = token {
            let value = format!("Bearer {}", token)
                .parse()
                .map_err(|_| ApiError::InvalidToken)?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into `ApiError::Status`, carrying whatever the
    /// server put in the body.
    async fn ok_or_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), %message, "request rejected");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(request)
            .send()
            .await?;
        Self::ok_or_status(response).await?;
        Ok(())
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(request)
            .send()
            .await?;
        Ok(Self::ok_or_status(response).await?.json().await?)
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let response = self.http.get(self.url("/tasks")).send().await?;
        Ok(Self::ok_or_status(response).await?.json().await?)
    }

    async fn get_task(&self, id: i64) -> Result<Task, ApiError> {
        let response = self.http.get(self.url(&format!("/tasks/{id}"))).send().await?;
        Ok(Self::ok_or_status(response).await?.json().await?)
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        let response = self
            .http
            .post(self.url("/tasks"))
            .json(draft)
            .send()
            .await?;
        Ok(Self::ok_or_status(response).await?.json().await?)
    }

    async fn update_task(&self, id: i64, draft: &TaskDraft) -> Result<Task, ApiError> {
        let response = self
            .http
            .put(self.url(&format!("/tasks/{id}")))
            .json(draft)
            .send()
            .await?;
        Ok(Self::ok_or_status(response).await?.json().await?)
    }

    async fn delete_task(&self, id: i64) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/tasks/{id}")))
            .send()
            .await?;
        Self::ok_or_status(response).await?;
        Ok(())
    }
}
