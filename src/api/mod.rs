//! The gateway to the external task service.
//!
//! One configured HTTP client bound to one base URL, exposing the seven
//! operations the application consumes: register, login, and the five task
//! CRUD calls. The seam is the [`TaskApi`] trait so the stores can be
//! exercised against an in-memory double in tests.

mod client;
pub mod error;

pub use client::HttpTaskApi;
pub use error::ApiError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::tasks::{Task, TaskDraft};

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of a successful login. The token is what matters; username and email
/// are also embedded in its claims.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    pub email: String,
}

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError>;
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError>;
    async fn get_task(&self, id: i64) -> Result<Task, ApiError>;
    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError>;
    async fn update_task(&self, id: i64, draft: &TaskDraft) -> Result<Task, ApiError>;
    async fn delete_task(&self, id: i64) -> Result<(), ApiError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! An in-memory task service used by store and session tests.

    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingApi {
        pub tasks: Mutex<Vec<Task>>,
        pub calls: Mutex<Vec<String>>,
        /// Token handed out by `login`; `None` makes login fail with a 401.
        pub login_token: Option<String>,
        /// When set, every task call fails with this HTTP status.
        pub fail_with_status: Option<u16>,
        pub next_id: Mutex<i64>,
    }

    impl RecordingApi {
        pub fn with_tasks(tasks: Vec<Task>) -> Self {
            let next_id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
            Self {
                tasks: Mutex::new(tasks),
                next_id: Mutex::new(next_id),
                ..Self::default()
            }
        }

        pub fn with_login_token(token: &str) -> Self {
            Self {
                login_token: Some(token.to_string()),
                next_id: Mutex::new(1),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: impl Into<String>) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(call.into());
            match self.fail_with_status {
                Some(status) => Err(ApiError::Status {
                    status,
                    message: "injected failure".to_string(),
                }),
                None => Ok(()),
            }
        }

        fn materialize(&self, id: i64, draft: &TaskDraft) -> Task {
            Task {
                id,
                title: draft.title.clone(),
                description: draft.description.clone(),
                due_date: draft.due_date,
                priority: draft.priority,
                status: draft.status,
                category: draft.category.clone(),
                created_at: Utc::now(),
                user_id: 1,
            }
        }
    }

    #[async_trait]
    impl TaskApi for RecordingApi {
        async fn register(&self, _request: &RegisterRequest) -> Result<(), ApiError> {
            self.record("register")
        }

        async fn login(&self, _request: &LoginRequest) -> Result<AuthResponse, ApiError> {
            self.record("login")?;
            match &self.login_token {
                Some(token) => Ok(AuthResponse {
                    token: token.clone(),
                    username: "tester".to_string(),
                    email: "tester@example.com".to_string(),
                }),
                None => Err(ApiError::Status {
                    status: 401,
                    message: "invalid credentials".to_string(),
                }),
            }
        }

        async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
            self.record("list")?;
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn get_task(&self, id: i64) -> Result<Task, ApiError> {
            self.record(format!("get {id}"))?;
            self.tasks
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or(ApiError::Status {
                    status: 404,
                    message: "task not found".to_string(),
                })
        }

        async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
            self.record("create")?;
            let mut next_id = self.next_id.lock().unwrap();
            let task = self.materialize(*next_id, draft);
            *next_id += 1;
            self.tasks.lock().unwrap().push(task.clone());
            Ok(task)
        }

        async fn update_task(&self, id: i64, draft: &TaskDraft) -> Result<Task, ApiError> {
            self.record(format!("update {id}"))?;
            let mut tasks = self.tasks.lock().unwrap();
            let slot = tasks.iter_mut().find(|t| t.id == id).ok_or(ApiError::Status {
                status: 404,
                message: "task not found".to_string(),
            })?;
            let replacement = self.materialize(id, draft);
            *slot = replacement.clone();
            Ok(replacement)
        }

        async fn delete_task(&self, id: i64) -> Result<(), ApiError> {
            self.record(format!("delete {id}"))?;
            self.tasks.lock().unwrap().retain(|t| t.id != id);
            Ok(())
        }
    }
}
