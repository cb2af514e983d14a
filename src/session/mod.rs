//! Session lifecycle: one persisted token, one derived identity.
//!
//! The token lives in a single file under the data directory (there is no
//! multi-account support). Restoring, logging in and logging out all keep the
//! file and the in-memory state in step: an expired or undecodable token is
//! never left behind on disk.

pub mod claims;

pub use claims::User;

use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::api::{ApiError, LoginRequest, RegisterRequest, TaskApi};

const TOKEN_FILE: &str = "token";

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// Credential rejection, network failure and an unusable issued token all
    /// collapse into this; the caller only needs succeeded / failed.
    #[error("authentication failed")]
    InvalidCredentials,

    #[error("failed to persist session token: {0}")]
    Storage(#[from] io::Error),
}

pub struct SessionStore {
    token_path: PathBuf,
    session: Option<Session>,
}

impl SessionStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            token_path: data_dir.join(TOKEN_FILE),
            session: None,
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    /// Rebuild the session from the persisted token, if any. A token that
    /// fails to decode or whose expiry is not strictly in the future is
    /// purged from disk and treated as "no session".
    pub fn restore(&mut self) -> Option<&Session> {
        let token = match fs::read_to_string(&self.token_path) {
            Ok(raw) => raw.trim().to_string(),
            Err(_) => return None,
        };

        match claims::decode_user(&token, Utc::now()) {
            Ok(user) => {
                self.session = Some(Session { token, user });
                self.session.as_ref()
            }
            Err(err) => {
                debug!(%err, "purging persisted token");
                let _ = fs::remove_file(&self.token_path);
                None
            }
        }
    }

    /// Authenticate against the service and establish a session. The token
    /// is persisted before it is decoded; if the freshly issued token turns
    /// out to be undecodable the file is removed again so a failed login
    /// never leaves a half-authenticated state behind.
    pub async fn login(
        &mut self,
        api: &dyn TaskApi,
        email: &str,
        password: &str,
    ) -> Result<&Session, SessionError> {
        let response = api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .map_err(|err| {
                debug!(%err, "login request failed");
                SessionError::InvalidCredentials
            })?;

        self.persist(&response.token)?;

        match claims::decode_user(&response.token, Utc::now()) {
            Ok(user) => {
                let session = self.session.insert(Session {
                    token: response.token,
                    user,
                });
                Ok(&*session)
            }
            Err(err) => {
                debug!(%err, "issued token failed to decode");
                let _ = fs::remove_file(&self.token_path);
                self.session = None;
                Err(SessionError::InvalidCredentials)
            }
        }
    }

    /// Create an account. Establishes no session; the user logs in
    /// afterwards. Server rejections pass through unchanged.
    pub async fn register(
        &self,
        api: &dyn TaskApi,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        api.register(&RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })
        .await
    }

    /// Drop the session, synchronously. No server call is involved.
    pub fn logout(&mut self) {
        self.session = None;
        if let Err(err) = fs::remove_file(&self.token_path) {
            if err.kind() != io::ErrorKind::NotFound {
                debug!(%err, "failed to remove persisted token");
            }
        }
    }

    fn persist(&self, token: &str) -> Result<(), io::Error> {
        if let Some(parent) = self.token_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.token_path, token)
    }
}
