use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::config::{ClientConfig, APP_NAME, APP_VERSION};
use crate::session::{Session, User};

const LOGIN_PATH: &str = "/api/auth/login";
const ME_PATH: &str = "/api/auth/me";

/// Thin wrapper over `reqwest::Client` bound to one backend and one
/// session. Every request goes through [`ApiClient::send`], which attaches
/// the bearer token and ends the session on a 401.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    session: Arc<Session>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    user: Option<User>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(format!("{APP_NAME}/{APP_VERSION}"));
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    /// Send with the session's credential. Non-success statuses become
    /// [`ApiError`]s; a 401 additionally invalidates the session.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let request = match self.session.bearer() {
            Some(bearer) => request.header(AUTHORIZATION, bearer),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status.as_u16(), &body);
        if err.is_unauthorized() {
            tracing::warn!("Backend rejected the credential, ending session");
            self.session.invalidate();
        } else {
            tracing::debug!(status = status.as_u16(), "Backend returned an error status");
        }
        Err(err)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.get(path).header(ACCEPT, "application/json")).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Raw bytes of a `GET`.
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.send(self.get(path)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Exchange credentials for a token and store it in the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<User>, ApiError> {
        let request = self.post(LOGIN_PATH).json(&LoginRequest { username, password });
        let response = self.send(request).await?;
        let body = response.bytes().await?;
        let login: LoginResponse = serde_json::from_slice(&body)?;

        self.session
            .sign_in(login.access_token, login.user.clone())
            .map_err(|e| ApiError::Transport(format!("could not store session: {e}")))?;
        tracing::info!(username, "Signed in");
        Ok(login.user)
    }

    /// Ask the backend who the held token belongs to.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let user: User = self.get_json(ME_PATH).await?;
        if let Err(e) = self.session.set_user(user.clone()) {
            tracing::warn!(error = %e, "Could not persist user profile");
        }
        Ok(user)
    }

    /// Validate a token restored from disk. Any failure clears it; the
    /// caller is simply signed out.
    pub async fn restore_session(&self) -> Option<User> {
        if !self.session.is_authenticated() {
            return None;
        }
        match self.current_user().await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::info!(error = %e, "Stored session is no longer valid");
                self.session.logout();
                None
            }
        }
    }
}
