//! Client-side API errors and their user-facing messages.

use serde_json::Value;

/// Shown when a request never produced a usable response.
pub const UNREACHABLE_MESSAGE: &str = "Could not reach the server.";

/// Shown when the server failed without a readable `detail`.
pub const PROCESSING_FAILED_MESSAGE: &str = "An error occurred while processing the request.";

/// Shown when the credential was rejected and no detail was given.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Every way a backend call can fail, split by who detected it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// No response: connection refused, timeout, broken stream.
    #[error("Transport error: {0}")]
    Transport(String),
    /// A response arrived but could not be understood.
    #[error("Malformed response: {0}")]
    Decode(String),
    /// The server answered with a non-success status.
    #[error("Server returned {status}")]
    Server { status: u16, detail: Option<String> },
    /// 401. The session has already been invalidated when this is returned.
    #[error("Authentication rejected")]
    Unauthorized { detail: Option<String> },
}

impl ApiError {
    /// Build from a non-success status and its raw body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = extract_detail(body);
        if status == 401 {
            ApiError::Unauthorized { detail }
        } else {
            ApiError::Server { status, detail }
        }
    }

    /// Message suitable for display. Server details are passed through
    /// verbatim; everything else collapses to a generic sentence.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server { detail: Some(detail), .. }
            | ApiError::Unauthorized { detail: Some(detail) } => detail.clone(),
            ApiError::Server { detail: None, .. } => PROCESSING_FAILED_MESSAGE.to_string(),
            ApiError::Unauthorized { detail: None } => SESSION_EXPIRED_MESSAGE.to_string(),
            ApiError::Transport(_) | ApiError::Decode(_) => UNREACHABLE_MESSAGE.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else if e.is_timeout() {
            ApiError::Transport("request timed out".into())
        } else if e.is_connect() {
            ApiError::Transport(format!(
                "connection failed{}",
                e.url().map(|u| format!(" ({u})")).unwrap_or_default()
            ))
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// FastAPI-style `{"detail": "..."}`. Only a string detail is treated as
/// human-readable; validation arrays and other shapes are ignored.
fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
        _ => None,
    }
}
