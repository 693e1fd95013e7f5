//! Session context owned by the caller and injected into the API client.
//!
//! Holds the bearer token and signed-in user, optionally persisted to a
//! JSON file so a restart picks the token back up. Any authorization
//! failure reported by the client calls [`Session::invalidate`], which
//! clears the token everywhere and notifies registered logout observers
//! exactly once per signed-in period.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is corrupted: {0}")]
    Corrupted(#[from] serde_json::Error),

    #[error("Session lock poisoned")]
    LockPoisoned,
}

/// Bearer token, zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
struct AccessToken(String);

/// Signed-in user as reported by `/api/auth/me`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: String,
}

impl User {
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user asked to sign out.
    Explicit,
    /// The backend rejected the credential (401).
    Unauthorized,
}

type LogoutObserver = Box<dyn Fn(LogoutReason) + Send + Sync>;

struct SignedIn {
    token: AccessToken,
    user: Option<User>,
}

#[derive(Serialize, Deserialize)]
struct PersistedSession {
    access_token: String,
    #[serde(default)]
    user: Option<User>,
}

impl Drop for PersistedSession {
    fn drop(&mut self) {
        self.access_token.zeroize();
    }
}

pub struct Session {
    state: RwLock<Option<SignedIn>>,
    store: Option<PathBuf>,
    observers: Mutex<Vec<LogoutObserver>>,
}

impl Session {
    /// A session that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(None),
            store: None,
            observers: Mutex::new(Vec::new()),
        }
    }

    /// A session backed by `path`. A token persisted by an earlier run is
    /// loaded; an unreadable file is discarded and the session starts
    /// signed out.
    pub fn persisted(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let restored = match read_store(&path) {
            Ok(restored) => restored,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable session file");
                let _ = std::fs::remove_file(&path);
                None
            }
        };

        if restored.is_some() {
            tracing::debug!(path = %path.display(), "Restored persisted session");
        }

        Self {
            state: RwLock::new(restored),
            store: Some(path),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Store a freshly issued token (and user, when known).
    pub fn sign_in(&self, access_token: String, user: Option<User>) -> Result<(), SessionError> {
        if let Some(path) = &self.store {
            write_store(path, &access_token, user.as_ref())?;
        }
        let mut state = self.state.write().map_err(|_| SessionError::LockPoisoned)?;
        *state = Some(SignedIn {
            token: AccessToken(access_token),
            user,
        });
        Ok(())
    }

    /// Record the user returned by a token validation.
    pub fn set_user(&self, user: User) -> Result<(), SessionError> {
        let mut state = self.state.write().map_err(|_| SessionError::LockPoisoned)?;
        let Some(signed_in) = state.as_mut() else {
            return Ok(());
        };
        if let Some(path) = &self.store {
            write_store(path, &signed_in.token.0, Some(&user))?;
        }
        signed_in.user = Some(user);
        Ok(())
    }

    /// `Authorization` header value, when a token is held.
    pub fn bearer(&self) -> Option<String> {
        let state = self.state.read().ok()?;
        state
            .as_ref()
            .map(|signed_in| format!("Bearer {}", signed_in.token.0))
    }

    pub fn user(&self) -> Option<User> {
        let state = self.state.read().ok()?;
        state.as_ref().and_then(|signed_in| signed_in.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .map(|state| state.is_some())
            .unwrap_or(false)
    }

    /// Register a callback fired whenever a signed-in session ends.
    pub fn on_logout(&self, observer: impl Fn(LogoutReason) + Send + Sync + 'static) {
        if let Ok(mut observers) = self.observers.lock() {
            observers.push(Box::new(observer));
        }
    }

    pub fn logout(&self) {
        self.end(LogoutReason::Explicit);
    }

    /// Called by the API client on any authorization failure.
    pub fn invalidate(&self) {
        self.end(LogoutReason::Unauthorized);
    }

    fn end(&self, reason: LogoutReason) {
        let was_signed_in = match self.state.write() {
            Ok(mut state) => state.take().is_some(),
            Err(poisoned) => poisoned.into_inner().take().is_some(),
        };

        if let Some(path) = &self.store {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove session file");
                }
            }
        }

        if !was_signed_in {
            return;
        }

        tracing::info!(reason = ?reason, "Session ended");
        if let Ok(observers) = self.observers.lock() {
            for observer in observers.iter() {
                observer(reason);
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn read_store(path: &Path) -> Result<Option<SignedIn>, SessionError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut persisted: PersistedSession = serde_json::from_str(&raw)?;
    if persisted.access_token.is_empty() {
        return Ok(None);
    }
    Ok(Some(SignedIn {
        token: AccessToken(std::mem::take(&mut persisted.access_token)),
        user: persisted.user.take(),
    }))
}

fn write_store(path: &Path, access_token: &str, user: Option<&User>) -> Result<(), SessionError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let persisted = PersistedSession {
        access_token: access_token.to_string(),
        user: user.cloned(),
    };
    std::fs::write(path, serde_json::to_vec(&persisted)?)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
