//! Shared state for one process: configuration, the session context and
//! the API client bound to it.

use std::path::Path;
use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::ClientConfig;
use crate::ingest::{EventSink, IngestionOrchestrator};
use crate::records::{DetailCache, RecordAggregator};
use crate::session::{LogoutReason, Session};

pub struct CoreState {
    pub config: ClientConfig,
    session: Arc<Session>,
    client: Arc<ApiClient>,
}

impl CoreState {
    pub fn new(config: ClientConfig, session: Session) -> Result<Self, ApiError> {
        let session = Arc::new(session);
        session.on_logout(|reason| {
            if reason == LogoutReason::Unauthorized {
                tracing::warn!("Session expired; sign in again to continue");
            }
        });
        let client = Arc::new(ApiClient::new(&config, session.clone())?);
        Ok(Self {
            config,
            session,
            client,
        })
    }

    /// State whose token survives restarts in `session_file`.
    pub fn open(config: ClientConfig, session_file: &Path) -> Result<Self, ApiError> {
        Self::new(config, Session::persisted(session_file))
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn orchestrator(&self, events: Option<EventSink>) -> IngestionOrchestrator<ApiClient> {
        let orchestrator = IngestionOrchestrator::new(self.client.clone())
            .with_max_upload_mb(self.config.max_upload_mb);
        match events {
            Some(sink) => orchestrator.with_events(sink),
            None => orchestrator,
        }
    }

    pub fn aggregator(&self) -> RecordAggregator<ApiClient> {
        RecordAggregator::new(self.client.clone())
    }

    pub fn details(&self) -> DetailCache<ApiClient> {
        DetailCache::new(self.client.clone())
    }
}
