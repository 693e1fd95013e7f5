use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::events::EventSink;
use super::track::{TrackResult, TrackStatus, UploadTrack};
use super::validate::ValidationPolicy;
use crate::api::RecordsBackend;
use crate::config::DEFAULT_MAX_UPLOAD_MB;
use crate::models::{CandidateFile, RecordKind};

/// Outcome of one submission. A track that was not launched is `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ingestion {
    pub imaging: Option<TrackResult>,
    pub report: Option<TrackResult>,
}

impl Ingestion {
    pub fn get(&self, kind: RecordKind) -> Option<&TrackResult> {
        match kind {
            RecordKind::Imaging => self.imaging.as_ref(),
            RecordKind::Report => self.report.as_ref(),
        }
    }

    /// Nothing was launched.
    pub fn is_empty(&self) -> bool {
        self.imaging.is_none() && self.report.is_none()
    }

    pub fn any_failed(&self) -> bool {
        self.results().any(|r| !r.is_success())
    }

    pub fn all_succeeded(&self) -> bool {
        !self.is_empty() && self.results().all(TrackResult::is_success)
    }

    fn results(&self) -> impl Iterator<Item = &TrackResult> {
        self.imaging.iter().chain(self.report.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateStatus {
    Idle,
    InFlight,
    Settled,
}

/// Runs the imaging and report tracks of a submission side by side.
pub struct IngestionOrchestrator<B: ?Sized> {
    backend: Arc<B>,
    imaging: UploadTrack,
    report: UploadTrack,
    max_upload_mb: u64,
}

impl<B: RecordsBackend + ?Sized> IngestionOrchestrator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            imaging: UploadTrack::new(RecordKind::Imaging),
            report: UploadTrack::new(RecordKind::Report),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }

    pub fn with_max_upload_mb(mut self, max_upload_mb: u64) -> Self {
        self.max_upload_mb = max_upload_mb;
        self
    }

    pub fn max_upload_mb(&self) -> u64 {
        self.max_upload_mb
    }

    /// Route both tracks' events to one sink.
    pub fn with_events(mut self, sink: EventSink) -> Self {
        self.imaging = UploadTrack::new(RecordKind::Imaging).with_events(sink.clone());
        self.report = UploadTrack::new(RecordKind::Report).with_events(sink);
        self
    }

    pub fn track(&self, kind: RecordKind) -> &UploadTrack {
        match kind {
            RecordKind::Imaging => &self.imaging,
            RecordKind::Report => &self.report,
        }
    }

    /// In flight while any launched track is in flight.
    pub fn status(&self) -> AggregateStatus {
        let statuses = [self.imaging.status(), self.report.status()];
        if statuses.contains(&TrackStatus::InFlight) {
            AggregateStatus::InFlight
        } else if statuses.iter().any(|s| s.is_settled()) {
            AggregateStatus::Settled
        } else {
            AggregateStatus::Idle
        }
    }

    /// Launch every non-empty track concurrently and wait for all of them.
    /// One track failing never cancels or rolls back the other.
    pub async fn run(
        &self,
        imaging_files: &[CandidateFile],
        report_files: &[CandidateFile],
        note: Option<&str>,
    ) -> Ingestion {
        self.imaging.reset();
        self.report.reset();

        if imaging_files.is_empty() && report_files.is_empty() {
            tracing::debug!("Nothing selected, no upload launched");
            return Ingestion::default();
        }

        let submission = Uuid::new_v4();
        tracing::info!(
            %submission,
            imaging = imaging_files.len(),
            report = report_files.len(),
            "Submission started"
        );

        let (imaging, report) = tokio::join!(
            self.launch(&self.imaging, imaging_files, note),
            self.launch(&self.report, report_files, note),
        );
        let ingestion = Ingestion { imaging, report };

        tracing::info!(
            %submission,
            imaging = ?ingestion.imaging.as_ref().map(TrackResult::is_success),
            report = ?ingestion.report.as_ref().map(TrackResult::is_success),
            "Submission settled"
        );
        ingestion
    }

    async fn launch(
        &self,
        track: &UploadTrack,
        files: &[CandidateFile],
        note: Option<&str>,
    ) -> Option<TrackResult> {
        if files.is_empty() {
            return None;
        }
        let policy = ValidationPolicy::for_kind(track.kind(), self.max_upload_mb);
        if let Err(rejection) = policy.validate(files) {
            return Some(track.reject(rejection.to_string()));
        }
        Some(track.submit(self.backend.as_ref(), files, note).await)
    }
}
