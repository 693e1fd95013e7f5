//! One kind-specific upload: state machine, progress and error mapping.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use super::events::{EventSink, IngestEvent};
use super::progress::{percent_of, raise};
use crate::api::{ProcessingStage, RecordsBackend, TransferEvent, TransferObserver};
use crate::models::{CandidateFile, RecordKind, TrackPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

impl TrackStatus {
    /// Forward-only. Going back to `Idle` is a reset, not a transition.
    pub fn can_become(self, next: TrackStatus) -> bool {
        use TrackStatus::*;
        matches!(
            (self, next),
            (Idle, InFlight) | (Idle, Failed) | (InFlight, Succeeded) | (InFlight, Failed)
        )
    }

    pub fn is_settled(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackState {
    pub kind: RecordKind,
    pub status: TrackStatus,
    /// Imaging only: 0-100, never decreasing while in flight.
    pub progress_percent: Option<u8>,
    /// Report only: the server is still extracting and translating.
    pub processing: bool,
    pub stage: Option<ProcessingStage>,
    pub error_detail: Option<String>,
    pub result: Option<TrackPayload>,
}

impl TrackState {
    pub fn idle(kind: RecordKind) -> Self {
        Self {
            kind,
            status: TrackStatus::Idle,
            progress_percent: None,
            processing: false,
            stage: None,
            error_detail: None,
            result: None,
        }
    }
}

/// How one track resolved. A failure carries the display message.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackResult {
    Succeeded(TrackPayload),
    Failed { message: String },
}

impl TrackResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn payload(&self) -> Option<&TrackPayload> {
        match self {
            Self::Succeeded(payload) => Some(payload),
            Self::Failed { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Succeeded(_) => None,
            Self::Failed { message } => Some(message),
        }
    }
}

pub struct UploadTrack {
    kind: RecordKind,
    state: Arc<watch::Sender<TrackState>>,
    events: Option<EventSink>,
}

impl UploadTrack {
    pub fn new(kind: RecordKind) -> Self {
        let (state, _) = watch::channel(TrackState::idle(kind));
        Self {
            kind,
            state: Arc::new(state),
            events: None,
        }
    }

    pub fn with_events(mut self, sink: EventSink) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn state(&self) -> TrackState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> TrackStatus {
        self.state.borrow().status
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackState> {
        self.state.subscribe()
    }

    pub fn reset(&self) {
        self.state.send_replace(TrackState::idle(self.kind));
    }

    /// Settle as failed without touching the network.
    pub fn reject(&self, message: String) -> TrackResult {
        if self.status() != TrackStatus::Idle {
            self.reset();
        }
        tracing::info!(kind = %self.kind, reason = %message, "Batch refused before upload");
        self.settle(TrackStatus::Failed, |state| state.error_detail = Some(message.clone()));
        self.emit(IngestEvent::TrackFailed {
            kind: self.kind,
            message: message.clone(),
        });
        TrackResult::Failed { message }
    }

    /// Upload `files` to this track's endpoint. Never returns an error:
    /// failures resolve to [`TrackResult::Failed`] with a display message.
    pub async fn submit<B>(
        &self,
        backend: &B,
        files: &[CandidateFile],
        note: Option<&str>,
    ) -> TrackResult
    where
        B: RecordsBackend + ?Sized,
    {
        if self.status() != TrackStatus::Idle {
            self.reset();
        }

        let kind = self.kind;
        self.settle(TrackStatus::InFlight, |state| match kind {
            RecordKind::Imaging => state.progress_percent = Some(0),
            RecordKind::Report => state.processing = true,
        });
        tracing::info!(kind = %kind, files = files.len(), "Upload started");
        self.emit(IngestEvent::TrackStarted {
            kind,
            files: files.len(),
        });
        if kind == RecordKind::Imaging {
            self.emit(IngestEvent::UploadProgress { kind, percent: 0 });
        }

        match backend.submit(kind, files, note, self.observer()).await {
            Ok(payload) => {
                if kind == RecordKind::Imaging {
                    raise_progress(&self.state, self.events.as_ref(), kind, 100);
                }
                let record_id = payload.record_id();
                self.settle(TrackStatus::Succeeded, |state| {
                    state.processing = false;
                    state.result = Some(payload.clone());
                });
                tracing::info!(kind = %kind, record_id, "Upload succeeded");
                self.emit(IngestEvent::TrackSucceeded { kind, record_id });
                TrackResult::Succeeded(payload)
            }
            Err(e) => {
                let message = e.user_message();
                tracing::warn!(kind = %kind, error = %e, "Upload failed");
                self.settle(TrackStatus::Failed, |state| {
                    state.processing = false;
                    state.error_detail = Some(message.clone());
                });
                self.emit(IngestEvent::TrackFailed {
                    kind,
                    message: message.clone(),
                });
                TrackResult::Failed { message }
            }
        }
    }

    fn settle(&self, next: TrackStatus, apply: impl FnOnce(&mut TrackState)) {
        let kind = self.kind;
        self.state.send_if_modified(|state| {
            if !state.status.can_become(next) {
                tracing::warn!(kind = %kind, from = ?state.status, to = ?next, "Ignoring backward track transition");
                return false;
            }
            state.status = next;
            apply(state);
            true
        });
    }

    fn emit(&self, event: IngestEvent) {
        if let Some(sink) = &self.events {
            sink(event);
        }
    }

    /// Transport callback feeding this track's state.
    fn observer(&self) -> TransferObserver {
        let state = self.state.clone();
        let events = self.events.clone();
        let kind = self.kind;

        Arc::new(move |event| match event {
            TransferEvent::BytesSent { sent, total } => {
                if kind == RecordKind::Imaging {
                    raise_progress(&state, events.as_ref(), kind, percent_of(sent, total));
                }
            }
            TransferEvent::Processing(stage) => {
                let updated = state.send_if_modified(|s| {
                    if s.status != TrackStatus::InFlight {
                        return false;
                    }
                    s.stage = Some(stage.clone());
                    true
                });
                if updated {
                    tracing::debug!(kind = %kind, phase = %stage.phase, done = stage.done, total = stage.total, "Processing");
                    if let Some(sink) = &events {
                        sink(IngestEvent::Processing { kind, stage });
                    }
                }
            }
        })
    }
}

fn raise_progress(
    state: &watch::Sender<TrackState>,
    events: Option<&EventSink>,
    kind: RecordKind,
    percent: u8,
) {
    let raised = state.send_if_modified(|s| {
        s.status == TrackStatus::InFlight && raise(&mut s.progress_percent, percent)
    });
    if raised {
        if let Some(sink) = events {
            sink(IngestEvent::UploadProgress { kind, percent });
        }
    }
}
