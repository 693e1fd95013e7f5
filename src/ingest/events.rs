use std::sync::Arc;

use serde::Serialize;

use crate::api::ProcessingStage;
use crate::models::RecordKind;

/// Progress notifications for a submission, one stream for both tracks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IngestEvent {
    TrackStarted { kind: RecordKind, files: usize },
    UploadProgress { kind: RecordKind, percent: u8 },
    Processing { kind: RecordKind, stage: ProcessingStage },
    TrackSucceeded { kind: RecordKind, record_id: i64 },
    TrackFailed { kind: RecordKind, message: String },
}

impl IngestEvent {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::TrackStarted { kind, .. }
            | Self::UploadProgress { kind, .. }
            | Self::Processing { kind, .. }
            | Self::TrackSucceeded { kind, .. }
            | Self::TrackFailed { kind, .. } => *kind,
        }
    }
}

pub type EventSink = Arc<dyn Fn(IngestEvent) + Send + Sync>;
