//! Submission of imaging and report batches.
//!
//! A batch is validated client-side, then each kind travels on its own
//! [`UploadTrack`]. The [`IngestionOrchestrator`] runs both tracks at once
//! and reports each outcome separately: one track failing never undoes
//! the other.

pub mod events;
pub mod orchestrator;
pub mod progress;
pub mod sentinel;
pub mod track;
pub mod validate;

pub use events::{EventSink, IngestEvent};
pub use orchestrator::{AggregateStatus, Ingestion, IngestionOrchestrator};
pub use track::{TrackResult, TrackState, TrackStatus, UploadTrack};
pub use validate::{validate, ValidationPolicy, ValidationRejection};
