use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::{Deserialize, Serialize};

use super::client::ApiClient;
use super::error::ApiError;
use super::stream::{counted_body, EventStreamDecoder};
use crate::models::{
    CandidateFile, ProcessedReport, RecordDetail, RecordKey, RecordKind, RecordRow, TrackPayload,
};

/// Server-side processing step of a report submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStage {
    pub phase: String,
    pub done: u32,
    pub total: u32,
}

/// Low-level progress of one submission as seen by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// Cumulative body bytes handed to the connection.
    BytesSent { sent: u64, total: u64 },
    /// A report stage frame arrived.
    Processing(ProcessingStage),
}

pub type TransferObserver = Arc<dyn Fn(TransferEvent) + Send + Sync>;

/// Everything the ingestion and feed layers need from the backend.
/// Every call is routed by `kind`; nothing crosses between the two
/// collections.
#[async_trait]
pub trait RecordsBackend: Send + Sync {
    async fn list_records(&self, kind: RecordKind) -> Result<Vec<RecordRow>, ApiError>;

    async fn record_detail(&self, key: RecordKey) -> Result<RecordDetail, ApiError>;

    async fn submit(
        &self,
        kind: RecordKind,
        files: &[CandidateFile],
        note: Option<&str>,
        observer: TransferObserver,
    ) -> Result<TrackPayload, ApiError>;

    async fn download_file(&self, kind: RecordKind, file_id: i64) -> Result<Vec<u8>, ApiError>;
}

#[derive(Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
enum ReportFrame {
    Ocr { done: u32, total: u32 },
    Translation { done: u32, total: u32 },
    Complete { result: ProcessedReport },
    #[serde(other)]
    Unknown,
}

#[async_trait]
impl RecordsBackend for ApiClient {
    async fn list_records(&self, kind: RecordKind) -> Result<Vec<RecordRow>, ApiError> {
        let rows: Vec<RecordRow> = self.get_json(&kind.list_path()).await?;
        tracing::debug!(kind = %kind, count = rows.len(), "Fetched record list");
        Ok(rows)
    }

    async fn record_detail(&self, key: RecordKey) -> Result<RecordDetail, ApiError> {
        self.get_json(&key.kind.detail_path(key.id)).await
    }

    async fn submit(
        &self,
        kind: RecordKind,
        files: &[CandidateFile],
        note: Option<&str>,
        observer: TransferObserver,
    ) -> Result<TrackPayload, ApiError> {
        let form = upload_form(files, note, observer.clone())?;
        let request = self.post(&kind.upload_path()).multipart(form);

        match kind {
            RecordKind::Imaging => {
                let response = self.send(request.header(ACCEPT, "application/json")).await?;
                let body = response.bytes().await?;
                Ok(TrackPayload::Imaging(serde_json::from_slice(&body)?))
            }
            RecordKind::Report => {
                let request = request.header(ACCEPT, "text/event-stream, application/json");
                let response = self.send(request).await?;
                Ok(TrackPayload::Report(read_report(response, &observer).await?))
            }
        }
    }

    async fn download_file(&self, kind: RecordKind, file_id: i64) -> Result<Vec<u8>, ApiError> {
        let bytes = self.get_bytes(&kind.download_path(file_id)).await?;
        tracing::debug!(kind = %kind, file_id, size = bytes.len(), "Downloaded file");
        Ok(bytes)
    }
}

/// One `files` part per candidate plus the trimmed note, when any.
fn upload_form(
    files: &[CandidateFile],
    note: Option<&str>,
    observer: TransferObserver,
) -> Result<Form, ApiError> {
    let total: u64 = files.iter().map(|f| f.size_bytes).sum();
    let sent = Arc::new(AtomicU64::new(0));

    let mut form = Form::new();
    for file in files {
        let sent = sent.clone();
        let observer = observer.clone();
        let body = counted_body(&file.bytes, move |len| {
            let now = sent.fetch_add(len, Ordering::Relaxed) + len;
            observer(TransferEvent::BytesSent { sent: now, total });
        });
        let part = Part::stream_with_length(body, file.size_bytes)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type())
            .map_err(|e| ApiError::Transport(format!("invalid part for {}: {e}", file.name)))?;
        form = form.part("files", part);
    }

    if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
        form = form.text("patient_note", note.to_string());
    }
    Ok(form)
}

/// A report upload answers either with the finished record as JSON or
/// with a stage stream that ends in a `complete` frame.
async fn read_report(
    response: Response,
    observer: &TransferObserver,
) -> Result<ProcessedReport, ApiError> {
    let is_event_stream = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/event-stream"));

    if !is_event_stream {
        let body = response.bytes().await?;
        return Ok(serde_json::from_slice(&body)?);
    }

    let mut decoder = EventStreamDecoder::default();
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        for data in decoder.push(&chunk?) {
            if let Some(report) = apply_frame(&data, observer)? {
                return Ok(report);
            }
        }
    }
    if let Some(data) = decoder.finish() {
        if let Some(report) = apply_frame(&data, observer)? {
            return Ok(report);
        }
    }
    Err(ApiError::Decode(
        "processing stream ended before completion".into(),
    ))
}

fn apply_frame(
    data: &str,
    observer: &TransferObserver,
) -> Result<Option<ProcessedReport>, ApiError> {
    let stage = |phase: &str, done, total| {
        observer(TransferEvent::Processing(ProcessingStage {
            phase: phase.to_string(),
            done,
            total,
        }))
    };

    match serde_json::from_str::<ReportFrame>(data)? {
        ReportFrame::Complete { result } => return Ok(Some(result)),
        ReportFrame::Ocr { done, total } => stage("ocr", done, total),
        ReportFrame::Translation { done, total } => stage("translation", done, total),
        ReportFrame::Unknown => tracing::debug!(frame = data, "Ignoring unknown processing frame"),
    }
    Ok(None)
}
