//! Scriptable in-process backend for exercising the ingestion and feed
//! layers without a server.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::backend::{ProcessingStage, RecordsBackend, TransferEvent, TransferObserver};
use super::error::ApiError;
use crate::models::{
    timestamp, CandidateFile, ExtractedText, FileRef, ProcessedFile, ProcessedReport, RecordDetail,
    RecordKey, RecordKind, RecordRow, TrackPayload,
};

#[derive(Default)]
pub(crate) struct MockBackend {
    lists: Mutex<HashMap<RecordKind, Result<Vec<RecordRow>, ApiError>>>,
    details: Mutex<HashMap<RecordKey, Result<RecordDetail, ApiError>>>,
    submissions: Mutex<HashMap<RecordKind, Result<TrackPayload, ApiError>>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(self, kind: RecordKind, rows: Vec<RecordRow>) -> Self {
        self.lists.lock().unwrap().insert(kind, Ok(rows));
        self
    }

    pub fn failing_list(self, kind: RecordKind, err: ApiError) -> Self {
        self.lists.lock().unwrap().insert(kind, Err(err));
        self
    }

    pub fn with_detail(self, detail: RecordDetail) -> Self {
        self.details.lock().unwrap().insert(detail.key(), Ok(detail));
        self
    }

    /// Answer `key` with a detail of a different record.
    pub fn with_detail_for(self, key: RecordKey, detail: RecordDetail) -> Self {
        self.details.lock().unwrap().insert(key, Ok(detail));
        self
    }

    pub fn with_submission(self, payload: TrackPayload) -> Self {
        self.submissions.lock().unwrap().insert(payload.kind(), Ok(payload));
        self
    }

    pub fn failing_submission(self, kind: RecordKind, err: ApiError) -> Self {
        self.submissions.lock().unwrap().insert(kind, Err(err));
        self
    }

    /// Delay every call whose log line equals `call` (`"detail report-5"`).
    pub fn with_delay(self, call: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(call.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call.clone());
        let delay = self.delays.lock().unwrap().get(&call).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RecordsBackend for MockBackend {
    async fn list_records(&self, kind: RecordKind) -> Result<Vec<RecordRow>, ApiError> {
        self.record(format!("list {kind}")).await;
        self.lists
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn record_detail(&self, key: RecordKey) -> Result<RecordDetail, ApiError> {
        self.record(format!("detail {key}")).await;
        self.details
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or(Err(ApiError::Server { status: 404, detail: Some("Record not found".into()) }))
    }

    async fn submit(
        &self,
        kind: RecordKind,
        files: &[CandidateFile],
        _note: Option<&str>,
        observer: TransferObserver,
    ) -> Result<TrackPayload, ApiError> {
        let total: u64 = files.iter().map(|f| f.size_bytes).sum();
        for step in 1..=4u64 {
            observer(TransferEvent::BytesSent { sent: total * step / 4, total });
        }
        if kind == RecordKind::Report {
            observer(TransferEvent::Processing(ProcessingStage {
                phase: "ocr".into(),
                done: files.len() as u32,
                total: files.len() as u32,
            }));
        }
        self.record(format!("submit {kind}")).await;
        self.submissions
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or(Err(ApiError::Server { status: 500, detail: None }))
    }

    async fn download_file(&self, kind: RecordKind, file_id: i64) -> Result<Vec<u8>, ApiError> {
        self.record(format!("download {kind} {file_id}")).await;
        Ok(format!("{kind}-{file_id}").into_bytes())
    }
}

pub(crate) fn row(id: i64, created_at: &str) -> RecordRow {
    RecordRow {
        id,
        patient_note: None,
        created_at: timestamp::parse(created_at).unwrap(),
        created_by: "dr.test".into(),
        file_count: 1,
        translation_preview: None,
    }
}

pub(crate) fn detail(kind: RecordKind, id: i64, files: Vec<FileRef>) -> RecordDetail {
    RecordDetail {
        id,
        kind,
        patient_note: Some(format!("note for {kind} {id}")),
        created_at: timestamp::parse("2024-05-01T09:00:00").unwrap(),
        created_by: "dr.test".into(),
        files,
    }
}

pub(crate) fn imaging_payload(id: i64) -> TrackPayload {
    TrackPayload::Imaging(detail(
        RecordKind::Imaging,
        id,
        vec![FileRef {
            id: 1,
            original_filename: "chest.dcm".into(),
            file_type: "dcm".into(),
            download_url: "/api/radiology/files/1".into(),
            translations: None,
        }],
    ))
}

pub(crate) fn report_payload(id: i64, texts: &[(&str, &str)]) -> TrackPayload {
    let files = texts
        .iter()
        .enumerate()
        .map(|(i, (original, translated))| ProcessedFile {
            id: i as i64 + 1,
            original_filename: format!("page-{}.pdf", i + 1),
            file_type: "pdf".into(),
            download_url: format!("/api/reports/files/{}", i + 1),
            translation: ExtractedText {
                original_text: original.to_string(),
                translated_text: translated.to_string(),
                ocr_duration_ms: Some(1200),
                translation_duration_ms: Some(800),
            },
        })
        .collect();
    TrackPayload::Report(ProcessedReport {
        id,
        patient_note: None,
        created_at: timestamp::parse("2024-05-01T09:00:00").unwrap(),
        created_by: "dr.test".into(),
        files,
    })
}
