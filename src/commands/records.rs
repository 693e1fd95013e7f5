use std::path::Path;

use chrono::{DateTime, Local, Utc};

use super::upload::print_text;
use super::{require_session, CliError};
use crate::api::RecordsBackend;
use crate::core_state::CoreState;
use crate::models::{RecordDetail, RecordFilter, RecordKey, RecordKind, RecordSummary};
use crate::records::display::{file_texts, format_duration};
use crate::records::DetailView;

pub async fn list(state: &CoreState, filter: RecordFilter) -> Result<(), CliError> {
    require_session(state)?;
    let outcome = state.aggregator().list_outcome(filter).await;
    if outcome.degraded {
        eprintln!("Records could not be loaded.");
    }
    print_feed(&outcome.records);
    Ok(())
}

pub async fn recent(state: &CoreState, limit: usize) -> Result<(), CliError> {
    require_session(state)?;
    let aggregator = state.aggregator();
    let (records, counts) = tokio::join!(aggregator.recent(limit), aggregator.counts());
    println!(
        "{} imaging, {} report record(s)",
        counts.imaging, counts.report
    );
    print_feed(&records);
    Ok(())
}

pub async fn show(state: &CoreState, key: RecordKey) -> Result<(), CliError> {
    require_session(state)?;
    let details = state.details();
    details.toggle(key).await;
    match details.current(key) {
        DetailView::Shown(Some(detail)) => {
            print_detail(&detail);
            Ok(())
        }
        _ => Err(CliError::NotFound(key)),
    }
}

pub async fn download(
    state: &CoreState,
    kind: RecordKind,
    file_id: i64,
    out: &Path,
) -> Result<(), CliError> {
    require_session(state)?;
    let bytes = state.client().download_file(kind, file_id).await?;
    tokio::fs::write(out, &bytes)
        .await
        .map_err(|source| CliError::WriteFile {
            path: out.to_path_buf(),
            source,
        })?;
    println!("Saved {} bytes to {}", bytes.len(), out.display());
    Ok(())
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string()
}

fn print_feed(records: &[RecordSummary]) {
    if records.is_empty() {
        println!("No records yet.");
        return;
    }
    for record in records {
        let row = record.row();
        let mut line = format!(
            "{:<17} {:<8} #{:<5} {} file(s)",
            local_time(row.created_at),
            record.kind().label(),
            row.id,
            row.file_count
        );
        if let Some(note) = record.patient_note().filter(|n| !n.is_empty()) {
            line.push_str(&format!("  note: {note}"));
        }
        println!("{line}");
        if let Some(preview) = row.translation_preview.as_deref().filter(|p| !p.is_empty()) {
            println!("    {}", preview.replace('\n', " "));
        }
    }
}

fn print_detail(detail: &RecordDetail) {
    println!(
        "{} #{} by {} at {}",
        detail.kind.label(),
        detail.id,
        detail.created_by,
        local_time(detail.created_at)
    );
    if let Some(note) = detail.patient_note.as_deref().filter(|n| !n.is_empty()) {
        println!("Note: {note}");
    }
    for file in &detail.files {
        println!("  [{}] {} ({})", file.id, file.original_filename, file.file_type);
        let timings: Vec<(Option<u64>, Option<u64>)> = file
            .translations
            .iter()
            .flatten()
            .map(|t| (t.ocr_duration_ms, t.translation_duration_ms))
            .collect();
        for (i, text) in file_texts(detail.kind, file).into_iter().enumerate() {
            let (ocr, translation) = timings.get(i).copied().unwrap_or((None, None));
            print_text(text, format_duration(ocr), format_duration(translation));
        }
    }
}
