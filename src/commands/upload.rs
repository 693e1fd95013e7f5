use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{require_session, CliError};
use crate::core_state::CoreState;
use crate::ingest::{EventSink, IngestEvent, Ingestion, TrackResult};
use crate::models::{CandidateFile, RecordKind, TrackPayload};
use crate::records::display::{classify_extracted, format_duration, TextDisplay};

pub async fn upload(
    state: &CoreState,
    imaging: &[PathBuf],
    report: &[PathBuf],
    note: Option<&str>,
) -> Result<(), CliError> {
    if imaging.is_empty() && report.is_empty() {
        return Err(CliError::NothingSelected);
    }
    require_session(state)?;

    let imaging = read_all(imaging).await?;
    let report = read_all(report).await?;

    let ingestion = state
        .orchestrator(Some(progress_printer()))
        .run(&imaging, &report, note)
        .await;

    print_summary(&ingestion);
    if ingestion.any_failed() {
        return Err(CliError::SubmissionFailed);
    }
    Ok(())
}

async fn read_all(paths: &[PathBuf]) -> Result<Vec<CandidateFile>, CliError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(read_one(path).await?);
    }
    Ok(files)
}

async fn read_one(path: &Path) -> Result<CandidateFile, CliError> {
    CandidateFile::from_path(path)
        .await
        .map_err(|source| CliError::ReadFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Progress goes to stderr so stdout stays the summary only.
fn progress_printer() -> EventSink {
    Arc::new(|event| match event {
        IngestEvent::TrackStarted { kind, files } => {
            eprintln!("{}: uploading {files} file(s)", kind.label());
        }
        IngestEvent::UploadProgress { kind, percent } if percent % 10 == 0 => {
            eprintln!("{}: {percent}%", kind.label());
        }
        IngestEvent::Processing { kind, stage } => {
            eprintln!("{}: {} {}/{}", kind.label(), stage.phase, stage.done, stage.total);
        }
        _ => {}
    })
}

fn print_summary(ingestion: &Ingestion) {
    for kind in RecordKind::ALL {
        let Some(result) = ingestion.get(kind) else {
            continue;
        };
        match result {
            TrackResult::Failed { message } => println!("{}: failed - {message}", kind.label()),
            TrackResult::Succeeded(TrackPayload::Imaging(detail)) => {
                println!("{}: record #{} saved, {} file(s)", kind.label(), detail.id, detail.files.len());
            }
            TrackResult::Succeeded(TrackPayload::Report(report)) => {
                let clean = crate::ingest::sentinel::report_is_clean(report);
                println!(
                    "{}: record #{} saved{}",
                    kind.label(),
                    report.id,
                    if clean { "" } else { " (some files could not be processed)" }
                );
                for file in &report.files {
                    println!("  {}", file.original_filename);
                    let text = &file.translation;
                    print_text(
                        classify_extracted(text),
                        format_duration(text.ocr_duration_ms),
                        format_duration(text.translation_duration_ms),
                    );
                }
            }
        }
    }
}

pub(super) fn print_text(display: TextDisplay<'_>, ocr_took: Option<String>, translation_took: Option<String>) {
    let took = |d: Option<String>| d.map(|d| format!(" ({d})")).unwrap_or_default();
    match display {
        TextDisplay::NoTextFound => println!("    no text found"),
        TextDisplay::OcrFailed { reason } => {
            println!("    OCR failed: text could not be extracted [{reason}]");
        }
        TextDisplay::OriginalOnly { original } => {
            println!("    original{}:\n{}", took(ocr_took), indent(original));
        }
        TextDisplay::TranslationFailed { original, reason } => {
            println!("    original{}:\n{}", took(ocr_took), indent(original));
            println!("    translation failed [{reason}]");
        }
        TextDisplay::Translated {
            original,
            translated,
        } => {
            println!("    original{}:\n{}", took(ocr_took), indent(original));
            println!("    translation{}:\n{}", took(translation_took), indent(translated));
        }
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("      {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
