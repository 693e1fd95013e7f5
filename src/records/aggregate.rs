use std::sync::Arc;

use serde::Serialize;

use crate::api::{ApiError, RecordsBackend};
use crate::models::{RecordFilter, RecordKind, RecordSummary};

/// Feed plus whether it was produced by degrading a failed fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedOutcome {
    pub records: Vec<RecordSummary>,
    pub degraded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FeedCounts {
    pub imaging: usize,
    pub report: usize,
}

impl FeedCounts {
    pub fn total(&self) -> usize {
        self.imaging + self.report
    }
}

/// Builds the unified newest-first feed from the two kind-specific
/// collections.
pub struct RecordAggregator<B: ?Sized> {
    backend: Arc<B>,
}

impl<B: RecordsBackend + ?Sized> RecordAggregator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Never fails: a fetch error yields an empty feed.
    pub async fn list(&self, filter: RecordFilter) -> Vec<RecordSummary> {
        self.list_outcome(filter).await.records
    }

    pub async fn list_outcome(&self, filter: RecordFilter) -> FeedOutcome {
        let fetched = match filter {
            RecordFilter::All => {
                let (imaging, report) = tokio::join!(
                    self.fetch(RecordKind::Imaging),
                    self.fetch(RecordKind::Report)
                );
                imaging.and_then(|mut records| {
                    records.extend(report?);
                    Ok(records)
                })
            }
            RecordFilter::Imaging => self.fetch(RecordKind::Imaging).await,
            RecordFilter::Report => self.fetch(RecordKind::Report).await,
        };

        match fetched {
            Ok(mut records) => {
                sort_newest_first(&mut records);
                FeedOutcome {
                    records,
                    degraded: false,
                }
            }
            Err(e) => {
                tracing::warn!(filter = %filter, error = %e, "Record feed unavailable, showing empty list");
                FeedOutcome {
                    records: Vec::new(),
                    degraded: true,
                }
            }
        }
    }

    /// Newest `limit` records across both kinds.
    pub async fn recent(&self, limit: usize) -> Vec<RecordSummary> {
        let mut records = self.list(RecordFilter::All).await;
        records.truncate(limit);
        records
    }

    pub async fn counts(&self) -> FeedCounts {
        count(&self.list(RecordFilter::All).await)
    }

    async fn fetch(&self, kind: RecordKind) -> Result<Vec<RecordSummary>, ApiError> {
        let rows = self.backend.list_records(kind).await?;
        Ok(rows
            .into_iter()
            .map(|row| RecordSummary::stamp(kind, row))
            .collect())
    }
}

/// Stable: records sharing a timestamp keep their fetch order.
pub fn sort_newest_first(records: &mut [RecordSummary]) {
    records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

/// View-side filtering of an already merged feed.
pub fn apply_filter(records: &[RecordSummary], filter: RecordFilter) -> Vec<&RecordSummary> {
    records.iter().filter(|r| filter.admits(r.kind())).collect()
}

pub fn count(records: &[RecordSummary]) -> FeedCounts {
    records.iter().fold(FeedCounts::default(), |mut counts, r| {
        match r.kind() {
            RecordKind::Imaging => counts.imaging += 1,
            RecordKind::Report => counts.report += 1,
        }
        counts
    })
}
