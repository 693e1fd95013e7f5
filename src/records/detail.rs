//! Lazy single-record expansion.
//!
//! At most one record is expanded at a time. Its detail is fetched on
//! demand from the endpoint of the record's own kind, and a response that
//! arrives after the user has moved on is dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::RecordsBackend;
use crate::models::{RecordDetail, RecordKey};

#[derive(Debug, Clone, PartialEq)]
pub enum Expansion {
    Collapsed,
    Pending { key: RecordKey, generation: u64 },
    /// `detail` is `None` when the fetch failed ("not found").
    Shown { key: RecordKey, detail: Option<RecordDetail> },
}

/// What a row should render.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Collapsed,
    Pending,
    Shown(Option<RecordDetail>),
}

/// Result of one [`DetailCache::toggle`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Collapsed,
    Shown { found: bool },
    /// Another toggle happened while this fetch was in flight.
    Superseded,
}

struct Slot {
    expansion: Expansion,
    generation: u64,
}

pub struct DetailCache<B: ?Sized> {
    backend: Arc<B>,
    slot: Mutex<Slot>,
}

impl<B: RecordsBackend + ?Sized> DetailCache<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            slot: Mutex::new(Slot {
                expansion: Expansion::Collapsed,
                generation: 0,
            }),
        }
    }

    pub fn expansion(&self) -> Expansion {
        self.lock().expansion.clone()
    }

    pub fn expanded_key(&self) -> Option<RecordKey> {
        match &self.lock().expansion {
            Expansion::Collapsed => None,
            Expansion::Pending { key, .. } | Expansion::Shown { key, .. } => Some(*key),
        }
    }

    /// Rendering state for `key`. Every key but the expanded one is collapsed.
    pub fn current(&self, key: RecordKey) -> DetailView {
        match &self.lock().expansion {
            Expansion::Pending { key: k, .. } if *k == key => DetailView::Pending,
            Expansion::Shown { key: k, detail } if *k == key => DetailView::Shown(detail.clone()),
            _ => DetailView::Collapsed,
        }
    }

    pub fn collapse(&self) {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.expansion = Expansion::Collapsed;
    }

    /// Collapse `key` if it is the expanded record, otherwise expand it and
    /// fetch its detail.
    pub async fn toggle(&self, key: RecordKey) -> ToggleOutcome {
        let generation = {
            let mut slot = self.lock();
            slot.generation += 1;
            let same = matches!(
                &slot.expansion,
                Expansion::Pending { key: k, .. } | Expansion::Shown { key: k, .. } if *k == key
            );
            if same {
                slot.expansion = Expansion::Collapsed;
                return ToggleOutcome::Collapsed;
            }
            let generation = slot.generation;
            slot.expansion = Expansion::Pending { key, generation };
            generation
        };

        let detail = match self.backend.record_detail(key).await {
            Ok(detail) if detail.key() == key => Some(detail),
            Ok(detail) => {
                tracing::warn!(requested = %key, returned = %detail.key(), "Detail does not match the requested record");
                None
            }
            Err(e) => {
                tracing::info!(record = %key, error = %e, "Record detail unavailable");
                None
            }
        };

        let mut slot = self.lock();
        match slot.expansion {
            Expansion::Pending { generation: current, .. } if current == generation => {
                let found = detail.is_some();
                slot.expansion = Expansion::Shown { key, detail };
                ToggleOutcome::Shown { found }
            }
            _ => {
                tracing::debug!(record = %key, "Discarding superseded detail response");
                ToggleOutcome::Superseded
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
