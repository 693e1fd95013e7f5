//! Read side: the unified record feed and per-record detail.

pub mod aggregate;
pub mod detail;
pub mod display;

pub use aggregate::{FeedCounts, FeedOutcome, RecordAggregator};
pub use detail::{DetailCache, DetailView, Expansion, ToggleOutcome};
pub use display::{classify, format_duration, TextDisplay};
