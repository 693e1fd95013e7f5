//! HTTP access to the intpatient backend.
//!
//! `client` owns transport and the session interceptor, `backend` maps the
//! per-kind record endpoints onto the [`RecordsBackend`] seam that the
//! ingestion and feed layers are written against.

pub mod backend;
pub mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod mock;
mod stream;

pub use backend::{ProcessingStage, RecordsBackend, TransferEvent, TransferObserver};
pub use client::ApiClient;
pub use error::ApiError;
