//! Error taxonomy for the metadata fetch pipeline.
//!
//! Per-contract accessor failures are deliberately *not* here — they are
//! represented by [`SourceError`](crate::source::SourceError) and absorbed
//! inside [`BatchFetcher::fetch_one`](crate::fetcher::BatchFetcher::fetch_one).
//! `FetchError` only covers conditions that abort an operation outright.

use thiserror::Error;

/// Errors surfaced by the classifier and the batch fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// `extract_payload` was called on a URI that does not carry the embedded
    /// scheme marker. A contract violation by the caller, not a data condition.
    #[error("URI does not carry an embedded payload: {0:?}")]
    NotEmbedded(String),

    /// The batch deadline expired before every fetch finished. In-flight
    /// fetches were abandoned; no partial output is returned.
    #[error("batch cancelled after {timeout_secs}s ({completed}/{total} fetches finished)")]
    BatchCancelled {
        completed: usize,
        total: usize,
        timeout_secs: u64,
    },

    /// A fan-out worker panicked or never reported into its result slot.
    #[error("fetch worker failed: {0}")]
    Worker(String),
}
