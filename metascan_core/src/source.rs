//! The remote accessor contract consumed by the batch fetcher.

use async_trait::async_trait;
use thiserror::Error;

/// Any failure of the remote accessor, collapsed into a single case.
///
/// A contract that does not implement `contractURI()`, a reverted call, and a
/// transport error all look identical to the fetcher; `reason` is carried for
/// logs only and is never matched on.
#[derive(Debug, Clone, Error)]
#[error("contract metadata source unavailable: {reason}")]
pub struct SourceError {
    pub reason: String,
}

impl SourceError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Remote accessor for the `contractURI()` capability.
///
/// Implementations own the transport (JSON-RPC node, test fixture, …). The
/// fetcher holds one behind `Arc<dyn MetadataSource>` and treats every error
/// uniformly as "this contract has no readable metadata URI".
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Reads the metadata URI advertised by `address`.
    async fn contract_uri(&self, address: &str) -> Result<String, SourceError>;
}
