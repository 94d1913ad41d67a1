//! Decode seam for embedded metadata payloads.
//!
//! The fetcher deliberately stops at classification: turning the payload into
//! schema fields costs a JSON parse per contract and not every consumer wants
//! it. A decoder plugs in behind [`MetadataDecoder`] without touching the
//! fetch path; the fetcher itself never calls one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a decode collaborator may report.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload bytes were not a metadata document the decoder understands.
    #[error("payload is not valid metadata: {0}")]
    Malformed(String),
}

/// Structured fields recovered from an embedded metadata payload.
///
/// Mirrors the schema fields of
/// [`ContractMetadata`](crate::record::ContractMetadata).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image: String,
    pub banner_image: String,
    pub featured_image: String,
    pub external_link: String,
    pub collaborators: Vec<String>,
}

/// Decodes raw embedded payload bytes into schema fields.
pub trait MetadataDecoder: Send + Sync {
    fn decode(&self, payload: &[u8]) -> Result<DecodedMetadata, DecodeError>;
}
