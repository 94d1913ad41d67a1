//! # Metascan Core
//!
//! Best-effort retrieval and normalization of contract-level metadata for
//! indexers, marketplaces, and explorers. Contracts may expose a metadata URI
//! through the `contractURI()` accessor; many do not, and those that do may
//! return anything from an HTTPS URL to a fully inlined data URI. This crate
//! turns a list of addresses into a uniform, ordered list of
//! [`ContractMetadata`] records, tolerating every per-contract failure mode.
//!
//! # Modules
//!
//! - [`classifier`]: embedded-URI detection and payload extraction
//! - [`record`]: the per-contract metadata record
//! - [`source`]: the remote accessor trait implemented by transports
//! - [`fetcher`]: bounded-concurrency batch orchestration
//! - [`decode`]: the (uncalled) seam for payload decoding
//! - [`config`]: TOML + env configuration
//! - [`error`]: the fetch error taxonomy

pub mod classifier;
pub mod config;
pub mod decode;
pub mod error;
pub mod fetcher;
pub mod record;
pub mod source;

// Re-export primary types for convenience
pub use classifier::{extract_payload, is_embedded, EMBEDDED_JSON_PREFIX};
pub use config::{FetcherConfig, MetascanConfig, RpcSettings};
pub use decode::{DecodeError, DecodedMetadata, MetadataDecoder};
pub use error::FetchError;
pub use fetcher::BatchFetcher;
pub use record::{ContractAddress, ContractMetadata};
pub use source::{MetadataSource, SourceError};
