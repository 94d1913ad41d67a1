//! Per-contract metadata records — the unit of batch output.

use serde::{Deserialize, Serialize};

use crate::classifier;

/// Contract address as supplied by the caller (e.g. `"0xabc…"`).
///
/// Opaque to the fetcher; well-formedness is the transport's concern.
pub type ContractAddress = String;

/// Normalized metadata for one contract.
///
/// Exactly one record is produced per queried address. The schema fields
/// (`name` through `collaborators`) are reserved for a decode collaborator
/// (see [`MetadataDecoder`](crate::decode::MetadataDecoder)) and are always
/// left at their zero value by the fetcher itself — decoding the payload is
/// a separate, optional step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractMetadata {
    /// Address this record was fetched for.
    pub address: ContractAddress,
    /// Raw `contractURI()` return value; empty when the call failed.
    pub uri: String,
    /// Whether `uri` inlines its payload under the embedded scheme marker.
    pub is_embedded: bool,
    /// Whether the contract answered the `contractURI()` call at all.
    pub has_contract_uri: bool,

    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image: String,
    pub banner_image: String,
    pub featured_image: String,
    pub external_link: String,
    pub collaborators: Vec<String>,
}

impl ContractMetadata {
    /// Record for a contract whose accessor call returned `uri`.
    pub fn from_uri(address: impl Into<ContractAddress>, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            address: address.into(),
            is_embedded: classifier::is_embedded(&uri),
            has_contract_uri: true,
            uri,
            ..Self::default()
        }
    }

    /// Record for a contract that did not answer the accessor call.
    ///
    /// `uri` stays empty and both flags stay false; the batch still carries
    /// the record so output positions line up with input positions.
    pub fn unavailable(address: impl Into<ContractAddress>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }
}
