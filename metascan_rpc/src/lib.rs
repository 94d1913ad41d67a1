//! # Metascan RPC
//!
//! Ethereum JSON-RPC implementation of
//! [`MetadataSource`](metascan_core::MetadataSource): reads a contract's
//! metadata URI by `eth_call`ing the `contractURI()` accessor and ABI-decoding
//! the returned string.
//!
//! Every failure mode — transport error, non-2xx status, JSON-RPC error
//! object (revert, unknown method), empty result (no code at the address),
//! malformed ABI payload — collapses into
//! [`SourceError`](metascan_core::SourceError), per the source contract.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use metascan_core::{MetadataSource, RpcSettings, SourceError};

/// Four-byte selector of `contractURI()` (`keccak256` prefix), hex-encoded
/// with the `0x` prefix the way `eth_call` expects the `data` field.
pub const CONTRACT_URI_SELECTOR: &str = "0xe8a3d485";

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u32,
    method: &'static str,
    params: (CallParams<'a>, &'static str),
}

#[derive(Debug, Serialize)]
struct CallParams<'a> {
    to: &'a str,
    data: &'static str,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// `MetadataSource` backed by an Ethereum JSON-RPC node.
pub struct EthRpcSource {
    client: reqwest::Client,
    endpoint: String,
}

impl EthRpcSource {
    /// Creates a source from transport settings.
    pub fn new(settings: &RpcSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent("metascan/0.1")
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            endpoint: settings.endpoint.clone(),
        }
    }

    /// Creates a source with a custom HTTP client.
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl MetadataSource for EthRpcSource {
    async fn contract_uri(&self, address: &str) -> Result<String, SourceError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_call",
            params: (
                CallParams {
                    to: address,
                    data: CONTRACT_URI_SELECTOR,
                },
                "latest",
            ),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| SourceError::new(format!("eth_call transport error: {e}")))?
            .error_for_status()
            .map_err(|e| SourceError::new(format!("eth_call HTTP error: {e}")))?;

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| SourceError::new(format!("eth_call response was not JSON: {e}")))?;

        if let Some(err) = body.error {
            return Err(SourceError::new(format!(
                "eth_call failed ({}): {}",
                err.code, err.message
            )));
        }
        let raw = body
            .result
            .ok_or_else(|| SourceError::new("eth_call returned neither result nor error"))?;

        let uri = decode_abi_string(&raw)?;
        debug!(address, bytes = uri.len(), "contractURI fetched");
        Ok(uri)
    }
}

/// Decodes the ABI encoding of a single `string` return value.
///
/// Layout: a 32-byte head word holding the offset of the tail, then at that
/// offset a 32-byte length word followed by the UTF-8 bytes padded to a
/// 32-byte boundary. An empty response (`"0x"`) means the address has no code
/// or the call returned nothing, which counts as unavailable.
pub fn decode_abi_string(raw: &str) -> Result<String, SourceError> {
    let hex = raw.strip_prefix("0x").unwrap_or(raw);
    if hex.is_empty() {
        return Err(SourceError::new(
            "empty eth_call result (no code at address or no contractURI)",
        ));
    }
    let bytes = decode_hex(hex)?;
    if bytes.len() < 64 {
        return Err(SourceError::new(format!(
            "ABI string return too short: {} bytes",
            bytes.len()
        )));
    }

    let offset = word_as_usize(&bytes[..32])?;
    if offset.saturating_add(32) > bytes.len() {
        return Err(SourceError::new("ABI string offset points past the payload"));
    }
    let length = word_as_usize(&bytes[offset..offset + 32])?;

    let start = offset + 32;
    if length > bytes.len() - start {
        return Err(SourceError::new("ABI string length exceeds the payload"));
    }
    String::from_utf8(bytes[start..start + length].to_vec())
        .map_err(|e| SourceError::new(format!("contractURI is not valid UTF-8: {e}")))
}

// Simple hex decoding (avoids a codec crate dependency)
fn decode_hex(hex: &str) -> Result<Vec<u8>, SourceError> {
    if !hex.is_ascii() || hex.len() % 2 != 0 {
        return Err(SourceError::new("malformed hex in eth_call result"));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| SourceError::new(format!("invalid hex in eth_call result: {e}")))
        })
        .collect()
}

/// Reads a 32-byte big-endian word as a usize, rejecting values that cannot
/// be real offsets or lengths.
fn word_as_usize(word: &[u8]) -> Result<usize, SourceError> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(SourceError::new("ABI word out of range"));
    }
    let mut value = 0u64;
    for b in &word[24..] {
        value = value << 8 | u64::from(*b);
    }
    usize::try_from(value).map_err(|_| SourceError::new("ABI word out of range"))
}
