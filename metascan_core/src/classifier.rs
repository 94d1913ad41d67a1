//! Embedded-URI classification and payload extraction.
//!
//! A contract may inline its metadata JSON directly in the `contractURI()`
//! return value under the `data:application/json;utf8,` scheme instead of
//! pointing at external storage. This module decides which case a given URI
//! is and recovers the raw inlined bytes. Pure string/byte logic, no I/O.

use crate::error::FetchError;

/// Scheme marker for metadata inlined directly in the URI (28 bytes).
pub const EMBEDDED_JSON_PREFIX: &str = "data:application/json;utf8,";

/// Returns true iff `uri` carries an inlined JSON payload.
///
/// The check is an exact byte comparison against [`EMBEDDED_JSON_PREFIX`]:
/// no case folding, no whitespace tolerance. Strings shorter than the marker
/// are never embedded.
pub fn is_embedded(uri: &str) -> bool {
    uri.as_bytes().starts_with(EMBEDDED_JSON_PREFIX.as_bytes())
}

/// Returns the payload bytes following the scheme marker, untouched.
///
/// No decoding and no trimming is applied; a marker-only URI yields an empty
/// slice. Calling this on a URI for which [`is_embedded`] is false fails with
/// [`FetchError::NotEmbedded`] — callers are expected to classify first.
pub fn extract_payload(uri: &str) -> Result<&[u8], FetchError> {
    if !is_embedded(uri) {
        return Err(FetchError::NotEmbedded(uri.to_string()));
    }
    Ok(&uri.as_bytes()[EMBEDDED_JSON_PREFIX.len()..])
}
