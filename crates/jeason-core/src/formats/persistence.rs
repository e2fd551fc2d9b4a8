//! Record envelope: `[version: u8][postcard body]`.

use crate::CoreError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Current envelope version. Bump when a stored record layout changes.
pub const FORMAT_VERSION: u8 = 1;

/// Encode a record for storage.
pub fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>, CoreError> {
    let body = postcard::to_allocvec(record).map_err(|e| CoreError::Format(e.to_string()))?;
    let mut bytes = Vec::with_capacity(body.len().saturating_add(1));
    bytes.push(FORMAT_VERSION);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Decode a stored record, rejecting unknown envelope versions.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CoreError> {
    let Some((&version, body)) = bytes.split_first() else {
        return Err(CoreError::Format("empty record".to_string()));
    };
    if version != FORMAT_VERSION {
        return Err(CoreError::Format(format!(
            "unsupported record version {version} (expected {FORMAT_VERSION})"
        )));
    }
    postcard::from_bytes(body).map_err(|e| CoreError::Format(e.to_string()))
}
