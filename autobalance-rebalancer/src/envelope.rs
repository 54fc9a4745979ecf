//! Response envelope decoding
//!
//! Cluster manager responses wrap their payload as
//! `{"entry": [{"content": {...}}, ...]}`. Only the first entry's content is
//! of interest. Any deviation from that shape, or a content object missing a
//! required field, is reported as [`RebalanceError::MalformedResponse`].

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{RebalanceError, Result};

/// Extract the first entry's `content` object from a response body
pub fn first_content(endpoint: &str, body: &str) -> Result<Map<String, Value>> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| RebalanceError::malformed(endpoint, format!("invalid JSON: {}", e)))?;

    let entries = document
        .get("entry")
        .ok_or_else(|| RebalanceError::malformed(endpoint, "missing \"entry\""))?
        .as_array()
        .ok_or_else(|| RebalanceError::malformed(endpoint, "\"entry\" is not an array"))?;

    let first = entries
        .first()
        .ok_or_else(|| RebalanceError::malformed(endpoint, "\"entry\" is empty"))?;

    match first.get("content") {
        Some(Value::Object(content)) => Ok(content.clone()),
        Some(_) => Err(RebalanceError::malformed(
            endpoint,
            "\"content\" is not an object",
        )),
        None => Err(RebalanceError::malformed(
            endpoint,
            "first entry has no \"content\"",
        )),
    }
}

/// Decode the first entry's `content` into a typed payload
pub fn decode_content<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
    let content = first_content(endpoint, body)?;
    serde_json::from_value(Value::Object(content))
        .map_err(|e| RebalanceError::malformed(endpoint, e.to_string()))
}
