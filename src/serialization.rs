//! Canonical JSON encode/decode for properties, metrics, and tags.
//!
//! Wire-bit-exact conventions: `properties` and `metrics` are JSON objects
//! with lexicographically sorted keys; missing is `{}`, never `null`.
//! `tags` is a JSON array of strings, sorted and deduplicated; missing is
//! `[]`, never `null`. `encode(decode(json)) == json` for any payload
//! produced by this module.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::error::{Result, StorageError};
use crate::value::{MetricValue, PropertyValue};

/// Encode a property map to its canonical JSON text.
pub fn encode_properties(properties: &BTreeMap<String, PropertyValue>) -> Result<String> {
    serde_json::to_string(properties).map_err(|e| StorageError::Json(e).into())
}

/// Decode a property map from JSON text. Empty/absent input decodes to an
/// empty map rather than erroring, matching the "`{}` not `null`" convention.
pub fn decode_properties(json: &str) -> Result<BTreeMap<String, PropertyValue>> {
    if json.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(json).map_err(|e| StorageError::Json(e).into())
}

/// Encode a metric map to its canonical JSON text.
pub fn encode_metrics(metrics: &BTreeMap<String, MetricValue>) -> Result<String> {
    serde_json::to_string(metrics).map_err(|e| StorageError::Json(e).into())
}

pub fn decode_metrics(json: &str) -> Result<BTreeMap<String, MetricValue>> {
    if json.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(json).map_err(|e| StorageError::Json(e).into())
}

/// Encode a tag set as a sorted, deduplicated JSON array of strings.
pub fn encode_tags(tags: &BTreeSet<String>) -> Result<String> {
    // BTreeSet already iterates in sorted order with no duplicates; `Value`
    // round-trip keeps this function symmetric with `decode_tags` and gives
    // us the same serializer codepath as the object encoders above.
    let array: Vec<Value> = tags.iter().map(|t| Value::String(t.clone())).collect();
    serde_json::to_string(&Value::Array(array)).map_err(|e| StorageError::Json(e).into())
}

/// Decode a tag set from a JSON array of strings, sorting and deduplicating
/// on the way in so the in-memory representation is always canonical
/// regardless of how the bytes were produced.
pub fn decode_tags(json: &str) -> Result<BTreeSet<String>> {
    if json.trim().is_empty() {
        return Ok(BTreeSet::new());
    }
    let raw: Vec<String> = serde_json::from_str(json).map_err(StorageError::Json)?;
    Ok(raw.into_iter().collect())
}
