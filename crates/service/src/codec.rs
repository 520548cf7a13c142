//! Document normalisation and (de)serialisation.
//!
//! `null` members and objects left without members are dropped before a
//! document is written, innermost first, so pruning an already pruned
//! document changes nothing. Arrays keep their length: an element that prunes
//! away is written as `null`.

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Serializer, Value};

use crate::errors::StoreError;

const INDENT: &[u8] = b"    ";

pub fn empty_document() -> Value { Value::Object(Map::new()) }

/// Remove `null`s and empty objects; `None` when nothing is left.
pub fn prune(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let kept: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| prune(v).map(|v| (k, v)))
                .collect();
            if kept.is_empty() { None } else { Some(Value::Object(kept)) }
        }
        Value::Array(items) => Some(Value::Array(
            items.into_iter().map(|v| prune(v).unwrap_or(Value::Null)).collect(),
        )),
        other => Some(other),
    }
}

/// Pruned, pretty-printed JSON text, or `None` when there is nothing to write.
pub fn encode(value: &Value) -> Result<Option<String>, StoreError> {
    let Some(pruned) = prune(value.clone()) else { return Ok(None) };
    let mut buf = Vec::with_capacity(128);
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    pruned.serialize(&mut ser)?;
    let text = String::from_utf8(buf).map_err(|e| StoreError::Codec(e.to_string()))?;
    Ok(Some(text))
}

/// Document for a stored value; an absent (or JSON `null`) value reads as `{}`.
pub fn decode(stored: Option<Value>) -> Value {
    match stored {
        None | Some(Value::Null) => empty_document(),
        Some(v) => v,
    }
}

pub fn decode_text(text: &str) -> Result<Value, StoreError> {
    Ok(decode(Some(serde_json::from_str(text)?)))
}
