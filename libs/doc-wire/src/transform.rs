//! Atomic field transform request decode (spec §4.F: increment, array-union,
//! array-remove, server-timestamp). Unlike document fields these bodies carry
//! plain, unwrapped JSON — not typed-value wrappers — so decoding goes
//! through [`crate::value::decode_raw`] rather than [`crate::value::decode_typed_value`].

use serde_json::Value as Json;

use crate::error::WireError;
use crate::value::{decode_raw, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum AtomicTransform {
    Increment { field: String, amount: Value },
    ArrayUnion { field: String, elements: Vec<Value> },
    ArrayRemove { field: String, elements: Vec<Value> },
    ServerTimestamp { field: String },
}

fn required_field(json: &Json) -> Result<String, WireError> {
    json.get("field")
        .and_then(Json::as_str)
        .map(str::to_owned)
        .ok_or_else(|| WireError::MissingField("field".into()))
}

/// Decode an increment transform body: `{"field": "...", "incrementBy": N}`.
pub fn decode_increment(json: &Json) -> Result<AtomicTransform, WireError> {
    let field = required_field(json)?;
    let raw = json
        .get("incrementBy")
        .ok_or(WireError::MissingIncrementBy)?;
    if !raw.is_number() {
        return Err(WireError::invalid_body("'incrementBy' must be a number"));
    }
    Ok(AtomicTransform::Increment {
        field,
        amount: decode_raw(raw),
    })
}

fn decode_elements(json: &Json) -> Result<Vec<Value>, WireError> {
    let elements = json
        .get("elements")
        .and_then(Json::as_array)
        .ok_or_else(|| WireError::MissingElements("elements".into()))?;
    if elements.is_empty() {
        return Err(WireError::MissingElements("elements".into()));
    }
    Ok(elements.iter().map(decode_raw).collect())
}

/// Decode an array-union transform body: `{"field": "...", "elements": [...]}`.
pub fn decode_array_union(json: &Json) -> Result<AtomicTransform, WireError> {
    let field = required_field(json)?;
    let elements = decode_elements(json)?;
    Ok(AtomicTransform::ArrayUnion { field, elements })
}

/// Decode an array-remove transform body: `{"field": "...", "elements": [...]}`.
pub fn decode_array_remove(json: &Json) -> Result<AtomicTransform, WireError> {
    let field = required_field(json)?;
    let elements = decode_elements(json)?;
    Ok(AtomicTransform::ArrayRemove { field, elements })
}

/// Decode a server-timestamp transform body: `{"field": "..."}`.
pub fn decode_server_timestamp(json: &Json) -> Result<AtomicTransform, WireError> {
    let field = required_field(json)?;
    Ok(AtomicTransform::ServerTimestamp { field })
}
