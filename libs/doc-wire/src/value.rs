//! Typed value decode/encode (spec §3 "Typed value", §4.D).
//!
//! The wire format wraps every field value in an object with exactly one
//! discriminator key (`nullValue`, `booleanValue`, ...). Decoding drops the
//! wrapper and produces a native [`Value`]; encoding puts it back on. A
//! plain, unwrapped JSON scalar passes through unchanged — callers use that
//! path for raw incoming documents that were never typed-value-encoded.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value as Json};

use crate::error::WireError;

/// A decoded field value, with the wire's type wrapper stripped off.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    String(String),
    /// Base64 text, kept as-is at the codec boundary (spec §4.D).
    Bytes(String),
    Reference(String),
    GeoPoint { latitude: f64, longitude: f64 },
    Array(Vec<Value>),
    Map(IndexMap<String, Value>),
}

const DISCRIMINATORS: &[&str] = &[
    "nullValue",
    "booleanValue",
    "integerValue",
    "doubleValue",
    "timestampValue",
    "stringValue",
    "bytesValue",
    "referenceValue",
    "geoPointValue",
    "arrayValue",
    "mapValue",
];

/// Decode a wire typed-value object into a native [`Value`].
///
/// Invariant (spec §3): exactly one discriminator key must be present;
/// zero or two-or-more is a decode error (`invalid_request_body`).
pub fn decode_typed_value(json: &Json) -> Result<Value, WireError> {
    let obj = json
        .as_object()
        .ok_or_else(|| WireError::invalid_body("typed value must be a JSON object"))?;

    let present: Vec<&&str> = DISCRIMINATORS.iter().filter(|k| obj.contains_key(**k)).collect();
    match present.len() {
        0 => Err(WireError::invalid_body(
            "typed value object carries no recognized discriminator key",
        )),
        1 => decode_discriminated(present[0], obj),
        _ => Err(WireError::invalid_body(
            "typed value object carries more than one discriminator key",
        )),
    }
}

fn decode_discriminated(key: &str, obj: &Map<String, Json>) -> Result<Value, WireError> {
    let field = &obj[key];
    match key {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => field
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| WireError::invalid_body("booleanValue must be a JSON bool")),
        "integerValue" => decode_integer(field),
        "doubleValue" => field
            .as_f64()
            .map(Value::Double)
            .ok_or_else(|| WireError::invalid_body("doubleValue must be a JSON number")),
        "timestampValue" => {
            let s = field
                .as_str()
                .ok_or_else(|| WireError::invalid_body("timestampValue must be a string"))?;
            DateTime::parse_from_rfc3339(s)
                .map(|dt| Value::Timestamp(dt.with_timezone(&Utc)))
                .map_err(|e| WireError::invalid_body(format!("invalid RFC 3339 timestamp: {e}")))
        }
        "stringValue" => field
            .as_str()
            .map(|s| Value::String(s.to_owned()))
            .ok_or_else(|| WireError::invalid_body("stringValue must be a string")),
        "bytesValue" => field
            .as_str()
            .map(|s| Value::Bytes(s.to_owned()))
            .ok_or_else(|| WireError::invalid_body("bytesValue must be a base64 string")),
        "referenceValue" => field
            .as_str()
            .map(|s| Value::Reference(s.to_owned()))
            .ok_or_else(|| WireError::invalid_body("referenceValue must be a string")),
        "geoPointValue" => decode_geo_point(field),
        "arrayValue" => decode_array(field),
        "mapValue" => decode_map(field),
        _ => unreachable!("discriminator set is closed"),
    }
}

/// An `integerValue` may arrive as a JSON string or a JSON number; both must
/// parse to the same `int64` (spec §3).
fn decode_integer(field: &Json) -> Result<Value, WireError> {
    if let Some(s) = field.as_str() {
        return s
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| WireError::invalid_body(format!("invalid integerValue string '{s}'")));
    }
    if let Some(n) = field.as_i64() {
        return Ok(Value::Integer(n));
    }
    Err(WireError::invalid_body(
        "integerValue must be a JSON string or integral number",
    ))
}

fn decode_geo_point(field: &Json) -> Result<Value, WireError> {
    let lat = field
        .get("latitude")
        .and_then(Json::as_f64)
        .ok_or_else(|| WireError::invalid_body("geoPointValue.latitude must be a number"))?;
    let lng = field
        .get("longitude")
        .and_then(Json::as_f64)
        .ok_or_else(|| WireError::invalid_body("geoPointValue.longitude must be a number"))?;
    Ok(Value::GeoPoint {
        latitude: lat,
        longitude: lng,
    })
}

fn decode_array(field: &Json) -> Result<Value, WireError> {
    let values = field
        .get("values")
        .and_then(Json::as_array)
        .ok_or_else(|| WireError::invalid_body("arrayValue.values must be an array"))?;
    let decoded = values
        .iter()
        .map(decode_typed_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(decoded))
}

fn decode_map(field: &Json) -> Result<Value, WireError> {
    let fields = field
        .get("fields")
        .and_then(Json::as_object)
        .ok_or_else(|| WireError::invalid_body("mapValue.fields must be an object"))?;
    let mut out = IndexMap::with_capacity(fields.len());
    for (k, v) in fields {
        out.insert(k.clone(), decode_typed_value(v)?);
    }
    Ok(Value::Map(out))
}

/// Decode a plain, non-wrapped JSON value as-is (spec §4.D: "a plain scalar
/// is passed through unchanged — callers use this for incoming raw JSON
/// documents"). Containers recurse into [`decode_typed_value`]-shaped
/// entries only where the caller knows they are wrapped; this function never
/// assumes a wrapper.
pub fn decode_raw(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else {
                Value::Double(n.as_f64().unwrap_or_default())
            }
        }
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Array(items.iter().map(decode_raw).collect()),
        Json::Object(obj) => {
            let mut map = IndexMap::with_capacity(obj.len());
            for (k, v) in obj {
                map.insert(k.clone(), decode_raw(v));
            }
            Value::Map(map)
        }
    }
}

/// Encode a native [`Value`] back into its wire typed-value wrapper.
pub fn encode_typed_value(value: &Value) -> Json {
    match value {
        Value::Null => serde_json::json!({ "nullValue": null }),
        Value::Bool(b) => serde_json::json!({ "booleanValue": b }),
        Value::Integer(i) => serde_json::json!({ "integerValue": i.to_string() }),
        Value::Double(d) => serde_json::json!({ "doubleValue": d }),
        Value::Timestamp(ts) => {
            serde_json::json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::Nanos, true) })
        }
        Value::String(s) => serde_json::json!({ "stringValue": s }),
        Value::Bytes(b) => serde_json::json!({ "bytesValue": b }),
        Value::Reference(r) => serde_json::json!({ "referenceValue": r }),
        Value::GeoPoint { latitude, longitude } => {
            serde_json::json!({ "geoPointValue": { "latitude": latitude, "longitude": longitude } })
        }
        Value::Array(items) => {
            let values: Vec<Json> = items.iter().map(encode_typed_value).collect();
            serde_json::json!({ "arrayValue": { "values": values } })
        }
        Value::Map(fields) => {
            let mut map = Map::with_capacity(fields.len());
            for (k, v) in fields {
                map.insert(k.clone(), encode_typed_value(v));
            }
            serde_json::json!({ "mapValue": { "fields": Json::Object(map) } })
        }
    }
}

/// Encode a native [`Value`] back to a plain, unwrapped JSON scalar — the
/// inverse of [`decode_raw`]. Atomic-transform responses report the field's
/// new value this way (spec §8 S1: `{"newValue":42}`, not a typed-value
/// wrapper), since the request body that produced it was never wrapped
/// either.
pub fn encode_raw(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(i) => serde_json::json!(i),
        Value::Double(d) => serde_json::json!(d),
        Value::Timestamp(ts) => Json::String(ts.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(b) => Json::String(b.clone()),
        Value::Reference(r) => Json::String(r.clone()),
        Value::GeoPoint { latitude, longitude } => {
            serde_json::json!({ "latitude": latitude, "longitude": longitude })
        }
        Value::Array(items) => Json::Array(items.iter().map(encode_raw).collect()),
        Value::Map(fields) => {
            let mut map = Map::with_capacity(fields.len());
            for (k, v) in fields {
                map.insert(k.clone(), encode_raw(v));
            }
            Json::Object(map)
        }
    }
}

/// Deep equality used by atomic array-union/array-remove dedup (spec §4.F).
/// `Value` already derives `PartialEq` structurally; this alias documents
/// the intent at call sites.
pub fn deep_eq(a: &Value, b: &Value) -> bool {
    a == b
}

impl Value {
    /// Best-effort numeric coercion, used by atomic increment (spec §4.F):
    /// increment promotes to `f64` when either operand is a double.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Integer(i) => Some(Number::from(*i)),
            Value::Double(d) => Number::from_f64(*d),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_zero_discriminators() {
        let err = decode_typed_value(&json!({})).unwrap_err();
        assert_eq!(err.code(), "invalid_request_body");
    }

    #[test]
    fn rejects_two_discriminators() {
        let err =
            decode_typed_value(&json!({"stringValue": "a", "booleanValue": true})).unwrap_err();
        assert_eq!(err.code(), "invalid_request_body");
    }

    #[test]
    fn integer_value_accepts_string_and_number_identically() {
        let from_string = decode_typed_value(&json!({"integerValue": "42"})).unwrap();
        let from_number = decode_typed_value(&json!({"integerValue": 42})).unwrap();
        assert_eq!(from_string, Value::Integer(42));
        assert_eq!(from_number, Value::Integer(42));
    }

    #[test]
    fn array_round_trip_s6() {
        let wire = json!({"arrayValue":{"values":[
            {"stringValue":"a"},
            {"integerValue":"42"},
            {"booleanValue":true}
        ]}});
        let decoded = decode_typed_value(&wire).unwrap();
        assert_eq!(
            decoded,
            Value::Array(vec![
                Value::String("a".into()),
                Value::Integer(42),
                Value::Bool(true),
            ])
        );
        let re_encoded = encode_typed_value(&decoded);
        assert_eq!(
            re_encoded,
            json!({"arrayValue":{"values":[
                {"stringValue":"a"},
                {"integerValue":"42"},
                {"booleanValue":true}
            ]}})
        );
    }

    #[test]
    fn bytes_value_passes_through_base64_unchanged() {
        let decoded = decode_typed_value(&json!({"bytesValue": "aGVsbG8="})).unwrap();
        assert_eq!(decoded, Value::Bytes("aGVsbG8=".into()));
        assert_eq!(
            encode_typed_value(&decoded),
            json!({"bytesValue": "aGVsbG8="})
        );
    }

    #[test]
    fn timestamp_round_trips_to_utc() {
        let decoded =
            decode_typed_value(&json!({"timestampValue": "2024-01-02T03:04:05Z"})).unwrap();
        match decoded {
            Value::Timestamp(ts) => assert_eq!(ts.to_rfc3339(), "2024-01-02T03:04:05+00:00"),
            _ => panic!("expected timestamp"),
        }
    }

    #[test]
    fn geo_point_retains_structure() {
        let decoded =
            decode_typed_value(&json!({"geoPointValue": {"latitude": 1.5, "longitude": -2.5}}))
                .unwrap();
        assert_eq!(
            decoded,
            Value::GeoPoint {
                latitude: 1.5,
                longitude: -2.5
            }
        );
    }

    #[test]
    fn raw_decode_passes_plain_scalars_through() {
        assert_eq!(decode_raw(&json!("hello")), Value::String("hello".into()));
        assert_eq!(decode_raw(&json!(7)), Value::Integer(7));
        assert_eq!(decode_raw(&json!(true)), Value::Bool(true));
    }

    #[test]
    fn encode_raw_round_trips_plain_scalars() {
        assert_eq!(encode_raw(&Value::Integer(42)), json!(42));
        assert_eq!(encode_raw(&Value::String("a".into())), json!("a"));
        assert_eq!(encode_raw(&decode_raw(&json!({"n": 1}))), json!({"n": 1}));
    }

    #[test]
    fn deep_equality_compares_structurally() {
        let a = Value::Array(vec![Value::Integer(1), Value::String("x".into())]);
        let b = Value::Array(vec![Value::Integer(1), Value::String("x".into())]);
        let c = Value::Array(vec![Value::Integer(2)]);
        assert!(deep_eq(&a, &b));
        assert!(!deep_eq(&a, &c));
    }
}
