//! Document envelope encoding (spec §3 "Document", §4.D: "encoding responses
//! is the reverse: documents are emitted with `{name, fields, createTime,
//! updateTime}`").

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::value::{encode_typed_value, Value};

/// A document ready to go out over the wire: a resource name, its typed
/// fields, and the two server-assigned timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEnvelope {
    pub name: String,
    pub fields: IndexMap<String, Value>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

pub fn encode_document(doc: &DocumentEnvelope) -> Json {
    let mut fields = serde_json::Map::with_capacity(doc.fields.len());
    for (k, v) in &doc.fields {
        fields.insert(k.clone(), encode_typed_value(v));
    }
    serde_json::json!({
        "name": doc.name,
        "fields": Json::Object(fields),
        "createTime": doc.create_time.to_rfc3339_opts(SecondsFormat::Nanos, true),
        "updateTime": doc.update_time.to_rfc3339_opts(SecondsFormat::Nanos, true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn encodes_envelope_with_typed_fields() {
        let mut fields = IndexMap::new();
        fields.insert("name".to_owned(), Value::String("ada".into()));
        fields.insert("age".to_owned(), Value::Integer(37));
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let doc = DocumentEnvelope {
            name: "organizations/o/projects/p/databases/(default)/documents/users/1".into(),
            fields,
            create_time: ts,
            update_time: ts,
        };
        let json = encode_document(&doc);
        assert_eq!(json["name"], "organizations/o/projects/p/databases/(default)/documents/users/1");
        assert_eq!(json["fields"]["name"], serde_json::json!({"stringValue": "ada"}));
        assert_eq!(json["fields"]["age"], serde_json::json!({"integerValue": "37"}));
        assert!(json["createTime"].is_string());
        assert!(json["updateTime"].is_string());
    }
}
