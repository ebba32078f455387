//! Structured query and aggregation query decode/encode (spec §3, §4.D).

use serde_json::Value as Json;

use crate::error::WireError;
use crate::value::{decode_typed_value, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    NotEq,
    ArrayContains,
    ArrayContainsAny,
    In,
    NotIn,
}

impl Operator {
    fn parse(token: &str) -> Result<Self, WireError> {
        Ok(match token {
            "EQUAL" => Operator::Eq,
            "LESS_THAN" => Operator::Lt,
            "LESS_THAN_OR_EQUAL" => Operator::Lte,
            "GREATER_THAN" => Operator::Gt,
            "GREATER_THAN_OR_EQUAL" => Operator::Gte,
            "NOT_EQUAL" => Operator::NotEq,
            "ARRAY_CONTAINS" => Operator::ArrayContains,
            "ARRAY_CONTAINS_ANY" => Operator::ArrayContainsAny,
            "IN" => Operator::In,
            "NOT_IN" => Operator::NotIn,
            other => return Err(WireError::InvalidOperator(other.to_owned())),
        })
    }

    pub fn as_wire_token(self) -> &'static str {
        match self {
            Operator::Eq => "EQUAL",
            Operator::Lt => "LESS_THAN",
            Operator::Lte => "LESS_THAN_OR_EQUAL",
            Operator::Gt => "GREATER_THAN",
            Operator::Gte => "GREATER_THAN_OR_EQUAL",
            Operator::NotEq => "NOT_EQUAL",
            Operator::ArrayContains => "ARRAY_CONTAINS",
            Operator::ArrayContainsAny => "ARRAY_CONTAINS_ANY",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
        }
    }
}

/// A decoded filter-tree node (spec §4.D): a leaf field filter, or an `Or`
/// node whose children are themselves decoded filters. `And` never appears
/// here — composite AND filters are flattened into the parent conjunction
/// list at decode time.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Field {
        field: String,
        op: Operator,
        value: Value,
    },
    Or(Vec<Filter>),
}

/// Decode a `where` clause into the top-level conjunction list (spec §4.D).
/// An absent clause decodes to an empty conjunction (no filter).
pub fn decode_filter_tree(json: Option<&Json>) -> Result<Vec<Filter>, WireError> {
    let Some(json) = json else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    decode_filter_into(json, &mut out)?;
    Ok(out)
}

fn decode_filter_into(json: &Json, out: &mut Vec<Filter>) -> Result<(), WireError> {
    let obj = json
        .as_object()
        .ok_or_else(|| WireError::invalid_body("filter node must be a JSON object"))?;

    if let Some(field_filter) = obj.get("fieldFilter") {
        let field = field_filter
            .get("field")
            .and_then(|f| f.get("fieldPath"))
            .and_then(Json::as_str)
            .ok_or_else(|| WireError::invalid_body("fieldFilter.field.fieldPath is required"))?
            .to_owned();
        let op_token = field_filter
            .get("op")
            .and_then(Json::as_str)
            .ok_or_else(|| WireError::invalid_body("fieldFilter.op is required"))?;
        let op = Operator::parse(op_token)?;
        let value_json = field_filter
            .get("value")
            .ok_or_else(|| WireError::invalid_body("fieldFilter.value is required"))?;
        let value = decode_typed_value(value_json)?;
        out.push(Filter::Field { field, op, value });
        return Ok(());
    }

    if let Some(composite) = obj.get("compositeFilter") {
        let op_token = composite
            .get("op")
            .and_then(Json::as_str)
            .ok_or_else(|| WireError::invalid_body("compositeFilter.op is required"))?;
        let children = composite
            .get("filters")
            .and_then(Json::as_array)
            .ok_or_else(|| WireError::invalid_body("compositeFilter.filters must be an array"))?;
        return match op_token {
            "AND" => {
                for child in children {
                    decode_filter_into(child, out)?;
                }
                Ok(())
            }
            "OR" => {
                let mut or_children = Vec::with_capacity(children.len());
                for child in children {
                    decode_filter_into(child, &mut or_children)?;
                }
                out.push(Filter::Or(or_children));
                Ok(())
            }
            other => Err(WireError::InvalidOperator(other.to_owned())),
        };
    }

    Err(WireError::invalid_body(
        "filter node must contain 'fieldFilter' or 'compositeFilter'",
    ))
}

/// Re-encode a conjunction list back to the wire shape (used for the round
/// trip test in spec §8 property 5). A one-element list with a single
/// `Field` encodes as a bare `fieldFilter`; anything else wraps in an `AND`
/// `compositeFilter`, with `Or` nodes re-wrapped as `OR` composites.
pub fn encode_filter_tree(filters: &[Filter]) -> Json {
    match filters {
        [single] => encode_filter_node(single),
        many => {
            let encoded: Vec<Json> = many.iter().map(encode_filter_node).collect();
            serde_json::json!({ "compositeFilter": { "op": "AND", "filters": encoded } })
        }
    }
}

fn encode_filter_node(filter: &Filter) -> Json {
    match filter {
        Filter::Field { field, op, value } => serde_json::json!({
            "fieldFilter": {
                "field": { "fieldPath": field },
                "op": op.as_wire_token(),
                "value": crate::value::encode_typed_value(value),
            }
        }),
        Filter::Or(children) => {
            let encoded: Vec<Json> = children.iter().map(encode_filter_node).collect();
            serde_json::json!({ "compositeFilter": { "op": "OR", "filters": encoded } })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub values: Vec<Value>,
    pub before: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub collection_id: String,
    pub all_descendants: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    pub from: Vec<Selector>,
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
    pub start_at: Option<Cursor>,
    pub end_at: Option<Cursor>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn decode_cursor(json: &Json) -> Result<Cursor, WireError> {
    let values = json
        .get("values")
        .and_then(Json::as_array)
        .ok_or_else(|| WireError::invalid_body("cursor.values must be an array"))?
        .iter()
        .map(decode_typed_value)
        .collect::<Result<Vec<_>, _>>()?;
    let before = json.get("before").and_then(Json::as_bool).unwrap_or(false);
    Ok(Cursor { values, before })
}

fn decode_order_by(json: &Json) -> Result<OrderBy, WireError> {
    let field = json
        .get("field")
        .and_then(|f| f.get("fieldPath"))
        .and_then(Json::as_str)
        .ok_or_else(|| WireError::invalid_body("orderBy.field.fieldPath is required"))?
        .to_owned();
    let direction = match json.get("direction").and_then(Json::as_str) {
        Some("DESCENDING") => Direction::Descending,
        Some("ASCENDING") | None => Direction::Ascending,
        Some(other) => return Err(WireError::InvalidOperator(other.to_owned())),
    };
    Ok(OrderBy { field, direction })
}

/// Decode the inner `structuredQuery` object (spec §3, §4.D).
pub fn decode_structured_query(json: &Json) -> Result<StructuredQuery, WireError> {
    let from = json
        .get("from")
        .and_then(Json::as_array)
        .map(|arr| {
            arr.iter()
                .map(|s| {
                    let collection_id = s
                        .get("collectionId")
                        .and_then(Json::as_str)
                        .unwrap_or_default()
                        .to_owned();
                    let all_descendants = s
                        .get("allDescendants")
                        .and_then(Json::as_bool)
                        .unwrap_or(false);
                    Selector {
                        collection_id,
                        all_descendants,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let filters = decode_filter_tree(json.get("where"))?;

    let order_by = json
        .get("orderBy")
        .and_then(Json::as_array)
        .map(|arr| arr.iter().map(decode_order_by).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();

    let start_at = json.get("startAt").map(decode_cursor).transpose()?;
    let end_at = json.get("endAt").map(decode_cursor).transpose()?;
    let limit = json.get("limit").and_then(Json::as_i64);
    let offset = json.get("offset").and_then(Json::as_i64);

    Ok(StructuredQuery {
        from,
        filters,
        order_by,
        start_at,
        end_at,
        limit,
        offset,
    })
}

/// Top-level body shape the dispatcher (spec §4.E) uses to tell `:runQuery`
/// and `:runAggregationQuery` bodies apart before routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryBodyShape {
    Query,
    AggregationQuery,
    Both,
    Neither,
}

pub fn detect_query_shape(json: &Json) -> QueryBodyShape {
    let has_query = json.get("structuredQuery").is_some();
    let has_aggregation = json.get("structuredAggregationQuery").is_some();
    match (has_query, has_aggregation) {
        (true, true) => QueryBodyShape::Both,
        (true, false) => QueryBodyShape::Query,
        (false, true) => QueryBodyShape::AggregationQuery,
        (false, false) => QueryBodyShape::Neither,
    }
}

/// Decode a `documents:runQuery` request body (spec §4.F row "Run query").
pub fn decode_run_query_request(json: &Json) -> Result<StructuredQuery, WireError> {
    let inner = json
        .get("structuredQuery")
        .ok_or_else(|| WireError::invalid_body("'structuredQuery' is required"))?;
    decode_structured_query(inner)
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregationKind {
    Count,
    Sum(String),
    Avg(String),
    Min(String),
    Max(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub alias: String,
    pub kind: AggregationKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationQuery {
    pub structured_query: StructuredQuery,
    pub group_by: Vec<String>,
    pub aggregations: Vec<Aggregation>,
}

fn decode_aggregation(json: &Json) -> Result<Aggregation, WireError> {
    let alias = json
        .get("alias")
        .and_then(Json::as_str)
        .ok_or_else(|| WireError::InvalidAggregationFormat("aggregation.alias is required".into()))?
        .to_owned();

    let kinds_present = ["count", "sum", "avg", "min", "max"]
        .iter()
        .filter(|k| json.get(**k).is_some())
        .count();
    if kinds_present != 1 {
        return Err(WireError::InvalidAggregationFormat(format!(
            "aggregation '{alias}' must carry exactly one of count/sum/avg/min/max"
        )));
    }

    let field_of = |key: &str| -> Result<String, WireError> {
        json.get(key)
            .and_then(|v| v.get("field"))
            .and_then(|f| f.get("fieldPath"))
            .and_then(Json::as_str)
            .map(str::to_owned)
            .ok_or_else(|| {
                WireError::InvalidAggregationFormat(format!("{key}.field.fieldPath is required"))
            })
    };

    let kind = if json.get("count").is_some() {
        AggregationKind::Count
    } else if json.get("sum").is_some() {
        AggregationKind::Sum(field_of("sum")?)
    } else if json.get("avg").is_some() {
        AggregationKind::Avg(field_of("avg")?)
    } else if json.get("min").is_some() {
        AggregationKind::Min(field_of("min")?)
    } else {
        AggregationKind::Max(field_of("max")?)
    };

    Ok(Aggregation { alias, kind })
}

/// Decode a `documents:runAggregationQuery` request body (spec §4.D, §4.F).
pub fn decode_run_aggregation_query_request(json: &Json) -> Result<AggregationQuery, WireError> {
    let agg = json
        .get("structuredAggregationQuery")
        .ok_or(WireError::MissingStructuredAggregationQuery)?;

    let inner = agg
        .get("structuredQuery")
        .ok_or_else(|| WireError::invalid_body("structuredAggregationQuery.structuredQuery is required"))?;
    let structured_query = decode_structured_query(inner)?;

    let group_by = agg
        .get("groupBy")
        .and_then(Json::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Json::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let aggregations_json = agg
        .get("aggregations")
        .and_then(Json::as_array)
        .ok_or(WireError::MissingAggregations)?;
    if aggregations_json.is_empty() {
        return Err(WireError::MissingAggregations);
    }
    let aggregations = aggregations_json
        .iter()
        .map(decode_aggregation)
        .collect::<Result<Vec<_>, _>>()?;

    let aliases: std::collections::HashSet<&str> =
        aggregations.iter().map(|a| a.alias.as_str()).collect();
    if aliases.len() != aggregations.len() {
        return Err(WireError::InvalidAggregationFormat(
            "aggregation aliases must be unique".into(),
        ));
    }

    Ok(AggregationQuery {
        structured_query,
        group_by,
        aggregations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_filter_decodes_triple() {
        let json = json!({
            "fieldFilter": {
                "field": {"fieldPath": "age"},
                "op": "GREATER_THAN",
                "value": {"integerValue": "18"}
            }
        });
        let filters = decode_filter_tree(Some(&json)).unwrap();
        assert_eq!(
            filters,
            vec![Filter::Field {
                field: "age".into(),
                op: Operator::Gt,
                value: Value::Integer(18),
            }]
        );
    }

    #[test]
    fn composite_and_flattens_into_parent_list() {
        let json = json!({
            "compositeFilter": {
                "op": "AND",
                "filters": [
                    {"fieldFilter": {"field": {"fieldPath": "a"}, "op": "EQUAL", "value": {"integerValue": "1"}}},
                    {"fieldFilter": {"field": {"fieldPath": "b"}, "op": "EQUAL", "value": {"integerValue": "2"}}},
                ]
            }
        });
        let filters = decode_filter_tree(Some(&json)).unwrap();
        assert_eq!(filters.len(), 2);
        assert!(matches!(filters[0], Filter::Field { .. }));
        assert!(matches!(filters[1], Filter::Field { .. }));
    }

    #[test]
    fn composite_or_produces_single_tagged_node() {
        let json = json!({
            "compositeFilter": {
                "op": "OR",
                "filters": [
                    {"fieldFilter": {"field": {"fieldPath": "a"}, "op": "EQUAL", "value": {"integerValue": "1"}}},
                    {"fieldFilter": {"field": {"fieldPath": "b"}, "op": "EQUAL", "value": {"integerValue": "2"}}},
                ]
            }
        });
        let filters = decode_filter_tree(Some(&json)).unwrap();
        assert_eq!(filters.len(), 1);
        match &filters[0] {
            Filter::Or(children) => assert_eq!(children.len(), 2),
            _ => panic!("expected Or node"),
        }
    }

    #[test]
    fn nested_and_under_or_flattens_into_or_children() {
        let json = json!({
            "compositeFilter": {"op": "OR", "filters": [
                {"compositeFilter": {"op": "AND", "filters": [
                    {"fieldFilter": {"field": {"fieldPath": "a"}, "op": "EQUAL", "value": {"integerValue": "1"}}},
                    {"fieldFilter": {"field": {"fieldPath": "b"}, "op": "EQUAL", "value": {"integerValue": "2"}}},
                ]}},
                {"fieldFilter": {"field": {"fieldPath": "c"}, "op": "EQUAL", "value": {"integerValue": "3"}}},
            ]}
        });
        let filters = decode_filter_tree(Some(&json)).unwrap();
        assert_eq!(filters.len(), 1);
        match &filters[0] {
            Filter::Or(children) => assert_eq!(children.len(), 3),
            _ => panic!("expected Or node"),
        }
    }

    #[test]
    fn unknown_operator_token_fails() {
        let json = json!({"fieldFilter": {"field": {"fieldPath": "a"}, "op": "BOGUS", "value": {"integerValue": "1"}}});
        let err = decode_filter_tree(Some(&json)).unwrap_err();
        assert_eq!(err.code(), "invalid_operator");
    }

    #[test]
    fn filter_round_trip_preserves_triples_and_structure() {
        let original = json!({
            "compositeFilter": {"op": "AND", "filters": [
                {"fieldFilter": {"field": {"fieldPath": "a"}, "op": "EQUAL", "value": {"integerValue": "1"}}},
                {"compositeFilter": {"op": "OR", "filters": [
                    {"fieldFilter": {"field": {"fieldPath": "b"}, "op": "EQUAL", "value": {"stringValue": "x"}}},
                    {"fieldFilter": {"field": {"fieldPath": "c"}, "op": "EQUAL", "value": {"stringValue": "y"}}},
                ]}},
            ]}
        });
        let decoded = decode_filter_tree(Some(&original)).unwrap();
        let re_encoded = encode_filter_tree(&decoded);
        let re_decoded = decode_filter_tree(Some(&re_encoded)).unwrap();
        assert_eq!(decoded, re_decoded);
    }

    #[test]
    fn aggregation_requires_exactly_one_kind() {
        let zero_kinds = json!({"alias": "a"});
        assert!(decode_aggregation(&zero_kinds).is_err());

        let two_kinds = json!({"alias": "a", "count": {}, "sum": {"field": {"fieldPath": "x"}}});
        assert!(decode_aggregation(&two_kinds).is_err());

        let one_kind = json!({"alias": "a", "count": {}});
        assert!(decode_aggregation(&one_kind).is_ok());
    }

    #[test]
    fn aggregation_query_requires_non_empty_aggregations() {
        let body = json!({
            "structuredAggregationQuery": {
                "structuredQuery": {"from": [{"collectionId": "c"}]},
                "aggregations": []
            }
        });
        let err = decode_run_aggregation_query_request(&body).unwrap_err();
        assert_eq!(err.code(), "missing_aggregations");
    }

    #[test]
    fn aggregation_query_rejects_duplicate_aliases() {
        let body = json!({
            "structuredAggregationQuery": {
                "structuredQuery": {"from": [{"collectionId": "c"}]},
                "aggregations": [
                    {"alias": "n", "count": {}},
                    {"alias": "n", "count": {}},
                ]
            }
        });
        assert!(decode_run_aggregation_query_request(&body).is_err());
    }

    #[test]
    fn detects_body_shape_for_dispatch_disambiguation() {
        assert_eq!(
            detect_query_shape(&json!({"structuredQuery": {}})),
            QueryBodyShape::Query
        );
        assert_eq!(
            detect_query_shape(&json!({"structuredAggregationQuery": {}})),
            QueryBodyShape::AggregationQuery
        );
        assert_eq!(
            detect_query_shape(&json!({"structuredQuery": {}, "structuredAggregationQuery": {}})),
            QueryBodyShape::Both
        );
    }
}
