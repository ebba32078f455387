//! Wire-format codec for the document gateway: typed values, structured
//! queries, aggregation queries, atomic transforms, and document response
//! envelopes (spec §3, §4.D).

pub mod error;
pub mod query;
pub mod response;
pub mod transform;
pub mod value;

pub use error::WireError;
pub use query::{
    decode_filter_tree, decode_run_aggregation_query_request, decode_run_query_request,
    decode_structured_query, detect_query_shape, encode_filter_tree, Aggregation,
    AggregationKind, AggregationQuery, Cursor, Direction, Filter, Operator, OrderBy,
    QueryBodyShape, Selector, StructuredQuery,
};
pub use response::{encode_document, DocumentEnvelope};
pub use transform::{
    decode_array_remove, decode_array_union, decode_increment, decode_server_timestamp,
    AtomicTransform,
};
pub use value::{decode_raw, decode_typed_value, deep_eq, encode_raw, encode_typed_value, Value};
