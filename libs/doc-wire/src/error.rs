//! Pure decode-error type for the wire codec (spec §7 taxonomy, wire slice).
//!
//! Kept framework-agnostic on purpose, the way the teacher's `modkit-odata`
//! crate keeps its own `Error` independent of `modkit-errors::Problem` and
//! leaves the HTTP mapping to the consuming crate (`problem_mapping.rs`
//! there; `apps/doc-gateway-server/src/wire_errors.rs` here).

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    InvalidRequestBody(String),
    MissingField(String),
    MissingElements(String),
    MissingIncrementBy,
    InvalidOperator(String),
    MissingStructuredAggregationQuery,
    MissingAggregations,
    InvalidAggregationFormat(String),
}

impl WireError {
    pub fn invalid_body(detail: impl Into<String>) -> Self {
        Self::InvalidRequestBody(detail.into())
    }

    /// Machine code from spec §7, independent of any HTTP framework.
    pub fn code(&self) -> &'static str {
        match self {
            WireError::InvalidRequestBody(_) => "invalid_request_body",
            WireError::MissingField(_) => "missing_field",
            WireError::MissingElements(_) => "missing_elements",
            WireError::MissingIncrementBy => "missing_increment_by",
            WireError::InvalidOperator(_) => "invalid_operator",
            WireError::MissingStructuredAggregationQuery => {
                "missing_structured_aggregation_query"
            }
            WireError::MissingAggregations => "missing_aggregations",
            WireError::InvalidAggregationFormat(_) => "invalid_aggregation_format",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            WireError::InvalidRequestBody(d) => d.clone(),
            WireError::MissingField(f) => format!("field '{f}' is required"),
            WireError::MissingElements(f) => format!("'{f}' must be a non-empty array"),
            WireError::MissingIncrementBy => "'incrementBy' is required".to_owned(),
            WireError::InvalidOperator(op) => format!("unrecognized operator '{op}'"),
            WireError::MissingStructuredAggregationQuery => {
                "'structuredAggregationQuery' is required".to_owned()
            }
            WireError::MissingAggregations => "'aggregations' must be a non-empty array".to_owned(),
            WireError::InvalidAggregationFormat(d) => d.clone(),
        }
    }
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.detail())
    }
}

impl std::error::Error for WireError {}
