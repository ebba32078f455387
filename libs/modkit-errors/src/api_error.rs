//! The wire error body this product's HTTP surface actually returns
//! (spec §6 "Error body"): `{"error", "message", "code"}`, distinct from the
//! RFC 9457 [`crate::Problem`] shape this crate also carries for ambient,
//! non-wire-facing error reporting.

use http::StatusCode;
use serde::Serialize;

use crate::catalog::ErrDef;

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine code (spec §7), e.g. `"missing_field"`.
    pub error: String,
    /// Human-readable detail; never leaks a downstream message's shape
    /// beyond plain text (spec §7 "the machine code must not" carry it).
    pub message: String,
    /// The same canonical machine code as `error`. Kept as a distinct field
    /// because the wire contract names both.
    pub code: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ErrDef {
    pub fn as_api_error(&self, detail: impl Into<String>) -> ApiError {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ApiError {
            error: self.code.to_owned(),
            message: detail.into(),
            code: self.code.to_owned(),
            status,
        }
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status;
        let mut resp = axum::Json(self).into_response();
        *resp.status_mut() = status;
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_wire_shaped_body_from_err_def() {
        let def = ErrDef {
            status: 400,
            title: "Bad Request",
            code: "missing_field",
            type_url: "about:blank",
        };
        let err = def.as_api_error("field 'x' is required");
        assert_eq!(err.error, "missing_field");
        assert_eq!(err.code, "missing_field");
        assert_eq!(err.message, "field 'x' is required");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
