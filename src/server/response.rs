//! Envelope response format for all sync server replies.
//!
//! Every reply is wrapped in the same envelope:
//! ```json
//! {
//!   "success": true,
//!   "errors": [],
//!   "messages": [{ "kind": "SUCCESS", "code": "SAVED_CHUNK", "message": "..." }],
//!   "data": { ... }
//! }
//! ```
//!
//! Failures are reported in `errors` with HTTP 200 so that clients only ever
//! parse one shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Failure, KettleError};

/// Informational notice attached to a reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub kind: String,
    pub code: String,
    pub message: String,
}

/// Envelope wrapping every reply.
#[derive(Debug, Clone, Serialize)]
pub struct SyncResponse {
    /// False as soon as one failure is recorded.
    pub success: bool,

    /// Failures (empty on success).
    pub errors: Vec<Failure>,

    /// Notices.
    pub messages: Vec<Notice>,

    /// Reply payload.
    pub data: Map<String, Value>,
}

impl Default for SyncResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncResponse {
    /// Create an empty, successful reply.
    pub fn new() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            messages: Vec::new(),
            data: Map::new(),
        }
    }

    /// Record a failure.
    pub fn fail(mut self, failure: Failure) -> Self {
        self.success = false;
        self.errors.push(failure);
        self
    }

    /// Record an `ERROR` failure with the given code.
    pub fn fail_with(self, code: &str, message: &str) -> Self {
        self.fail(Failure::new("ERROR", code, message))
    }

    /// Record a failure from a domain error.
    pub fn fail_from(self, err: &KettleError) -> Self {
        self.fail(err.to_failure())
    }

    /// Add a notice.
    pub fn notify(mut self, kind: &str, code: &str, message: &str) -> Self {
        self.messages.push(Notice {
            kind: kind.to_string(),
            code: code.to_string(),
            message: message.to_string(),
        });
        self
    }

    /// Set a data field.
    pub fn update(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Code of the first failure, if any.
    pub fn error_code(&self) -> Option<&str> {
        self.errors.first().map(|e| e.code.as_str())
    }
}

impl IntoResponse for SyncResponse {
    fn into_response(self) -> Response {
        let body = serde_json::to_string(&self).unwrap_or_else(|_| {
            r#"{"success":false,"errors":[{"kind":"ERROR","code":"SERIALIZATION_ERROR","message":"Failed to serialize response"}],"messages":[],"data":{}}"#.to_string()
        });

        (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}
