//! Response handling and transformation.
//!
//! # Responsibilities
//! - Serialize handler replies as JSON responses
//! - Map pipeline failures to status codes and JSON error bodies
//!
//! # Design Decisions
//! - Error bodies share one shape: `{"error": kind, "message": text, ...details}`
//! - Server faults never leak backend details; those are logged instead

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::dispatch::{DispatchError, Reply};
use crate::http::request::RequestError;

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json { status: code, body } => (status(code), Json(body)).into_response(),
            Reply::Empty { status: code } => status(code).into_response(),
        }
    }
}

/// JSON body for a pipeline failure.
pub fn error_body(err: &DispatchError) -> Value {
    let kind = err.kind();
    if err.status() >= 500 {
        return json!({"error": kind, "message": "internal server error"});
    }

    let mut body = json!({"error": kind, "message": err.to_string()});
    let details = match err {
        DispatchError::InvalidParameter {
            token,
            value,
            expected,
        } => json!({"token": token, "value": value, "expected": expected}),
        DispatchError::EntityNotFound { entity, id } => json!({"entity": entity, "id": id}),
        DispatchError::ValidationFailed { form, result } => json!({"form": form, "errors": result.errors}),
        DispatchError::MalformedPayload { form, .. } => json!({"form": form}),
        _ => Value::Null,
    };
    if let (Value::Object(target), Value::Object(extra)) = (&mut body, details) {
        target.extend(extra);
    }
    body
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        (status(self.status()), Json(error_body(&self))).into_response()
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        match self {
            RequestError::Dispatch(err) => err.into_response(),
            RequestError::TooLarge(_) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({"error": "payload_too_large", "message": self.to_string()})),
            )
                .into_response(),
        }
    }
}
