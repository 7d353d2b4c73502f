//! Request handling and transformation.
//!
//! # Responsibilities
//! - Read the request ID set by the request-id layer
//! - Map the HTTP method onto a dispatch `Verb`
//! - Buffer the body for the dispatcher
//!
//! # Design Decisions
//! - Request ID read as early as possible for tracing
//! - Body size enforced while buffering, not after
//! - The body is not decoded here; only form parameters read it

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request};
use thiserror::Error;
use uuid::Uuid;

use crate::dispatch::{DispatchError, InboundRequest, Payload};
use crate::routing::Verb;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Failures converting an HTTP request before dispatch.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("request body exceeds {0} bytes")]
    TooLarge(usize),
}

/// The request ID header value, or a fresh UUID when absent.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub fn verb(method: &Method) -> Option<Verb> {
    match *method {
        Method::GET => Some(Verb::Get),
        Method::POST => Some(Verb::Post),
        Method::PATCH => Some(Verb::Patch),
        Method::PUT => Some(Verb::Put),
        Method::DELETE => Some(Verb::Delete),
        _ => None,
    }
}

/// Convert an HTTP request into a transport-neutral `InboundRequest`.
pub async fn into_inbound(request: Request<Body>, max_body_bytes: usize) -> Result<InboundRequest, RequestError> {
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers);
    let path = parts.uri.path().to_string();

    let verb = verb(&parts.method).ok_or_else(|| DispatchError::RouteNotFound {
        verb: parts.method.to_string(),
        path: path.clone(),
    })?;

    let bytes = to_bytes(body, max_body_bytes)
        .await
        .map_err(|_| RequestError::TooLarge(max_body_bytes))?;

    Ok(InboundRequest {
        verb,
        path,
        payload: Payload::Raw(bytes.to_vec()),
        request_id,
    })
}
