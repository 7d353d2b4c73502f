//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest (verb, path, payload, request id)
//!     → RouteTable::match_route            (RouteNotFound)
//!     → per ParamSpec, in declared order:
//!         Primitive → ScalarType::parse    (InvalidParameter)
//!         Form      → Payload::decode      (MalformedPayload)
//!                   → forms::bind          (ValidationFailed)
//!         Entity    → EntityResolver       (InvalidParameter / EntityNotFound)
//!     → handler(HandlerContext, Args)      (Handler faults pass through)
//!     → Reply
//! ```
//!
//! # Design Decisions
//! - Failures are typed `DispatchError` values, each with a fixed status class
//! - Handlers never see a partially resolved argument list
//! - The body stays undecoded until a form parameter asks for it
//! - Controllers are plain builders; no reflection or attribute scanning

pub mod args;
pub mod controller;
pub mod dispatcher;
pub mod handler;
pub mod reply;

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::forms::ValidationResult;
use crate::persistence::PersistenceError;
use crate::routing::Verb;

pub use args::{Arg, Args, Scalar, ScalarType};
pub use controller::{Controller, Param, RouteDecl};
pub use dispatcher::Dispatcher;
pub use handler::{handler, Handler, HandlerContext, HandlerError, HandlerResult};
pub use reply::Reply;

/// Request body as handed over by the transport.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Already decoded, e.g. when dispatching in-process.
    Json(Value),
    /// Buffered bytes, decoded on first use by a form parameter.
    Raw(Vec<u8>),
}

impl Payload {
    /// Decode the body. Empty or whitespace-only bodies decode as `{}`.
    pub fn decode(&self) -> Result<Value, serde_json::Error> {
        match self {
            Payload::Json(value) => Ok(value.clone()),
            Payload::Raw(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => {
                Ok(Value::Object(Default::default()))
            }
            Payload::Raw(bytes) => serde_json::from_slice(bytes),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Json(Value::Object(Default::default()))
    }
}

/// A transport-neutral request.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub verb: Verb,
    pub path: String,
    pub payload: Payload,
    pub request_id: String,
}

impl InboundRequest {
    pub fn new(verb: Verb, path: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
            payload: Payload::default(),
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Payload::Json(payload);
        self
    }

    pub fn raw_body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.payload = Payload::Raw(bytes.into());
        self
    }

    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = id.into();
        self
    }
}

/// Per-request pipeline failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route for {verb} {path}")]
    RouteNotFound { verb: String, path: String },

    #[error("parameter '{token}' value '{value}' is not a valid {expected}")]
    InvalidParameter {
        token: String,
        value: String,
        expected: String,
    },

    #[error("{entity} with id '{id}' not found")]
    EntityNotFound { entity: String, id: String },

    #[error("payload for {form} is not valid JSON: {reason}")]
    MalformedPayload { form: String, reason: String },

    #[error("{form} failed validation")]
    ValidationFailed {
        form: String,
        result: ValidationResult,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl DispatchError {
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::RouteNotFound { .. } => 404,
            DispatchError::InvalidParameter { .. } => 400,
            DispatchError::EntityNotFound { .. } => 404,
            DispatchError::MalformedPayload { .. } => 400,
            DispatchError::ValidationFailed { .. } => 422,
            DispatchError::Persistence(_) => 500,
            DispatchError::Handler(e) => e.status(),
        }
    }

    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::RouteNotFound { .. } => "route_not_found",
            DispatchError::InvalidParameter { .. } => "invalid_parameter",
            DispatchError::EntityNotFound { .. } => "entity_not_found",
            DispatchError::MalformedPayload { .. } => "malformed_payload",
            DispatchError::ValidationFailed { .. } => "validation_failed",
            DispatchError::Persistence(_) => "persistence",
            DispatchError::Handler(HandlerError::Fault { .. }) => "fault",
            DispatchError::Handler(_) => "handler",
        }
    }
}
