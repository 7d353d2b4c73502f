//! Handler results awaiting serialization.

use serde::Serialize;
use serde_json::Value;

use crate::dispatch::handler::HandlerError;

/// What a handler returns. The transport adapter turns it into a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Json { status: u16, body: Value },
    Empty { status: u16 },
}

impl Reply {
    /// 200 with a serialized body.
    pub fn ok<T: Serialize>(body: &T) -> Result<Self, HandlerError> {
        Self::json(200, body)
    }

    /// 201 with a serialized body.
    pub fn created<T: Serialize>(body: &T) -> Result<Self, HandlerError> {
        Self::json(201, body)
    }

    pub fn json<T: Serialize>(status: u16, body: &T) -> Result<Self, HandlerError> {
        Ok(Reply::Json {
            status,
            body: serde_json::to_value(body)?,
        })
    }

    pub fn no_content() -> Self {
        Reply::Empty { status: 204 }
    }

    pub fn status(&self) -> u16 {
        match self {
            Reply::Json { status, .. } | Reply::Empty { status } => *status,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            Reply::Json { body, .. } => Some(body),
            Reply::Empty { .. } => None,
        }
    }
}
