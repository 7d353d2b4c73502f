//! Handler signature and the context handed to handlers.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::dispatch::args::Args;
use crate::dispatch::reply::Reply;
use crate::entity::{EntityCatalog, EntityError, Repository};
use crate::persistence::{Persistence, PersistenceError};

pub type HandlerResult = Result<Reply, HandlerError>;

/// A controller method: resolved arguments in, reply out.
pub type Handler = Arc<dyn Fn(HandlerContext, Args) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Wrap an async closure as a `Handler`.
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(HandlerContext, Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx, args| Box::pin(f(ctx, args)))
}

/// Faults raised inside handler bodies. Propagated to the transport untouched.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error("argument {index} is not a {expected}")]
    Argument { index: usize, expected: &'static str },

    /// A domain fault with a status the handler picked.
    #[error("{message}")]
    Fault { status: u16, message: String },

    #[error("failed to serialize reply: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HandlerError {
    pub fn fault(status: u16, message: impl Into<String>) -> Self {
        HandlerError::Fault {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            HandlerError::Fault { status, .. } => *status,
            _ => 500,
        }
    }
}

/// Per-request services available to a handler.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    catalog: Arc<EntityCatalog>,
    store: Arc<dyn Persistence>,
    request_id: String,
}

impl HandlerContext {
    pub fn new(catalog: Arc<EntityCatalog>, store: Arc<dyn Persistence>, request_id: impl Into<String>) -> Self {
        Self {
            catalog,
            store,
            request_id: request_id.into(),
        }
    }

    /// Repository for a declared entity type.
    pub fn repository(&self, entity: &str) -> Result<Repository, HandlerError> {
        let spec = self.catalog.require(entity).map_err(EntityError::from)?;
        Ok(Repository::new(spec.clone(), self.catalog.clone(), self.store.clone()))
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<dyn Persistence> {
        &self.store
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}
