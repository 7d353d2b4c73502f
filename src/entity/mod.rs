//! Entity subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap:
//!     EntitySpec[] → catalog.rs (check relation targets) → Arc<EntityCatalog>
//!
//! Request time:
//!     route token value ("42")
//!     → resolver.rs (parse id by IdKind, one find_by_id)
//!     → Entity (instance.rs) or NotFound
//!
//!     entity.related("comments")
//!     → first call: query_by_foreign_key, cache in OnceCell
//!     → later calls: cached slice, no I/O
//! ```
//!
//! # Design Decisions
//! - Entities carry their spec, so handlers never pass type names around
//! - Relation access is an explicit async accessor, never hidden I/O behind a field
//! - Writes go through `Entity::save` / `Entity::delete`, called by handlers only

pub mod catalog;
pub mod instance;
pub mod repository;
pub mod resolver;
pub mod spec;

use thiserror::Error;

use crate::persistence::PersistenceError;

pub use catalog::EntityCatalog;
pub use instance::Entity;
pub use repository::Repository;
pub use resolver::{EntityResolver, ResolveError};
pub use spec::{EntitySpec, Relation};

/// Configuration faults in entity declarations.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("entity '{0}' is declared twice")]
    DuplicateEntity(String),

    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("relation '{entity}.{relation}' targets unknown entity '{target}'")]
    UnknownRelationTarget {
        entity: String,
        relation: String,
        target: String,
    },

    #[error("relation '{entity}.{relation}' uses foreign field '{field}' not declared on the target")]
    UnknownForeignField {
        entity: String,
        relation: String,
        field: String,
    },
}

/// Failures while working with a loaded entity.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("{entity} has no relation '{relation}'")]
    UnknownRelation { entity: String, relation: String },

    #[error("{entity} has no attribute '{attribute}'")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("{0} has not been saved yet")]
    Unsaved(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
