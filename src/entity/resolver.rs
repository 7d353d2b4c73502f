//! Route-token → entity resolution.
//!
//! # Responsibilities
//! - Convert a raw path segment to the entity's identifier type
//! - Perform exactly one `find_by_id` lookup
//! - Report a miss as a typed outcome
//!
//! # Design Decisions
//! - No retries; a miss is terminal and becomes a 404-class response upstream
//! - Persistence failures are kept distinct from misses

use std::sync::Arc;

use thiserror::Error;

use crate::entity::catalog::EntityCatalog;
use crate::entity::instance::Entity;
use crate::entity::spec::EntitySpec;
use crate::persistence::{Persistence, PersistenceError};

/// Failure outcomes of entity resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The raw value is not a valid identifier for this entity type.
    #[error("'{raw}' is not a valid {expected} identifier for {entity}")]
    InvalidIdentifier {
        entity: String,
        raw: String,
        expected: String,
    },

    /// No record has this identifier.
    #[error("{entity} with id '{id}' not found")]
    NotFound { entity: String, id: String },

    /// The lookup itself failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Loads entities addressed by route parameters.
#[derive(Debug, Clone)]
pub struct EntityResolver {
    catalog: Arc<EntityCatalog>,
    store: Arc<dyn Persistence>,
}

impl EntityResolver {
    pub fn new(catalog: Arc<EntityCatalog>, store: Arc<dyn Persistence>) -> Self {
        Self { catalog, store }
    }

    /// Resolve `raw` as the identifier of an entity of type `spec`.
    pub async fn resolve(&self, spec: &Arc<EntitySpec>, raw: &str) -> Result<Entity, ResolveError> {
        let id = spec
            .id_kind
            .parse(raw)
            .ok_or_else(|| ResolveError::InvalidIdentifier {
                entity: spec.name.clone(),
                raw: raw.to_string(),
                expected: spec.id_kind.to_string(),
            })?;

        match self.store.find_by_id(&spec.name, &id).await? {
            Some(record) => {
                tracing::debug!(entity = %spec.name, id = %id, "Entity resolved");
                Ok(Entity::from_record(
                    spec.clone(),
                    self.catalog.clone(),
                    self.store.clone(),
                    record,
                ))
            }
            None => {
                tracing::debug!(entity = %spec.name, id = %id, "Entity not found");
                Err(ResolveError::NotFound {
                    entity: spec.name.clone(),
                    id: id.to_string(),
                })
            }
        }
    }
}
