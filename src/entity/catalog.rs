//! Registry of entity types.
//!
//! # Responsibilities
//! - Hold every declared `EntitySpec` by name
//! - Check relation targets and foreign fields at startup
//!
//! # Design Decisions
//! - Built once, then shared read-only via `Arc`

use std::collections::HashMap;
use std::sync::Arc;

use crate::entity::spec::EntitySpec;
use crate::entity::CatalogError;

#[derive(Debug, Default)]
pub struct EntityCatalog {
    specs: HashMap<String, Arc<EntitySpec>>,
}

impl EntityCatalog {
    /// Build and validate a catalog from entity declarations.
    pub fn build(specs: impl IntoIterator<Item = EntitySpec>) -> Result<Self, CatalogError> {
        let mut map: HashMap<String, Arc<EntitySpec>> = HashMap::new();
        for spec in specs {
            if map.contains_key(&spec.name) {
                return Err(CatalogError::DuplicateEntity(spec.name));
            }
            map.insert(spec.name.clone(), Arc::new(spec));
        }

        for spec in map.values() {
            for relation in &spec.relations {
                let target = map.get(&relation.target).ok_or_else(|| {
                    CatalogError::UnknownRelationTarget {
                        entity: spec.name.clone(),
                        relation: relation.name.clone(),
                        target: relation.target.clone(),
                    }
                })?;
                if !target.has_attribute(&relation.foreign_field) {
                    return Err(CatalogError::UnknownForeignField {
                        entity: spec.name.clone(),
                        relation: relation.name.clone(),
                        field: relation.foreign_field.clone(),
                    });
                }
            }
        }

        tracing::debug!(entities = map.len(), "Entity catalog built");
        Ok(Self { specs: map })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<EntitySpec>> {
        self.specs.get(name)
    }

    /// Look up a spec, failing with `UnknownEntity`.
    pub fn require(&self, name: &str) -> Result<&Arc<EntitySpec>, CatalogError> {
        self.specs
            .get(name)
            .ok_or_else(|| CatalogError::UnknownEntity(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }
}
