//! Loaded entity instances with lazily materialized relations.
//!
//! # Responsibilities
//! - Wrap a loaded `Record` together with its `EntitySpec`
//! - Populate to-many relations on first access and cache them
//! - Apply bound form values (`fill`) and persist explicitly (`save`, `delete`)
//!
//! # Design Decisions
//! - Request-scoped: instances are never shared across requests
//! - One `OnceCell` per relation, so a relation issues at most one query
//! - Only `reload_relation` discards a cached relation
//! - Serialization includes relations only once they are materialized

use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::entity::catalog::EntityCatalog;
use crate::entity::spec::EntitySpec;
use crate::entity::EntityError;
use crate::forms::FormInstance;
use crate::persistence::{EntityId, Persistence, Record};

/// A persisted domain record.
#[derive(Debug, Clone)]
pub struct Entity {
    spec: Arc<EntitySpec>,
    catalog: Arc<EntityCatalog>,
    store: Arc<dyn Persistence>,
    record: Record,
    relations: HashMap<String, OnceCell<Vec<Entity>>>,
}

impl Entity {
    pub(crate) fn from_record(
        spec: Arc<EntitySpec>,
        catalog: Arc<EntityCatalog>,
        store: Arc<dyn Persistence>,
        record: Record,
    ) -> Self {
        let relations = spec
            .relations
            .iter()
            .map(|r| (r.name.clone(), OnceCell::new()))
            .collect();
        Self {
            spec,
            catalog,
            store,
            record,
            relations,
        }
    }

    pub fn spec(&self) -> &EntitySpec {
        &self.spec
    }

    pub fn entity_type(&self) -> &str {
        &self.spec.name
    }

    pub fn id(&self) -> Option<&EntityId> {
        self.record.id.as_ref()
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.record.get(attribute)
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Set one attribute. Unknown attributes are rejected.
    pub fn set(&mut self, attribute: &str, value: impl Into<Value>) -> Result<&mut Self, EntityError> {
        if !self.spec.has_attribute(attribute) {
            return Err(EntityError::UnknownAttribute {
                entity: self.spec.name.clone(),
                attribute: attribute.to_string(),
            });
        }
        self.record
            .attributes
            .insert(attribute.to_string(), value.into());
        Ok(self)
    }

    /// Copy bound form values onto declared attributes. Form fields the entity
    /// does not declare are ignored. Nothing is persisted until `save`.
    pub fn fill(&mut self, form: &FormInstance) -> &mut Self {
        for (field, value) in form.iter() {
            if self.spec.has_attribute(field) {
                self.record.attributes.insert(field.clone(), value.clone());
            }
        }
        self
    }

    /// Persist the current state. Assigns the identifier on first save.
    pub async fn save(&mut self) -> Result<&mut Self, EntityError> {
        let stored = self.store.save(self.record.clone()).await?;
        self.record = stored;
        Ok(self)
    }

    /// Remove this entity from persistence.
    pub async fn delete(self) -> Result<(), EntityError> {
        self.store.delete(&self.record).await?;
        Ok(())
    }

    /// Whether a relation has been materialized.
    pub fn is_loaded(&self, relation: &str) -> bool {
        self.relations
            .get(relation)
            .is_some_and(|cell| cell.initialized())
    }

    /// Access a to-many relation, querying on first use only.
    pub async fn related(&self, relation: &str) -> Result<&[Entity], EntityError> {
        let cell = self
            .relations
            .get(relation)
            .ok_or_else(|| EntityError::UnknownRelation {
                entity: self.spec.name.clone(),
                relation: relation.to_string(),
            })?;

        let items = cell
            .get_or_try_init(|| self.load_relation(relation))
            .await?;
        Ok(items.as_slice())
    }

    /// Drop a cached relation so the next access queries again.
    pub fn reload_relation(&mut self, relation: &str) -> Result<(), EntityError> {
        match self.relations.get_mut(relation) {
            Some(cell) => {
                *cell = OnceCell::new();
                Ok(())
            }
            None => Err(EntityError::UnknownRelation {
                entity: self.spec.name.clone(),
                relation: relation.to_string(),
            }),
        }
    }

    async fn load_relation(&self, relation: &str) -> Result<Vec<Entity>, EntityError> {
        let declared = self
            .spec
            .relation(relation)
            .ok_or_else(|| EntityError::UnknownRelation {
                entity: self.spec.name.clone(),
                relation: relation.to_string(),
            })?;
        let id = self
            .record
            .id
            .as_ref()
            .ok_or_else(|| EntityError::Unsaved(self.spec.name.clone()))?;
        let target = self.catalog.require(&declared.target)?.clone();

        tracing::debug!(
            entity = %self.spec.name,
            id = %id,
            relation = %relation,
            "Materializing relation"
        );

        let records = self
            .store
            .query_by_foreign_key(&target.name, &declared.foreign_field, &id.to_value())
            .await?;

        Ok(records
            .into_iter()
            .map(|record| {
                Entity::from_record(
                    target.clone(),
                    self.catalog.clone(),
                    self.store.clone(),
                    record,
                )
            })
            .collect())
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let loaded: Vec<(&String, &Vec<Entity>)> = self
            .spec
            .relations
            .iter()
            .filter_map(|r| {
                self.relations
                    .get(&r.name)
                    .and_then(OnceCell::get)
                    .map(|items| (&r.name, items))
            })
            .collect();

        let mut map = serializer.serialize_map(Some(1 + self.record.attributes.len() + loaded.len()))?;
        map.serialize_entry("id", &self.record.id)?;
        for (key, value) in &self.record.attributes {
            map.serialize_entry(key, value)?;
        }
        for (name, items) in loaded {
            map.serialize_entry(name, items)?;
        }
        map.end()
    }
}
