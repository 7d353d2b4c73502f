//! Handler-facing access to one entity type.

use std::sync::Arc;

use uuid::Uuid;

use crate::entity::catalog::EntityCatalog;
use crate::entity::instance::Entity;
use crate::entity::spec::EntitySpec;
use crate::entity::EntityError;
use crate::forms::FormInstance;
use crate::persistence::{EntityId, IdKind, Persistence, Record};

/// Query and create entities of a single type.
#[derive(Debug, Clone)]
pub struct Repository {
    spec: Arc<EntitySpec>,
    catalog: Arc<EntityCatalog>,
    store: Arc<dyn Persistence>,
}

impl Repository {
    pub fn new(
        spec: Arc<EntitySpec>,
        catalog: Arc<EntityCatalog>,
        store: Arc<dyn Persistence>,
    ) -> Self {
        Self {
            spec,
            catalog,
            store,
        }
    }

    fn wrap(&self, record: Record) -> Entity {
        Entity::from_record(
            self.spec.clone(),
            self.catalog.clone(),
            self.store.clone(),
            record,
        )
    }

    /// Every stored entity of this type.
    pub async fn all(&self) -> Result<Vec<Entity>, EntityError> {
        let records = self.store.list(&self.spec.name).await?;
        Ok(records.into_iter().map(|r| self.wrap(r)).collect())
    }

    pub async fn find(&self, id: &EntityId) -> Result<Option<Entity>, EntityError> {
        let record = self.store.find_by_id(&self.spec.name, id).await?;
        Ok(record.map(|r| self.wrap(r)))
    }

    /// A new, unsaved instance. Uuid-keyed types get their identifier here;
    /// integer identifiers are assigned by the store on save.
    pub fn build(&self) -> Entity {
        let mut record = Record::new(self.spec.name.clone());
        if self.spec.id_kind == IdKind::Uuid {
            record.id = Some(EntityId::Uuid(Uuid::new_v4()));
        }
        self.wrap(record)
    }

    /// Build from form values and save in one step.
    pub async fn create(&self, form: &FormInstance) -> Result<Entity, EntityError> {
        let mut entity = self.build();
        entity.fill(form).save().await?;
        Ok(entity)
    }
}
