//! In-memory persistence backend.
//!
//! # Responsibilities
//! - Store records per entity type in a concurrent map
//! - Assign integer identifiers to unsaved records
//! - Answer lookups, foreign-key queries, and listings
//!
//! # Design Decisions
//! - One `DashMap` shard entry per entity type; no lock is held across an await
//! - Rows kept in a `BTreeMap` so listings are ordered by identifier
//! - Foreign-key matching compares JSON values for equality

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::persistence::{EntityId, Persistence, PersistenceError, PersistenceResult, Record};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<EntityId, Record>,
    /// Highest integer identifier ever stored.
    last_int: i64,
}

/// A thread-safe in-process store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<DashMap<String, Table>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records of an entity type.
    pub fn count(&self, entity: &str) -> usize {
        self.tables.get(entity).map(|t| t.rows.len()).unwrap_or(0)
    }

    /// Insert synchronously; used by seeding.
    pub fn insert(&self, record: Record) -> PersistenceResult<Record> {
        let mut table = self.tables.entry(record.entity.clone()).or_default();

        let id = match record.id.clone() {
            Some(id) => id,
            None => table.last_int.checked_add(1).map(EntityId::Int).ok_or_else(|| {
                PersistenceError::Backend(format!("{} identifier space exhausted", record.entity))
            })?,
        };
        if let EntityId::Int(n) = id {
            table.last_int = table.last_int.max(n);
        }

        let stored = Record {
            id: Some(id.clone()),
            ..record
        };
        table.rows.insert(id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl Persistence for InMemoryStore {
    async fn find_by_id(&self, entity: &str, id: &EntityId) -> PersistenceResult<Option<Record>> {
        Ok(self
            .tables
            .get(entity)
            .and_then(|table| table.rows.get(id).cloned()))
    }

    async fn query_by_foreign_key(
        &self,
        entity: &str,
        field: &str,
        value: &Value,
    ) -> PersistenceResult<Vec<Record>> {
        Ok(self
            .tables
            .get(entity)
            .map(|table| {
                table
                    .rows
                    .values()
                    .filter(|record| record.attributes.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list(&self, entity: &str) -> PersistenceResult<Vec<Record>> {
        Ok(self
            .tables
            .get(entity)
            .map(|table| table.rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn save(&self, record: Record) -> PersistenceResult<Record> {
        let stored = self.insert(record)?;
        tracing::debug!(entity = %stored.entity, id = ?stored.id, "Record saved");
        Ok(stored)
    }

    async fn delete(&self, record: &Record) -> PersistenceResult<()> {
        let id = record
            .id
            .as_ref()
            .ok_or_else(|| PersistenceError::Unsaved(record.entity.clone()))?;

        if let Some(mut table) = self.tables.get_mut(&record.entity) {
            table.rows.remove(id);
        }
        tracing::debug!(entity = %record.entity, id = %id, "Record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let store = InMemoryStore::new();
        let a = store.save(Record::new("Article").set("title", "a")).await.unwrap();
        let b = store.save(Record::new("Article").set("title", "b")).await.unwrap();
        assert_eq!(a.id, Some(EntityId::Int(1)));
        assert_eq!(b.id, Some(EntityId::Int(2)));

        // Explicit ids advance the counter.
        store.save(Record::new("Article").with_id(10_i64)).await.unwrap();
        let c = store.save(Record::new("Article")).await.unwrap();
        assert_eq!(c.id, Some(EntityId::Int(11)));
    }

    #[tokio::test]
    async fn test_exhausted_id_space_is_an_error() {
        let store = InMemoryStore::new();
        store.insert(Record::new("Article").with_id(i64::MAX)).unwrap();

        let err = store.save(Record::new("Article")).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Backend(_)));
        assert_eq!(store.count("Article"), 1);

        // Other entity types keep their own counter.
        let comment = store.save(Record::new("Comment")).await.unwrap();
        assert_eq!(comment.id, Some(EntityId::Int(1)));
    }

    #[tokio::test]
    async fn test_find_and_delete() {
        let store = InMemoryStore::new();
        let saved = store.save(Record::new("Article").set("title", "x")).await.unwrap();
        let id = saved.id.clone().unwrap();

        let found = store.find_by_id("Article", &id).await.unwrap();
        assert_eq!(found, Some(saved.clone()));

        store.delete(&saved).await.unwrap();
        assert!(store.find_by_id("Article", &id).await.unwrap().is_none());
        // Second delete is a no-op.
        store.delete(&saved).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_unsaved_record() {
        let store = InMemoryStore::new();
        let err = store.delete(&Record::new("Article")).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Unsaved(ref e) if e == "Article"));
    }

    #[tokio::test]
    async fn test_query_by_foreign_key() {
        let store = InMemoryStore::new();
        store.insert(Record::new("Comment").set("article", 1).set("body", "a")).unwrap();
        store.insert(Record::new("Comment").set("article", 2).set("body", "b")).unwrap();
        store.insert(Record::new("Comment").set("article", 1).set("body", "c")).unwrap();

        let comments = store
            .query_by_foreign_key("Comment", "article", &json!(1))
            .await
            .unwrap();
        let bodies: Vec<_> = comments.iter().map(|c| c.get("body").unwrap().clone()).collect();
        assert_eq!(bodies, vec![json!("a"), json!("c")]);

        let none = store
            .query_by_foreign_key("Missing", "article", &json!(1))
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
