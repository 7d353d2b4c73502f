//! Persistence collaborator interface.
//!
//! # Data Flow
//! ```text
//! Entity Resolver ── find_by_id ──────────────┐
//! Entity relations ── query_by_foreign_key ───┤
//! Handlers ── list / save / delete ───────────┼──▶ dyn Persistence
//!                                             │       (memory.rs, or an external backend)
//! Startup ── seed.rs (load JSON fixtures) ────┘
//! ```
//!
//! # Design Decisions
//! - The pipeline only reads; writes are issued by handler code
//! - Records are plain JSON attribute maps, typing lives in EntitySpec
//! - Backend failures surface as `PersistenceError` and are never retried here

pub mod memory;
pub mod record;
pub mod seed;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use memory::InMemoryStore;
pub use record::{EntityId, IdKind, Record};

/// Errors raised by a persistence backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Operation needs an identifier the record does not have yet.
    #[error("{0} record has no identifier")]
    Unsaved(String),

    /// Storage backend failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// Seed data could not be loaded.
    #[error("seed error: {0}")]
    Seed(String),
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Storage capabilities consumed by the pipeline and by handlers.
#[async_trait]
pub trait Persistence: Send + Sync + std::fmt::Debug {
    /// Single-record lookup by primary identifier.
    async fn find_by_id(&self, entity: &str, id: &EntityId) -> PersistenceResult<Option<Record>>;

    /// All records of `entity` whose `field` equals `value`.
    async fn query_by_foreign_key(
        &self,
        entity: &str,
        field: &str,
        value: &Value,
    ) -> PersistenceResult<Vec<Record>>;

    /// Every record of an entity type, ordered by identifier.
    async fn list(&self, entity: &str) -> PersistenceResult<Vec<Record>>;

    /// Insert or replace. Returns the stored record with its identifier assigned.
    async fn save(&self, record: Record) -> PersistenceResult<Record>;

    /// Remove a record. Removing an already-missing record is not an error.
    async fn delete(&self, record: &Record) -> PersistenceResult<()>;
}
