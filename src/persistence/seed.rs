//! Seed data loading for the in-memory store.
//!
//! File format: a JSON object keyed by entity type, each holding an array of
//! attribute objects. An `id` key, when present, is parsed with the entity's
//! `IdKind`; rows without one get an integer id assigned.
//!
//! ```json
//! { "Article": [ { "id": 7, "title": "Seven", "content": "..." } ] }
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::{Map, Value};

use crate::entity::EntityCatalog;
use crate::persistence::{InMemoryStore, PersistenceError, PersistenceResult, Record};

/// Load seed rows from a JSON file. Returns the number of records inserted.
pub fn load_seed_file(
    path: &Path,
    catalog: &EntityCatalog,
    store: &InMemoryStore,
) -> PersistenceResult<usize> {
    let file = File::open(path)
        .map_err(|e| PersistenceError::Seed(format!("{}: {}", path.display(), e)))?;
    let data: BTreeMap<String, Vec<Map<String, Value>>> =
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| PersistenceError::Seed(format!("{}: {}", path.display(), e)))?;

    let count = load_seed(data, catalog, store)?;
    tracing::info!(path = %path.display(), records = count, "Loaded seed data");
    Ok(count)
}

/// Insert already-parsed seed rows.
pub fn load_seed(
    data: BTreeMap<String, Vec<Map<String, Value>>>,
    catalog: &EntityCatalog,
    store: &InMemoryStore,
) -> PersistenceResult<usize> {
    let mut count = 0;
    for (entity, rows) in data {
        let spec = catalog
            .get(&entity)
            .ok_or_else(|| PersistenceError::Seed(format!("unknown entity '{}'", entity)))?;

        for mut attributes in rows {
            let id = match attributes.remove("id") {
                None | Some(Value::Null) => None,
                Some(raw) => Some(spec.id_kind.from_value(&raw).ok_or_else(|| {
                    PersistenceError::Seed(format!(
                        "{} id {} is not a valid {} identifier",
                        entity, raw, spec.id_kind
                    ))
                })?),
            };

            store.insert(Record {
                entity: entity.clone(),
                id,
                attributes,
            })?;
            count += 1;
        }
    }
    Ok(count)
}
