//! Records and identifiers exchanged with the persistence layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Identifier representation declared by an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    Integer,
    Uuid,
    Text,
}

impl IdKind {
    /// Parse a raw path segment into an identifier of this kind.
    pub fn parse(self, raw: &str) -> Option<EntityId> {
        match self {
            IdKind::Integer => raw.parse::<i64>().ok().map(EntityId::Int),
            IdKind::Uuid => Uuid::parse_str(raw).ok().map(EntityId::Uuid),
            IdKind::Text if !raw.is_empty() => Some(EntityId::Text(raw.to_string())),
            IdKind::Text => None,
        }
    }

    /// Read an identifier out of a JSON value (seed files, foreign keys).
    pub fn from_value(self, value: &Value) -> Option<EntityId> {
        match (self, value) {
            (IdKind::Integer, Value::Number(n)) => n.as_i64().map(EntityId::Int),
            (_, Value::String(s)) => self.parse(s),
            _ => None,
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdKind::Integer => write!(f, "integer"),
            IdKind::Uuid => write!(f, "uuid"),
            IdKind::Text => write!(f, "text"),
        }
    }
}

/// Primary identifier of a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Uuid(Uuid),
    Text(String),
}

impl EntityId {
    pub fn to_value(&self) -> Value {
        match self {
            EntityId::Int(n) => Value::from(*n),
            EntityId::Uuid(u) => Value::String(u.to_string()),
            EntityId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(n) => write!(f, "{}", n),
            EntityId::Uuid(u) => write!(f, "{}", u),
            EntityId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        EntityId::Int(id)
    }
}

impl From<Uuid> for EntityId {
    fn from(id: Uuid) -> Self {
        EntityId::Uuid(id)
    }
}

/// A persisted row: entity type, identifier, and scalar attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub entity: String,
    /// `None` until the store assigns one on first save.
    pub id: Option<EntityId>,
    pub attributes: Map<String, Value>,
}

impl Record {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            id: None,
            attributes: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn set(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_by_kind() {
        assert_eq!(IdKind::Integer.parse("42"), Some(EntityId::Int(42)));
        assert_eq!(IdKind::Integer.parse("forty-two"), None);
        assert_eq!(IdKind::Text.parse("hello"), Some(EntityId::Text("hello".into())));
        assert_eq!(IdKind::Text.parse(""), None);

        let raw = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert_eq!(
            IdKind::Uuid.parse(raw),
            Some(EntityId::Uuid(Uuid::parse_str(raw).unwrap()))
        );
        assert_eq!(IdKind::Uuid.parse("7"), None);
    }

    #[test]
    fn test_from_value() {
        assert_eq!(IdKind::Integer.from_value(&json!(7)), Some(EntityId::Int(7)));
        assert_eq!(IdKind::Integer.from_value(&json!("7")), Some(EntityId::Int(7)));
        assert_eq!(IdKind::Integer.from_value(&json!(7.5)), None);
        assert_eq!(IdKind::Text.from_value(&json!(7)), None);
    }

    #[test]
    fn test_id_value_matches_foreign_key_json() {
        // Foreign keys are compared as JSON, so an integer id must equal json!(n).
        assert_eq!(EntityId::Int(7).to_value(), json!(7));
        assert_eq!(EntityId::Text("a".into()).to_value(), json!("a"));
    }
}
