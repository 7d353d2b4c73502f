//! Entity type declarations.

use crate::persistence::IdKind;

/// A declared to-many association, e.g. `Article.comments → Comment by "article"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    /// Target entity type.
    pub target: String,
    /// Attribute on the target holding this entity's identifier.
    pub foreign_field: String,
}

/// Declared shape of a persisted entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpec {
    pub name: String,
    pub id_kind: IdKind,
    pub attributes: Vec<String>,
    pub relations: Vec<Relation>,
}

impl EntitySpec {
    /// A new entity type with integer identifiers and no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_kind: IdKind::Integer,
            attributes: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn id(mut self, kind: IdKind) -> Self {
        self.id_kind = kind;
        self
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declare a to-many relation resolved lazily through `foreign_field`.
    pub fn has_many(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_field: impl Into<String>,
    ) -> Self {
        self.relations.push(Relation {
            name: name.into(),
            target: target.into(),
            foreign_field: foreign_field.into(),
        });
        self
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == name)
    }
}
