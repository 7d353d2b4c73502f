//! Resolved handler arguments.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::dispatch::handler::HandlerError;
use crate::entity::Entity;
use crate::forms::FormInstance;

/// Scalar types a path token can be parsed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Integer,
    Float,
    Boolean,
    Text,
    Uuid,
}

impl ScalarType {
    /// Parse a raw path segment. `None` if it is not a value of this type.
    pub fn parse(self, raw: &str) -> Option<Scalar> {
        match self {
            ScalarType::Integer => raw.parse().ok().map(Scalar::Integer),
            ScalarType::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Scalar::Float),
            ScalarType::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Scalar::Boolean(true)),
                "false" | "0" => Some(Scalar::Boolean(false)),
                _ => None,
            },
            ScalarType::Text => Some(Scalar::Text(raw.to_string())),
            ScalarType::Uuid => Uuid::parse_str(raw).ok().map(Scalar::Uuid),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Integer => "integer",
            ScalarType::Float => "float",
            ScalarType::Boolean => "boolean",
            ScalarType::Text => "text",
            ScalarType::Uuid => "uuid",
        };
        f.write_str(name)
    }
}

/// A parsed primitive argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Uuid(Uuid),
}

impl Scalar {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One resolved argument.
#[derive(Debug)]
pub enum Arg {
    Primitive(Scalar),
    Form(FormInstance),
    Entity(Entity),
}

impl Arg {
    fn kind(&self) -> &'static str {
        match self {
            Arg::Primitive(_) => "primitive",
            Arg::Form(_) => "form",
            Arg::Entity(_) => "entity",
        }
    }
}

/// Handler arguments in declared parameter order.
///
/// Borrowing accessors (`entity`, `form`, `primitive`) leave the slot in
/// place; `take_*` moves the value out, after which the slot is empty.
#[derive(Debug, Default)]
pub struct Args {
    slots: Vec<Option<Arg>>,
}

fn mismatch(index: usize, expected: &'static str) -> HandlerError {
    HandlerError::Argument { index, expected }
}

impl Args {
    pub fn new(args: Vec<Arg>) -> Self {
        Self {
            slots: args.into_iter().map(Some).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Kinds of the remaining slots, `None` where a value was taken.
    pub fn kinds(&self) -> Vec<Option<&'static str>> {
        self.slots.iter().map(|s| s.as_ref().map(Arg::kind)).collect()
    }

    pub fn entity(&self, index: usize) -> Result<&Entity, HandlerError> {
        match self.slots.get(index) {
            Some(Some(Arg::Entity(e))) => Ok(e),
            _ => Err(mismatch(index, "entity")),
        }
    }

    pub fn entity_mut(&mut self, index: usize) -> Result<&mut Entity, HandlerError> {
        match self.slots.get_mut(index) {
            Some(Some(Arg::Entity(e))) => Ok(e),
            _ => Err(mismatch(index, "entity")),
        }
    }

    pub fn form(&self, index: usize) -> Result<&FormInstance, HandlerError> {
        match self.slots.get(index) {
            Some(Some(Arg::Form(f))) => Ok(f),
            _ => Err(mismatch(index, "form")),
        }
    }

    pub fn primitive(&self, index: usize) -> Result<&Scalar, HandlerError> {
        match self.slots.get(index) {
            Some(Some(Arg::Primitive(s))) => Ok(s),
            _ => Err(mismatch(index, "primitive")),
        }
    }

    pub fn take_entity(&mut self, index: usize) -> Result<Entity, HandlerError> {
        match self.take(index) {
            Some(Arg::Entity(e)) => Ok(e),
            other => self.restore(index, other, "entity"),
        }
    }

    pub fn take_form(&mut self, index: usize) -> Result<FormInstance, HandlerError> {
        match self.take(index) {
            Some(Arg::Form(f)) => Ok(f),
            other => self.restore(index, other, "form"),
        }
    }

    fn take(&mut self, index: usize) -> Option<Arg> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Put back a value taken under the wrong kind and report the mismatch.
    fn restore<T>(
        &mut self,
        index: usize,
        arg: Option<Arg>,
        expected: &'static str,
    ) -> Result<T, HandlerError> {
        if let (Some(arg), Some(slot)) = (arg, self.slots.get_mut(index)) {
            *slot = Some(arg);
        }
        Err(mismatch(index, expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{bind, Field, FormSpec};
    use crate::validation::RuleEngine;
    use serde_json::json;

    #[test]
    fn test_scalar_parsing() {
        assert_eq!(ScalarType::Integer.parse("42"), Some(Scalar::Integer(42)));
        assert_eq!(ScalarType::Integer.parse("4.2"), None);
        assert_eq!(ScalarType::Integer.parse("abc"), None);
        assert_eq!(ScalarType::Float.parse("4.5"), Some(Scalar::Float(4.5)));
        assert_eq!(ScalarType::Float.parse("NaN"), None);
        assert_eq!(ScalarType::Boolean.parse("TRUE"), Some(Scalar::Boolean(true)));
        assert_eq!(ScalarType::Boolean.parse("0"), Some(Scalar::Boolean(false)));
        assert_eq!(ScalarType::Boolean.parse("yes"), None);
        assert_eq!(ScalarType::Text.parse("hello"), Some(Scalar::Text("hello".into())));

        let id = Uuid::new_v4();
        assert_eq!(ScalarType::Uuid.parse(&id.to_string()), Some(Scalar::Uuid(id)));
        assert_eq!(ScalarType::Uuid.parse("not-a-uuid"), None);
    }

    #[test]
    fn test_accessors_check_kind() {
        let spec = FormSpec::builder("F")
            .field(Field::string("name"))
            .build(&RuleEngine::with_builtins())
            .unwrap();
        let (form, _) = bind(&spec, &json!({"name": "x"}));

        let mut args = Args::new(vec![Arg::Primitive(Scalar::Integer(3)), Arg::Form(form)]);
        assert_eq!(args.primitive(0).unwrap().as_i64(), Some(3));
        assert!(matches!(
            args.entity(0),
            Err(HandlerError::Argument { index: 0, expected: "entity" })
        ));
        assert!(args.form(5).is_err());

        // A mismatched take leaves the slot intact.
        assert!(args.take_entity(1).is_err());
        assert_eq!(args.kinds(), vec![Some("primitive"), Some("form")]);

        let form = args.take_form(1).unwrap();
        assert_eq!(form.get_str("name"), Some("x"));
        assert_eq!(args.kinds(), vec![Some("primitive"), None]);
        assert!(args.form(1).is_err());
    }
}
