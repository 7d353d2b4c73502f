//! Payload → form binding.
//!
//! # Responsibilities
//! - Extract declared fields from a raw payload
//! - Coerce each value to its declared type
//! - Run every rule of every field and collect the failures
//!
//! # Design Decisions
//! - Non-object payloads bind as if every field were absent
//! - A coercion failure records "invalid type" and skips that field's rules
//! - Error map is ordered by field name for stable output

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::forms::coercion::coerce;
use crate::forms::spec::FormSpec;

/// Message recorded when a value cannot be coerced to the field type.
pub const INVALID_TYPE: &str = "invalid type";

/// Outcome of one bind attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationResult {
    fn from_errors(errors: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Messages recorded for a field, empty if it passed.
    pub fn field_errors(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Bound form values, one entry per declared field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormInstance {
    #[serde(skip)]
    form: String,
    #[serde(flatten)]
    values: Map<String, Value>,
}

impl FormInstance {
    pub fn form_name(&self) -> &str {
        &self.form
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.values.get(field).and_then(Value::as_i64)
    }

    /// Iterate over (field, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Convert into a typed form struct.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.values))
    }
}

/// Bind a raw payload against a form spec.
pub fn bind(spec: &FormSpec, payload: &Value) -> (FormInstance, ValidationResult) {
    let empty = Map::new();
    let object = payload.as_object().unwrap_or(&empty);

    let mut values = Map::new();
    let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for field in spec.fields() {
        let raw = match object.get(&field.name) {
            None | Some(Value::Null) => field.empty_value(),
            Some(value) => value.clone(),
        };

        let value = if raw.is_null() {
            Some(raw)
        } else {
            coerce(&raw, &field.ty)
        };

        let Some(value) = value else {
            errors
                .entry(field.name.clone())
                .or_default()
                .push(INVALID_TYPE.to_string());
            values.insert(field.name.clone(), Value::Null);
            continue;
        };

        let failures: Vec<String> = field
            .rules
            .iter()
            .filter_map(|rule| rule.check(&value).err())
            .collect();
        if !failures.is_empty() {
            errors.insert(field.name.clone(), failures);
        }

        values.insert(field.name.clone(), value);
    }

    let result = ValidationResult::from_errors(errors);
    if !result.valid {
        tracing::debug!(form = %spec.name(), failed_fields = result.errors.len(), "Form validation failed");
    }

    (
        FormInstance {
            form: spec.name().to_string(),
            values,
        },
        result,
    )
}
