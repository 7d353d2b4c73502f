//! Form schema declarations.

use std::collections::HashSet;

use serde_json::Value;

use crate::forms::coercion::{coerce, FieldType};
use crate::forms::FormError;
use crate::validation::{BoundRule, RuleEngine, RuleRef};

/// A field as declared, before its rules are bound.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    ty: FieldType,
    default: Option<Value>,
    rules: Vec<RuleRef>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            rules: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// Append a rule. Rules run in declaration order.
    pub fn rule(mut self, rule: RuleRef) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = RuleRef>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Value used when the payload omits the field.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A field with its rules bound. Immutable once the form is built.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub ty: FieldType,
    pub default: Option<Value>,
    pub rules: Vec<BoundRule>,
}

impl FieldSpec {
    /// Default value if declared, otherwise empty.
    pub fn empty_value(&self) -> Value {
        self.default.clone().unwrap_or(Value::Null)
    }
}

/// Declared field/rule schema for a request body type.
#[derive(Debug, Clone)]
pub struct FormSpec {
    name: String,
    fields: Vec<FieldSpec>,
}

impl FormSpec {
    pub fn builder(name: impl Into<String>) -> FormSpecBuilder {
        FormSpecBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Collects field declarations; `build` binds them against a `RuleEngine`.
#[derive(Debug, Clone)]
pub struct FormSpecBuilder {
    name: String,
    fields: Vec<Field>,
}

impl FormSpecBuilder {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Bind every rule and validate every default.
    ///
    /// Fails on the first unknown rule, bad rule argument, duplicate field,
    /// or default that does not fit its field type.
    pub fn build(self, engine: &RuleEngine) -> Result<FormSpec, FormError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());

        for field in self.fields {
            if !seen.insert(field.name.clone()) {
                return Err(FormError::DuplicateField {
                    form: self.name,
                    field: field.name,
                });
            }

            let default = match field.default {
                None | Some(Value::Null) => None,
                Some(value) => match coerce(&value, &field.ty) {
                    Some(coerced) => Some(coerced),
                    None => {
                        return Err(FormError::InvalidDefault {
                            form: self.name,
                            field: field.name,
                            expected: field.ty.to_string(),
                        })
                    }
                },
            };

            let mut rules = Vec::with_capacity(field.rules.len());
            for rule_ref in &field.rules {
                let bound = engine.bind(rule_ref).map_err(|source| FormError::Rule {
                    form: self.name.clone(),
                    field: field.name.clone(),
                    source,
                })?;
                rules.push(bound);
            }

            fields.push(FieldSpec {
                name: field.name,
                ty: field.ty,
                default,
                rules,
            });
        }

        tracing::debug!(form = %self.name, fields = fields.len(), "Built form spec");
        Ok(FormSpec {
            name: self.name,
            fields,
        })
    }
}
