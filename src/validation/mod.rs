//! Rule engine subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap:
//!     RuleRef { name, args }   (declared on a form field)
//!     → engine.rs (look up rule by name, check arguments)
//!     → BoundRule (rule + validated args, frozen into the FormSpec)
//!
//! Request time:
//!     BoundRule + coerced field value
//!     → Rule::evaluate (pure predicate)
//!     → pass, or failure message for the field
//! ```
//!
//! # Design Decisions
//! - Rules are keyed by name so forms declare them as data
//! - Unknown names and bad arguments fail at FormSpec build time, never per request
//! - Rules are stateless; the same (value, args) always gives the same answer
//! - Only `Required` reports an empty value; every other rule passes on `null`

pub mod engine;
pub mod rules;

use serde_json::Value;
use thiserror::Error;

pub use engine::{BoundRule, RuleEngine};
pub use rules::Rule;

/// Errors raised while registering or binding rules.
#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    /// No rule is registered under this name.
    #[error("unknown rule '{0}'")]
    UnknownRule(String),

    /// A rule with this name is already registered.
    #[error("rule '{0}' is already registered")]
    DuplicateRule(String),

    /// The arguments given to a rule are unusable.
    #[error("invalid arguments for rule '{rule}': {reason}")]
    InvalidRuleArguments { rule: String, reason: String },
}

/// Reference to a named rule with its arguments, as declared on a form field.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRef {
    pub name: String,
    pub args: Vec<Value>,
}

impl RuleRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }
}

pub fn required() -> RuleRef {
    RuleRef::new("Required")
}

pub fn min_length(n: usize) -> RuleRef {
    RuleRef::new("MinLength").arg(n as u64)
}

pub fn max_length(n: usize) -> RuleRef {
    RuleRef::new("MaxLength").arg(n as u64)
}

pub fn min(n: f64) -> RuleRef {
    RuleRef::new("Min").arg(n)
}

pub fn max(n: f64) -> RuleRef {
    RuleRef::new("Max").arg(n)
}

pub fn email() -> RuleRef {
    RuleRef::new("Email")
}

pub fn pattern(regex: &str) -> RuleRef {
    RuleRef::new("Pattern").arg(regex)
}

pub fn one_of<I, V>(values: I) -> RuleRef
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    RuleRef {
        name: "OneOf".to_string(),
        args: values.into_iter().map(Into::into).collect(),
    }
}
