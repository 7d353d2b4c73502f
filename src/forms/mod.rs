//! Form binding subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap:
//!     FormSpecBuilder (fields, types, RuleRefs, defaults)
//!     → spec.rs (bind rules through the RuleEngine, check defaults)
//!     → FormSpec (immutable, shared via Arc)
//!
//! Request time:
//!     raw JSON payload
//!     → binder.rs (extract each field by name)
//!     → coercion.rs (coerce to the declared FieldType)
//!     → BoundRule checks, every rule of every field
//!     → (FormInstance, ValidationResult)
//! ```
//!
//! # Design Decisions
//! - Absent fields take their default (or `null`); absence alone is never an error
//! - Coercion failure is a field error ("invalid type"), not a panic or early return
//! - All rules of a field run, so every violation is reported
//! - Binding is pure: persisting the bound values is the handler's job

pub mod binder;
pub mod coercion;
pub mod spec;

use thiserror::Error;

use crate::validation::RuleError;

pub use binder::{bind, FormInstance, ValidationResult};
pub use coercion::FieldType;
pub use spec::{Field, FieldSpec, FormSpec, FormSpecBuilder};

/// Errors raised while building a `FormSpec`.
#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    /// The same field name was declared twice.
    #[error("form '{form}' declares field '{field}' twice")]
    DuplicateField { form: String, field: String },

    /// A declared default does not coerce to the field type.
    #[error("form '{form}' field '{field}' has a default that is not a {expected}")]
    InvalidDefault {
        form: String,
        field: String,
        expected: String,
    },

    /// A field rule could not be bound.
    #[error("form '{form}' field '{field}': {source}")]
    Rule {
        form: String,
        field: String,
        #[source]
        source: RuleError,
    },
}
