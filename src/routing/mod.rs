//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at bootstrap):
//!     Controller declarations
//!     → matcher.rs (parse `:Name` / `{Name}` patterns)
//!     → router.rs (duplicate + ambiguity checks, sort by literal prefix)
//!     → Freeze as immutable RouteTable
//!
//! Incoming Request (verb, path):
//!     → router.rs (per-verb lookup)
//!     → matcher.rs (segment comparison, token binding)
//!     → Return: RouteMatch or None
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - Overlapping routes must differ in literal-prefix length

pub mod matcher;
pub mod router;

use thiserror::Error;

pub use matcher::{PathPattern, Segment};
pub use router::{ParamSpec, RouteMatch, RouteSpec, RouteTable, Verb};

/// Route registration faults. All are configuration errors raised at bootstrap.
#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("{verb} {pattern} is already registered by {existing}")]
    DuplicateRoute {
        verb: Verb,
        pattern: String,
        existing: String,
    },

    #[error("{verb} {first} and {verb} {second} can match the same path")]
    AmbiguousRoute {
        verb: Verb,
        first: String,
        second: String,
    },

    #[error("route {route} ({pattern}) declares a parameter for missing token '{token}'")]
    UnboundToken {
        route: String,
        pattern: String,
        token: String,
    },
}
