//! Route table: registration and lookup.
//!
//! # Responsibilities
//! - Store registered routes per verb
//! - Reject duplicate and ambiguous registrations
//! - Look up the route for a (verb, path) pair and bind its tokens
//!
//! # Design Decisions
//! - Immutable after bootstrap (shared via Arc, read without locks)
//! - Routes kept sorted by literal-prefix rank, so the first match is the winner
//! - Ambiguity is a registration error; matching never has to break a tie
//! - Explicit `None` rather than a silent default route

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::dispatch::args::ScalarType;
use crate::dispatch::handler::Handler;
use crate::entity::EntitySpec;
use crate::forms::FormSpec;
use crate::routing::matcher::{split_path, Bindings, PathPattern};
use crate::routing::RouteError;

/// HTTP verbs a handler can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Patch => "PATCH",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PATCH" => Ok(Verb::Patch),
            "PUT" => Ok(Verb::Put),
            "DELETE" => Ok(Verb::Delete),
            other => Err(format!("unsupported verb '{}'", other)),
        }
    }
}

/// Resolution strategy of one handler argument.
#[derive(Debug, Clone)]
pub enum ParamSpec {
    /// Parse a path token into a scalar.
    Primitive { token: String, ty: ScalarType },
    /// Bind the request payload to a form.
    Form { form: Arc<FormSpec> },
    /// Load the entity whose identifier is in a path token.
    Entity { token: String, entity: Arc<EntitySpec> },
}

impl ParamSpec {
    /// Path token this parameter reads, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            ParamSpec::Primitive { token, .. } | ParamSpec::Entity { token, .. } => Some(token),
            ParamSpec::Form { .. } => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ParamSpec::Primitive { token, ty } => format!("{}: {}", token, ty),
            ParamSpec::Form { form } => format!("form {}", form.name()),
            ParamSpec::Entity { token, entity } => format!("{}: {}", token, entity.name),
        }
    }
}

/// A registered (verb, pattern, handler, parameters) binding.
#[derive(Clone)]
pub struct RouteSpec {
    pub verb: Verb,
    pub pattern: PathPattern,
    /// `Controller.method`, used in logs and metrics.
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub handler: Handler,
}

impl fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSpec")
            .field("verb", &self.verb)
            .field("pattern", &self.pattern.to_string())
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl RouteSpec {
    /// Check that every token-reading parameter names a token of the pattern.
    pub fn check_tokens(&self) -> Result<(), RouteError> {
        for param in &self.params {
            if let Some(token) = param.token() {
                if !self.pattern.has_token(token) {
                    return Err(RouteError::UnboundToken {
                        route: self.name.clone(),
                        pattern: self.pattern.to_string(),
                        token: token.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A matched route with its token bindings.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteSpec>,
    pub bindings: Bindings,
}

impl RouteMatch {
    /// Raw path value bound to a token.
    pub fn binding(&self, token: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(name, _)| name == token)
            .map(|(_, value)| value.as_str())
    }
}

/// Registry mapping (verb, path pattern) to handlers.
#[derive(Debug, Default)]
pub struct RouteTable {
    /// Per verb, sorted by descending literal-prefix rank.
    routes: HashMap<Verb, Vec<Arc<RouteSpec>>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route, rejecting duplicates and ambiguous overlaps.
    pub fn register(&mut self, spec: RouteSpec) -> Result<(), RouteError> {
        spec.check_tokens()?;

        let entries = self.routes.entry(spec.verb).or_default();
        for existing in entries.iter() {
            if existing.pattern.same_shape(&spec.pattern) {
                return Err(RouteError::DuplicateRoute {
                    verb: spec.verb,
                    pattern: spec.pattern.to_string(),
                    existing: existing.name.clone(),
                });
            }
            if existing.pattern.overlaps(&spec.pattern)
                && existing.pattern.literal_prefix() == spec.pattern.literal_prefix()
            {
                return Err(RouteError::AmbiguousRoute {
                    verb: spec.verb,
                    first: existing.pattern.to_string(),
                    second: spec.pattern.to_string(),
                });
            }
        }

        let rank = spec.pattern.literal_prefix();
        let position = entries
            .iter()
            .position(|r| r.pattern.literal_prefix() < rank)
            .unwrap_or(entries.len());

        tracing::debug!(
            verb = %spec.verb,
            pattern = %spec.pattern,
            route = %spec.name,
            "Registered route"
        );
        entries.insert(position, Arc::new(spec));
        Ok(())
    }

    /// Find the route for a request. Deterministic for identical input.
    pub fn match_route(&self, verb: Verb, path: &str) -> Option<RouteMatch> {
        let parts = split_path(path);
        self.routes.get(&verb)?.iter().find_map(|route| {
            route.pattern.match_segments(&parts).map(|bindings| RouteMatch {
                route: route.clone(),
                bindings,
            })
        })
    }

    /// All routes, grouped by verb, in match order.
    pub fn routes(&self) -> Vec<Arc<RouteSpec>> {
        let mut verbs: Vec<_> = self.routes.keys().copied().collect();
        verbs.sort();
        verbs
            .into_iter()
            .flat_map(|verb| self.routes[&verb].iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
