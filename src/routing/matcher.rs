//! Path pattern parsing and matching.
//!
//! # Responsibilities
//! - Parse `/articles/:Article` and `/articles/{Article}` into segments
//! - Match a concrete path, binding parameter tokens to segment values
//! - Compare patterns for duplicates and overlaps at registration time
//!
//! # Design Decisions
//! - `:Name` and `{Name}` are two spellings of the same token
//! - Literal matching is case-sensitive
//! - Parameters match any non-empty segment
//! - No regex to guarantee O(n) matching

use std::fmt;

/// One segment of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// Ordered literal/parameter segments of a route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

/// Token values bound by a successful match, in path order.
pub type Bindings = Vec<(String, String)>;

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split a concrete path into segments. Query strings are ignored and
/// leading/trailing slashes trimmed; interior empty segments are kept.
pub fn split_path(path: &str) -> Vec<&str> {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

impl PathPattern {
    /// Parse a pattern string. The error is a human-readable reason.
    pub fn parse(pattern: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        for raw in split_path(pattern) {
            let token = if let Some(name) = raw.strip_prefix(':') {
                Some(name)
            } else if let Some(inner) = raw.strip_prefix('{') {
                Some(
                    inner
                        .strip_suffix('}')
                        .ok_or_else(|| format!("unclosed '{{' in segment '{}'", raw))?,
                )
            } else {
                None
            };

            let segment = match token {
                Some(name) => {
                    if name.is_empty() || !name.chars().all(is_token_char) {
                        return Err(format!("invalid parameter token '{}'", raw));
                    }
                    if segments
                        .iter()
                        .any(|s| matches!(s, Segment::Param(existing) if existing == name))
                    {
                        return Err(format!("parameter token '{}' appears twice", name));
                    }
                    Segment::Param(name.to_string())
                }
                None => {
                    if raw.is_empty() {
                        return Err("empty path segment".to_string());
                    }
                    if raw.contains(['{', '}']) {
                        return Err(format!("malformed segment '{}'", raw));
                    }
                    Segment::Literal(raw.to_string())
                }
            };
            segments.push(segment);
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Parameter token names in path order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn has_token(&self, token: &str) -> bool {
        self.tokens().any(|t| t == token)
    }

    /// Number of literal segments before the first parameter.
    pub fn literal_prefix(&self) -> usize {
        self.segments
            .iter()
            .take_while(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Same literal/parameter layout, ignoring token names.
    pub fn same_shape(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    _ => false,
                })
    }

    /// True if some concrete path matches both patterns.
    pub fn overlaps(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    _ => true,
                })
    }

    /// Match pre-split path segments, returning token bindings.
    pub fn match_segments(&self, parts: &[&str]) -> Option<Bindings> {
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut bindings = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(expected) if expected == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if part.is_empty() => return None,
                Segment::Param(name) => bindings.push((name.clone(), (*part).to_string())),
            }
        }
        Some(bindings)
    }

    /// Join a base path and a sub-path into one pattern string.
    pub fn join(base: &str, sub: &str) -> String {
        let base = base.trim_matches('/');
        let sub = sub.trim_matches('/');
        match (base.is_empty(), sub.is_empty()) {
            (true, true) => "/".to_string(),
            (false, true) => format!("/{}", base),
            (true, false) => format!("/{}", sub),
            (false, false) => format!("/{}/{}", base, sub),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => write!(f, "/{}", s)?,
                Segment::Param(name) => write!(f, "/:{}", name)?,
            }
        }
        Ok(())
    }
}
