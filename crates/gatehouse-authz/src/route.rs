//! Route normalization and pattern matching.
//!
//! # Purpose
//! Turns incoming request paths and stored permission routes into one
//! canonical form and decides whether a stored route grants a request path.
//!
//! # Matching algorithm
//! 1. Both sides are normalized: query and fragment removed, empty segments
//!    dropped, no trailing slash (root stays `/`).
//! 2. Equal normalized strings match.
//! 3. Otherwise, if the stored route is a pattern, it is compiled into a
//!    [`RoutePattern`] and compared segment by segment with keyMatch2
//!    semantics: `:param` matches exactly one segment, a final `*` segment
//!    matches any suffix below its prefix.
//!
//! # Common pitfalls
//! - Segments are compared verbatim. No part of a route is ever interpreted
//!   as a regular expression, so `.` or `(` in a stored route only matches
//!   itself.
//! - [`validate_route`] only admits `*` as the whole last segment; a stored
//!   route with `*` elsewhere (written before validation tightened) is
//!   compared literally.
use crate::{AuthzError, AuthzResult};

/// Canonicalize a route or request path.
pub fn normalize_route(raw: &str) -> String {
    let path = raw
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::with_capacity(path.len() + 1);
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    out
}

fn literal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~' | '!' | '&' | '\'' | '+' | ',' | ';' | '=' | '@' | '%')
}

fn param_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate a route supplied by an administrator and return its canonical form.
///
/// Every segment is a literal of URL-safe characters, a `:name` parameter,
/// or `*` as the final segment.
pub fn validate_route(raw: &str) -> AuthzResult<String> {
    let invalid = || AuthzError::InvalidRoute(raw.to_string());
    let trimmed = raw.trim();
    if !trimmed.starts_with('/') || trimmed.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    if trimmed.contains(['?', '#']) {
        return Err(invalid());
    }
    let route = normalize_route(trimmed);
    let segments: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
    let last = segments.len().saturating_sub(1);
    for (index, segment) in segments.iter().enumerate() {
        let ok = if *segment == "*" {
            index == last
        } else if let Some(name) = segment.strip_prefix(':') {
            param_name(name)
        } else {
            segment.chars().all(literal_char)
        };
        if !ok {
            return Err(invalid());
        }
    }
    Ok(route)
}

pub fn is_pattern(route: &str) -> bool {
    route.contains('*') || route.split('/').any(|segment| segment.starts_with(':'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

/// A stored route compiled once for repeated matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    segments: Vec<Segment>,
    any_suffix: bool,
}

impl RoutePattern {
    pub fn compile(route: &str) -> Self {
        let route = normalize_route(route);
        let mut raw: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
        let any_suffix = raw.last() == Some(&"*");
        if any_suffix {
            raw.pop();
        }
        let segments = raw
            .into_iter()
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param,
                _ => Segment::Literal(segment.to_string()),
            })
            .collect();
        Self {
            segments,
            any_suffix,
        }
    }

    /// Match an already normalized request route.
    pub fn matches(&self, route: &str) -> bool {
        let mut actual = route.split('/').filter(|s| !s.is_empty());
        for expected in &self.segments {
            match (expected, actual.next()) {
                (_, None) => return false,
                (Segment::Param, Some(_)) => {}
                (Segment::Literal(literal), Some(segment)) => {
                    if literal != segment {
                        return false;
                    }
                }
            }
        }
        if self.any_suffix {
            // `/*` alone covers the root too.
            self.segments.is_empty() || actual.next().is_some()
        } else {
            actual.next().is_none()
        }
    }
}

/// Whether the stored `pattern` grants the request `route`.
pub fn route_matches(pattern: &str, route: &str) -> bool {
    let pattern = normalize_route(pattern);
    let route = normalize_route(route);
    if pattern == route {
        return true;
    }
    is_pattern(&pattern) && RoutePattern::compile(&pattern).matches(&route)
}
