//! Path pattern and host matching.
//!
//! # Responsibilities
//! - Validate CDN-style path patterns (length, charset, wildcard position)
//! - Compile valid patterns into anchored, portable match expressions
//! - Match request hosts against backend aliases
//!
//! # Design Decisions
//! - Invalid patterns fail at compile time, never at match time
//! - The portable expression is what renderers embed; the executable regex is
//!   built from the same segments and is only used for in-process resolution
//! - Host matching is case-insensitive and ignores the port
//! - Path matching is case-sensitive (`/*.jpg` does not match `/LOGO.JPG`)

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Maximum length of a path pattern.
pub const MAX_PATTERN_LEN: usize = 255;

/// The single wildcard marker.
pub const WILDCARD: char = '*';

/// Optional query part of a URL followed by the end-of-input anchor.
pub const END_URL_EXPRESSION: &str = r"(\?.*)?$";

/// Characters that must be escaped in the portable expression.
const ESCAPED: &[char] = &['.', '+', '$', '"'];

/// Trait for matching a request attribute against a compiled condition.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the subject matches this condition.
    fn matches(&self, subject: &str) -> bool;
}

/// The rule a rejected pattern violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternViolation {
    Empty,
    TooLong,
    IllegalCharacter(char),
    SingleCharWildcard,
    MissingLeadingSlash,
    MisplacedWildcard,
}

impl std::fmt::Display for PatternViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternViolation::Empty => write!(f, "pattern is empty"),
            PatternViolation::TooLong => {
                write!(f, "pattern exceeds {} characters", MAX_PATTERN_LEN)
            }
            PatternViolation::IllegalCharacter(c) => write!(f, "illegal character {:?}", c),
            PatternViolation::SingleCharWildcard => {
                write!(f, "1-character wildcards ('?') are not permitted")
            }
            PatternViolation::MissingLeadingSlash => write!(f, "missing leading slash"),
            PatternViolation::MisplacedWildcard => {
                write!(f, "at most one wildcard, only at the start or end of the path")
            }
        }
    }
}

/// A path pattern failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path pattern '{pattern}': {violation}")]
pub struct InvalidPatternError {
    pub pattern: String,
    pub violation: PatternViolation,
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '_' | '-' | '.' | '$' | '/' | '~' | '"' | '\'' | '@' | ':' | '+')
}

/// Check a pattern, returning the first rule it violates.
pub fn check(pattern: &str) -> Result<(), PatternViolation> {
    if pattern.is_empty() {
        return Err(PatternViolation::Empty);
    }
    if pattern.len() > MAX_PATTERN_LEN {
        return Err(PatternViolation::TooLong);
    }
    if let Some(c) = pattern
        .chars()
        .find(|&c| c != WILDCARD && !is_allowed_char(c))
    {
        return Err(if c == '?' {
            PatternViolation::SingleCharWildcard
        } else {
            PatternViolation::IllegalCharacter(c)
        });
    }

    let Some(rest) = pattern.strip_prefix('/') else {
        return Err(PatternViolation::MissingLeadingSlash);
    };

    // `/*tail`, `/head*` or an exact path.
    let body = rest
        .strip_prefix(WILDCARD)
        .or_else(|| rest.strip_suffix(WILDCARD))
        .unwrap_or(rest);
    if body.contains(WILDCARD) {
        return Err(PatternViolation::MisplacedWildcard);
    }
    Ok(())
}

/// Returns true if the pattern is a valid path pattern.
pub fn validate(pattern: &str) -> bool {
    check(pattern).is_ok()
}

/// Compile a validated pattern into a [`PathMatcher`].
pub fn compile(pattern: &str) -> Result<PathMatcher, InvalidPatternError> {
    check(pattern).map_err(|violation| InvalidPatternError {
        pattern: pattern.to_string(),
        violation,
    })?;

    // The extension form (`/*.jpg`) matches anywhere, so the slash goes.
    let body = match pattern.strip_prefix('/') {
        Some(rest) if rest.starts_with(WILDCARD) && rest.len() > 1 => rest,
        _ => pattern,
    };

    let mut expression = String::with_capacity(body.len() + 16);
    let mut executable = String::with_capacity(body.len() + 16);
    expression.push('^');
    executable.push('^');
    for (i, segment) in body.split(WILDCARD).enumerate() {
        if i > 0 {
            expression.push_str(".*");
            executable.push_str(".*");
        }
        for c in segment.chars() {
            if ESCAPED.contains(&c) {
                expression.push('\\');
            }
            expression.push(c);
        }
        executable.push_str(&regex::escape(segment));
    }
    expression.push_str(END_URL_EXPRESSION);
    executable.push_str(END_URL_EXPRESSION);

    let regex = Regex::new(&executable).map_err(|_| InvalidPatternError {
        pattern: pattern.to_string(),
        violation: PatternViolation::IllegalCharacter(WILDCARD),
    })?;

    Ok(PathMatcher {
        pattern: pattern.to_string(),
        expression,
        regex,
    })
}

/// A compiled, anchored path pattern.
#[derive(Debug, Clone, Serialize)]
pub struct PathMatcher {
    /// The pattern as written in the configuration.
    pattern: String,
    /// Portable match expression consumed by renderers.
    expression: String,
    #[serde(skip)]
    regex: Regex,
}

impl PathMatcher {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Anchored expression with the optional query suffix, e.g. `^/hello.*(\?.*)?$`.
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl PartialEq for PathMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Matches the request host against one backend alias.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HostMatcher {
    alias: String,
}

impl HostMatcher {
    /// Create a new host matcher.
    /// The alias is normalized to lowercase for case-insensitive matching.
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into().to_lowercase(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl Matcher for HostMatcher {
    /// The alias matches when it contains the normalized request host.
    fn matches(&self, host: &str) -> bool {
        let host = normalize_host(host);
        !host.is_empty() && self.alias.contains(host.as_str())
    }
}

/// Lowercase a Host header value and drop any port.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = if host.starts_with('[') {
        // IPv6 literal, keep the brackets.
        match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        }
    } else {
        match host.rsplit_once(':') {
            Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
            _ => host,
        }
    };
    without_port.to_ascii_lowercase()
}
