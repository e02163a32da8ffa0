//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every path pattern against the pattern rules
//! - Check referential integrity (proxy targets reference existing backends)
//! - Detect match-all behaviors that shadow later entries
//! - Require exactly one primary backend
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PolicyConfig → Result<(), Vec<ValidationError>>
//! - Runs before any pattern is compiled or any tree is built

use std::collections::HashMap;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::endpoint::Endpoint;
use crate::config::schema::{BackendConfig, BehaviorConfig, CookieDirective, PolicyConfig};
use crate::policy::model::cookie_carrier;
use crate::routing::matcher::{self, PatternViolation};

/// Why a configuration was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationErrorKind {
    #[error("invalid path pattern: {0}")]
    InvalidPattern(PatternViolation),

    #[error("proxy target '{0}' is not a configured backend")]
    UnresolvedProxyTarget(String),

    #[error("match-all behavior at position {index} shadows every later behavior")]
    MisplacedWildcardBehavior { index: usize },

    #[error("default behavior must not declare path patterns")]
    PatternedDefaultBehavior,

    #[error("no backend is flagged primary")]
    NoDefaultBackend,

    #[error("more than one backend is flagged primary: {0:?}")]
    MultiplePrimaryBackends(Vec<String>),

    #[error("'{0}' cannot be used as an HTTP header name")]
    InvalidHeaderName(String),

    #[error("cookies '{first}' and '{second}' share the carrier header '{carrier}'")]
    DuplicateCookieCarrier {
        first: String,
        second: String,
        carrier: String,
    },

    #[error("invalid {field} URL '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: url::ParseError,
    },
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Offending backend, `None` for configuration-wide errors.
    pub backend: Option<String>,
    /// Offending pattern, when the error concerns one.
    pub pattern: Option<String>,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub(crate) fn backend(id: &str, kind: ValidationErrorKind) -> Self {
        Self {
            backend: Some(id.to_string()),
            pattern: None,
            kind,
        }
    }

    pub(crate) fn global(kind: ValidationErrorKind) -> Self {
        Self {
            backend: None,
            pattern: None,
            kind,
        }
    }

    pub(crate) fn invalid_pattern(id: &str, pattern: &str, violation: PatternViolation) -> Self {
        Self {
            backend: Some(id.to_string()),
            pattern: Some(pattern.to_string()),
            kind: ValidationErrorKind::InvalidPattern(violation),
        }
    }
}

/// Parse a backend URL field, reporting failures against the backend.
pub(crate) fn parse_endpoint(
    id: &str,
    field: &'static str,
    value: &str,
) -> Result<Endpoint, ValidationError> {
    Endpoint::parse(value).map_err(|reason| {
        ValidationError::backend(
            id,
            ValidationErrorKind::InvalidUrl {
                field,
                value: value.to_string(),
                reason,
            },
        )
    })
}

/// Position of a proxy target in declared backend order.
pub(crate) fn proxy_index(
    config: &PolicyConfig,
    id: &str,
    target: &str,
) -> Result<usize, ValidationError> {
    config.backends.get_index_of(target).ok_or_else(|| {
        ValidationError::backend(
            id,
            ValidationErrorKind::UnresolvedProxyTarget(target.to_string()),
        )
    })
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(backend) = &self.backend {
            write!(f, "backend '{}': ", backend)?;
        }
        write!(f, "{}", self.kind)?;
        if let Some(pattern) = &self.pattern {
            write!(f, " (pattern '{}')", pattern)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &PolicyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (id, backend) in &config.backends {
        validate_backend(config, id, backend, &mut errors);
    }

    let primaries: Vec<String> = config
        .backends
        .iter()
        .filter(|(_, b)| b.primary)
        .map(|(id, _)| id.clone())
        .collect();
    match primaries.len() {
        0 => errors.push(ValidationError::global(ValidationErrorKind::NoDefaultBackend)),
        1 => {}
        _ => errors.push(ValidationError::global(
            ValidationErrorKind::MultiplePrimaryBackends(primaries),
        )),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_backend(
    config: &PolicyConfig,
    id: &str,
    backend: &BackendConfig,
    errors: &mut Vec<ValidationError>,
) {
    if let Err(e) = parse_endpoint(id, "origin", &backend.origin) {
        errors.push(e);
    }
    if let Some(Err(e)) = backend.log.as_deref().map(|log| parse_endpoint(id, "log", log)) {
        errors.push(e);
    }

    let last = backend.behaviors.len().saturating_sub(1);
    for (index, behavior) in backend.behaviors.iter().enumerate() {
        if behavior.path.is_none() && index < last {
            errors.push(ValidationError::backend(
                id,
                ValidationErrorKind::MisplacedWildcardBehavior { index },
            ));
        }
        validate_behavior(config, id, behavior, errors);
    }

    if let Some(path) = &backend.default.path {
        errors.push(ValidationError {
            backend: Some(id.to_string()),
            pattern: path.patterns().first().cloned(),
            kind: ValidationErrorKind::PatternedDefaultBehavior,
        });
    }
    validate_behavior(config, id, &backend.default, errors);
}

fn validate_behavior(
    config: &PolicyConfig,
    id: &str,
    behavior: &BehaviorConfig,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(path) = &behavior.path {
        for pattern in path.patterns() {
            if let Err(violation) = matcher::check(pattern) {
                errors.push(ValidationError::invalid_pattern(id, pattern, violation));
            }
        }
    }

    if let Some(Err(e)) = behavior.proxy.as_deref().map(|target| proxy_index(config, id, target)) {
        errors.push(e);
    }

    for header in &behavior.headers {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::backend(
                id,
                ValidationErrorKind::InvalidHeaderName(header.clone()),
            ));
        }
    }
    if let CookieDirective::Names(names) = &behavior.cookies {
        // Header names ignore case, so carriers are compared lowercased.
        let mut carriers: HashMap<String, &str> = HashMap::new();
        for name in names {
            let carrier = cookie_carrier(name);
            if name.is_empty() || HeaderName::from_bytes(carrier.as_bytes()).is_err() {
                errors.push(ValidationError::backend(
                    id,
                    ValidationErrorKind::InvalidHeaderName(name.clone()),
                ));
                continue;
            }
            match carriers.get(&carrier.to_ascii_lowercase()) {
                Some(&first) if first != name.as_str() => errors.push(ValidationError::backend(
                    id,
                    ValidationErrorKind::DuplicateCookieCarrier {
                        first: first.to_string(),
                        second: name.clone(),
                        carrier,
                    },
                )),
                Some(_) => {}
                None => {
                    carriers.insert(carrier.to_ascii_lowercase(), name);
                }
            }
        }
    }
}
