//! Configuration schema definitions.
//!
//! This module defines the raw configuration structure as read from disk.
//! All types derive Serde traits for deserialization from config files.
//! Nothing here is validated; see `validation.rs` and `compiled.rs`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::policy::CookiePolicy;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PolicyConfig {
    /// Observability settings for the CLI.
    pub observability: ObservabilityConfig,

    /// Backends keyed by id, in declaration order.
    pub backends: IndexMap<String, BackendConfig>,
}

/// A named upstream origin plus its caching policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BackendConfig {
    /// Origin URL; the scheme is optional (e.g. "example.s3.amazonaws.com/prefix").
    pub origin: String,

    /// Hostnames served by this backend, in priority order.
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Fallback backend for hosts matching no alias.
    #[serde(default)]
    pub primary: bool,

    /// Viewer certificate reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_cert: Option<TlsCertConfig>,

    /// Access log target URL (bucket host + prefix path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,

    /// Path-scoped behaviors; first match wins.
    #[serde(default)]
    pub behaviors: Vec<BehaviorConfig>,

    /// Behavior used when no path-scoped behavior matches.
    pub default: BehaviorConfig,
}

impl BackendConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            aliases: Vec::new(),
            primary: false,
            tls_cert: None,
            log: None,
            behaviors: Vec::new(),
            default: BehaviorConfig::default(),
        }
    }
}

/// A path-scoped bundle of forwarding and caching rules.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Path patterns; absent means match-all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathDirective>,

    /// Request headers to forward and fold into the cache key.
    pub headers: Vec<String>,

    pub cookies: CookieDirective,

    /// Backend id whose default behavior handles matching requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

impl BehaviorConfig {
    /// A behavior scoped to the given patterns.
    pub fn matching<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: Some(PathDirective::Many(
                patterns.into_iter().map(Into::into).collect(),
            )),
            ..Self::default()
        }
    }

    pub fn with_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cookies(mut self, cookies: CookieDirective) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_proxy(mut self, backend: impl Into<String>) -> Self {
        self.proxy = Some(backend.into());
        self
    }
}

/// One pattern or a list of patterns.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum PathDirective {
    One(String),
    Many(Vec<String>),
}

impl PathDirective {
    pub fn patterns(&self) -> &[String] {
        match self {
            PathDirective::One(p) => std::slice::from_ref(p),
            PathDirective::Many(ps) => ps,
        }
    }
}

/// `"all"`, `"none"` or a list of cookie names.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CookieDirective {
    Keyword(CookieKeyword),
    Names(Vec<String>),
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CookieKeyword {
    All,
    None,
}

impl Default for CookieDirective {
    fn default() -> Self {
        CookieDirective::Keyword(CookieKeyword::None)
    }
}

impl CookieDirective {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CookieDirective::Names(names.into_iter().map(Into::into).collect())
    }
}

impl From<&CookieDirective> for CookiePolicy {
    fn from(directive: &CookieDirective) -> Self {
        match directive {
            CookieDirective::Keyword(CookieKeyword::All) => CookiePolicy::All,
            CookieDirective::Keyword(CookieKeyword::None) => CookiePolicy::None,
            CookieDirective::Names(names) => CookiePolicy::Allow(names.clone()),
        }
    }
}

/// Viewer certificate for a distribution.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TlsCertConfig {
    /// Certificate ARN.
    pub certificate_arn: String,

    #[serde(default = "default_ssl_support_method")]
    pub ssl_support_method: String,

    #[serde(default = "default_minimum_protocol_version")]
    pub minimum_protocol_version: String,
}

fn default_ssl_support_method() -> String {
    "sni-only".to_string()
}

fn default_minimum_protocol_version() -> String {
    "TLSv1.2_2021".to_string()
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
