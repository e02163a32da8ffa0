//! Validated, immutable configuration.
//!
//! `compile_configuration` is the only way to obtain a [`Configuration`]:
//! it validates the raw input, compiles every path pattern, normalizes every
//! cache policy and freezes the result. Nothing in here changes afterwards.

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::endpoint::Endpoint;
use crate::config::schema::{BackendConfig, BehaviorConfig, PolicyConfig, TlsCertConfig};
use crate::config::validation::{
    parse_endpoint, proxy_index, validate_config, ValidationError, ValidationErrorKind,
};
use crate::policy::{CachePolicy, CookiePolicy};
use crate::routing::matcher::{self, HostMatcher, Matcher, PathMatcher};

/// Reference to the backend that handles a proxied behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyTarget {
    pub id: String,
    /// Position of the target in the configuration.
    #[serde(skip)]
    pub(crate) index: usize,
}

/// A compiled behavior: matchers plus normalized policy.
#[derive(Debug, Clone, Serialize)]
pub struct Behavior {
    patterns: Option<Vec<PathMatcher>>,
    policy: CachePolicy,
    proxy: Option<ProxyTarget>,
}

impl Behavior {
    /// Compiled patterns; `None` matches every path.
    pub fn patterns(&self) -> Option<&[PathMatcher]> {
        self.patterns.as_deref()
    }

    pub fn is_match_all(&self) -> bool {
        self.patterns.is_none()
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn proxy_target(&self) -> Option<&ProxyTarget> {
        self.proxy.as_ref()
    }

    /// True if any pattern matches the path, or the behavior is match-all.
    pub fn matches(&self, path: &str) -> bool {
        match &self.patterns {
            None => true,
            Some(patterns) => patterns.iter().any(|p| p.matches(path)),
        }
    }
}

/// A compiled backend.
#[derive(Debug, Clone)]
pub struct Backend {
    id: String,
    origin: Endpoint,
    aliases: Vec<HostMatcher>,
    behaviors: Vec<Behavior>,
    default: Behavior,
    primary: bool,
    tls_cert: Option<TlsCertConfig>,
    log: Option<Endpoint>,
}

impl Backend {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn origin(&self) -> &Endpoint {
        &self.origin
    }

    pub fn aliases(&self) -> &[HostMatcher] {
        &self.aliases
    }

    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    pub fn default_behavior(&self) -> &Behavior {
        &self.default
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn tls_cert(&self) -> Option<&TlsCertConfig> {
        self.tls_cert.as_ref()
    }

    pub fn log_target(&self) -> Option<&Endpoint> {
        self.log.as_ref()
    }

    /// True if any alias matches the request host.
    pub fn matches_host(&self, host: &str) -> bool {
        self.aliases.iter().any(|a| a.matches(host))
    }

    /// Host presented to this backend when another backend proxies to it.
    pub fn proxy_host(&self) -> &str {
        self.aliases
            .first()
            .map(HostMatcher::alias)
            .unwrap_or(self.origin.host.as_str())
    }
}

/// Behaviors of a backend in declared order, as first-match engines consume them.
pub fn behavior_order(backend: &Backend) -> &[Behavior] {
    &backend.behaviors
}

/// Validated configuration, immutable once built.
#[derive(Debug, Clone)]
pub struct Configuration {
    backends: IndexMap<String, Backend>,
    primary: usize,
}

impl Configuration {
    /// Backends in declared order.
    pub fn backends(&self) -> impl Iterator<Item = &Backend> {
        self.backends.values()
    }

    pub fn backend(&self, id: &str) -> Option<&Backend> {
        self.backends.get(id)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Fallback backend for hosts matching no alias.
    pub fn primary(&self) -> &Backend {
        &self.backends[self.primary]
    }

    pub(crate) fn backend_at(&self, index: usize) -> &Backend {
        &self.backends[index]
    }
}

/// Validate and compile a raw configuration.
///
/// Either every backend compiles or the full list of errors is returned.
pub fn compile_configuration(raw: &PolicyConfig) -> Result<Configuration, Vec<ValidationError>> {
    validate_config(raw)?;

    // Validation has accepted every pattern, URL and proxy target, so the
    // remaining fallible steps only surface the same errors again.
    let mut backends = IndexMap::with_capacity(raw.backends.len());
    for (id, backend) in &raw.backends {
        let compiled = compile_backend(raw, id, backend).map_err(|e| vec![e])?;
        tracing::debug!(
            backend = %id,
            behaviors = compiled.behaviors.len(),
            aliases = compiled.aliases.len(),
            "Compiled backend"
        );
        backends.insert(id.clone(), compiled);
    }

    let primary = backends
        .values()
        .position(Backend::is_primary)
        .ok_or_else(|| vec![ValidationError::global(ValidationErrorKind::NoDefaultBackend)])?;

    tracing::info!(backends = backends.len(), "Configuration compiled");
    Ok(Configuration { backends, primary })
}

fn compile_backend(
    raw: &PolicyConfig,
    id: &str,
    backend: &BackendConfig,
) -> Result<Backend, ValidationError> {
    let origin = parse_endpoint(id, "origin", &backend.origin)?;
    let log = backend
        .log
        .as_deref()
        .map(|log| parse_endpoint(id, "log", log))
        .transpose()?;

    let behaviors = backend
        .behaviors
        .iter()
        .map(|behavior| compile_behavior(raw, id, behavior))
        .collect::<Result<Vec<_>, _>>()?;
    let default = compile_behavior(raw, id, &backend.default)?;

    if behaviors.last().is_some_and(Behavior::is_match_all) {
        tracing::warn!(backend = %id, "Trailing match-all behavior shadows the default behavior");
    }

    Ok(Backend {
        id: id.to_string(),
        origin,
        aliases: backend.aliases.iter().map(HostMatcher::new).collect(),
        behaviors,
        default,
        primary: backend.primary,
        tls_cert: backend.tls_cert.clone(),
        log,
    })
}

fn compile_behavior(
    raw: &PolicyConfig,
    id: &str,
    behavior: &BehaviorConfig,
) -> Result<Behavior, ValidationError> {
    let patterns = match &behavior.path {
        None => None,
        Some(path) => {
            if path.patterns().is_empty() {
                tracing::warn!(backend = %id, "Behavior with an empty pattern list never matches");
            }
            let compiled = path
                .patterns()
                .iter()
                .map(|pattern| {
                    matcher::compile(pattern)
                        .map_err(|e| ValidationError::invalid_pattern(id, &e.pattern, e.violation))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Some(compiled)
        }
    };

    let proxy = match &behavior.proxy {
        None => None,
        Some(target) => Some(ProxyTarget {
            id: target.clone(),
            index: proxy_index(raw, id, target)?,
        }),
    };

    Ok(Behavior {
        patterns,
        policy: CachePolicy::new(&behavior.headers, CookiePolicy::from(&behavior.cookies)),
        proxy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::CookieDirective;

    fn config() -> PolicyConfig {
        let mut dashboard = BackendConfig::new("https://example.com");
        dashboard.aliases = vec!["Dashboard-Host".into()];
        dashboard.primary = true;
        dashboard.behaviors = vec![
            BehaviorConfig::matching(["/hello*", "/world*"])
                .with_cookies(CookieDirective::names(["session"])),
            BehaviorConfig::matching(["/s3_asset/*"]).with_proxy("s3_proxy"),
        ];

        let s3 = BackendConfig::new("example.s3.amazonaws.com/prefix");

        let mut config = PolicyConfig::default();
        config.backends.insert("dashboard".into(), dashboard);
        config.backends.insert("s3_proxy".into(), s3);
        config
    }

    #[test]
    fn test_compile_preserves_order_and_structure() {
        let compiled = compile_configuration(&config()).unwrap();
        let ids: Vec<_> = compiled.backends().map(Backend::id).collect();
        assert_eq!(ids, ["dashboard", "s3_proxy"]);
        assert_eq!(compiled.primary().id(), "dashboard");

        let dashboard = compiled.backend("dashboard").unwrap();
        let order = behavior_order(dashboard);
        assert_eq!(order.len(), 2);
        let first: Vec<_> = order[0].patterns().unwrap().iter().map(PathMatcher::pattern).collect();
        assert_eq!(first, ["/hello*", "/world*"]);
        assert_eq!(order[1].proxy_target().map(|t| t.id.as_str()), Some("s3_proxy"));
        assert!(dashboard.default_behavior().is_match_all());
    }

    #[test]
    fn test_proxy_target_index_points_at_target() {
        let compiled = compile_configuration(&config()).unwrap();
        let target = compiled.backend("dashboard").unwrap().behaviors()[1]
            .proxy_target()
            .unwrap();
        assert_eq!(compiled.backend_at(target.index).id(), "s3_proxy");
    }

    #[test]
    fn test_proxy_host_falls_back_to_origin_host() {
        let compiled = compile_configuration(&config()).unwrap();
        assert_eq!(compiled.backend("dashboard").unwrap().proxy_host(), "dashboard-host");
        assert_eq!(
            compiled.backend("s3_proxy").unwrap().proxy_host(),
            "example.s3.amazonaws.com"
        );
    }

    #[test]
    fn test_behavior_matching() {
        let compiled = compile_configuration(&config()).unwrap();
        let hello = &compiled.backend("dashboard").unwrap().behaviors()[0];
        assert!(hello.matches("/hello-world"));
        assert!(hello.matches("/world"));
        assert!(!hello.matches("/other"));
    }

    #[test]
    fn test_compile_rejects_whole_configuration() {
        let mut raw = config();
        raw.backends["s3_proxy"]
            .behaviors
            .push(BehaviorConfig::matching(["ab*"]));
        let errors = compile_configuration(&raw).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].backend.as_deref(), Some("s3_proxy"));
    }

    #[test]
    fn test_configuration_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Configuration>();
    }
}
