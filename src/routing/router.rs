//! Policy lookup for a request.
//!
//! # Responsibilities
//! - Select the backend for a host (first alias match, else primary)
//! - Select the behavior for a path (first match, else default)
//! - Dereference one proxy hop to the target's default behavior
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) alias scan and O(n) pattern scan in declared order
//! - First match wins; never best match
//! - Never fails: a compiled configuration always yields a behavior

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::config::compiled::{Backend, Behavior, Configuration};
use crate::policy::CachePolicy;

/// The behavior governing one (host, path) pair.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedPolicy<'a> {
    /// Backend that serves the request, after any proxy hop.
    pub backend: &'a Backend,
    pub behavior: &'a Behavior,
    /// Host to present upstream when the request was proxied.
    pub host_override: Option<&'a str>,
}

impl<'a> ResolvedPolicy<'a> {
    pub fn backend_id(&self) -> &'a str {
        self.backend.id()
    }

    pub fn policy(&self) -> &'a CachePolicy {
        self.behavior.policy()
    }
}

impl PartialEq for ResolvedPolicy<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.backend.id() == other.backend.id()
            && std::ptr::eq(self.behavior, other.behavior)
            && self.host_override == other.host_override
    }
}

impl Serialize for ResolvedPolicy<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResolvedPolicy", 3)?;
        state.serialize_field("backend", self.backend.id())?;
        state.serialize_field("host_override", &self.host_override)?;
        state.serialize_field("policy", self.behavior.policy())?;
        state.end()
    }
}

/// First backend with an alias matching `host`, else the primary backend.
pub fn resolve_backend<'a>(config: &'a Configuration, host: &str) -> &'a Backend {
    config
        .backends()
        .find(|b| b.matches_host(host))
        .unwrap_or_else(|| config.primary())
}

/// First behavior matching `path`, else `default`.
pub fn resolve_path<'a>(behaviors: &'a [Behavior], default: &'a Behavior, path: &str) -> &'a Behavior {
    behaviors
        .iter()
        .find(|b| b.matches(path))
        .unwrap_or(default)
}

/// Resolve the governing policy for a request.
pub fn resolve<'a>(config: &'a Configuration, host: &str, path: &str) -> ResolvedPolicy<'a> {
    let backend = resolve_backend(config, host);
    let behavior = resolve_path(backend.behaviors(), backend.default_behavior(), path);
    dispatch(config, backend, behavior)
}

/// Apply the proxy hop of `behavior`, selected within `backend`.
///
/// Only one hop: the target's default behavior is used as-is, even if it
/// names a proxy of its own.
pub fn dispatch<'a>(
    config: &'a Configuration,
    backend: &'a Backend,
    behavior: &'a Behavior,
) -> ResolvedPolicy<'a> {
    match behavior.proxy_target() {
        Some(target) => {
            let target = config.backend_at(target.index);
            ResolvedPolicy {
                backend: target,
                behavior: target.default_behavior(),
                host_override: Some(target.proxy_host()),
            }
        }
        None => ResolvedPolicy {
            backend,
            behavior,
            host_override: None,
        },
    }
}

impl Configuration {
    /// See [`resolve`].
    pub fn resolve(&self, host: &str, path: &str) -> ResolvedPolicy<'_> {
        resolve(self, host, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compile_configuration;
    use crate::config::schema::{BackendConfig, BehaviorConfig, CookieDirective, PolicyConfig};

    fn dashboard_config() -> Configuration {
        let mut dashboard = BackendConfig::new("example.com");
        dashboard.aliases = vec!["dashboard-host".into()];
        dashboard.primary = true;
        dashboard.behaviors = vec![
            BehaviorConfig::matching(["/hello*", "/world*"]).with_headers(["Authorization"]),
            BehaviorConfig::matching(["/s3_asset/*"]).with_proxy("s3_proxy"),
        ];

        let mut s3 = BackendConfig::new("example.s3.amazonaws.com/prefix");
        s3.aliases = vec!["s3-alias.example.com".into(), "second.example.com".into()];
        s3.default = BehaviorConfig::default().with_cookies(CookieDirective::names(["token"]));

        let mut raw = PolicyConfig::default();
        raw.backends.insert("dashboard".into(), dashboard);
        raw.backends.insert("s3_proxy".into(), s3);
        compile_configuration(&raw).unwrap()
    }

    fn ordered(patterns: &[&str]) -> Configuration {
        let mut site = BackendConfig::new("example.com");
        site.primary = true;
        site.behaviors = patterns
            .iter()
            .enumerate()
            .map(|(i, p)| BehaviorConfig::matching([*p]).with_headers([format!("X-Behavior-{}", i)]))
            .collect();
        let mut raw = PolicyConfig::default();
        raw.backends.insert("site".into(), site);
        compile_configuration(&raw).unwrap()
    }

    fn tag<'a>(resolved: &ResolvedPolicy<'a>) -> &'a str {
        resolved.policy().headers().first().map(String::as_str).unwrap_or("default")
    }

    #[test]
    fn test_proxy_behavior_uses_target_default() {
        let config = dashboard_config();
        let resolved = resolve(&config, "dashboard-host", "/s3_asset/foo");
        let s3 = config.backend("s3_proxy").unwrap();

        assert_eq!(resolved.backend_id(), "s3_proxy");
        assert!(std::ptr::eq(resolved.behavior, s3.default_behavior()));
        assert_eq!(resolved.host_override, Some("s3-alias.example.com"));
        assert_eq!(resolved.policy().vary(), ["Host", "X-Cookie-token"]);
    }

    #[test]
    fn test_path_behavior_and_default() {
        let config = dashboard_config();
        let hello = resolve(&config, "dashboard-host", "/world/x?y=1");
        assert_eq!(hello.backend_id(), "dashboard");
        assert_eq!(hello.policy().headers(), ["Authorization"]);
        assert_eq!(hello.host_override, None);

        let other = resolve(&config, "dashboard-host", "/other");
        let dashboard = config.backend("dashboard").unwrap();
        assert!(std::ptr::eq(other.behavior, dashboard.default_behavior()));
    }

    #[test]
    fn test_unknown_host_falls_back_to_primary() {
        let config = dashboard_config();
        assert_eq!(resolve_backend(&config, "unknown.example.org").id(), "dashboard");
        assert_eq!(resolve_backend(&config, "").id(), "dashboard");
    }

    #[test]
    fn test_host_selects_backend_by_alias() {
        let config = dashboard_config();
        assert_eq!(resolve_backend(&config, "SECOND.example.com:443").id(), "s3_proxy");
        // The proxied backend's own behaviors apply when it is addressed directly.
        let direct = resolve(&config, "s3-alias.example.com", "/s3_asset/foo");
        assert_eq!(direct.backend_id(), "s3_proxy");
        assert_eq!(direct.host_override, None);
    }

    #[test]
    fn test_first_match_wins_over_best_match() {
        let forward = ordered(&["/hello*", "/*"]);
        let reverse = ordered(&["/*", "/hello*"]);

        let a = resolve(&forward, "any", "/hello-world");
        let b = resolve(&reverse, "any", "/hello-world");
        assert_eq!(tag(&a), "X-Behavior-0");
        assert_eq!(tag(&b), "X-Behavior-0");
        assert_eq!(a.behavior.patterns().unwrap()[0].pattern(), "/hello*");
        assert_eq!(b.behavior.patterns().unwrap()[0].pattern(), "/*");
    }

    #[test]
    fn test_disjoint_reordering_is_stable() {
        let forward = ordered(&["/a*", "/b*"]);
        let reverse = ordered(&["/b*", "/a*"]);
        for path in ["/apple", "/banana", "/cherry"] {
            let a = resolve(&forward, "any", path);
            let b = resolve(&reverse, "any", path);
            let pattern = |r: &ResolvedPolicy| r.behavior.patterns().map(|p| p[0].pattern().to_string());
            assert_eq!(pattern(&a), pattern(&b), "{path}");
        }
    }

    #[test]
    fn test_proxy_is_followed_one_hop_only() {
        let mut a = BackendConfig::new("a.example.com");
        a.primary = true;
        a.aliases = vec!["a.example.com".into()];
        a.behaviors = vec![BehaviorConfig::matching(["/b/*"]).with_proxy("b")];
        let mut b = BackendConfig::new("b.example.com");
        b.default = BehaviorConfig::default().with_proxy("c");
        let c = BackendConfig::new("c.example.com");

        let mut raw = PolicyConfig::default();
        raw.backends.insert("a".into(), a);
        raw.backends.insert("b".into(), b);
        raw.backends.insert("c".into(), c);
        let config = compile_configuration(&raw).unwrap();

        let resolved = config.resolve("a.example.com", "/b/x");
        assert_eq!(resolved.backend_id(), "b");
        assert_eq!(resolved.host_override, Some("b.example.com"));
    }
}
