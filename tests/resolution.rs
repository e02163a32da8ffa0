//! Resolution properties over a loaded configuration.

use edge_cache_policy::policy::CookiePolicy;
use edge_cache_policy::{resolve, Configuration};

mod common;

#[test]
fn test_proxy_behavior_resolves_to_target_default() {
    let config = common::dashboard();
    let resolved = resolve(&config, "dashboard-host", "/s3_asset/foo");

    assert_eq!(resolved.backend_id(), "s3_proxy");
    assert!(std::ptr::eq(
        resolved.behavior,
        config.backend("s3_proxy").unwrap().default_behavior()
    ));
    assert_eq!(resolved.host_override, Some("s3-alias.example.com"));
    assert_eq!(resolved.policy().headers(), ["Origin"]);
}

#[test]
fn test_overlapping_patterns_follow_declared_order() {
    let forward = common::ordered(&["/hello*", "/*"]);
    let reverse = common::ordered(&["/*", "/hello*"]);

    let a = resolve(&forward, "any", "/hello-world");
    let b = resolve(&reverse, "any", "/hello-world");
    assert_eq!(a.policy().headers(), ["X-Behavior-0"]);
    assert_eq!(b.policy().headers(), ["X-Behavior-0"]);
    assert_eq!(a.behavior.patterns().unwrap()[0].pattern(), "/hello*");
    assert_eq!(b.behavior.patterns().unwrap()[0].pattern(), "/*");
}

#[test]
fn test_disjoint_patterns_are_order_independent() {
    let forward = common::ordered(&["/a*", "/b*", "/*.png"]);
    let reverse = common::ordered(&["/*.png", "/b*", "/a*"]);
    for path in ["/apple", "/banana", "/c/logo.png", "/cherry"] {
        let pattern = |config: &Configuration| {
            resolve(config, "any", path)
                .behavior
                .patterns()
                .map(|p| p[0].pattern().to_string())
        };
        assert_eq!(pattern(&forward), pattern(&reverse), "{path}");
    }
}

#[test]
fn test_query_string_does_not_affect_match() {
    let config = common::dashboard();
    let plain = resolve(&config, "dashboard-host", "/hello");
    let query = resolve(&config, "dashboard-host", "/hello?utm=1");
    assert_eq!(plain, query);
    assert_eq!(plain.policy().headers(), ["Authorization"]);
}

#[test]
fn test_extension_pattern_matches_at_any_depth() {
    let config = common::dashboard();
    let css = resolve(&config, "dashboard-host", "/assets/site/main.css");
    assert_eq!(css.policy().cookies(), &CookiePolicy::None);
}

#[test]
fn test_hosts() {
    let config = common::dashboard();
    assert_eq!(resolve(&config, "api.example.com", "/v1/users").backend_id(), "api");
    assert_eq!(resolve(&config, "API.EXAMPLE.COM:8443", "/v1/users").backend_id(), "api");
    assert_eq!(resolve(&config, "assets.example.com", "/x").backend_id(), "s3_proxy");
    assert_eq!(resolve(&config, "nobody.example.org", "/x").backend_id(), "dashboard");
    assert_eq!(resolve(&config, "", "/x").backend_id(), "dashboard");
}

#[test]
fn test_cookie_allow_list_vary() {
    let config = common::dashboard();
    let policy = resolve(&config, "dashboard-host", "/hello").policy();

    assert_eq!(policy.cookies(), &CookiePolicy::Allow(vec!["session".into()]));
    assert_eq!(policy.vary(), ["Authorization", "Host", "X-Cookie-session"]);
}
