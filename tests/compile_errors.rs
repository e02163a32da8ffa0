//! Configurations that must be rejected as a whole.

use edge_cache_policy::config::loader::{parse_config, ConfigError};
use edge_cache_policy::config::{compile_configuration, ValidationErrorKind};
use edge_cache_policy::routing::matcher::PatternViolation;

mod common;

fn site_with_behaviors(behaviors: &str) -> String {
    format!(
        "[backends.site]\norigin = \"example.com\"\nprimary = true\n{}\n[backends.site.default]\n",
        behaviors
    )
}

fn kinds(source: &str) -> Vec<ValidationErrorKind> {
    compile_configuration(&common::raw(source))
        .unwrap_err()
        .into_iter()
        .map(|e| e.kind)
        .collect()
}

#[test]
fn test_rejects_invalid_patterns() {
    let long = format!("/{}", "a".repeat(299));
    let source = site_with_behaviors(&format!(
        "[[backends.site.behaviors]]\npath = [\"/a?b*\", \"ab*\", \"{}\"]\n",
        long
    ));
    let errors = compile_configuration(&common::raw(&source)).unwrap_err();

    let found: Vec<_> = errors
        .iter()
        .map(|e| (e.pattern.clone().unwrap(), e.kind.clone()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("/a?b*".to_string(), ValidationErrorKind::InvalidPattern(PatternViolation::SingleCharWildcard)),
            ("ab*".to_string(), ValidationErrorKind::InvalidPattern(PatternViolation::MissingLeadingSlash)),
            (long, ValidationErrorKind::InvalidPattern(PatternViolation::TooLong)),
        ]
    );
    assert!(errors.iter().all(|e| e.backend.as_deref() == Some("site")));
}

#[test]
fn test_rejects_misplaced_match_all_behavior() {
    let source = site_with_behaviors(
        "[[backends.site.behaviors]]\npath = \"/a*\"\n\
         [[backends.site.behaviors]]\n\
         [[backends.site.behaviors]]\npath = \"/b*\"\n",
    );
    assert_eq!(
        kinds(&source),
        vec![ValidationErrorKind::MisplacedWildcardBehavior { index: 1 }]
    );
}

#[test]
fn test_trailing_match_all_behavior_is_accepted() {
    let source = site_with_behaviors(
        "[[backends.site.behaviors]]\npath = \"/a*\"\n[[backends.site.behaviors]]\nheaders = [\"Accept\"]\n",
    );
    let config = common::compile(&source);
    assert_eq!(config.resolve("any", "/zzz").policy().headers(), ["Accept"]);
}

#[test]
fn test_rejects_unresolved_proxy_target() {
    let source = site_with_behaviors("[[backends.site.behaviors]]\npath = \"/x/*\"\nproxy = \"missing\"\n");
    assert_eq!(
        kinds(&source),
        vec![ValidationErrorKind::UnresolvedProxyTarget("missing".into())]
    );
}

#[test]
fn test_rejects_missing_and_duplicate_primary() {
    let none = "[backends.a]\norigin = \"a.example.com\"\n[backends.a.default]\n";
    assert_eq!(kinds(none), vec![ValidationErrorKind::NoDefaultBackend]);

    let two = "[backends.a]\norigin = \"a.example.com\"\nprimary = true\n[backends.a.default]\n\
               [backends.b]\norigin = \"b.example.com\"\nprimary = true\n[backends.b.default]\n";
    assert_eq!(
        kinds(two),
        vec![ValidationErrorKind::MultiplePrimaryBackends(vec!["a".into(), "b".into()])]
    );
}

#[test]
fn test_rejects_patterned_default() {
    let source = "[backends.site]\norigin = \"example.com\"\nprimary = true\n\
                  [backends.site.default]\npath = \"/x*\"\n";
    assert_eq!(kinds(source), vec![ValidationErrorKind::PatternedDefaultBehavior]);
}

#[test]
fn test_missing_default_is_a_parse_error() {
    let source = "[backends.site]\norigin = \"example.com\"\nprimary = true\n";
    assert!(matches!(parse_config(source), Err(ConfigError::Parse(_))));
}

#[test]
fn test_unknown_cookie_keyword_is_a_parse_error() {
    let source = site_with_behaviors("[[backends.site.behaviors]]\npath = \"/a*\"\ncookies = \"some\"\n");
    assert!(matches!(parse_config(&source), Err(ConfigError::Parse(_))));
}

#[test]
fn test_error_display_names_backend_and_pattern() {
    let source = site_with_behaviors("[[backends.site.behaviors]]\npath = \"ab*\"\n");
    let errors = compile_configuration(&common::raw(&source)).unwrap_err();
    let message = errors[0].to_string();
    assert!(message.starts_with("backend 'site': "), "{message}");
    assert!(message.ends_with("(pattern 'ab*')"), "{message}");
}

#[test]
fn test_rejects_cookies_sharing_a_carrier_header() {
    let source = site_with_behaviors(
        "[[backends.site.behaviors]]\npath = \"/a*\"\ncookies = [\"ab_test\", \"ab-test\"]\n",
    );
    assert_eq!(
        kinds(&source),
        vec![ValidationErrorKind::DuplicateCookieCarrier {
            first: "ab_test".into(),
            second: "ab-test".into(),
            carrier: "X-Cookie-ab-test".into(),
        }]
    );
}
