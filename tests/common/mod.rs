//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use arc_swap::ArcSwap;
use edge_cache_policy::config::loader::parse_config;
use edge_cache_policy::config::{compile_configuration, Configuration, PolicyConfig, SharedConfiguration};

/// Dashboard site with an S3 asset bucket reached through a proxy behavior.
pub const DASHBOARD: &str = r#"
[observability]
log_level = "debug"

[backends.dashboard]
origin = "https://example.com"
aliases = ["dashboard-host"]
primary = true
log = "example-log.s3.amazonaws.com/prefix"

[[backends.dashboard.behaviors]]
path = ["/hello*", "/world*"]
headers = ["Authorization"]
cookies = ["session"]

[[backends.dashboard.behaviors]]
path = "/s3_asset/*"
proxy = "s3_proxy"

[[backends.dashboard.behaviors]]
path = "/*.css"
cookies = "none"

[backends.dashboard.default]
cookies = "all"

[backends.s3_proxy]
origin = "example.s3.amazonaws.com/prefix"
aliases = ["s3-alias.example.com", "assets.example.com"]

[backends.s3_proxy.default]
headers = ["Origin"]

[backends.api]
origin = "http://api.internal:8080"
aliases = ["api.example.com"]

[[backends.api.behaviors]]
path = "/v1/*"
headers = ["Authorization", "Accept"]
cookies = ["user_id"]

[backends.api.default]
"#;

pub fn raw(source: &str) -> PolicyConfig {
    parse_config(source).expect("fixture parses")
}

pub fn compile(source: &str) -> Configuration {
    compile_configuration(&raw(source)).expect("fixture compiles")
}

pub fn dashboard() -> Configuration {
    compile(DASHBOARD)
}

pub fn shared(config: Configuration) -> SharedConfiguration {
    Arc::new(ArcSwap::from_pointee(config))
}

/// A single primary backend whose behaviors use `patterns` in order.
pub fn ordered(patterns: &[&str]) -> Configuration {
    let mut source = String::from("[backends.site]\norigin = \"example.com\"\nprimary = true\n");
    for (i, pattern) in patterns.iter().enumerate() {
        source.push_str(&format!(
            "[[backends.site.behaviors]]\npath = \"{}\"\nheaders = [\"X-Behavior-{}\"]\n",
            pattern, i
        ));
    }
    source.push_str("[backends.site.default]\n");
    compile(&source)
}
