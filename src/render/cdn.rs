//! CDN distribution description.
//!
//! # Responsibilities
//! - Model one distribution config per backend as PascalCase serde types
//! - Encode behavior order as array position; the CDN matches first-hit itself
//! - Translate each behavior's [`CachePolicy`] into forwarded values
//!
//! # Design Decisions
//! - Proxied behaviors forward the target's default policy, as [`resolve`] does
//! - A trailing match-all behavior is emitted with the `*` pattern
//! - Every backend is listed as an origin so proxy targets resolve
//!
//! [`resolve`]: crate::routing::router::resolve

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::compiled::{behavior_order, Backend, Behavior, Configuration};
use crate::config::endpoint::Endpoint;
use crate::policy::tables::{ALLOWED_METHODS, CACHED_METHODS, ERROR_CODES, HOST_HEADER, S3_SUFFIX};
use crate::policy::{CachePolicy, CookiePolicy};
use crate::routing::router::dispatch;

/// Header the CDN sets to the viewer protocol; always part of the cache key.
pub const FORWARDED_PROTO_HEADER: &str = "CloudFront-Forwarded-Proto";

const MATCH_ALL_PATTERN: &str = "*";
const ORIGIN_SSL_PROTOCOLS: &[&str] = &["TLSv1.2", "TLSv1.1"];
const DEFAULT_MINIMUM_PROTOCOL: &str = "TLSv1";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DistributionConfig {
    pub aliases: Vec<String>,
    pub cache_behaviors: Vec<CacheBehavior>,
    pub comment: String,
    pub custom_error_responses: Vec<CustomErrorResponse>,
    pub default_cache_behavior: CacheBehavior,
    pub default_root_object: String,
    pub enabled: bool,
    pub origins: Vec<Origin>,
    pub viewer_certificate: ViewerCertificate,
    pub http_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<Logging>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CacheBehavior {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_pattern: Option<String>,
    pub allowed_methods: Vec<&'static str>,
    pub cached_methods: Vec<&'static str>,
    pub compress: bool,
    #[serde(rename = "DefaultTTL")]
    pub default_ttl: u32,
    pub forwarded_values: ForwardedValues,
    #[serde(rename = "MinTTL")]
    pub min_ttl: u32,
    pub target_origin_id: String,
    pub viewer_protocol_policy: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ForwardedValues {
    pub cookies: CookieForwarding,
    pub headers: Vec<String>,
    pub query_string: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CookieForwarding {
    /// `all`, `none` or `whitelist`.
    pub forward: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelisted_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomErrorResponse {
    #[serde(rename = "ErrorCachingMinTTL")]
    pub error_caching_min_ttl: u32,
    pub error_code: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Origin {
    pub id: String,
    pub domain_name: String,
    pub origin_path: String,
    #[serde(rename = "S3OriginConfig", skip_serializing_if = "Option::is_none")]
    pub s3_origin_config: Option<S3OriginConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_origin_config: Option<CustomOriginConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3OriginConfig {
    pub origin_access_identity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomOriginConfig {
    #[serde(rename = "OriginSSLProtocols")]
    pub origin_ssl_protocols: Vec<&'static str>,
    pub origin_protocol_policy: &'static str,
    #[serde(rename = "HTTPPort", skip_serializing_if = "Option::is_none")]
    pub http_port: Option<u16>,
    #[serde(rename = "HTTPSPort", skip_serializing_if = "Option::is_none")]
    pub https_port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ViewerCertificate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acm_certificate_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_support_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_front_default_certificate: Option<bool>,
    pub minimum_protocol_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Logging {
    pub bucket: String,
    pub prefix: String,
    pub include_cookies: bool,
}

/// Distribution config for one backend.
pub fn distribution_config(config: &Configuration, backend: &Backend) -> DistributionConfig {
    let behaviors = behavior_order(backend);
    let cache_behaviors = behaviors
        .iter()
        .flat_map(|behavior| {
            let patterns: Vec<String> = match behavior.patterns() {
                Some(patterns) => patterns.iter().map(|p| p.pattern().to_string()).collect(),
                None => vec![MATCH_ALL_PATTERN.to_string()],
            };
            patterns
                .into_iter()
                .map(move |pattern| cache_behavior(config, backend, behavior, Some(pattern)))
        })
        .collect();

    DistributionConfig {
        aliases: backend.aliases().iter().map(|a| a.alias().to_string()).collect(),
        cache_behaviors,
        comment: String::new(),
        custom_error_responses: ERROR_CODES
            .iter()
            .map(|&error_code| CustomErrorResponse {
                error_caching_min_ttl: 0,
                error_code,
            })
            .collect(),
        default_cache_behavior: cache_behavior(config, backend, backend.default_behavior(), None),
        default_root_object: String::new(),
        enabled: true,
        origins: config.backends().map(origin).collect(),
        viewer_certificate: viewer_certificate(backend),
        http_version: "http2",
        logging: backend.log_target().map(|log| Logging {
            bucket: log.host.clone(),
            prefix: log.path.trim_start_matches('/').to_string(),
            include_cookies: false,
        }),
    }
}

/// Distribution configs for every backend, keyed by backend id.
pub fn distributions(config: &Configuration) -> IndexMap<String, DistributionConfig> {
    config
        .backends()
        .map(|backend| (backend.id().to_string(), distribution_config(config, backend)))
        .collect()
}

fn cache_behavior(
    config: &Configuration,
    backend: &Backend,
    behavior: &Behavior,
    path_pattern: Option<String>,
) -> CacheBehavior {
    let resolved = dispatch(config, backend, behavior);
    CacheBehavior {
        path_pattern,
        allowed_methods: ALLOWED_METHODS.to_vec(),
        cached_methods: CACHED_METHODS.to_vec(),
        compress: true,
        default_ttl: 0,
        forwarded_values: forwarded_values(resolved.policy()),
        min_ttl: 0,
        target_origin_id: resolved.backend_id().to_string(),
        viewer_protocol_policy: "redirect-to-https",
    }
}

fn forwarded_values(policy: &CachePolicy) -> ForwardedValues {
    let mut headers = policy.headers().to_vec();
    for extra in [HOST_HEADER, FORWARDED_PROTO_HEADER] {
        if !headers.iter().any(|h| h.eq_ignore_ascii_case(extra)) {
            headers.push(extra.to_string());
        }
    }

    let cookies = match policy.cookies() {
        CookiePolicy::All => CookieForwarding {
            forward: "all",
            whitelisted_names: None,
        },
        CookiePolicy::None => CookieForwarding {
            forward: "none",
            whitelisted_names: None,
        },
        CookiePolicy::Allow(names) => CookieForwarding {
            forward: "whitelist",
            whitelisted_names: Some(names.clone()),
        },
    };

    ForwardedValues {
        cookies,
        headers,
        query_string: true,
    }
}

fn origin(backend: &Backend) -> Origin {
    let endpoint = backend.origin();
    let is_s3 = endpoint.host.ends_with(S3_SUFFIX);
    Origin {
        id: backend.id().to_string(),
        domain_name: endpoint.host.clone(),
        origin_path: endpoint.path.clone(),
        s3_origin_config: is_s3.then(S3OriginConfig::default),
        custom_origin_config: (!is_s3).then(|| custom_origin_config(endpoint)),
    }
}

fn custom_origin_config(endpoint: &Endpoint) -> CustomOriginConfig {
    let mut custom = CustomOriginConfig {
        origin_ssl_protocols: ORIGIN_SSL_PROTOCOLS.to_vec(),
        origin_protocol_policy: "match-viewer",
        http_port: None,
        https_port: None,
    };
    match endpoint.scheme.as_deref() {
        Some("http") => {
            custom.origin_protocol_policy = "http-only";
            custom.http_port = endpoint.port;
        }
        Some("https") => {
            custom.origin_protocol_policy = "https-only";
            custom.https_port = endpoint.port;
        }
        _ => {}
    }
    custom
}

fn viewer_certificate(backend: &Backend) -> ViewerCertificate {
    match backend.tls_cert() {
        Some(cert) => ViewerCertificate {
            acm_certificate_arn: Some(cert.certificate_arn.clone()),
            ssl_support_method: Some(cert.ssl_support_method.clone()),
            cloud_front_default_certificate: None,
            minimum_protocol_version: cert.minimum_protocol_version.clone(),
        },
        None => ViewerCertificate {
            acm_certificate_arn: None,
            ssl_support_method: None,
            cloud_front_default_certificate: Some(true),
            minimum_protocol_version: DEFAULT_MINIMUM_PROTOCOL.to_string(),
        },
    }
}
