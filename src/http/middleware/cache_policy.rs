//! Cache policy enforcement middleware.
//!
//! # Responsibilities
//! - Reject methods outside the allowed set
//! - Resolve (host, path) against the live configuration snapshot
//! - Apply the proxy host substitution and record the serving backend
//! - Filter request headers and cookies, then add Vary on the response

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{COOKIE, HOST, SET_COOKIE, VARY},
        HeaderMap, HeaderName, HeaderValue, Request, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tracing::{debug, warn};

use crate::config::SharedConfiguration;
use crate::policy::tables::{is_allowed_method, is_cached_method, COOKIE_CARRIER_PREFIX};
use crate::policy::{CachePolicy, CookieFilter, HeaderAction};

/// Backend chosen for a request, attached as a request extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedBackend {
    pub id: String,
    /// Host presented upstream when the request was proxied.
    pub host_override: Option<String>,
    /// The request method's responses may be stored by a cache.
    pub cacheable: bool,
}

pub async fn cache_policy_middleware(
    State(config): State<SharedConfiguration>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if !is_allowed_method(req.method().as_str()) {
        warn!(method = %req.method(), "Rejected unsupported method");
        return (StatusCode::FORBIDDEN, "Unsupported method.").into_response();
    }

    let snapshot = config.load_full();
    let host = request_host(&req);
    let path = req.uri().path().to_string();
    let resolved = snapshot.resolve(&host, &path);

    if let Some(target) = resolved.host_override {
        if let Ok(value) = HeaderValue::from_str(target) {
            req.headers_mut().insert(HOST, value);
        }
    }
    debug!(
        host = %host,
        path = %path,
        backend = resolved.backend_id(),
        host_override = ?resolved.host_override,
        "Resolved cache policy"
    );

    let cacheable = is_cached_method(req.method().as_str());
    req.extensions_mut().insert(ResolvedBackend {
        id: resolved.backend_id().to_string(),
        host_override: resolved.host_override.map(str::to_string),
        cacheable,
    });
    apply_request_policy(resolved.policy(), req.headers_mut());

    let mut response = next.run(req).await;
    apply_response_policy(resolved.policy(), response.headers_mut());
    response
}

/// Layer the cache policy middleware onto a router.
pub fn with_cache_policy(router: Router, config: SharedConfiguration) -> Router {
    router.layer(middleware::from_fn_with_state(config, cache_policy_middleware))
}

fn request_host(req: &Request<Body>) -> String {
    req.headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().host())
        .unwrap_or_default()
        .to_string()
}

/// Apply the header deny-list and cookie policy to request headers.
pub fn apply_request_policy(policy: &CachePolicy, headers: &mut HeaderMap) {
    for entry in policy.overrides() {
        let Ok(name) = HeaderName::from_bytes(entry.name.as_bytes()) else {
            continue;
        };
        match entry.action {
            HeaderAction::Remove => {
                headers.remove(&name);
            }
            HeaderAction::Set(value) => {
                headers.insert(name, HeaderValue::from_static(value));
            }
        }
    }

    // Carrier headers are only ever produced here.
    let prefix = COOKIE_CARRIER_PREFIX.to_ascii_lowercase();
    let spoofed: Vec<HeaderName> = headers
        .keys()
        .filter(|name| name.as_str().starts_with(&prefix))
        .cloned()
        .collect();
    for name in spoofed {
        headers.remove(&name);
    }

    let cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");

    match policy.filter_cookies((!cookie.is_empty()).then_some(cookie.as_str())) {
        CookieFilter::PassThrough => {}
        CookieFilter::Strip => {
            headers.remove(COOKIE);
        }
        CookieFilter::Extract { cookie, carriers } => {
            headers.remove(COOKIE);
            if let Some(value) = cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
                headers.insert(COOKIE, value);
            }
            for (name, value) in carriers {
                match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
                    (Ok(name), Ok(value)) => {
                        headers.insert(name, value);
                    }
                    _ => debug!(carrier = %name, "Dropped cookie that cannot be carried in a header"),
                }
            }
        }
    }
}

/// Strip `Set-Cookie` where required and merge the policy's Vary entries.
pub fn apply_response_policy(policy: &CachePolicy, headers: &mut HeaderMap) {
    if policy.strips_set_cookie() {
        headers.remove(SET_COOKIE);
    }

    let mut vary: Vec<String> = headers
        .get_all(VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if vary.iter().any(|v| v == "*") {
        return;
    }

    for entry in policy.vary() {
        if !vary.iter().any(|v| v.eq_ignore_ascii_case(entry)) {
            vary.push(entry.clone());
        }
    }
    if let Ok(value) = HeaderValue::from_str(&vary.join(", ")) {
        headers.insert(VARY, value);
    }
}
