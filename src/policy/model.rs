//! Canonical forwarding and cache-key policy.
//!
//! Every enforcement point derives its header manipulation, cookie handling
//! and Vary computation from [`CachePolicy`] alone.

use serde::Serialize;

use crate::policy::tables::{
    COOKIE_CARRIER_PREFIX, COOKIE_HEADER, HOST_HEADER, REMOVED_HEADERS,
};

/// What happens to a deny-listed request header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderAction {
    Remove,
    Set(&'static str),
}

/// A deny-list entry that applies to a behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderOverride {
    pub name: &'static str,
    pub action: HeaderAction,
}

impl HeaderOverride {
    /// Parse a deny-list entry written as `Name` or `Name:Value`.
    pub fn parse(entry: &'static str) -> Self {
        match entry.split_once(':') {
            Some((name, value)) => Self {
                name,
                action: HeaderAction::Set(value),
            },
            None => Self {
                name: entry,
                action: HeaderAction::Remove,
            },
        }
    }
}

/// Cookie forwarding policy of a behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CookiePolicy {
    /// Forward every cookie untouched.
    All,
    /// Strip request cookies and response `Set-Cookie`.
    None,
    /// Forward only the named cookies, each mirrored into its own carrier header.
    Allow(Vec<String>),
}

/// Name of the synthetic request header carrying one cookie.
pub fn cookie_carrier(cookie: &str) -> String {
    format!("{}{}", COOKIE_CARRIER_PREFIX, cookie.replace('_', "-"))
}

/// Normalized `(forwardHeaders, forwardCookiePolicy, varyHeaderList)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachePolicy {
    /// Allow-listed request headers, passed through and keyed on.
    headers: Vec<String>,
    /// Deny-list entries not suppressed by the allow-list.
    overrides: Vec<HeaderOverride>,
    cookies: CookiePolicy,
    vary: Vec<String>,
}

impl CachePolicy {
    /// Normalize a behavior's header and cookie directives.
    pub fn new(headers: &[String], cookies: CookiePolicy) -> Self {
        let mut allow: Vec<String> = Vec::with_capacity(headers.len());
        for header in headers {
            push_unique(&mut allow, header.clone());
        }

        let overrides = REMOVED_HEADERS
            .iter()
            .map(|entry| HeaderOverride::parse(entry))
            .filter(|o| !allow.iter().any(|h| h.eq_ignore_ascii_case(o.name)))
            .collect();

        let cookies = match cookies {
            CookiePolicy::Allow(names) => {
                let mut unique = Vec::with_capacity(names.len());
                for name in names {
                    if !unique.contains(&name) {
                        unique.push(name);
                    }
                }
                CookiePolicy::Allow(unique)
            }
            other => other,
        };

        let mut vary = allow.clone();
        push_unique(&mut vary, HOST_HEADER.to_string());
        match &cookies {
            CookiePolicy::All => push_unique(&mut vary, COOKIE_HEADER.to_string()),
            CookiePolicy::None => {}
            CookiePolicy::Allow(names) => {
                for name in names {
                    push_unique(&mut vary, cookie_carrier(name));
                }
            }
        }

        Self {
            headers: allow,
            overrides,
            cookies,
            vary,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn overrides(&self) -> &[HeaderOverride] {
        &self.overrides
    }

    pub fn cookies(&self) -> &CookiePolicy {
        &self.cookies
    }

    /// Vary entries in emission order: headers, `Host`, then cookie entries.
    pub fn vary(&self) -> &[String] {
        &self.vary
    }

    /// Response `Set-Cookie` headers must be dropped.
    pub fn strips_set_cookie(&self) -> bool {
        self.cookies == CookiePolicy::None
    }

    /// Apply the cookie policy to a request `Cookie` header value.
    pub fn filter_cookies(&self, cookie_header: Option<&str>) -> CookieFilter {
        match &self.cookies {
            CookiePolicy::All => CookieFilter::PassThrough,
            CookiePolicy::None => CookieFilter::Strip,
            CookiePolicy::Allow(names) => {
                let mut kept = Vec::new();
                let mut carriers = Vec::new();
                let mut seen: Vec<&str> = Vec::new();
                for (name, value) in parse_cookie_header(cookie_header.unwrap_or_default()) {
                    // First occurrence wins, so the carrier matches the forwarded cookie.
                    if names.iter().any(|n| n == name) && !seen.contains(&name) {
                        seen.push(name);
                        carriers.push((cookie_carrier(name), value.to_string()));
                        kept.push(format!("{}={}", name, value));
                    }
                }
                CookieFilter::Extract {
                    cookie: (!kept.is_empty()).then(|| kept.join("; ")),
                    carriers,
                }
            }
        }
    }
}

/// Outcome of applying a cookie policy to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieFilter {
    PassThrough,
    Strip,
    Extract {
        /// Rebuilt `Cookie` header, `None` when nothing survived.
        cookie: Option<String>,
        /// `(carrier header, value)` for each surviving cookie.
        carriers: Vec<(String, String)>,
    },
}

/// Split a `Cookie` header into `(name, value)` pairs, skipping malformed parts.
pub fn parse_cookie_header(header: &str) -> impl Iterator<Item = (&str, &str)> {
    header.split(';').filter_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        let name = name.trim();
        (!name.is_empty()).then(|| (name, value.trim()))
    })
}

fn push_unique(list: &mut Vec<String>, entry: String) {
    if !list.iter().any(|e| e.eq_ignore_ascii_case(&entry)) {
        list.push(entry);
    }
}
