//! Origin and log-target URL parsing.
//!
//! Configured URLs may omit the scheme ("example.s3.amazonaws.com/prefix").
//! A missing scheme is kept as `None` so renderers can match the viewer protocol.

use serde::Serialize;
use url::Url;

/// A parsed origin or log-target URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub scheme: Option<String>,
    pub host: String,
    /// Explicit port, or the scheme's default when a scheme is given.
    pub port: Option<u16>,
    /// Path without a trailing slash; empty for the root.
    pub path: String,
}

impl Endpoint {
    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        let input = input.trim();
        let (url, scheme) = if input.contains("://") {
            let url = Url::parse(input)?;
            let scheme = url.scheme().to_string();
            (url, Some(scheme))
        } else {
            (Url::parse(&format!("http://{}", input))?, None)
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(url::ParseError::EmptyHost)?
            .to_string();
        let port = if scheme.is_some() {
            url.port_or_known_default()
        } else {
            url.port()
        };
        let path = url.path().trim_end_matches('/').to_string();

        Ok(Self {
            scheme,
            host,
            port,
            path,
        })
    }
}
