//! Fixed lookup tables shared by every enforcement point.

/// Methods any enforcement point lets through to the origin.
pub const ALLOWED_METHODS: &[&str] = &["DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT"];

/// Methods whose responses may be cached.
pub const CACHED_METHODS: &[&str] = &["HEAD", "GET", "OPTIONS"];

/// Headers removed from every request unless a behavior allow-lists them.
///
/// `Name` deletes the header, `Name:Value` forces it to a fixed value.
pub const REMOVED_HEADERS: &[&str] = &[
    "Accept",
    "Accept-Charset",
    "Accept-Language:en-US",
    "Referer",
    "User-Agent:Cached-Request",
];

/// Error responses the CDN caches with a zero TTL.
pub const ERROR_CODES: &[u16] = &[400, 403, 404, 405, 414, 500, 501, 502, 503, 504];

/// Origin host suffix identifying an S3 bucket.
pub const S3_SUFFIX: &str = ".s3.amazonaws.com";

/// Header always folded into the cache key.
pub const HOST_HEADER: &str = "Host";

/// Vary entry used when every cookie is forwarded.
pub const COOKIE_HEADER: &str = "Cookie";

/// Prefix of the synthetic header carrying one allow-listed cookie.
pub const COOKIE_CARRIER_PREFIX: &str = "X-Cookie-";

pub fn is_allowed_method(method: &str) -> bool {
    ALLOWED_METHODS.iter().any(|m| m.eq_ignore_ascii_case(method))
}

pub fn is_cached_method(method: &str) -> bool {
    CACHED_METHODS.iter().any(|m| m.eq_ignore_ascii_case(method))
}
