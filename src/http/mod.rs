//! HTTP enforcement of cache policies.
//!
//! # Data Flow
//! ```text
//! Request (from the caller's server)
//!     → middleware/cache_policy.rs (method check, resolve, host substitution)
//!     → request headers and cookies filtered per CachePolicy
//!     → caller's pipeline (cache, upstream dispatch via ResolvedBackend)
//!     → response Set-Cookie stripped, Vary merged
//! ```
//!
//! Serving, connection handling and upstream forwarding stay with the caller.

pub mod middleware;

pub use middleware::{cache_policy_middleware, with_cache_policy, ResolvedBackend};
