//! HTTP middleware.

pub mod cache_policy;

pub use cache_policy::{cache_policy_middleware, with_cache_policy, ResolvedBackend};
pub use crate::config::SharedConfiguration;
