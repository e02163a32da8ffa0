//! Cache policy configuration compiler.
//!
//! One declarative configuration of backends and ordered path behaviors is
//! compiled once and then consumed by independent enforcement points: a CDN
//! distribution description, an edge decision tree and an axum middleware.
//! All of them share the same pattern compiler, first-match resolution and
//! [`CachePolicy`](policy::CachePolicy) model.

pub mod config;
pub mod http;
pub mod observability;
pub mod policy;
pub mod render;
pub mod routing;

pub use config::{compile_configuration, Configuration, SharedConfiguration};
pub use routing::router::{resolve, ResolvedPolicy};
pub use render::render_decision_tree;
