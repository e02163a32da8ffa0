//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize into schema.rs types)
//!     → validation.rs (semantic checks, every error collected)
//!     → compiled.rs (patterns compiled, policies normalized)
//!     → Configuration (validated, immutable)
//!     → shared via Arc to resolution, renderers and middleware
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads and compiles new config
//!     → atomic swap of Arc<Configuration>
//!     → in-flight requests keep the snapshot they started with
//! ```
//!
//! # Design Decisions
//! - Config is immutable once compiled; changes require a full recompile
//! - A failed compile never yields a partial configuration
//! - Validation separates syntactic (serde) from semantic checks

pub mod compiled;
pub mod endpoint;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

use std::sync::Arc;

use arc_swap::ArcSwap;

pub use compiled::{behavior_order, compile_configuration, Backend, Behavior, Configuration};
pub use schema::{BackendConfig, BehaviorConfig, CookieDirective, PolicyConfig};
pub use validation::{ValidationError, ValidationErrorKind};

/// Live configuration snapshot shared with request handlers.
pub type SharedConfiguration = Arc<ArcSwap<Configuration>>;
