//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! compiler, watcher, middleware
//!     → tracing events (structured fields)
//!     → logging.rs (EnvFilter + fmt layer on stderr)
//! ```

pub mod logging;

pub use logging::init_logging;
