//! Cache policy model.
//!
//! # Data Flow
//! ```text
//! behavior directives (headers, cookies)
//!     → model.rs (deny-list, cookie carriers, Vary list)
//!     → CachePolicy (immutable, one per behavior)
//!     → consumed unchanged by the CDN, edge and HTTP renderers
//! ```
//!
//! # Design Decisions
//! - Normalization happens once, at configuration compile time
//! - Fixed tables (tables.rs) are plain constants with no lifecycle
//! - Renderers never recompute Vary; they read it from the policy

pub mod model;
pub mod tables;

pub use model::{CachePolicy, CookieFilter, CookiePolicy, HeaderAction, HeaderOverride};
