//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Request (host, path)
//!     → router.rs (backend by alias, behavior by first matching pattern)
//!     → matcher.rs (compiled path patterns, host aliases)
//!     → Return: ResolvedPolicy (after at most one proxy hop)
//!
//! Tree Compilation (for generated edge code):
//!     ordered (condition, payload) entries
//!     → tree.rs (fold AND/OR, drop dead branches)
//!     → DecisionTree (if / elseif / else)
//! ```
//!
//! # Design Decisions
//! - Patterns compiled once, immutable at runtime
//! - Deterministic: same input always resolves to the same behavior
//! - First match wins in declared order; no specificity ranking

pub mod matcher;
pub mod router;
pub mod tree;
