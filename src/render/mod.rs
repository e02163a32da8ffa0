//! Artifact renderers.
//!
//! # Data Flow
//! ```text
//! Configuration (compiled, immutable)
//!     → cdn.rs  (behavior_order → distribution description, array order = match order)
//!     → edge.rs (tree.rs → host layer → path layer, for script emitters)
//! ```
//!
//! Both outputs are plain serde models. Literal target syntax is produced by
//! whoever serializes them.

pub mod cdn;
pub mod edge;

pub use cdn::{distribution_config, distributions, DistributionConfig};
pub use edge::{render_decision_tree, BackendSelection, EdgeTree};
