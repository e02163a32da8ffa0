//! Ordered first-match lists as nested conditionals.
//!
//! # Responsibilities
//! - Turn `(condition, payload)` entries into `if / elseif / else` shape
//! - Fold AND/OR composition and drop statically-false branches
//! - Evaluate a tree against a (host, path) pair for equivalence checks
//!
//! # Design Decisions
//! - The tree is language-neutral; renderers own all target syntax
//! - Order is preserved exactly; no reordering of "equivalent" branches
//! - Misplaced match-all entries are rejected by validation before this
//!   runs; here the first unconditional entry simply ends the chain
//!
//! A lone match-all entry compiles to [`DecisionTree::Unconditional`]
//! rather than an `else` with no `if`. This mirrors an ambiguity in how
//! earlier generators treated a single wildcard entry and is kept as-is.

use serde::Serialize;

use crate::routing::matcher::{HostMatcher, Matcher, PathMatcher};

/// A semantic predicate over a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    True,
    False,
    /// The request host matches a backend alias.
    Host(HostMatcher),
    /// The request path matches a compiled pattern.
    Path(PathMatcher),
    Any(Vec<Condition>),
    All(Vec<Condition>),
}

impl Condition {
    /// OR-compose. Empty compiles to `False`.
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        let mut terms = Vec::new();
        for condition in conditions {
            match condition {
                Condition::False => {}
                Condition::True => return Condition::True,
                other => terms.push(other),
            }
        }
        match terms.len() {
            0 => Condition::False,
            1 => terms.remove(0),
            _ => Condition::Any(terms),
        }
    }

    /// AND-compose. Empty compiles to `True`.
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        let mut terms = Vec::new();
        for condition in conditions {
            match condition {
                Condition::True => {}
                Condition::False => return Condition::False,
                other => terms.push(other),
            }
        }
        match terms.len() {
            0 => Condition::True,
            1 => terms.remove(0),
            _ => Condition::All(terms),
        }
    }

    pub fn evaluate(&self, host: &str, path: &str) -> bool {
        match self {
            Condition::True => true,
            Condition::False => false,
            Condition::Host(m) => m.matches(host),
            Condition::Path(m) => m.matches(path),
            Condition::Any(terms) => terms.iter().any(|c| c.evaluate(host, path)),
            Condition::All(terms) => terms.iter().all(|c| c.evaluate(host, path)),
        }
    }
}

/// One `if` / `elseif` arm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch<P> {
    pub condition: Condition,
    pub payload: P,
}

/// Nested conditional equivalent to first-match scanning.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionTree<P> {
    /// Every entry was statically false.
    Empty,
    /// A single branch with no wrapping condition.
    Unconditional(P),
    /// `if (branches[0]) … elseif (branches[n]) … else otherwise`.
    Chain {
        branches: Vec<Branch<P>>,
        otherwise: Option<P>,
    },
}

/// Compile ordered entries; `None` marks a match-all entry.
pub fn compile<P>(entries: impl IntoIterator<Item = (Option<Condition>, P)>) -> DecisionTree<P> {
    let mut branches = Vec::new();
    let mut otherwise = None;

    for (condition, payload) in entries {
        match condition.unwrap_or(Condition::True) {
            Condition::False => continue,
            Condition::True => {
                otherwise = Some(payload);
                break;
            }
            condition => branches.push(Branch { condition, payload }),
        }
    }

    match (branches.is_empty(), otherwise) {
        (true, Some(payload)) => DecisionTree::Unconditional(payload),
        (true, None) => DecisionTree::Empty,
        (false, otherwise) => DecisionTree::Chain { branches, otherwise },
    }
}

impl<P> DecisionTree<P> {
    /// The payload a request would reach, if any.
    pub fn evaluate(&self, host: &str, path: &str) -> Option<&P> {
        match self {
            DecisionTree::Empty => None,
            DecisionTree::Unconditional(payload) => Some(payload),
            DecisionTree::Chain { branches, otherwise } => branches
                .iter()
                .find(|b| b.condition.evaluate(host, path))
                .map(|b| &b.payload)
                .or(otherwise.as_ref()),
        }
    }

    /// Payloads in emission order.
    pub fn payloads(&self) -> Vec<&P> {
        match self {
            DecisionTree::Empty => Vec::new(),
            DecisionTree::Unconditional(payload) => vec![payload],
            DecisionTree::Chain { branches, otherwise } => branches
                .iter()
                .map(|b| &b.payload)
                .chain(otherwise.iter())
                .collect(),
        }
    }
}
