//! Edge decision tree.
//!
//! Two nested layers compiled with [`crate::routing::tree`]: the outer layer
//! picks a backend by host alias, each leaf holds the inner layer that picks a
//! behavior by path. The outer `else` is the primary backend.

use serde::Serialize;

use crate::config::compiled::{behavior_order, Backend, Configuration};
use crate::routing::router::{dispatch, ResolvedPolicy};
use crate::routing::tree::{self, Condition, DecisionTree};

/// Outer-layer leaf: a backend and its path tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendSelection<'a> {
    pub backend: &'a str,
    pub behaviors: DecisionTree<ResolvedPolicy<'a>>,
}

pub type EdgeTree<'a> = DecisionTree<BackendSelection<'a>>;

/// Build the host → path decision tree for a configuration.
pub fn render_decision_tree(config: &Configuration) -> EdgeTree<'_> {
    let primary = config.primary();
    let hosts = config.backends().map(|backend| {
        let aliases = backend.aliases().iter().cloned().map(Condition::Host);
        (Some(Condition::any(aliases)), select(config, backend))
    });

    tree::compile(hosts.chain(std::iter::once((None, select(config, primary)))))
}

fn select<'a>(config: &'a Configuration, backend: &'a Backend) -> BackendSelection<'a> {
    let paths = behavior_order(backend).iter().map(|behavior| {
        let condition = behavior
            .patterns()
            .map(|patterns| Condition::any(patterns.iter().cloned().map(Condition::Path)));
        (condition, dispatch(config, backend, behavior))
    });
    let default = dispatch(config, backend, backend.default_behavior());

    BackendSelection {
        backend: backend.id(),
        behaviors: tree::compile(paths.chain(std::iter::once((None, default)))),
    }
}

impl<'a> EdgeTree<'a> {
    /// Walk both layers for a request.
    pub fn select(&self, host: &str, path: &str) -> Option<&ResolvedPolicy<'a>> {
        self.evaluate(host, path)?.behaviors.evaluate(host, path)
    }
}
