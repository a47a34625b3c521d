//! Node visibility.

use std::collections::{BTreeMap, HashMap};

use graphdiff_model::Path;

use crate::config::{DiffConfig, ReturnPolicy};
use crate::state::State;
use crate::tree::NodeRef;

/// Decides which nodes are exposed to visibility queries.
///
/// The root is always returnable. An untouched node with children is
/// returnable so that deeper nodes stay reachable. Every other node is
/// returnable according to its state, with per-path overrides taking
/// precedence over the [`ReturnPolicy`].
///
/// The filter only reads the tree; it never changes a node.
#[derive(Clone, Debug, Default)]
pub struct ReturnableFilter {
    policy: ReturnPolicy,
    overrides: HashMap<Path, BTreeMap<State, bool>>,
}

impl ReturnableFilter {
    pub fn new(policy: ReturnPolicy) -> Self {
        Self {
            policy,
            overrides: HashMap::new(),
        }
    }

    /// The policy and path overrides of `config`.
    pub fn from_config(config: &DiffConfig) -> Self {
        Self {
            policy: *config.return_policy(),
            overrides: config
                .path_returnable_overrides()
                .map(|(path, table)| (path.clone(), table.clone()))
                .collect(),
        }
    }

    /// Override the visibility of `state` at exactly `path`.
    pub fn with_override(mut self, path: Path, state: State, enabled: bool) -> Self {
        self.overrides.entry(path).or_default().insert(state, enabled);
        self
    }

    pub fn policy(&self) -> &ReturnPolicy {
        &self.policy
    }

    pub fn is_returnable(&self, node: NodeRef<'_>) -> bool {
        if node.is_root() {
            return true;
        }
        if node.is_untouched() && node.child_count() > 0 {
            return true;
        }
        self.is_state_returnable(node.path(), node.state())
    }

    fn is_state_returnable(&self, path: &Path, state: State) -> bool {
        self.overrides
            .get(path)
            .and_then(|table| table.get(&state).copied())
            .unwrap_or_else(|| self.policy.is_returnable(state))
    }
}
