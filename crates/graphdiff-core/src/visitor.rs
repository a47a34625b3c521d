//! Read-only traversal of a finished [`DiffTree`](crate::DiffTree).
//!
//! Traversal is pre-order and depth-first, children in creation order, and
//! sees every node regardless of the tree's filter. A visitor steers it
//! through [`Visit`]. Any `FnMut(NodeRef<'t>, &mut Visit)` closure is a
//! visitor.

use std::collections::BTreeMap;

use graphdiff_model::Path;

use crate::state::State;
use crate::tree::NodeRef;

/// Traversal controls handed to a visitor with every node.
#[derive(Debug, Default)]
pub struct Visit {
    stopped: bool,
    skip_children: bool,
}

impl Visit {
    /// End the traversal after the current node.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Skip the current node's descendants.
    pub fn dont_go_deeper(&mut self) {
        self.skip_children = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Callback invoked once per visited node.
pub trait NodeVisitor<'t> {
    fn node(&mut self, node: NodeRef<'t>, visit: &mut Visit);
}

impl<'t, F> NodeVisitor<'t> for F
where
    F: FnMut(NodeRef<'t>, &mut Visit),
{
    fn node(&mut self, node: NodeRef<'t>, visit: &mut Visit) {
        self(node, visit)
    }
}

/// Iterative pre-order walk from `start`.
pub(crate) fn walk<'t, V: NodeVisitor<'t> + ?Sized>(start: NodeRef<'t>, visitor: &mut V) {
    let mut stack = vec![start];
    let mut visit = Visit::default();
    while let Some(node) = stack.pop() {
        visit.skip_children = false;
        visitor.node(node, &mut visit);
        if visit.stopped {
            return;
        }
        if !visit.skip_children {
            let children: Vec<NodeRef<'t>> = node.all_children().collect();
            stack.extend(children.into_iter().rev());
        }
    }
}

/// Finds the node at a path, descending only along its prefix.
#[derive(Debug)]
pub struct PathVisitor<'t> {
    target: Path,
    found: Option<NodeRef<'t>>,
}

impl<'t> PathVisitor<'t> {
    pub fn new(target: Path) -> Self {
        Self {
            target,
            found: None,
        }
    }

    pub fn found(&self) -> Option<NodeRef<'t>> {
        self.found
    }
}

impl<'t> NodeVisitor<'t> for PathVisitor<'t> {
    fn node(&mut self, node: NodeRef<'t>, visit: &mut Visit) {
        if *node.path() == self.target {
            self.found = Some(node);
            visit.stop();
        } else if !node.path().is_prefix_of(&self.target) {
            visit.dont_go_deeper();
        }
    }
}

/// Counts visited nodes per state.
#[derive(Clone, Debug, Default)]
pub struct StateCountVisitor {
    counts: BTreeMap<State, usize>,
}

impl StateCountVisitor {
    pub fn count(&self, state: State) -> usize {
        self.counts.get(&state).copied().unwrap_or(0)
    }

    pub fn into_counts(self) -> BTreeMap<State, usize> {
        self.counts
    }
}

impl NodeVisitor<'_> for StateCountVisitor {
    fn node(&mut self, node: NodeRef<'_>, _: &mut Visit) {
        *self.counts.entry(node.state()).or_default() += 1;
    }
}

/// Passes only returnable nodes to the wrapped visitor and does not descend
/// below a node that is not returnable.
#[derive(Debug)]
pub struct ReturnableVisitor<V> {
    inner: V,
}

impl<V> ReturnableVisitor<V> {
    pub fn new(inner: V) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> V {
        self.inner
    }
}

impl<'t, V: NodeVisitor<'t>> NodeVisitor<'t> for ReturnableVisitor<V> {
    fn node(&mut self, node: NodeRef<'t>, visit: &mut Visit) {
        if node.is_returnable() {
            self.inner.node(node, visit);
        } else {
            visit.dont_go_deeper();
        }
    }
}
