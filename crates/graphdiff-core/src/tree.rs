//! The result tree of a comparison.
//!
//! [`DiffTree`] owns every node in an arena. A node knows its [`Path`], its
//! [`State`], the runtime type of the compared value, its parent (by
//! [`NodeId`], never by ownership), and its children keyed by path
//! [`Element`] in the order the engine created them.
//!
//! The tree is frozen once [`ObjectDiffer::compare`] returns. Reads go
//! through the borrowed [`NodeRef`] view. Visibility queries
//! ([`NodeRef::children`], [`NodeRef::has_children`]) honour the tree's
//! [`ReturnableFilter`]; structural queries ([`NodeRef::all_children`],
//! [`NodeRef::get_child`]) and visitors see every node.
//!
//! [`ObjectDiffer::compare`]: crate::ObjectDiffer::compare

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use graphdiff_model::{Element, Introspector, Path, Value, ValueType};

use crate::filter::ReturnableFilter;
use crate::state::State;
use crate::visitor::{self, NodeVisitor, ReturnableVisitor, StateCountVisitor};

/// Handle of a node inside one [`DiffTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(0);
}

#[derive(Debug)]
struct NodeData {
    path: Path,
    state: State,
    value_type: Option<ValueType>,
    parent: Option<NodeId>,
    children: IndexMap<Element, NodeId>,
    circle_start: Option<Path>,
}

/// The frozen result of one comparison.
pub struct DiffTree {
    nodes: Vec<NodeData>,
    filter: ReturnableFilter,
    introspector: Arc<dyn Introspector>,
}

impl DiffTree {
    /// The root node. It always exists.
    pub fn root(&self) -> NodeRef<'_> {
        self.node(NodeId::ROOT)
    }

    /// View a node by handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to a different tree and is out of range.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        assert!(id.0 < self.nodes.len(), "node id {id:?} out of range");
        NodeRef { tree: self, id }
    }

    /// Total number of nodes, visible or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`; a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node at `path`, if one was created.
    pub fn get(&self, path: &Path) -> Option<NodeRef<'_>> {
        self.root().get_child(path)
    }

    pub fn filter(&self) -> &ReturnableFilter {
        &self.filter
    }

    /// The same tree under a different visibility policy. Structure and
    /// states are unchanged.
    pub fn with_filter(mut self, filter: ReturnableFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Visit every node depth-first, parents before children.
    pub fn visit<'t, V: NodeVisitor<'t> + ?Sized>(&'t self, visitor: &mut V) {
        self.root().visit(visitor);
    }

    /// Per-state counts of the nodes reachable through visible parents.
    pub fn summary(&self) -> StateSummary {
        let mut counter = ReturnableVisitor::new(StateCountVisitor::default());
        self.visit(&mut counter);
        StateSummary {
            counts: counter.into_inner().into_counts(),
        }
    }

    /// One record per node reachable through visible parents, in
    /// pre-order. Covers the same nodes as [`summary`](Self::summary).
    pub fn changes(&self) -> Vec<ChangeRecord> {
        let mut records = Vec::new();
        let mut collect = |node: NodeRef<'_>, _: &mut visitor::Visit| {
            records.push(ChangeRecord::from(node));
        };
        self.visit(&mut ReturnableVisitor::new(&mut collect));
        records
    }
}

impl fmt::Debug for DiffTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffTree")
            .field("nodes", &self.nodes)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Borrowed view of one node.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t DiffTree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.nodes[self.id.0]
    }

    fn wrap(&self, id: NodeId) -> NodeRef<'t> {
        NodeRef {
            tree: self.tree,
            id,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t DiffTree {
        self.tree
    }

    pub fn path(&self) -> &'t Path {
        &self.data().path
    }

    pub fn state(&self) -> State {
        self.data().state
    }

    /// Runtime type of the compared value (working side if present).
    /// `None` when both sides were absent.
    pub fn value_type(&self) -> Option<&'t ValueType> {
        self.data().value_type.as_ref()
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.data().parent.map(|id| self.wrap(id))
    }

    pub fn is_root(&self) -> bool {
        self.data().parent.is_none()
    }

    pub fn is_added(&self) -> bool {
        self.state() == State::Added
    }

    pub fn is_removed(&self) -> bool {
        self.state() == State::Removed
    }

    pub fn is_changed(&self) -> bool {
        self.state() == State::Changed
    }

    pub fn is_untouched(&self) -> bool {
        self.state() == State::Untouched
    }

    pub fn is_ignored(&self) -> bool {
        self.state() == State::Ignored
    }

    pub fn is_circular(&self) -> bool {
        self.state() == State::Circular
    }

    /// Returns `true` unless the node is untouched or ignored.
    pub fn has_changes(&self) -> bool {
        self.state().is_change()
    }

    /// For circular nodes, the path of the ancestor that first held the
    /// same working object.
    pub fn circle_start_path(&self) -> Option<&'t Path> {
        self.data().circle_start.as_ref()
    }

    /// For circular nodes, the ancestor that first held the same working
    /// object.
    pub fn circle_start_node(&self) -> Option<NodeRef<'t>> {
        self.circle_start_path().and_then(|path| self.tree.get(path))
    }

    /// The direct child reached through `element`.
    pub fn child(&self, element: &Element) -> Option<NodeRef<'t>> {
        self.data().children.get(element).map(|id| self.wrap(*id))
    }

    /// The descendant (or this node) at the absolute `path`.
    pub fn get_child(&self, path: &Path) -> Option<NodeRef<'t>> {
        let own = self.path();
        if !own.is_prefix_of(path) {
            return None;
        }
        let mut current = *self;
        for element in &path.elements()[own.len()..] {
            current = current.child(element)?;
        }
        Some(current)
    }

    /// Every child, visible or not, in creation order.
    pub fn all_children(&self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        let tree = self.tree;
        self.data()
            .children
            .values()
            .map(move |id| NodeRef { tree, id: *id })
    }

    /// Number of children, visible or not.
    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    /// Visible children in creation order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        self.all_children().filter(NodeRef::is_returnable)
    }

    /// Returns `true` if at least one child is visible.
    pub fn has_children(&self) -> bool {
        self.children().next().is_some()
    }

    /// Whether this node is visible under the tree's filter.
    pub fn is_returnable(&self) -> bool {
        self.tree.filter.is_returnable(*self)
    }

    /// Resolve this node's path against `root`, which may be the working
    /// graph, the base graph, or any other graph of the same shape.
    ///
    /// Returns `None` if the path does not exist there.
    pub fn canonical_get(&self, root: &Value) -> Option<Value> {
        self.path().resolve(root, self.tree.introspector.as_ref())
    }

    /// Visit this node and its descendants depth-first, parents first.
    pub fn visit<V: NodeVisitor<'t> + ?Sized>(&self, visitor: &mut V) {
        visitor::walk(*self, visitor);
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("path", self.path())
            .field("state", &self.state())
            .field("children", &self.child_count())
            .finish()
    }
}

/// Per-state node counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StateSummary {
    counts: BTreeMap<State, usize>,
}

impl StateSummary {
    pub fn count(&self, state: State) -> usize {
        self.counts.get(&state).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Returns `true` if any counted node is added, removed, changed, or circular.
    pub fn has_changes(&self) -> bool {
        self.counts.iter().any(|(state, n)| state.is_change() && *n > 0)
    }
}

/// Flat, serializable description of one node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub path: String,
    pub state: State,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle_start: Option<String>,
}

impl From<NodeRef<'_>> for ChangeRecord {
    fn from(node: NodeRef<'_>) -> Self {
        Self {
            path: node.path().to_string(),
            state: node.state(),
            value_type: node.value_type().map(ToString::to_string),
            circle_start: node.circle_start_path().map(ToString::to_string),
        }
    }
}

#[derive(Debug)]
struct PendingNode {
    path: Path,
    state: Option<State>,
    value_type: Option<ValueType>,
    parent: Option<NodeId>,
    children: IndexMap<Element, NodeId>,
    circle_start: Option<Path>,
}

/// Arena under construction. Nodes are inserted parent first and settled
/// (given their final state) once their subtree is done.
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    nodes: Vec<PendingNode>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert the root (no `parent`) or a child of `parent` reached through
    /// `element`.
    pub(crate) fn insert(
        &mut self,
        parent: Option<NodeId>,
        element: Option<Element>,
        value_type: Option<ValueType>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let path = match (parent, element) {
            (Some(parent), Some(element)) => {
                let parent_node = &mut self.nodes[parent.0];
                let path = parent_node.path.child(element.clone());
                let previous = parent_node.children.insert(element, id);
                debug_assert!(previous.is_none(), "duplicate child element at {path}");
                path
            }
            _ => {
                debug_assert!(self.nodes.is_empty(), "second root inserted");
                Path::root()
            }
        };
        self.nodes.push(PendingNode {
            path,
            state: None,
            value_type,
            parent,
            children: IndexMap::new(),
            circle_start: None,
        });
        id
    }

    pub(crate) fn path(&self, id: NodeId) -> &Path {
        &self.nodes[id.0].path
    }

    /// Assign the final state of a node.
    pub(crate) fn settle(&mut self, id: NodeId, state: State) {
        let node = &mut self.nodes[id.0];
        debug_assert!(node.state.is_none(), "node {} settled twice", node.path);
        node.state = Some(state);
    }

    pub(crate) fn settle_circular(&mut self, id: NodeId, circle_start: Path) {
        self.nodes[id.0].circle_start = Some(circle_start);
        self.settle(id, State::Circular);
    }

    /// State of a container derived from its settled children.
    pub(crate) fn aggregate(&self, id: NodeId) -> State {
        let changed = self.nodes[id.0]
            .children
            .values()
            .filter_map(|child| self.nodes[child.0].state)
            .any(State::is_change);
        if changed {
            State::Changed
        } else {
            State::Untouched
        }
    }

    pub(crate) fn finish(self, filter: ReturnableFilter, introspector: Arc<dyn Introspector>) -> DiffTree {
        let nodes = self
            .nodes
            .into_iter()
            .map(|node| {
                debug_assert!(node.state.is_some(), "node {} never settled", node.path);
                NodeData {
                    path: node.path,
                    state: node.state.unwrap_or(State::Untouched),
                    value_type: node.value_type,
                    parent: node.parent,
                    children: node.children,
                    circle_start: node.circle_start,
                }
            })
            .collect();
        DiffTree {
            nodes,
            filter,
            introspector,
        }
    }
}
