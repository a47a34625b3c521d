//! The traversal engine.
//!
//! [`ObjectDiffer::compare`] walks the working and base graphs in lock step
//! and builds a [`DiffTree`]. For every node the engine decides, in order:
//!
//! 1. ignored by path or type: `Ignored`, no descent;
//! 2. working bean already on the descent chain: `Circular`, no descent;
//! 3. one side absent: `Added` or `Removed`; both absent: `Untouched`;
//! 4. both present: the selected [`Differ`] either reports a leaf state or
//!    creates children, in which case the node is `Changed` if any child is
//!    added, removed, changed, or circular, and `Untouched` otherwise.
//!
//! A failing strategy fails the whole comparison; no partial tree is
//! returned.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use graphdiff_model::{DeclaredMembers, Element, Introspector, Path, Value, ValueType};

use crate::config::{DiffConfig, PrimitiveDefaultMode, ReturnPolicy, StrategyKind};
use crate::differ::{Differ, DifferRegistry, Outcome};
use crate::error::DiffResult;
use crate::filter::ReturnableFilter;
use crate::state::State;
use crate::tracker::CycleTracker;
use crate::tree::{DiffTree, NodeId, TreeBuilder};

/// Compares object graphs.
///
/// An `ObjectDiffer` holds only configuration; every call to
/// [`compare`](Self::compare) uses its own cycle tracker and tree, so one
/// differ can serve concurrent comparisons.
#[derive(Clone)]
pub struct ObjectDiffer {
    config: DiffConfig,
    registry: DifferRegistry,
    introspector: Arc<dyn Introspector>,
}

impl Default for ObjectDiffer {
    fn default() -> Self {
        Self {
            config: DiffConfig::default(),
            registry: DifferRegistry::default(),
            introspector: Arc::new(DeclaredMembers),
        }
    }
}

impl fmt::Debug for ObjectDiffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDiffer")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl ObjectDiffer {
    /// A differ with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ObjectDifferBuilder {
        ObjectDifferBuilder::default()
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Compare `working` against `base`. Either side may be absent.
    pub fn compare(&self, working: Option<&Value>, base: Option<&Value>) -> DiffResult<DiffTree> {
        debug!(
            working = ?working.map(graphdiff_model::Value::value_type),
            base = ?base.map(graphdiff_model::Value::value_type),
            "comparison started"
        );
        let mut walk = Walk {
            differ: self,
            tree: TreeBuilder::new(),
            tracker: CycleTracker::new(),
        };
        walk.node(None, None, working, base)?;
        debug_assert_eq!(walk.tracker.depth(), 0);

        let filter = ReturnableFilter::from_config(&self.config);
        let tree = walk.tree.finish(filter, Arc::clone(&self.introspector));
        debug!(nodes = tree.len(), state = %tree.root().state(), "comparison finished");
        Ok(tree)
    }

    /// Compare two present values.
    pub fn compare_values(&self, working: &Value, base: &Value) -> DiffResult<DiffTree> {
        self.compare(Some(working), Some(base))
    }
}

/// Builds an [`ObjectDiffer`].
#[derive(Default)]
pub struct ObjectDifferBuilder {
    config: DiffConfig,
    registry: DifferRegistry,
    introspector: Option<Arc<dyn Introspector>>,
}

impl ObjectDifferBuilder {
    /// Start from an existing configuration, such as one loaded from TOML.
    pub fn with_config(mut self, config: DiffConfig) -> Self {
        self.config = config;
        self
    }

    pub fn ignore_path(mut self, path: Path) -> Self {
        self.config.ignore_path(path);
        self
    }

    /// Ignore every value whose type name is `type_name`.
    pub fn ignore_type(mut self, type_name: impl Into<String>) -> Self {
        self.config.ignore_type(type_name);
        self
    }

    pub fn force_strategy(mut self, path: Path, strategy: StrategyKind) -> Self {
        self.config.force_strategy(path, strategy);
        self
    }

    /// Show or hide `state` at exactly `path`, regardless of the policy.
    pub fn return_state_at(mut self, path: Path, state: State, enabled: bool) -> Self {
        self.config.return_state_at(path, state, enabled);
        self
    }

    pub fn with_return_policy(mut self, policy: ReturnPolicy) -> Self {
        self.config.set_return_policy(policy);
        self
    }

    pub fn with_primitive_defaults(mut self, mode: PrimitiveDefaultMode) -> Self {
        self.config.set_primitive_defaults(mode);
        self
    }

    pub fn with_introspector(mut self, introspector: Arc<dyn Introspector>) -> Self {
        self.introspector = Some(introspector);
        self
    }

    /// Register a custom strategy. Custom strategies are consulted in
    /// registration order, before the built-ins.
    pub fn with_differ(mut self, differ: impl Differ + 'static) -> Self {
        self.registry.register(Arc::new(differ));
        self
    }

    pub fn build(self) -> ObjectDiffer {
        ObjectDiffer {
            config: self.config,
            registry: self.registry,
            introspector: self.introspector.unwrap_or_else(|| Arc::new(DeclaredMembers)),
        }
    }
}

/// State of one comparison in progress, handed to strategies so they can
/// create child nodes.
pub struct Walk<'a> {
    differ: &'a ObjectDiffer,
    tree: TreeBuilder,
    tracker: CycleTracker,
}

impl<'a> Walk<'a> {
    pub fn config(&self) -> &'a DiffConfig {
        &self.differ.config
    }

    pub fn introspector(&self) -> &'a dyn Introspector {
        self.differ.introspector.as_ref()
    }

    /// Path of a node created during this walk.
    pub fn path(&self, node: NodeId) -> &Path {
        self.tree.path(node)
    }

    /// Compare `working` against `base` as the child of `parent` reached
    /// through `element`.
    pub fn descend(
        &mut self,
        parent: NodeId,
        element: Element,
        working: Option<Value>,
        base: Option<Value>,
    ) -> DiffResult<NodeId> {
        self.node(Some(parent), Some(element), working.as_ref(), base.as_ref())
    }

    /// Create a child whose state is already known, without descending.
    /// The child is still marked `Ignored` if configuration says so.
    pub fn record(
        &mut self,
        parent: NodeId,
        element: Element,
        state: State,
        value_type: ValueType,
    ) -> NodeId {
        let id = self.tree.insert(Some(parent), Some(element), Some(value_type.clone()));
        let state = if self.config().is_ignored(self.tree.path(id), Some(&value_type)) {
            State::Ignored
        } else {
            state
        };
        self.tree.settle(id, state);
        id
    }

    fn node(
        &mut self,
        parent: Option<NodeId>,
        element: Option<Element>,
        working: Option<&Value>,
        base: Option<&Value>,
    ) -> DiffResult<NodeId> {
        let value_type = working.or(base).map(Value::value_type);
        let id = self.tree.insert(parent, element, value_type.clone());
        let path = self.tree.path(id).clone();

        if self.config().is_ignored(&path, value_type.as_ref()) {
            self.tree.settle(id, State::Ignored);
            return Ok(id);
        }

        if let Some(identity) = working.and_then(Value::identity) {
            if let Some(start) = self.tracker.circle_start(identity) {
                debug!(path = %path, circle_start = %start, "circular reference truncated");
                let start = start.clone();
                self.tree.settle_circular(id, start);
                return Ok(id);
            }
        }

        let state = match (working, base) {
            (Some(working), Some(base)) => self.compare_present(id, &path, working, base)?,
            (Some(_), None) => State::Added,
            (None, Some(_)) => State::Removed,
            (None, None) => State::Untouched,
        };
        self.tree.settle(id, state);
        Ok(id)
    }

    fn compare_present(
        &mut self,
        id: NodeId,
        path: &Path,
        working: &Value,
        base: &Value,
    ) -> DiffResult<State> {
        let differ = self.differ;
        let forced = differ.config.forced_strategy(path);
        let value_type = working.value_type();
        if forced.is_none() && value_type != base.value_type() {
            return Ok(State::Changed);
        }

        let strategy = differ.registry.select(path, &value_type, forced)?;
        trace!(path = %path, strategy = strategy.name(), "strategy selected");

        let identity = working.identity();
        if let Some(identity) = identity {
            self.tracker.push(identity, path.clone());
        }
        let outcome = strategy.compare(self, id, working, base);
        if identity.is_some() {
            self.tracker.pop();
        }

        Ok(match outcome? {
            Outcome::Leaf(state) => state,
            Outcome::Composite => self.tree.aggregate(id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitor::Visit;
    use crate::{DiffError, NodeRef};
    use graphdiff_model::{Bean, BeanRef, BeanType};
    use proptest::prelude::*;

    fn node_type() -> Arc<BeanType> {
        BeanType::new("Node").member("id").member("reference").shared()
    }

    /// Beans `ids[0] -> ids[1] -> ... -> ids[0]`.
    fn ring(ids: &[&str]) -> Vec<BeanRef> {
        let ty = node_type();
        let beans: Vec<BeanRef> = ids
            .iter()
            .map(|id| Bean::new(ty.clone()).with("id", *id).into_ref())
            .collect();
        for (i, bean) in beans.iter().enumerate() {
            bean.set("reference", beans[(i + 1) % beans.len()].clone());
        }
        beans
    }

    fn break_ring(beans: &[BeanRef]) {
        for bean in beans {
            bean.write().unset("reference");
        }
    }

    fn refs(n: usize) -> Path {
        Path::properties(std::iter::repeat("reference").take(n))
    }

    fn all_nodes(tree: &DiffTree) -> Vec<(Path, NodeId, State)> {
        let mut out = Vec::new();
        tree.visit(&mut |node: NodeRef<'_>, _: &mut Visit| {
            out.push((node.path().clone(), node.id(), node.state()));
        });
        out
    }

    #[test]
    fn two_node_ring_is_truncated_at_the_root() {
        let working = ring(&["a", "b"]);
        let base = ring(&["a", "c"]);
        let (w, b) = (Value::from(working[0].clone()), Value::from(base[0].clone()));
        let tree = ObjectDiffer::new().compare_values(&w, &b).unwrap();

        let circular = tree.get(&refs(2)).unwrap();
        assert!(circular.is_circular());
        assert_eq!(circular.circle_start_path(), Some(&Path::root()));
        assert_eq!(circular.circle_start_node(), Some(tree.root()));
        assert_eq!(circular.child_count(), 0);

        assert!(tree.root().is_changed());
        assert!(tree.get(&refs(1)).unwrap().is_changed());
        let id = Path::builder().property("reference").property("id").build();
        assert!(tree.get(&id).unwrap().is_changed());

        let at_root = tree.root().canonical_get(&w).unwrap();
        let at_circle = circular.canonical_get(&w).unwrap();
        assert!(at_root.as_bean().unwrap().ptr_eq(at_circle.as_bean().unwrap()));
        assert!(circular
            .canonical_get(&b)
            .unwrap()
            .as_bean()
            .unwrap()
            .ptr_eq(&base[0]));

        break_ring(&working);
        break_ring(&base);
    }

    #[test]
    fn three_node_ring() {
        let working = ring(&["a", "b", "c"]);
        let base = ring(&["a", "b", "d"]);
        let tree = ObjectDiffer::new()
            .compare(Some(&working[0].clone().into()), Some(&base[0].clone().into()))
            .unwrap();

        let circular = tree.get(&refs(3)).unwrap();
        assert!(circular.is_circular());
        assert_eq!(circular.circle_start_path(), Some(&Path::root()));
        assert!(tree.get(&refs(2)).unwrap().is_changed());
        assert!(tree.root().is_changed());

        break_ring(&working);
        break_ring(&base);
    }

    #[test]
    fn chain_without_repeat_has_no_circular_node() {
        let ty = node_type();
        let w_b = Bean::new(ty.clone()).with("id", "b");
        let b_c = Bean::new(ty.clone()).with("id", "c");
        let working: Value = Bean::new(ty.clone()).with("id", "a").with("reference", w_b).into();
        let base: Value = Bean::new(ty).with("id", "a").with("reference", b_c).into();

        let tree = ObjectDiffer::new().compare_values(&working, &base).unwrap();
        assert!(tree.root().is_changed());
        assert!(tree.get(&refs(1)).unwrap().is_changed());
        assert!(all_nodes(&tree).iter().all(|(_, _, s)| *s != State::Circular));
        assert!(tree.get(&refs(2)).unwrap().is_untouched());
    }

    #[test]
    fn shared_child_is_compared_on_every_branch() {
        let leaf = BeanType::new("Leaf").member("v").shared();
        let top = BeanType::new("Top").member("left").member("right").shared();
        let make = |v: i64| -> Value {
            let shared = Bean::new(leaf.clone()).with("v", v).into_ref();
            Bean::new(top.clone()).with("left", shared.clone()).with("right", shared).into()
        };
        let tree = ObjectDiffer::new().compare_values(&make(1), &make(2)).unwrap();

        assert_eq!(tree.len(), 5);
        for side in ["left", "right"] {
            assert!(tree.get(&Path::properties([side])).unwrap().is_changed());
            assert!(tree.get(&Path::properties([side, "v"])).unwrap().is_changed());
        }
        assert!(all_nodes(&tree).iter().all(|(_, _, s)| *s != State::Circular));
    }

    #[test]
    fn absence_is_symmetric() {
        let differ = ObjectDiffer::new();
        let x = Value::from(7);
        assert_eq!(differ.compare(Some(&x), None).unwrap().root().state(), State::Added);
        assert_eq!(differ.compare(None, Some(&x)).unwrap().root().state(), State::Removed);

        let tree = differ.compare(None, None).unwrap();
        assert_eq!(tree.root().state(), State::Untouched);
        assert_eq!(tree.len(), 1);
        assert!(tree.root().value_type().is_none());
    }

    #[test]
    fn removed_value_keeps_base_type() {
        let tree = ObjectDiffer::new().compare(None, Some(&Value::text("x"))).unwrap();
        assert_eq!(tree.root().value_type(), Some(&ValueType::Text));
    }

    fn order(city: &str) -> Value {
        let address = BeanType::new("Address").member("city").member("zip").shared();
        let customer = BeanType::new("Customer").member("name").member("address").shared();
        let order = BeanType::new("Order").member("number").member("customer").shared();
        let address = Bean::new(address).with("city", city).with("zip", "1000");
        let customer = Bean::new(customer).with("name", "ann").with("address", address);
        Bean::new(order).with("number", 1).with("customer", customer).into()
    }

    #[test]
    fn one_deep_change_marks_every_ancestor() {
        let tree = ObjectDiffer::new()
            .compare_values(&order("Oslo"), &order("Bergen"))
            .unwrap();
        let city = tree
            .get(&Path::properties(["customer", "address", "city"]))
            .unwrap();
        assert!(city.is_changed());
        let mut node = city.parent();
        while let Some(ancestor) = node {
            assert!(ancestor.is_changed(), "{:?}", ancestor.path());
            node = ancestor.parent();
        }
        assert!(tree.get(&Path::properties(["customer", "name"])).unwrap().is_untouched());
        assert!(tree.get(&Path::properties(["number"])).unwrap().is_untouched());
    }

    #[test]
    fn every_node_is_found_by_its_path() {
        let tree = ObjectDiffer::new()
            .compare_values(&order("Oslo"), &order("Bergen"))
            .unwrap();
        let nodes = all_nodes(&tree);
        assert_eq!(nodes.len(), tree.len());
        for (path, id, _) in nodes {
            assert_eq!(tree.get(&path).map(|n| n.id()), Some(id));
        }
    }

    #[test]
    fn ignored_paths_are_not_descended() {
        let differ = ObjectDiffer::builder()
            .ignore_path(Path::properties(["customer", "address"]))
            .build();
        let tree = differ.compare_values(&order("Oslo"), &order("Bergen")).unwrap();
        let address = tree.get(&Path::properties(["customer", "address"])).unwrap();
        assert!(address.is_ignored());
        assert_eq!(address.child_count(), 0);

        // The customer node has children but no changes left.
        let customer = tree.get(&Path::properties(["customer"])).unwrap();
        assert!(customer.is_untouched());
        assert!(customer.is_returnable());
        assert!(!customer.has_children());
        assert!(tree.root().is_untouched());
    }

    #[test]
    fn ignored_types_are_not_descended() {
        let differ = ObjectDiffer::builder().ignore_type("Address").build();
        let tree = differ.compare_values(&order("Oslo"), &order("Bergen")).unwrap();
        assert!(tree
            .get(&Path::properties(["customer", "address"]))
            .unwrap()
            .is_ignored());
        assert!(!tree.root().has_changes());
    }

    #[test]
    fn unassigned_defaults_inside_beans() {
        let ty = BeanType::new("Counter").member("hits").shared();
        let working: Value = Bean::new(ty.clone()).with("hits", 5).into();
        let base: Value = Bean::new(ty).with("hits", 0).into();
        let differ = ObjectDiffer::builder()
            .with_primitive_defaults(PrimitiveDefaultMode::Unassigned)
            .build();
        let tree = differ.compare_values(&working, &base).unwrap();
        assert!(tree.get(&Path::properties(["hits"])).unwrap().is_added());
        assert!(tree.root().is_changed());

        let tree = ObjectDiffer::new().compare_values(&working, &base).unwrap();
        assert!(tree.get(&Path::properties(["hits"])).unwrap().is_changed());
    }

    #[test]
    fn type_mismatch_is_a_change() {
        let tree = ObjectDiffer::new()
            .compare_values(&Value::from(1), &Value::text("1"))
            .unwrap();
        assert!(tree.root().is_changed());
        assert_eq!(tree.root().value_type(), Some(&ValueType::Int));
    }

    fn with_handle(handle: u32) -> Value {
        let ty = BeanType::new("Device").member("handle").shared();
        Bean::new(ty).with("handle", Value::opaque("Handle", handle)).into()
    }

    #[test]
    fn opaque_values_fail_the_whole_comparison() {
        let err = ObjectDiffer::new()
            .compare_values(&with_handle(1), &with_handle(2))
            .unwrap_err();
        match err {
            DiffError::UnsupportedType { value_type, path } => {
                assert_eq!(value_type, ValueType::Opaque("Handle".into()));
                assert_eq!(path, Path::properties(["handle"]));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    struct HandleDiffer;

    impl Differ for HandleDiffer {
        fn name(&self) -> &str {
            "handle"
        }

        fn accepts(&self, value_type: &ValueType) -> bool {
            *value_type == ValueType::Opaque("Handle".into())
        }

        fn compare(&self, _: &mut Walk<'_>, _: NodeId, w: &Value, b: &Value) -> DiffResult<Outcome> {
            let payload = |v: &Value| match v {
                Value::Opaque(o) => o.downcast_ref::<u32>().copied(),
                _ => None,
            };
            let same = payload(w) == payload(b);
            Ok(Outcome::Leaf(if same { State::Untouched } else { State::Changed }))
        }
    }

    #[test]
    fn custom_differ_handles_opaque_values() {
        let differ = ObjectDiffer::builder().with_differ(HandleDiffer).build();
        let tree = differ.compare_values(&with_handle(1), &with_handle(2)).unwrap();
        assert!(tree.get(&Path::properties(["handle"])).unwrap().is_changed());
        let tree = differ.compare_values(&with_handle(3), &with_handle(3)).unwrap();
        assert!(tree.root().is_untouched());
    }

    #[test]
    fn forcing_an_unregistered_strategy_fails() {
        let differ = ObjectDiffer::builder()
            .force_strategy(Path::properties(["number"]), StrategyKind::Custom("nope".into()))
            .build();
        let err = differ.compare_values(&order("a"), &order("b")).unwrap_err();
        assert!(matches!(err, DiffError::UnknownStrategy { .. }));
    }

    #[test]
    fn forced_value_strategy_collapses_a_subtree() {
        let differ = ObjectDiffer::builder()
            .force_strategy(Path::properties(["customer"]), StrategyKind::Value)
            .build();
        let tree = differ.compare_values(&order("Oslo"), &order("Bergen")).unwrap();
        let customer = tree.get(&Path::properties(["customer"])).unwrap();
        assert_eq!(customer.child_count(), 0);
        // Unkeyed beans compare by identity, and these are distinct instances.
        assert!(customer.is_changed());
    }

    #[test]
    fn forced_strategy_on_wrong_type_fails() {
        let differ = ObjectDiffer::builder()
            .force_strategy(Path::properties(["number"]), StrategyKind::Set)
            .build();
        let err = differ.compare_values(&order("a"), &order("a")).unwrap_err();
        assert!(matches!(err, DiffError::UnsupportedType { .. }));
    }

    #[test]
    fn differ_is_reusable_and_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ObjectDiffer>();

        let differ = ObjectDiffer::new();
        let working = ring(&["a", "b"]);
        let w = Value::from(working[0].clone());
        let first = differ.compare_values(&w, &w).unwrap().len();
        let second = differ.compare_values(&w, &w).unwrap().len();
        assert_eq!(first, second);
        break_ring(&working);
    }

    proptest! {
        #[test]
        fn rings_terminate_and_round_trip(len in 1usize..6, odd in 0usize..6) {
            let ids: Vec<String> = (0..len).map(|i| format!("n{i}")).collect();
            let mut base_ids = ids.clone();
            base_ids[odd % len] = "other".to_string();

            let w_ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            let b_ids: Vec<&str> = base_ids.iter().map(String::as_str).collect();
            let working = ring(&w_ids);
            let base = ring(&b_ids);

            let tree = ObjectDiffer::new()
                .compare_values(&working[0].clone().into(), &base[0].clone().into())
                .unwrap();

            let root = Path::root();
            let circular = tree.get(&refs(len)).unwrap();
            prop_assert!(circular.is_circular());
            prop_assert_eq!(circular.circle_start_path(), Some(&root));
            prop_assert!(tree.root().is_changed());
            // Each bean adds its own node and an id node.
            prop_assert_eq!(tree.len(), 2 * len + 1);

            for (path, id, _) in all_nodes(&tree) {
                prop_assert_eq!(tree.get(&path).map(|n| n.id()), Some(id));
            }

            break_ring(&working);
            break_ring(&base);
        }
    }
}
