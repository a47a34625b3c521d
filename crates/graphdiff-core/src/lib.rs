//! Object graph comparison engine.
//!
//! Compares a working and a base version of an object graph and builds a
//! tree that explains every difference, addressed by [`Path`]. Circular
//! references terminate in `Circular` nodes instead of endless descent.
//!
//! # Key Types
//!
//! - [`ObjectDiffer`] / [`ObjectDifferBuilder`] -- Entry point and its configuration
//! - [`DiffTree`] / [`NodeRef`] -- The frozen result tree and its node view
//! - [`State`] -- Outcome at a node (added, removed, changed, untouched, circular, ignored)
//! - [`Differ`] / [`DifferRegistry`] -- Pluggable comparison strategies
//! - [`ReturnableFilter`] / [`ReturnPolicy`] -- Which nodes are visible to queries
//! - [`NodeVisitor`] -- Read-only traversal of a result tree
//!
//! # Example
//!
//! ```
//! use graphdiff_core::{ObjectDiffer, State};
//! use graphdiff_model::{Bean, BeanType, Path, Value};
//!
//! let ty = BeanType::new("Person").member("name").member("age").shared();
//! let working: Value = Bean::new(ty.clone()).with("name", "ann").with("age", 31).into();
//! let base: Value = Bean::new(ty).with("name", "ann").with("age", 30).into();
//!
//! let tree = ObjectDiffer::new().compare(Some(&working), Some(&base)).unwrap();
//! assert_eq!(tree.root().state(), State::Changed);
//! assert!(tree.get(&Path::properties(["age"])).unwrap().is_changed());
//! ```
//!
//! [`Path`]: graphdiff_model::Path

pub mod config;
pub mod differ;
pub mod engine;
pub mod error;
pub mod filter;
pub mod state;
pub mod tracker;
pub mod tree;
pub mod visitor;

pub use config::{DiffConfig, PathOverrides, PrimitiveDefaultMode, ReturnPolicy, StrategyKind};
pub use differ::{
    BeanDiffer, Differ, DifferRegistry, MappingDiffer, Outcome, SequenceDiffer, SetDiffer,
    ValueDiffer,
};
pub use engine::{ObjectDiffer, ObjectDifferBuilder, Walk};
pub use error::{DiffError, DiffResult};
pub use filter::ReturnableFilter;
pub use state::State;
pub use tracker::CycleTracker;
pub use tree::{ChangeRecord, DiffTree, NodeId, NodeRef, StateSummary};
pub use visitor::{NodeVisitor, PathVisitor, ReturnableVisitor, StateCountVisitor, Visit};
