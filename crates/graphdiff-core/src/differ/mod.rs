//! Comparison strategies and their registry.
//!
//! A [`Differ`] compares one pair of present values. Leaf strategies report
//! a state directly; container strategies create child nodes through the
//! [`Walk`] and let the engine derive the container's state from them.
//!
//! Selection is deterministic: a strategy forced on the path wins, then
//! registered custom strategies in registration order, then the built-in
//! strategy for the value's type.

mod bean;
mod mapping;
mod sequence;
mod set;
mod value;

use std::sync::Arc;

use graphdiff_model::{Path, Value, ValueType};

use crate::config::StrategyKind;
use crate::engine::Walk;
use crate::error::{DiffError, DiffResult};
use crate::state::State;
use crate::tree::NodeId;

pub use bean::BeanDiffer;
pub use mapping::MappingDiffer;
pub use sequence::SequenceDiffer;
pub use set::SetDiffer;
pub use value::ValueDiffer;

/// What a strategy concluded about a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The node's state, decided without children.
    Leaf(State),
    /// Children were created; the state follows from theirs.
    Composite,
}

/// A pluggable comparison strategy.
pub trait Differ: Send + Sync {
    /// Name used to force this strategy with [`StrategyKind::Custom`].
    fn name(&self) -> &str;

    /// Whether this strategy is chosen automatically for `value_type`.
    fn accepts(&self, value_type: &ValueType) -> bool;

    /// Whether this strategy can handle `value_type` when forced on a path.
    fn accepts_forced(&self, value_type: &ValueType) -> bool {
        self.accepts(value_type)
    }

    /// Compare two present values at `node`.
    fn compare(
        &self,
        walk: &mut Walk<'_>,
        node: NodeId,
        working: &Value,
        base: &Value,
    ) -> DiffResult<Outcome>;
}

/// The set of strategies available to a comparison.
#[derive(Clone)]
pub struct DifferRegistry {
    custom: Vec<Arc<dyn Differ>>,
    value: ValueDiffer,
    bean: BeanDiffer,
    sequence: SequenceDiffer,
    mapping: MappingDiffer,
    set: SetDiffer,
}

impl Default for DifferRegistry {
    fn default() -> Self {
        Self {
            custom: Vec::new(),
            value: ValueDiffer,
            bean: BeanDiffer,
            sequence: SequenceDiffer,
            mapping: MappingDiffer,
            set: SetDiffer,
        }
    }
}

impl std::fmt::Debug for DifferRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.custom.iter().map(|d| d.name()).collect();
        f.debug_struct("DifferRegistry").field("custom", &names).finish()
    }
}

impl DifferRegistry {
    /// A registry with the built-in strategies only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom strategy. It is consulted before the built-ins.
    pub fn register(&mut self, differ: Arc<dyn Differ>) {
        self.custom.push(differ);
    }

    fn builtin(&self, kind: &StrategyKind) -> Option<&dyn Differ> {
        match kind {
            StrategyKind::Value => Some(&self.value),
            StrategyKind::Members => Some(&self.bean),
            StrategyKind::Sequence => Some(&self.sequence),
            StrategyKind::Mapping => Some(&self.mapping),
            StrategyKind::Set => Some(&self.set),
            StrategyKind::Custom(_) => None,
        }
    }

    fn custom(&self, name: &str) -> Option<&dyn Differ> {
        self.custom.iter().find(|d| d.name() == name).map(|d| &**d)
    }

    /// Choose the strategy for a value of `value_type` at `path`.
    pub fn select(
        &self,
        path: &Path,
        value_type: &ValueType,
        forced: Option<&StrategyKind>,
    ) -> DiffResult<&dyn Differ> {
        let unsupported = || DiffError::UnsupportedType {
            value_type: value_type.clone(),
            path: path.clone(),
        };

        if let Some(kind) = forced {
            let differ = match kind {
                StrategyKind::Custom(name) => {
                    self.custom(name).ok_or_else(|| DiffError::UnknownStrategy {
                        name: name.clone(),
                        path: path.clone(),
                    })?
                }
                builtin => self.builtin(builtin).ok_or_else(unsupported)?,
            };
            return if differ.accepts_forced(value_type) {
                Ok(differ)
            } else {
                Err(unsupported())
            };
        }

        if let Some(differ) = self.custom.iter().find(|d| d.accepts(value_type)) {
            return Ok(&**differ);
        }

        let kind = match value_type {
            t if t.is_primitive() => StrategyKind::Value,
            ValueType::Bean(_) => StrategyKind::Members,
            ValueType::Seq => StrategyKind::Sequence,
            ValueType::Map => StrategyKind::Mapping,
            ValueType::Set => StrategyKind::Set,
            _ => return Err(unsupported()),
        };
        self.builtin(&kind).ok_or_else(unsupported)
    }
}
