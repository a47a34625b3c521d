use graphdiff_model::{Value, ValueType};

use crate::config::PrimitiveDefaultMode;
use crate::engine::Walk;
use crate::error::DiffResult;
use crate::state::State;
use crate::tree::NodeId;

use super::{Differ, Outcome};

/// Compares by value equality without recursing.
///
/// Chosen automatically for primitives. When forced on a path it accepts
/// any type, which turns a bean or container into a single leaf.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueDiffer;

impl Differ for ValueDiffer {
    fn name(&self) -> &str {
        "value"
    }

    fn accepts(&self, value_type: &ValueType) -> bool {
        value_type.is_primitive()
    }

    fn accepts_forced(&self, _: &ValueType) -> bool {
        true
    }

    fn compare(
        &self,
        walk: &mut Walk<'_>,
        _: NodeId,
        working: &Value,
        base: &Value,
    ) -> DiffResult<Outcome> {
        if walk.config().primitive_defaults() == PrimitiveDefaultMode::Unassigned {
            match (working.is_default_primitive(), base.is_default_primitive()) {
                (true, true) => return Ok(Outcome::Leaf(State::Untouched)),
                (false, true) => return Ok(Outcome::Leaf(State::Added)),
                (true, false) => return Ok(Outcome::Leaf(State::Removed)),
                (false, false) => {}
            }
        }
        let state = if working == base {
            State::Untouched
        } else {
            State::Changed
        };
        Ok(Outcome::Leaf(state))
    }
}
