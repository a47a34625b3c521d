use std::collections::HashSet;

use graphdiff_model::{Element, Value, ValueType};

use crate::engine::Walk;
use crate::error::DiffResult;
use crate::state::State;
use crate::tree::NodeId;

use super::{Differ, Outcome};

/// Compares sets by membership.
///
/// An element in both sets is untouched and is not compared further. A
/// repeated element is compared once.
#[derive(Clone, Copy, Debug, Default)]
pub struct SetDiffer;

impl Differ for SetDiffer {
    fn name(&self) -> &str {
        "set"
    }

    fn accepts(&self, value_type: &ValueType) -> bool {
        *value_type == ValueType::Set
    }

    fn compare(
        &self,
        walk: &mut Walk<'_>,
        node: NodeId,
        working: &Value,
        base: &Value,
    ) -> DiffResult<Outcome> {
        let (Value::Set(working), Value::Set(base)) = (working, base) else {
            return Ok(Outcome::Leaf(State::Changed));
        };

        let mut emitted = HashSet::new();
        for item in working.iter().filter(|item| emitted.insert(*item)) {
            let element = Element::item(item.clone());
            if base.contains(item) {
                walk.record(node, element, State::Untouched, item.value_type());
            } else {
                walk.descend(node, element, Some(item.clone()), None)?;
            }
        }
        for item in base.iter().filter(|item| emitted.insert(*item)) {
            walk.descend(node, Element::item(item.clone()), None, Some(item.clone()))?;
        }
        Ok(Outcome::Composite)
    }
}
