use graphdiff_model::{Element, Value, ValueType};

use crate::engine::Walk;
use crate::error::DiffResult;
use crate::state::State;
use crate::tree::NodeId;

use super::{Differ, Outcome};

/// Compares beans member by member.
///
/// Members come from the comparison's introspector, in the order it
/// returns them, and each becomes a property child of the bean's node.
#[derive(Clone, Copy, Debug, Default)]
pub struct BeanDiffer;

impl Differ for BeanDiffer {
    fn name(&self) -> &str {
        "members"
    }

    fn accepts(&self, value_type: &ValueType) -> bool {
        matches!(value_type, ValueType::Bean(_))
    }

    fn compare(
        &self,
        walk: &mut Walk<'_>,
        node: NodeId,
        working: &Value,
        base: &Value,
    ) -> DiffResult<Outcome> {
        let (Some(working), Some(base)) = (working.as_bean(), base.as_bean()) else {
            return Ok(Outcome::Leaf(State::Changed));
        };
        if working.ptr_eq(base) {
            return Ok(Outcome::Leaf(State::Untouched));
        }

        let members = walk.introspector().members(&working.bean_type());
        for member in members {
            // Read both sides before descending; no bean lock is held
            // while the walk reaches back into the graph.
            let w = member.read(working);
            let b = member.read(base);
            walk.descend(node, Element::property(member.name()), w, b)?;
        }
        Ok(Outcome::Composite)
    }
}
