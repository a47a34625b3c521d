use graphdiff_model::{Element, Value, ValueType};

use crate::engine::Walk;
use crate::error::DiffResult;
use crate::state::State;
use crate::tree::NodeId;

use super::{Differ, Outcome};

/// Compares ordered sequences.
///
/// Items are matched by equality: the n-th occurrence of an item on the
/// working side pairs with the n-th equal item on the base side, and the
/// pair is compared recursively under `[item#n]`. When both sequences hold
/// the same items at the same positions this is positional alignment.
/// Working items without a partner are added; base items without one are
/// removed.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequenceDiffer;

impl Differ for SequenceDiffer {
    fn name(&self) -> &str {
        "sequence"
    }

    fn accepts(&self, value_type: &ValueType) -> bool {
        *value_type == ValueType::Seq
    }

    fn compare(
        &self,
        walk: &mut Walk<'_>,
        node: NodeId,
        working: &Value,
        base: &Value,
    ) -> DiffResult<Outcome> {
        let (Value::Seq(working), Value::Seq(base)) = (working, base) else {
            return Ok(Outcome::Leaf(State::Changed));
        };

        let mut seen: Vec<(&Value, usize)> = Vec::new();
        for item in working {
            let occurrence = bump(&mut seen, item);
            let partner = nth_equal(base, item, occurrence).cloned();
            let element = Element::nth_item(item.clone(), occurrence);
            walk.descend(node, element, Some(item.clone()), partner)?;
        }

        let mut seen: Vec<(&Value, usize)> = Vec::new();
        for item in base {
            let occurrence = bump(&mut seen, item);
            if nth_equal(working, item, occurrence).is_none() {
                let element = Element::nth_item(item.clone(), occurrence);
                walk.descend(node, element, None, Some(item.clone()))?;
            }
        }
        Ok(Outcome::Composite)
    }
}

/// Occurrence index of `item` among the items counted so far.
fn bump<'v>(seen: &mut Vec<(&'v Value, usize)>, item: &'v Value) -> usize {
    match seen.iter_mut().find(|(v, _)| *v == item) {
        Some((_, count)) => {
            *count += 1;
            *count - 1
        }
        None => {
            seen.push((item, 1));
            0
        }
    }
}

fn nth_equal<'v>(items: &'v [Value], item: &Value, n: usize) -> Option<&'v Value> {
    items.iter().filter(|v| *v == item).nth(n)
}
