use std::collections::HashSet;

use graphdiff_model::{Element, Value, ValueType};

use crate::engine::Walk;
use crate::error::DiffResult;
use crate::state::State;
use crate::tree::NodeId;

use super::{Differ, Outcome};

/// Compares keyed maps entry by entry.
///
/// Entries are matched by key and compared recursively under `[key]`.
/// Working entries come first, in working order, followed by keys only
/// the base holds. When a key repeats, its first entry is used.
#[derive(Clone, Copy, Debug, Default)]
pub struct MappingDiffer;

impl Differ for MappingDiffer {
    fn name(&self) -> &str {
        "mapping"
    }

    fn accepts(&self, value_type: &ValueType) -> bool {
        *value_type == ValueType::Map
    }

    fn compare(
        &self,
        walk: &mut Walk<'_>,
        node: NodeId,
        working: &Value,
        base: &Value,
    ) -> DiffResult<Outcome> {
        let (Value::Map(working), Value::Map(base)) = (working, base) else {
            return Ok(Outcome::Leaf(State::Changed));
        };

        let mut emitted = HashSet::new();
        for (key, value) in working {
            if !emitted.insert(key) {
                continue;
            }
            let partner = lookup(base, key).cloned();
            walk.descend(node, Element::item(key.clone()), Some(value.clone()), partner)?;
        }
        for (key, value) in base {
            if emitted.insert(key) {
                walk.descend(node, Element::item(key.clone()), None, Some(value.clone()))?;
            }
        }
        Ok(Outcome::Composite)
    }
}

fn lookup<'m>(entries: &'m [(Value, Value)], key: &Value) -> Option<&'m Value> {
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}
