//! Comparison outcome of a node.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DiffError;

/// The outcome recorded for one compared location.
///
/// A node's state is assigned exactly once while the tree is built and never
/// changes afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Present in the working graph only.
    Added,
    /// Present in the base graph only.
    Removed,
    /// Present in both and different.
    Changed,
    /// Present in both and equal, or absent in both.
    Untouched,
    /// The working value is already being compared higher up the chain.
    Circular,
    /// Excluded by configuration.
    Ignored,
}

impl State {
    /// Every state, in declaration order.
    pub const ALL: [State; 6] = [
        State::Added,
        State::Removed,
        State::Changed,
        State::Untouched,
        State::Circular,
        State::Ignored,
    ];

    /// Returns `true` for states that make an enclosing container `Changed`.
    pub fn is_change(self) -> bool {
        matches!(self, Self::Added | Self::Removed | Self::Changed | Self::Circular)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
            Self::Untouched => "untouched",
            Self::Circular => "circular",
            Self::Ignored => "ignored",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for State {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        State::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DiffError::Config(format!("unknown node state: {s:?}")))
    }
}
