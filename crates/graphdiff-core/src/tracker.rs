//! Circular reference detection.
//!
//! The tracker holds the chain of working-side bean identities currently
//! being compared, each with the path where it entered the chain. The engine
//! pushes before descending into a bean and pops when that descent ends,
//! whether it succeeded or failed. Base-side identities are not tracked.

use graphdiff_model::{Identity, Path};

/// Identities on the active descent chain.
///
/// One tracker serves exactly one comparison.
#[derive(Debug, Default)]
pub struct CycleTracker {
    chain: Vec<(Identity, Path)>,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `identity` as being compared at `path`.
    pub fn push(&mut self, identity: Identity, path: Path) {
        debug_assert!(!self.contains(identity), "identity {identity} pushed twice");
        self.chain.push((identity, path));
    }

    /// Remove the most recently pushed identity.
    pub fn pop(&mut self) -> Option<(Identity, Path)> {
        self.chain.pop()
    }

    pub fn contains(&self, identity: Identity) -> bool {
        self.chain.iter().any(|(id, _)| *id == identity)
    }

    /// The path where `identity` entered the chain, if it is on it.
    pub fn circle_start(&self, identity: Identity) -> Option<&Path> {
        self.chain
            .iter()
            .find(|(id, _)| *id == identity)
            .map(|(_, path)| path)
    }

    /// Length of the active chain.
    pub fn depth(&self) -> usize {
        self.chain.len()
    }
}
