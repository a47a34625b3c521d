//! Error types for the comparison engine.

use graphdiff_model::{ModelError, Path, ValueType};

use crate::state::State;

/// Errors that can occur while configuring or running a comparison.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A return policy does not say whether some states are visible.
    #[error("return policy has no setting for states: {}", join_states(.missing))]
    IncompleteReturnPolicy {
        /// The states without a setting.
        missing: Vec<State>,
    },

    /// No strategy can compare the value found at a path.
    #[error("no strategy can compare values of type {value_type} at {path}")]
    UnsupportedType {
        /// Runtime type of the working (or base) value.
        value_type: ValueType,
        /// Location of the value.
        path: Path,
    },

    /// A forced custom strategy was never registered.
    #[error("strategy {name:?} forced at {path} is not registered")]
    UnknownStrategy {
        /// The requested strategy name.
        name: String,
        /// The path the strategy was forced on.
        path: Path,
    },

    /// Malformed path in configuration.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Malformed configuration document.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_states(states: &[State]) -> String {
    states
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias for comparison results.
pub type DiffResult<T> = Result<T, DiffError>;
