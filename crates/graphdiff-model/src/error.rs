//! Error types for the model crate.

use thiserror::Error;

/// Errors produced by model operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid path {input:?}: {reason}")]
    InvalidPath { input: String, reason: String },
}

/// Convenience alias for model results.
pub type ModelResult<T> = Result<T, ModelError>;
