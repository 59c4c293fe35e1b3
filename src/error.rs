//! Error types for h2alsh.

use thiserror::Error;

/// Errors that can occur while building or querying an index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RetrieveError {
    /// A caller-supplied argument violates a precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Index built (or asked to be built) over zero vectors.
    #[error("index is empty")]
    EmptyIndex,

    /// Vector length does not match the index dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Allocation of index storage failed.
    #[error("allocation failed: {0}")]
    Allocation(String),
}

impl From<std::collections::TryReserveError> for RetrieveError {
    fn from(e: std::collections::TryReserveError) -> Self {
        Self::Allocation(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RetrieveError>;

/// Reject vectors carrying NaN or infinite components.
pub(crate) fn ensure_finite(values: &[f32], what: &str) -> Result<()> {
    if let Some(pos) = values.iter().position(|x| !x.is_finite()) {
        return Err(RetrieveError::InvalidArgument(format!(
            "{what} has a non-finite component at offset {pos}"
        )));
    }
    Ok(())
}
