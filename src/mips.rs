//! Shared contract for maximum inner product search indexes.

use crate::error::ensure_finite;
use crate::simd;
use crate::{Result, RetrieveError};

/// A built index answering top-k maximum inner product queries.
///
/// Every MIP reduction (H2-ALSH, the exact linear scan, or a coordinate
/// transform in front of another ANN engine) answers through this trait, so
/// a benchmark harness can drive them interchangeably.
pub trait MipsIndex {
    /// Top-k `(id, inner_product)` pairs, highest score first, at most `top_k` long.
    fn kmip(&self, top_k: usize, query: &[f32]) -> Result<Vec<(u32, f32)>>;

    /// Bytes owned by the index (reporting only).
    fn memory_usage(&self) -> usize;

    fn dimension(&self) -> usize;

    fn num_vectors(&self) -> usize;

    /// Short algorithm name for reports.
    fn name(&self) -> &'static str;
}

/// Check a MIP query and return its norm.
pub(crate) fn validate_query(
    query: &[f32],
    dimension: usize,
    top_k: usize,
    num_vectors: usize,
) -> Result<f32> {
    if top_k == 0 || top_k > num_vectors {
        return Err(RetrieveError::InvalidArgument(format!(
            "top_k must be in 1..={num_vectors}, got {top_k}"
        )));
    }
    if query.len() != dimension {
        return Err(RetrieveError::DimensionMismatch {
            expected: dimension,
            actual: query.len(),
        });
    }
    ensure_finite(query, "query")?;

    let norm = simd::norm(query);
    if !(norm.is_finite() && norm > 0.0) {
        return Err(RetrieveError::InvalidArgument(format!(
            "query norm must be positive and finite, got {norm}"
        )));
    }
    Ok(norm)
}
