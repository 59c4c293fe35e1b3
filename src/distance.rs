//! Distance and score functions for dense vectors.
//!
//! QALSH answers Euclidean range queries, H2-ALSH ranks by inner product.
//! Both score candidates through the helpers here, so a length mismatch can
//! never produce a winning score.

use crate::simd;

/// L2 (Euclidean) distance, or `+inf` when the lengths differ.
#[inline]
#[must_use]
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    simd::l2_distance(a, b)
}

/// Inner product, or `-inf` when the lengths differ.
#[inline]
#[must_use]
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::NEG_INFINITY;
    }
    simd::dot(a, b)
}

/// Borrow row `idx` of a row-major matrix with stride `dimension`.
#[inline]
pub(crate) fn row(vectors: &[f32], dimension: usize, idx: usize) -> &[f32] {
    let start = idx * dimension;
    &vectors[start..start + dimension]
}
