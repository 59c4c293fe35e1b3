//! Exact top-k inner product search by linear scan.

use crate::distance::{inner_product, row};
use crate::error::ensure_finite;
use crate::mips::{validate_query, MipsIndex};
use crate::topk::MaxK;
use crate::{Result, RetrieveError};

/// Brute-force baseline: scores every vector.
#[derive(Clone, Debug)]
pub struct LinearScan {
    vectors: Vec<f32>,
    dimension: usize,
    num_vectors: usize,
}

impl LinearScan {
    pub fn new(data: &[f32], n: usize, dimension: usize) -> Result<Self> {
        if n == 0 {
            return Err(RetrieveError::EmptyIndex);
        }
        if dimension == 0 || data.len() != n * dimension {
            return Err(RetrieveError::InvalidArgument(format!(
                "data holds {} values, expected {n} x {dimension}",
                data.len()
            )));
        }
        ensure_finite(data, "data")?;

        let mut vectors = Vec::new();
        vectors.try_reserve_exact(data.len())?;
        vectors.extend_from_slice(data);
        Ok(Self {
            vectors,
            dimension,
            num_vectors: n,
        })
    }
}

impl MipsIndex for LinearScan {
    fn kmip(&self, top_k: usize, query: &[f32]) -> Result<Vec<(u32, f32)>> {
        validate_query(query, self.dimension, top_k, self.num_vectors)?;

        let mut list = MaxK::new(top_k);
        for i in 0..self.num_vectors {
            list.insert(inner_product(query, row(&self.vectors, self.dimension, i)), i as u32);
        }
        Ok(list.to_results())
    }

    fn memory_usage(&self) -> usize {
        self.vectors.len() * std::mem::size_of::<f32>()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn num_vectors(&self) -> usize {
        self.num_vectors
    }

    fn name(&self) -> &'static str {
        "Linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_inner_product() {
        let data = [1.0_f32, 0.0, 0.0, 2.0, 3.0, 3.0, -1.0, -1.0];
        let index = LinearScan::new(&data, 4, 2).unwrap();
        let results = index.kmip(2, &[1.0, 1.0]).unwrap();
        assert_eq!(results, vec![(2, 6.0), (1, 2.0)]);
    }

    #[test]
    fn rejects_mismatched_data() {
        assert!(LinearScan::new(&[1.0, 2.0, 3.0], 2, 2).is_err());
        assert_eq!(
            LinearScan::new(&[], 0, 2).unwrap_err(),
            RetrieveError::EmptyIndex
        );
    }
}
