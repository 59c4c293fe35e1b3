//! Plain c-k-ANN search on top of the QALSH engine.

use crate::distance::{l2_distance, row};
use crate::error::ensure_finite;
use crate::qalsh::params::QalshParams;
use crate::qalsh::search::{Qalsh, SearchScratch, UNBOUNDED};
use crate::topk::MinK;
use crate::{Result, RetrieveError};

/// QALSH index that owns its vectors and re-ranks candidates by exact L2 distance.
#[derive(Clone, Debug)]
pub struct QalshIndex {
    vectors: Vec<f32>,
    dimension: usize,
    num_vectors: usize,
    engine: Qalsh,
}

impl QalshIndex {
    /// Build over `n` rows of the row-major `data` matrix.
    pub fn build(data: &[f32], n: usize, dimension: usize, params: QalshParams) -> Result<Self> {
        let engine = Qalsh::build(data, n, dimension, params)?;
        let mut vectors = Vec::new();
        vectors.try_reserve_exact(data.len())?;
        vectors.extend_from_slice(data);
        Ok(Self {
            vectors,
            dimension,
            num_vectors: n,
            engine,
        })
    }

    /// Approximate `k` nearest neighbors as `(id, distance)`, nearest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(u32, f32)>> {
        let mut scratch = SearchScratch::new();
        self.search_with(&mut scratch, query, k)
    }

    /// Same as [`QalshIndex::search`], reusing caller-owned scratch.
    pub fn search_with(
        &self,
        scratch: &mut SearchScratch,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<(u32, f32)>> {
        if k == 0 || k > self.num_vectors {
            return Err(RetrieveError::InvalidArgument(format!(
                "k must be in 1..={}, got {k}",
                self.num_vectors
            )));
        }
        if query.len() != self.dimension {
            return Err(RetrieveError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        ensure_finite(query, "query")?;

        let mut candidates = Vec::with_capacity(self.engine.quota(k));
        self.engine
            .search_with(scratch, k, UNBOUNDED, query, &mut candidates)?;

        let mut list = MinK::new(k);
        for id in candidates {
            let dist = l2_distance(query, row(&self.vectors, self.dimension, id as usize));
            list.insert(dist, id);
        }
        Ok(list.to_results())
    }

    pub fn engine(&self) -> &Qalsh {
        &self.engine
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn num_vectors(&self) -> usize {
        self.num_vectors
    }

    /// Bytes owned by the vectors and hash tables.
    pub fn memory_usage(&self) -> usize {
        self.vectors.len() * std::mem::size_of::<f32>() + self.engine.memory_usage()
    }
}
