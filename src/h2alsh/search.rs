//! H2-ALSH build and top-k MIP search.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distance::{inner_product, row};
use crate::error::ensure_finite;
use crate::h2alsh::partition::{
    compression_ratio, lift_point, lift_query, partition_by_norm, Block,
};
use crate::mips::{validate_query, MipsIndex};
use crate::qalsh::{Qalsh, QalshParams, SearchScratch, UNBOUNDED, DEFAULT_CANDIDATES};
use crate::simd;
use crate::topk::MaxK;
use crate::{Result, RetrieveError};

/// Default cap on points per shell.
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 25_000;

/// H2-ALSH configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct H2AlshParams {
    /// Approximation ratio `c > 1` of the per-shell NN search.
    pub nn_ratio: f32,
    /// MIP approximation ratio `c0`, with `0 < c0 < c⁴`.
    pub mip_ratio: f32,
    /// Largest number of points in one shell.
    pub max_block_size: usize,
    /// Candidate quota; shells at or below it are scanned linearly.
    pub candidates: usize,
    /// Master seed for every shell's projections. `None` draws one from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for H2AlshParams {
    fn default() -> Self {
        Self {
            nn_ratio: 2.0,
            mip_ratio: 0.5,
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            candidates: DEFAULT_CANDIDATES,
            seed: None,
        }
    }
}

impl H2AlshParams {
    pub fn new(nn_ratio: f32, mip_ratio: f32) -> Self {
        Self {
            nn_ratio,
            mip_ratio,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_max_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    #[must_use]
    pub fn with_candidates(mut self, candidates: usize) -> Self {
        self.candidates = candidates;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.nn_ratio.is_finite() && self.nn_ratio > 1.0) {
            return Err(RetrieveError::InvalidArgument(format!(
                "nn_ratio must be finite and > 1, got {}",
                self.nn_ratio
            )));
        }
        if !(self.mip_ratio.is_finite() && self.mip_ratio > 0.0) {
            return Err(RetrieveError::InvalidArgument(format!(
                "mip_ratio must be finite and > 0, got {}",
                self.mip_ratio
            )));
        }
        if f64::from(self.nn_ratio).powi(4) <= f64::from(self.mip_ratio) {
            return Err(RetrieveError::InvalidArgument(format!(
                "nn_ratio^4 must exceed mip_ratio, got nn_ratio={} mip_ratio={}",
                self.nn_ratio, self.mip_ratio
            )));
        }
        if self.max_block_size == 0 || self.candidates == 0 {
            return Err(RetrieveError::InvalidArgument(
                "max_block_size and candidates must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Per-query switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Stop at the first shell whose Cauchy-Schwarz bound cannot beat the k-th score.
    pub early_termination: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            early_termination: true,
        }
    }
}

/// Homocentric hypersphere partition index for approximate MIP search.
#[derive(Clone, Debug)]
pub struct H2Alsh {
    vectors: Vec<f32>,
    norms: Vec<f32>,
    dimension: usize,
    num_vectors: usize,
    params: H2AlshParams,
    compression: f32,
    max_norm: f32,
    blocks: Vec<Block>,
}

impl H2Alsh {
    /// Index `n` rows of the row-major `data` matrix.
    pub fn build(data: &[f32], n: usize, dimension: usize, params: H2AlshParams) -> Result<Self> {
        params.validate()?;
        if n == 0 {
            return Err(RetrieveError::EmptyIndex);
        }
        if dimension == 0 {
            return Err(RetrieveError::InvalidArgument(
                "dimension must be at least 1".into(),
            ));
        }
        if data.len() != n * dimension {
            return Err(RetrieveError::InvalidArgument(format!(
                "data holds {} values, expected {n} x {dimension}",
                data.len()
            )));
        }
        if n > u32::MAX as usize {
            return Err(RetrieveError::InvalidArgument(format!(
                "at most {} points can be indexed, got {n}",
                u32::MAX
            )));
        }
        ensure_finite(data, "data")?;

        let mut vectors = Vec::new();
        vectors.try_reserve_exact(data.len())?;
        vectors.extend_from_slice(data);

        let norms: Vec<f32> = (0..n).map(|i| simd::norm(row(data, dimension, i))).collect();
        if let Some(id) = norms.iter().position(|x| !x.is_finite()) {
            return Err(RetrieveError::InvalidArgument(format!(
                "norm of point {id} overflows"
            )));
        }
        let max_norm = norms.iter().copied().fold(0.0_f32, f32::max);
        let compression = compression_ratio(params.nn_ratio, params.mip_ratio);

        let seed = params.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);

        let shells = partition_by_norm(&norms, compression, params.candidates, params.max_block_size);
        let mut blocks = Vec::with_capacity(shells.len());
        let mut lifted = Vec::new();
        let mut point = Vec::with_capacity(dimension + 1);
        for (block_max, ids) in shells {
            let index = if ids.len() > params.candidates {
                let lifted_dim = dimension + 1;
                lifted.clear();
                lifted.try_reserve_exact(ids.len() * lifted_dim)?;
                for &id in &ids {
                    let i = id as usize;
                    lift_point(block_max, row(data, dimension, i), norms[i], &mut point);
                    lifted.extend_from_slice(&point);
                }
                let qalsh_params = QalshParams::with_ratio(params.nn_ratio)
                    .with_candidates(params.candidates)
                    .with_seed(rng.random());
                Some(Qalsh::build(&lifted, ids.len(), lifted_dim, qalsh_params)?)
            } else {
                None
            };
            blocks.push(Block {
                max_norm: block_max,
                ids,
                index,
            });
        }

        debug!(
            n,
            dimension,
            b = compression,
            max_norm,
            blocks = blocks.len(),
            indexed_blocks = blocks.iter().filter(|b| b.is_indexed()).count(),
            "built H2-ALSH index"
        );

        Ok(Self {
            vectors,
            norms,
            dimension,
            num_vectors: n,
            params,
            compression,
            max_norm,
            blocks,
        })
    }

    /// Approximate top-k inner products as `(id, score)`, highest first.
    pub fn kmip(&self, top_k: usize, query: &[f32]) -> Result<Vec<(u32, f32)>> {
        self.kmip_with(top_k, query, SearchOptions::default())
    }

    /// [`H2Alsh::kmip`] with explicit search options.
    pub fn kmip_with(
        &self,
        top_k: usize,
        query: &[f32],
        options: SearchOptions,
    ) -> Result<Vec<(u32, f32)>> {
        let norm_q = validate_query(query, self.dimension, top_k, self.num_vectors)?;

        let mut list = MaxK::new(top_k);
        let mut scratch = SearchScratch::new();
        let mut candidates = Vec::new();
        let mut lifted = Vec::with_capacity(self.dimension + 1);

        for block in &self.blocks {
            let kth = list.bound_key();
            // Blocks are in decreasing max_norm order, so no later block can do better.
            if options.early_termination && list.is_full() && block.max_norm * norm_q <= kth {
                break;
            }

            let Some(index) = &block.index else {
                for &id in &block.ids {
                    list.insert(self.score(query, id), id);
                }
                continue;
            };

            let lambda = block.max_norm / norm_q;
            lift_query(lambda, query, &mut lifted);
            let radius = if list.is_full() {
                let m2 = block.max_norm * block.max_norm;
                (2.0 * m2 - 2.0 * lambda * kth).max(0.0).sqrt()
            } else {
                UNBOUNDED
            };

            let block_k = top_k.min(block.len());
            index.search_with(&mut scratch, block_k, radius, &lifted, &mut candidates)?;
            for &local in &candidates {
                let id = block.ids[local as usize];
                list.insert(self.score(query, id), id);
            }
        }

        Ok(list.to_results())
    }

    #[inline]
    fn score(&self, query: &[f32], id: u32) -> f32 {
        inner_product(query, row(&self.vectors, self.dimension, id as usize))
    }

    /// Shells in decreasing `max_norm` order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Norm-ratio bound `b` used to cut shells.
    pub fn compression(&self) -> f32 {
        self.compression
    }

    /// Largest norm in the dataset.
    pub fn max_norm(&self) -> f32 {
        self.max_norm
    }

    /// Euclidean norm of every point, by id.
    pub fn norms(&self) -> &[f32] {
        &self.norms
    }

    pub fn params(&self) -> &H2AlshParams {
        &self.params
    }
}

impl MipsIndex for H2Alsh {
    fn kmip(&self, top_k: usize, query: &[f32]) -> Result<Vec<(u32, f32)>> {
        H2Alsh::kmip(self, top_k, query)
    }

    fn memory_usage(&self) -> usize {
        (self.vectors.len() + self.norms.len()) * std::mem::size_of::<f32>()
            + self.blocks.iter().map(Block::memory_usage).sum::<usize>()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn num_vectors(&self) -> usize {
        self.num_vectors
    }

    fn name(&self) -> &'static str {
        "H2-ALSH"
    }
}
