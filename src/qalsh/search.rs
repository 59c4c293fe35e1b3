//! QALSH build and dynamic collision counting search.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::error::ensure_finite;
use crate::qalsh::params::{HashParams, QalshParams};
use crate::qalsh::table::HashTable;
use crate::{Result, RetrieveError};

/// Radius limit meaning "no a priori bound": only the candidate quota stops a query.
pub const UNBOUNDED: f32 = f32::INFINITY;

/// (R, c)-approximate range search over Euclidean space.
///
/// Immutable after [`Qalsh::build`]. Per-query state lives in a
/// [`SearchScratch`], so one index can serve concurrent queries as long as
/// each caller brings its own scratch.
#[derive(Clone, Debug)]
pub struct Qalsh {
    num_points: usize,
    dimension: usize,
    params: QalshParams,
    hash: HashParams,
    tables: Vec<HashTable>,
}

/// Reusable per-query state.
#[derive(Clone, Debug, Default)]
pub struct SearchScratch {
    freq: Vec<u32>,
    checked: Vec<bool>,
    query_keys: Vec<f32>,
    /// Entries `[0, left[j])` of table `j` are still unvisited on the left side.
    left: Vec<usize>,
    /// Entries `[right[j], n)` of table `j` are still unvisited on the right side.
    right: Vec<usize>,
    bucket_open: Vec<bool>,
    range_open: Vec<bool>,
}

impl SearchScratch {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, num_points: usize, num_tables: usize) {
        reset_to(&mut self.freq, num_points, 0);
        reset_to(&mut self.checked, num_points, false);
        reset_to(&mut self.query_keys, num_tables, 0.0);
        reset_to(&mut self.left, num_tables, 0);
        reset_to(&mut self.right, num_tables, 0);
        reset_to(&mut self.bucket_open, num_tables, true);
        reset_to(&mut self.range_open, num_tables, true);
    }

    pub fn memory_usage(&self) -> usize {
        self.freq.capacity() * std::mem::size_of::<u32>()
            + self.checked.capacity()
            + self.query_keys.capacity() * std::mem::size_of::<f32>()
            + (self.left.capacity() + self.right.capacity()) * std::mem::size_of::<usize>()
            + self.bucket_open.capacity()
            + self.range_open.capacity()
    }
}

fn reset_to<T: Copy>(buf: &mut Vec<T>, len: usize, value: T) {
    buf.clear();
    buf.resize(len, value);
}

/// What happened to one side of a table during a scan pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    /// Chunk finished with the side still inside the bucket.
    Open,
    /// Next entry lies beyond the current bucket.
    Bucket,
    /// Next entry lies beyond the range limit, or the side ran out of entries.
    Range,
}

/// Counters describing one search.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SearchStats {
    /// Radius rounds executed.
    pub rounds: usize,
    /// Radius in effect when the search stopped.
    pub final_radius: f32,
    /// Table entries visited across all tables.
    pub entries_scanned: usize,
    /// Verified candidates emitted.
    pub candidates: usize,
}

impl Qalsh {
    /// Index `n` rows of the row-major `data` matrix.
    pub fn build(data: &[f32], n: usize, dimension: usize, params: QalshParams) -> Result<Self> {
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

        let hash = HashParams::derive(n, &params);
        let seed = params.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);

        let mut tables = Vec::new();
        tables.try_reserve_exact(hash.m)?;
        for _ in 0..hash.m {
            tables.push(HashTable::build(&mut rng, data, n, dimension)?);
        }

        debug!(
            n,
            dimension,
            ratio = params.ratio,
            w = hash.w,
            p1 = hash.p1,
            p2 = hash.p2,
            alpha = hash.alpha,
            m = hash.m,
            l = hash.l,
            "built QALSH index"
        );

        Ok(Self {
            num_points: n,
            dimension,
            params,
            hash,
            tables,
        })
    }

    /// Candidate ids for `query` within `radius_limit` (in units of the base radius).
    ///
    /// Allocates a fresh scratch; use [`Qalsh::search_with`] to reuse one.
    pub fn search(&self, top_k: usize, radius_limit: f32, query: &[f32]) -> Result<Vec<u32>> {
        let mut scratch = SearchScratch::new();
        let mut out = Vec::new();
        self.search_with(&mut scratch, top_k, radius_limit, query, &mut out)?;
        Ok(out)
    }

    /// Dynamic collision counting search writing candidate ids into `out`.
    ///
    /// `out` is cleared first. Ids come back in emission order and are not
    /// ranked; scoring them is the caller's job. At most
    /// `candidates + top_k - 1` ids are emitted. Pass [`UNBOUNDED`] as
    /// `radius_limit` for plain c-ANN search. `top_k` must lie in
    /// `1..=num_points`.
    pub fn search_with(
        &self,
        scratch: &mut SearchScratch,
        top_k: usize,
        radius_limit: f32,
        query: &[f32],
        out: &mut Vec<u32>,
    ) -> Result<SearchStats> {
        if top_k == 0 || top_k > self.num_points {
            return Err(RetrieveError::InvalidArgument(format!(
                "top_k must be in 1..={}, got {top_k}",
                self.num_points
            )));
        }
        if radius_limit.is_nan() || radius_limit < 0.0 {
            return Err(RetrieveError::InvalidArgument(format!(
                "radius limit must be non-negative, got {radius_limit}"
            )));
        }
        if query.len() != self.dimension {
            return Err(RetrieveError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        ensure_finite(query, "query")?;

        out.clear();
        let m = self.tables.len();
        let quota = self.quota(top_k);
        scratch.reset(self.num_points, m);

        for (j, table) in self.tables.iter().enumerate() {
            let key = table.project(query);
            let pos = table.position(key);
            scratch.query_keys[j] = key;
            scratch.left[j] = pos;
            scratch.right[j] = pos;
        }

        let half_w = self.hash.w / 2.0;
        let range = if radius_limit.is_finite() {
            radius_limit * half_w
        } else {
            f32::INFINITY
        };
        let mut radius = 1.0_f32;
        let mut stats = SearchStats::default();
        let mut range_closed = 0usize;

        loop {
            stats.rounds += 1;
            let bucket = radius * half_w;

            // Tables out of range stay closed for every later round.
            let mut bucket_closed = range_closed;
            for j in 0..m {
                scratch.bucket_open[j] = scratch.range_open[j];
            }

            while bucket_closed < m && out.len() < quota {
                for j in 0..m {
                    if !scratch.bucket_open[j] {
                        continue;
                    }
                    let left = self.scan_left(scratch, j, bucket, range, quota, out, &mut stats);
                    let right = if out.len() < quota {
                        self.scan_right(scratch, j, bucket, range, quota, out, &mut stats)
                    } else {
                        Side::Open
                    };

                    if left != Side::Open && right != Side::Open {
                        scratch.bucket_open[j] = false;
                        bucket_closed += 1;
                        if left == Side::Range && right == Side::Range {
                            scratch.range_open[j] = false;
                            range_closed += 1;
                        }
                    }
                    if out.len() >= quota {
                        break;
                    }
                }
            }

            trace!(
                round = stats.rounds,
                radius,
                candidates = out.len(),
                "QALSH radius round"
            );

            if out.len() >= quota || range_closed >= m {
                break;
            }
            radius *= self.params.ratio;
        }

        stats.final_radius = radius;
        stats.candidates = out.len();
        Ok(stats)
    }

    #[allow(clippy::too_many_arguments)]
    fn scan_left(
        &self,
        scratch: &mut SearchScratch,
        j: usize,
        bucket: f32,
        range: f32,
        quota: usize,
        out: &mut Vec<u32>,
        stats: &mut SearchStats,
    ) -> Side {
        let entries = self.tables[j].entries();
        let key = scratch.query_keys[j];
        let mut pos = scratch.left[j];
        let mut side = Side::Open;

        for _ in 0..self.params.scan_size {
            if pos == 0 {
                side = Side::Range;
                break;
            }
            let entry = entries[pos - 1];
            let dist = (key - entry.key).abs();
            if dist > range {
                side = Side::Range;
                break;
            }
            if dist > bucket {
                side = Side::Bucket;
                break;
            }
            pos -= 1;
            stats.entries_scanned += 1;
            if self.collide(scratch, entry.id, out) && out.len() >= quota {
                break;
            }
        }

        scratch.left[j] = pos;
        side
    }

    #[allow(clippy::too_many_arguments)]
    fn scan_right(
        &self,
        scratch: &mut SearchScratch,
        j: usize,
        bucket: f32,
        range: f32,
        quota: usize,
        out: &mut Vec<u32>,
        stats: &mut SearchStats,
    ) -> Side {
        let entries = self.tables[j].entries();
        let key = scratch.query_keys[j];
        let mut pos = scratch.right[j];
        let mut side = Side::Open;

        for _ in 0..self.params.scan_size {
            if pos >= entries.len() {
                side = Side::Range;
                break;
            }
            let entry = entries[pos];
            let dist = (entry.key - key).abs();
            if dist > range {
                side = Side::Range;
                break;
            }
            if dist > bucket {
                side = Side::Bucket;
                break;
            }
            pos += 1;
            stats.entries_scanned += 1;
            if self.collide(scratch, entry.id, out) && out.len() >= quota {
                break;
            }
        }

        scratch.right[j] = pos;
        side
    }

    /// Count one collision; emit the point once it reaches the threshold.
    #[inline]
    fn collide(&self, scratch: &mut SearchScratch, id: u32, out: &mut Vec<u32>) -> bool {
        let i = id as usize;
        scratch.freq[i] += 1;
        if scratch.freq[i] as usize >= self.hash.l && !scratch.checked[i] {
            scratch.checked[i] = true;
            out.push(id);
            return true;
        }
        false
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn params(&self) -> &QalshParams {
        &self.params
    }

    /// Derived hashing parameters.
    pub fn hash_params(&self) -> &HashParams {
        &self.hash
    }

    /// Number of hash tables `m`.
    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    /// Collision threshold `l`.
    pub fn threshold(&self) -> usize {
        self.hash.l
    }

    /// Bucket width `w`.
    pub fn w(&self) -> f32 {
        self.hash.w
    }

    /// Largest number of candidates a query with `top_k` can emit.
    pub fn quota(&self, top_k: usize) -> usize {
        self.params.candidates.saturating_add(top_k.max(1) - 1)
    }

    /// Bytes owned by the hash tables.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.tables.iter().map(HashTable::memory_usage).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qalsh::params::QalshParams;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_data(n: usize, dim: usize, seed: u64) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n * dim).map(|_| rng.random_range(-1.0f32..1.0)).collect()
    }

    #[test]
    fn unbounded_search_hits_quota() {
        let (n, dim, top_k) = (500, 16, 5);
        let data = random_data(n, dim, 1);
        let index = Qalsh::build(&data, n, dim, QalshParams::default().with_seed(9)).unwrap();

        let query = random_data(1, dim, 2);
        let mut scratch = SearchScratch::new();
        let mut out = Vec::new();
        let stats = index
            .search_with(&mut scratch, top_k, UNBOUNDED, &query, &mut out)
            .unwrap();

        assert_eq!(out.len(), index.quota(top_k));
        assert_eq!(stats.candidates, out.len());
        assert!(stats.rounds >= 1);

        let mut ids = out.clone();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), out.len(), "candidates must be unique");
        assert!(ids.iter().all(|&id| (id as usize) < n));
    }

    #[test]
    fn fewer_points_than_quota_terminates() {
        let (n, dim) = (20, 4);
        let data = random_data(n, dim, 3);
        let index = Qalsh::build(&data, n, dim, QalshParams::default().with_seed(1)).unwrap();
        let out = index.search(1, UNBOUNDED, &random_data(1, dim, 4)).unwrap();
        assert_eq!(out.len(), n);
    }

    #[test]
    fn identical_points_terminate() {
        let (n, dim) = (300, 8);
        let data = vec![0.25_f32; n * dim];
        let index = Qalsh::build(&data, n, dim, QalshParams::default().with_seed(5)).unwrap();
        let out = index.search(3, UNBOUNDED, &vec![0.25_f32; dim]).unwrap();
        assert_eq!(out.len(), index.quota(3));
    }

    #[test]
    fn zero_range_far_query_returns_nothing() {
        let (n, dim) = (200, 8);
        let data = random_data(n, dim, 6);
        let index = Qalsh::build(&data, n, dim, QalshParams::default().with_seed(2)).unwrap();

        // A far-away query with a tiny range cannot reach any entry.
        let far = vec![100.0_f32; dim];
        let out = index.search(1, 0.0, &far).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn exact_duplicate_is_found_with_small_range() {
        let (n, dim) = (400, 12);
        let data = random_data(n, dim, 8);
        let index = Qalsh::build(&data, n, dim, QalshParams::default().with_seed(4)).unwrap();

        let target = 123usize;
        let query = data[target * dim..(target + 1) * dim].to_vec();
        let out = index.search(1, 0.5, &query).unwrap();
        assert!(out.contains(&(target as u32)));
    }

    #[test]
    fn same_seed_same_candidates() {
        let (n, dim) = (300, 10);
        let data = random_data(n, dim, 11);
        let query = random_data(1, dim, 12);
        let params = QalshParams::default().with_seed(77);

        let a = Qalsh::build(&data, n, dim, params.clone()).unwrap();
        let b = Qalsh::build(&data, n, dim, params).unwrap();
        assert_eq!(
            a.search(10, UNBOUNDED, &query).unwrap(),
            b.search(10, UNBOUNDED, &query).unwrap()
        );
    }

    #[test]
    fn scratch_is_reusable_across_queries() {
        let (n, dim) = (250, 6);
        let data = random_data(n, dim, 13);
        let index = Qalsh::build(&data, n, dim, QalshParams::default().with_seed(3)).unwrap();
        let q1 = random_data(1, dim, 14);
        let q2 = random_data(1, dim, 15);

        let mut scratch = SearchScratch::new();
        assert_eq!(scratch.memory_usage(), 0);
        let mut out = Vec::new();
        index.search_with(&mut scratch, 2, UNBOUNDED, &q1, &mut out).unwrap();
        let after_first = scratch.memory_usage();
        // One counter and one verified flag per point, plus per-table cursors.
        assert!(after_first >= n * (std::mem::size_of::<u32>() + 1));

        index.search_with(&mut scratch, 2, UNBOUNDED, &q2, &mut out).unwrap();
        assert_eq!(scratch.memory_usage(), after_first);
        assert_eq!(out, index.search(2, UNBOUNDED, &q2).unwrap());
    }

    #[test]
    fn oversized_top_k_is_rejected() {
        let (n, dim) = (10, 3);
        let data = random_data(n, dim, 16);
        let index = Qalsh::build(&data, n, dim, QalshParams::default().with_seed(1)).unwrap();

        for top_k in [n + 1, usize::MAX] {
            assert!(matches!(
                index.search(top_k, UNBOUNDED, &[0.0; 3]),
                Err(RetrieveError::InvalidArgument(_))
            ));
        }
        assert_eq!(index.quota(usize::MAX), usize::MAX);
        assert_eq!(index.search(n, UNBOUNDED, &[0.0; 3]).unwrap().len(), n);
    }

    #[test]
    fn rejects_bad_arguments() {
        let data = random_data(10, 3, 0);
        assert_eq!(
            Qalsh::build(&data, 0, 3, QalshParams::default()).unwrap_err(),
            RetrieveError::EmptyIndex
        );
        assert!(Qalsh::build(&data, 10, 4, QalshParams::default()).is_err());
        assert!(Qalsh::build(&data, 10, 3, QalshParams::with_ratio(0.5)).is_err());

        let index = Qalsh::build(&data, 10, 3, QalshParams::default()).unwrap();
        assert!(index.search(0, UNBOUNDED, &[0.0, 0.0, 0.0]).is_err());
        assert!(index.search(1, -1.0, &[0.0, 0.0, 0.0]).is_err());
        assert!(index.search(1, f32::NAN, &[0.0, 0.0, 0.0]).is_err());
        assert!(index.search(1, UNBOUNDED, &[f32::NAN, 0.0, 0.0]).is_err());
        assert_eq!(
            index.search(1, UNBOUNDED, &[0.0, 0.0]).unwrap_err(),
            RetrieveError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
    }
}
