//! Norm shells and the homocentric hypersphere lifting.

use crate::qalsh::Qalsh;

/// A shell of points whose norms lie within a bounded ratio of `max_norm`.
///
/// Blocks with more than the candidate quota carry a QALSH index over their
/// lifted coordinates; smaller ones are scanned linearly at query time.
#[derive(Clone, Debug)]
pub struct Block {
    pub(crate) max_norm: f32,
    pub(crate) ids: Vec<u32>,
    pub(crate) index: Option<Qalsh>,
}

impl Block {
    /// Largest norm in the shell, the radius its points are lifted onto.
    pub fn max_norm(&self) -> f32 {
        self.max_norm
    }

    /// Member ids in decreasing norm order.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether queries go through QALSH rather than a linear scan.
    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    pub fn index(&self) -> Option<&Qalsh> {
        self.index.as_ref()
    }

    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.ids.len() * std::mem::size_of::<u32>()
            + self.index.as_ref().map_or(0, Qalsh::memory_usage)
    }
}

/// Norm-ratio bound `b = sqrt((c⁴ - 1) / (c⁴ - c0))` for NN ratio `c` and MIP ratio `c0`.
pub fn compression_ratio(nn_ratio: f32, mip_ratio: f32) -> f32 {
    let c4 = f64::from(nn_ratio).powi(4);
    ((c4 - 1.0) / (c4 - f64::from(mip_ratio))).sqrt() as f32
}

/// Split ids into shells by decreasing norm.
///
/// A shell starts at the largest unassigned norm `M` and keeps taking points
/// while it holds fewer than `max_block_size` of them and either has fewer
/// than `candidates` points or the next norm is still at least `M * b`.
/// Returns `(M, ids)` per shell in decreasing `M` order.
pub(crate) fn partition_by_norm(
    norms: &[f32],
    b: f32,
    candidates: usize,
    max_block_size: usize,
) -> Vec<(f32, Vec<u32>)> {
    let n = norms.len();
    let mut order: Vec<u32> = (0..n as u32).collect();
    order.sort_unstable_by(|&x, &y| {
        norms[y as usize]
            .total_cmp(&norms[x as usize])
            .then(x.cmp(&y))
    });

    let mut shells = Vec::new();
    let mut start = 0;
    while start < n {
        let max_norm = norms[order[start] as usize];
        let min_norm = max_norm * b;

        let mut end = start;
        while end < n {
            let count = end - start;
            if count >= max_block_size {
                break;
            }
            if count >= candidates && norms[order[end] as usize] < min_norm {
                break;
            }
            end += 1;
        }

        shells.push((max_norm, order[start..end].to_vec()));
        start = end;
    }
    shells
}

/// Lift `point` onto the sphere of radius `max_norm` by appending
/// `sqrt(max_norm² - norm²)`. `out` is overwritten with `dim + 1` values.
pub fn lift_point(max_norm: f32, point: &[f32], norm: f32, out: &mut Vec<f32>) {
    out.clear();
    out.extend_from_slice(point);
    out.push((max_norm * max_norm - norm * norm).max(0.0).sqrt());
}

/// Scale `query` by `lambda` and append a zero coordinate.
pub fn lift_query(lambda: f32, query: &[f32], out: &mut Vec<f32>) {
    out.clear();
    out.extend(query.iter().map(|x| x * lambda));
    out.push(0.0);
}
