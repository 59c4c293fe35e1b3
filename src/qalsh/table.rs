//! Sorted projection tables.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::distance::row;
use crate::simd;
use crate::Result;

/// One point's projection onto a table's direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Entry {
    pub key: f32,
    pub id: u32,
}

/// A random direction and every indexed point's projection onto it,
/// sorted ascending by `(key, id)`.
#[derive(Clone, Debug)]
pub(crate) struct HashTable {
    direction: Vec<f32>,
    entries: Vec<Entry>,
}

impl HashTable {
    /// Draw a direction with i.i.d. N(0, 1) components and project `n` rows of `data`.
    pub fn build<R: Rng>(
        rng: &mut R,
        data: &[f32],
        n: usize,
        dimension: usize,
    ) -> Result<Self> {
        let direction: Vec<f32> = (0..dimension).map(|_| rng.sample(StandardNormal)).collect();

        let mut entries = Vec::new();
        entries.try_reserve_exact(n)?;
        entries.extend((0..n).map(|i| Entry {
            key: simd::dot(&direction, row(data, dimension, i)),
            id: i as u32,
        }));
        entries.sort_unstable_by(|a, b| a.key.total_cmp(&b.key).then(a.id.cmp(&b.id)));

        Ok(Self { direction, entries })
    }

    /// Projection of `v` onto this table's direction.
    #[inline]
    pub fn project(&self, v: &[f32]) -> f32 {
        simd::dot(&self.direction, v)
    }

    /// Index of the first entry whose key is not below `key`.
    #[inline]
    pub fn position(&self, key: f32) -> usize {
        self.entries.partition_point(|e| e.key < key)
    }

    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn memory_usage(&self) -> usize {
        self.direction.len() * std::mem::size_of::<f32>()
            + self.len() * std::mem::size_of::<Entry>()
    }
}
