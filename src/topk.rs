//! Bounded top-k containers.
//!
//! Fixed-capacity sorted lists keeping the `k` best `(key, id)` pairs seen so
//! far. [`MinK`] keeps the smallest keys (nearest-neighbor distances), [`MaxK`]
//! keeps the largest (inner-product scores).
//!
//! Insertion is a single linear shift from the tail, which beats a heap for the
//! small `k` used here and keeps the list sorted for free. Equal keys keep
//! insertion order: a new item lands after every existing item with the same
//! key, so once the list is full a tie with the worst entry is dropped.
//!
//! Unfilled slots report a sentinel: `f32::MAX` for [`MinK`], `f32::MIN` for
//! [`MaxK`]. Callers use [`MinK::bound_key`] / [`MaxK::bound_key`] as the
//! pruning threshold, which is therefore never satisfied before the list fills.

/// Shared storage: entries sorted so that index 0 is the best.
#[derive(Debug, Clone)]
struct SortedList {
    k: usize,
    entries: Vec<(f32, u32)>,
}

impl SortedList {
    fn new(k: usize) -> Self {
        assert!(k > 0, "top-k capacity must be at least 1");
        Self {
            k,
            entries: Vec::with_capacity(k + 1),
        }
    }

    /// Insert keeping order; `before(a, b)` is true when `a` ranks strictly ahead of `b`.
    #[inline]
    fn insert(&mut self, key: f32, id: u32, before: impl Fn(f32, f32) -> bool) {
        let mut pos = self.entries.len();
        while pos > 0 && before(key, self.entries[pos - 1].0) {
            pos -= 1;
        }
        if pos == self.k {
            return;
        }
        self.entries.insert(pos, (key, id));
        self.entries.truncate(self.k);
    }

    #[inline]
    fn ith_key(&self, i: usize, sentinel: f32) -> f32 {
        self.entries.get(i).map_or(sentinel, |e| e.0)
    }

    #[inline]
    fn bound_key(&self, sentinel: f32) -> f32 {
        if self.entries.len() < self.k {
            sentinel
        } else {
            self.entries[self.k - 1].0
        }
    }
}

macro_rules! bounded_topk {
    ($(#[$doc:meta])* $name:ident, $sentinel:expr, |$a:ident, $b:ident| $before:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            list: SortedList,
        }

        impl $name {
            /// Key reported for slots that are not filled yet.
            pub const SENTINEL: f32 = $sentinel;

            /// Create an empty container holding at most `k` entries.
            ///
            /// # Panics
            ///
            /// Panics if `k == 0`.
            pub fn new(k: usize) -> Self {
                Self {
                    list: SortedList::new(k),
                }
            }

            /// Empty the container, keeping its capacity.
            #[inline]
            pub fn reset(&mut self) {
                self.list.entries.clear();
            }

            /// Insert `(key, id)` and return the new bound key.
            #[inline]
            pub fn insert(&mut self, key: f32, id: u32) -> f32 {
                self.list.insert(key, id, |$a, $b| $before);
                self.bound_key()
            }

            /// Capacity `k`.
            #[inline]
            pub fn capacity(&self) -> usize {
                self.list.k
            }

            /// Number of retained entries.
            #[inline]
            pub fn len(&self) -> usize {
                self.list.entries.len()
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.list.entries.is_empty()
            }

            /// Whether `k` entries are retained.
            #[inline]
            pub fn is_full(&self) -> bool {
                self.list.entries.len() == self.list.k
            }

            /// Key at rank `i` (0 = best), or the sentinel past the end.
            #[inline]
            pub fn ith_key(&self, i: usize) -> f32 {
                self.list.ith_key(i, Self::SENTINEL)
            }

            /// Id at rank `i` (0 = best).
            #[inline]
            pub fn ith_id(&self, i: usize) -> Option<u32> {
                self.list.entries.get(i).map(|e| e.1)
            }

            /// Best retained key, or the sentinel when empty.
            #[inline]
            pub fn extreme_key(&self) -> f32 {
                self.ith_key(0)
            }

            /// The k-th (worst retained) key, or the sentinel until full.
            #[inline]
            pub fn bound_key(&self) -> f32 {
                self.list.bound_key(Self::SENTINEL)
            }

            /// Iterate `(key, id)` from best to worst.
            pub fn iter(&self) -> impl Iterator<Item = (f32, u32)> + '_ {
                self.list.entries.iter().copied()
            }

            /// Retained entries as `(id, key)` from best to worst.
            pub fn to_results(&self) -> Vec<(u32, f32)> {
                self.iter().map(|(key, id)| (id, key)).collect()
            }
        }
    };
}

bounded_topk!(
    /// Keeps the `k` smallest keys, ascending.
    MinK,
    f32::MAX,
    |a, b| a < b
);

bounded_topk!(
    /// Keeps the `k` largest keys, descending.
    MaxK,
    f32::MIN,
    |a, b| a > b
);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn min_k_keeps_smallest() {
        let mut list = MinK::new(3);
        for (key, id) in [(5.0, 0), (1.0, 1), (4.0, 2), (2.0, 3), (9.0, 4)] {
            list.insert(key, id);
        }
        assert_eq!(list.to_results(), vec![(1, 1.0), (3, 2.0), (2, 4.0)]);
        assert_eq!(list.extreme_key(), 1.0);
        assert_eq!(list.bound_key(), 4.0);
    }

    #[test]
    fn max_k_keeps_largest() {
        let mut list = MaxK::new(2);
        for (key, id) in [(0.5, 0), (3.0, 1), (-1.0, 2), (2.0, 3)] {
            list.insert(key, id);
        }
        assert_eq!(list.to_results(), vec![(1, 3.0), (3, 2.0)]);
        assert_eq!(list.extreme_key(), 3.0);
        assert_eq!(list.bound_key(), 2.0);
    }

    #[test]
    fn sentinels_until_full() {
        let mut max = MaxK::new(3);
        assert_eq!(max.bound_key(), f32::MIN);
        assert_eq!(max.extreme_key(), f32::MIN);
        max.insert(1.0, 0);
        assert_eq!(max.bound_key(), MaxK::SENTINEL);
        assert_eq!(max.ith_key(1), MaxK::SENTINEL);
        assert_eq!(max.ith_id(1), None);

        let min = MinK::new(1);
        assert_eq!(min.bound_key(), f32::MAX);
    }

    #[test]
    fn ties_preserve_insertion_order() {
        let mut list = MaxK::new(3);
        list.insert(1.0, 10);
        list.insert(1.0, 11);
        list.insert(2.0, 12);
        list.insert(1.0, 13);
        assert_eq!(list.to_results(), vec![(12, 2.0), (10, 1.0), (11, 1.0)]);

        let mut list = MinK::new(2);
        list.insert(3.0, 0);
        list.insert(3.0, 1);
        list.insert(3.0, 2);
        assert_eq!(list.ith_id(0), Some(0));
        assert_eq!(list.ith_id(1), Some(1));
    }

    #[test]
    fn reset_empties() {
        let mut list = MinK::new(2);
        list.insert(1.0, 0);
        list.insert(2.0, 1);
        assert!(list.is_full());
        list.reset();
        assert!(list.is_empty());
        assert_eq!(list.capacity(), 2);
        assert_eq!(list.bound_key(), MinK::SENTINEL);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_max_k_matches_sorted_prefix(
            k in 1usize..20,
            keys in proptest::collection::vec(-100.0f32..100.0, 0..80),
        ) {
            let mut list = MaxK::new(k);
            for (id, &key) in keys.iter().enumerate() {
                list.insert(key, id as u32);
            }

            // Stable sort keeps insertion order among ties, like the list does.
            let mut expected: Vec<(u32, f32)> =
                keys.iter().enumerate().map(|(i, &key)| (i as u32, key)).collect();
            expected.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
            expected.truncate(k);

            prop_assert_eq!(list.to_results(), expected);
        }

        #[test]
        fn prop_min_k_sorted_and_bounded(
            k in 1usize..20,
            keys in proptest::collection::vec(0.0f32..10.0, 0..80),
        ) {
            let mut list = MinK::new(k);
            for (id, &key) in keys.iter().enumerate() {
                list.insert(key, id as u32);
            }
            prop_assert_eq!(list.len(), keys.len().min(k));
            let got: Vec<f32> = list.iter().map(|(key, _)| key).collect();
            prop_assert!(got.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
