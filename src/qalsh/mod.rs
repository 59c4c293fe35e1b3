//! QALSH: query-aware locality-sensitive hashing for c-approximate range search.
//!
//! Classic E2LSH fixes bucket boundaries at build time, so a query sitting next
//! to a boundary misses neighbors just across it. QALSH keeps no buckets at
//! all: each table stores the raw projections `a · o` sorted ascending, and the
//! bucket is an interval centered on the query's own projection.
//!
//! ```text
//! table j:   ... o17  o4  o88 [ o3  o51 | q  o9  o23 ] o60 ...
//!                               <- lpos    rpos ->
//!                               |a·q - a·o| <= r·w/2
//! ```
//!
//! ## Dynamic collision counting
//!
//! A point becomes a candidate once it collides with the query in at least
//! `l` of the `m` tables. Starting from radius 1, every table scans outward
//! from the query's position; points inside the bucket get their counter
//! bumped. When all tables leave their buckets, the radius grows by `c` and
//! the scan resumes where it stopped. A search ends when it has emitted
//! `CANDIDATES + k - 1` points or every table has left the caller's hard range.
//!
//! ## Parameters
//!
//! | Symbol | Value | Meaning |
//! |--------|-------|---------|
//! | `w` | `sqrt(8c² ln c / (c² - 1))` | bucket width |
//! | `p1` | `Φ(w/2)` | collision probability at distance `R` |
//! | `p2` | `Φ(w/2c)` | collision probability at distance `cR` |
//! | `beta` | `CANDIDATES / n` | false-positive budget |
//! | `delta` | `1/e` | error probability |
//! | `m` | `⌈(√ln(2/β) + √ln(1/δ))² / 2(p1 - p2)²⌉` | hash tables |
//! | `l` | `⌈alpha · m⌉` | collision threshold |
//!
//! `Φ(x)` is the standard normal mass inside `[-x, x]`, integrated numerically.
//!
//! ## Usage
//!
//! ```rust
//! use h2alsh::qalsh::{Qalsh, QalshParams, UNBOUNDED};
//!
//! let (n, dim) = (200, 4);
//! let data: Vec<f32> = (0..n * dim).map(|i| (i as f32 * 0.37).sin()).collect();
//! let index = Qalsh::build(&data, n, dim, QalshParams::with_ratio(2.0).with_seed(1))?;
//!
//! let candidates = index.search(10, UNBOUNDED, &data[..dim])?;
//! assert!(candidates.len() <= index.quota(10));
//! # Ok::<(), h2alsh::RetrieveError>(())
//! ```
//!
//! # References
//!
//! - Huang, Feng, Zhang, Fang, Ng (2015). "Query-Aware Locality-Sensitive
//!   Hashing for Approximate Nearest Neighbor Search."

mod index;
pub mod params;
mod search;
mod table;

pub use index::QalshIndex;
pub use params::{normal_mass, HashParams, QalshParams, DEFAULT_CANDIDATES};
pub use search::{Qalsh, SearchScratch, SearchStats, UNBOUNDED};
