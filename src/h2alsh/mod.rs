//! H2-ALSH: homocentric hypersphere partitioning for approximate MIP search.
//!
//! # The Problem
//!
//! Inner product is not a metric: `<q, o>` can exceed `<q, q>`, and a point
//! is not its own best match. LSH families for Euclidean distance therefore
//! do not apply directly. The asymmetric fix is to transform data and query
//! differently so that ranking by distance reproduces ranking by inner product.
//!
//! # Key Insight: Lift Each Shell Onto Its Own Sphere
//!
//! For data with norm `|o| <= M`, append `sqrt(M² - |o|²)`; for the query,
//! scale by `λ = M / |q|` and append `0`. Both lifted vectors have norm `M`, so
//!
//! ```text
//! |P(o) - Q(q)|² = 2M² - 2λ<o, q>
//! ```
//!
//! and the nearest lifted point is the maximum inner product point. One global
//! `M` wastes precision on small-norm points, so H2-ALSH cuts the data into
//! shells whose norms stay within a factor `b = sqrt((c⁴ - 1) / (c⁴ - c0))`
//! of the shell's own `M` and lifts each shell separately.
//!
//! # Query
//!
//! ```text
//! shells by decreasing M:   [M=9.1] [M=8.7] [M=6.2] ... [M=0.4]
//!                              |       |       |
//!   bound M·|q| <= k-th best? ─┴───────┴───────┴── stop here
//! ```
//!
//! 1. Cauchy-Schwarz: no point in a shell scores above `M · |q|`. Once that
//!    bound drops to the k-th best score, every later shell is skipped.
//! 2. Shells of at most `CANDIDATES` points are scanned exactly.
//! 3. Larger shells run QALSH with radius `sqrt(2M² - 2λ·kth)`, the distance
//!    at which a point would merely tie the current k-th score.
//!
//! # Usage
//!
//! ```rust
//! use h2alsh::h2alsh::{H2Alsh, H2AlshParams};
//!
//! let (n, dim) = (500, 8);
//! let data: Vec<f32> = (0..n * dim).map(|i| ((i * 7919) % 1000) as f32 / 1000.0 - 0.5).collect();
//! let index = H2Alsh::build(&data, n, dim, H2AlshParams::new(2.0, 0.5).with_seed(7))?;
//!
//! let results = index.kmip(5, &data[..dim])?;
//! assert_eq!(results.len(), 5);
//! assert!(results.windows(2).all(|w| w[0].1 >= w[1].1));
//! # Ok::<(), h2alsh::RetrieveError>(())
//! ```
//!
//! # References
//!
//! - Huang, Ma, Feng, Fang, Tung (2018). "Accurate and Fast Asymmetric
//!   Locality-Sensitive Hashing Scheme for Maximum Inner Product Search."

mod partition;
mod search;

pub use partition::{compression_ratio, lift_point, lift_query, Block};
pub use search::{H2Alsh, H2AlshParams, SearchOptions, DEFAULT_MAX_BLOCK_SIZE};
