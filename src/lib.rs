//! h2alsh: approximate Maximum Inner Product Search.
//!
//! Provides the pieces of an asymmetric LSH testbed for MIPS:
//!
//! - [`qalsh`]: query-aware LSH, a reusable (R, c)-approximate range search
//!   engine over Euclidean space with dynamic collision counting.
//! - [`h2alsh`]: homocentric hypersphere partitioning, reducing top-k MIP to
//!   a sequence of radius-bounded QALSH searches over norm shells.
//! - [`linear`]: exact brute-force baseline.
//! - [`topk`]: bounded sorted containers shared by all of the above.
//!
//! # Why MIPS Is Not Just Another Metric
//!
//! Inner product violates the triangle inequality and self-similarity, so
//! tree and graph indexes built for distances lose their guarantees. Two
//! practical consequences:
//!
//! - **Norm dominates**: a long vector pointing roughly the right way beats a
//!   short vector pointing exactly the right way. Large-norm points deserve
//!   more search effort, which is what shell ordering provides.
//! - **Bounds are cheap**: `<q, o> <= |q| |o|` lets a search skip every shell
//!   whose norm cannot beat the current k-th score.
//!
//! # Conventions
//!
//! Data is a row-major `n x dim` matrix of `f32`. Ids are 0-based row
//! positions. Results are `(id, score)` pairs, best first.

pub mod distance;
pub mod error;
pub mod h2alsh;
pub mod linear;
pub mod mips;
pub mod qalsh;
pub mod simd;
pub mod topk;

pub use error::{Result, RetrieveError};
pub use h2alsh::{H2Alsh, H2AlshParams, SearchOptions};
pub use linear::LinearScan;
pub use mips::MipsIndex;
pub use qalsh::{Qalsh, QalshIndex, QalshParams};
pub use topk::{MaxK, MinK};
