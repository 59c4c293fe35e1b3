//! QALSH configuration and derived hashing parameters.

use serde::{Deserialize, Serialize};

use crate::{Result, RetrieveError};

/// Default number of verified candidates a query may emit (before `top_k - 1` slack).
pub const DEFAULT_CANDIDATES: usize = 100;
/// Default number of entries scanned per table side before moving to the next table.
pub const DEFAULT_SCAN_SIZE: usize = 64;
/// Default step of the Riemann sum used for the normal probability mass.
pub const DEFAULT_INTEGRATION_STEP: f64 = 0.001;

/// User-facing QALSH configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QalshParams {
    /// Approximation ratio `c > 1`. Also the radius growth factor per round.
    pub ratio: f32,
    /// Candidate quota; a query stops after `candidates + top_k - 1` verified points.
    pub candidates: usize,
    /// Entries scanned per table side in one pass.
    pub scan_size: usize,
    /// Step of the numerical integration behind `p1` and `p2`.
    pub integration_step: f64,
    /// Seed for the projection directions. `None` draws one from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for QalshParams {
    fn default() -> Self {
        Self {
            ratio: 2.0,
            candidates: DEFAULT_CANDIDATES,
            scan_size: DEFAULT_SCAN_SIZE,
            integration_step: DEFAULT_INTEGRATION_STEP,
            seed: None,
        }
    }
}

impl QalshParams {
    /// Configuration with approximation ratio `c`.
    pub fn with_ratio(ratio: f32) -> Self {
        Self {
            ratio,
            ..Self::default()
        }
    }

    /// Fix the projection seed so repeated builds are identical.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_candidates(mut self, candidates: usize) -> Self {
        self.candidates = candidates;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.ratio.is_finite() && self.ratio > 1.0) {
            return Err(RetrieveError::InvalidArgument(format!(
                "approximation ratio must be finite and > 1, got {}",
                self.ratio
            )));
        }
        if self.candidates == 0 {
            return Err(RetrieveError::InvalidArgument(
                "candidate quota must be at least 1".into(),
            ));
        }
        if self.scan_size == 0 {
            return Err(RetrieveError::InvalidArgument(
                "scan size must be at least 1".into(),
            ));
        }
        if !(self.integration_step.is_finite() && self.integration_step > 0.0) {
            return Err(RetrieveError::InvalidArgument(format!(
                "integration step must be positive, got {}",
                self.integration_step
            )));
        }
        Ok(())
    }
}

/// Parameters derived from `(n, c)` at build time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HashParams {
    /// Bucket width.
    pub w: f32,
    /// Collision probability of a point within distance `R`.
    pub p1: f32,
    /// Collision probability of a point beyond distance `cR`.
    pub p2: f32,
    /// Collision-rate threshold between `p2` and `p1`.
    pub alpha: f32,
    /// False-positive budget.
    pub beta: f32,
    /// Error probability.
    pub delta: f32,
    /// Number of hash tables.
    pub m: usize,
    /// Collision count needed to become a candidate.
    pub l: usize,
}

impl HashParams {
    /// Derive every scalar from the number of points and the configuration.
    pub fn derive(n: usize, params: &QalshParams) -> Self {
        let c = f64::from(params.ratio);
        let c2 = c * c;

        // Beta above 1 would make ln(2/beta) collapse; small tables simply verify everything.
        let beta = (params.candidates as f64 / n.max(1) as f64).min(1.0);
        let delta = 1.0 / std::f64::consts::E;

        let w = (8.0 * c2 * c.ln() / (c2 - 1.0)).sqrt();
        let p1 = normal_mass(w / 2.0, params.integration_step);
        let p2 = normal_mass(w / (2.0 * c), params.integration_step);

        let para1 = (2.0 / beta).ln().sqrt();
        let para2 = (1.0 / delta).ln().sqrt();
        let eta = para1 / para2;
        let alpha = (eta * p1 + p2) / (1.0 + eta);

        let gap = p1 - p2;
        let m = ((para1 + para2).powi(2) / (2.0 * gap * gap)).ceil().max(1.0) as usize;
        let l = ((alpha * m as f64).ceil() as usize).clamp(1, m);

        Self {
            w: w as f32,
            p1: p1 as f32,
            p2: p2 as f32,
            alpha: alpha as f32,
            beta: beta as f32,
            delta: delta as f32,
            m,
            l,
        }
    }
}

/// Probability mass of the standard normal distribution inside `[-x, x]`.
///
/// Fixed-step midpoint Riemann sum over the density. The step trades precision
/// for speed; derived table counts depend on it, so keep it stable between
/// runs that are compared against each other.
pub fn normal_mass(x: f64, step: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let steps = (x / step).ceil() as usize;
    let h = x / steps as f64;
    let norm = 1.0 / (2.0 * std::f64::consts::PI).sqrt();
    let half: f64 = (0..steps)
        .map(|i| {
            let t = (i as f64 + 0.5) * h;
            norm * (-0.5 * t * t).exp()
        })
        .sum::<f64>()
        * h;
    (2.0 * half).min(1.0)
}
