//! Numerical checks for analytic gradients.
//!
//! `grad_check_sparse` compares an analytic gradient against centered finite
//! differences at randomly sampled coordinates. `compare_implementations`
//! runs both softmax implementations on the same batch and reports how far
//! apart they are.

use rand::Rng;
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::loss::softmax::{softmax_loss_naive, softmax_loss_vectorized};
use crate::math::matrix::Matrix;

/// One sampled coordinate of a gradient check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradCheckSample {
    pub row: usize,
    pub col: usize,
    pub numerical: f64,
    pub analytic: f64,
    pub abs_error: f64,
    /// |a − n| / (|a| + |n|); 0 when both are exactly zero.
    pub rel_error: f64,
}

impl GradCheckSample {
    fn new(row: usize, col: usize, numerical: f64, analytic: f64) -> Self {
        let abs_error = (analytic - numerical).abs();
        let denom = analytic.abs() + numerical.abs();
        let rel_error = if denom == 0.0 { 0.0 } else { abs_error / denom };
        GradCheckSample { row, col, numerical, analytic, abs_error, rel_error }
    }

    /// Agrees within `tol`, either relatively or absolutely.
    pub fn within(&self, tol: f64) -> bool {
        self.rel_error <= tol || self.abs_error <= tol
    }
}

/// Samples `num_checks` random coordinates of `w` and compares `analytic`
/// against the centered difference (f(W + h) − f(W − h)) / 2h.
pub fn grad_check_sparse<F, R>(
    mut f: F,
    w: &Matrix,
    analytic: &Matrix,
    num_checks: usize,
    h: f64,
    rng: &mut R,
) -> Result<Vec<GradCheckSample>>
where
    F: FnMut(&Matrix) -> Result<f64>,
    R: Rng + ?Sized,
{
    w.check_same_shape(analytic, "gradient shape (analytic vs W)")?;
    if w.rows == 0 || w.cols == 0 {
        return Ok(Vec::new());
    }

    let mut probe = w.clone();
    let mut samples = Vec::with_capacity(num_checks);

    for _ in 0..num_checks {
        let row = rng.gen_range(0..w.rows);
        let col = rng.gen_range(0..w.cols);
        let old = w.data[row][col];

        probe.data[row][col] = old + h;
        let fxph = f(&probe)?;
        probe.data[row][col] = old - h;
        let fxmh = f(&probe)?;
        probe.data[row][col] = old;

        let numerical = (fxph - fxmh) / (2.0 * h);
        let sample = GradCheckSample::new(row, col, numerical, analytic.data[row][col]);
        debug!(
            row, col,
            numerical = sample.numerical,
            analytic = sample.analytic,
            rel_error = sample.rel_error,
            "gradient check sample"
        );
        samples.push(sample);
    }

    Ok(samples)
}

/// Summary of a sparse gradient check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradCheckReport {
    pub samples: Vec<GradCheckSample>,
    pub tolerance: f64,
    pub passed: usize,
    pub max_rel_error: f64,
}

impl GradCheckReport {
    pub fn from_samples(samples: Vec<GradCheckSample>, tolerance: f64) -> Self {
        let passed = samples.iter().filter(|s| s.within(tolerance)).count();
        let max_rel_error = samples.iter().map(|s| s.rel_error).fold(0.0, f64::max);

        for s in samples.iter().filter(|s| !s.within(tolerance)) {
            warn!(
                row = s.row, col = s.col,
                numerical = s.numerical,
                analytic = s.analytic,
                rel_error = s.rel_error,
                tolerance,
                "gradient check sample outside tolerance"
            );
        }

        GradCheckReport { samples, tolerance, passed, max_rel_error }
    }

    /// Fraction of samples within tolerance; 1.0 for an empty check.
    pub fn pass_fraction(&self) -> f64 {
        if self.samples.is_empty() {
            return 1.0;
        }
        self.passed as f64 / self.samples.len() as f64
    }
}

/// Differences between the naive and vectorized results on one batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquivalenceReport {
    pub loss_naive: f64,
    pub loss_vectorized: f64,
    pub loss_diff: f64,
    pub max_grad_diff: f64,
}

impl EquivalenceReport {
    pub fn agrees(&self, tol: f64) -> bool {
        self.loss_diff <= tol && self.max_grad_diff <= tol
    }
}

pub fn compare_implementations(w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<EquivalenceReport> {
    let (loss_naive, grad_naive) = softmax_loss_naive(w, x, y, reg)?;
    let (loss_vectorized, grad_vectorized) = softmax_loss_vectorized(w, x, y, reg)?;
    Ok(EquivalenceReport {
        loss_naive,
        loss_vectorized,
        loss_diff: (loss_naive - loss_vectorized).abs(),
        max_grad_diff: grad_naive.max_abs_diff(&grad_vectorized)?,
    })
}
