use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::loss::softmax::{softmax_loss_naive, softmax_loss_vectorized};
use crate::math::matrix::Matrix;

/// Selects which softmax loss implementation to evaluate.
///
/// - `Naive`      — explicit loops over examples and classes; the reference.
/// - `Vectorized` — whole-batch matrix form; the default.
///
/// Both return the same `(loss, dW)` up to floating-point rounding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftmaxImpl {
    Naive,
    #[default]
    Vectorized,
}

impl SoftmaxImpl {
    pub fn evaluate(self, w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<(f64, Matrix)> {
        match self {
            SoftmaxImpl::Naive      => softmax_loss_naive(w, x, y, reg),
            SoftmaxImpl::Vectorized => softmax_loss_vectorized(w, x, y, reg),
        }
    }
}
