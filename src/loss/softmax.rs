//! Softmax cross-entropy loss and gradient for a linear classifier.
//!
//! Inputs have feature dimension D, there are C classes, and a minibatch has
//! N examples:
//! - `w`   — weights, shape (D, C)
//! - `x`   — minibatch, shape (N, D)
//! - `y`   — labels, length N, each in [0, C)
//! - `reg` — L2 regularization strength
//!
//! Both entry points return `(loss, dW)` where
//!   loss = mean_i(-log softmax(x_i · W)[y_i]) + reg · Σ W²
//!   dW   = Xᵀ · (P − 1{y}) / N + reg · W
//!
//! Scores are always shifted by their row maximum before exponentiating, so
//! large logits never overflow.

use tracing::debug;

use crate::error::{Result, SoftmaxError};
use crate::math::matrix::Matrix;

/// Rejects inputs that would make the loss undefined.
fn validate_inputs(w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<()> {
    if !reg.is_finite() || reg < 0.0 {
        return Err(SoftmaxError::InvalidRegularization(reg));
    }
    if x.rows == 0 || y.is_empty() {
        return Err(SoftmaxError::EmptyBatch);
    }
    if w.cols == 0 {
        return Err(SoftmaxError::NoClasses);
    }
    if w.rows != x.cols {
        return Err(SoftmaxError::DimensionMismatch {
            context: "feature dimension (W rows vs X cols)",
            expected: w.rows,
            actual: x.cols,
        });
    }
    if x.rows != y.len() {
        return Err(SoftmaxError::DimensionMismatch {
            context: "batch size (X rows vs label count)",
            expected: x.rows,
            actual: y.len(),
        });
    }
    if let Some((index, &label)) = y.iter().enumerate().find(|&(_, &l)| l >= w.cols) {
        return Err(SoftmaxError::LabelOutOfRange {
            index,
            label,
            num_classes: w.cols,
        });
    }
    Ok(())
}

/// Softmax loss, reference implementation with explicit loops over examples
/// and classes. Kept as the cross-check for `softmax_loss_vectorized`.
pub fn softmax_loss_naive(w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<(f64, Matrix)> {
    validate_inputs(w, x, y, reg)?;

    let (dim, num_classes) = w.shape();
    let num_train = x.rows;
    let mut loss = 0.0;
    let mut dw = Matrix::zeros(dim, num_classes);

    for (i, &label) in y.iter().enumerate() {
        let x_i = x.row(i);

        // f_i = x_i · W
        let mut f_i = vec![0.0; num_classes];
        for (d, &x_id) in x_i.iter().enumerate() {
            for (f, &w_dk) in f_i.iter_mut().zip(w.row(d).iter()) {
                *f += x_id * w_dk;
            }
        }

        let max = f_i.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for f in f_i.iter_mut() {
            *f -= max;
        }

        // max(f_i) is now 0, so sum_j >= 1 and its log is finite.
        let sum_j: f64 = f_i.iter().map(|f| f.exp()).sum();
        loss += sum_j.ln() - f_i[label];

        for (k, &f_ik) in f_i.iter().enumerate() {
            let p_k = f_ik.exp() / sum_j;
            let coeff = if k == label { p_k - 1.0 } else { p_k };
            for (d, &x_id) in x_i.iter().enumerate() {
                dw.data[d][k] += coeff * x_id;
            }
        }
    }

    let n = num_train as f64;
    loss /= n;
    loss += reg * w.sum_squares();
    let dw = dw.scale(1.0 / n) + w.scale(reg);

    debug!(num_train, dim, num_classes, loss, "softmax loss (naive)");
    Ok((loss, dw))
}

/// Softmax loss, vectorized implementation. Inputs and outputs are the same
/// as `softmax_loss_naive`; the per-example gradient updates are summed as
/// the single product Xᵀ · (P − I).
pub fn softmax_loss_vectorized(w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<(f64, Matrix)> {
    validate_inputs(w, x, y, reg)?;

    let num_train = x.rows;
    let num_classes = w.cols;

    let scores = x.matmul(w)?;
    let shifted = scores.broadcast_rows(&scores.row_max(), |f, m| f - m)?;
    let exp = shifted.map(f64::exp);
    let sums = exp.row_sum();
    let probs = exp.broadcast_rows(&sums, |e, s| e / s)?;

    // -log p(y_i) = log Σ_j exp(f'_ij) − f'_{i,y_i}
    let data_loss: f64 = y.iter().zip(sums.data.iter()).zip(shifted.data.iter())
        .map(|((&label, s), row)| s[0].ln() - row[label])
        .sum();

    let n = num_train as f64;
    let loss = data_loss / n + reg * w.sum_squares();

    let indicator = one_hot(y, num_classes);
    let dw = x.transpose().matmul(&(probs - indicator))?.scale(1.0 / n) + w.scale(reg);

    debug!(num_train, dim = w.rows, num_classes, loss, "softmax loss (vectorized)");
    Ok((loss, dw))
}

/// (N, C) matrix with a 1 at (i, y[i]) and 0 elsewhere.
fn one_hot(y: &[usize], num_classes: usize) -> Matrix {
    let mut ind = Matrix::zeros(y.len(), num_classes);
    for (row, &label) in ind.data.iter_mut().zip(y.iter()) {
        row[label] = 1.0;
    }
    ind
}
