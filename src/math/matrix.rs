use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::ops::{Add, Sub, Mul};

use crate::error::{Result, SoftmaxError};

/// Dense row-major matrix of `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Uniform samples in [-1, 1) from the thread-local RNG.
    pub fn random(rows: usize, cols: usize) -> Matrix {
        Matrix::random_with(&mut rand::thread_rng(), rows, cols, 1.0)
    }

    /// Uniform samples in [-scale, scale) drawn from `rng`.
    pub fn random_with<R: Rng + ?Sized>(rng: &mut R, rows: usize, cols: usize, scale: f64) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);

        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = (rng.gen::<f64>() * 2.0 - 1.0) * scale;
            }
        }

        res
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    /// Both u1 and u2 must be uniform on (0, 1].
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Draw two independent uniform samples in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Samples from N(0, std_dev²). A small `std_dev` (e.g. 1e-4) gives the
    /// near-uniform initial weights a fresh linear classifier starts from.
    pub fn gaussian_with<R: Rng + ?Sized>(rng: &mut R, rows: usize, cols: usize, std_dev: f64) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    /// Builds a matrix from row vectors. Panics on empty or ragged input;
    /// use `try_from_data` for caller-supplied data.
    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        match Matrix::try_from_data(data) {
            Ok(m) => m,
            Err(e) => panic!("Matrix::from_data: {e}"),
        }
    }

    pub fn try_from_data(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let rows = data.len();
        let cols = data.first().map(|r| r.len()).unwrap_or(0);
        if cols == 0 {
            return Err(SoftmaxError::DimensionMismatch {
                context: "matrix row width",
                expected: 1,
                actual: 0,
            });
        }
        if let Some(bad) = data.iter().find(|r| r.len() != cols) {
            return Err(SoftmaxError::DimensionMismatch {
                context: "matrix row width",
                expected: cols,
                actual: bad.len(),
            });
        }
        Ok(Matrix { rows, cols, data })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i][j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i]
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Matrix product that reports incompatible shapes instead of panicking.
    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(SoftmaxError::DimensionMismatch {
                context: "matrix product inner dimension",
                expected: self.cols,
                actual: rhs.rows,
            });
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            let out = &mut res.data[i];
            for (k, &a) in self.data[i].iter().enumerate() {
                for (o, &b) in out.iter_mut().zip(rhs.data[k].iter()) {
                    *o += a * b;
                }
            }
        }
        Ok(res)
    }

    /// Largest entry of each row, shape (rows, 1).
    pub fn row_max(&self) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: 1,
            data: self.data.iter()
                .map(|row| vec![row.iter().cloned().fold(f64::NEG_INFINITY, f64::max)])
                .collect(),
        }
    }

    /// Sum of each row, shape (rows, 1).
    pub fn row_sum(&self) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: 1,
            data: self.data.iter()
                .map(|row| vec![row.iter().sum()])
                .collect(),
        }
    }

    /// Errors unless `other` has the same shape, naming the first differing
    /// dimension.
    pub fn check_same_shape(&self, other: &Matrix, context: &'static str) -> Result<()> {
        if self.rows != other.rows {
            return Err(SoftmaxError::DimensionMismatch {
                context,
                expected: self.rows,
                actual: other.rows,
            });
        }
        if self.cols != other.cols {
            return Err(SoftmaxError::DimensionMismatch {
                context,
                expected: self.cols,
                actual: other.cols,
            });
        }
        Ok(())
    }

    /// Applies `f(entry, column_vector[i])` to every entry of row `i`.
    /// `column` must have shape (rows, 1).
    pub fn broadcast_rows<F>(&self, column: &Matrix, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        if column.rows != self.rows {
            return Err(SoftmaxError::DimensionMismatch {
                context: "row broadcast column length",
                expected: self.rows,
                actual: column.rows,
            });
        }
        if column.cols != 1 {
            return Err(SoftmaxError::DimensionMismatch {
                context: "row broadcast column width",
                expected: 1,
                actual: column.cols,
            });
        }
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(column.data.iter())
                .map(|(row, c)| row.iter().map(|&x| f(x, c[0])).collect())
                .collect(),
        })
    }

    /// Σ of every squared entry (the Frobenius norm squared).
    pub fn sum_squares(&self) -> f64 {
        self.data.iter().flatten().map(|x| x * x).sum()
    }

    /// Largest element-wise absolute difference between two same-shape matrices.
    pub fn max_abs_diff(&self, other: &Matrix) -> Result<f64> {
        self.check_same_shape(other, "element-wise comparison")?;
        Ok(self.data.iter().flatten()
            .zip(other.data.iter().flatten())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max))
    }

    /// Serializes the matrix to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a matrix previously written by `save_json`.
    pub fn load_json(path: &str) -> Result<Matrix> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let m: Matrix = serde_json::from_reader(reader)?;
        Matrix::try_from_data(m.data)
    }
}

impl Add for Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = self.data[i][j] + rhs.data[i][j];
            }
        }

        res
    }
}

impl Sub for Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = self.data[i][j] - rhs.data[i][j];
            }
        }

        res
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        match self.matmul(&rhs) {
            Ok(res) => res,
            Err(_) => panic!("Matrices are of incorrect sizes"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn test_matmul_matches_operator() {
        let a = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = Matrix::from_data(vec![vec![0.5, -1.0, 2.0], vec![1.0, 0.0, -2.0]]);
        let expected = Matrix::from_data(vec![vec![2.5, -1.0, -2.0], vec![5.5, -3.0, -2.0]]);
        assert_eq!(a.matmul(&b).unwrap(), expected);
        assert_eq!(a * b, expected);
    }

    #[test]
    fn test_matmul_shape_mismatch() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(2, 3);
        assert!(matches!(
            a.matmul(&b),
            Err(SoftmaxError::DimensionMismatch { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    #[should_panic(expected = "incorrect sizes")]
    fn test_add_panics_on_shape_mismatch() {
        let _ = Matrix::zeros(2, 2) + Matrix::zeros(3, 2);
    }

    #[test]
    fn test_try_from_data_rejects_ragged_rows() {
        let err = Matrix::try_from_data(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, SoftmaxError::DimensionMismatch { expected: 2, actual: 1, .. }));
        assert!(Matrix::try_from_data(vec![]).is_err());
    }

    #[test]
    fn test_row_reductions() {
        let m = Matrix::from_data(vec![vec![1.0, -3.0, 2.0], vec![-1.0, -2.0, -0.5]]);
        assert_eq!(m.row_max().data, vec![vec![2.0], vec![-0.5]]);
        assert_eq!(m.row_sum().data, vec![vec![0.0], vec![-3.5]]);
        let shifted = m.broadcast_rows(&m.row_max(), |x, c| x - c).unwrap();
        assert_eq!(shifted.data[0], vec![-1.0, -5.0, 0.0]);
        assert_eq!(shifted.data[1], vec![-0.5, -1.5, 0.0]);
    }

    #[test]
    fn test_broadcast_rows_rejects_wrong_column() {
        let m = Matrix::zeros(3, 2);
        let err = m.broadcast_rows(&Matrix::zeros(2, 1), |x, c| x + c).unwrap_err();
        assert!(matches!(err, SoftmaxError::DimensionMismatch { expected: 3, actual: 2, .. }));
        let err = m.broadcast_rows(&Matrix::zeros(3, 2), |x, c| x + c).unwrap_err();
        assert!(matches!(err, SoftmaxError::DimensionMismatch { expected: 1, actual: 2, .. }));
    }

    #[test]
    fn test_max_abs_diff_reports_shape_mismatch() {
        let a = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = Matrix::from_data(vec![vec![1.5, 2.0], vec![3.0, 1.0]]);
        assert_eq!(a.max_abs_diff(&b).unwrap(), 3.0);
        let err = a.max_abs_diff(&Matrix::zeros(2, 3)).unwrap_err();
        assert!(matches!(err, SoftmaxError::DimensionMismatch { expected: 2, actual: 3, .. }));
    }

    #[test]
    fn test_matmul_propagates_nan_from_zero_times_inf() {
        let a = Matrix::from_data(vec![vec![0.0, 1.0]]);
        let b = Matrix::from_data(vec![vec![f64::INFINITY], vec![2.0]]);
        assert!(a.matmul(&b).unwrap().get(0, 0).is_nan());
    }

    #[test]
    fn test_sum_squares_and_transpose() {
        let m = Matrix::from_data(vec![vec![1.0, 2.0, 3.0]]);
        assert_eq!(m.sum_squares(), 14.0);
        let t = m.transpose();
        assert_eq!(t.shape(), (3, 1));
        assert_eq!(t.get(2, 0), 3.0);
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let a = Matrix::random_with(&mut StdRng::seed_from_u64(7), 4, 3, 0.5);
        let b = Matrix::random_with(&mut StdRng::seed_from_u64(7), 4, 3, 0.5);
        assert_eq!(a, b);
        assert!(Matrix::random(3, 3).data.iter().flatten().all(|x| (-1.0..1.0).contains(x)));
        assert!(a.data.iter().flatten().all(|x| x.abs() <= 0.5));

        let g = Matrix::gaussian_with(&mut StdRng::seed_from_u64(7), 10, 10, 1e-4);
        assert!(g.data.iter().flatten().all(|x| x.is_finite() && x.abs() < 1e-2));
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.json");
        let path = path.to_str().unwrap();
        let m = Matrix::from_data(vec![vec![0.25, -1.5], vec![3.0, 0.0]]);
        m.save_json(path).unwrap();
        assert_eq!(Matrix::load_json(path).unwrap(), m);
    }
}
