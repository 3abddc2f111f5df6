use serde::{Serialize, Deserialize};

use crate::error::{Result, SoftmaxError};
use crate::loss::softmax_impl::SoftmaxImpl;
use crate::math::matrix::Matrix;

/// Configuration for a softmax loss evaluation.
///
/// # Fields
/// - `reg`            — L2 regularization strength; finite and non-negative
/// - `implementation` — which implementation computes the loss; missing in
///                      JSON means `vectorized`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxConfig {
    pub reg: f64,
    #[serde(default)]
    pub implementation: SoftmaxImpl,
}

impl SoftmaxConfig {
    pub fn new(reg: f64, implementation: SoftmaxImpl) -> Self {
        SoftmaxConfig { reg, implementation }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.reg.is_finite() || self.reg < 0.0 {
            return Err(SoftmaxError::InvalidRegularization(self.reg));
        }
        Ok(())
    }

    /// Parses and validates a JSON config such as `{"reg": 5e-4}`.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: SoftmaxConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_json(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        SoftmaxConfig::from_json_str(&contents)
    }

    /// Computes `(loss, dW)` with the configured implementation and strength.
    pub fn evaluate(&self, w: &Matrix, x: &Matrix, y: &[usize]) -> Result<(f64, Matrix)> {
        self.implementation.evaluate(w, x, y, self.reg)
    }
}

impl Default for SoftmaxConfig {
    fn default() -> Self {
        SoftmaxConfig::new(0.0, SoftmaxImpl::Vectorized)
    }
}
