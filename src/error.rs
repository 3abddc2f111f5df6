//! Error types for softmax loss evaluation.

use thiserror::Error;

/// Invalid caller input. Every variant is reported before any arithmetic runs.
#[derive(Debug, Error)]
pub enum SoftmaxError {
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Label {label} of example {index} is outside [0, {num_classes})")]
    LabelOutOfRange {
        index: usize,
        label: usize,
        num_classes: usize,
    },

    #[error("Batch is empty: at least one example is required")]
    EmptyBatch,

    #[error("Weight matrix has no classes")]
    NoClasses,

    #[error("Regularization strength must be finite and non-negative, got {0}")]
    InvalidRegularization(f64),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for softmax operations
pub type Result<T> = std::result::Result<T, SoftmaxError>;
