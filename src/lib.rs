pub mod error;
pub mod math;
pub mod loss;
pub mod check;

// Convenience re-exports
pub use error::{Result, SoftmaxError};
pub use math::matrix::Matrix;
pub use loss::softmax::{softmax_loss_naive, softmax_loss_vectorized};
pub use loss::softmax_impl::SoftmaxImpl;
pub use loss::loss_config::SoftmaxConfig;
pub use check::grad_check::{compare_implementations, grad_check_sparse, GradCheckReport};
