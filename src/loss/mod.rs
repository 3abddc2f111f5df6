pub mod softmax;
pub mod softmax_impl;
pub mod loss_config;

pub use softmax::{softmax_loss_naive, softmax_loss_vectorized};
pub use softmax_impl::SoftmaxImpl;
pub use loss_config::SoftmaxConfig;
