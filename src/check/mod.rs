pub mod grad_check;

pub use grad_check::{
    compare_implementations, grad_check_sparse, EquivalenceReport, GradCheckReport, GradCheckSample,
};
