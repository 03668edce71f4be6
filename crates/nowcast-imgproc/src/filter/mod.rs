//! Filter operations
//!
//! Separable convolutions with reflective borders, the Gaussian blur applied to
//! the input fields and the gradient operators used by the motion solver.

/// Filter kernels
pub mod kernels;

/// Filter operations
mod ops;
pub use ops::*;

/// Separable filter operations
mod separable_filter;
pub use separable_filter::*;
