#![deny(missing_docs)]
//! Dense motion estimation between two consecutive scalar fields with the
//! multi-resolution anisotropic diffusion method of Proesmans et al. (1994).
//!
//! ```
//! use ndarray::Array3;
//! use nowcast_motion::{compute_motion_field, ProesmansConfig};
//!
//! let input_images = Array3::<f32>::from_shape_fn((2, 32, 40), |(k, y, x)| {
//!     ((x as f32 - k as f32) / 5.0).sin() + (y as f32 / 7.0).cos()
//! });
//!
//! let config = ProesmansConfig::default().with_num_iter(20);
//! let motion = compute_motion_field(&input_images, &config).unwrap();
//! assert_eq!(motion.shape(), &[2, 32, 40]);
//! ```

/// parameters of the estimation.
pub mod config;

/// coarse-to-fine driver.
pub mod coordinator;

/// error types.
pub mod error;

/// dense displacement fields.
pub mod field;

/// input validation, normalization and smoothing.
pub mod preprocess;

/// multi-resolution image pairs.
pub mod pyramid;

/// per-level diffusion solver.
pub mod solver;

use ndarray::{Array3, ArrayBase, Data, Dimension};

pub use crate::config::ProesmansConfig;
pub use crate::coordinator::{estimate_motion, MotionEstimate};
pub use crate::error::{MotionError, ShapeError};
pub use crate::field::MotionField;
pub use crate::preprocess::ImagePair;

/// Compute the motion field between the two frames of `input_images`.
///
/// # Arguments
///
/// * `input_images` - Array of shape `(2, m, n)` holding the earlier and the later frame.
/// * `config` - Estimation parameters, see [`ProesmansConfig`].
///
/// # Returns
///
/// The forward motion field of shape `(2, m, n)`: `[0]` is the displacement along
/// the columns and `[1]` along the rows.
///
/// # Errors
///
/// Fails with [`MotionError::Shape`] when the input is not `(2, m, n)`, with
/// [`MotionError::InvalidParameter`] for an invalid configuration and with
/// [`MotionError::NonFiniteInput`] when a value is NaN or infinite.
pub fn compute_motion_field<S, D>(
    input_images: &ArrayBase<S, D>,
    config: &ProesmansConfig,
) -> Result<Array3<f32>, MotionError>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let estimate = compute_motion_field_full(input_images, config)?;
    Ok(estimate.forward.to_array())
}

/// Like [`compute_motion_field`], returning the backward field and the consistency
/// maps as well.
pub fn compute_motion_field_full<S, D>(
    input_images: &ArrayBase<S, D>,
    config: &ProesmansConfig,
) -> Result<MotionEstimate, MotionError>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    config.validate()?;
    let pair = ImagePair::from_array(input_images)?;
    coordinator::estimate_pair(&pair, config)
}
