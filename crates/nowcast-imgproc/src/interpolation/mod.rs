/// Bilinear sampling of images at sub-pixel positions.
pub mod bilinear;

pub use bilinear::{bilinear_interpolation, resize_bilinear_scaled};
