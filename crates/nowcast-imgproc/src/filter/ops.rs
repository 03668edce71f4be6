use nowcast_image::{Image, ImageError};

use super::{kernels, separable_filter};

/// Number of standard deviations covered by [`gaussian_filter`] on each side.
pub const GAUSSIAN_TRUNCATE: f32 = 4.0;

/// Blur an image using a gaussian blur filter
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_size` - The size of the kernel (kernel_x, kernel_y).
/// * `sigma` - The sigma of the gaussian kernel.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn gaussian_blur<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel_size: (usize, usize),
    sigma: (f32, f32),
) -> Result<(), ImageError> {
    let kernel_x = kernels::gaussian_kernel_1d(kernel_size.0, sigma.0);
    let kernel_y = kernels::gaussian_kernel_1d(kernel_size.1, sigma.1);
    separable_filter(src, dst, &kernel_x, &kernel_y)?;
    Ok(())
}

/// Isotropic gaussian smoothing with a kernel sized from `sigma`.
///
/// The kernel spans [`GAUSSIAN_TRUNCATE`] standard deviations on each side, at most
/// the larger image dimension, and the borders are mirrored. A non-positive `sigma`
/// copies `src` into `dst` untouched.
pub fn gaussian_filter<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    sigma: f32,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if sigma <= 0.0 {
        dst.as_slice_mut().copy_from_slice(src.as_slice());
        return Ok(());
    }

    let max_radius = src.cols().max(src.rows());
    let kernel_size = kernels::gaussian_kernel_size(sigma, GAUSSIAN_TRUNCATE, max_radius);
    gaussian_blur(src, dst, (kernel_size, kernel_size), (sigma, sigma))
}

/// Compute the first order spatial gradients with central differences.
///
/// `dx` holds `(I(x + 1, y) - I(x - 1, y)) / 2` and `dy` the same along rows.
/// Border samples are mirrored, so the derivative is halved on the outermost pixels.
///
/// PRECONDITION: `src`, `dx` and `dy` must have the same shape.
pub fn spatial_gradient<const C: usize>(
    src: &Image<f32, C>,
    dx: &mut Image<f32, C>,
    dy: &mut Image<f32, C>,
) -> Result<(), ImageError> {
    let (diff, identity) = kernels::central_difference_kernel_1d();
    separable_filter(src, dx, &diff, &identity)?;
    separable_filter(src, dy, &identity, &diff)?;
    Ok(())
}
