use crate::filter::{kernels, separable_filter};
use crate::parallel;
use nowcast_image::{Image, ImageError, ImageSize};

/// Size of the image produced by [`pyrdown`] from an image of `size`.
///
/// Odd dimensions round up, so the last row and column are always kept.
pub fn pyrdown_size(size: ImageSize) -> ImageSize {
    ImageSize {
        width: size.width.div_ceil(2),
        height: size.height.div_ceil(2),
    }
}

/// Blur an image and then downsample it by two.
///
/// The image is smoothed with the separable binomial kernel `[1, 4, 6, 4, 1] / 16`
/// and every second pixel of every second row is kept, starting at `(0, 0)`.
///
/// # Arguments
///
/// * `src` - The source image to be downsampled.
/// * `dst` - The destination image, with the size given by [`pyrdown_size`].
///
/// # Example
///
/// ```
/// use nowcast_image::{Image, ImageSize};
/// use nowcast_imgproc::pyramid::{pyrdown, pyrdown_size};
///
/// let image = Image::<f32, 1>::from_size_val(
///     ImageSize {
///         width: 5,
///         height: 4,
///     },
///     1.0,
/// ).unwrap();
///
/// let mut downsampled = Image::<f32, 1>::from_size_val(pyrdown_size(image.size()), 0.0).unwrap();
///
/// pyrdown(&image, &mut downsampled).unwrap();
/// assert_eq!(downsampled.width(), 3);
/// assert_eq!(downsampled.height(), 2);
/// ```
pub fn pyrdown<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
) -> Result<(), ImageError> {
    let expected = pyrdown_size(src.size());

    if dst.size() != expected {
        return Err(ImageError::InvalidImageSize(
            expected.width,
            expected.height,
            dst.width(),
            dst.height(),
        ));
    }

    let mut blurred = Image::<f32, C>::from_size_val(src.size(), 0.0)?;
    let kernel = kernels::pyramid_kernel_1d();
    separable_filter(src, &mut blurred, &kernel, &kernel)?;

    let blurred_cols = blurred.cols();
    let blurred_data = blurred.as_slice();
    parallel::par_iter_rows_indexed(dst, |x, y, dst_pixel| {
        let base = (2 * y * blurred_cols + 2 * x) * C;
        dst_pixel.copy_from_slice(&blurred_data[base..base + C]);
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pyrdown_size() {
        assert_eq!(pyrdown_size([64, 48].into()), [32, 24].into());
        assert_eq!(pyrdown_size([7, 5].into()), [4, 3].into());
        assert_eq!(pyrdown_size([1, 1].into()), [1, 1].into());
    }

    #[test]
    fn test_pyrdown_constant() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::from_size_val([8, 6].into(), 3.0)?;
        let mut dst = Image::<f32, 1>::from_size_val(pyrdown_size(src.size()), 0.0)?;
        pyrdown(&src, &mut dst)?;

        assert_eq!(dst.size(), [4, 3].into());
        for v in dst.as_slice() {
            approx::assert_relative_eq!(*v, 3.0);
        }
        Ok(())
    }

    #[test]
    fn test_pyrdown_keeps_linear_ramp() -> Result<(), ImageError> {
        // the binomial kernel is symmetric, so interior samples of a ramp are exact
        let src = Image::<f32, 1>::from_fn([12, 12].into(), |x, _| x as f32);
        let mut dst = Image::<f32, 1>::from_size_val(pyrdown_size(src.size()), 0.0)?;
        pyrdown(&src, &mut dst)?;

        for x in 1..5 {
            approx::assert_relative_eq!(dst.get_pixel(x, 2, 0)?, 2.0 * x as f32, epsilon = 1e-5);
        }
        Ok(())
    }

    #[test]
    fn test_pyrdown_wrong_size() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::from_size_val([8, 8].into(), 0.0)?;
        let mut dst = Image::<f32, 1>::from_size_val([3, 4].into(), 0.0)?;
        assert_eq!(
            pyrdown(&src, &mut dst),
            Err(ImageError::InvalidImageSize(4, 4, 3, 4))
        );
        Ok(())
    }
}
