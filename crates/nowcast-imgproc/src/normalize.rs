//! Min-max rescaling of pixel values.
//!
//! Motion estimation compares intensities between two frames, so both frames
//! must be mapped with the *same* affine transform. [`find_min_max`] gives the
//! range of one image; callers combine ranges and apply them with
//! [`normalize_range`].

use num_traits::{Float, NumCast, ToPrimitive};

use nowcast_image::{Image, ImageError};

use crate::parallel;

/// Find the minimum and maximum values in an image.
///
/// # Errors
///
/// Returns [`ImageError::ImageDataNotInitialized`] for an empty image.
pub fn find_min_max<T, const C: usize>(image: &Image<T, C>) -> Result<(T, T), ImageError>
where
    T: Clone + Copy + PartialOrd,
{
    // get the first element in the image
    let first_element = match image.as_slice().iter().next() {
        Some(x) => x,
        None => return Err(ImageError::ImageDataNotInitialized),
    };

    let mut min = first_element;
    let mut max = first_element;

    for x in image.as_slice().iter() {
        if x < min {
            min = x;
        }
        if x > max {
            max = x;
        }
    }

    Ok((*min, *max))
}

/// Linearly map the values of `src` from `src_range` onto `dst_range`.
///
/// A degenerate source range (`src_range.0 == src_range.1`) maps every pixel to
/// `dst_range.0` instead of dividing by zero. The mapping is evaluated in `f64`, so
/// ranges wider than the largest finite `T` still give finite results.
///
/// # Arguments
///
/// * `src` - The input image with shape (H, W, C).
/// * `dst` - The output image with shape (H, W, C).
/// * `src_range` - The `(min, max)` interval to map from.
/// * `dst_range` - The `(min, max)` interval to map to.
pub fn normalize_range<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    src_range: (T, T),
    dst_range: (T, T),
) -> Result<(), ImageError>
where
    T: Send + Sync + Float,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let to_f64 = |v: T| ToPrimitive::to_f64(&v).unwrap_or(f64::NAN);
    let (min_val, max_val) = (to_f64(src_range.0), to_f64(src_range.1));
    let (min, max) = (to_f64(dst_range.0), to_f64(dst_range.1));
    let span = max_val - min_val;

    if span == 0.0 {
        dst.as_slice_mut().iter_mut().for_each(|v| *v = dst_range.0);
        return Ok(());
    }

    let scale = (max - min) / span;
    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        src_pixel
            .iter()
            .zip(dst_pixel.iter_mut())
            .for_each(|(&src_val, dst_val)| {
                let val = (to_f64(src_val) - min_val) * scale + min;
                *dst_val = <T as NumCast>::from(val).unwrap_or(dst_range.0);
            });
    });

    Ok(())
}
