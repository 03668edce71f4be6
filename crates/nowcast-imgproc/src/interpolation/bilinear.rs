use nowcast_image::{Image, ImageError};

use crate::parallel;

/// Kernel for bilinear interpolation
///
/// Coordinates outside the image are clamped to the border pixels, so the
/// function is defined on the whole plane.
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
///
/// # Returns
///
/// The interpolated pixel values.
///
/// PRECONDITION: the image is not empty.
pub fn bilinear_interpolation<const C: usize>(image: &Image<f32, C>, u: f32, v: f32) -> [f32; C] {
    let (rows, cols) = (image.rows(), image.cols());

    let u = u.clamp(0.0, (cols - 1) as f32);
    let v = v.clamp(0.0, (rows - 1) as f32);

    let iu0 = (u.floor() as usize).min(cols - 1);
    let iv0 = (v.floor() as usize).min(rows - 1);

    let frac_u = u - iu0 as f32;
    let frac_v = v - iv0 as f32;

    let frac_uu = 1.0 - frac_u;
    let frac_vv = 1.0 - frac_v;

    let w00 = frac_uu * frac_vv;
    let w01 = frac_u * frac_vv;
    let w10 = frac_uu * frac_v;
    let w11 = frac_u * frac_v;

    let iu1 = if iu0 + 1 < cols { iu0 + 1 } else { iu0 };
    let iv1 = if iv0 + 1 < rows { iv0 + 1 } else { iv0 };

    let base00 = (iv0 * cols + iu0) * C;
    let base01 = (iv0 * cols + iu1) * C;
    let base10 = (iv1 * cols + iu0) * C;
    let base11 = (iv1 * cols + iu1) * C;

    let data = image.as_slice();

    let mut pixel = [0.0; C];
    for (k, p) in pixel.iter_mut().enumerate() {
        *p = data[base00 + k] * w00
            + data[base01 + k] * w01
            + data[base10 + k] * w10
            + data[base11 + k] * w11;
    }

    pixel
}

/// Resample `src` onto the grid of `dst`, where `dst` is `scale` times finer.
///
/// The destination pixel `(x, y)` reads the source at `(x / scale, y / scale)`,
/// which is the inverse of keeping every `scale`-th pixel when downsampling.
/// Every sampled value is multiplied by `value_scale`; displacement fields pass
/// the grid ratio here so that their magnitudes follow the resolution change.
pub fn resize_bilinear_scaled<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    scale: f32,
    value_scale: f32,
) -> Result<(), ImageError> {
    if src.as_slice().is_empty() {
        return Err(ImageError::ImageDataNotInitialized);
    }

    parallel::par_iter_rows_indexed(dst, |x, y, dst_pixel| {
        let pixel = bilinear_interpolation(src, x as f32 / scale, y as f32 / scale);
        dst_pixel
            .iter_mut()
            .zip(pixel.iter())
            .for_each(|(d, &p)| *d = p * value_scale);
    });

    Ok(())
}
