use nowcast_image::{Image, ImageError};
use rayon::prelude::*;

/// Map a possibly out of range index onto `[0, len)` by mirroring about the edges.
///
/// The edge sample is repeated, i.e. `(d c b a | a b c d | d c b a)`.
#[inline]
pub fn reflect_index(idx: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let m = idx.rem_euclid(period);
    if m < len as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

/// A separable 2D filter that applies horizontal and vertical 1D correlations sequentially.
///
/// This struct caches the kernel data and precomputed offsets for efficient filtering.
struct SeparableFilter<'a> {
    kernel_x: &'a [f32],
    kernel_y: &'a [f32],
    offsets_x: Vec<isize>,
    offsets_y: Vec<isize>,
}

impl<'a> SeparableFilter<'a> {
    fn new(kernel_x: &'a [f32], kernel_y: &'a [f32]) -> Self {
        let half_x = (kernel_x.len() / 2) as isize;
        let half_y = (kernel_y.len() / 2) as isize;

        Self {
            kernel_x,
            kernel_y,
            offsets_x: (0..kernel_x.len() as isize).map(|i| i - half_x).collect(),
            offsets_y: (0..kernel_y.len() as isize).map(|i| i - half_y).collect(),
        }
    }

    /// Horizontal pass into a temporary buffer, then vertical pass into `dst_data`.
    fn apply<const C: usize>(
        &self,
        src_data: &[f32],
        dst_data: &mut [f32],
        rows: usize,
        cols: usize,
    ) {
        let row_len = cols * C;
        let mut temp = vec![0.0f32; src_data.len()];

        // Horizontal
        temp.par_chunks_mut(row_len)
            .zip(src_data.par_chunks(row_len))
            .for_each(|(row_temp, row_src)| {
                for c in 0..cols {
                    let mut acc = [0.0f32; C];
                    for (&k, &off) in self.kernel_x.iter().zip(self.offsets_x.iter()) {
                        let x = reflect_index(c as isize + off, cols);
                        for (ch, acc_val) in acc.iter_mut().enumerate() {
                            *acc_val += row_src[x * C + ch] * k;
                        }
                    }
                    row_temp[c * C..(c + 1) * C].copy_from_slice(&acc);
                }
            });

        // Vertical
        dst_data
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(r, row_dst)| {
                row_dst.iter_mut().for_each(|v| *v = 0.0);
                for (&k, &off) in self.kernel_y.iter().zip(self.offsets_y.iter()) {
                    let y = reflect_index(r as isize + off, rows);
                    let row_temp = &temp[y * row_len..(y + 1) * row_len];
                    row_dst
                        .iter_mut()
                        .zip(row_temp.iter())
                        .for_each(|(d, &t)| *d += t * k);
                }
            });
    }
}

/// Apply a separable filter to an image.
///
/// The kernels are applied as correlations centered on each pixel, and samples
/// outside the image are mirrored back inside (see [`reflect_index`]).
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_x` - The horizontal kernel.
/// * `kernel_y` - The vertical kernel.
pub fn separable_filter<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
) -> Result<(), ImageError> {
    if kernel_x.is_empty() || kernel_y.is_empty() {
        return Err(ImageError::InvalidKernelLength(
            kernel_x.len(),
            kernel_y.len(),
        ));
    }

    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if src.as_slice().is_empty() {
        return Ok(());
    }

    let (rows, cols) = (src.rows(), src.cols());
    SeparableFilter::new(kernel_x, kernel_y).apply::<C>(
        src.as_slice(),
        dst.as_slice_mut(),
        rows,
        cols,
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nowcast_image::ImageSize;

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(0, 4), 0);
        assert_eq!(reflect_index(3, 4), 3);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(9, 4), 1);
        assert_eq!(reflect_index(-3, 1), 0);
    }

    #[test]
    fn test_separable_filter_box() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 5,
            height: 5,
        };

        let mut img = Image::<f32, 1>::from_size_val(size, 0.0)?;
        img.set_pixel(2, 2, 0, 9.0)?;

        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;
        let kernel = [1.0, 1.0, 1.0];
        separable_filter(&img, &mut dst, &kernel, &kernel)?;

        #[rustfmt::skip]
        assert_eq!(
            dst.as_slice(),
            &[
                0.0, 0.0, 0.0, 0.0, 0.0,
                0.0, 9.0, 9.0, 9.0, 0.0,
                0.0, 9.0, 9.0, 9.0, 0.0,
                0.0, 9.0, 9.0, 9.0, 0.0,
                0.0, 0.0, 0.0, 0.0, 0.0,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_separable_filter_preserves_constant() -> Result<(), ImageError> {
        let img = Image::<f32, 2>::from_size_val([7, 3].into(), 4.0)?;
        let mut dst = Image::<f32, 2>::from_size_val(img.size(), 0.0)?;
        let kernel = [0.25, 0.5, 0.25];
        separable_filter(&img, &mut dst, &kernel, &kernel)?;

        for v in dst.as_slice() {
            approx::assert_relative_eq!(*v, 4.0);
        }
        Ok(())
    }

    #[test]
    fn test_separable_filter_errors() -> Result<(), ImageError> {
        let img = Image::<f32, 1>::from_size_val([3, 3].into(), 0.0)?;
        let mut dst = Image::<f32, 1>::from_size_val([4, 3].into(), 0.0)?;

        assert_eq!(
            separable_filter(&img, &mut dst, &[1.0], &[1.0]),
            Err(ImageError::InvalidImageSize(3, 3, 4, 3))
        );

        let mut dst = Image::<f32, 1>::from_size_val([3, 3].into(), 0.0)?;
        assert_eq!(
            separable_filter(&img, &mut dst, &[], &[1.0]),
            Err(ImageError::InvalidKernelLength(0, 1))
        );
        Ok(())
    }
}
