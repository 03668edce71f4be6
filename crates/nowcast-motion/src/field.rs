use ndarray::Array3;

use nowcast_image::{Image, ImageError, ImageSize};
use nowcast_imgproc::interpolation::{bilinear_interpolation, resize_bilinear_scaled};

use crate::pyramid::LEVEL_SCALE;

/// Dense displacement field with the `(u, v)` components interleaved per pixel.
///
/// `u` is the displacement along the columns (x) and `v` along the rows (y). For a
/// field estimated from frame `a` to frame `b`, `b(p + V(p))` matches `a(p)`.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionField(Image<f32, 2>);

impl MotionField {
    /// A field without motion.
    pub fn zeros(size: ImageSize) -> Result<Self, ImageError> {
        Ok(Self(Image::from_size_val(size, 0.0)?))
    }

    /// Build a field from separate `u` and `v` components.
    pub fn from_components(u: &Image<f32, 1>, v: &Image<f32, 1>) -> Result<Self, ImageError> {
        if u.size() != v.size() {
            return Err(ImageError::InvalidImageSize(
                u.cols(),
                u.rows(),
                v.cols(),
                v.rows(),
            ));
        }

        let data = u
            .as_slice()
            .iter()
            .zip(v.as_slice())
            .flat_map(|(&u, &v)| [u, v])
            .collect();
        Ok(Self(Image::new(u.size(), data)?))
    }

    /// Size of the field in pixels.
    pub fn size(&self) -> ImageSize {
        self.0.size()
    }

    /// The underlying interleaved image.
    pub fn as_image(&self) -> &Image<f32, 2> {
        &self.0
    }

    /// Mutable access to the underlying interleaved image.
    pub fn as_image_mut(&mut self) -> &mut Image<f32, 2> {
        &mut self.0
    }

    /// Displacement at a pixel.
    pub fn get(&self, x: usize, y: usize) -> Result<[f32; 2], ImageError> {
        Ok([self.0.get_pixel(x, y, 0)?, self.0.get_pixel(x, y, 1)?])
    }

    /// Bilinearly interpolated displacement at a sub-pixel position, clamped to the border.
    pub fn sample(&self, x: f32, y: f32) -> [f32; 2] {
        bilinear_interpolation(&self.0, x, y)
    }

    /// Split into the `u` and `v` component images.
    pub fn components(&self) -> Result<(Image<f32, 1>, Image<f32, 1>), ImageError> {
        let (u, v): (Vec<f32>, Vec<f32>) = self
            .0
            .as_slice()
            .chunks_exact(2)
            .map(|px| (px[0], px[1]))
            .unzip();
        Ok((Image::new(self.size(), u)?, Image::new(self.size(), v)?))
    }

    /// Mean displacement over the pixels of `rows` x `cols`.
    pub fn mean_over(
        &self,
        cols: std::ops::Range<usize>,
        rows: std::ops::Range<usize>,
    ) -> Result<[f32; 2], ImageError> {
        let mut sum = [0.0f64; 2];
        let mut count = 0usize;
        for y in rows {
            for x in cols.clone() {
                let [u, v] = self.get(x, y)?;
                sum[0] += u as f64;
                sum[1] += v as f64;
                count += 1;
            }
        }

        if count == 0 {
            return Err(ImageError::ImageDataNotInitialized);
        }

        Ok([(sum[0] / count as f64) as f32, (sum[1] / count as f64) as f32])
    }

    /// Mean displacement over the whole field.
    pub fn mean(&self) -> Result<[f32; 2], ImageError> {
        let size = self.size();
        self.mean_over(0..size.width, 0..size.height)
    }

    /// Largest displacement magnitude.
    pub fn max_magnitude(&self) -> f32 {
        self.0
            .as_slice()
            .chunks_exact(2)
            .map(|px| px[0].hypot(px[1]))
            .fold(0.0, f32::max)
    }

    /// Carry the field to the next finer pyramid level of `size`.
    ///
    /// Components are bilinearly interpolated on the finer grid and multiplied by
    /// the level ratio, since a displacement of one coarse pixel spans
    /// [`LEVEL_SCALE`] fine pixels.
    pub fn upsample(&self, size: ImageSize) -> Result<Self, ImageError> {
        let mut dst = Image::from_size_val(size, 0.0)?;
        resize_bilinear_scaled(&self.0, &mut dst, LEVEL_SCALE, LEVEL_SCALE)?;
        Ok(Self(dst))
    }

    /// Stack the components into an array of shape `(2, m, n)`, `u` first.
    pub fn to_array(&self) -> Array3<f32> {
        let size = self.size();
        let data = self.0.as_slice();
        Array3::from_shape_fn((2, size.height, size.width), |(c, y, x)| {
            data[(y * size.width + x) * 2 + c]
        })
    }
}
