use log::{debug, warn};
use ndarray::{ArrayBase, Axis, Data, Dimension, Ix3};

use nowcast_image::{Image, ImageError, ImageSize};
use nowcast_imgproc::{filter::gaussian_filter, normalize};

use crate::error::{MotionError, ShapeError};

/// Upper bound of the intensity range both frames are rescaled to.
pub const INTENSITY_MAX: f32 = 255.0;

/// Two frames of the same size, the first observed before the second.
#[derive(Clone, Debug, PartialEq)]
pub struct ImagePair {
    /// The earlier frame.
    pub first: Image<f32, 1>,
    /// The later frame.
    pub second: Image<f32, 1>,
}

impl ImagePair {
    /// Pair two frames.
    ///
    /// # Errors
    ///
    /// Fails with [`ShapeError`] if the frames differ in size or are empty, and with
    /// [`MotionError::NonFiniteInput`] if any value is NaN or infinite.
    pub fn new(first: Image<f32, 1>, second: Image<f32, 1>) -> Result<Self, MotionError> {
        let size = first.size();
        if second.size() != size || size.num_pixels() == 0 {
            return Err(ShapeError::new(&[
                2,
                size.height.max(second.height()),
                size.width.max(second.width()),
            ])
            .into());
        }

        let non_finite = first
            .as_slice()
            .iter()
            .chain(second.as_slice())
            .filter(|v| !v.is_finite())
            .count();
        if non_finite > 0 {
            return Err(MotionError::NonFiniteInput(non_finite));
        }

        Ok(Self { first, second })
    }

    /// Copy the last two frames out of a `(2, m, n)` array.
    ///
    /// The array may have any memory layout; the frames are always fresh copies.
    ///
    /// # Errors
    ///
    /// Fails with [`ShapeError`] unless the array is three dimensional with a leading
    /// dimension of exactly two and non-empty frames.
    pub fn from_array<S, D>(input_images: &ArrayBase<S, D>) -> Result<Self, MotionError>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        let shape = input_images.shape();
        if shape.len() != 3 || shape[0] != 2 {
            return Err(ShapeError::new(shape).into());
        }

        let view = input_images
            .view()
            .into_dimensionality::<Ix3>()
            .map_err(|_| ShapeError::new(shape))?;

        let (num_frames, height, width) = view.dim();
        let size = ImageSize { width, height };

        let frame = |index: usize| -> Result<Image<f32, 1>, MotionError> {
            let data = view.index_axis(Axis(0), index).iter().copied().collect();
            Ok(Image::new(size, data)?)
        };

        Self::new(frame(num_frames - 2)?, frame(num_frames - 1)?)
    }

    /// Size shared by both frames.
    pub fn size(&self) -> ImageSize {
        self.first.size()
    }
}

/// Rescale both frames with their joint minimum and maximum onto `[0, 255]`.
///
/// Constant input (equal minimum and maximum) yields two zero frames.
pub fn normalize_pair(pair: &ImagePair) -> Result<ImagePair, MotionError> {
    let (min1, max1) = normalize::find_min_max(&pair.first)?;
    let (min2, max2) = normalize::find_min_max(&pair.second)?;
    let range = (min1.min(min2), max1.max(max2));

    if range.0 == range.1 {
        warn!(
            "input frames are constant ({}), using zero intensities",
            range.0
        );
    }

    let mut first = Image::from_size_val(pair.size(), 0.0)?;
    let mut second = Image::from_size_val(pair.size(), 0.0)?;
    normalize::normalize_range(&pair.first, &mut first, range, (0.0, INTENSITY_MAX))?;
    normalize::normalize_range(&pair.second, &mut second, range, (0.0, INTENSITY_MAX))?;

    Ok(ImagePair { first, second })
}

/// Blur both frames with a Gaussian of standard deviation `filter_std`.
///
/// `filter_std <= 0` returns an exact copy of the input.
pub fn smooth_pair(pair: &ImagePair, filter_std: f32) -> Result<ImagePair, MotionError> {
    if filter_std <= 0.0 {
        return Ok(pair.clone());
    }

    let smooth = |src: &Image<f32, 1>| -> Result<Image<f32, 1>, ImageError> {
        let mut dst = Image::from_size_val(src.size(), 0.0)?;
        gaussian_filter(src, &mut dst, filter_std)?;
        Ok(dst)
    };

    Ok(ImagePair {
        first: smooth(&pair.first)?,
        second: smooth(&pair.second)?,
    })
}

/// Normalize and optionally smooth an image pair before estimation.
pub fn preprocess(pair: &ImagePair, filter_std: f32) -> Result<ImagePair, MotionError> {
    debug!(
        "preprocessing {} pair, filter_std={}",
        pair.size(),
        filter_std
    );
    let normalized = normalize_pair(pair)?;
    smooth_pair(&normalized, filter_std)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array2, Array3, ShapeBuilder};

    fn ramp_pair() -> Array3<f32> {
        Array::from_shape_fn((2, 3, 4), |(k, y, x)| (k * 100 + y * 10 + x) as f32)
    }

    #[test]
    fn from_array_copies_frames() -> Result<(), MotionError> {
        let input = ramp_pair();
        let pair = ImagePair::from_array(&input)?;

        assert_eq!(pair.size(), ImageSize { width: 4, height: 3 });
        assert_eq!(pair.first.get_pixel(3, 2, 0)?, 23.0);
        assert_eq!(pair.second.get_pixel(1, 0, 0)?, 101.0);
        Ok(())
    }

    #[test]
    fn from_array_fortran_layout() -> Result<(), MotionError> {
        let input = ramp_pair();
        let mut fortran = Array3::<f32>::zeros((2, 3, 4).f());
        fortran.assign(&input);

        let pair = ImagePair::from_array(&fortran)?;
        assert_eq!(pair, ImagePair::from_array(&input)?);
        Ok(())
    }

    #[test]
    fn from_array_dynamic_dimension() -> Result<(), MotionError> {
        let input = ramp_pair().into_dyn();
        let pair = ImagePair::from_array(&input)?;
        assert_eq!(pair.size(), ImageSize { width: 4, height: 3 });
        Ok(())
    }

    #[test]
    fn from_array_rejects_bad_shapes() {
        let three_frames = Array3::<f32>::zeros((3, 4, 4));
        match ImagePair::from_array(&three_frames) {
            Err(MotionError::Shape(err)) => assert_eq!(err.shape, vec![3, 4, 4]),
            other => panic!("expected a shape error, got {other:?}"),
        }

        let flat = Array2::<f32>::zeros((2, 4));
        assert!(matches!(
            ImagePair::from_array(&flat),
            Err(MotionError::Shape(_))
        ));

        let empty = Array3::<f32>::zeros((2, 0, 4));
        assert!(matches!(
            ImagePair::from_array(&empty),
            Err(MotionError::Shape(_))
        ));
    }

    #[test]
    fn from_array_rejects_non_finite() {
        let mut input = ramp_pair();
        input[[1, 2, 2]] = f32::NAN;
        input[[0, 0, 0]] = f32::INFINITY;
        assert!(matches!(
            ImagePair::from_array(&input),
            Err(MotionError::NonFiniteInput(2))
        ));
    }

    #[test]
    fn normalize_pair_joint_range() -> Result<(), MotionError> {
        let first = Image::new([2, 1].into(), vec![10.0, 20.0])?;
        let second = Image::new([2, 1].into(), vec![30.0, 50.0])?;
        let pair = normalize_pair(&ImagePair::new(first, second)?)?;

        approx::assert_relative_eq!(pair.first.as_slice()[0], 0.0);
        approx::assert_relative_eq!(pair.first.as_slice()[1], 255.0 / 4.0);
        approx::assert_relative_eq!(pair.second.as_slice()[0], 255.0 / 2.0);
        approx::assert_relative_eq!(pair.second.as_slice()[1], 255.0);
        Ok(())
    }

    #[test]
    fn normalize_pair_constant_input() -> Result<(), MotionError> {
        let frame = Image::from_size_val([5, 5].into(), 3.5)?;
        let pair = normalize_pair(&ImagePair::new(frame.clone(), frame)?)?;
        assert!(pair.first.as_slice().iter().all(|&v| v == 0.0));
        assert!(pair.second.as_slice().iter().all(|&v| v == 0.0));
        Ok(())
    }

    #[test]
    fn normalize_pair_extreme_range() -> Result<(), MotionError> {
        let mut first = Image::from_size_val([4, 4].into(), 0.0)?;
        let mut second = Image::from_size_val([4, 4].into(), 0.0)?;
        first.set_pixel(0, 0, 0, -3e38)?;
        second.set_pixel(3, 3, 0, 3e38)?;

        let pair = normalize_pair(&ImagePair::new(first, second)?)?;
        for v in pair.first.as_slice().iter().chain(pair.second.as_slice()) {
            assert!(v.is_finite() && (0.0..=255.0).contains(v), "value {v}");
        }
        assert_eq!(pair.first.get_pixel(0, 0, 0)?, 0.0);
        assert_eq!(pair.second.get_pixel(3, 3, 0)?, 255.0);
        approx::assert_relative_eq!(pair.first.get_pixel(1, 1, 0)?, 127.5);
        Ok(())
    }

    #[test]
    fn zero_filter_std_is_pass_through() -> Result<(), MotionError> {
        let pair = ImagePair::from_array(&ramp_pair())?;
        let normalized = normalize_pair(&pair)?;

        assert_eq!(preprocess(&pair, 0.0)?, normalized);
        assert_eq!(preprocess(&pair, -2.0)?, normalized);
        Ok(())
    }

    #[test]
    fn huge_filter_std_is_clipped() -> Result<(), MotionError> {
        let pair = ImagePair::from_array(&ramp_pair())?;
        let smoothed = preprocess(&pair, 1e30)?;

        assert_eq!(smoothed.size(), pair.size());
        for v in smoothed.first.as_slice().iter().chain(smoothed.second.as_slice()) {
            assert!(v.is_finite() && (0.0..=255.0).contains(v), "value {v}");
        }
        Ok(())
    }

    #[test]
    fn positive_filter_std_smooths() -> Result<(), MotionError> {
        let mut first = Image::from_size_val([9, 9].into(), 0.0)?;
        first.set_pixel(4, 4, 0, 1.0)?;
        let second = first.clone();

        let pair = preprocess(&ImagePair::new(first, second)?, 1.0)?;
        let peak = pair.first.get_pixel(4, 4, 0)?;
        assert!(peak < 255.0);
        assert!(pair.first.get_pixel(5, 4, 0)? > 0.0);
        assert_eq!(pair.first, pair.second);
        Ok(())
    }
}
