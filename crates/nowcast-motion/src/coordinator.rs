use log::debug;
use ndarray::{Array3, Array4, Axis};

use nowcast_image::Image;

use crate::config::ProesmansConfig;
use crate::error::MotionError;
use crate::field::MotionField;
use crate::preprocess::{preprocess, ImagePair};
use crate::pyramid::ImagePyramid;
use crate::solver::{consistency_map, DiffusionSolver};

/// Result of a motion estimation between two frames.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionEstimate {
    /// Displacement from the first frame to the second.
    pub forward: MotionField,
    /// Displacement from the second frame to the first.
    pub backward: MotionField,
    /// Per-pixel agreement in `[0, 1]` of the forward and backward field, in that order.
    pub consistency: [Image<f32, 1>; 2],
}

impl MotionEstimate {
    /// Convert to arrays: the fields stacked as `(2, 2, m, n)` (forward first) and
    /// the consistency maps as `(2, m, n)`.
    pub fn to_arrays(&self) -> (Array4<f32>, Array3<f32>) {
        let size = self.forward.size();
        let (rows, cols) = (size.height, size.width);

        let mut fields = Array4::zeros((2, 2, rows, cols));
        fields.index_axis_mut(Axis(0), 0).assign(&self.forward.to_array());
        fields.index_axis_mut(Axis(0), 1).assign(&self.backward.to_array());

        let consistency = Array3::from_shape_fn((2, rows, cols), |(k, y, x)| {
            self.consistency[k].as_slice()[y * cols + x]
        });

        (fields, consistency)
    }
}

/// Estimate motion level by level, from the coarsest to the finest.
///
/// The coarsest level starts without motion; every finer level starts from the
/// fields of the level below, upsampled and scaled by the level ratio.
pub fn coarse_to_fine(
    pyramid: &ImagePyramid,
    config: &ProesmansConfig,
) -> Result<MotionEstimate, MotionError> {
    let solver = DiffusionSolver::new(config);

    let coarsest = pyramid.coarsest().size();
    let mut fields = [MotionField::zeros(coarsest)?, MotionField::zeros(coarsest)?];

    for (level, pair) in pyramid.levels().iter().enumerate() {
        if level > 0 {
            let [forward, backward] = &fields;
            fields = [forward.upsample(pair.size())?, backward.upsample(pair.size())?];
        }

        fields = solver.solve(pair, fields)?;

        debug!(
            "level {}/{} ({}): max forward displacement {:.3}",
            level + 1,
            pyramid.num_levels(),
            pair.size(),
            fields[0].max_magnitude()
        );
    }

    let [forward, backward] = fields;
    let consistency = [
        consistency_map(&forward, &backward, config.gamma)?,
        consistency_map(&backward, &forward, config.gamma)?,
    ];

    Ok(MotionEstimate {
        forward,
        backward,
        consistency,
    })
}

/// Estimate the motion between two frames.
///
/// The frames are validated, jointly rescaled to `[0, 255]`, optionally smoothed
/// and then processed coarse to fine.
///
/// # Errors
///
/// Fails if `config` is invalid, the frames differ in size or are empty, or any
/// value is not finite.
pub fn estimate_motion(
    image1: &Image<f32, 1>,
    image2: &Image<f32, 1>,
    config: &ProesmansConfig,
) -> Result<MotionEstimate, MotionError> {
    config.validate()?;
    let pair = ImagePair::new(image1.clone(), image2.clone())?;
    estimate_pair(&pair, config)
}

pub(crate) fn estimate_pair(
    pair: &ImagePair,
    config: &ProesmansConfig,
) -> Result<MotionEstimate, MotionError> {
    let pair = preprocess(pair, config.filter_std)?;
    let pyramid = ImagePyramid::build(&pair, config.num_levels)?;
    debug!(
        "estimating motion on {} with {} levels",
        pair.size(),
        pyramid.num_levels()
    );
    coarse_to_fine(&pyramid, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_frames_give_zero_motion() -> Result<(), MotionError> {
        let frame = Image::from_size_val([20, 12].into(), 7.0)?;
        let config = ProesmansConfig::default().with_num_iter(5);
        let estimate = estimate_motion(&frame, &frame, &config)?;

        assert_eq!(estimate.forward, MotionField::zeros([20, 12].into())?);
        assert_eq!(estimate.backward, estimate.forward);
        assert!(estimate.consistency[0].as_slice().iter().all(|&c| c == 1.0));
        Ok(())
    }

    #[test]
    fn invalid_config_is_rejected_first() -> Result<(), MotionError> {
        let frame = Image::from_size_val([8, 8].into(), 0.0)?;
        let other = Image::from_size_val([4, 4].into(), 0.0)?;
        let config = ProesmansConfig::default().with_lam(-1.0);

        assert!(matches!(
            estimate_motion(&frame, &other, &config),
            Err(MotionError::InvalidParameter { name: "lam", .. })
        ));
        assert!(matches!(
            estimate_motion(&frame, &other, &ProesmansConfig::default()),
            Err(MotionError::Shape(_))
        ));
        Ok(())
    }

    #[test]
    fn to_arrays_layout() -> Result<(), MotionError> {
        let u = Image::from_fn([3, 2].into(), |x, y| (x + 10 * y) as f32);
        let v = Image::from_size_val([3, 2].into(), -1.0)?;
        let forward = MotionField::from_components(&u, &v)?;
        let backward = MotionField::zeros([3, 2].into())?;
        let estimate = MotionEstimate {
            consistency: [
                Image::from_size_val([3, 2].into(), 0.5)?,
                Image::from_size_val([3, 2].into(), 1.0)?,
            ],
            forward,
            backward,
        };

        let (fields, consistency) = estimate.to_arrays();
        assert_eq!(fields.dim(), (2, 2, 2, 3));
        assert_eq!(fields[[0, 0, 1, 2]], 12.0);
        assert_eq!(fields[[0, 1, 0, 0]], -1.0);
        assert_eq!(fields[[1, 0, 1, 2]], 0.0);
        assert_eq!(consistency.dim(), (2, 2, 3));
        assert_eq!(consistency[[0, 1, 1]], 0.5);
        assert_eq!(consistency[[1, 1, 1]], 1.0);
        Ok(())
    }
}
