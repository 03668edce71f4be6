use log::debug;

use nowcast_image::{Image, ImageError};
use nowcast_imgproc::pyramid::{pyrdown, pyrdown_size};

use crate::error::MotionError;
use crate::preprocess::ImagePair;

/// Smallest width or height a pyramid level may have.
pub const MIN_LEVEL_SIZE: usize = 4;

/// Resolution ratio between two consecutive levels.
pub const LEVEL_SCALE: f32 = 2.0;

/// Image pairs at decreasing resolution, stored coarsest first.
#[derive(Clone, Debug)]
pub struct ImagePyramid {
    levels: Vec<ImagePair>,
}

fn downsample(src: &Image<f32, 1>) -> Result<Image<f32, 1>, ImageError> {
    let mut dst = Image::from_size_val(pyrdown_size(src.size()), 0.0)?;
    pyrdown(src, &mut dst)?;
    Ok(dst)
}

impl ImagePyramid {
    /// Build a pyramid of at most `num_levels` levels from `pair`.
    ///
    /// Construction stops early once halving would bring a dimension below
    /// [`MIN_LEVEL_SIZE`]; the finest level is always `pair` itself.
    pub fn build(pair: &ImagePair, num_levels: usize) -> Result<Self, MotionError> {
        let mut levels = vec![pair.clone()];

        while levels.len() < num_levels {
            let Some(finer) = levels.last() else {
                break;
            };

            let size = pyrdown_size(finer.size());
            if size.width < MIN_LEVEL_SIZE || size.height < MIN_LEVEL_SIZE {
                debug!(
                    "pyramid clipped to {} of {} levels at {}",
                    levels.len(),
                    num_levels,
                    finer.size()
                );
                break;
            }

            let coarser = ImagePair {
                first: downsample(&finer.first)?,
                second: downsample(&finer.second)?,
            };
            levels.push(coarser);
        }

        levels.reverse();
        Ok(Self { levels })
    }

    /// Number of levels actually built.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// The levels, coarsest first.
    pub fn levels(&self) -> &[ImagePair] {
        &self.levels
    }

    /// The lowest resolution level.
    pub fn coarsest(&self) -> &ImagePair {
        &self.levels[0]
    }

    /// The full resolution level.
    pub fn finest(&self) -> &ImagePair {
        &self.levels[self.levels.len() - 1]
    }
}
