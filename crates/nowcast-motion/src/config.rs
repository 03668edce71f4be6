use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MotionError;

/// Parameters of the anisotropic diffusion motion estimation.
///
/// Missing fields take their default value when deserialized, so a configuration
/// file only has to list what it changes.
///
/// # Example
///
/// ```
/// use nowcast_motion::ProesmansConfig;
///
/// let config = ProesmansConfig::default()
///     .with_lam(20.0)
///     .with_num_levels(4);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.num_iter, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProesmansConfig {
    /// Multiplier of the data term. Smaller values give a smoother motion field.
    pub lam: f32,
    /// Number of solver iterations on every pyramid level.
    pub num_iter: usize,
    /// Maximum number of pyramid levels.
    pub num_levels: usize,
    /// Standard deviation of the Gaussian applied to both frames, disabled when <= 0.
    pub filter_std: f32,
    /// Sharpness of the forward/backward consistency weighting.
    pub gamma: f32,
    /// Intensity difference (on the 0-255 scale) at which diffusion across an image edge is halved.
    pub kappa_image: f32,
    /// Flow gradient magnitude at which diffusion across a motion boundary is halved.
    pub kappa_flow: f32,
}

impl Default for ProesmansConfig {
    fn default() -> Self {
        Self {
            lam: 50.0,
            num_iter: 100,
            num_levels: 6,
            filter_std: 0.0,
            gamma: 0.1,
            kappa_image: 10.0,
            kappa_flow: 1.0,
        }
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: &'static str) -> MotionError {
    MotionError::InvalidParameter {
        name,
        value: value.to_string(),
        reason,
    }
}

fn check_positive(name: &'static str, value: f32) -> Result<(), MotionError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, value, "must be finite and > 0"))
    }
}

impl ProesmansConfig {
    /// Set the data term multiplier.
    pub fn with_lam(mut self, lam: f32) -> Self {
        self.lam = lam;
        self
    }

    /// Set the number of iterations per level.
    pub fn with_num_iter(mut self, num_iter: usize) -> Self {
        self.num_iter = num_iter;
        self
    }

    /// Set the maximum number of pyramid levels.
    pub fn with_num_levels(mut self, num_levels: usize) -> Self {
        self.num_levels = num_levels;
        self
    }

    /// Set the standard deviation of the pre-smoothing filter.
    pub fn with_filter_std(mut self, filter_std: f32) -> Self {
        self.filter_std = filter_std;
        self
    }

    /// Set the consistency sharpness.
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set the image edge scale.
    pub fn with_kappa_image(mut self, kappa_image: f32) -> Self {
        self.kappa_image = kappa_image;
        self
    }

    /// Set the flow gradient scale.
    pub fn with_kappa_flow(mut self, kappa_flow: f32) -> Self {
        self.kappa_flow = kappa_flow;
        self
    }

    /// Check every parameter against its domain.
    ///
    /// # Errors
    ///
    /// Returns [`MotionError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<(), MotionError> {
        check_positive("lam", self.lam)?;

        if self.num_levels == 0 {
            return Err(invalid("num_levels", self.num_levels, "must be >= 1"));
        }

        if !self.filter_std.is_finite() {
            return Err(invalid("filter_std", self.filter_std, "must be finite"));
        }

        if !(self.gamma.is_finite() && self.gamma >= 0.0) {
            return Err(invalid("gamma", self.gamma, "must be finite and >= 0"));
        }

        check_positive("kappa_image", self.kappa_image)?;
        check_positive("kappa_flow", self.kappa_flow)?;

        Ok(())
    }

    /// Parse a configuration from a JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, MotionError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MotionError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
