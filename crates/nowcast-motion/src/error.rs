use nowcast_image::ImageError;

fn format_shape(shape: &[usize]) -> String {
    let dims = shape
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if shape.len() == 1 {
        format!("({dims},)")
    } else {
        format!("({dims})")
    }
}

/// The input array does not have the `(2, m, n)` layout of an image pair.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "input_images dimension mismatch.\ninput_images.shape: {}\n(2, m, n) expected",
    format_shape(.shape)
)]
pub struct ShapeError {
    /// The shape that was received.
    pub shape: Vec<usize>,
}

impl ShapeError {
    /// Create a shape error for the received `shape`.
    pub fn new(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
        }
    }
}

/// An error type for the motion estimation module.
#[derive(thiserror::Error, Debug)]
pub enum MotionError {
    /// Error when the input is not a pair of two dimensional fields.
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// Error when a configuration value is out of its domain.
    #[error("Invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        /// name of the parameter.
        name: &'static str,
        /// offending value.
        value: String,
        /// accepted domain.
        reason: &'static str,
    },

    /// Error when the input contains NaN or infinite values.
    #[error("input_images contains {0} non-finite values")]
    NonFiniteInput(usize),

    /// Error raised by an image operation.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error when a configuration file cannot be read.
    #[error("Failed to read the configuration file")]
    Io(#[from] std::io::Error),

    /// Error when a configuration file cannot be parsed.
    #[error("Failed to parse the configuration")]
    Config(#[from] serde_json::Error),
}
