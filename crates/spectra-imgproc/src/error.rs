use spectra_image::ImageError;

/// An error type for the processing engines.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ProcessingError {
    /// The input buffer cannot be processed, e.g. it has a zero dimension.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A parameter is out of range or inconsistent with another parameter.
    #[error("Invalid parameter `{name}`: expected {expected}, got {actual}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Human readable description of the accepted values.
        expected: String,
        /// The value that was supplied.
        actual: String,
    },

    /// The computation produced values that cannot be represented.
    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),

    /// Error coming from the image container.
    #[error(transparent)]
    Image(#[from] ImageError),
}

impl ProcessingError {
    pub(crate) fn invalid_parameter(
        name: &'static str,
        expected: impl Into<String>,
        actual: impl std::fmt::Display,
    ) -> Self {
        ProcessingError::InvalidParameter {
            name,
            expected: expected.into(),
            actual: actual.to_string(),
        }
    }
}

/// Reject images that have a zero dimension or no channels.
pub(crate) fn ensure_valid_image<T, const C: usize>(
    image: &spectra_image::Image<T, C>,
) -> Result<(), ProcessingError> {
    if C == 0 {
        return Err(ProcessingError::InvalidImage(
            "image must have at least one channel".to_string(),
        ));
    }
    if image.size().is_empty() {
        return Err(ProcessingError::InvalidImage(format!(
            "image must be at least 1x1, got {}x{}",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

/// Reject sigmas that are not strictly positive finite numbers.
pub(crate) fn ensure_positive(name: &'static str, value: f32) -> Result<(), ProcessingError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ProcessingError::invalid_parameter(
            name,
            "a finite value > 0",
            value,
        ));
    }
    Ok(())
}

/// Reject kernel sizes that are even or zero.
pub(crate) fn ensure_odd_size(name: &'static str, size: usize) -> Result<(), ProcessingError> {
    if size == 0 || size % 2 == 0 {
        return Err(ProcessingError::invalid_parameter(
            name,
            "an odd size >= 1",
            size,
        ));
    }
    Ok(())
}
