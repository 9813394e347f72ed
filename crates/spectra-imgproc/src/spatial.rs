//! Pixel domain filter engine.
//!
//! [`apply_spatial`] runs one [`SpatialFilter`] over an 8-bit image. Samples are promoted to
//! `f32` for the whole computation and saturated back to `u8` once at the end, so sharpening
//! overshoot is never clipped mid-way.

use serde::{Deserialize, Serialize};
use spectra_image::{
    ops::{cast_and_scale, convert_saturating},
    Image,
};

use crate::{
    error::{ensure_odd_size, ensure_positive, ensure_valid_image, ProcessingError},
    filter::{self, kernels::LaplacianVariant, RankKind},
};

/// A pixel domain filter and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum SpatialFilter {
    /// Mean over a square window.
    Box {
        /// Odd side length of the window.
        kernel_size: usize,
    },
    /// Gaussian blur.
    Gaussian {
        /// Standard deviation in pixels.
        sigma: f32,
        /// Odd side length, derived from sigma when omitted.
        kernel_size: Option<usize>,
    },
    /// Edge preserving smoothing.
    Bilateral {
        /// Standard deviation of the spatial weights in pixels.
        sigma_space: f32,
        /// Standard deviation of the range weights in intensity levels.
        sigma_color: f32,
    },
    /// `image + strength * (image - blur(image, sigma))`.
    UnsharpMask {
        /// Standard deviation of the blur.
        sigma: f32,
        /// Amount of detail added back.
        strength: f32,
    },
    /// `image - laplacian(image)`.
    Laplacian {
        /// Neighborhood of the Laplacian.
        #[serde(default)]
        variant: LaplacianVariant,
    },
    /// `boost * image - laplacian(image)`.
    HighBoost {
        /// Amplification of the original image.
        boost: f32,
        /// Neighborhood of the Laplacian.
        #[serde(default)]
        variant: LaplacianVariant,
    },
    /// Convolution with the fixed sharpening matrix.
    Sharpen {
        /// 3 or 5.
        kernel_size: usize,
    },
    /// Median of a square window.
    Median {
        /// Odd side length of the window.
        kernel_size: usize,
    },
    /// Minimum of a square window.
    Min {
        /// Odd side length of the window.
        kernel_size: usize,
    },
    /// Maximum of a square window.
    Max {
        /// Odd side length of the window.
        kernel_size: usize,
    },
}

impl Default for SpatialFilter {
    fn default() -> Self {
        SpatialFilter::Gaussian {
            sigma: 1.0,
            kernel_size: None,
        }
    }
}

impl SpatialFilter {
    /// Check the parameters without touching any image.
    pub fn validate(&self) -> Result<(), ProcessingError> {
        match *self {
            SpatialFilter::Box { kernel_size }
            | SpatialFilter::Median { kernel_size }
            | SpatialFilter::Min { kernel_size }
            | SpatialFilter::Max { kernel_size } => ensure_odd_size("kernel_size", kernel_size),
            SpatialFilter::Gaussian { sigma, kernel_size } => {
                ensure_positive("sigma", sigma)?;
                kernel_size.map_or(Ok(()), |k| ensure_odd_size("kernel_size", k))
            }
            SpatialFilter::Bilateral {
                sigma_space,
                sigma_color,
            } => {
                ensure_positive("sigma_space", sigma_space)?;
                ensure_positive("sigma_color", sigma_color)
            }
            SpatialFilter::UnsharpMask { sigma, strength } => {
                if !strength.is_finite() || strength < 0.0 {
                    return Err(ProcessingError::invalid_parameter(
                        "strength",
                        "a finite value >= 0",
                        strength,
                    ));
                }
                ensure_positive("sigma", sigma)
            }
            SpatialFilter::Laplacian { .. } => Ok(()),
            SpatialFilter::HighBoost { boost, .. } => {
                if !boost.is_finite() || boost < 1.0 {
                    return Err(ProcessingError::invalid_parameter(
                        "boost",
                        "a finite value >= 1",
                        boost,
                    ));
                }
                Ok(())
            }
            SpatialFilter::Sharpen { kernel_size } => match kernel_size {
                3 | 5 => Ok(()),
                other => Err(ProcessingError::invalid_parameter(
                    "kernel_size",
                    "3 or 5",
                    other,
                )),
            },
        }
    }
}

/// Apply a pixel domain filter to an 8-bit image, channel by channel.
///
/// # Arguments
///
/// * `image` - The input image with shape (H, W, C).
/// * `filter` - The filter to run.
///
/// # Returns
///
/// A new image of the same size, rounded and clamped to `0..=255`.
///
/// # Errors
///
/// * [`ProcessingError::InvalidImage`] if the image has a zero dimension.
/// * [`ProcessingError::InvalidParameter`] if the filter parameters are out of range.
/// * [`ProcessingError::NumericOverflow`] if the result is not finite before clamping.
///
/// # Examples
///
/// ```
/// use spectra_image::{Image, ImageSize};
/// use spectra_imgproc::spatial::{apply_spatial, SpatialFilter};
///
/// let image = Image::<u8, 1>::from_size_val(ImageSize { width: 8, height: 8 }, 90).unwrap();
/// let out = apply_spatial(&image, &SpatialFilter::Box { kernel_size: 3 }).unwrap();
/// assert_eq!(out, image);
/// ```
pub fn apply_spatial<const C: usize>(
    image: &Image<u8, C>,
    filter: &SpatialFilter,
) -> Result<Image<u8, C>, ProcessingError> {
    ensure_valid_image(image)?;
    filter.validate()?;

    log::debug!("apply_spatial: {:?} on {} x {} channels", filter, image.size(), C);

    let mut src = Image::<f32, C>::from_size_val(image.size(), 0.0)?;
    cast_and_scale(image, &mut src, 1.0)?;
    let mut out = Image::<f32, C>::from_size_val(image.size(), 0.0)?;

    match *filter {
        SpatialFilter::Box { kernel_size } => filter::box_blur(&src, &mut out, kernel_size)?,
        SpatialFilter::Gaussian { sigma, kernel_size } => {
            filter::gaussian_blur(&src, &mut out, kernel_size, sigma)?
        }
        SpatialFilter::Bilateral {
            sigma_space,
            sigma_color,
        } => filter::bilateral_filter(&src, &mut out, sigma_space, sigma_color)?,
        SpatialFilter::UnsharpMask { sigma, strength } => {
            filter::unsharp_mask(&src, &mut out, sigma, strength)?
        }
        SpatialFilter::Laplacian { variant } => filter::high_boost(&src, &mut out, variant, 1.0)?,
        SpatialFilter::HighBoost { boost, variant } => {
            filter::high_boost(&src, &mut out, variant, boost)?
        }
        SpatialFilter::Sharpen { kernel_size } => filter::sharpen(&src, &mut out, kernel_size)?,
        SpatialFilter::Median { kernel_size } => {
            filter::rank_filter(&src, &mut out, kernel_size, RankKind::Median)?
        }
        SpatialFilter::Min { kernel_size } => {
            filter::rank_filter(&src, &mut out, kernel_size, RankKind::Min)?
        }
        SpatialFilter::Max { kernel_size } => {
            filter::rank_filter(&src, &mut out, kernel_size, RankKind::Max)?
        }
    }

    if let Some(v) = out.as_slice().iter().find(|v| !v.is_finite()) {
        return Err(ProcessingError::NumericOverflow(format!(
            "{filter:?} produced a non-finite sample ({v})"
        )));
    }

    let mut dst = Image::<u8, C>::from_size_val(image.size(), 0)?;
    convert_saturating(&out, &mut dst)?;

    Ok(dst)
}
