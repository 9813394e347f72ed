use serde::{Deserialize, Serialize};
use spectra_image::{ops::cast_and_scale, Image, ImageSize};

use super::{build_mask, FilterFamily, FilterShape, MaskParams, Spectrum};
use crate::{
    error::{ensure_valid_image, ProcessingError},
    padding::{spatial_padding, Padding2D, PaddingMode},
};

/// Which derived view of the spectrum is rendered for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumView {
    /// `|F|`, or `log(1 + |F|)` with `log_transform`, min-max scaled to `0..=255`.
    #[default]
    Magnitude,
    /// `atan2(im, re)` mapped from `[-pi, pi]` to `0..=255`.
    Phase,
}

/// Parameters of a frequency domain filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyFilterParams {
    /// The band to pass.
    pub family: FilterFamily,
    /// The transition profile.
    pub shape: FilterShape,
    /// Cutoff radius in spectrum samples, or the inner radius of a band.
    pub cutoff: f64,
    /// Outer radius of a band, required by bandpass and notch filters.
    pub cutoff_high: Option<f64>,
    /// Butterworth order in `[1, 10]`.
    pub order: u32,
    /// Render the magnitude view on a log scale.
    pub log_transform: bool,
    /// The view returned next to the filtered image.
    pub spectrum_view: SpectrumView,
    /// Pad every channel to power of two sides before transforming.
    pub padding: Option<PaddingMode>,
}

impl Default for FrequencyFilterParams {
    fn default() -> Self {
        Self {
            family: FilterFamily::Lowpass,
            shape: FilterShape::Gaussian,
            cutoff: 30.0,
            cutoff_high: Some(80.0),
            order: 2,
            log_transform: true,
            spectrum_view: SpectrumView::Magnitude,
            padding: None,
        }
    }
}

/// Result of [`apply_frequency`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyOutput<const C: usize> {
    /// The filtered image, same size as the input.
    pub image: Image<u8, C>,
    /// The centered spectrum view of each channel, sized like the (padded) transform.
    pub spectrum: Image<u8, C>,
}

/// Largest meaningful cutoff for a spectrum: half of its diagonal.
pub fn max_frequency_radius(size: ImageSize) -> f64 {
    (size.width as f64).hypot(size.height as f64) / 2.0
}

impl FrequencyFilterParams {
    /// Check the parameters that cannot be clamped.
    pub fn validate(&self) -> Result<(), ProcessingError> {
        if !(1..=10).contains(&self.order) {
            return Err(ProcessingError::invalid_parameter(
                "order",
                "an integer in [1, 10]",
                self.order,
            ));
        }

        if !self.cutoff.is_finite() {
            return Err(ProcessingError::invalid_parameter(
                "cutoff",
                "a finite value",
                self.cutoff,
            ));
        }

        if self.family.is_band() {
            let Some(high) = self.cutoff_high else {
                return Err(ProcessingError::invalid_parameter(
                    "cutoff_high",
                    format!("a value for a {:?} filter", self.family),
                    "none",
                ));
            };
            if !high.is_finite() {
                return Err(ProcessingError::invalid_parameter(
                    "cutoff_high",
                    "a finite value",
                    high,
                ));
            }
            if self.cutoff >= high {
                return Err(ProcessingError::invalid_parameter(
                    "cutoff_high",
                    format!("a value greater than cutoff ({})", self.cutoff),
                    high,
                ));
            }
        }

        Ok(())
    }

    /// Clamp the cutoffs into `[0, max_radius]`.
    fn mask_params(&self, max_radius: f64) -> MaskParams {
        let clamp = |name: &str, value: f64| {
            let clamped = value.clamp(0.0, max_radius);
            if clamped != value {
                log::warn!("{name} {value} clamped to {clamped}, valid range is [0, {max_radius}]");
            }
            clamped
        };

        MaskParams {
            cutoff: clamp("cutoff", self.cutoff),
            cutoff_high: match (self.family.is_band(), self.cutoff_high) {
                (true, Some(high)) => clamp("cutoff_high", high),
                _ => 0.0,
            },
            order: self.order,
        }
    }
}

/// Filter an 8-bit image in the frequency domain.
///
/// Each channel is transformed independently: optional padding to power of two sides,
/// forward FFT, centering, masking, inverse FFT, crop back to the input size, then round
/// and clamp to `0..=255`. Cutoffs outside `[0, diagonal / 2]` are clamped with a warning.
///
/// # Arguments
///
/// * `image` - The input image with shape (H, W, C).
/// * `params` - The filter parameters.
///
/// # Returns
///
/// The filtered image and a view of the unfiltered, centered spectrum.
///
/// # Errors
///
/// * [`ProcessingError::InvalidImage`] if the image has a zero dimension.
/// * [`ProcessingError::InvalidParameter`] if the order is outside `[1, 10]`, a cutoff is
///   not finite, or a band filter does not have `cutoff < cutoff_high`.
///
/// # Examples
///
/// ```
/// use spectra_image::{Image, ImageSize};
/// use spectra_imgproc::fft::{apply_frequency, FilterFamily, FrequencyFilterParams};
///
/// let image = Image::<u8, 1>::from_size_val(ImageSize { width: 16, height: 16 }, 80).unwrap();
/// let params = FrequencyFilterParams { family: FilterFamily::Highpass, ..Default::default() };
///
/// let out = apply_frequency(&image, &params).unwrap();
/// assert!(out.image.as_slice().iter().all(|&v| v == 0));
/// ```
pub fn apply_frequency<const C: usize>(
    image: &Image<u8, C>,
    params: &FrequencyFilterParams,
) -> Result<FrequencyOutput<C>, ProcessingError> {
    ensure_valid_image(image)?;
    params.validate()?;

    let size = image.size();
    let padded_size = match params.padding {
        Some(_) => ImageSize {
            width: size.width.next_power_of_two(),
            height: size.height.next_power_of_two(),
        },
        None => size,
    };

    let mask_params = params.mask_params(max_frequency_radius(padded_size));
    let mask = build_mask(padded_size, params.family, params.shape, &mask_params);

    log::debug!(
        "apply_frequency: {:?}/{:?} on {} padded to {}, {:?}",
        params.family,
        params.shape,
        size,
        padded_size,
        mask_params
    );

    let mut filtered = Vec::with_capacity(C);
    let mut views = Vec::with_capacity(C);

    for plane in image.split_channels()? {
        let mut plane_f64 = Image::<f64, 1>::from_size_val(size, 0.0)?;
        cast_and_scale(&plane, &mut plane_f64, 1.0)?;

        let plane_f64 = match params.padding {
            Some(mode) => {
                let padding = Padding2D {
                    top: 0,
                    bottom: padded_size.height - size.height,
                    left: 0,
                    right: padded_size.width - size.width,
                };
                let mut padded = Image::<f64, 1>::from_size_val(padded_size, 0.0)?;
                spatial_padding(&plane_f64, &mut padded, padding, mode, [0.0])?;
                padded
            }
            None => plane_f64,
        };

        let mut spectrum = Spectrum::forward(&plane_f64)?;
        spectrum.shift();
        views.push(spectrum_view(&spectrum, params)?);

        spectrum.apply_mask(&mask)?;
        spectrum.ishift();
        let restored = spectrum.inverse()?;
        filtered.push(crop_to_u8(&restored, size)?);
    }

    Ok(FrequencyOutput {
        image: Image::from_channels(&filtered)?,
        spectrum: Image::from_channels(&views)?,
    })
}

/// Run the forward and inverse transform without filtering.
///
/// Useful to check that the pipeline is lossless for a given image.
pub fn reconstruct<const C: usize>(image: &Image<u8, C>) -> Result<Image<u8, C>, ProcessingError> {
    ensure_valid_image(image)?;

    let mut planes = Vec::with_capacity(C);
    for plane in image.split_channels()? {
        let mut plane_f64 = Image::<f64, 1>::from_size_val(image.size(), 0.0)?;
        cast_and_scale(&plane, &mut plane_f64, 1.0)?;
        let restored = Spectrum::forward(&plane_f64)?.inverse()?;
        planes.push(crop_to_u8(&restored, image.size())?);
    }

    Ok(Image::from_channels(&planes)?)
}

/// Render a centered spectrum for display.
fn spectrum_view(
    spectrum: &Spectrum,
    params: &FrequencyFilterParams,
) -> Result<Image<u8, 1>, ProcessingError> {
    let data = match params.spectrum_view {
        SpectrumView::Magnitude => {
            let magnitude = spectrum.magnitude();
            let values = if params.log_transform {
                magnitude.iter().map(|m| m.ln_1p()).collect()
            } else {
                magnitude
            };
            rescale_to_u8(&values)
        }
        SpectrumView::Phase => spectrum
            .phase()
            .iter()
            .map(|p| {
                let v = (p + std::f64::consts::PI) / std::f64::consts::TAU * 255.0;
                v.round().clamp(0.0, 255.0) as u8
            })
            .collect(),
    };

    Ok(Image::new(spectrum.size(), data)?)
}

/// Min-max scale values to `0..=255`; a flat input maps to 0.
fn rescale_to_u8(values: &[f64]) -> Vec<u8> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    values
        .iter()
        .map(|&v| {
            if range > 0.0 {
                ((v - min) / range * 255.0).round() as u8
            } else {
                0
            }
        })
        .collect()
}

/// Take the top-left `size` window of a restored plane and saturate it to 8 bits.
fn crop_to_u8(plane: &Image<f64, 1>, size: ImageSize) -> Result<Image<u8, 1>, ProcessingError> {
    let stride = plane.cols();
    let data = plane
        .as_slice()
        .chunks_exact(stride)
        .take(size.height)
        .flat_map(|row| row[..size.width].iter())
        .map(|&v| v.round().clamp(0.0, 255.0) as u8)
        .collect();
    Ok(Image::new(size, data)?)
}
