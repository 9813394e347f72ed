use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use spectra_image::ImageSize;

/// Which band of frequencies a mask passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterFamily {
    /// Passes frequencies below the cutoff.
    #[default]
    Lowpass = 0,
    /// Passes frequencies above the cutoff.
    Highpass = 1,
    /// Passes the annulus between the two cutoffs.
    Bandpass = 2,
    /// Rejects the annulus between the two cutoffs.
    Notch = 3,
}

impl FilterFamily {
    /// Whether the family is defined by two cutoffs.
    pub fn is_band(&self) -> bool {
        matches!(self, FilterFamily::Bandpass | FilterFamily::Notch)
    }
}

/// The transition profile of a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterShape {
    /// Hard cut at the cutoff radius.
    #[default]
    Ideal = 0,
    /// `1 / (1 + (D / cutoff)^(2n))`.
    Butterworth = 1,
    /// `exp(-D^2 / (2 cutoff^2))`.
    Gaussian = 2,
}

/// Radii and order used to evaluate a mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskParams {
    /// Cutoff radius, or the inner radius of a band.
    pub cutoff: f64,
    /// Outer radius of a band. Ignored by lowpass and highpass masks.
    pub cutoff_high: f64,
    /// Butterworth order.
    pub order: u32,
}

type LowpassFn = fn(d: f64, cutoff: f64, order: u32) -> f64;

/// A mask value as a function of the distance to the zero frequency.
pub type MaskFn = fn(d: f64, params: &MaskParams) -> f64;

fn ideal_lowpass(d: f64, cutoff: f64, _order: u32) -> f64 {
    if d <= cutoff {
        1.0
    } else {
        0.0
    }
}

fn butterworth_lowpass(d: f64, cutoff: f64, order: u32) -> f64 {
    // D / 0 is taken as +inf away from the center
    if cutoff == 0.0 {
        return if d == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 / (1.0 + (d / cutoff).powi(2 * order as i32))
}

fn gaussian_lowpass(d: f64, cutoff: f64, _order: u32) -> f64 {
    if cutoff == 0.0 {
        return if d == 0.0 { 1.0 } else { 0.0 };
    }
    (-(d * d) / (2.0 * cutoff * cutoff)).exp()
}

// indexed by `FilterShape as usize`
const LOWPASS: [LowpassFn; 3] = [ideal_lowpass, butterworth_lowpass, gaussian_lowpass];

fn lowpass<const S: usize>(d: f64, p: &MaskParams) -> f64 {
    LOWPASS[S](d, p.cutoff, p.order)
}

fn highpass<const S: usize>(d: f64, p: &MaskParams) -> f64 {
    1.0 - LOWPASS[S](d, p.cutoff, p.order)
}

fn bandpass<const S: usize>(d: f64, p: &MaskParams) -> f64 {
    if S == FilterShape::Ideal as usize {
        return if p.cutoff <= d && d <= p.cutoff_high {
            1.0
        } else {
            0.0
        };
    }
    (1.0 - LOWPASS[S](d, p.cutoff, p.order)) * LOWPASS[S](d, p.cutoff_high, p.order)
}

fn notch<const S: usize>(d: f64, p: &MaskParams) -> f64 {
    1.0 - bandpass::<S>(d, p)
}

/// Mask functions indexed by `[FilterFamily as usize][FilterShape as usize]`.
pub const MASK_TABLE: [[MaskFn; 3]; 4] = [
    [lowpass::<0>, lowpass::<1>, lowpass::<2>],
    [highpass::<0>, highpass::<1>, highpass::<2>],
    [bandpass::<0>, bandpass::<1>, bandpass::<2>],
    [notch::<0>, notch::<1>, notch::<2>],
];

/// Look up the mask function of a filter.
pub fn mask_fn(family: FilterFamily, shape: FilterShape) -> MaskFn {
    MASK_TABLE[family as usize][shape as usize]
}

/// Build a frequency mask for a centered spectrum.
///
/// The distance of sample `(u, v)` is measured from `(rows / 2, cols / 2)`, which is where
/// [`super::Spectrum::shift`] puts the zero frequency.
///
/// # Arguments
///
/// * `size` - The size of the spectrum.
/// * `family` - The band to pass.
/// * `shape` - The transition profile.
/// * `params` - The cutoff radii and Butterworth order.
///
/// # Returns
///
/// The row-major mask weights in `[0, 1]`.
///
/// # Examples
///
/// ```
/// use spectra_image::ImageSize;
/// use spectra_imgproc::fft::{build_mask, FilterFamily, FilterShape, MaskParams};
///
/// let params = MaskParams { cutoff: 1.0, cutoff_high: 0.0, order: 2 };
/// let size = ImageSize { width: 5, height: 5 };
/// let mask = build_mask(size, FilterFamily::Lowpass, FilterShape::Ideal, &params);
///
/// assert_eq!(mask[12], 1.0);
/// assert_eq!(mask[0], 0.0);
/// ```
pub fn build_mask(
    size: ImageSize,
    family: FilterFamily,
    shape: FilterShape,
    params: &MaskParams,
) -> Vec<f64> {
    let f = mask_fn(family, shape);
    let cy = (size.height / 2) as f64;
    let cx = (size.width / 2) as f64;

    let mut mask = vec![0.0; size.area()];
    mask.par_chunks_exact_mut(size.width)
        .enumerate()
        .for_each(|(u, row)| {
            let du = u as f64 - cy;
            row.iter_mut().enumerate().for_each(|(v, m)| {
                let dv = v as f64 - cx;
                *m = f(du.hypot(dv), params);
            });
        });
    mask
}
