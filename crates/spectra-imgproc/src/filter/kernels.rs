use serde::{Deserialize, Serialize};

use crate::error::{ensure_odd_size, ensure_positive, ProcessingError};

/// Create a box blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
///
/// # Returns
///
/// A vector of the kernel.
pub fn box_blur_kernel_1d(kernel_size: usize) -> Vec<f32> {
    vec![1.0 / kernel_size as f32; kernel_size]
}

/// Create a gaussian blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
/// * `sigma` - The sigma of the gaussian kernel.
///
/// # Returns
///
/// A vector of the kernel, normalized to sum 1.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let mean = (kernel_size as f32 - 1.0) / 2.0;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel = (0..kernel_size)
        .map(|i| {
            let x = i as f32 - mean;
            (-(x * x) / two_sigma_sq).exp()
        })
        .collect::<Vec<_>>();

    let norm = kernel.iter().sum::<f32>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

/// Largest radius [`gaussian_kernel_size`] derives from a sigma.
pub const MAX_KERNEL_RADIUS: usize = 4096;

/// Radius covering three standard deviations, at least 1 and at most `max_radius`.
pub fn gaussian_radius(sigma: f32, max_radius: usize) -> usize {
    let radius = (3.0 * sigma).ceil().max(1.0);
    if radius >= max_radius as f32 {
        max_radius.max(1)
    } else {
        radius as usize
    }
}

/// Kernel size covering three standard deviations on each side of the center.
///
/// # Errors
///
/// Returns [`ProcessingError::NumericOverflow`] if the radius exceeds [`MAX_KERNEL_RADIUS`].
pub fn gaussian_kernel_size(sigma: f32) -> Result<usize, ProcessingError> {
    if 3.0 * sigma > MAX_KERNEL_RADIUS as f32 {
        return Err(ProcessingError::NumericOverflow(format!(
            "a gaussian with sigma {sigma} needs a radius above {MAX_KERNEL_RADIUS}"
        )));
    }
    Ok(2 * gaussian_radius(sigma, MAX_KERNEL_RADIUS) + 1)
}

/// Create the separable parts of a sobel kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel, 3 or 5.
///
/// # Returns
///
/// The derivative and the smoothing kernels.
pub fn sobel_kernel_1d(kernel_size: usize) -> Result<(Vec<f32>, Vec<f32>), ProcessingError> {
    match kernel_size {
        3 => Ok((vec![-1.0, 0.0, 1.0], vec![1.0, 2.0, 1.0])),
        5 => Ok((
            vec![-1.0, -2.0, 0.0, 2.0, 1.0],
            vec![1.0, 4.0, 6.0, 4.0, 1.0],
        )),
        _ => Err(ProcessingError::invalid_parameter(
            "kernel_size",
            "3 or 5",
            kernel_size,
        )),
    }
}

/// Neighborhood used by the discrete Laplacian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaplacianVariant {
    /// `[[0, 1, 0], [1, -4, 1], [0, 1, 0]]`
    #[default]
    FourNeighbor,
    /// `[[1, 1, 1], [1, -8, 1], [1, 1, 1]]`
    EightNeighbor,
}

/// The family of a square convolution kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KernelKind {
    /// All ones normalized by the number of taps.
    Box,
    /// Samples of a 2D gaussian normalized to sum 1.
    Gaussian {
        /// Standard deviation in pixels.
        sigma: f32,
    },
    /// Fixed 3x3 discrete Laplacian.
    Laplacian {
        /// Neighborhood of the operator.
        variant: LaplacianVariant,
    },
    /// Fixed 3x3 or 5x5 sharpening matrix summing to 1.
    Sharpen,
}

/// A square, odd-sized convolution kernel stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    size: usize,
    data: Vec<f32>,
}

impl Kernel {
    /// Create a kernel from row-major coefficients.
    ///
    /// # Errors
    ///
    /// Fails if `size` is even or zero, or `data` does not hold `size * size` values.
    pub fn new(size: usize, data: Vec<f32>) -> Result<Self, ProcessingError> {
        ensure_odd_size("size", size)?;
        if data.len() != size * size {
            return Err(ProcessingError::invalid_parameter(
                "data",
                format!("{} coefficients", size * size),
                data.len(),
            ));
        }
        Ok(Self { size, data })
    }

    /// Build a kernel as the outer product of a vertical and a horizontal 1D kernel.
    fn outer(k: &[f32]) -> Self {
        let size = k.len();
        let data = k
            .iter()
            .flat_map(|ky| k.iter().map(move |kx| ky * kx))
            .collect();
        Self { size, data }
    }

    /// The side length of the kernel.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Distance from the center tap to the border of the kernel.
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// The row-major coefficients.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// The coefficient at row `r` and column `c`.
    pub fn get(&self, r: usize, c: usize) -> Option<f32> {
        if r >= self.size || c >= self.size {
            return None;
        }
        self.data.get(r * self.size + c).copied()
    }

    /// Sum of all coefficients.
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }
}

#[rustfmt::skip]
const LAPLACIAN_4: [f32; 9] = [
    0.0,  1.0, 0.0,
    1.0, -4.0, 1.0,
    0.0,  1.0, 0.0,
];

#[rustfmt::skip]
const LAPLACIAN_8: [f32; 9] = [
    1.0,  1.0, 1.0,
    1.0, -8.0, 1.0,
    1.0,  1.0, 1.0,
];

#[rustfmt::skip]
const SHARPEN_3: [f32; 9] = [
     0.0, -1.0,  0.0,
    -1.0,  5.0, -1.0,
     0.0, -1.0,  0.0,
];

#[rustfmt::skip]
const SHARPEN_5: [f32; 25] = [
    -1.0, -1.0, -1.0, -1.0, -1.0,
    -1.0,  2.0,  2.0,  2.0, -1.0,
    -1.0,  2.0,  8.0,  2.0, -1.0,
    -1.0,  2.0,  2.0,  2.0, -1.0,
    -1.0, -1.0, -1.0, -1.0, -1.0,
];

/// Create a square convolution kernel.
///
/// # Arguments
///
/// * `kind` - The kernel family.
/// * `size` - The side length. When omitted, box and sharpen kernels are 3x3 and the
///   gaussian size is derived from sigma with [`gaussian_kernel_size`].
///
/// # Errors
///
/// Returns [`ProcessingError::InvalidParameter`] if the size is even or zero, sigma is not
/// strictly positive, or the family has no kernel of the requested size, and
/// [`ProcessingError::NumericOverflow`] if a derived gaussian size is too large.
///
/// # Examples
///
/// ```
/// use spectra_imgproc::filter::kernels::{make_kernel, KernelKind};
///
/// let kernel = make_kernel(KernelKind::Gaussian { sigma: 1.0 }, Some(5)).unwrap();
/// assert_eq!(kernel.size(), 5);
/// assert!((kernel.sum() - 1.0).abs() < 1e-6);
///
/// assert!(make_kernel(KernelKind::Box, Some(4)).is_err());
/// ```
pub fn make_kernel(kind: KernelKind, size: Option<usize>) -> Result<Kernel, ProcessingError> {
    if let Some(size) = size {
        ensure_odd_size("size", size)?;
    }

    match kind {
        KernelKind::Box => Ok(Kernel::outer(&box_blur_kernel_1d(size.unwrap_or(3)))),
        KernelKind::Gaussian { sigma } => {
            ensure_positive("sigma", sigma)?;
            let size = match size {
                Some(size) => size,
                None => gaussian_kernel_size(sigma)?,
            };
            Ok(Kernel::outer(&gaussian_kernel_1d(size, sigma)))
        }
        KernelKind::Laplacian { variant } => {
            let size = size.unwrap_or(3);
            if size != 3 {
                return Err(ProcessingError::invalid_parameter("size", "3", size));
            }
            let data = match variant {
                LaplacianVariant::FourNeighbor => LAPLACIAN_4,
                LaplacianVariant::EightNeighbor => LAPLACIAN_8,
            };
            Kernel::new(3, data.to_vec())
        }
        KernelKind::Sharpen => match size.unwrap_or(3) {
            3 => Kernel::new(3, SHARPEN_3.to_vec()),
            5 => Kernel::new(5, SHARPEN_5.iter().map(|v| v / 8.0).collect()),
            other => Err(ProcessingError::invalid_parameter("size", "3 or 5", other)),
        },
    }
}
