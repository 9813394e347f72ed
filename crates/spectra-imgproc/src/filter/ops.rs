use spectra_image::{Image, ImageError};

use super::{
    convolution::filter2d,
    kernels::{self, KernelKind, LaplacianVariant},
    separable_filter,
};
use crate::{error::ProcessingError, padding::PaddingMode, parallel};

fn check_size<const C: usize>(
    src: &Image<f32, C>,
    dst: &Image<f32, C>,
) -> Result<(), ProcessingError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        )
        .into());
    }
    Ok(())
}

/// Blur an image using a box blur filter
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_size` - The odd side length of the kernel.
pub fn box_blur<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel_size: usize,
) -> Result<(), ProcessingError> {
    crate::error::ensure_odd_size("kernel_size", kernel_size)?;
    let kernel = kernels::box_blur_kernel_1d(kernel_size);
    separable_filter(src, dst, &kernel, &kernel, PaddingMode::Replicate)?;
    Ok(())
}

/// Blur an image using a gaussian blur filter
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_size` - The odd side length of the kernel. When `None` it covers three sigmas,
///   with the radius capped at the larger image side.
/// * `sigma` - The sigma of the gaussian kernel.
pub fn gaussian_blur<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel_size: Option<usize>,
    sigma: f32,
) -> Result<(), ProcessingError> {
    crate::error::ensure_positive("sigma", sigma)?;
    let kernel_size = kernel_size.unwrap_or_else(|| {
        2 * kernels::gaussian_radius(sigma, src.rows().max(src.cols())) + 1
    });
    crate::error::ensure_odd_size("kernel_size", kernel_size)?;
    let kernel = kernels::gaussian_kernel_1d(kernel_size, sigma);
    separable_filter(src, dst, &kernel, &kernel, PaddingMode::Replicate)?;
    Ok(())
}

/// Compute the first order image derivative in both x and y using a 3x3 Sobel operator.
///
/// The kernels are not normalized, so a unit step produces a response of 4.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dx` - The horizontal derivative with shape (H, W, C).
/// * `dy` - The vertical derivative with shape (H, W, C).
pub fn spatial_gradient<const C: usize>(
    src: &Image<f32, C>,
    dx: &mut Image<f32, C>,
    dy: &mut Image<f32, C>,
) -> Result<(), ProcessingError> {
    check_size(src, dx)?;
    check_size(src, dy)?;

    let (deriv, smooth) = kernels::sobel_kernel_1d(3)?;
    separable_filter(src, dx, &deriv, &smooth, PaddingMode::Replicate)?;
    separable_filter(src, dy, &smooth, &deriv, PaddingMode::Replicate)?;

    Ok(())
}

/// Compute the Sobel gradient magnitude of an image.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
pub fn sobel<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
) -> Result<(), ProcessingError> {
    check_size(src, dst)?;

    let mut gx = Image::<f32, C>::from_size_val(src.size(), 0.0)?;
    let mut gy = Image::<f32, C>::from_size_val(src.size(), 0.0)?;
    spatial_gradient(src, &mut gx, &mut gy)?;

    parallel::par_iter_rows_val_two(&gx, &gy, dst, |&gx, &gy, out| {
        *out = gx.hypot(gy);
    });

    Ok(())
}

/// Apply the discrete Laplacian to an image.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `variant` - The neighborhood of the operator.
pub fn laplacian<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    variant: LaplacianVariant,
) -> Result<(), ProcessingError> {
    let kernel = kernels::make_kernel(KernelKind::Laplacian { variant }, None)?;
    filter2d(src, dst, &kernel, PaddingMode::Replicate)?;
    Ok(())
}

/// Sharpen an image by subtracting its Laplacian scaled against a boost factor.
///
/// Computes `boost * src - laplacian(src)`; a boost of 1 is plain Laplacian sharpening.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `variant` - The neighborhood of the Laplacian.
/// * `boost` - The amplification of the original image, must be >= 1.
pub fn high_boost<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    variant: LaplacianVariant,
    boost: f32,
) -> Result<(), ProcessingError> {
    if !boost.is_finite() || boost < 1.0 {
        return Err(ProcessingError::invalid_parameter(
            "boost",
            "a finite value >= 1",
            boost,
        ));
    }

    let mut lap = Image::<f32, C>::from_size_val(src.size(), 0.0)?;
    laplacian(src, &mut lap, variant)?;

    parallel::par_iter_rows_val_two(src, &lap, dst, |&s, &l, out| {
        *out = boost * s - l;
    });

    Ok(())
}

/// Sharpen an image with an unsharp mask.
///
/// Computes `src + strength * (src - gaussian_blur(src, sigma))`.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `sigma` - The sigma of the blur used to extract the detail layer.
/// * `strength` - The amount of detail added back, must be >= 0.
pub fn unsharp_mask<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    sigma: f32,
    strength: f32,
) -> Result<(), ProcessingError> {
    if !strength.is_finite() || strength < 0.0 {
        return Err(ProcessingError::invalid_parameter(
            "strength",
            "a finite value >= 0",
            strength,
        ));
    }

    let mut blurred = Image::<f32, C>::from_size_val(src.size(), 0.0)?;
    gaussian_blur(src, &mut blurred, None, sigma)?;

    parallel::par_iter_rows_val_two(src, &blurred, dst, |&s, &b, out| {
        *out = s + strength * (s - b);
    });

    Ok(())
}

/// Convolve an image with the fixed 3x3 or 5x5 sharpening matrix.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_size` - 3 or 5.
pub fn sharpen<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel_size: usize,
) -> Result<(), ProcessingError> {
    let kernel = kernels::make_kernel(KernelKind::Sharpen, Some(kernel_size))?;
    filter2d(src, dst, &kernel, PaddingMode::Replicate)?;
    Ok(())
}
