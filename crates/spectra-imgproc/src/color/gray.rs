use crate::parallel;
use spectra_image::{Image, ImageError};

/// Define the RGB weights for the grayscale conversion.
const RW: f64 = 0.299;
const GW: f64 = 0.587;
const BW: f64 = 0.114;

fn weight<T: num_traits::Float>(w: f64) -> Result<T, ImageError> {
    T::from(w).ok_or_else(|| ImageError::CastError(std::any::type_name::<T>().to_string()))
}

/// Convert an RGB image to grayscale using the formula:
///
/// Y = 0.299 * R + 0.587 * G + 0.114 * B
///
/// # Arguments
///
/// * `src` - The input RGB image.
/// * `dst` - The output grayscale image.
///
/// # Example
///
/// ```
/// use spectra_image::{Image, ImageSize};
/// use spectra_imgproc::color::gray_from_rgb;
///
/// let image = Image::<f32, 3>::new(
///     ImageSize {
///         width: 4,
///         height: 5,
///     },
///     vec![0f32; 4 * 5 * 3],
/// )
/// .unwrap();
///
/// let mut gray = Image::<f32, 1>::from_size_val(image.size(), 0.0).unwrap();
///
/// gray_from_rgb(&image, &mut gray).unwrap();
/// assert_eq!(gray.num_channels(), 1);
/// assert_eq!(gray.size().width, 4);
/// ```
pub fn gray_from_rgb<T>(src: &Image<T, 3>, dst: &mut Image<T, 1>) -> Result<(), ImageError>
where
    T: Send + Sync + num_traits::Float,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let rw = weight::<T>(RW)?;
    let gw = weight::<T>(GW)?;
    let bw = weight::<T>(BW)?;

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        dst_pixel[0] = rw * src_pixel[0] + gw * src_pixel[1] + bw * src_pixel[2];
    });

    Ok(())
}

/// Collapse an image of any channel count into a single intensity plane.
///
/// Three channel images are treated as RGB and use the luma weights of [`gray_from_rgb`];
/// any other channel count is averaged.
///
/// # Arguments
///
/// * `src` - The input image with shape (H, W, C).
/// * `dst` - The output intensity image with shape (H, W, 1).
pub fn intensity<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, 1>,
) -> Result<(), ImageError>
where
    T: Send + Sync + num_traits::Float,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if C == 3 {
        let (rw, gw, bw) = (weight::<T>(RW)?, weight::<T>(GW)?, weight::<T>(BW)?);
        parallel::par_iter_rows(src, dst, |p, out| {
            out[0] = rw * p[0] + gw * p[1] + bw * p[2];
        });
    } else {
        let n = weight::<T>(C as f64)?;
        parallel::par_iter_rows(src, dst, |p, out| {
            out[0] = p.iter().fold(T::zero(), |acc, &v| acc + v) / n;
        });
    }

    Ok(())
}
