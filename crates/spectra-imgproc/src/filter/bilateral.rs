use spectra_image::{Image, ImageDtype, ImageError};

use super::kernels;
use crate::{padding::PaddingMode, parallel};

/// Edge preserving bilateral filter.
///
/// Each output sample is the weighted mean of its neighbors within a square window of
/// radius `ceil(3 * sigma_space)`, capped at the larger image side. The weight of a neighbor is the product of a spatial
/// gaussian over its distance to the center and a range gaussian over the difference of
/// intensities, computed independently per channel. Borders replicate the edge pixels.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `sigma_space` - Standard deviation of the spatial gaussian, in pixels.
/// * `sigma_color` - Standard deviation of the range gaussian, in intensity units.
///
/// # Errors
///
/// Returns an error if the source and destination sizes differ. The sigmas are expected to
/// be validated by the caller.
pub fn bilateral_filter<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    sigma_space: f32,
    sigma_color: f32,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let (rows, cols) = (src.rows(), src.cols());
    let radius = kernels::gaussian_radius(sigma_space, rows.max(cols)) as isize;
    let window = (2 * radius + 1) as usize;

    // spatial weights only depend on the offset
    let space_coeff = -0.5 / (sigma_space * sigma_space);
    let spatial = (0..window * window)
        .map(|i| {
            let dy = (i / window) as isize - radius;
            let dx = (i % window) as isize - radius;
            ((dx * dx + dy * dy) as f32 * space_coeff).exp()
        })
        .collect::<Vec<_>>();
    let color_coeff = -0.5 / (sigma_color * sigma_color);

    let src_data = src.as_slice();
    let mode = PaddingMode::Replicate;

    parallel::par_fill_rows(dst, |r, dst_row| {
        for c in 0..cols {
            let center_idx = (r * cols + c) * C;
            for ch in 0..C {
                let center = src_data[center_idx + ch].to_f32();
                let mut sum = 0.0f32;
                let mut norm = 0.0f32;
                for (i, &ws) in spatial.iter().enumerate() {
                    let dy = (i / window) as isize - radius;
                    let dx = (i % window) as isize - radius;
                    let (Some(y), Some(x)) = (
                        mode.map_index(r as isize + dy, rows),
                        mode.map_index(c as isize + dx, cols),
                    ) else {
                        continue;
                    };
                    let v = src_data[(y * cols + x) * C + ch].to_f32();
                    let diff = v - center;
                    let w = ws * (diff * diff * color_coeff).exp();
                    sum += w * v;
                    norm += w;
                }
                // the center tap always has weight 1, so norm > 0
                dst_row[c * C + ch] = T::from_f32(sum / norm);
            }
        }
    });

    Ok(())
}
