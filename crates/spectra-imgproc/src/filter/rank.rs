use serde::{Deserialize, Serialize};
use spectra_image::{Image, ImageDtype, ImageError};

use crate::{padding::PaddingMode, parallel};

/// Order statistic selected from each window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankKind {
    /// The middle element.
    Median,
    /// The smallest element (erosion).
    Min,
    /// The largest element (dilation).
    Max,
}

/// Replace each sample with an order statistic of its square neighborhood.
///
/// Channels are ranked independently. Windows crossing the border replicate edge pixels.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_size` - Odd side length of the window.
/// * `kind` - The statistic to pick.
pub fn rank_filter<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel_size: usize,
    kind: RankKind,
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
    let radius = (kernel_size / 2) as isize;
    let src_data = src.as_slice();
    let mode = PaddingMode::Replicate;

    parallel::par_fill_rows(dst, |r, dst_row| {
        let mut window = Vec::with_capacity(kernel_size * kernel_size);
        for c in 0..cols {
            for ch in 0..C {
                window.clear();
                for dy in -radius..=radius {
                    let Some(y) = mode.map_index(r as isize + dy, rows) else {
                        continue;
                    };
                    for dx in -radius..=radius {
                        let Some(x) = mode.map_index(c as isize + dx, cols) else {
                            continue;
                        };
                        window.push(src_data[(y * cols + x) * C + ch].to_f32());
                    }
                }
                let value = match kind {
                    RankKind::Min => window.iter().copied().fold(f32::INFINITY, f32::min),
                    RankKind::Max => window.iter().copied().fold(f32::NEG_INFINITY, f32::max),
                    RankKind::Median => {
                        let mid = window.len() / 2;
                        *window.select_nth_unstable_by(mid, f32::total_cmp).1
                    }
                };
                dst_row[c * C + ch] = T::from_f32(value);
            }
        }
    });

    Ok(())
}
