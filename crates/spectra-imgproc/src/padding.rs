use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use spectra_image::{Image, ImageError, ImageSize};

/// A border type for the spatial padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingMode {
    /// Fills the border with a single constant value.
    ///
    /// Example: ...d c b a | 0 0 0 0...
    Constant,

    /// Repeats the outermost row or column into the padded region.
    ///
    /// Example: ...d c b a | a a a a...
    #[default]
    Replicate,

    /// Mirrors the image starting with the pixel next to the edge.
    ///
    /// Example: ...d c b a | b c d e...
    Reflect101,

    /// Mirrors the image starting with the edge pixel itself.
    ///
    /// Example: ...d c b a | a b c d...
    Reflect,

    /// Wraps the content from the opposite side.
    ///
    /// Example: ...d c b a | w x y z...
    Wrap,
}

impl PaddingMode {
    /// Maps index `i` to a valid index within `[0, len)` according to the padding mode.
    ///
    /// Returns `None` for [`PaddingMode::Constant`] when `i` falls outside the image, since the
    /// sample then comes from the fill value instead of the image.
    ///
    /// # Arguments
    ///
    /// * `i` - The (possibly out-of-range) coordinate index.
    /// * `len` - The valid length of the dimension, must be non-zero.
    #[inline]
    pub fn map_index(&self, i: isize, len: usize) -> Option<usize> {
        let n = len as isize;
        if (0..n).contains(&i) {
            return Some(i as usize);
        }
        if len == 1 {
            return match self {
                PaddingMode::Constant => None,
                _ => Some(0),
            };
        }
        match self {
            PaddingMode::Constant => None,
            PaddingMode::Replicate => Some(i.clamp(0, n - 1) as usize),
            PaddingMode::Wrap => Some(i.rem_euclid(n) as usize),
            PaddingMode::Reflect => {
                let period = 2 * n;
                let j = i.rem_euclid(period);
                Some(if j < n { j } else { period - 1 - j } as usize)
            }
            PaddingMode::Reflect101 => {
                let period = 2 * n - 2;
                let j = i.rem_euclid(period);
                Some(if j < n { j } else { period - j } as usize)
            }
        }
    }
}

/// Represents 2D padding with top, bottom, left, and right values (in pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding2D {
    /// Amount of padding to add on the top side.
    pub top: usize,
    /// Amount of padding to add on the bottom side.
    pub bottom: usize,
    /// Amount of padding to add on the left side.
    pub left: usize,
    /// Amount of padding to add on the right side.
    pub right: usize,
}

impl Padding2D {
    /// Size of an image of `size` once this padding is applied.
    pub fn padded_size(&self, size: ImageSize) -> ImageSize {
        ImageSize {
            width: size.width + self.left + self.right,
            height: size.height + self.top + self.bottom,
        }
    }
}

/// Pad `src` into `dst`, filling the border according to `padding_mode`.
///
/// # Arguments
///
/// * `src` - The source image to pad.
/// * `dst` - The destination image, sized as `padding.padded_size(src.size())`.
/// * `padding` - The amount of padding for each side.
/// * `padding_mode` - The border handling.
/// * `constant_value` - The per channel fill value used by [`PaddingMode::Constant`].
///
/// # Errors
///
/// Returns an error if the size of `dst` does not match the padded size of `src`.
///
/// # Example
///
/// ```rust
/// use spectra_image::{Image, ImageSize};
/// use spectra_imgproc::padding::{spatial_padding, Padding2D, PaddingMode};
///
/// let src = Image::<u8, 1>::new(ImageSize { width: 2, height: 1 }, vec![1, 2]).unwrap();
/// let mut dst = Image::<u8, 1>::from_size_val(ImageSize { width: 4, height: 1 }, 0).unwrap();
///
/// let padding = Padding2D { top: 0, bottom: 0, left: 1, right: 1 };
/// spatial_padding(&src, &mut dst, padding, PaddingMode::Replicate, [0]).unwrap();
///
/// assert_eq!(dst.as_slice(), &[1, 1, 2, 2]);
/// ```
pub fn spatial_padding<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    padding: Padding2D,
    padding_mode: PaddingMode,
    constant_value: [T; C],
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    let expected = padding.padded_size(src.size());
    if dst.size() != expected {
        return Err(ImageError::InvalidImageSize(
            dst.width(),
            dst.height(),
            expected.width,
            expected.height,
        ));
    }

    let (src_cols, src_rows) = (src.cols(), src.rows());
    let src_data = src.as_slice();
    let dst_stride = dst.cols() * C;

    dst.as_slice_mut()
        .par_chunks_exact_mut(dst_stride)
        .enumerate()
        .for_each(|(r, dst_row)| {
            let src_r = padding_mode.map_index(r as isize - padding.top as isize, src_rows);
            for (c, dst_pixel) in dst_row.chunks_exact_mut(C).enumerate() {
                let src_c = padding_mode.map_index(c as isize - padding.left as isize, src_cols);
                match (src_r, src_c) {
                    (Some(y), Some(x)) => {
                        let idx = (y * src_cols + x) * C;
                        dst_pixel.copy_from_slice(&src_data[idx..idx + C]);
                    }
                    _ => dst_pixel.copy_from_slice(&constant_value),
                }
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_src_2x2_rgb() -> Result<Image<u8, 3>, ImageError> {
        Image::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4],
        )
    }

    const PAD_1: Padding2D = Padding2D {
        top: 1,
        bottom: 1,
        left: 1,
        right: 1,
    };

    #[test]
    fn test_map_index() {
        let len = 4;
        assert_eq!(PaddingMode::Replicate.map_index(-2, len), Some(0));
        assert_eq!(PaddingMode::Replicate.map_index(5, len), Some(3));
        assert_eq!(PaddingMode::Reflect.map_index(-1, len), Some(0));
        assert_eq!(PaddingMode::Reflect.map_index(4, len), Some(3));
        assert_eq!(PaddingMode::Reflect101.map_index(-1, len), Some(1));
        assert_eq!(PaddingMode::Reflect101.map_index(4, len), Some(2));
        assert_eq!(PaddingMode::Wrap.map_index(-1, len), Some(3));
        assert_eq!(PaddingMode::Wrap.map_index(4, len), Some(0));
        assert_eq!(PaddingMode::Constant.map_index(-1, len), None);
        assert_eq!(PaddingMode::Constant.map_index(2, len), Some(2));
        assert_eq!(PaddingMode::Reflect101.map_index(-3, 1), Some(0));
    }

    #[test]
    fn test_spatial_padding_constant() -> Result<(), ImageError> {
        let src = make_src_2x2_rgb()?;
        let mut dst = Image::<u8, 3>::from_size_val(PAD_1.padded_size(src.size()), 0)?;

        spatial_padding(&src, &mut dst, PAD_1, PaddingMode::Constant, [9, 9, 9])?;

        let d = dst.as_slice();
        assert_eq!(&d[0..3], &[9, 9, 9]);
        assert_eq!(&d[45..48], &[9, 9, 9]);
        assert_eq!(&d[15..18], &[1, 1, 1]);
        assert_eq!(&d[30..33], &[4, 4, 4]);

        Ok(())
    }

    #[test]
    fn test_spatial_padding_replicate() -> Result<(), ImageError> {
        let src = make_src_2x2_rgb()?;
        let mut dst = Image::<u8, 3>::from_size_val(PAD_1.padded_size(src.size()), 0)?;

        spatial_padding(&src, &mut dst, PAD_1, PaddingMode::Replicate, [0, 0, 0])?;

        let d = dst.as_slice();
        assert_eq!(&d[0..3], &[1, 1, 1]);
        assert_eq!(&d[45..48], &[4, 4, 4]);
        assert_eq!(&d[21..24], &[2, 2, 2]);

        Ok(())
    }

    #[test]
    fn test_spatial_padding_size_mismatch() -> Result<(), ImageError> {
        let src = make_src_2x2_rgb()?;
        let mut dst = Image::<u8, 3>::from_size_val([3, 3].into(), 0)?;
        let res = spatial_padding(&src, &mut dst, PAD_1, PaddingMode::Wrap, [0, 0, 0]);
        assert_eq!(res, Err(ImageError::InvalidImageSize(3, 3, 4, 4)));
        Ok(())
    }
}
