use rayon::prelude::*;

use spectra_image::{Image, ImageDtype, ImageError};

use crate::padding::PaddingMode;

/// Apply a separable filter to an image.
///
/// The horizontal kernel runs first into a `f32` buffer, then the vertical kernel writes
/// the destination. Samples outside the image are fetched according to `padding`, with
/// [`PaddingMode::Constant`] reading zeros, so the output keeps the input size.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_x` - The horizontal kernel, odd length.
/// * `kernel_y` - The vertical kernel, odd length.
/// * `padding` - The border handling.
///
/// # Errors
///
/// Returns an error if the source and destination sizes differ.
pub fn separable_filter<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
    padding: PaddingMode,
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
    let stride = cols * C;
    let half_x = (kernel_x.len() / 2) as isize;
    let half_y = (kernel_y.len() / 2) as isize;

    // horizontal
    let src_data = src.as_slice();
    let mut temp = vec![0.0f32; src_data.len()];
    temp.par_chunks_exact_mut(stride)
        .zip(src_data.par_chunks_exact(stride))
        .for_each(|(temp_row, src_row)| {
            for c in 0..cols {
                let mut acc = [0.0f32; C];
                for (i, &k) in kernel_x.iter().enumerate() {
                    let Some(x) = padding.map_index(c as isize + i as isize - half_x, cols) else {
                        continue;
                    };
                    let pixel = &src_row[x * C..(x + 1) * C];
                    acc.iter_mut()
                        .zip(pixel.iter())
                        .for_each(|(a, &p)| *a += p.to_f32() * k);
                }
                temp_row[c * C..(c + 1) * C].copy_from_slice(&acc);
            }
        });

    // vertical
    dst.as_slice_mut()
        .par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(r, dst_row)| {
            let mut acc = vec![0.0f32; stride];
            for (i, &k) in kernel_y.iter().enumerate() {
                let Some(y) = padding.map_index(r as isize + i as isize - half_y, rows) else {
                    continue;
                };
                acc.iter_mut()
                    .zip(temp[y * stride..(y + 1) * stride].iter())
                    .for_each(|(a, &t)| *a += t * k);
            }
            dst_row
                .iter_mut()
                .zip(acc.iter())
                .for_each(|(d, &a)| *d = T::from_f32(a));
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectra_image::ImageSize;

    #[test]
    fn test_separable_filter_impulse() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 5,
            height: 5,
        };

        #[rustfmt::skip]
        let img = Image::<f32, 1>::new(
            size,
            vec![
                0.0, 0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 9.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 0.0, 0.0,
            ],
        )?;

        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;
        let kernel = vec![1.0 / 3.0; 3];

        separable_filter(&img, &mut dst, &kernel, &kernel, PaddingMode::Replicate)?;

        #[rustfmt::skip]
        let expected = [
            0.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 1.0, 1.0, 0.0,
            0.0, 1.0, 1.0, 1.0, 0.0,
            0.0, 1.0, 1.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0,
        ];

        for (a, b) in dst.as_slice().iter().zip(expected.iter()) {
            approx::assert_relative_eq!(a, b, epsilon = 1e-6);
        }

        Ok(())
    }

    #[test]
    fn test_separable_filter_border_modes() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 1,
        };
        let img = Image::<f32, 1>::new(size, vec![3.0, 3.0, 3.0])?;
        let kernel = vec![1.0 / 3.0; 3];
        let identity = [1.0];

        let mut replicate = Image::<f32, 1>::from_size_val(size, 0.0)?;
        separable_filter(&img, &mut replicate, &kernel, &identity, PaddingMode::Replicate)?;
        for v in replicate.as_slice() {
            approx::assert_relative_eq!(*v, 3.0, epsilon = 1e-6);
        }

        let mut constant = Image::<f32, 1>::from_size_val(size, 0.0)?;
        separable_filter(&img, &mut constant, &kernel, &identity, PaddingMode::Constant)?;
        approx::assert_relative_eq!(constant.as_slice()[0], 2.0, epsilon = 1e-6);
        approx::assert_relative_eq!(constant.as_slice()[1], 3.0, epsilon = 1e-6);

        Ok(())
    }

    #[test]
    fn test_separable_filter_u8_saturates() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 2,
            height: 1,
        };
        let img = Image::<u8, 1>::new(size, vec![200, 250])?;
        let mut dst = Image::<u8, 1>::from_size_val(size, 0)?;
        separable_filter(&img, &mut dst, &[2.0], &[1.0], PaddingMode::Replicate)?;
        assert_eq!(dst.as_slice(), &[255, 255]);
        Ok(())
    }
}
