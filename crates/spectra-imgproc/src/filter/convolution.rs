use spectra_image::{Image, ImageDtype, ImageError};

use super::kernels::Kernel;
use crate::{padding::PaddingMode, parallel};

/// Convolve an image with a square 2D kernel.
///
/// The kernel is applied as a correlation, which is identical to a convolution for the
/// symmetric kernels produced by [`super::kernels::make_kernel`].
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel` - The kernel to apply.
/// * `padding` - The border handling.
pub fn filter2d<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
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
    let radius = kernel.radius() as isize;
    let weights = kernel.as_slice();
    let ksize = kernel.size();
    let src_data = src.as_slice();

    parallel::par_fill_rows(dst, |r, dst_row| {
        for c in 0..cols {
            let mut acc = [0.0f32; C];
            for ky in 0..ksize {
                let Some(y) = padding.map_index(r as isize + ky as isize - radius, rows) else {
                    continue;
                };
                for kx in 0..ksize {
                    let Some(x) = padding.map_index(c as isize + kx as isize - radius, cols)
                    else {
                        continue;
                    };
                    let w = weights[ky * ksize + kx];
                    let idx = (y * cols + x) * C;
                    acc.iter_mut()
                        .zip(src_data[idx..idx + C].iter())
                        .for_each(|(a, &p)| *a += w * p.to_f32());
                }
            }
            dst_row[c * C..(c + 1) * C]
                .iter_mut()
                .zip(acc.iter())
                .for_each(|(d, &a)| *d = T::from_f32(a));
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::kernels::{make_kernel, KernelKind, LaplacianVariant};
    use spectra_image::ImageSize;

    #[test]
    fn test_filter2d_laplacian() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 3,
            height: 3,
        };

        #[rustfmt::skip]
        let img = Image::<f32, 1>::new(
            size,
            vec![
                0.0, 0.0, 0.0,
                0.0, 1.0, 0.0,
                0.0, 0.0, 0.0,
            ],
        )?;

        let kernel = make_kernel(
            KernelKind::Laplacian {
                variant: LaplacianVariant::FourNeighbor,
            },
            None,
        )?;

        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;
        filter2d(&img, &mut dst, &kernel, PaddingMode::Replicate)?;

        #[rustfmt::skip]
        assert_eq!(
            dst.as_slice(),
            &[
                0.0,  1.0, 0.0,
                1.0, -4.0, 1.0,
                0.0,  1.0, 0.0,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_filter2d_constant_field() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        let img = Image::<f32, 2>::from_size_val(size, 42.0)?;
        let kernel = make_kernel(KernelKind::Sharpen, Some(5))?;

        let mut dst = Image::<f32, 2>::from_size_val(size, 0.0)?;
        filter2d(&img, &mut dst, &kernel, PaddingMode::Replicate)?;

        for v in dst.as_slice() {
            approx::assert_relative_eq!(*v, 42.0, epsilon = 1e-4);
        }

        Ok(())
    }

    #[test]
    fn test_filter2d_size_mismatch() -> Result<(), Box<dyn std::error::Error>> {
        let img = Image::<f32, 1>::from_size_val([2, 2].into(), 0.0)?;
        let mut dst = Image::<f32, 1>::from_size_val([3, 2].into(), 0.0)?;
        let kernel = make_kernel(KernelKind::Box, None)?;
        assert!(filter2d(&img, &mut dst, &kernel, PaddingMode::Replicate).is_err());
        Ok(())
    }
}
