//! Canny edge detection.

use spectra_image::{ops::cast_and_scale, Image};

use crate::{
    color,
    error::{ensure_positive, ensure_valid_image, ProcessingError},
    filter,
};

/// Binary edge map: [`EDGE`] on edge pixels, 0 elsewhere.
pub type EdgeMap = Image<u8, 1>;

/// Value of an edge pixel in an [`EdgeMap`].
pub const EDGE: u8 = 255;

/// Detect edges with the Canny algorithm.
///
/// The image is reduced to one intensity channel, smoothed with a gaussian of `blur_sigma`,
/// differentiated with the 3x3 Sobel operator, thinned by non-maximum suppression along the
/// gradient direction quantized to 0, 45, 90 and 135 degrees, and finally thresholded with
/// hysteresis: pixels at or above `high` seed edges that grow through 8-connected pixels at or
/// above `low`.
///
/// The Sobel kernels are not normalized, so the thresholds are in the same units as the
/// common 8-bit Canny implementations, e.g. `low = 30`, `high = 150`.
///
/// # Arguments
///
/// * `image` - The input image with shape (H, W, C).
/// * `low` - The weak edge threshold.
/// * `high` - The strong edge threshold.
/// * `blur_sigma` - The standard deviation of the pre-smoothing.
///
/// # Errors
///
/// [`ProcessingError::InvalidParameter`] unless `0 <= low < high` and `blur_sigma > 0`.
///
/// # Examples
///
/// ```
/// use spectra_image::{Image, ImageSize};
/// use spectra_imgproc::edge::detect_edges;
///
/// let image = Image::<u8, 1>::from_size_val(ImageSize { width: 16, height: 16 }, 128).unwrap();
/// let edges = detect_edges(&image, 30.0, 150.0, 1.0).unwrap();
///
/// assert!(edges.as_slice().iter().all(|&v| v == 0));
/// ```
pub fn detect_edges<const C: usize>(
    image: &Image<u8, C>,
    low: f32,
    high: f32,
    blur_sigma: f32,
) -> Result<EdgeMap, ProcessingError> {
    ensure_valid_image(image)?;
    if !low.is_finite() || low < 0.0 {
        return Err(ProcessingError::invalid_parameter(
            "low_threshold",
            "a finite value >= 0",
            low,
        ));
    }
    if !high.is_finite() || high <= low {
        return Err(ProcessingError::invalid_parameter(
            "high_threshold",
            format!("a finite value greater than low_threshold ({low})"),
            high,
        ));
    }
    ensure_positive("blur_sigma", blur_sigma)?;

    let size = image.size();

    let mut image_f32 = Image::<f32, C>::from_size_val(size, 0.0)?;
    cast_and_scale(image, &mut image_f32, 1.0)?;
    let mut gray = Image::<f32, 1>::from_size_val(size, 0.0)?;
    color::intensity(&image_f32, &mut gray)?;

    let mut blurred = Image::<f32, 1>::from_size_val(size, 0.0)?;
    filter::gaussian_blur(&gray, &mut blurred, None, blur_sigma)?;

    let mut gx = Image::<f32, 1>::from_size_val(size, 0.0)?;
    let mut gy = Image::<f32, 1>::from_size_val(size, 0.0)?;
    filter::spatial_gradient(&blurred, &mut gx, &mut gy)?;

    let thinned = non_maximum_suppression(&gx, &gy);
    let edges = hysteresis(&thinned, size.width, low, high);

    log::debug!(
        "detect_edges: {} edge pixels in {}",
        edges.iter().filter(|&&v| v == EDGE).count(),
        size
    );

    Ok(Image::new(size, edges)?)
}

/// Keep the gradient magnitude of pixels that are a local maximum across the edge.
///
/// Border pixels have an incomplete neighborhood and are always suppressed.
fn non_maximum_suppression(gx: &Image<f32, 1>, gy: &Image<f32, 1>) -> Vec<f32> {
    let (rows, cols) = (gx.rows(), gx.cols());
    let gx = gx.as_slice();
    let gy = gy.as_slice();
    let magnitude = gx
        .iter()
        .zip(gy.iter())
        .map(|(x, y)| x.hypot(*y))
        .collect::<Vec<_>>();

    let mut out = vec![0.0f32; rows * cols];
    if rows < 3 || cols < 3 {
        return out;
    }

    for r in 1..rows - 1 {
        for c in 1..cols - 1 {
            let idx = r * cols + c;
            let m = magnitude[idx];
            if m == 0.0 {
                continue;
            }

            let mut angle = gy[idx].atan2(gx[idx]).to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }

            // rows grow downwards, so 45 degrees points to the bottom right
            let (a, b) = if !(22.5..157.5).contains(&angle) {
                (idx - 1, idx + 1)
            } else if angle < 67.5 {
                (idx - cols - 1, idx + cols + 1)
            } else if angle < 112.5 {
                (idx - cols, idx + cols)
            } else {
                (idx - cols + 1, idx + cols - 1)
            };

            if m >= magnitude[a] && m >= magnitude[b] {
                out[idx] = m;
            }
        }
    }

    out
}

/// Double threshold with an explicit stack, so weak pixels are kept whenever any 8-connected
/// path of weak pixels reaches a strong one.
fn hysteresis(magnitude: &[f32], cols: usize, low: f32, high: f32) -> Vec<u8> {
    let rows = magnitude.len() / cols;
    let mut edges = vec![0u8; magnitude.len()];
    let mut stack = Vec::new();

    for seed in 0..magnitude.len() {
        if magnitude[seed] < high || edges[seed] == EDGE {
            continue;
        }

        edges[seed] = EDGE;
        stack.push(seed);

        while let Some(idx) = stack.pop() {
            let (r, c) = ((idx / cols) as isize, (idx % cols) as isize);
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let (nr, nc) = (r + dy, c + dx);
                    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                        continue;
                    }
                    let n = nr as usize * cols + nc as usize;
                    // suppressed pixels hold zero and never join a chain
                    if edges[n] == 0 && magnitude[n] > 0.0 && magnitude[n] >= low {
                        edges[n] = EDGE;
                        stack.push(n);
                    }
                }
            }
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectra_image::ImageSize;

    fn square(side: usize, offset: usize, size: usize) -> Result<Image<u8, 1>, ProcessingError> {
        let mut img = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: size,
                height: size,
            },
            0,
        )?;
        for y in offset..offset + side {
            for x in offset..offset + side {
                img.set_pixel(x, y, 0, 255)?;
            }
        }
        Ok(img)
    }

    #[test]
    fn square_edges_follow_the_border() -> Result<(), ProcessingError> {
        let img = square(10, 5, 20)?;
        let edges = detect_edges(&img, 30.0, 150.0, 1.0)?;

        let mut found = 0;
        for y in 0..20 {
            for x in 0..20 {
                if *edges.get_pixel(x, y, 0)? == EDGE {
                    found += 1;
                    let near_x = (4..=6).contains(&x) || (13..=15).contains(&x);
                    let near_y = (4..=6).contains(&y) || (13..=15).contains(&y);
                    assert!(near_x || near_y, "unexpected edge at ({x}, {y})");
                }
            }
        }
        assert!(found > 0);

        // centers of the flat areas are never edges
        assert_eq!(edges.get_pixel(10, 10, 0)?, &0);
        assert_eq!(edges.get_pixel(0, 0, 0)?, &0);
        Ok(())
    }

    #[test]
    fn invalid_thresholds() -> Result<(), ProcessingError> {
        let img = square(4, 2, 8)?;
        for (low, high, sigma) in [
            (50.0, 10.0, 1.0),
            (10.0, 10.0, 1.0),
            (-1.0, 10.0, 1.0),
            (10.0, 20.0, 0.0),
            (f32::NAN, 20.0, 1.0),
        ] {
            assert!(matches!(
                detect_edges(&img, low, high, sigma),
                Err(ProcessingError::InvalidParameter { .. })
            ));
        }
        Ok(())
    }

    #[test]
    fn hysteresis_follows_weak_chains() {
        #[rustfmt::skip]
        let magnitude = [
            200.0, 50.0, 0.0, 0.0, 0.0,
              0.0,  0.0, 60.0, 0.0, 0.0,
              0.0,  0.0, 0.0, 70.0, 0.0,
             50.0,  0.0, 0.0, 0.0, 0.0,
        ];
        let edges = hysteresis(&magnitude, 5, 40.0, 100.0);

        #[rustfmt::skip]
        let expected = [
            255, 255,   0,   0, 0,
              0,   0, 255,   0, 0,
              0,   0,   0, 255, 0,
              0,   0,   0,   0, 0,
        ];
        assert_eq!(edges, expected);
    }

    #[test]
    fn zero_low_threshold_keeps_a_thin_ring() -> Result<(), ProcessingError> {
        let img = square(20, 10, 40)?;
        let zero = detect_edges(&img, 0.0, 150.0, 1.0)?;
        let one = detect_edges(&img, 1.0, 150.0, 1.0)?;

        let count = |edges: &EdgeMap| edges.as_slice().iter().filter(|&&v| v == EDGE).count();
        assert!(count(&one) > 0);
        assert!(count(&zero) >= count(&one));
        assert!(count(&zero) < 200, "{} edge pixels", count(&zero));

        for y in 0..40 {
            for x in 0..40 {
                if *zero.get_pixel(x, y, 0)? == EDGE {
                    let near_x = (6..=13).contains(&x) || (26..=33).contains(&x);
                    let near_y = (6..=13).contains(&y) || (26..=33).contains(&y);
                    assert!(near_x || near_y, "unexpected edge at ({x}, {y})");
                }
                if *one.get_pixel(x, y, 0)? == EDGE {
                    assert_eq!(zero.get_pixel(x, y, 0)?, &EDGE);
                }
            }
        }
        assert_eq!(zero.get_pixel(20, 20, 0)?, &0);
        assert_eq!(zero.get_pixel(0, 0, 0)?, &0);
        Ok(())
    }

    #[test]
    fn huge_blur_sigma() -> Result<(), ProcessingError> {
        let img = square(20, 10, 40)?;
        let edges = detect_edges(&img, 30.0, 150.0, 1e30)?;
        assert_eq!(edges.size(), img.size());
        Ok(())
    }

    #[test]
    fn hysteresis_skips_suppressed_pixels() {
        #[rustfmt::skip]
        let magnitude = [
            200.0, 0.0, 0.0,
              0.0, 0.0, 0.0,
              0.0, 0.0, 5.0,
        ];
        let edges = hysteresis(&magnitude, 3, 0.0, 100.0);

        #[rustfmt::skip]
        let expected = [
            255, 0, 0,
              0, 0, 0,
              0, 0, 0,
        ];
        assert_eq!(edges, expected);
    }

    #[test]
    fn nms_thins_a_ridge() -> Result<(), ProcessingError> {
        let size = ImageSize {
            width: 5,
            height: 3,
        };
        // horizontal gradient with its peak in the middle column
        let gx = Image::<f32, 1>::new(size, vec![1.0, 2.0, 3.0, 2.0, 1.0].repeat(3))?;
        let gy = Image::<f32, 1>::from_size_val(size, 0.0)?;
        let out = non_maximum_suppression(&gx, &gy);
        assert_eq!(&out[5..10], &[0.0, 0.0, 3.0, 0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn multi_channel_input() -> Result<(), ProcessingError> {
        let gray = square(6, 5, 16)?;
        let two = Image::<u8, 2>::new(
            gray.size(),
            gray.as_slice().iter().flat_map(|&v| [v, v]).collect(),
        )?;
        assert_eq!(
            detect_edges(&two, 20.0, 100.0, 1.0)?,
            detect_edges(&gray, 20.0, 100.0, 1.0)?
        );
        Ok(())
    }
}
