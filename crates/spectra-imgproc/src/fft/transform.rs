use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftDirection, FftPlanner};

use spectra_image::{Image, ImageSize};

use crate::error::{ensure_valid_image, ProcessingError};

/// Complex 2D spectrum of a single channel image.
///
/// The samples are stored row-major with the same (H, W) layout as the image they were
/// computed from. After [`Spectrum::shift`] the zero frequency sits at
/// `(rows / 2, cols / 2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    size: ImageSize,
    data: Vec<Complex<f64>>,
}

impl Spectrum {
    /// Compute the 2D discrete Fourier transform of a single channel image.
    ///
    /// Any size is supported; sizes with small prime factors are fastest.
    ///
    /// # Examples
    ///
    /// ```
    /// use spectra_image::{Image, ImageSize};
    /// use spectra_imgproc::fft::Spectrum;
    ///
    /// let image = Image::<f64, 1>::from_size_val(ImageSize { width: 4, height: 3 }, 2.0).unwrap();
    /// let spectrum = Spectrum::forward(&image).unwrap();
    ///
    /// // all the energy of a constant image is in the DC term
    /// assert!((spectrum.as_slice()[0].re - 24.0).abs() < 1e-9);
    /// assert!(spectrum.as_slice()[1].norm() < 1e-9);
    /// ```
    pub fn forward(image: &Image<f64, 1>) -> Result<Self, ProcessingError> {
        ensure_valid_image(image)?;

        let mut data = image
            .as_slice()
            .iter()
            .map(|&v| Complex::new(v, 0.0))
            .collect::<Vec<_>>();

        fft2(image.size(), &mut data, FftDirection::Forward);

        Ok(Self {
            size: image.size(),
            data,
        })
    }

    /// Wrap already computed frequency samples.
    pub fn from_complex(size: ImageSize, data: Vec<Complex<f64>>) -> Result<Self, ProcessingError> {
        if size.is_empty() || data.len() != size.area() {
            return Err(ProcessingError::InvalidImage(format!(
                "spectrum of {size} needs {} samples, got {}",
                size.area(),
                data.len()
            )));
        }
        Ok(Self { size, data })
    }

    /// Compute the inverse transform and return its real part.
    ///
    /// The result is scaled by `1 / (rows * cols)` so that `forward` followed by `inverse`
    /// reproduces the input.
    pub fn inverse(&self) -> Result<Image<f64, 1>, ProcessingError> {
        let mut data = self.data.clone();
        fft2(self.size, &mut data, FftDirection::Inverse);

        let norm = 1.0 / self.size.area() as f64;
        let real = data.into_iter().map(|c| c.re * norm).collect();

        Ok(Image::new(self.size, real)?)
    }

    /// Swap quadrants so that the zero frequency moves to the center.
    pub fn shift(&mut self) {
        let (rows, cols) = (self.size.height, self.size.width);
        self.data = roll(&self.data, rows, cols, rows / 2, cols / 2);
    }

    /// Undo [`Spectrum::shift`], also for odd sizes.
    pub fn ishift(&mut self) {
        let (rows, cols) = (self.size.height, self.size.width);
        self.data = roll(&self.data, rows, cols, rows - rows / 2, cols - cols / 2);
    }

    /// Multiply every frequency sample by a real weight.
    pub fn apply_mask(&mut self, mask: &[f64]) -> Result<(), ProcessingError> {
        if mask.len() != self.data.len() {
            return Err(ProcessingError::InvalidParameter {
                name: "mask",
                expected: format!("{} weights", self.data.len()),
                actual: mask.len().to_string(),
            });
        }

        self.data
            .par_iter_mut()
            .zip(mask.par_iter())
            .for_each(|(f, &m)| *f *= m);

        Ok(())
    }

    /// The absolute value of each sample.
    pub fn magnitude(&self) -> Vec<f64> {
        self.data.iter().map(|c| c.norm()).collect()
    }

    /// The phase angle of each sample in `[-pi, pi]`.
    pub fn phase(&self) -> Vec<f64> {
        self.data.iter().map(|c| c.arg()).collect()
    }

    /// The size of the spectrum.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The frequency samples.
    pub fn as_slice(&self) -> &[Complex<f64>] {
        &self.data
    }
}

/// Move every sample `dy` rows down and `dx` columns right, wrapping around.
fn roll<T: Copy>(data: &[T], rows: usize, cols: usize, dy: usize, dx: usize) -> Vec<T> {
    let mut out = data.to_vec();
    for r in 0..rows {
        let dst_r = (r + dy) % rows;
        for c in 0..cols {
            out[dst_r * cols + (c + dx) % cols] = data[r * cols + c];
        }
    }
    out
}

/// In place 2D transform: rows first, then columns through a transposed buffer.
fn fft2(size: ImageSize, data: &mut [Complex<f64>], direction: FftDirection) {
    let (rows, cols) = (size.height, size.width);
    let mut planner = FftPlanner::<f64>::new();

    let row_fft = planner.plan_fft(cols, direction);
    data.par_chunks_exact_mut(cols)
        .for_each(|row| row_fft.process(row));

    let col_fft = planner.plan_fft(rows, direction);
    let mut transposed = vec![Complex::default(); data.len()];
    for r in 0..rows {
        for c in 0..cols {
            transposed[c * rows + r] = data[r * cols + c];
        }
    }
    transposed
        .par_chunks_exact_mut(rows)
        .for_each(|col| col_fft.process(col));
    for c in 0..cols {
        for r in 0..rows {
            data[r * cols + c] = transposed[c * rows + r];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pattern(width: usize, height: usize) -> Result<Image<f64, 1>, ProcessingError> {
        let data = (0..width * height)
            .map(|i| ((i * 37 + 11) % 256) as f64)
            .collect();
        Ok(Image::new(ImageSize { width, height }, data)?)
    }

    #[test]
    fn roundtrip_reproduces_input() -> Result<(), ProcessingError> {
        for (w, h) in [(8, 8), (7, 5), (1, 6), (12, 1)] {
            let image = pattern(w, h)?;
            let spectrum = Spectrum::forward(&image)?;
            let back = spectrum.inverse()?;
            for (a, b) in back.as_slice().iter().zip(image.as_slice()) {
                assert_relative_eq!(a, b, epsilon = 1e-9);
            }
        }
        Ok(())
    }

    #[test]
    fn shift_centers_dc() -> Result<(), ProcessingError> {
        for (w, h) in [(6, 4), (5, 7)] {
            let image = Image::<f64, 1>::from_size_val(ImageSize { width: w, height: h }, 1.0)?;
            let mut spectrum = Spectrum::forward(&image)?;
            spectrum.shift();
            let dc = spectrum.as_slice()[(h / 2) * w + w / 2];
            assert_relative_eq!(dc.re, (w * h) as f64, epsilon = 1e-9);

            let before = Spectrum::forward(&image)?;
            spectrum.ishift();
            assert_eq!(spectrum, before);
        }
        Ok(())
    }

    #[test]
    fn all_pass_mask_roundtrip() -> Result<(), ProcessingError> {
        let image = pattern(9, 6)?;
        let mut spectrum = Spectrum::forward(&image)?;
        spectrum.shift();
        spectrum.apply_mask(&[1.0; 54])?;
        spectrum.ishift();
        let back = spectrum.inverse()?;
        for (a, b) in back.as_slice().iter().zip(image.as_slice()) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
        assert!(spectrum.apply_mask(&[1.0; 3]).is_err());
        Ok(())
    }

    #[test]
    fn magnitude_and_phase() -> Result<(), ProcessingError> {
        let spectrum = Spectrum::from_complex(
            ImageSize {
                width: 2,
                height: 1,
            },
            vec![Complex::new(3.0, 4.0), Complex::new(-1.0, 0.0)],
        )?;
        assert_eq!(spectrum.magnitude(), vec![5.0, 1.0]);
        assert_relative_eq!(spectrum.phase()[1], std::f64::consts::PI);
        assert!(Spectrum::from_complex(ImageSize { width: 2, height: 2 }, vec![]).is_err());
        Ok(())
    }
}
