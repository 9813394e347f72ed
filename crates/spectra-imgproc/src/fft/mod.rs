//! Frequency domain filtering.
//!
//! The engine transforms every channel with a 2D FFT, centers the spectrum, multiplies it
//! with a [`FilterFamily`] x [`FilterShape`] mask and transforms it back.

mod mask;
pub use mask::*;

mod ops;
pub use ops::*;

mod transform;
pub use transform::*;

pub use rustfft::num_complex::Complex;
