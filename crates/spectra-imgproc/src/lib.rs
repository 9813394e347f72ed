#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
/// color to intensity conversions.
pub mod color;

/// border following and object extraction.
pub mod contours;

/// utilities to draw on images.
pub mod draw;

/// canny edge detection.
pub mod edge;

/// processing errors.
pub mod error;

/// frequency domain filtering module.
pub mod fft;

/// image filtering module.
pub mod filter;

/// border extrapolation and padding.
pub mod padding;

/// module containing parallization utilities.
pub mod parallel;

/// spatial filter dispatch over `u8` images.
pub mod spatial;
