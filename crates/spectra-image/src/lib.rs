#![deny(missing_docs)]
//! Image types and traits for generating and manipulating images

/// image representation for filtering and detection purposes.
pub mod image;

/// Error types for the image module.
pub mod error;

/// image operations that convert between sample types.
pub mod ops;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageDtype, ImageSize};
