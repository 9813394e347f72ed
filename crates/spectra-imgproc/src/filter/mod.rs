//! Filter operations
//!
//! This module provides the pixel domain filters: separable and 2D convolution, the
//! blur and sharpening operators built on them, the bilateral filter and rank filters.

/// Filter kernels
pub mod kernels;

/// Filter operations
mod ops;
pub use ops::*;

/// Separable filter operations
mod separable_filter;
pub use separable_filter::*;

/// 2D convolution with a square kernel
mod convolution;
pub use convolution::*;

/// Edge preserving bilateral filter
mod bilateral;
pub use bilateral::*;

/// Median, min and max filters
mod rank;
pub use rank::*;
