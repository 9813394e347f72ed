#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use spectra_image as image;

#[doc(inline)]
pub use spectra_imgproc as imgproc;

pub use spectra_imgproc::contours::{find_objects, DetectedObject};
pub use spectra_imgproc::edge::detect_edges;
pub use spectra_imgproc::error::ProcessingError;
pub use spectra_imgproc::fft::{apply_frequency, FrequencyFilterParams, FrequencyOutput};
pub use spectra_imgproc::spatial::{apply_spatial, SpatialFilter};
