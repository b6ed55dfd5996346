//! Image loading for the Lumen renderer
//!
//! Decodes raster formats (PNG/JPEG/BMP via the `image` crate) and
//! rasterizes SVG sources (via `resvg`) into straight-alpha RGBA8 pixel
//! buffers ready for atlas upload. Vector sources are rasterized at an
//! upscale factor so that GPU linear sampling downsamples them cleanly.

mod error;
mod loader;
mod source;

pub use error::{ImageError, Result};
pub use loader::{placeholder_image, ImageData, SVG_UPSCALE_FACTOR};
pub use source::ImageSource;

/// Policy applied when an image fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagePolicy {
    /// Propagate decode errors to the caller
    #[default]
    Strict,
    /// Log a warning and substitute the built-in placeholder image
    Fallback,
}
