//! Text support for the Lumen renderer
//!
//! This crate provides:
//! - Font loading and parsing (TTF/OTF via ttf-parser)
//! - Glyph rasterization (swash)
//! - Font-atlas metric model (per-glyph UVs, bearings, advances)
//! - Default-font discovery and fallback (fontdb)
//!
//! Text shaping, bidi and full Unicode coverage are deliberately out of
//! scope: glyphs are rasterized once per size bucket over the printable
//! ASCII range, and anything outside that range renders as `?`.

pub mod atlas;
pub mod font;
pub mod rasterizer;
pub mod registry;

pub use atlas::{size_bucket, FontAtlas, GlyphMetrics};
pub use font::Font;
pub use rasterizer::{GlyphRasterizer, RasterizedGlyph};
pub use registry::FontRegistry;

use thiserror::Error;

/// Text errors
#[derive(Error, Debug)]
pub enum TextError {
    #[error("Failed to load font: {0}")]
    FontLoadError(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Atlas is full, cannot allocate glyph")]
    AtlasFull,

    #[error("Invalid font data")]
    InvalidFontData,
}

pub type Result<T> = std::result::Result<T, TextError>;
