//! Glyph rasterization using swash
//!
//! Converts font glyph outlines to alpha bitmaps for the atlas. Uses swash
//! for high-quality, accurate glyph rendering.

use crate::font::Font;
use crate::{Result, TextError};
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::Format;

/// Rasterized glyph bitmap with metrics
#[derive(Debug, Clone)]
pub struct RasterizedGlyph {
    /// 8-bit alpha coverage, row-major, `width * height` bytes. Empty for
    /// blank glyphs such as space.
    pub bitmap: Vec<u8>,
    /// Bitmap width in pixels
    pub width: u32,
    /// Bitmap height in pixels
    pub height: u32,
    /// Horizontal bearing (offset from origin to left edge)
    pub bearing_x: i32,
    /// Vertical bearing (offset from baseline up to top edge)
    pub bearing_y: i32,
    /// Horizontal advance to the next glyph position
    pub advance: f32,
}

/// Glyph rasterizer holding the swash scaling state across calls
pub struct GlyphRasterizer {
    scale_context: ScaleContext,
}

impl GlyphRasterizer {
    pub fn new() -> Self {
        Self {
            scale_context: ScaleContext::new(),
        }
    }

    /// Map a character to its glyph id, or `None` when the font has no
    /// coverage for it
    pub fn glyph_id(&self, font: &Font, ch: char) -> Option<u16> {
        let swash_font = swash::FontRef::from_index(font.data(), font.face_index() as usize)?;
        let gid = swash_font.charmap().map(ch);
        (gid != 0).then_some(gid)
    }

    /// Rasterize one glyph at the given pixel size
    pub fn rasterize(&mut self, font: &Font, glyph_id: u16, font_size: f32) -> Result<RasterizedGlyph> {
        let swash_font = swash::FontRef::from_index(font.data(), font.face_index() as usize)
            .ok_or(TextError::InvalidFontData)?;

        let mut scaler = self
            .scale_context
            .builder(swash_font)
            .size(font_size)
            .build();

        // Advance comes from font metrics, scaled from font units to pixels
        let metrics = swash_font.metrics(&[]);
        let glyph_metrics = swash_font.glyph_metrics(&[]);
        let scale = font_size / metrics.units_per_em as f32;
        let advance = glyph_metrics.advance_width(glyph_id) * scale;

        let mut render = Render::new(&[
            Source::ColorOutline(0),
            Source::ColorBitmap(StrikeWith::BestFit),
            Source::Outline,
        ]);
        render.format(Format::Alpha);

        match render.render(&mut scaler, glyph_id) {
            Some(img) => Ok(RasterizedGlyph {
                bearing_x: img.placement.left,
                bearing_y: img.placement.top,
                width: img.placement.width,
                height: img.placement.height,
                bitmap: img.data,
                advance,
            }),
            // Blank glyph (like space): no bitmap but still has an advance
            None => Ok(RasterizedGlyph {
                bitmap: Vec::new(),
                width: 0,
                height: 0,
                bearing_x: 0,
                bearing_y: 0,
                advance,
            }),
        }
    }
}

impl Default for GlyphRasterizer {
    fn default() -> Self {
        Self::new()
    }
}
