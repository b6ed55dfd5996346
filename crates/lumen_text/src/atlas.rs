//! Font-atlas metric model
//!
//! A [`FontAtlas`] is the CPU-side record of one font rasterized at one size
//! bucket: per-glyph UV rectangles, bearings and advances over the printable
//! ASCII range, plus font-wide vertical metrics. The GPU side owns the
//! texture; this module only asks it for placements through an insert
//! callback, so the model stays independently testable.
//!
//! Glyphs are rasterized once at the bucket size and scaled by
//! `requested / bucket` at draw time. That trades a small quality loss at
//! off-bucket sizes for never re-rasterizing per display size.

use crate::font::Font;
use crate::rasterizer::GlyphRasterizer;
use crate::{Result, TextError};

/// First codepoint of the cached range (space)
pub const GLYPH_RANGE_START: u32 = 0x20;
/// Last codepoint of the cached range (tilde)
pub const GLYPH_RANGE_END: u32 = 0x7E;
/// Substitute for characters outside the cached range
pub const PLACEHOLDER_CHAR: char = '?';

/// Rasterization size buckets in pixels
const SIZE_BUCKETS: [u32; 6] = [12, 16, 24, 32, 48, 64];

/// Quantize a requested pixel size to its rasterization bucket: the smallest
/// bucket not below the request, clamped to the largest bucket.
pub fn size_bucket(pixel_size: f32) -> u32 {
    let px = pixel_size.ceil() as u32;
    for bucket in SIZE_BUCKETS {
        if px <= bucket {
            return bucket;
        }
    }
    SIZE_BUCKETS[SIZE_BUCKETS.len() - 1]
}

/// UV sentinel for glyphs with no bitmap (space and friends)
pub const NO_BITMAP_UV: [f32; 4] = [-1.0, -1.0, -1.0, -1.0];

/// Metrics for one cached glyph, stored at the bucket render size
#[derive(Debug, Clone, Copy)]
pub struct GlyphMetrics {
    /// Normalized atlas UV rect (u0, v0, u1, v1), or [`NO_BITMAP_UV`]
    pub uv: [f32; 4],
    /// Offset from the pen position to the bitmap's left edge
    pub bearing_x: f32,
    /// Offset from the baseline up to the bitmap's top edge
    pub bearing_y: f32,
    /// Bitmap size in pixels
    pub width: f32,
    pub height: f32,
    /// Pen advance to the next glyph
    pub advance: f32,
}

/// One font rasterized at one size bucket
#[derive(Debug)]
pub struct FontAtlas {
    /// Bucket render size in pixels
    pub render_size: f32,
    /// Ascent in pixels at the render size (positive)
    pub ascent: f32,
    /// Descent in pixels at the render size (negative)
    pub descent: f32,
    /// Line gap in pixels at the render size
    pub line_gap: f32,
    /// Metrics indexed by `codepoint - GLYPH_RANGE_START`
    glyphs: Vec<GlyphMetrics>,
}

impl FontAtlas {
    /// Rasterize the printable ASCII range of `font` at `render_size` and
    /// register each bitmap through `insert`.
    ///
    /// `insert` receives `(width, height, alpha_bitmap)` and returns the
    /// normalized UV rect the atlas chose, or `None` when the atlas is full
    /// (surfaced as [`TextError::AtlasFull`]).
    pub fn build(
        font: &Font,
        rasterizer: &mut GlyphRasterizer,
        render_size: f32,
        insert: &mut dyn FnMut(u32, u32, &[u8]) -> Option<[f32; 4]>,
    ) -> Result<Self> {
        let mut glyphs = Vec::with_capacity((GLYPH_RANGE_END - GLYPH_RANGE_START + 1) as usize);

        for codepoint in GLYPH_RANGE_START..=GLYPH_RANGE_END {
            let ch = char::from_u32(codepoint).unwrap_or(PLACEHOLDER_CHAR);
            // Fonts without coverage for a printable ASCII char still get an
            // entry; glyph id 0 renders the font's .notdef box.
            let gid = rasterizer.glyph_id(font, ch).unwrap_or(0);
            let raster = rasterizer.rasterize(font, gid, render_size)?;

            let uv = if raster.width == 0 || raster.height == 0 {
                NO_BITMAP_UV
            } else {
                insert(raster.width, raster.height, &raster.bitmap).ok_or(TextError::AtlasFull)?
            };

            glyphs.push(GlyphMetrics {
                uv,
                bearing_x: raster.bearing_x as f32,
                bearing_y: raster.bearing_y as f32,
                width: raster.width as f32,
                height: raster.height as f32,
                advance: raster.advance,
            });
        }

        tracing::debug!(
            "built font atlas: family={:?} size={} glyphs={}",
            font.family(),
            render_size,
            glyphs.len()
        );

        Ok(Self {
            render_size,
            ascent: font.ascent(render_size),
            descent: font.descent(render_size),
            line_gap: font.line_gap(render_size),
            glyphs,
        })
    }

    /// Construct directly from metric data. Used by tests and by callers
    /// that rasterize through other means.
    pub fn from_parts(
        render_size: f32,
        ascent: f32,
        descent: f32,
        line_gap: f32,
        glyphs: Vec<GlyphMetrics>,
    ) -> Self {
        Self {
            render_size,
            ascent,
            descent,
            line_gap,
            glyphs,
        }
    }

    /// Metrics for `ch`, falling back to `?` outside the cached range
    pub fn glyph(&self, ch: char) -> &GlyphMetrics {
        let codepoint = ch as u32;
        let index = if (GLYPH_RANGE_START..=GLYPH_RANGE_END).contains(&codepoint) {
            codepoint - GLYPH_RANGE_START
        } else {
            PLACEHOLDER_CHAR as u32 - GLYPH_RANGE_START
        };
        &self.glyphs[index as usize]
    }

    /// Measure `text` at `pixel_size` using the additive advance model.
    ///
    /// Returns `(width, height)`; height is the scaled ascent-to-descent
    /// extent. The empty string measures zero wide.
    pub fn measure(&self, text: &str, pixel_size: f32) -> (f32, f32) {
        if text.is_empty() {
            return (0.0, 0.0);
        }
        let scale = pixel_size / self.render_size;
        let width: f32 = text.chars().map(|ch| self.glyph(ch).advance * scale).sum();
        let height = (self.ascent - self.descent) * scale;
        (width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(advance: f32) -> GlyphMetrics {
        GlyphMetrics {
            uv: [0.0, 0.0, 0.1, 0.1],
            bearing_x: 0.0,
            bearing_y: 0.0,
            width: advance,
            height: 10.0,
            advance,
        }
    }

    /// Atlas where glyph for codepoint 0x20+i advances by i+1 pixels
    fn test_atlas() -> FontAtlas {
        let glyphs = (0..=(GLYPH_RANGE_END - GLYPH_RANGE_START))
            .map(|i| glyph((i + 1) as f32))
            .collect();
        FontAtlas::from_parts(24.0, 18.0, -6.0, 2.0, glyphs)
    }

    #[test]
    fn test_empty_string_measures_zero() {
        let atlas = test_atlas();
        assert_eq!(atlas.measure("", 24.0), (0.0, 0.0));
    }

    #[test]
    fn test_measure_is_additive() {
        let atlas = test_atlas();
        let (ab, _) = atlas.measure("AB", 24.0);
        let (a, _) = atlas.measure("A", 24.0);
        let (b, _) = atlas.measure("B", 24.0);
        assert!((ab - (a + b)).abs() < 1e-4);
    }

    #[test]
    fn test_measure_scales_with_size() {
        let atlas = test_atlas();
        let (w24, h24) = atlas.measure("Hello", 24.0);
        let (w48, h48) = atlas.measure("Hello", 48.0);
        assert!((w48 - w24 * 2.0).abs() < 1e-3);
        assert!((h48 - h24 * 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_out_of_range_falls_back_to_placeholder() {
        let atlas = test_atlas();
        let snowman = atlas.glyph('\u{2603}');
        let placeholder = atlas.glyph(PLACEHOLDER_CHAR);
        assert_eq!(snowman.advance, placeholder.advance);
    }

    #[test]
    fn test_size_buckets() {
        assert_eq!(size_bucket(10.0), 12);
        assert_eq!(size_bucket(12.0), 12);
        assert_eq!(size_bucket(12.5), 16);
        assert_eq!(size_bucket(24.0), 24);
        assert_eq!(size_bucket(33.0), 48);
        assert_eq!(size_bucket(200.0), 64);
    }

    #[test]
    fn test_height_from_vertical_metrics() {
        let atlas = test_atlas();
        let (_, h) = atlas.measure("x", 24.0);
        assert!((h - 24.0).abs() < 1e-4); // 18 - (-6)
    }
}
