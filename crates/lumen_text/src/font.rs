//! Font loading and parsing
//!
//! A [`Font`] owns the raw font bytes plus the vertical metrics pulled out
//! of the `ttf-parser` face at load time. The bytes are kept around because
//! the rasterizer (swash) parses them again with its own zero-copy view.

use crate::{Result, TextError};
use std::sync::Arc;

/// A loaded font face
#[derive(Clone)]
pub struct Font {
    data: Arc<Vec<u8>>,
    face_index: u32,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    line_gap: i16,
    family: Option<String>,
}

impl Font {
    /// Parse a font from raw TTF/OTF bytes.
    ///
    /// Fails with [`TextError::FontParseError`] when the data is not a valid
    /// font, which callers surface or route through the registry fallback.
    pub fn from_bytes(data: Vec<u8>, face_index: u32) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, face_index)
            .map_err(|e| TextError::FontParseError(e.to_string()))?;

        let family = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::FAMILY && n.is_unicode())
            .and_then(|n| n.to_string());

        let font = Self {
            units_per_em: face.units_per_em(),
            ascender: face.ascender(),
            descender: face.descender(),
            line_gap: face.line_gap(),
            family,
            face_index,
            data: Arc::new(data),
        };
        tracing::debug!(
            "loaded font family={:?} upem={} face_index={}",
            font.family,
            font.units_per_em,
            face_index
        );
        Ok(font)
    }

    /// Load a font from a file path
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| TextError::FontLoadError(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(data, 0)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    /// Scale factor from font units to pixels at `pixel_size`
    pub fn scale_for_size(&self, pixel_size: f32) -> f32 {
        pixel_size / self.units_per_em as f32
    }

    /// Ascent in pixels at `pixel_size` (positive, above baseline)
    pub fn ascent(&self, pixel_size: f32) -> f32 {
        self.ascender as f32 * self.scale_for_size(pixel_size)
    }

    /// Descent in pixels at `pixel_size` (negative, below baseline)
    pub fn descent(&self, pixel_size: f32) -> f32 {
        self.descender as f32 * self.scale_for_size(pixel_size)
    }

    /// Line gap in pixels at `pixel_size`
    pub fn line_gap(&self, pixel_size: f32) -> f32 {
        self.line_gap as f32 * self.scale_for_size(pixel_size)
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("family", &self.family)
            .field("bytes", &self.data.len())
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail_to_parse() {
        let err = Font::from_bytes(vec![0u8; 64], 0).unwrap_err();
        assert!(matches!(err, TextError::FontParseError(_)));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = Font::from_file(std::path::Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, TextError::FontLoadError(_)));
    }
}
