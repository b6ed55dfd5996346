//! Image source types

use std::path::PathBuf;

/// Source of an image
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Load from a file path; format is sniffed from the contents
    Path(PathBuf),

    /// Decode from in-memory encoded bytes (PNG/JPEG/BMP)
    Bytes(Vec<u8>),

    /// Rasterize an SVG document.
    ///
    /// When only one target dimension is given the other is inferred from
    /// the document's natural aspect ratio; when neither is given the
    /// natural size is used.
    Svg {
        data: Vec<u8>,
        target_width: Option<f32>,
        target_height: Option<f32>,
    },

    /// Pre-decoded straight-alpha RGBA8 pixels
    Rgba {
        data: Vec<u8>,
        width: u32,
        height: u32,
    },
}

impl ImageSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn bytes(data: Vec<u8>) -> Self {
        Self::Bytes(data)
    }

    pub fn svg(data: Vec<u8>) -> Self {
        Self::Svg {
            data,
            target_width: None,
            target_height: None,
        }
    }

    pub fn svg_sized(data: Vec<u8>, width: Option<f32>, height: Option<f32>) -> Self {
        Self::Svg {
            data,
            target_width: width,
            target_height: height,
        }
    }

    pub fn rgba(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self::Rgba {
            data,
            width,
            height,
        }
    }

    /// Short description for log messages
    pub fn describe(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Bytes(b) => format!("<{} encoded bytes>", b.len()),
            Self::Svg { data, .. } => format!("<svg, {} bytes>", data.len()),
            Self::Rgba { width, height, .. } => format!("<rgba {}x{}>", width, height),
        }
    }
}
