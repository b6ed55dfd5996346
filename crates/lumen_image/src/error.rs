//! Image errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to read image file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to parse SVG: {0}")]
    Svg(String),

    #[error("Image has invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, ImageError>;
