//! Decoding and rasterization

use crate::error::{ImageError, Result};
use crate::source::ImageSource;
use resvg::{tiny_skia, usvg};

/// Vector sources are rasterized at this multiple of their target size; the
/// GPU's linear sampler downsamples at draw time, which acts as cheap
/// supersampled antialiasing.
pub const SVG_UPSCALE_FACTOR: f32 = 2.0;

/// A decoded straight-alpha RGBA8 pixel buffer
#[derive(Debug, Clone)]
pub struct ImageData {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ImageData {
    /// Decode or rasterize `source` into RGBA8 pixels.
    ///
    /// Errors propagate; policy-based fallback is the caller's concern (the
    /// GPU-side image store applies [`crate::ImagePolicy`]).
    pub fn load(source: &ImageSource) -> Result<ImageData> {
        match source {
            ImageSource::Path(path) => {
                let data = std::fs::read(path).map_err(|e| ImageError::Io {
                    path: path.display().to_string(),
                    source: e,
                })?;
                Self::decode(&data)
            }
            ImageSource::Bytes(data) => Self::decode(data),
            ImageSource::Svg {
                data,
                target_width,
                target_height,
            } => Self::rasterize_svg(data, *target_width, *target_height),
            ImageSource::Rgba {
                data,
                width,
                height,
            } => {
                if *width == 0 || *height == 0 || data.len() != (*width * *height * 4) as usize {
                    return Err(ImageError::InvalidDimensions {
                        width: *width,
                        height: *height,
                    });
                }
                Ok(ImageData {
                    pixels: data.clone(),
                    width: *width,
                    height: *height,
                })
            }
        }
    }

    fn decode(data: &[u8]) -> Result<ImageData> {
        let decoded = image::load_from_memory(data)
            .map_err(|e| ImageError::Decode(e.to_string()))?
            .into_rgba8();
        let (width, height) = decoded.dimensions();
        tracing::debug!("decoded raster image {}x{}", width, height);
        Ok(ImageData {
            pixels: decoded.into_raw(),
            width,
            height,
        })
    }

    fn rasterize_svg(
        data: &[u8],
        target_width: Option<f32>,
        target_height: Option<f32>,
    ) -> Result<ImageData> {
        let options = usvg::Options::default();
        let tree =
            usvg::Tree::from_data(data, &options).map_err(|e| ImageError::Svg(e.to_string()))?;

        let natural = tree.size();
        let (target_w, target_h) = infer_target_size(
            natural.width(),
            natural.height(),
            target_width,
            target_height,
        );

        let raster_w = (target_w * SVG_UPSCALE_FACTOR).ceil().max(1.0) as u32;
        let raster_h = (target_h * SVG_UPSCALE_FACTOR).ceil().max(1.0) as u32;

        let mut pixmap = tiny_skia::Pixmap::new(raster_w, raster_h).ok_or(
            ImageError::InvalidDimensions {
                width: raster_w,
                height: raster_h,
            },
        )?;

        let transform = tiny_skia::Transform::from_scale(
            raster_w as f32 / natural.width(),
            raster_h as f32 / natural.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        tracing::debug!(
            "rasterized svg: natural {}x{} -> {}x{} (upscale {})",
            natural.width(),
            natural.height(),
            raster_w,
            raster_h,
            SVG_UPSCALE_FACTOR
        );

        // tiny-skia produces premultiplied alpha; the atlas stores straight
        // alpha so blending matches raster images.
        let pixels = pixmap
            .pixels()
            .iter()
            .flat_map(|px| {
                let demul = px.demultiply();
                [demul.red(), demul.green(), demul.blue(), demul.alpha()]
            })
            .collect();

        Ok(ImageData {
            pixels,
            width: raster_w,
            height: raster_h,
        })
    }
}

/// Resolve the rasterization target from the natural size and whichever
/// dimensions the caller pinned, preserving aspect ratio when only one is
/// given.
fn infer_target_size(
    natural_w: f32,
    natural_h: f32,
    target_w: Option<f32>,
    target_h: Option<f32>,
) -> (f32, f32) {
    match (target_w, target_h) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w * natural_h / natural_w),
        (None, Some(h)) => (h * natural_w / natural_h, h),
        (None, None) => (natural_w, natural_h),
    }
}

/// Deterministic built-in substitute used under [`crate::ImagePolicy::Fallback`]:
/// an 8x8 magenta/black checkerboard.
pub fn placeholder_image() -> ImageData {
    const SIZE: u32 = 8;
    let mut pixels = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for y in 0..SIZE {
        for x in 0..SIZE {
            if (x / 2 + y / 2) % 2 == 0 {
                pixels.extend_from_slice(&[255, 0, 255, 255]);
            } else {
                pixels.extend_from_slice(&[0, 0, 0, 255]);
            }
        }
    }
    ImageData {
        pixels,
        width: SIZE,
        height: SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_target_size_aspect() {
        assert_eq!(infer_target_size(100.0, 50.0, Some(200.0), None), (200.0, 100.0));
        assert_eq!(infer_target_size(100.0, 50.0, None, Some(25.0)), (50.0, 25.0));
        assert_eq!(infer_target_size(100.0, 50.0, None, None), (100.0, 50.0));
        assert_eq!(
            infer_target_size(100.0, 50.0, Some(30.0), Some(40.0)),
            (30.0, 40.0)
        );
    }

    #[test]
    fn test_rgba_passthrough_validates_length() {
        let bad = ImageSource::rgba(vec![0u8; 7], 2, 2);
        assert!(matches!(
            ImageData::load(&bad),
            Err(ImageError::InvalidDimensions { .. })
        ));

        let good = ImageSource::rgba(vec![0u8; 16], 2, 2);
        let data = ImageData::load(&good).unwrap();
        assert_eq!((data.width, data.height), (2, 2));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = ImageData::load(&ImageSource::bytes(vec![0u8; 32])).unwrap_err();
        assert!(matches!(err, ImageError::Decode(_)));
    }

    #[test]
    fn test_svg_rasterizes_at_upscale() {
        let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20">
            <rect width="10" height="20" fill="#ff0000"/></svg>"##;
        let data = ImageData::load(&ImageSource::svg_sized(svg.to_vec(), Some(10.0), None)).unwrap();
        assert_eq!((data.width, data.height), (20, 40));
        // Fully opaque red document
        assert_eq!(&data.pixels[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_placeholder_is_deterministic() {
        let a = placeholder_image();
        let b = placeholder_image();
        assert_eq!(a.pixels, b.pixels);
        assert_eq!((a.width, a.height), (8, 8));
    }
}
