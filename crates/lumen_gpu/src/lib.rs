//! Lumen GPU Renderer
//!
//! SDF-based batched 2D rendering using wgpu.

pub mod atlas;
pub mod batch;
pub mod image;
pub mod primitives;
pub mod renderer;
pub mod scissor;
pub mod shaders;
pub mod text;

pub use atlas::{AtlasError, UvRect};
pub use image::ImageId;
pub use renderer::{Renderer, RendererConfig, RendererError};
pub use text::FontId;
