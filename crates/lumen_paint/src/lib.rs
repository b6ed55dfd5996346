//! Lumen paint types
//!
//! CPU-side drawing types shared by the renderer and its callers:
//!
//! - Colors (f32 RGBA, hex helpers, alpha capping)
//! - Two-color gradients (linear, radial, box)
//! - Geometry primitives (point, rect, corner radii)
//! - 2D affine transforms with canvas-style composition

pub mod color;
pub mod gradient;
pub mod primitives;
pub mod transform;

pub use color::Color;
pub use gradient::{FillStyle, Gradient, GradientShape};
pub use primitives::{CornerRadii, Point, Rect};
pub use transform::Transform2D;
