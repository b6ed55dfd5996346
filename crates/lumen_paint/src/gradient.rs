//! Gradient fills
//!
//! The renderer's SDF shader evaluates two-color gradients directly from a
//! packed parameter block, so the CPU-side model is deliberately small: one
//! start color, one end color, and the shape geometry that drives the
//! interpolation parameter.

use crate::color::Color;
use crate::primitives::Point;

/// Geometry driving a gradient's interpolation parameter
#[derive(Clone, Copy, Debug)]
pub enum GradientShape {
    /// Interpolate along the line from `start` to `end` (local coordinates,
    /// relative to the primitive's origin)
    Linear { start: Point, end: Point },
    /// Interpolate by distance from `center`, normalized by the two radii
    Radial {
        center: Point,
        radius_x: f32,
        radius_y: f32,
    },
    /// Rounded-box falloff: solid inside the box inset by `inset`, fading
    /// over `feather` pixels
    Box { inset: f32, feather: f32 },
}

/// A two-color gradient
#[derive(Clone, Copy, Debug)]
pub struct Gradient {
    pub from: Color,
    pub to: Color,
    pub shape: GradientShape,
}

impl Gradient {
    pub fn linear(start: Point, end: Point, from: Color, to: Color) -> Self {
        Self {
            from,
            to,
            shape: GradientShape::Linear { start, end },
        }
    }

    pub fn radial(center: Point, radius_x: f32, radius_y: f32, from: Color, to: Color) -> Self {
        Self {
            from,
            to,
            shape: GradientShape::Radial {
                center,
                radius_x,
                radius_y,
            },
        }
    }

    pub fn boxed(inset: f32, feather: f32, from: Color, to: Color) -> Self {
        Self {
            from,
            to,
            shape: GradientShape::Box { inset, feather },
        }
    }
}

/// Fill style for shapes: a solid color or a two-color gradient.
///
/// Resolved once per drawing call into the flat instance-record encoding;
/// hot paths never type-check against this enum again after that.
#[derive(Clone, Copy, Debug)]
pub enum FillStyle {
    Color(Color),
    Gradient(Gradient),
}

impl FillStyle {
    /// The color whose alpha decides the fully-transparent fast path.
    ///
    /// A gradient is considered transparent only when both endpoints are.
    pub fn is_transparent(&self) -> bool {
        match self {
            FillStyle::Color(c) => c.is_transparent(),
            FillStyle::Gradient(g) => g.from.is_transparent() && g.to.is_transparent(),
        }
    }
}

impl From<Color> for FillStyle {
    fn from(color: Color) -> Self {
        FillStyle::Color(color)
    }
}

impl From<Gradient> for FillStyle {
    fn from(gradient: Gradient) -> Self {
        FillStyle::Gradient(gradient)
    }
}
