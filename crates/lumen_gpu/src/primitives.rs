//! GPU instance records
//!
//! Defines the per-primitive data consumed by the instanced SDF draw. All
//! structures use `#[repr(C)]` and implement `bytemuck::Pod` for safe GPU
//! buffer copies; field order and stride must match the WGSL `Instance`
//! struct byte-for-byte.

use lumen_paint::{Color, CornerRadii, FillStyle, GradientShape};

/// Kind discriminant values (must match shader constants).
///
/// `kind == 0` is a filled rect (textured when `uv[0] >= 0`), any positive
/// value is a hollow rect with that stroke width, and the negative values
/// select the other fragment branches.
pub mod kind {
    pub const FILL: f32 = 0.0;
    pub const TEXT: f32 = -1.0;
    pub const LINEAR_GRADIENT: f32 = -2.0;
    pub const RADIAL_GRADIENT: f32 = -3.0;
    pub const BOX_GRADIENT: f32 = -4.0;
    pub const DROP_SHADOW: f32 = -5.0;
}

/// Sentinel in `radii[1]` marking a plain rectangle: the shader skips the
/// per-corner rounding math entirely.
pub const RADII_RECT_SENTINEL: f32 = -1.0;

/// Sentinel in `uv[0]` marking an untextured fill
pub const UV_NONE: [f32; 4] = [-1.0, 0.0, 0.0, 0.0];

/// Maximum instances per draw segment; appending past this flushes first
pub const MAX_BATCH: usize = 2048;

/// One drawn primitive (96 bytes, matches shader `Instance`)
///
/// Memory layout:
/// - `bounds: vec4<f32>` - x, y, width, height in local (pre-transform) space
/// - `radii: vec4<f32>`  - per-corner TL, TR, BR, BL, or rect sentinel
/// - `color0: vec4<f32>` - fill / gradient start color
/// - `color1: vec4<f32>` - gradient end color
/// - `uv: vec4<f32>`     - polymorphic on kind: texture UVs, gradient
///   geometry, or (spread, blur) for shadows
/// - `kind: vec4<f32>`   - x = discriminant, yzw padding
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuInstance {
    pub bounds: [f32; 4],
    pub radii: [f32; 4],
    pub color0: [f32; 4],
    pub color1: [f32; 4],
    pub uv: [f32; 4],
    pub kind: [f32; 4],
}

impl GpuInstance {
    pub fn new(bounds: [f32; 4], kind: f32) -> Self {
        Self {
            bounds,
            radii: encode_radii(&CornerRadii::ZERO),
            color0: [1.0, 1.0, 1.0, 1.0],
            color1: [0.0; 4],
            uv: UV_NONE,
            kind: [kind, 0.0, 0.0, 0.0],
        }
    }

    pub fn with_radii(mut self, radii: &CornerRadii) -> Self {
        self.radii = encode_radii(radii);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color0 = color.to_array();
        self
    }

    pub fn with_uv(mut self, uv: [f32; 4]) -> Self {
        self.uv = uv;
        self
    }

    pub fn kind(&self) -> f32 {
        self.kind[0]
    }
}

/// Encode per-corner radii, collapsing all-zero to the rectangular
/// fast-path sentinel
pub fn encode_radii(radii: &CornerRadii) -> [f32; 4] {
    if radii.is_zero() {
        [0.0, RADII_RECT_SENTINEL, 0.0, 0.0]
    } else {
        [
            radii.top_left,
            radii.top_right,
            radii.bottom_right,
            radii.bottom_left,
        ]
    }
}

/// Resolve a fill style into the flat instance encoding: discriminant,
/// colors and the uv/parameter block. The enum is consulted exactly once
/// per drawing call; everything downstream sees only floats.
pub fn resolve_fill(
    style: &FillStyle,
    alpha_cap: f32,
) -> (f32, [f32; 4], [f32; 4], [f32; 4]) {
    match style {
        FillStyle::Color(c) => (
            kind::FILL,
            c.capped(alpha_cap).to_array(),
            [0.0; 4],
            UV_NONE,
        ),
        FillStyle::Gradient(g) => {
            let color0 = g.from.capped(alpha_cap).to_array();
            let color1 = g.to.capped(alpha_cap).to_array();
            match g.shape {
                GradientShape::Linear { start, end } => (
                    kind::LINEAR_GRADIENT,
                    color0,
                    color1,
                    [start.x, start.y, end.x, end.y],
                ),
                GradientShape::Radial {
                    center,
                    radius_x,
                    radius_y,
                } => (
                    kind::RADIAL_GRADIENT,
                    color0,
                    color1,
                    [center.x, center.y, radius_x, radius_y],
                ),
                GradientShape::Box { inset, feather } => (
                    kind::BOX_GRADIENT,
                    color0,
                    color1,
                    [inset, feather, 0.0, 0.0],
                ),
            }
        }
    }
}

/// Per-segment uniform block (matches shader `Segment`). One entry per draw
/// segment, bound with a 256-aligned dynamic offset.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SegmentUniforms {
    /// Column-major expansion of the active 2D affine transform
    pub transform: [[f32; 4]; 4],
    /// Device viewport width, height, pixel ratio, padding
    pub viewport: [f32; 4],
}

pub const fn align256(v: u64) -> u64 {
    (v + 255) & !255
}

/// Stride between segment uniform entries in the shared buffer
pub const SEGMENT_UNIFORM_STRIDE: u64 = align256(std::mem::size_of::<SegmentUniforms>() as u64);

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_paint::{Gradient, Point};

    #[test]
    fn test_instance_stride_matches_shader() {
        assert_eq!(std::mem::size_of::<GpuInstance>(), 96);
    }

    #[test]
    fn test_zero_radii_use_rect_sentinel() {
        let encoded = encode_radii(&CornerRadii::ZERO);
        assert_eq!(encoded[1], RADII_RECT_SENTINEL);
    }

    #[test]
    fn test_nonzero_radii_pass_through() {
        let encoded = encode_radii(&CornerRadii::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(encoded, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_resolve_solid_fill() {
        let (kind_value, color0, _, uv) =
            resolve_fill(&FillStyle::Color(Color::RED), 1.0);
        assert_eq!(kind_value, kind::FILL);
        assert_eq!(color0, [1.0, 0.0, 0.0, 1.0]);
        assert!(uv[0] < 0.0, "solid fill must carry the untextured sentinel");
    }

    #[test]
    fn test_resolve_linear_gradient() {
        let gradient = Gradient::linear(
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Color::RED,
            Color::BLUE,
        );
        let (kind_value, color0, color1, uv) =
            resolve_fill(&FillStyle::Gradient(gradient), 1.0);
        assert_eq!(kind_value, kind::LINEAR_GRADIENT);
        assert_eq!(color0, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(color1, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(uv, [0.0, 0.0, 100.0, 0.0]);
    }

    #[test]
    fn test_resolve_caps_both_gradient_colors() {
        let gradient = Gradient::radial(Point::new(5.0, 5.0), 10.0, 10.0, Color::RED, Color::BLUE);
        let (_, color0, color1, _) = resolve_fill(&FillStyle::Gradient(gradient), 0.25);
        assert_eq!(color0[3], 0.25);
        assert_eq!(color1[3], 0.25);
    }

    #[test]
    fn test_segment_uniform_stride_aligned() {
        assert_eq!(SEGMENT_UNIFORM_STRIDE % 256, 0);
        assert!(SEGMENT_UNIFORM_STRIDE >= std::mem::size_of::<SegmentUniforms>() as u64);
    }
}
