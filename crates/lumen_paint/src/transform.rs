//! 2D affine transforms
//!
//! Canvas-style 2x3 affine matrix. A point maps as:
//!
//! ```text
//! x' = a * x + c * y + e
//! y' = b * x + d * y + f
//! ```
//!
//! Composition follows canvas semantics: `t.concat(op)` applies `op` in the
//! local space established by `t` (so `translate` then `rotate` rotates
//! around the translated origin). No renormalization ever happens, which is
//! what makes push/pop restoration bit-exact.

use crate::primitives::Point;

/// 2D affine transform
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct Transform2D {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    pub fn translation(x: f32, y: f32) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: x,
            f: y,
        }
    }

    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn rotation(angle: f32) -> Self {
        let cos = angle.cos();
        let sin = angle.sin();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn skew_x(angle: f32) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: angle.tan(),
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn skew_y(angle: f32) -> Self {
        Self {
            a: 1.0,
            b: angle.tan(),
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self ∘ other`: apply `other` first, then `self`
    pub fn multiply(&self, other: &Transform2D) -> Transform2D {
        Transform2D {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Compose `op` into the local space of `self` (canvas `transform()`)
    pub fn concat(&mut self, op: &Transform2D) {
        *self = self.multiply(op);
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Expand into a column-major 4x4 matrix for the GPU uniform block
    pub fn to_mat4(&self) -> [[f32; 4]; 4] {
        [
            [self.a, self.b, 0.0, 0.0],
            [self.c, self.d, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [self.e, self.f, 0.0, 1.0],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_maps_points() {
        let t = Transform2D::identity();
        let p = Point::new(3.5, -2.25);
        assert_eq!(t.transform_point(p), p);
    }

    #[test]
    fn test_translate_then_scale_order() {
        // Canvas semantics: translate first establishes the origin, scale
        // applies inside it.
        let mut t = Transform2D::identity();
        t.concat(&Transform2D::translation(10.0, 20.0));
        t.concat(&Transform2D::scaling(2.0, 2.0));
        let p = t.transform_point(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(12.0, 22.0));
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let t = Transform2D::rotation(std::f32::consts::FRAC_PI_2);
        let p = t.transform_point(Point::new(1.0, 0.0));
        assert!((p.x - 0.0).abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_skew_x() {
        let t = Transform2D::skew_x(std::f32::consts::FRAC_PI_4);
        let p = t.transform_point(Point::new(0.0, 1.0));
        assert!((p.x - 1.0).abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_multiply_associates_with_point_mapping() {
        let m = Transform2D::rotation(0.3);
        let n = Transform2D::translation(5.0, -2.0);
        let p = Point::new(1.0, 2.0);
        let composed = m.multiply(&n).transform_point(p);
        let stepwise = m.transform_point(n.transform_point(p));
        assert!((composed.x - stepwise.x).abs() < 1e-5);
        assert!((composed.y - stepwise.y).abs() < 1e-5);
    }
}
