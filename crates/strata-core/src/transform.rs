use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// A 2D affine transform.
///
/// Maps `(x, y)` to `(a * x + c * y + tx, b * x + d * y + ty)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            tx: x,
            ty: y,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Rotation in degrees.
    pub fn rotate(degrees: f64) -> Self {
        let (sin_r, cos_r) = degrees.to_radians().sin_cos();
        Self {
            a: cos_r,
            b: sin_r,
            c: -sin_r,
            d: cos_r,
            ..Self::IDENTITY
        }
    }

    /// The transform that applies `self` first and `next` second.
    pub fn then(&self, next: &Transform) -> Self {
        Self {
            a: next.a * self.a + next.c * self.b,
            b: next.b * self.a + next.d * self.b,
            c: next.a * self.c + next.c * self.d,
            d: next.b * self.c + next.d * self.d,
            tx: next.a * self.tx + next.c * self.ty + next.tx,
            ty: next.b * self.tx + next.d * self.ty + next.ty,
        }
    }

    pub fn apply(&self, point: &Point) -> Point {
        Point::new(
            self.a * point.x + self.c * point.y + self.tx,
            self.b * point.x + self.d * point.y + self.ty,
        )
    }

    /// Column-major 3x3 matrix, the layout shader uniforms expect.
    pub fn to_mat3(&self) -> [f32; 9] {
        [
            self.a as f32,
            self.b as f32,
            0.0,
            self.c as f32,
            self.d as f32,
            0.0,
            self.tx as f32,
            self.ty as f32,
            1.0,
        ]
    }

    /// Inverse of [`Transform::to_mat3`].
    pub fn from_mat3(m: &[f32; 9]) -> Self {
        Self {
            a: m[0] as f64,
            b: m[1] as f64,
            c: m[3] as f64,
            d: m[4] as f64,
            tx: m[6] as f64,
            ty: m[7] as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_translate() {
        let t = Transform::translate(10.0, 20.0);
        let result = t.apply(&Point::new(5.0, 5.0));
        assert!((result.x - 15.0).abs() < 1e-10);
        assert!((result.y - 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_then_applies_in_order() {
        let t = Transform::scale(2.0, 2.0).then(&Transform::translate(1.0, 0.0));
        let p = t.apply(&Point::new(3.0, 4.0));
        assert!((p.x - 7.0).abs() < 1e-10);
        assert!((p.y - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let p = Transform::rotate(90.0).apply(&Point::new(1.0, 0.0));
        assert!(p.x.abs() < 1e-10);
        assert!((p.y - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_mat3_layout() {
        let t = Transform::translate(3.0, 4.0);
        let m = t.to_mat3();
        assert_eq!(m[6], 3.0);
        assert_eq!(m[7], 4.0);
        assert_eq!(m[8], 1.0);
        assert_eq!(Transform::from_mat3(&m), t);
    }
}
