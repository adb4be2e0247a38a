//! PostScript transformation matrices.
//!
//! A matrix `[a b c d tx ty]` maps a point (x, y) to
//! `(a*x + c*y + tx, b*x + d*y + ty)`. This is the same coefficient layout as
//! [`kurbo::Affine`], which does the heavy lifting.
//!
//! PostScript composes matrices in row-vector order: `concat` makes the new
//! matrix apply *before* the current one. [`Matrix::pre_concat`] captures
//! that, so operator code reads the same as the language reference.

use kurbo::Affine;

use crate::error::{GraphicsError, GraphicsResult};
use crate::types::{Point, Scalar, Vec2, deg_to_rad};

/// A 6-component affine matrix in PostScript order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: Scalar,
    pub b: Scalar,
    pub c: Scalar,
    pub d: Scalar,
    pub tx: Scalar,
    pub ty: Scalar,
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    #[inline]
    pub const fn new(a: Scalar, b: Scalar, c: Scalar, d: Scalar, tx: Scalar, ty: Scalar) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    /// Build from the six array elements `[a b c d tx ty]`.
    #[inline]
    pub const fn from_array(m: [Scalar; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    /// The six array elements `[a b c d tx ty]`.
    #[inline]
    pub const fn to_array(self) -> [Scalar; 6] {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
    }

    /// Convert to a kurbo `Affine` (identical coefficient order).
    #[inline]
    pub const fn to_affine(self) -> Affine {
        Affine::new(self.to_array())
    }

    /// Create from a kurbo `Affine`.
    #[inline]
    pub fn from_affine(a: Affine) -> Self {
        Self::from_array(a.as_coeffs())
    }

    pub const fn translation(tx: Scalar, ty: Scalar) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub const fn scaling(sx: Scalar, sy: Scalar) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Counter-clockwise rotation by `angle` degrees.
    pub fn rotation(angle: Scalar) -> Self {
        let (s, c) = deg_to_rad(angle).sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    /// Apply `self` first, then `next`.
    #[must_use]
    pub fn then(self, next: Self) -> Self {
        Self::from_affine(next.to_affine() * self.to_affine())
    }

    /// Apply `first` before `self` (PostScript `concat` order).
    #[must_use]
    pub fn pre_concat(self, first: Self) -> Self {
        first.then(self)
    }

    /// Determinant of the linear part.
    #[inline]
    pub fn determinant(self) -> Scalar {
        self.a.mul_add(self.d, -(self.b * self.c))
    }

    /// Inverse matrix; `undefinedresult` when singular.
    pub fn invert(self) -> GraphicsResult<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(GraphicsError::UndefinedResult("singular matrix"));
        }
        Ok(Self::from_affine(self.to_affine().inverse()))
    }

    /// Transform a point.
    #[inline]
    pub fn transform_point(self, p: Point) -> Point {
        self.to_affine() * p
    }

    /// Transform a distance vector (translation ignored).
    #[inline]
    pub fn transform_delta(self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.a.mul_add(v.x, self.c * v.y),
            self.b.mul_add(v.x, self.d * v.y),
        )
    }

    /// Inverse-transform a point.
    pub fn itransform_point(self, p: Point) -> GraphicsResult<Point> {
        Ok(self.invert()?.transform_point(p))
    }

    /// Inverse-transform a distance vector.
    pub fn itransform_delta(self, v: Vec2) -> GraphicsResult<Vec2> {
        Ok(self.invert()?.transform_delta(v))
    }

    /// Mean scale factor of the linear part, used to map widths between
    /// user and device space.
    pub fn mean_scale(self) -> Scalar {
        self.determinant().abs().sqrt()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::types::EPSILON;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
    }

    #[test]
    fn affine_roundtrip() {
        let m = Matrix::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert_eq!(Matrix::from_affine(m.to_affine()), m);
    }

    #[test]
    fn pre_concat_applies_new_matrix_first() {
        // 2 2 scale then 10 0 translate: (1,0) -> (1+10, 0) -> scaled (22, 0)
        let ctm = Matrix::scaling(2.0, 2.0).pre_concat(Matrix::translation(10.0, 0.0));
        let p = ctm.transform_point(Point::new(1.0, 0.0));
        assert!(close(p, Point::new(22.0, 0.0)), "got {p:?}");
    }

    #[test]
    fn rotation_quarter_turn() {
        let m = Matrix::rotation(90.0);
        let p = m.transform_point(Point::new(1.0, 0.0));
        assert!(close(p, Point::new(0.0, 1.0)), "got {p:?}");
    }

    #[test]
    fn invert_singular_matrix_fails() {
        let m = Matrix::scaling(0.0, 1.0);
        assert_eq!(
            m.invert(),
            Err(GraphicsError::UndefinedResult("singular matrix"))
        );
    }

    #[test]
    fn itransform_undoes_transform() {
        let m = Matrix::new(2.0, 0.5, -1.0, 3.0, 7.0, -2.0);
        let p = Point::new(3.0, 4.0);
        let back = m.itransform_point(m.transform_point(p)).unwrap();
        assert!(close(back, p), "got {back:?}");
    }

    #[test]
    fn delta_ignores_translation() {
        let m = Matrix::translation(100.0, 100.0);
        assert_eq!(m.transform_delta(Vec2::new(1.0, 2.0)), Vec2::new(1.0, 2.0));
    }
}
