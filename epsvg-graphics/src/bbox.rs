//! Axis-aligned bounding boxes.
//!
//! Provides [`BoundingBox`] plus helpers for computing the bounds of paths
//! and recorded pictures.

use crate::path::{Path, Section};
use crate::picture::{GraphicsObject, Picture};
use crate::types::{Point, Scalar};

// ---------------------------------------------------------------------------
// BoundingBox type
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: Scalar,
    pub min_y: Scalar,
    pub max_x: Scalar,
    pub max_y: Scalar,
}

impl BoundingBox {
    /// An empty (inverted) bounding box.
    pub const EMPTY: Self = Self {
        min_x: Scalar::INFINITY,
        min_y: Scalar::INFINITY,
        max_x: Scalar::NEG_INFINITY,
        max_y: Scalar::NEG_INFINITY,
    };

    /// The A4 page in PostScript points, used when a document declares no
    /// bounding box.
    pub const A4: Self = Self {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 595.276,
        max_y: 841.890,
    };

    #[must_use]
    pub const fn new(min_x: Scalar, min_y: Scalar, max_x: Scalar, max_y: Scalar) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Check if this bounding box is valid (non-empty).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Width.
    #[must_use]
    pub fn width(&self) -> Scalar {
        if self.is_valid() {
            self.max_x - self.min_x
        } else {
            0.0
        }
    }

    /// Height.
    #[must_use]
    pub fn height(&self) -> Scalar {
        if self.is_valid() {
            self.max_y - self.min_y
        } else {
            0.0
        }
    }

    /// Lower-left corner.
    #[must_use]
    pub const fn llcorner(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Upper-right corner.
    #[must_use]
    pub const fn urcorner(&self) -> Point {
        Point::new(self.max_x, self.max_y)
    }

    /// Expand to include a point.
    pub const fn include_point(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Expand to include another bounding box.
    pub fn union(&mut self, other: &Self) {
        if other.is_valid() {
            self.min_x = self.min_x.min(other.min_x);
            self.min_y = self.min_y.min(other.min_y);
            self.max_x = self.max_x.max(other.max_x);
            self.max_y = self.max_y.max(other.max_y);
        }
    }

    /// Grow the box by `amount` on every side.
    #[must_use]
    pub fn inflated(&self, amount: Scalar) -> Self {
        Self::new(
            self.min_x - amount,
            self.min_y - amount,
            self.max_x + amount,
            self.max_y + amount,
        )
    }

    /// The box as a closed rectangular path.
    #[must_use]
    pub fn to_path(&self) -> Path {
        let mut path = Path::new();
        path.moveto(self.llcorner());
        path.lineto(Point::new(self.max_x, self.min_y));
        path.lineto(self.urcorner());
        path.lineto(Point::new(self.min_x, self.max_y));
        path.closepath();
        path
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

// ---------------------------------------------------------------------------
// Path bounds
// ---------------------------------------------------------------------------

/// Bounding box of all section end and control points.
///
/// A trailing `moveto` does not contribute. Returns `None` when nothing
/// remains.
pub fn path_bbox(path: &Path) -> Option<BoundingBox> {
    let sections = path.sections();
    let end = match sections.last() {
        Some(Section::MoveTo(_)) => sections.len() - 1,
        _ => sections.len(),
    };
    let mut bb = BoundingBox::EMPTY;
    for section in &sections[..end] {
        match *section {
            Section::MoveTo(p) | Section::LineTo(p) | Section::ClosePath(p) => {
                bb.include_point(p);
            }
            Section::CurveTo(c1, c2, p) => {
                bb.include_point(c1);
                bb.include_point(c2);
                bb.include_point(p);
            }
        }
    }
    bb.is_valid().then_some(bb)
}

// ---------------------------------------------------------------------------
// Picture bounds
// ---------------------------------------------------------------------------

/// Bounding box of everything drawn in a picture, including half the stroke
/// width around stroked paths.
pub fn picture_bbox(picture: &Picture) -> BoundingBox {
    let mut bb = BoundingBox::EMPTY;
    for obj in &picture.objects {
        match obj {
            GraphicsObject::Fill(fill) => {
                if let Some(b) = path_bbox(&fill.path) {
                    bb.union(&b);
                }
            }
            GraphicsObject::Stroke(stroke) => {
                if let Some(b) = path_bbox(&stroke.path) {
                    bb.union(&b.inflated(stroke.width / 2.0));
                }
            }
            GraphicsObject::Text(text) => {
                let t = text.transform;
                bb.include_point(t.transform_point(Point::new(0.0, -0.2)));
                bb.include_point(t.transform_point(Point::new(text.advance, 0.8)));
            }
            GraphicsObject::Image(image) => {
                let t = image.transform;
                let (w, h) = (
                    Scalar::from(image.image.width),
                    Scalar::from(image.image.height),
                );
                for corner in [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)] {
                    bb.include_point(t.transform_point(Point::new(corner.0, corner.1)));
                }
            }
            GraphicsObject::Shading(shading) => {
                if let Some(b) = path_bbox(&shading.area) {
                    bb.union(&b);
                }
            }
            GraphicsObject::ClipStart(..) | GraphicsObject::ClipEnd => {}
        }
    }
    bb
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_is_invalid() {
        assert!(!BoundingBox::EMPTY.is_valid());
        assert_eq!(BoundingBox::EMPTY.width(), 0.0);
    }

    #[test]
    fn union_ignores_invalid() {
        let mut bb = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        bb.union(&BoundingBox::EMPTY);
        assert_eq!(bb, BoundingBox::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn path_bbox_skips_trailing_moveto() {
        let mut path = Path::new();
        path.moveto(Point::new(0.0, 0.0));
        path.lineto(Point::new(10.0, 5.0));
        path.moveto(Point::new(100.0, 100.0));
        let bb = path_bbox(&path).unwrap();
        assert_eq!(bb, BoundingBox::new(0.0, 0.0, 10.0, 5.0));
    }

    #[test]
    fn path_bbox_of_lone_moveto_is_none() {
        let mut path = Path::new();
        path.moveto(Point::new(3.0, 3.0));
        assert!(path_bbox(&path).is_none());
    }

    #[test]
    fn rectangle_path_roundtrip() {
        let bb = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(path_bbox(&bb.to_path()), Some(bb));
    }
}
