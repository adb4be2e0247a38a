//! Device-space paths.
//!
//! A path is an ordered list of sections whose coordinates are absolute
//! device-space points. Sections mirror the four PostScript path
//! constructors; `ClosePath` records the point it returns to so that
//! consumers never need to track subpath starts themselves.

use kurbo::{BezPath, PathEl};

use crate::matrix::Matrix;
use crate::types::{Point, Scalar, deg_to_rad};

/// One path element in device space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Section {
    MoveTo(Point),
    LineTo(Point),
    /// Two control points and the end point.
    CurveTo(Point, Point, Point),
    /// Closes the current subpath; holds the subpath start point.
    ClosePath(Point),
}

impl Section {
    /// The point this section leaves the pen at.
    pub const fn end_point(&self) -> Point {
        match *self {
            Self::MoveTo(p) | Self::LineTo(p) | Self::ClosePath(p) | Self::CurveTo(_, _, p) => p,
        }
    }

    /// The same section with every coordinate mapped through `m`.
    #[must_use]
    pub fn transformed(&self, m: Matrix) -> Self {
        match *self {
            Self::MoveTo(p) => Self::MoveTo(m.transform_point(p)),
            Self::LineTo(p) => Self::LineTo(m.transform_point(p)),
            Self::CurveTo(a, b, c) => Self::CurveTo(
                m.transform_point(a),
                m.transform_point(b),
                m.transform_point(c),
            ),
            Self::ClosePath(p) => Self::ClosePath(m.transform_point(p)),
        }
    }
}

/// An ordered sequence of path sections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    sections: Vec<Section>,
}

impl Path {
    /// Create an empty path.
    pub const fn new() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Start a new subpath. A `moveto` directly after another `moveto`
    /// replaces it.
    pub fn moveto(&mut self, p: Point) {
        if let Some(Section::MoveTo(last)) = self.sections.last_mut() {
            *last = p;
        } else {
            self.sections.push(Section::MoveTo(p));
        }
    }

    pub fn lineto(&mut self, p: Point) {
        self.sections.push(Section::LineTo(p));
    }

    pub fn curveto(&mut self, c1: Point, c2: Point, p: Point) {
        self.sections.push(Section::CurveTo(c1, c2, p));
    }

    /// Close the current subpath.
    ///
    /// Does nothing when the path is empty, when the last section is a
    /// `moveto`, or when the subpath is already closed. Returns the
    /// subpath start (the new current point) when a section was added.
    pub fn closepath(&mut self) -> Option<Point> {
        match self.sections.last() {
            None | Some(Section::MoveTo(_) | Section::ClosePath(_)) => return None,
            Some(_) => {}
        }
        let start = self.subpath_start()?;
        self.sections.push(Section::ClosePath(start));
        Some(start)
    }

    /// Start point of the last subpath.
    pub fn subpath_start(&self) -> Option<Point> {
        self.sections.iter().rev().find_map(|s| match s {
            Section::MoveTo(p) => Some(*p),
            _ => None,
        })
    }

    /// Append all sections of another path.
    pub fn extend(&mut self, other: &Self) {
        self.sections.extend_from_slice(&other.sections);
    }

    /// Map every coordinate through `m`.
    #[must_use]
    pub fn transformed(&self, m: Matrix) -> Self {
        Self {
            sections: self.sections.iter().map(|s| s.transformed(m)).collect(),
        }
    }

    /// Reverse the direction of every subpath (`reversepath`).
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut out = Self::new();
        for subpath in self.subpaths() {
            let Some(Section::MoveTo(start)) = subpath.first().copied() else {
                continue;
            };
            let closed = matches!(subpath.last(), Some(Section::ClosePath(_)));
            let body: Vec<Section> = subpath[1..]
                .iter()
                .copied()
                .filter(|s| !matches!(s, Section::ClosePath(_)))
                .collect();
            let end = body.last().map_or(start, Section::end_point);
            out.sections.push(Section::MoveTo(end));
            for (i, section) in body.iter().enumerate().rev() {
                let prev = if i == 0 {
                    start
                } else {
                    body[i - 1].end_point()
                };
                match *section {
                    Section::CurveTo(c1, c2, _) => out.curveto(c2, c1, prev),
                    _ => out.lineto(prev),
                }
            }
            if closed {
                out.sections.push(Section::ClosePath(end));
            }
        }
        out
    }

    /// Split into subpaths, each starting with its `moveto`.
    pub fn subpaths(&self) -> Vec<&[Section]> {
        let mut out = Vec::new();
        let mut start = 0;
        for (i, s) in self.sections.iter().enumerate() {
            if matches!(s, Section::MoveTo(_)) && i > start {
                out.push(&self.sections[start..i]);
                start = i;
            }
        }
        if start < self.sections.len() {
            out.push(&self.sections[start..]);
        }
        out
    }

    /// Convert to a kurbo path.
    pub fn to_bezpath(&self) -> BezPath {
        let mut bez = BezPath::new();
        for section in &self.sections {
            match *section {
                Section::MoveTo(p) => bez.move_to(p),
                Section::LineTo(p) => bez.line_to(p),
                Section::CurveTo(a, b, c) => bez.curve_to(a, b, c),
                Section::ClosePath(_) => bez.close_path(),
            }
        }
        bez
    }

    /// Replace every curve by line segments within `tolerance`
    /// (`flattenpath`).
    #[must_use]
    pub fn flattened(&self, tolerance: Scalar) -> Self {
        let mut out = Self::new();
        let mut start = Point::ZERO;
        kurbo::flatten(self.to_bezpath(), tolerance.max(0.01), |el| match el {
            PathEl::MoveTo(p) => {
                start = p;
                out.moveto(p);
            }
            PathEl::LineTo(p) => out.lineto(p),
            PathEl::ClosePath => out.sections.push(Section::ClosePath(start)),
            PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => out.lineto(p),
        });
        out
    }
}

// ---------------------------------------------------------------------------
// Arc approximation
// ---------------------------------------------------------------------------

/// Cubic Bézier approximation of a circular arc in user space.
///
/// Angles are in degrees. `ccw` selects `arc` (counter-clockwise) versus
/// `arcn`. Returns the start point and one `[c1, c2, end]` triple per
/// segment of at most 90 degrees.
pub fn arc_curves(
    center: Point,
    radius: Scalar,
    angle1: Scalar,
    mut angle2: Scalar,
    ccw: bool,
) -> (Point, Vec<[Point; 3]>) {
    if ccw {
        while angle2 < angle1 {
            angle2 += 360.0;
        }
    } else {
        while angle2 > angle1 {
            angle2 -= 360.0;
        }
    }
    let sweep = angle2 - angle1;
    let at = |deg: Scalar| {
        let (s, c) = deg_to_rad(deg).sin_cos();
        Point::new(radius.mul_add(c, center.x), radius.mul_add(s, center.y))
    };
    let start = at(angle1);
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "segment count is small and positive"
    )]
    let count = (sweep.abs() / 90.0).ceil().max(0.0) as usize;
    let mut curves = Vec::with_capacity(count);
    if count == 0 {
        return (start, curves);
    }
    #[expect(clippy::cast_precision_loss, reason = "count is at most a few")]
    let step = sweep / count as Scalar;
    let k = 4.0 / 3.0 * (deg_to_rad(step) / 4.0).tan() * radius;
    let mut a = angle1;
    for _ in 0..count {
        let b = a + step;
        let (sa, ca) = deg_to_rad(a).sin_cos();
        let (sb, cb) = deg_to_rad(b).sin_cos();
        let p0 = at(a);
        let p3 = at(b);
        let c1 = Point::new(k.mul_add(-sa, p0.x), k.mul_add(ca, p0.y));
        let c2 = Point::new(k.mul_add(sb, p3.x), k.mul_add(-cb, p3.y));
        curves.push([c1, c2, p3]);
        a = b;
    }
    (start, curves)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::types::EPSILON;

    fn pt(x: Scalar, y: Scalar) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn moveto_replaces_trailing_moveto() {
        let mut path = Path::new();
        path.moveto(pt(0.0, 0.0));
        path.moveto(pt(5.0, 5.0));
        assert_eq!(path.sections(), &[Section::MoveTo(pt(5.0, 5.0))]);
    }

    #[test]
    fn closepath_on_empty_or_moveto_is_noop() {
        let mut path = Path::new();
        assert_eq!(path.closepath(), None);
        path.moveto(pt(1.0, 1.0));
        assert_eq!(path.closepath(), None);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn closepath_returns_to_subpath_start() {
        let mut path = Path::new();
        path.moveto(pt(1.0, 1.0));
        path.lineto(pt(4.0, 1.0));
        path.lineto(pt(4.0, 4.0));
        assert_eq!(path.closepath(), Some(pt(1.0, 1.0)));
        assert_eq!(path.sections().last(), Some(&Section::ClosePath(pt(1.0, 1.0))));
        // A second closepath is a no-op.
        assert_eq!(path.closepath(), None);
    }

    #[test]
    fn reversed_swaps_direction() {
        let mut path = Path::new();
        path.moveto(pt(0.0, 0.0));
        path.lineto(pt(1.0, 0.0));
        path.curveto(pt(2.0, 0.0), pt(2.0, 1.0), pt(2.0, 2.0));
        let rev = path.reversed();
        assert_eq!(
            rev.sections(),
            &[
                Section::MoveTo(pt(2.0, 2.0)),
                Section::CurveTo(pt(2.0, 1.0), pt(2.0, 0.0), pt(1.0, 0.0)),
                Section::LineTo(pt(0.0, 0.0)),
            ]
        );
    }

    #[test]
    fn flattened_has_no_curves() {
        let mut path = Path::new();
        path.moveto(pt(0.0, 0.0));
        path.curveto(pt(0.0, 10.0), pt(10.0, 10.0), pt(10.0, 0.0));
        let flat = path.flattened(0.1);
        assert!(flat.len() > 2);
        assert!(
            flat.sections()
                .iter()
                .all(|s| !matches!(s, Section::CurveTo(..)))
        );
        let end = flat.sections().last().unwrap().end_point();
        assert!((end.x - 10.0).abs() < EPSILON && end.y.abs() < EPSILON);
    }

    #[test]
    fn full_circle_uses_four_segments() {
        let (start, curves) = arc_curves(pt(0.0, 0.0), 1.0, 0.0, 360.0, true);
        assert_eq!(start, pt(1.0, 0.0));
        assert_eq!(curves.len(), 4);
        let end = curves[3][2];
        assert!((end.x - 1.0).abs() < 1e-12 && end.y.abs() < 1e-12);
    }

    #[test]
    fn arcn_sweeps_clockwise() {
        let (_, curves) = arc_curves(pt(0.0, 0.0), 2.0, 90.0, 0.0, false);
        assert_eq!(curves.len(), 1);
        let end = curves[0][2];
        assert!((end.x - 2.0).abs() < 1e-12 && end.y.abs() < 1e-12);
    }
}
