//! The device-independent part of the PostScript graphics state.
//!
//! [`GraphicsState`] holds the CTM, the current path and clip (both in
//! device space), the current point, color and stroke attributes, and the
//! index of the output device the state draws on. The path-construction
//! methods take user-space coordinates and apply the CTM, exactly like the
//! PostScript operators of the same names.

use crate::bbox::{BoundingBox, path_bbox};
use crate::color::DeviceColor;
use crate::error::{GraphicsError, GraphicsResult};
use crate::matrix::Matrix;
use crate::path::{Path, Section, arc_curves};
use crate::types::{FillRule, LineStyle, Point, Scalar, Vec2};

/// Index of an output device in the interpreter's device table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceId(pub usize);

/// Geometry, color and stroke state.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    /// Current transformation matrix (user space to device space).
    pub ctm: Matrix,
    /// Current path in device space.
    pub path: Path,
    /// Current clip path in device space.
    pub clip: Path,
    /// Insideness rule the clip path was set with.
    pub clip_rule: FillRule,
    /// Current point in device space; `None` when there is no current point.
    pub position: Option<Point>,
    pub color: DeviceColor,
    pub line: LineStyle,
    pub flatness: Scalar,
    pub stroke_adjust: bool,
    pub overprint: bool,
    /// Page area in device space; `initclip` resets the clip to it.
    pub page: BoundingBox,
    /// The device this state draws on.
    pub device: DeviceId,
}

impl GraphicsState {
    /// Initial state for a page: default matrix, empty path, page clip.
    pub fn new(default_matrix: Matrix, page: BoundingBox, device: DeviceId) -> Self {
        Self {
            ctm: default_matrix,
            path: Path::new(),
            clip: page.to_path(),
            clip_rule: FillRule::NonZero,
            position: None,
            color: DeviceColor::default(),
            line: LineStyle::default(),
            flatness: 1.0,
            stroke_adjust: false,
            overprint: false,
            page,
            device,
        }
    }

    /// Reset everything `initgraphics` resets. The device is kept.
    pub fn init_graphics(&mut self, default_matrix: Matrix) {
        let device = self.device;
        let page = self.page;
        *self = Self::new(default_matrix, page, device);
    }

    // -- current point --

    /// Current point in device space.
    pub fn device_point(&self) -> GraphicsResult<Point> {
        self.position.ok_or(GraphicsError::NoCurrentPoint)
    }

    /// Current point in user space (`currentpoint`).
    pub fn current_point(&self) -> GraphicsResult<Point> {
        self.ctm.itransform_point(self.device_point()?)
    }

    // -- path construction --

    pub fn newpath(&mut self) {
        self.path = Path::new();
        self.position = None;
    }

    pub fn moveto(&mut self, p: Point) {
        let d = self.ctm.transform_point(p);
        self.path.moveto(d);
        self.position = Some(d);
    }

    pub fn rmoveto(&mut self, delta: Vec2) -> GraphicsResult<()> {
        let start = self.device_point()?;
        let d = start + self.ctm.transform_delta(delta);
        self.path.moveto(d);
        self.position = Some(d);
        Ok(())
    }

    pub fn lineto(&mut self, p: Point) -> GraphicsResult<()> {
        self.device_point()?;
        let d = self.ctm.transform_point(p);
        self.path.lineto(d);
        self.position = Some(d);
        Ok(())
    }

    pub fn rlineto(&mut self, delta: Vec2) -> GraphicsResult<()> {
        let start = self.device_point()?;
        let d = start + self.ctm.transform_delta(delta);
        self.path.lineto(d);
        self.position = Some(d);
        Ok(())
    }

    pub fn curveto(&mut self, c1: Point, c2: Point, p: Point) -> GraphicsResult<()> {
        self.device_point()?;
        let m = self.ctm;
        let end = m.transform_point(p);
        self.path
            .curveto(m.transform_point(c1), m.transform_point(c2), end);
        self.position = Some(end);
        Ok(())
    }

    pub fn rcurveto(&mut self, d1: Vec2, d2: Vec2, d3: Vec2) -> GraphicsResult<()> {
        let start = self.device_point()?;
        let m = self.ctm;
        let end = start + m.transform_delta(d3);
        self.path.curveto(
            start + m.transform_delta(d1),
            start + m.transform_delta(d2),
            end,
        );
        self.position = Some(end);
        Ok(())
    }

    pub fn closepath(&mut self) {
        if let Some(start) = self.path.closepath() {
            self.position = Some(start);
        }
    }

    /// `arc` / `arcn`: connect from the current point (if any) with a line
    /// and append the arc.
    pub fn arc(
        &mut self,
        center: Point,
        radius: Scalar,
        angle1: Scalar,
        angle2: Scalar,
        ccw: bool,
    ) -> GraphicsResult<()> {
        if radius < 0.0 {
            return Err(GraphicsError::RangeCheck("negative arc radius"));
        }
        let (start, curves) = arc_curves(center, radius, angle1, angle2, ccw);
        if self.position.is_some() {
            self.lineto(start)?;
        } else {
            self.moveto(start);
        }
        for [c1, c2, p] in curves {
            self.curveto(c1, c2, p)?;
        }
        Ok(())
    }

    /// `arct` / `arcto`: append an arc of `radius` tangent to the lines
    /// from the current point to `p1` and from `p1` to `p2`.
    ///
    /// Returns the two tangent points in user space.
    pub fn arct(&mut self, p1: Point, p2: Point, radius: Scalar) -> GraphicsResult<[Point; 2]> {
        if radius < 0.0 {
            return Err(GraphicsError::RangeCheck("negative arc radius"));
        }
        let p0 = self.current_point()?;
        let v1 = p0 - p1;
        let v2 = p2 - p1;
        let (l1, l2) = (v1.hypot(), v2.hypot());
        let cross = v1.cross(v2);
        if l1 == 0.0 || l2 == 0.0 || cross.abs() < 1e-12 {
            self.lineto(p1)?;
            return Ok([p1, p1]);
        }
        let (u1, u2) = (v1 / l1, v2 / l2);
        let half = u1.dot(u2).clamp(-1.0, 1.0).acos() / 2.0;
        let dist = radius / half.tan();
        let t1 = p1 + u1 * dist;
        let t2 = p1 + u2 * dist;
        let bisector = (u1 + u2).normalize();
        let center = p1 + bisector * (radius / half.sin());
        let a1 = (t1.y - center.y).atan2(t1.x - center.x).to_degrees();
        let a2 = (t2.y - center.y).atan2(t2.x - center.x).to_degrees();
        // A left turn at p1 sweeps counter-clockwise.
        self.arc(center, radius, a1, a2, cross < 0.0)?;
        Ok([t1, t2])
    }

    /// Append a closed rectangle (used by `rectfill` and friends).
    pub fn rectangle(&mut self, x: Scalar, y: Scalar, w: Scalar, h: Scalar) {
        self.moveto(Point::new(x, y));
        let m = self.ctm;
        for p in [
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ] {
            self.path.lineto(m.transform_point(p));
        }
        self.closepath();
    }

    pub fn flatten_path(&mut self) {
        self.path = self.path.flattened(self.flatness.max(0.2));
    }

    pub fn reverse_path(&mut self) {
        self.path = self.path.reversed();
        self.position = self.path.sections().last().map(Section::end_point);
    }

    /// User-space bounding box of the current path (`pathbbox`).
    pub fn path_bbox(&self) -> GraphicsResult<BoundingBox> {
        if self.path.is_empty() {
            return Err(GraphicsError::NoCurrentPoint);
        }
        let device_bb = match path_bbox(&self.path) {
            Some(bb) => bb,
            None => {
                let p = self.device_point()?;
                BoundingBox::new(p.x, p.y, p.x, p.y)
            }
        };
        let inv = self.ctm.invert()?;
        let mut bb = BoundingBox::EMPTY;
        for corner in [
            Point::new(device_bb.min_x, device_bb.min_y),
            Point::new(device_bb.max_x, device_bb.min_y),
            Point::new(device_bb.min_x, device_bb.max_y),
            Point::new(device_bb.max_x, device_bb.max_y),
        ] {
            bb.include_point(inv.transform_point(corner));
        }
        Ok(bb)
    }

    // -- clipping --

    /// Replace the clip by the current path (`clip` / `eoclip`).
    pub fn clip_to_path(&mut self, rule: FillRule) {
        self.clip = self.path.clone();
        self.clip_rule = rule;
    }

    /// Reset the clip to the page (`initclip`).
    pub fn init_clip(&mut self) {
        self.clip = self.page.to_path();
        self.clip_rule = FillRule::NonZero;
    }

    // -- derived stroke values --

    /// Line width mapped to device space.
    pub fn device_line_width(&self) -> Scalar {
        self.line.width * self.ctm.mean_scale()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn state() -> GraphicsState {
        GraphicsState::new(Matrix::IDENTITY, BoundingBox::A4, DeviceId(0))
    }

    #[test]
    fn lineto_without_current_point_fails() {
        let mut gs = state();
        assert_eq!(
            gs.lineto(Point::new(1.0, 1.0)),
            Err(GraphicsError::NoCurrentPoint)
        );
    }

    #[test]
    fn path_coordinates_are_device_space() {
        let mut gs = state();
        gs.ctm = Matrix::scaling(2.0, 3.0);
        gs.moveto(Point::new(1.0, 1.0));
        gs.rlineto(Vec2::new(1.0, 0.0)).unwrap();
        assert_eq!(
            gs.path.sections(),
            &[
                Section::MoveTo(Point::new(2.0, 3.0)),
                Section::LineTo(Point::new(4.0, 3.0)),
            ]
        );
        assert_eq!(gs.current_point().unwrap(), Point::new(2.0, 1.0));
    }

    #[test]
    fn closepath_moves_current_point_to_start() {
        let mut gs = state();
        gs.moveto(Point::new(1.0, 2.0));
        gs.lineto(Point::new(5.0, 2.0)).unwrap();
        gs.closepath();
        assert_eq!(gs.position, Some(Point::new(1.0, 2.0)));
    }

    #[test]
    fn pathbbox_in_user_space() {
        let mut gs = state();
        gs.ctm = Matrix::translation(100.0, 100.0);
        gs.rectangle(0.0, 0.0, 10.0, 20.0);
        let bb = gs.path_bbox().unwrap();
        assert_eq!(bb, BoundingBox::new(0.0, 0.0, 10.0, 20.0));
    }

    #[test]
    fn pathbbox_on_empty_path_is_nocurrentpoint() {
        assert_eq!(state().path_bbox(), Err(GraphicsError::NoCurrentPoint));
    }

    #[test]
    fn arc_starts_with_moveto_when_no_current_point() {
        let mut gs = state();
        gs.arc(Point::ZERO, 10.0, 0.0, 90.0, true).unwrap();
        assert!(matches!(gs.path.sections()[0], Section::MoveTo(_)));
        assert_eq!(gs.path.len(), 2);
    }

    #[test]
    fn arct_returns_tangent_points() {
        let mut gs = state();
        gs.moveto(Point::new(0.0, 0.0));
        let [t1, t2] = gs
            .arct(Point::new(10.0, 0.0), Point::new(10.0, 10.0), 2.0)
            .unwrap();
        assert!((t1.x - 8.0).abs() < 1e-9 && t1.y.abs() < 1e-9, "t1 {t1:?}");
        assert!((t2.x - 10.0).abs() < 1e-9 && (t2.y - 2.0).abs() < 1e-9, "t2 {t2:?}");
    }

    #[test]
    fn initgraphics_keeps_device() {
        let mut gs = GraphicsState::new(Matrix::IDENTITY, BoundingBox::A4, DeviceId(3));
        gs.line.width = 5.0;
        gs.init_graphics(Matrix::IDENTITY);
        assert_eq!(gs.line.width, 1.0);
        assert_eq!(gs.device, DeviceId(3));
    }
}
