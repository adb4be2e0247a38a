//! SVG renderer for `epsvg` pictures.
//!
//! Converts a [`Picture`] into an SVG [`Document`] using the `svg` crate.
//!
//! - Device space has Y pointing **up**; SVG has Y pointing **down**. Path
//!   coordinates are negated at render time, and object transforms are
//!   conjugated (or post-multiplied) by the Y flip, so no global transform
//!   is needed.
//! - Path data is built as raw `d` strings to keep `f64` precision.
//! - Clip brackets become `<clipPath>` definitions plus clipped groups.
//! - Sampled images become runs of unit rectangles in image space.
//! - Axial and radial shadings become gradients painted over the clip area.

use std::fmt::Write as _;

use svg::Document;
use svg::node::element::{
    ClipPath, Definitions, Group, LinearGradient, Path as SvgPath, RadialGradient, Rectangle,
    Stop, Text as SvgText,
};

use epsvg_graphics::bbox::{BoundingBox, picture_bbox};
use epsvg_graphics::device::ShadingGeometry;
use epsvg_graphics::matrix::Matrix;
use epsvg_graphics::path::{Path, Section};
use epsvg_graphics::picture::{
    FillObject, GraphicsObject, ImageObject, Picture, ShadingObject, StrokeObject, TextObject,
};
use epsvg_graphics::types::{Color, DashPattern, FillRule, LineCap, LineJoin, Scalar};

/// Gradient stops used to approximate a non-linear interpolation exponent.
const GRADIENT_STEPS: usize = 16;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Options controlling SVG output.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Extra margin around the page box (in points). Default: 0.
    pub margin: Scalar,
    /// Number of decimal places for coordinates. Default: 4.
    pub precision: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            margin: 0.0,
            precision: 4,
        }
    }
}

/// Render a [`Picture`] to an SVG [`Document`].
///
/// The `viewBox` is the picture's page box, or the bounds of its contents
/// when the page box is empty.
#[must_use]
pub fn render(picture: &Picture) -> Document {
    render_with_options(picture, &RenderOptions::default())
}

/// Render a [`Picture`] to an SVG string.
#[must_use]
pub fn render_to_string(picture: &Picture) -> String {
    render(picture).to_string()
}

/// Render a [`Picture`] to an SVG [`Document`] with custom options.
#[must_use]
pub fn render_with_options(picture: &Picture, opts: &RenderOptions) -> Document {
    let bb = if picture.page.is_valid() {
        picture.page
    } else {
        picture_bbox(picture)
    };
    let mut state = RenderState::new(opts);
    let content = state.render_objects(&picture.objects);
    build_document(&bb, opts, content, state.defs)
}

// ---------------------------------------------------------------------------
// Render state
// ---------------------------------------------------------------------------

enum Def {
    Clip(ClipPath),
    Linear(LinearGradient),
    Radial(RadialGradient),
}

struct RenderState<'a> {
    opts: &'a RenderOptions,
    defs: Vec<Def>,
    next_id: usize,
}

impl<'a> RenderState<'a> {
    const fn new(opts: &'a RenderOptions) -> Self {
        Self {
            opts,
            defs: Vec::new(),
            next_id: 0,
        }
    }

    fn fresh_id(&mut self, prefix: char) -> String {
        let id = format!("{prefix}{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn render_objects(&mut self, objects: &[GraphicsObject]) -> Group {
        let mut group = Group::new();
        let mut i = 0;
        while i < objects.len() {
            match &objects[i] {
                GraphicsObject::Fill(fill) => {
                    group = group.add(render_fill(fill, self.opts));
                }
                GraphicsObject::Stroke(stroke) => {
                    group = group.add(render_stroke(stroke, self.opts));
                }
                GraphicsObject::Text(text) => {
                    group = group.add(render_text(text, self.opts));
                }
                GraphicsObject::Image(image) => {
                    group = group.add(render_image(image, self.opts));
                }
                GraphicsObject::Shading(shading) => {
                    group = group.add(self.render_shading(shading));
                }
                GraphicsObject::ClipStart(path, rule) => {
                    let end = find_matching_end(objects, i);
                    let inner = &objects[(i + 1).min(end)..end];
                    let id = self.fresh_id('c');
                    let clip = ClipPath::new().set("id", id.as_str()).add(
                        SvgPath::new()
                            .set("d", path_to_d(path, self.opts.precision))
                            .set("clip-rule", fill_rule_to_svg(*rule)),
                    );
                    self.defs.push(Def::Clip(clip));
                    let inner_group = self.render_objects(inner);
                    group = group.add(
                        Group::new()
                            .set("clip-path", format!("url(#{id})"))
                            .add(inner_group),
                    );
                    i = end;
                }
                // Unmatched; nothing to close.
                GraphicsObject::ClipEnd => {}
            }
            i += 1;
        }
        group
    }

    fn render_shading(&mut self, obj: &ShadingObject) -> SvgPath {
        let p = self.opts.precision;
        let shading = &obj.shading;
        let id = self.fresh_id('g');
        let transform = flipped_matrix(obj.transform, p);
        let stops = gradient_stops(obj, p);
        match shading.geometry {
            ShadingGeometry::Axial { from, to } => {
                let mut gradient = LinearGradient::new()
                    .set("id", id.as_str())
                    .set("gradientUnits", "userSpaceOnUse")
                    .set("gradientTransform", transform)
                    .set("x1", fmt_scalar(from.x, p))
                    .set("y1", fmt_scalar(from.y, p))
                    .set("x2", fmt_scalar(to.x, p))
                    .set("y2", fmt_scalar(to.y, p));
                for stop in stops {
                    gradient = gradient.add(stop);
                }
                self.defs.push(Def::Linear(gradient));
            }
            ShadingGeometry::Radial { c0, r0, c1, r1 } => {
                let mut gradient = RadialGradient::new()
                    .set("id", id.as_str())
                    .set("gradientUnits", "userSpaceOnUse")
                    .set("gradientTransform", transform)
                    .set("fx", fmt_scalar(c0.x, p))
                    .set("fy", fmt_scalar(c0.y, p))
                    .set("fr", fmt_scalar(r0, p))
                    .set("cx", fmt_scalar(c1.x, p))
                    .set("cy", fmt_scalar(c1.y, p))
                    .set("r", fmt_scalar(r1, p));
                for stop in stops {
                    gradient = gradient.add(stop);
                }
                self.defs.push(Def::Radial(gradient));
            }
        }
        SvgPath::new()
            .set("d", path_to_d(&obj.area, p))
            .set("fill", format!("url(#{id})"))
            .set("stroke", "none")
    }
}

/// Stops sampling the shading function; two suffice when it is linear.
fn gradient_stops(obj: &ShadingObject, precision: usize) -> Vec<Stop> {
    let steps = if (obj.shading.exponent - 1.0).abs() < 1e-9 {
        1
    } else {
        GRADIENT_STEPS
    };
    (0..=steps)
        .map(|k| {
            #[expect(clippy::cast_precision_loss, reason = "small step count")]
            let t = k as Scalar / steps as Scalar;
            Stop::new()
                .set("offset", fmt_scalar(t, precision))
                .set("stop-color", color_to_svg(obj.shading.color_at(t)))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Individual object renderers
// ---------------------------------------------------------------------------

fn render_fill(fill: &FillObject, opts: &RenderOptions) -> SvgPath {
    SvgPath::new()
        .set("d", path_to_d(&fill.path, opts.precision))
        .set("fill", color_to_svg(fill.color))
        .set("fill-rule", fill_rule_to_svg(fill.rule))
        .set("stroke", "none")
}

fn render_stroke(stroke: &StrokeObject, opts: &RenderOptions) -> SvgPath {
    let p = opts.precision;
    let mut el = SvgPath::new()
        .set("d", path_to_d(&stroke.path, p))
        .set("fill", "none")
        .set("stroke", color_to_svg(stroke.color))
        .set("stroke-width", fmt_scalar(stroke.width, p))
        .set("stroke-linecap", linecap_to_svg(stroke.cap))
        .set("stroke-linejoin", linejoin_to_svg(stroke.join))
        .set("stroke-miterlimit", fmt_scalar(stroke.miter_limit, p));

    if !stroke.dash.is_solid() {
        el = el
            .set("stroke-dasharray", dash_to_svg(&stroke.dash, p))
            .set("stroke-dashoffset", fmt_scalar(stroke.dash.offset, p));
    }
    el
}

/// Render a text run. The transform maps em units to device space, so the
/// font size is one unit and the matrix carries the scale.
fn render_text(text: &TextObject, opts: &RenderOptions) -> SvgText {
    SvgText::new(text.text.as_ref())
        .set("transform", conjugated_matrix(text.transform, opts.precision))
        .set("font-family", text.font_name.as_ref())
        .set("font-size", "1")
        .set("fill", color_to_svg(text.color))
        .set("xml:space", "preserve")
}

/// Render a sampled image as horizontal runs of equal-colored pixels.
///
/// Rectangles are in image space: one unit per sample, row 0 first. Mask
/// pixels that do not paint are skipped.
fn render_image(obj: &ImageObject, opts: &RenderOptions) -> Group {
    let image = &obj.image;
    let mut group = Group::new()
        .set("transform", flipped_matrix(obj.transform, opts.precision))
        .set("shape-rendering", "crispEdges");
    for y in 0..image.height {
        let mut x = 0;
        while x < image.width {
            let color = image.pixel(x, y, obj.color);
            let mut run = 1;
            while x + run < image.width && image.pixel(x + run, y, obj.color) == color {
                run += 1;
            }
            if let Some(color) = color {
                group = group.add(
                    Rectangle::new()
                        .set("x", x)
                        .set("y", y)
                        .set("width", run)
                        .set("height", 1)
                        .set("fill", color_to_svg(color)),
                );
            }
            x += run;
        }
    }
    group
}

// ---------------------------------------------------------------------------
// Path → SVG "d" attribute
// ---------------------------------------------------------------------------

/// Convert a device-space [`Path`] to SVG path data, negating Y.
fn path_to_d(path: &Path, precision: usize) -> String {
    let mut d = String::with_capacity(path.len() * 24);
    for section in path.sections() {
        match *section {
            Section::MoveTo(p) => {
                d.push('M');
                write_point(&mut d, p.x, -p.y, precision);
            }
            Section::LineTo(p) => {
                d.push('L');
                write_point(&mut d, p.x, -p.y, precision);
            }
            Section::CurveTo(c1, c2, p) => {
                d.push('C');
                write_point(&mut d, c1.x, -c1.y, precision);
                d.push(' ');
                write_point(&mut d, c2.x, -c2.y, precision);
                d.push(' ');
                write_point(&mut d, p.x, -p.y, precision);
            }
            Section::ClosePath(_) => d.push('Z'),
        }
    }
    d
}

/// Write "x,y", normalizing negative zero.
fn write_point(d: &mut String, x: Scalar, y: Scalar, precision: usize) {
    let x = if x == 0.0 { 0.0 } else { x };
    let y = if y == 0.0 { 0.0 } else { y };
    let _ = write!(d, "{x:.precision$},{y:.precision$}");
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

fn svg_matrix(m: [Scalar; 6], precision: usize) -> String {
    let parts: Vec<String> = m.iter().map(|&v| fmt_scalar(v, precision)).collect();
    format!("matrix({})", parts.join(","))
}

/// `S·M·S` with `S` the Y flip: for content whose own coordinates are
/// already Y-down, such as glyphs.
fn conjugated_matrix(m: Matrix, precision: usize) -> String {
    svg_matrix([m.a, -m.b, -m.c, m.d, m.tx, -m.ty], precision)
}

/// `S·M`: for content given in Y-up coordinates, such as image samples
/// and shading space.
fn flipped_matrix(m: Matrix, precision: usize) -> String {
    svg_matrix([m.a, -m.b, m.c, -m.d, m.tx, -m.ty], precision)
}

// ---------------------------------------------------------------------------
// Color / attribute helpers
// ---------------------------------------------------------------------------

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "color components are clamped to [0, 255]"
)]
fn color_to_svg(c: Color) -> String {
    let r = (c.r.clamp(0.0, 1.0) * 255.0).round() as u8;
    let g = (c.g.clamp(0.0, 1.0) * 255.0).round() as u8;
    let b = (c.b.clamp(0.0, 1.0) * 255.0).round() as u8;
    match (r, g, b) {
        (0, 0, 0) => "black".to_owned(),
        (255, 255, 255) => "white".to_owned(),
        _ => format!("#{r:02x}{g:02x}{b:02x}"),
    }
}

const fn fill_rule_to_svg(rule: FillRule) -> &'static str {
    match rule {
        FillRule::NonZero => "nonzero",
        FillRule::EvenOdd => "evenodd",
    }
}

const fn linecap_to_svg(cap: LineCap) -> &'static str {
    match cap {
        LineCap::Butt => "butt",
        LineCap::Round => "round",
        LineCap::Square => "square",
    }
}

const fn linejoin_to_svg(join: LineJoin) -> &'static str {
    match join {
        LineJoin::Miter => "miter",
        LineJoin::Round => "round",
        LineJoin::Bevel => "bevel",
    }
}

fn dash_to_svg(dash: &DashPattern, precision: usize) -> String {
    dash.dashes
        .iter()
        .map(|&v| fmt_scalar(v, precision))
        .collect::<Vec<_>>()
        .join(",")
}

/// Format a scalar to the given precision, stripping trailing zeros.
fn fmt_scalar(v: Scalar, precision: usize) -> String {
    let s = format!("{v:.precision$}");
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_owned()
    } else {
        s
    };
    if s == "-0" { "0".to_owned() } else { s }
}

/// Index of the `ClipEnd` matching the `ClipStart` at `start`, or the end
/// of the list if it is missing.
fn find_matching_end(objects: &[GraphicsObject], start: usize) -> usize {
    let mut depth = 0usize;
    for (offset, obj) in objects[start..].iter().enumerate() {
        match obj {
            GraphicsObject::ClipStart(..) => depth += 1,
            GraphicsObject::ClipEnd => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return start + offset;
                }
            }
            _ => {}
        }
    }
    objects.len()
}

// ---------------------------------------------------------------------------
// Document assembly
// ---------------------------------------------------------------------------

/// Build the final document. SVG `min_y` is the negated device `max_y`.
fn build_document(
    bb: &BoundingBox,
    opts: &RenderOptions,
    content: Group,
    defs: Vec<Def>,
) -> Document {
    let m = opts.margin;
    let p = opts.precision;
    let (vb_x, vb_y, vb_w, vb_h) = if bb.is_valid() {
        (
            bb.min_x - m,
            -bb.max_y - m,
            2.0f64.mul_add(m, bb.width()),
            2.0f64.mul_add(m, bb.height()),
        )
    } else {
        (0.0, 0.0, 100.0, 100.0)
    };

    let mut doc = Document::new()
        .set("xmlns", "http://www.w3.org/2000/svg")
        .set(
            "viewBox",
            format!(
                "{} {} {} {}",
                fmt_scalar(vb_x, p),
                fmt_scalar(vb_y, p),
                fmt_scalar(vb_w, p),
                fmt_scalar(vb_h, p),
            ),
        )
        .set("width", format!("{}pt", fmt_scalar(vb_w, p)))
        .set("height", format!("{}pt", fmt_scalar(vb_h, p)));

    if !defs.is_empty() {
        let mut definitions = Definitions::new();
        for def in defs {
            definitions = match def {
                Def::Clip(c) => definitions.add(c),
                Def::Linear(g) => definitions.add(g),
                Def::Radial(g) => definitions.add(g),
            };
        }
        doc = doc.add(definitions);
    }

    doc.add(content)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use epsvg_graphics::color::{ColorSpace, DeviceColor};
    use epsvg_graphics::device::{Image, Shading};
    use epsvg_graphics::types::Point;

    use super::*;

    fn square() -> Path {
        let mut path = Path::new();
        path.moveto(Point::new(0.0, 0.0));
        path.lineto(Point::new(10.0, 0.0));
        path.lineto(Point::new(10.0, 10.0));
        path.lineto(Point::new(0.0, 10.0));
        path.closepath();
        path
    }

    fn page() -> Picture {
        Picture::new(BoundingBox::new(0.0, 0.0, 100.0, 50.0))
    }

    fn fill(color: Color) -> GraphicsObject {
        GraphicsObject::Fill(FillObject {
            path: square(),
            color,
            rule: FillRule::NonZero,
        })
    }

    #[test]
    fn path_to_d_negates_y() {
        let mut path = Path::new();
        path.moveto(Point::new(5.0, 10.0));
        path.curveto(
            Point::new(1.0, 2.0),
            Point::new(3.0, 4.0),
            Point::new(5.0, 6.0),
        );
        let d = path_to_d(&path, 1);
        assert_eq!(d, "M5.0,-10.0C1.0,-2.0 3.0,-4.0 5.0,-6.0");
    }

    #[test]
    fn path_to_d_closes() {
        let d = path_to_d(&square(), 0);
        assert_eq!(d, "M0,0L10,0L10,-10L0,-10Z");
    }

    #[test]
    fn colors() {
        assert_eq!(color_to_svg(Color::BLACK), "black");
        assert_eq!(color_to_svg(Color::WHITE), "white");
        assert_eq!(color_to_svg(Color::new(1.0, 0.0, 0.0)), "#ff0000");
        assert_eq!(color_to_svg(Color::new(0.5, 0.5, 0.5)), "#808080");
    }

    #[test]
    fn fmt_scalar_strips_zeros() {
        assert_eq!(fmt_scalar(1.0, 4), "1");
        assert_eq!(fmt_scalar(1.25, 4), "1.25");
        assert_eq!(fmt_scalar(-0.00001, 4), "0");
    }

    #[test]
    fn viewbox_is_the_page_box() {
        let svg = render_to_string(&page());
        assert!(svg.contains("viewBox=\"0 -50 100 50\""), "{svg}");
        assert!(svg.contains("width=\"100pt\""), "{svg}");
    }

    #[test]
    fn empty_page_box_falls_back_to_contents() {
        let mut pic = Picture::new(BoundingBox::EMPTY);
        pic.push(fill(Color::BLACK));
        let svg = render_to_string(&pic);
        assert!(svg.contains("viewBox=\"0 -10 10 10\""), "{svg}");
    }

    #[test]
    fn eofill_sets_rule() {
        let mut pic = page();
        pic.push(GraphicsObject::Fill(FillObject {
            path: square(),
            color: Color::new(0.0, 0.0, 1.0),
            rule: FillRule::EvenOdd,
        }));
        let svg = render_to_string(&pic);
        assert!(svg.contains("fill=\"#0000ff\""), "{svg}");
        assert!(svg.contains("fill-rule=\"evenodd\""), "{svg}");
    }

    #[test]
    fn dashed_stroke() {
        let el = render_stroke(
            &StrokeObject {
                path: square(),
                width: 2.0,
                color: Color::BLACK,
                dash: DashPattern {
                    dashes: vec![3.0, 1.5],
                    offset: 1.0,
                },
                cap: LineCap::Round,
                join: LineJoin::Bevel,
                miter_limit: 10.0,
            },
            &RenderOptions::default(),
        );
        let s = el.to_string();
        assert!(s.contains("stroke-width=\"2\""), "{s}");
        assert!(s.contains("stroke-dasharray=\"3,1.5\""), "{s}");
        assert!(s.contains("stroke-linecap=\"round\""), "{s}");
        assert!(s.contains("stroke-linejoin=\"bevel\""), "{s}");
    }

    #[test]
    fn nested_clips() {
        let mut pic = page();
        pic.push(GraphicsObject::ClipStart(square(), FillRule::NonZero));
        pic.push(GraphicsObject::ClipStart(square(), FillRule::EvenOdd));
        pic.push(fill(Color::BLACK));
        pic.push(GraphicsObject::ClipEnd);
        pic.push(GraphicsObject::ClipEnd);
        let svg = render_to_string(&pic);
        assert!(svg.contains("clip-path=\"url(#c0)\""), "{svg}");
        assert!(svg.contains("clip-path=\"url(#c1)\""), "{svg}");
        assert!(svg.contains("clip-rule=\"evenodd\""), "{svg}");
        assert_eq!(find_matching_end(&pic.objects, 0), 4);
        assert_eq!(find_matching_end(&pic.objects, 1), 3);
    }

    #[test]
    fn text_uses_conjugated_transform() {
        let mut pic = page();
        pic.push(GraphicsObject::Text(TextObject {
            text: Arc::from("Hi"),
            font_name: Arc::from("Helvetica"),
            color: Color::BLACK,
            transform: Matrix::new(12.0, 0.0, 0.0, 12.0, 10.0, 20.0),
            advance: 2.0,
        }));
        let svg = render_to_string(&pic);
        assert!(svg.contains("matrix(12,0,0,12,10,-20)"), "{svg}");
        assert!(svg.contains("font-family=\"Helvetica\""), "{svg}");
        assert!(svg.contains(">Hi<"), "{svg}");
    }

    #[test]
    fn image_runs_merge_equal_pixels() {
        let image = Image {
            width: 4,
            height: 1,
            bits_per_component: 8,
            space: ColorSpace::DeviceGray,
            decode: vec![(0.0, 1.0)],
            data: vec![0, 0, 255, 255],
            matrix: Matrix::IDENTITY,
            mask: None,
        };
        let group = render_image(
            &ImageObject {
                image: Arc::new(image),
                transform: Matrix::IDENTITY,
                color: Color::BLACK,
            },
            &RenderOptions::default(),
        );
        let s = group.to_string();
        assert_eq!(s.matches("<rect").count(), 2, "{s}");
        assert!(s.contains("width=\"2\""), "{s}");
        assert!(s.contains("matrix(1,0,0,-1,0,0)"), "{s}");
    }

    #[test]
    fn mask_skips_unpainted_pixels() {
        let image = Image {
            width: 8,
            height: 1,
            bits_per_component: 1,
            space: ColorSpace::DeviceGray,
            decode: vec![(0.0, 1.0)],
            data: vec![0b1111_0000],
            matrix: Matrix::IDENTITY,
            mask: Some(true),
        };
        let group = render_image(
            &ImageObject {
                image: Arc::new(image),
                transform: Matrix::IDENTITY,
                color: Color::new(1.0, 0.0, 0.0),
            },
            &RenderOptions::default(),
        );
        let s = group.to_string();
        assert_eq!(s.matches("<rect").count(), 1, "{s}");
        assert!(s.contains("fill=\"#ff0000\""), "{s}");
    }

    #[test]
    fn axial_shading_becomes_linear_gradient() {
        let mut pic = page();
        pic.push(GraphicsObject::Shading(ShadingObject {
            shading: Shading {
                geometry: ShadingGeometry::Axial {
                    from: Point::new(0.0, 0.0),
                    to: Point::new(100.0, 0.0),
                },
                start: DeviceColor::Gray(0.0),
                end: DeviceColor::Gray(1.0),
                exponent: 1.0,
                extend: (true, true),
            },
            transform: Matrix::IDENTITY,
            area: square(),
        }));
        let svg = render_to_string(&pic);
        assert!(svg.contains("<linearGradient"), "{svg}");
        assert!(svg.contains("fill=\"url(#g0)\""), "{svg}");
        assert_eq!(svg.matches("<stop").count(), 2, "{svg}");
    }

    #[test]
    fn radial_shading_with_exponent_samples_stops() {
        let obj = ShadingObject {
            shading: Shading {
                geometry: ShadingGeometry::Radial {
                    c0: Point::new(0.0, 0.0),
                    r0: 0.0,
                    c1: Point::new(0.0, 0.0),
                    r1: 10.0,
                },
                start: DeviceColor::Rgb(1.0, 0.0, 0.0),
                end: DeviceColor::Rgb(0.0, 0.0, 1.0),
                exponent: 2.0,
                extend: (false, false),
            },
            transform: Matrix::IDENTITY,
            area: square(),
        };
        assert_eq!(gradient_stops(&obj, 4).len(), GRADIENT_STEPS + 1);
        let mut pic = page();
        pic.push(GraphicsObject::Shading(obj));
        let svg = render_to_string(&pic);
        assert!(svg.contains("<radialGradient"), "{svg}");
    }
}
