//! Recorded pages.
//!
//! A [`Picture`] is an ordered list of device-space graphics objects, the
//! in-memory form of one page. [`PictureDevice`] is the output device that
//! produces them: every painting call appends an object, and clips are
//! recorded as `ClipStart`/`ClipEnd` brackets that close when the graphics
//! scope that opened them ends.

use std::sync::Arc;

use crate::bbox::BoundingBox;
use crate::device::{Image, OutputDevice, Shading, TextRun};
use crate::error::GraphicsResult;
use crate::matrix::Matrix;
use crate::path::Path;
use crate::state::GraphicsState;
use crate::types::{Color, DashPattern, FillRule, LineCap, LineJoin, Scalar};

// ---------------------------------------------------------------------------
// Picture and GraphicsObject
// ---------------------------------------------------------------------------

/// A single drawable element of a page.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsObject {
    Fill(FillObject),
    Stroke(StrokeObject),
    Text(TextObject),
    Image(ImageObject),
    Shading(ShadingObject),
    /// Everything up to the matching `ClipEnd` is clipped to the path.
    ClipStart(Path, FillRule),
    ClipEnd,
}

/// A filled region.
#[derive(Debug, Clone, PartialEq)]
pub struct FillObject {
    pub path: Path,
    pub color: Color,
    pub rule: FillRule,
}

/// A stroked path. Width and dash are already in device units.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeObject {
    pub path: Path,
    pub width: Scalar,
    pub color: Color,
    pub dash: DashPattern,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: Scalar,
}

/// A run of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextObject {
    pub text: Arc<str>,
    pub font_name: Arc<str>,
    pub color: Color,
    /// Text space (em units) to device space.
    pub transform: Matrix,
    /// Advance in em units.
    pub advance: Scalar,
}

/// A sampled image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageObject {
    pub image: Arc<Image>,
    /// Image space (one unit per sample) to device space.
    pub transform: Matrix,
    /// Paint color for masks.
    pub color: Color,
}

/// A smooth shading restricted to an area.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingObject {
    pub shading: Shading,
    /// Shading space to device space.
    pub transform: Matrix,
    /// Device-space region the shading covers.
    pub area: Path,
}

/// An ordered collection of graphical objects making up one page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Picture {
    pub objects: Vec<GraphicsObject>,
    /// Page area in device space.
    pub page: BoundingBox,
}

impl Picture {
    pub const fn new(page: BoundingBox) -> Self {
        Self {
            objects: Vec::new(),
            page,
        }
    }

    pub fn push(&mut self, obj: GraphicsObject) {
        self.objects.push(obj);
    }

    /// Whether the picture holds anything besides clip brackets.
    pub fn has_marks(&self) -> bool {
        self.objects
            .iter()
            .any(|o| !matches!(o, GraphicsObject::ClipStart(..) | GraphicsObject::ClipEnd))
    }
}

// ---------------------------------------------------------------------------
// Picture device
// ---------------------------------------------------------------------------

/// An output device that records pages as [`Picture`]s.
#[derive(Debug, Clone)]
pub struct PictureDevice {
    pages: Vec<Picture>,
    current: Picture,
    /// Number of clips opened in each graphics scope, innermost last.
    open_clips: Vec<usize>,
}

impl Default for PictureDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl PictureDevice {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Picture::new(BoundingBox::A4),
            open_clips: vec![0],
        }
    }

    /// The page being drawn.
    pub const fn current(&self) -> &Picture {
        &self.current
    }

    fn close_scope_clips(&mut self) {
        if let Some(count) = self.open_clips.last_mut() {
            for _ in 0..*count {
                self.current.push(GraphicsObject::ClipEnd);
            }
            *count = 0;
        }
    }

    fn close_all_clips(&mut self) {
        let total: usize = self.open_clips.iter().sum();
        for _ in 0..total {
            self.current.push(GraphicsObject::ClipEnd);
        }
        self.open_clips = vec![0];
    }

    fn emit_page(&mut self) {
        self.close_all_clips();
        let page = self.current.page;
        let done = std::mem::replace(&mut self.current, Picture::new(page));
        tracing::debug!(objects = done.objects.len(), "page complete");
        self.pages.push(done);
    }
}

impl OutputDevice for PictureDevice {
    fn init(&mut self, page: &BoundingBox) -> GraphicsResult<()> {
        self.current.page = *page;
        Ok(())
    }

    fn finish(&mut self) -> GraphicsResult<()> {
        // Encapsulated files usually end without showpage.
        if self.current.has_marks() || self.pages.is_empty() {
            self.emit_page();
        }
        Ok(())
    }

    fn fill(&mut self, state: &GraphicsState, rule: FillRule) -> GraphicsResult<()> {
        if state.path.is_empty() {
            return Ok(());
        }
        self.current.push(GraphicsObject::Fill(FillObject {
            path: state.path.clone(),
            color: state.color.to_rgb(),
            rule,
        }));
        Ok(())
    }

    fn stroke(&mut self, state: &GraphicsState) -> GraphicsResult<()> {
        if state.path.is_empty() {
            return Ok(());
        }
        let scale = state.ctm.mean_scale();
        self.current.push(GraphicsObject::Stroke(StrokeObject {
            path: state.path.clone(),
            width: state.device_line_width(),
            color: state.color.to_rgb(),
            dash: state.line.dash.scaled(scale),
            cap: state.line.cap,
            join: state.line.join,
            miter_limit: state.line.miter_limit,
        }));
        Ok(())
    }

    fn clip(&mut self, path: &Path, rule: FillRule) -> GraphicsResult<()> {
        self.current
            .push(GraphicsObject::ClipStart(path.clone(), rule));
        if let Some(count) = self.open_clips.last_mut() {
            *count += 1;
        }
        Ok(())
    }

    fn init_clip(&mut self) -> GraphicsResult<()> {
        self.close_scope_clips();
        Ok(())
    }

    fn image(&mut self, image: &Image, state: &GraphicsState) -> GraphicsResult<()> {
        let transform = image.matrix.invert()?.then(state.ctm);
        self.current.push(GraphicsObject::Image(ImageObject {
            image: Arc::new(image.clone()),
            transform,
            color: state.color.to_rgb(),
        }));
        Ok(())
    }

    fn shfill(&mut self, shading: &Shading, state: &GraphicsState) -> GraphicsResult<()> {
        self.current.push(GraphicsObject::Shading(ShadingObject {
            shading: shading.clone(),
            transform: state.ctm,
            area: state.clip.clone(),
        }));
        Ok(())
    }

    fn show(&mut self, text: &TextRun, state: &GraphicsState) -> GraphicsResult<()> {
        self.current.push(GraphicsObject::Text(TextObject {
            text: text.text.as_str().into(),
            font_name: text.font_name.as_str().into(),
            color: state.color.to_rgb(),
            transform: text.transform,
            advance: text.advance,
        }));
        Ok(())
    }

    fn erase_page(&mut self) -> GraphicsResult<()> {
        self.current
            .objects
            .retain(|o| matches!(o, GraphicsObject::ClipStart(..) | GraphicsObject::ClipEnd));
        Ok(())
    }

    fn show_page(&mut self) -> GraphicsResult<()> {
        self.emit_page();
        Ok(())
    }

    fn start_scope(&mut self) -> GraphicsResult<()> {
        self.open_clips.push(0);
        Ok(())
    }

    fn end_scope(&mut self) -> GraphicsResult<()> {
        self.close_scope_clips();
        if self.open_clips.len() > 1 {
            self.open_clips.pop();
        }
        Ok(())
    }

    fn output(&self) -> &[Picture] {
        &self.pages
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::state::DeviceId;
    use crate::types::Point;

    fn state_with_square() -> GraphicsState {
        let mut gs = GraphicsState::new(Matrix::IDENTITY, BoundingBox::A4, DeviceId(0));
        gs.rectangle(0.0, 0.0, 10.0, 10.0);
        gs
    }

    #[test]
    fn fill_records_object() {
        let mut dev = PictureDevice::new();
        dev.fill(&state_with_square(), FillRule::NonZero).unwrap();
        assert!(matches!(
            dev.current().objects[0],
            GraphicsObject::Fill(_)
        ));
    }

    #[test]
    fn empty_path_is_not_recorded() {
        let mut dev = PictureDevice::new();
        let gs = GraphicsState::new(Matrix::IDENTITY, BoundingBox::A4, DeviceId(0));
        dev.fill(&gs, FillRule::NonZero).unwrap();
        dev.stroke(&gs).unwrap();
        assert!(dev.current().objects.is_empty());
    }

    #[test]
    fn clip_closes_at_scope_end() {
        let mut dev = PictureDevice::new();
        let gs = state_with_square();
        dev.start_scope().unwrap();
        dev.clip(&gs.path, FillRule::NonZero).unwrap();
        dev.fill(&gs, FillRule::NonZero).unwrap();
        dev.end_scope().unwrap();
        let objs = &dev.current().objects;
        assert_eq!(objs.len(), 3);
        assert!(matches!(objs[0], GraphicsObject::ClipStart(..)));
        assert!(matches!(objs[2], GraphicsObject::ClipEnd));
    }

    #[test]
    fn showpage_closes_open_clips() {
        let mut dev = PictureDevice::new();
        let gs = state_with_square();
        dev.clip(&gs.path, FillRule::EvenOdd).unwrap();
        dev.start_scope().unwrap();
        dev.clip(&gs.path, FillRule::NonZero).unwrap();
        dev.show_page().unwrap();
        let page = &dev.output()[0];
        let ends = page
            .objects
            .iter()
            .filter(|o| matches!(o, GraphicsObject::ClipEnd))
            .count();
        assert_eq!(ends, 2);
        assert!(dev.current().objects.is_empty());
    }

    #[test]
    fn finish_emits_unfinished_page() {
        let mut dev = PictureDevice::new();
        dev.stroke(&state_with_square()).unwrap();
        dev.finish().unwrap();
        assert_eq!(dev.output().len(), 1);
    }

    #[test]
    fn finish_after_showpage_adds_nothing() {
        let mut dev = PictureDevice::new();
        dev.stroke(&state_with_square()).unwrap();
        dev.show_page().unwrap();
        dev.finish().unwrap();
        assert_eq!(dev.output().len(), 1);
    }

    #[test]
    fn erase_keeps_clip_brackets() {
        let mut dev = PictureDevice::new();
        let gs = state_with_square();
        dev.clip(&gs.path, FillRule::NonZero).unwrap();
        dev.fill(&gs, FillRule::NonZero).unwrap();
        dev.erase_page().unwrap();
        assert_eq!(dev.current().objects.len(), 1);
        assert!(!dev.current().has_marks());
    }

    #[test]
    fn stroke_width_in_device_units() {
        let mut dev = PictureDevice::new();
        let mut gs = state_with_square();
        gs.ctm = Matrix::scaling(2.0, 2.0);
        gs.line.width = 3.0;
        gs.moveto(Point::ZERO);
        dev.stroke(&gs).unwrap();
        let GraphicsObject::Stroke(s) = &dev.current().objects[0] else {
            panic!("expected stroke");
        };
        assert_eq!(s.width, 6.0);
    }
}
