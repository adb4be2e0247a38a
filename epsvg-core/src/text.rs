//! Text placement.
//!
//! Glyph outlines and real metrics are not available, so the default
//! [`MetricsTextHandler`] gives every glyph a fixed advance in the
//! 1000-unit glyph space (600, or 278 for `space`) and maps it through the
//! font matrix and the CTM. Each `show` emits [`TextRun`]s to the device;
//! the SVG renderer draws them with a matching font family.

use std::sync::Arc;

use epsvg_graphics::device::{OutputDevice, TextRun};
use epsvg_graphics::error::GraphicsResult;
use epsvg_graphics::matrix::Matrix;
use epsvg_graphics::path::Path;
use epsvg_graphics::state::GraphicsState;
use epsvg_graphics::types::{Point, Scalar, Vec2};

use crate::encoding::glyph_char;

/// Advance of an ordinary glyph in glyph space.
pub const GLYPH_WIDTH: Scalar = 600.0;
/// Advance of the `space` glyph in glyph space.
pub const SPACE_WIDTH: Scalar = 278.0;
/// Height of the box `charpath` appends for each glyph.
const GLYPH_HEIGHT: Scalar = 700.0;

/// What the text machinery needs from a font dictionary.
#[derive(Debug, Clone)]
pub struct FontInfo {
    pub name: Arc<str>,
    /// Glyph space to user space.
    pub matrix: Matrix,
    /// Glyph name per code; `None` when the font has no usable encoding.
    pub encoding: Option<Vec<Arc<str>>>,
}

impl FontInfo {
    /// Glyph name for a character code.
    #[must_use]
    pub fn glyph_name(&self, code: u8) -> Option<&str> {
        self.encoding
            .as_ref()
            .and_then(|e| e.get(usize::from(code)))
            .map(AsRef::as_ref)
    }

    /// First code that selects `glyph`.
    #[must_use]
    pub fn code_for(&self, glyph: &str) -> Option<u8> {
        let index = self.encoding.as_ref()?.iter().position(|n| n.as_ref() == glyph)?;
        u8::try_from(index).ok()
    }

    /// The character drawn for `code`.
    #[must_use]
    pub fn decode(&self, code: u8) -> char {
        match self.glyph_name(code) {
            Some(name) => glyph_char(name).unwrap_or(char::REPLACEMENT_CHARACTER),
            None => char::from(code),
        }
    }

    /// Advance of `code` in glyph space.
    #[must_use]
    pub fn glyph_width(&self, code: u8) -> Scalar {
        let is_space = self.glyph_name(code).map_or(code == b' ', |n| n == "space");
        if is_space { SPACE_WIDTH } else { GLYPH_WIDTH }
    }
}

/// Extra spacing of `ashow`, `widthshow` and `awidthshow`, in user space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Spacing {
    /// Added after every character.
    pub all: Vec2,
    /// Added after each occurrence of `char_code`.
    pub extra: Vec2,
    pub char_code: Option<u8>,
}

impl Spacing {
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.all == Vec2::ZERO && (self.char_code.is_none() || self.extra == Vec2::ZERO)
    }

    fn after(&self, code: u8) -> Vec2 {
        if self.char_code == Some(code) {
            self.all + self.extra
        } else {
            self.all
        }
    }
}

/// Places text for the `show` family.
pub trait TextHandler {
    /// Draw `text` at the current point. Returns the displacement of the
    /// current point in user space.
    fn show_text(
        &mut self,
        device: &mut dyn OutputDevice,
        state: &GraphicsState,
        font: &FontInfo,
        text: &[u8],
        spacing: &Spacing,
    ) -> GraphicsResult<Vec2>;

    /// Width of `text` in user space (`stringwidth`).
    fn string_width(&self, font: &FontInfo, text: &[u8]) -> Vec2;

    /// Outline of `text` placed at the current point, in device space, and
    /// the displacement in user space.
    fn char_path(
        &self,
        state: &GraphicsState,
        font: &FontInfo,
        text: &[u8],
    ) -> GraphicsResult<(Path, Vec2)>;
}

/// Fixed-advance text handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsTextHandler;

impl MetricsTextHandler {
    fn run(state: &GraphicsState, font: &FontInfo, origin: Point, text: &[u8]) -> TextRun {
        let glyph_units: Scalar = text.iter().map(|&c| font.glyph_width(c)).sum();
        TextRun {
            text: text.iter().map(|&c| font.decode(c)).collect(),
            font_name: font.name.to_string(),
            transform: Matrix::scaling(1000.0, 1000.0)
                .then(font.matrix)
                .then(Matrix::translation(origin.x, origin.y))
                .then(state.ctm),
            advance: glyph_units / 1000.0,
        }
    }
}

impl TextHandler for MetricsTextHandler {
    fn show_text(
        &mut self,
        device: &mut dyn OutputDevice,
        state: &GraphicsState,
        font: &FontInfo,
        text: &[u8],
        spacing: &Spacing,
    ) -> GraphicsResult<Vec2> {
        let start = state.current_point()?;
        if text.is_empty() {
            return Ok(Vec2::ZERO);
        }
        if spacing.is_none() {
            device.show(&Self::run(state, font, start, text), state)?;
            return Ok(self.string_width(font, text));
        }
        let mut offset = Vec2::ZERO;
        for &code in text {
            device.show(&Self::run(state, font, start + offset, &[code]), state)?;
            offset += self.string_width(font, &[code]) + spacing.after(code);
        }
        Ok(offset)
    }

    fn string_width(&self, font: &FontInfo, text: &[u8]) -> Vec2 {
        let units: Scalar = text.iter().map(|&c| font.glyph_width(c)).sum();
        font.matrix.transform_delta(Vec2::new(units, 0.0))
    }

    fn char_path(
        &self,
        state: &GraphicsState,
        font: &FontInfo,
        text: &[u8],
    ) -> GraphicsResult<(Path, Vec2)> {
        let start = state.current_point()?;
        let mut path = Path::new();
        let mut offset = Vec2::ZERO;
        for &code in text {
            let w = font.glyph_width(code);
            let to_device = font
                .matrix
                .then(Matrix::translation(start.x + offset.x, start.y + offset.y))
                .then(state.ctm);
            let corners = [(0.0, 0.0), (w, 0.0), (w, GLYPH_HEIGHT), (0.0, GLYPH_HEIGHT)]
                .map(|(x, y)| to_device.transform_point(Point::new(x, y)));
            path.moveto(corners[0]);
            for &c in &corners[1..] {
                path.lineto(c);
            }
            path.closepath();
            offset += self.string_width(font, &[code]);
        }
        Ok((path, offset))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use epsvg_graphics::bbox::BoundingBox;
    use epsvg_graphics::picture::{GraphicsObject, PictureDevice};
    use epsvg_graphics::state::DeviceId;

    fn font(size: Scalar) -> FontInfo {
        FontInfo {
            name: Arc::from("Courier"),
            matrix: Matrix::scaling(size / 1000.0, size / 1000.0),
            encoding: None,
        }
    }

    fn state_at(x: Scalar, y: Scalar) -> GraphicsState {
        let mut s = GraphicsState::new(Matrix::IDENTITY, BoundingBox::A4, DeviceId(0));
        s.moveto(Point::new(x, y));
        s
    }

    #[test]
    fn widths_scale_with_font_matrix() {
        let h = MetricsTextHandler;
        let w = h.string_width(&font(10.0), b"ab c");
        assert!((w.x - (3.0 * 6.0 + 2.78)).abs() < 1e-9);
        assert_eq!(w.y, 0.0);
    }

    #[test]
    fn show_emits_one_run() {
        let mut h = MetricsTextHandler;
        let mut dev = PictureDevice::new();
        let s = state_at(10.0, 20.0);
        let d = h
            .show_text(&mut dev, &s, &font(10.0), b"Hi", &Spacing::default())
            .unwrap();
        assert!((d.x - 12.0).abs() < 1e-9);
        let objs = &dev.current().objects;
        assert_eq!(objs.len(), 1);
        let GraphicsObject::Text(t) = &objs[0] else {
            panic!("expected text");
        };
        assert_eq!(&*t.text, "Hi");
        let origin = t.transform.transform_point(Point::ZERO);
        assert!((origin.x - 10.0).abs() < 1e-9 && (origin.y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn spacing_splits_runs() {
        let mut h = MetricsTextHandler;
        let mut dev = PictureDevice::new();
        let s = state_at(0.0, 0.0);
        let spacing = Spacing {
            all: Vec2::new(1.0, 0.0),
            ..Spacing::default()
        };
        let d = h.show_text(&mut dev, &s, &font(10.0), b"ab", &spacing).unwrap();
        assert!((d.x - 14.0).abs() < 1e-9);
        assert_eq!(dev.current().objects.len(), 2);
    }

    #[test]
    fn show_needs_current_point() {
        let mut h = MetricsTextHandler;
        let mut dev = PictureDevice::new();
        let s = GraphicsState::new(Matrix::IDENTITY, BoundingBox::A4, DeviceId(0));
        assert!(
            h.show_text(&mut dev, &s, &font(10.0), b"a", &Spacing::default())
                .is_err()
        );
    }

    #[test]
    fn charpath_boxes() {
        let h = MetricsTextHandler;
        let s = state_at(0.0, 0.0);
        let (path, d) = h.char_path(&s, &font(10.0), b"ab").unwrap();
        assert_eq!(path.subpaths().len(), 2);
        assert!((d.x - 12.0).abs() < 1e-9);
    }

    #[test]
    fn decode_through_encoding() {
        let f = FontInfo {
            encoding: Some(vec![Arc::from("quoteright"); 256]),
            ..font(1.0)
        };
        assert_eq!(f.decode(39), '\u{2019}');
        assert_eq!(font(1.0).decode(b'x'), 'x');
    }
}
