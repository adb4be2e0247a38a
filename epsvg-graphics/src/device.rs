//! The output-device interface.
//!
//! The interpreter never renders anything itself: painting operators hand
//! the current [`GraphicsState`] to an [`OutputDevice`]. Devices receive
//! paths already in device space.

use crate::bbox::BoundingBox;
use crate::color::{ColorSpace, DeviceColor};
use crate::error::GraphicsResult;
use crate::matrix::Matrix;
use crate::path::Path;
use crate::picture::Picture;
use crate::state::GraphicsState;
use crate::types::{Color, FillRule, Point, Scalar};

// ---------------------------------------------------------------------------
// Device trait
// ---------------------------------------------------------------------------

/// A backend that consumes painting operations.
///
/// Every method has a no-op default except the three core painting calls,
/// so simple devices only implement what they care about.
pub trait OutputDevice {
    /// Called once before the first page with the page area.
    fn init(&mut self, _page: &BoundingBox) -> GraphicsResult<()> {
        Ok(())
    }

    /// Called once after interpretation ends.
    fn finish(&mut self) -> GraphicsResult<()> {
        Ok(())
    }

    /// The device's default user-to-device matrix.
    fn default_matrix(&self) -> Matrix {
        Matrix::IDENTITY
    }

    /// Fill the current path of `state`.
    fn fill(&mut self, state: &GraphicsState, rule: FillRule) -> GraphicsResult<()>;

    /// Stroke the current path of `state`.
    fn stroke(&mut self, state: &GraphicsState) -> GraphicsResult<()>;

    /// Intersect the clip region with `path`.
    fn clip(&mut self, path: &Path, rule: FillRule) -> GraphicsResult<()>;

    /// Reset the clip region to the page (`initclip`).
    fn init_clip(&mut self) -> GraphicsResult<()> {
        Ok(())
    }

    /// Paint a sampled image.
    fn image(&mut self, _image: &Image, _state: &GraphicsState) -> GraphicsResult<()> {
        Ok(())
    }

    /// Paint a smooth shading over the current clip region.
    fn shfill(&mut self, _shading: &Shading, _state: &GraphicsState) -> GraphicsResult<()> {
        Ok(())
    }

    /// Paint a run of text.
    fn show(&mut self, _text: &TextRun, _state: &GraphicsState) -> GraphicsResult<()> {
        Ok(())
    }

    /// Clear the current page (`erasepage`).
    fn erase_page(&mut self) -> GraphicsResult<()> {
        Ok(())
    }

    /// Emit the current page and start a new one (`showpage`).
    fn show_page(&mut self) -> GraphicsResult<()> {
        Ok(())
    }

    /// A `gsave` happened; clips set from now on end at the matching
    /// [`end_scope`](Self::end_scope).
    fn start_scope(&mut self) -> GraphicsResult<()> {
        Ok(())
    }

    /// A `grestore` happened.
    fn end_scope(&mut self) -> GraphicsResult<()> {
        Ok(())
    }

    /// Pages recorded so far, for devices that keep them in memory.
    fn output(&self) -> &[Picture] {
        &[]
    }
}

// ---------------------------------------------------------------------------
// Null device
// ---------------------------------------------------------------------------

/// A device that discards everything (`nulldevice`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDevice;

impl OutputDevice for NullDevice {
    fn fill(&mut self, _state: &GraphicsState, _rule: FillRule) -> GraphicsResult<()> {
        Ok(())
    }

    fn stroke(&mut self, _state: &GraphicsState) -> GraphicsResult<()> {
        Ok(())
    }

    fn clip(&mut self, _path: &Path, _rule: FillRule) -> GraphicsResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// A sampled image as delivered by `image`, `colorimage` or `imagemask`.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    pub space: ColorSpace,
    /// Decode range per component.
    pub decode: Vec<(Scalar, Scalar)>,
    /// Packed samples, rows padded to whole bytes.
    pub data: Vec<u8>,
    /// User space to image space.
    pub matrix: Matrix,
    /// `Some(polarity)` for `imagemask`: paint where the sample bit equals
    /// the polarity.
    pub mask: Option<bool>,
}

impl Image {
    /// Number of color components per sample.
    pub const fn components(&self) -> usize {
        if self.mask.is_some() {
            1
        } else {
            self.space.components()
        }
    }

    /// Bytes per row of packed samples.
    pub fn row_bytes(&self) -> usize {
        let bits = self.width as usize * self.components() * usize::from(self.bits_per_component);
        bits.div_ceil(8)
    }

    /// Total bytes of sample data the image needs.
    pub fn data_len(&self) -> usize {
        self.row_bytes() * self.height as usize
    }

    /// Raw sample value of component `comp` at column `x`, row `y`.
    fn raw_sample(&self, x: u32, y: u32, comp: usize) -> Option<u32> {
        let bpc = usize::from(self.bits_per_component);
        let index = (x as usize * self.components() + comp) * bpc;
        let row = self.row_bytes() * y as usize;
        let byte_at = |i: usize| self.data.get(row + i).copied().map(u32::from);
        match bpc {
            8 => byte_at(index / 8),
            16 => Some((byte_at(index / 8)? << 8) | byte_at(index / 8 + 1)?),
            12 => {
                let byte = index / 8;
                let hi = byte_at(byte)?;
                let lo = byte_at(byte + 1)?;
                let both = (hi << 8) | lo;
                Some(if index % 8 == 0 { both >> 4 } else { both & 0x0fff })
            }
            1 | 2 | 4 => {
                let byte = byte_at(index / 8)?;
                #[expect(clippy::cast_possible_truncation, reason = "shift is below 8")]
                let shift = (8 - bpc - index % 8) as u32;
                Some((byte >> shift) & ((1 << bpc) - 1))
            }
            _ => None,
        }
    }

    /// Decoded component value in [0, 1].
    pub fn sample(&self, x: u32, y: u32, comp: usize) -> Option<Scalar> {
        let raw = self.raw_sample(x, y, comp)?;
        let max = Scalar::from((1u32 << self.bits_per_component) - 1);
        let (d0, d1) = self.decode.get(comp).copied().unwrap_or((0.0, 1.0));
        Some((Scalar::from(raw) / max).mul_add(d1 - d0, d0))
    }

    /// Color of the pixel at (x, y). For masks, `paint` is the current color
    /// and transparent pixels yield `None`.
    pub fn pixel(&self, x: u32, y: u32, paint: Color) -> Option<Color> {
        if let Some(polarity) = self.mask {
            let bit = self.raw_sample(x, y, 0)? != 0;
            return (bit == polarity).then_some(paint);
        }
        let comps: Vec<Scalar> = (0..self.components())
            .map(|c| self.sample(x, y, c))
            .collect::<Option<_>>()?;
        Some(DeviceColor::from_components(self.space, &comps).to_rgb())
    }
}

// ---------------------------------------------------------------------------
// Shadings
// ---------------------------------------------------------------------------

/// Geometry of a smooth shading in shading (user) space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShadingGeometry {
    /// Type 2: color varies along the axis from `from` to `to`.
    Axial { from: Point, to: Point },
    /// Type 3: color varies between two circles.
    Radial {
        c0: Point,
        r0: Scalar,
        c1: Point,
        r1: Scalar,
    },
}

/// A two-color smooth shading (exponential interpolation function).
#[derive(Debug, Clone, PartialEq)]
pub struct Shading {
    pub geometry: ShadingGeometry,
    pub start: DeviceColor,
    pub end: DeviceColor,
    /// Interpolation exponent `N` of the type 2 function.
    pub exponent: Scalar,
    /// Whether to extend beyond the start and end.
    pub extend: (bool, bool),
}

impl Shading {
    /// Color at parameter `t` in [0, 1].
    pub fn color_at(&self, t: Scalar) -> Color {
        let f = t.clamp(0.0, 1.0).powf(self.exponent);
        let a = self.start.to_rgb();
        let b = self.end.to_rgb();
        Color::new(
            (b.r - a.r).mul_add(f, a.r),
            (b.g - a.g).mul_add(f, a.g),
            (b.b - a.b).mul_add(f, a.b),
        )
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// A run of text produced by one `show`-family call.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Decoded text (one char per byte of the shown string).
    pub text: String,
    pub font_name: String,
    /// Text space (1 unit = 1 em, y up, origin at the start point) to
    /// device space.
    pub transform: Matrix,
    /// Total advance in em units.
    pub advance: Scalar,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn gray_image(bits: u8, data: Vec<u8>, width: u32) -> Image {
        Image {
            width,
            height: 1,
            bits_per_component: bits,
            space: ColorSpace::DeviceGray,
            decode: vec![(0.0, 1.0)],
            data,
            matrix: Matrix::IDENTITY,
            mask: None,
        }
    }

    #[test]
    fn row_bytes_rounds_up() {
        let img = gray_image(1, vec![0], 3);
        assert_eq!(img.row_bytes(), 1);
        assert_eq!(img.data_len(), 1);
    }

    #[test]
    fn one_bit_samples() {
        let img = gray_image(1, vec![0b1010_0000], 3);
        assert_eq!(img.sample(0, 0, 0), Some(1.0));
        assert_eq!(img.sample(1, 0, 0), Some(0.0));
        assert_eq!(img.sample(2, 0, 0), Some(1.0));
    }

    #[test]
    fn eight_bit_rgb_pixel() {
        let img = Image {
            space: ColorSpace::DeviceRgb,
            decode: vec![(0.0, 1.0); 3],
            ..gray_image(8, vec![255, 0, 255], 1)
        };
        assert_eq!(img.pixel(0, 0, Color::BLACK), Some(Color::new(1.0, 0.0, 1.0)));
    }

    #[test]
    fn inverted_decode() {
        let img = Image {
            decode: vec![(1.0, 0.0)],
            ..gray_image(8, vec![255], 1)
        };
        assert_eq!(img.sample(0, 0, 0), Some(0.0));
    }

    #[test]
    fn mask_polarity() {
        let img = Image {
            mask: Some(true),
            ..gray_image(1, vec![0b1000_0000], 2)
        };
        let red = Color::new(1.0, 0.0, 0.0);
        assert_eq!(img.pixel(0, 0, red), Some(red));
        assert_eq!(img.pixel(1, 0, red), None);
    }

    #[test]
    fn short_data_yields_none() {
        let img = gray_image(8, vec![], 1);
        assert_eq!(img.sample(0, 0, 0), None);
    }

    #[test]
    fn shading_interpolates() {
        let sh = Shading {
            geometry: ShadingGeometry::Axial {
                from: Point::ZERO,
                to: Point::new(1.0, 0.0),
            },
            start: DeviceColor::Gray(0.0),
            end: DeviceColor::Gray(1.0),
            exponent: 1.0,
            extend: (false, false),
        };
        assert_eq!(sh.color_at(0.5), Color::new(0.5, 0.5, 0.5));
    }
}
