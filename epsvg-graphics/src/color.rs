//! Device color spaces.
//!
//! The graphics state keeps the color in the space it was set in so that
//! `currentgray`, `currentrgbcolor` and `currentcmykcolor` can report it
//! back; renderers only ever see the RGB conversion.

use crate::types::{Color, Scalar};

/// Family of a device color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
}

impl ColorSpace {
    /// Number of components a color in this space has.
    pub const fn components(self) -> usize {
        match self {
            Self::DeviceGray => 1,
            Self::DeviceRgb => 3,
            Self::DeviceCmyk => 4,
        }
    }

    /// PostScript family name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::DeviceGray => "DeviceGray",
            Self::DeviceRgb => "DeviceRGB",
            Self::DeviceCmyk => "DeviceCMYK",
        }
    }

    /// The initial color of this space (black).
    pub const fn initial_color(self) -> DeviceColor {
        match self {
            Self::DeviceGray => DeviceColor::Gray(0.0),
            Self::DeviceRgb => DeviceColor::Rgb(0.0, 0.0, 0.0),
            Self::DeviceCmyk => DeviceColor::Cmyk(0.0, 0.0, 0.0, 1.0),
        }
    }
}

/// A color value in one of the device color spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceColor {
    Gray(Scalar),
    Rgb(Scalar, Scalar, Scalar),
    Cmyk(Scalar, Scalar, Scalar, Scalar),
}

impl Default for DeviceColor {
    fn default() -> Self {
        Self::Gray(0.0)
    }
}

impl DeviceColor {
    /// Build from a space and its components, clamping each to [0, 1].
    /// Missing components default to zero.
    pub fn from_components(space: ColorSpace, comps: &[Scalar]) -> Self {
        let c = |i: usize| comps.get(i).copied().unwrap_or(0.0).clamp(0.0, 1.0);
        match space {
            ColorSpace::DeviceGray => Self::Gray(c(0)),
            ColorSpace::DeviceRgb => Self::Rgb(c(0), c(1), c(2)),
            ColorSpace::DeviceCmyk => Self::Cmyk(c(0), c(1), c(2), c(3)),
        }
    }

    pub const fn space(&self) -> ColorSpace {
        match self {
            Self::Gray(_) => ColorSpace::DeviceGray,
            Self::Rgb(..) => ColorSpace::DeviceRgb,
            Self::Cmyk(..) => ColorSpace::DeviceCmyk,
        }
    }

    /// Components in the color's own space.
    pub fn components(&self) -> Vec<Scalar> {
        match *self {
            Self::Gray(g) => vec![g],
            Self::Rgb(r, g, b) => vec![r, g, b],
            Self::Cmyk(c, m, y, k) => vec![c, m, y, k],
        }
    }

    /// Convert to RGB.
    pub fn to_rgb(&self) -> Color {
        match *self {
            Self::Gray(g) => Color::new(g, g, g),
            Self::Rgb(r, g, b) => Color::new(r, g, b),
            Self::Cmyk(c, m, y, k) => Color::new(
                1.0 - (c + k).min(1.0),
                1.0 - (m + k).min(1.0),
                1.0 - (y + k).min(1.0),
            ),
        }
    }

    /// Convert to a gray level using the NTSC weights.
    pub fn to_gray(&self) -> Scalar {
        match *self {
            Self::Gray(g) => g,
            Self::Cmyk(c, m, y, k) => {
                1.0 - (0.11f64.mul_add(y, 0.3f64.mul_add(c, 0.59 * m)) + k).min(1.0)
            }
            Self::Rgb(..) => {
                let Color { r, g, b } = self.to_rgb();
                0.11f64.mul_add(b, 0.3f64.mul_add(r, 0.59 * g))
            }
        }
    }

    /// Convert to CMYK with full black generation and undercolor removal.
    pub fn to_cmyk(&self) -> (Scalar, Scalar, Scalar, Scalar) {
        if let Self::Cmyk(c, m, y, k) = *self {
            return (c, m, y, k);
        }
        let Color { r, g, b } = self.to_rgb();
        let (c, m, y) = (1.0 - r, 1.0 - g, 1.0 - b);
        let k = c.min(m).min(y);
        (c - k, m - k, y - k, k)
    }

    /// Convert to hue, saturation, brightness.
    pub fn to_hsb(&self) -> (Scalar, Scalar, Scalar) {
        let Color { r, g, b } = self.to_rgb();
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        let brightness = max;
        let saturation = if max > 0.0 { delta / max } else { 0.0 };
        if delta == 0.0 {
            return (0.0, saturation, brightness);
        }
        let sextant = if (max - r).abs() < Scalar::EPSILON {
            (g - b) / delta
        } else if (max - g).abs() < Scalar::EPSILON {
            2.0 + (b - r) / delta
        } else {
            4.0 + (r - g) / delta
        };
        let mut hue = sextant / 6.0;
        if hue < 0.0 {
            hue += 1.0;
        }
        (hue, saturation, brightness)
    }

    /// Build an RGB color from hue, saturation, brightness.
    pub fn from_hsb(h: Scalar, s: Scalar, v: Scalar) -> Self {
        let h = h.clamp(0.0, 1.0);
        let s = s.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        let sector = (h * 6.0).floor();
        let f = h.mul_add(6.0, -sector);
        let p = v * (1.0 - s);
        let q = v * s.mul_add(-f, 1.0);
        let t = v * s.mul_add(-(1.0 - f), 1.0);
        #[expect(clippy::cast_possible_truncation, reason = "sector is in 0..=6")]
        let (r, g, b) = match sector as i64 % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Self::Rgb(r, g, b)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn gray_to_rgb() {
        assert_eq!(DeviceColor::Gray(0.5).to_rgb(), Color::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn cmyk_black_is_black() {
        assert_eq!(
            DeviceColor::Cmyk(0.0, 0.0, 0.0, 1.0).to_rgb(),
            Color::BLACK
        );
    }

    #[test]
    fn rgb_to_cmyk_extracts_black() {
        let (c, m, y, k) = DeviceColor::Rgb(0.0, 0.0, 0.0).to_cmyk();
        assert_eq!((c, m, y, k), (0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn hsb_roundtrip_red() {
        let red = DeviceColor::from_hsb(0.0, 1.0, 1.0);
        assert_eq!(red, DeviceColor::Rgb(1.0, 0.0, 0.0));
        let (h, s, b) = red.to_hsb();
        assert_eq!((h, s, b), (0.0, 1.0, 1.0));
    }

    #[test]
    fn from_components_clamps() {
        let c = DeviceColor::from_components(ColorSpace::DeviceRgb, &[2.0, -1.0]);
        assert_eq!(c, DeviceColor::Rgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn ntsc_gray_of_white() {
        assert!((DeviceColor::Rgb(1.0, 1.0, 1.0).to_gray() - 1.0).abs() < 1e-12);
    }
}
