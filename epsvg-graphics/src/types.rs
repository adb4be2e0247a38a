//! Core types shared across the `epsvg` system.
//!
//! Scalars, points, colors and line-style attributes used by the graphics
//! state, the output devices and the SVG renderer.

pub use kurbo::{Point, Vec2};

// ---------------------------------------------------------------------------
// Scalar
// ---------------------------------------------------------------------------

/// Convenience alias for all coordinates and real-valued parameters.
pub type Scalar = f64;

/// Tolerance for floating-point comparisons.
pub const EPSILON: Scalar = 1e-9;

/// Convert degrees to radians.
#[inline]
pub const fn deg_to_rad(deg: Scalar) -> Scalar {
    deg.to_radians()
}

/// Convert radians to degrees.
#[inline]
pub const fn rad_to_deg(rad: Scalar) -> Scalar {
    rad.to_degrees()
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// RGB color with components in [0, 1], as handed to renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: Scalar,
    pub g: Scalar,
    pub b: Scalar,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    #[inline]
    pub const fn new(r: Scalar, g: Scalar, b: Scalar) -> Self {
        Self { r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

// ---------------------------------------------------------------------------
// LineCap / LineJoin
// ---------------------------------------------------------------------------

/// Stroke line-cap styles (`setlinecap` codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt = 0,
    Round = 1,
    Square = 2,
}

impl LineCap {
    /// Decode a `setlinecap` operand. Returns `None` outside 0..=2.
    pub const fn from_code(v: i64) -> Option<Self> {
        match v {
            0 => Some(Self::Butt),
            1 => Some(Self::Round),
            2 => Some(Self::Square),
            _ => None,
        }
    }
}

/// Stroke line-join styles (`setlinejoin` codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter = 0,
    Round = 1,
    Bevel = 2,
}

impl LineJoin {
    /// Decode a `setlinejoin` operand. Returns `None` outside 0..=2.
    pub const fn from_code(v: i64) -> Option<Self> {
        match v {
            0 => Some(Self::Miter),
            1 => Some(Self::Round),
            2 => Some(Self::Bevel),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// DashPattern
// ---------------------------------------------------------------------------

/// A dash pattern: alternating on/off lengths with an offset.
///
/// An empty `dashes` vector means a solid line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashPattern {
    /// Alternating on, off, on, off, ... lengths.
    pub dashes: Vec<Scalar>,
    /// Starting offset into the pattern.
    pub offset: Scalar,
}

impl DashPattern {
    /// A solid line.
    pub const fn solid() -> Self {
        Self {
            dashes: Vec::new(),
            offset: 0.0,
        }
    }

    /// Whether this pattern draws a solid line.
    pub fn is_solid(&self) -> bool {
        self.dashes.is_empty()
    }

    /// Scale every length (used to map user-space dashes to device space).
    #[must_use]
    pub fn scaled(&self, factor: Scalar) -> Self {
        Self {
            dashes: self.dashes.iter().map(|d| d * factor).collect(),
            offset: self.offset * factor,
        }
    }
}

// ---------------------------------------------------------------------------
// LineStyle
// ---------------------------------------------------------------------------

/// All stroke attributes of the graphics state.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    /// Line width in user space.
    pub width: Scalar,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: Scalar,
    pub dash: DashPattern,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: DashPattern::solid(),
        }
    }
}

// ---------------------------------------------------------------------------
// FillRule
// ---------------------------------------------------------------------------

/// Insideness rule for fills and clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    /// `fill`, `clip`.
    #[default]
    NonZero,
    /// `eofill`, `eoclip`.
    EvenOdd,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn color_defaults() {
        assert_eq!(Color::default(), Color::BLACK);
        assert_eq!(Color::WHITE, Color::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn linecap_from_code() {
        assert_eq!(LineCap::from_code(0), Some(LineCap::Butt));
        assert_eq!(LineCap::from_code(1), Some(LineCap::Round));
        assert_eq!(LineCap::from_code(2), Some(LineCap::Square));
        assert_eq!(LineCap::from_code(3), None);
    }

    #[test]
    fn linejoin_from_code() {
        assert_eq!(LineJoin::from_code(0), Some(LineJoin::Miter));
        assert_eq!(LineJoin::from_code(2), Some(LineJoin::Bevel));
        assert_eq!(LineJoin::from_code(-1), None);
    }

    #[test]
    fn line_style_defaults_match_initgraphics() {
        let style = LineStyle::default();
        assert_eq!(style.width, 1.0);
        assert_eq!(style.miter_limit, 10.0);
        assert!(style.dash.is_solid());
    }

    #[test]
    fn dash_scaling() {
        let dash = DashPattern {
            dashes: vec![3.0, 1.0],
            offset: 0.5,
        };
        let s = dash.scaled(2.0);
        assert_eq!(s.dashes, vec![6.0, 2.0]);
        assert_eq!(s.offset, 1.0);
    }

    #[test]
    fn deg_rad_roundtrip() {
        let deg = 45.0;
        let rad = deg_to_rad(deg);
        assert!((deg - rad_to_deg(rad)).abs() < EPSILON);
    }
}
