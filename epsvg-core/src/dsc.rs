//! Document Structuring Convention header scanning.
//!
//! Only the leading block of `%` lines is examined. `%%HiResBoundingBox`
//! and `%%ExactBoundingBox` win over `%%BoundingBox` regardless of order.
//! DOS EPS binaries (magic `C5 D0 D3 C6`) carry the PostScript section at
//! an offset given in the header; [`postscript_section`] extracts it.

use epsvg_graphics::bbox::BoundingBox;

/// Magic bytes of a DOS EPS binary header.
const DOS_EPS_MAGIC: [u8; 4] = [0xC5, 0xD0, 0xD3, 0xC6];

/// Comments found in the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DscHeader {
    pub bounding_box: Option<BoundingBox>,
    pub title: Option<String>,
    pub creator: Option<String>,
}

fn parse_box(value: &str) -> Option<BoundingBox> {
    let nums: Vec<f64> = value
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match nums[..] {
        [x0, y0, x1, y1] => Some(BoundingBox::new(x0, y0, x1, y1)),
        _ => None,
    }
}

impl DscHeader {
    /// Scan the comment header of `src`.
    #[must_use]
    pub fn scan(src: &[u8]) -> Self {
        let mut header = Self::default();
        let mut precise = false;
        for line in src.split(|&c| matches!(c, b'\n' | b'\r' | 0x0C)) {
            if line.is_empty() {
                continue;
            }
            if line[0] != b'%' {
                break;
            }
            let text = String::from_utf8_lossy(line);
            let Some(rest) = text.strip_prefix("%%") else {
                continue;
            };
            let (key, value) = rest.split_once(':').unwrap_or((rest, ""));
            let value = value.trim();
            match key.to_ascii_lowercase().as_str() {
                "hiresboundingbox" | "exactboundingbox" => {
                    if let Some(b) = parse_box(value) {
                        header.bounding_box = Some(b);
                        precise = true;
                    }
                }
                "boundingbox" if !precise => {
                    if let Some(b) = parse_box(value) {
                        header.bounding_box = Some(b);
                    }
                }
                "title" => header.title = Some(value.to_owned()),
                "creator" => header.creator = Some(value.to_owned()),
                _ => {}
            }
        }
        header
    }
}

fn read_u32_le(src: &[u8], at: usize) -> Option<usize> {
    let bytes: [u8; 4] = src.get(at..at + 4)?.try_into().ok()?;
    usize::try_from(u32::from_le_bytes(bytes)).ok()
}

/// The PostScript part of `src`: the whole input, or for a DOS EPS binary
/// the section its header points at. `None` if the binary header is
/// inconsistent.
#[must_use]
pub fn postscript_section(src: &[u8]) -> Option<&[u8]> {
    if !src.starts_with(&DOS_EPS_MAGIC) {
        return Some(src);
    }
    let start = read_u32_le(src, 4)?;
    let len = read_u32_le(src, 8)?;
    tracing::debug!(start, len, "DOS EPS binary header");
    src.get(start..start.checked_add(len)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn hires_box_wins() {
        let src = b"%!PS-Adobe-3.0 EPSF-3.0\n%%HiResBoundingBox: 0.5 1.5 10.25 20\n%%BoundingBox: 0 1 11 20\n%%EndComments\n0 0 moveto";
        let h = DscHeader::scan(src);
        let b = h.bounding_box.unwrap();
        assert_eq!(b.min_x, 0.5);
        assert_eq!(b.max_x, 10.25);
    }

    #[test]
    fn plain_box_and_title() {
        let src = b"%!PS\r\n%%Title: test figure\r\n%%BoundingBox: 0 0 100 50\r\n";
        let h = DscHeader::scan(src);
        assert_eq!(h.title.as_deref(), Some("test figure"));
        assert_eq!(h.bounding_box.unwrap().max_y, 50.0);
    }

    #[test]
    fn header_ends_at_first_code_line() {
        let src = b"%!PS\nnewpath\n%%BoundingBox: 0 0 1 1\n";
        assert!(DscHeader::scan(src).bounding_box.is_none());
    }

    #[test]
    fn malformed_box_is_ignored() {
        let src = b"%%BoundingBox: (atend)\n";
        assert!(DscHeader::scan(src).bounding_box.is_none());
    }

    #[test]
    fn dos_eps_section() {
        let mut src = DOS_EPS_MAGIC.to_vec();
        src.extend_from_slice(&32u32.to_le_bytes());
        src.extend_from_slice(&4u32.to_le_bytes());
        src.resize(32, 0);
        src.extend_from_slice(b"%!PS trailing");
        assert_eq!(postscript_section(&src).unwrap(), b"%!PS");
        assert_eq!(postscript_section(b"%!PS").unwrap(), b"%!PS");
    }
}
