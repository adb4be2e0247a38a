//! Decode filters.
//!
//! Every decoder works on a complete byte slice and stops at its
//! end-of-data marker. [`Decoded::consumed`] tells the caller how far to
//! advance the source, so a filter over `currentfile` leaves the program
//! text positioned right after the encoded data. The scanner reuses the
//! hex and ASCII85 decoders for `<...>` and `<~...~>` strings.

use crate::error::{ErrorKind, InterpreterError};

/// Malformed filter input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at byte {offset}")]
pub struct DecodeError {
    pub message: String,
    /// Input offset just past the offending byte.
    pub offset: usize,
}

impl DecodeError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

impl From<DecodeError> for InterpreterError {
    fn from(err: DecodeError) -> Self {
        Self::new(ErrorKind::IoError, err.to_string())
    }
}

/// Decoder output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub data: Vec<u8>,
    /// Input bytes used, the end-of-data marker included.
    pub consumed: usize,
    /// The end-of-data marker was found. Otherwise the input ran out first.
    pub finished: bool,
}

/// A decode filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    AsciiHex,
    Ascii85,
    RunLength,
    /// Pass bytes through up to the `count + 1`-th occurrence of `eod`.
    /// With an empty `eod`, pass `count` bytes, or everything when `count`
    /// is zero.
    SubFile { count: usize, eod: Vec<u8> },
}

impl Filter {
    pub fn decode(&self, input: &[u8]) -> Result<Decoded, DecodeError> {
        match self {
            Self::AsciiHex => ascii_hex(input),
            Self::Ascii85 => ascii85(input),
            Self::RunLength => Ok(run_length(input)),
            Self::SubFile { count, eod } => Ok(sub_file(input, *count, eod)),
        }
    }
}

pub(crate) const fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0)
}

pub(crate) const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Hex digit pairs up to `>`. Whitespace is skipped and an odd final
/// digit is padded with zero.
pub fn ascii_hex(input: &[u8]) -> Result<Decoded, DecodeError> {
    let mut out = Decoded {
        consumed: input.len(),
        ..Decoded::default()
    };
    let mut high: Option<u8> = None;
    for (i, &c) in input.iter().enumerate() {
        if c == b'>' {
            out.consumed = i + 1;
            out.finished = true;
            break;
        }
        if is_whitespace(c) {
            continue;
        }
        let v = hex_value(c).ok_or_else(|| {
            DecodeError::new(format!("invalid hex digit {:?}", char::from(c)), i + 1)
        })?;
        match high.take() {
            Some(h) => out.data.push((h << 4) | v),
            None => high = Some(v),
        }
    }
    if let Some(h) = high {
        out.data.push(h << 4);
    }
    Ok(out)
}

fn decode85(group: &[u8; 5], offset: usize) -> Result<[u8; 4], DecodeError> {
    let value = group
        .iter()
        .try_fold(0u64, |acc, &d| Some(acc * 85 + u64::from(d)))
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| DecodeError::new("ASCII85 group out of range", offset))?;
    Ok(value.to_be_bytes())
}

/// Base-85 groups up to `~>`. `z` stands for four zero bytes.
pub fn ascii85(input: &[u8]) -> Result<Decoded, DecodeError> {
    let mut out = Decoded {
        consumed: input.len(),
        ..Decoded::default()
    };
    let mut group = [0u8; 5];
    let mut n = 0usize;
    let mut i = 0;
    while let Some(&c) = input.get(i) {
        i += 1;
        match c {
            b'~' => {
                match input.get(i) {
                    Some(b'>') => {
                        out.consumed = i + 1;
                        out.finished = true;
                    }
                    // The marker may be split across reads.
                    None => out.consumed = i - 1,
                    Some(_) => return Err(DecodeError::new("bad ASCII85 terminator", i + 1)),
                }
                break;
            }
            b'z' if n == 0 => out.data.extend_from_slice(&[0; 4]),
            b'!'..=b'u' => {
                group[n] = c - b'!';
                n += 1;
                if n == 5 {
                    out.data.extend_from_slice(&decode85(&group, i)?);
                    n = 0;
                }
            }
            c if is_whitespace(c) => {}
            _ => {
                return Err(DecodeError::new(
                    format!("invalid ASCII85 character {:?}", char::from(c)),
                    i,
                ));
            }
        }
    }
    match n {
        0 => {}
        1 => return Err(DecodeError::new("truncated ASCII85 group", i)),
        _ => {
            let mut padded = [84u8; 5];
            padded[..n].copy_from_slice(&group[..n]);
            let bytes = decode85(&padded, i)?;
            out.data.extend_from_slice(&bytes[..n - 1]);
        }
    }
    Ok(out)
}

/// Length-prefixed runs: 0-127 copy that many bytes plus one, 129-255
/// repeat the next byte 257 minus the length times, 128 ends the data.
/// A run cut short by the end of input is left unconsumed.
pub fn run_length(input: &[u8]) -> Decoded {
    let mut out = Decoded::default();
    let mut i = 0;
    while let Some(&len) = input.get(i) {
        match len {
            128 => {
                out.consumed = i + 1;
                out.finished = true;
                return out;
            }
            0..=127 => {
                let n = usize::from(len) + 1;
                let Some(run) = input.get(i + 1..i + 1 + n) else {
                    break;
                };
                out.data.extend_from_slice(run);
                i += 1 + n;
            }
            _ => {
                let Some(&b) = input.get(i + 1) else {
                    break;
                };
                out.data.resize(out.data.len() + 257 - usize::from(len), b);
                i += 2;
            }
        }
    }
    out.consumed = i;
    out
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// The `SubFileDecode` pass-through. The terminating `eod` is consumed but
/// not passed on.
pub fn sub_file(input: &[u8], count: usize, eod: &[u8]) -> Decoded {
    if eod.is_empty() {
        let n = if count == 0 { input.len() } else { count.min(input.len()) };
        return Decoded {
            data: input[..n].to_vec(),
            consumed: n,
            finished: count > 0 && n == count,
        };
    }
    let mut seen = 0;
    let mut from = 0;
    while let Some(at) = find(&input[from..], eod) {
        let end = from + at;
        if seen == count {
            return Decoded {
                data: input[..end].to_vec(),
                consumed: end + eod.len(),
                finished: true,
            };
        }
        seen += 1;
        from = end + eod.len();
    }
    Decoded {
        data: input.to_vec(),
        consumed: input.len(),
        finished: false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_stops_at_the_marker() {
        let d = ascii_hex(b"48 65\n6c6C 6f> rest").unwrap();
        assert_eq!(d.data, b"Hello");
        assert_eq!(d.consumed, 14);
        assert!(d.finished);
        assert_eq!(ascii_hex(b"414>").unwrap().data, [0x41, 0x40]);
        assert!(ascii_hex(b"4G>").is_err());
    }

    #[test]
    fn ascii85_decodes_groups_and_z() {
        let d = ascii85(b"87cURD]i,\"Ebo80~>tail").unwrap();
        assert_eq!(d.data, b"Hello World!");
        assert_eq!(d.consumed, 17);
        assert!(d.finished);
        assert_eq!(ascii85(b"z~>").unwrap().data, [0, 0, 0, 0]);
        assert!(ascii85(b"ab~x").is_err());
        assert!(ascii85(b"a~>").is_err());
    }

    #[test]
    fn ascii85_without_marker_decodes_what_is_there() {
        let d = ascii85(b"87cURD]i,\"Ebo80~").unwrap();
        assert_eq!(d.data, b"Hello World!");
        assert!(!d.finished);
        assert_eq!(d.consumed, 15);
    }

    #[test]
    fn run_length_literals_and_repeats() {
        let d = run_length(&[2, b'a', b'b', b'c', 254, b'x', 128, 9]);
        assert_eq!(d.data, b"abcxxx");
        assert_eq!(d.consumed, 7);
        assert!(d.finished);
        let cut = run_length(&[0, b'a', 3, b'b']);
        assert_eq!(cut.data, b"a");
        assert_eq!(cut.consumed, 2);
        assert!(!cut.finished);
    }

    #[test]
    fn sub_file_counts_markers() {
        let d = sub_file(b"a%%b%%c%%d", 1, b"%%");
        assert_eq!(d.data, b"a%%b");
        assert_eq!(d.consumed, 6);
        assert!(d.finished);
        assert_eq!(sub_file(b"abcdef", 4, b"").data, b"abcd");
        assert_eq!(sub_file(b"abcdef", 0, b"").data, b"abcdef");
        assert!(!sub_file(b"abc", 0, b"%%").finished);
    }
}
