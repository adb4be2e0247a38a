//! Lexical scanner for PostScript source.
//!
//! The scanner works over a byte slice and a cursor so that executable
//! strings and files can be tokenized lazily, one token at a time, with the
//! interpreter keeping the unread remainder.
//!
//! # Token production rules
//!
//! | Input                     | Token produced                     |
//! |---------------------------|------------------------------------|
//! | `42`, `-7`, `16#FF`       | `Integer`                          |
//! | `1.5`, `.5`, `-3e4`, `1.` | `Real`                             |
//! | `(text)`, `<48 49>`, `<~87cURD]i,"Ebo80~>` | `String`          |
//! | `name`, `[`, `]`, `<<`, `>>` | `Name`                          |
//! | `/name`                   | `LiteralName`                      |
//! | `//name`                  | `ImmediateName`                    |
//! | `{ ... }`                 | `Procedure` with nested tokens     |
//! | `% comment`               | Skipped to end of line             |

use crate::error::{ErrorKind, InterpreterError};
use crate::filter::{self, DecodeError, Decoded, is_whitespace};
use crate::token::{Span, Token, TokenKind};

// ---------------------------------------------------------------------------
// Character classes
// ---------------------------------------------------------------------------

const fn is_delimiter(c: u8) -> bool {
    matches!(
        c,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

const fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

// ---------------------------------------------------------------------------
// Scanner error
// ---------------------------------------------------------------------------

/// An error encountered during scanning. Always a `syntaxerror`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("scan error at {}-{}: {message}", span.start, span.end)]
pub struct ScanError {
    pub message: String,
    pub span: Span,
}

impl ScanError {
    fn new(message: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            message: message.into(),
            span: Span::new(start, end),
        }
    }
}

impl From<ScanError> for InterpreterError {
    fn from(err: ScanError) -> Self {
        Self::new(ErrorKind::SyntaxError, err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Lexical scanner over a byte slice.
pub struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub const fn new(src: &'a [u8]) -> Self {
        Self { src, pos: 0 }
    }

    /// Start scanning at byte offset `pos`.
    #[must_use]
    pub const fn at(src: &'a [u8], pos: usize) -> Self {
        Self { src, pos }
    }

    /// Byte offset of the next unread character.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Scan the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, ScanError> {
        self.skip_whitespace_and_comments();
        let Some(&c) = self.src.get(self.pos) else {
            return Ok(None);
        };
        let start = self.pos;
        let kind = match c {
            b'(' => {
                self.pos += 1;
                TokenKind::String(self.scan_literal_string(start)?)
            }
            b'<' => self.scan_angle(start)?,
            b'>' => {
                self.pos += 1;
                if self.peek() == Some(b'>') {
                    self.pos += 1;
                    TokenKind::Name(">>".into())
                } else {
                    return Err(ScanError::new("unexpected '>'", start, self.pos));
                }
            }
            b'[' | b']' => {
                self.pos += 1;
                TokenKind::Name(vec![c])
            }
            b'{' => {
                self.pos += 1;
                TokenKind::Procedure(self.scan_procedure(start)?)
            }
            b'}' => {
                self.pos += 1;
                return Err(ScanError::new("unmatched '}'", start, self.pos));
            }
            b')' => {
                self.pos += 1;
                return Err(ScanError::new("unmatched ')'", start, self.pos));
            }
            b'/' => {
                self.pos += 1;
                let immediate = self.peek() == Some(b'/');
                if immediate {
                    self.pos += 1;
                }
                let name = self.take_regular();
                self.skip_one_whitespace();
                if immediate {
                    TokenKind::ImmediateName(name)
                } else {
                    TokenKind::LiteralName(name)
                }
            }
            _ => {
                let text = self.take_regular();
                self.skip_one_whitespace();
                std::str::from_utf8(&text)
                    .ok()
                    .and_then(parse_number)
                    .unwrap_or(TokenKind::Name(text))
            }
        };
        Ok(Some(Token {
            kind,
            span: Span::new(start, self.pos),
        }))
    }

    /// Scan all remaining tokens.
    pub fn scan_all(&mut self) -> Result<Vec<Token>, ScanError> {
        let mut tokens = Vec::new();
        while let Some(tok) = self.next_token()? {
            tokens.push(tok);
        }
        Ok(tokens)
    }

    // -- internal helpers --

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(c) = self.peek() {
            if is_whitespace(c) {
                self.pos += 1;
            } else if c == b'%' {
                while let Some(c) = self.peek() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    /// Consume the single whitespace character that terminates a name or
    /// number (CR LF counts as one).
    fn skip_one_whitespace(&mut self) {
        match self.peek() {
            Some(b'\r') => {
                self.pos += 1;
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
            }
            Some(c) if is_whitespace(c) => self.pos += 1,
            _ => {}
        }
    }

    fn take_regular(&mut self) -> Vec<u8> {
        let start = self.pos;
        while self.peek().is_some_and(is_regular) {
            self.pos += 1;
        }
        self.src[start..self.pos].to_vec()
    }

    /// Body of a `(...)` string; the opening parenthesis is consumed.
    fn scan_literal_string(&mut self, start: usize) -> Result<Vec<u8>, ScanError> {
        let mut out = Vec::new();
        let mut depth = 0usize;
        loop {
            let Some(c) = self.peek() else {
                return Err(ScanError::new("unterminated string", start, self.pos));
            };
            self.pos += 1;
            match c {
                b'(' => {
                    depth += 1;
                    out.push(c);
                }
                b')' => {
                    if depth == 0 {
                        return Ok(out);
                    }
                    depth -= 1;
                    out.push(c);
                }
                b'\r' => {
                    if self.peek() == Some(b'\n') {
                        self.pos += 1;
                    }
                    out.push(b'\n');
                }
                b'\\' => self.scan_escape(&mut out),
                _ => out.push(c),
            }
        }
    }

    fn scan_escape(&mut self, out: &mut Vec<u8>) {
        let Some(c) = self.peek() else {
            return;
        };
        self.pos += 1;
        match c {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'\n' => {}
            b'\r' => {
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
            }
            b'0'..=b'7' => {
                let mut value = u32::from(c - b'0');
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                #[expect(clippy::cast_possible_truncation, reason = "high-order overflow is ignored")]
                out.push((value & 0xFF) as u8);
            }
            // `\\`, `\(`, `\)` and unknown escapes yield the character.
            _ => out.push(c),
        }
    }

    /// `<` starts a hex string, an ASCII85 string or the `<<` name.
    fn scan_angle(&mut self, start: usize) -> Result<TokenKind, ScanError> {
        self.pos += 1;
        match self.peek() {
            Some(b'<') => {
                self.pos += 1;
                Ok(TokenKind::Name("<<".into()))
            }
            Some(b'~') => {
                self.pos += 1;
                let body = self.scan_encoded(start, filter::ascii85, "ASCII85 string")?;
                Ok(TokenKind::String(body))
            }
            _ => {
                let body = self.scan_encoded(start, filter::ascii_hex, "hex string")?;
                Ok(TokenKind::String(body))
            }
        }
    }

    /// Decode a `<...>` or `<~...~>` body with `decode`, which must find
    /// its closing marker.
    fn scan_encoded(
        &mut self,
        start: usize,
        decode: fn(&[u8]) -> Result<Decoded, DecodeError>,
        what: &str,
    ) -> Result<Vec<u8>, ScanError> {
        let rest = self.src.get(self.pos..).unwrap_or_default();
        let decoded =
            decode(rest).map_err(|e| ScanError::new(e.message, start, self.pos + e.offset))?;
        self.pos += decoded.consumed;
        if !decoded.finished {
            return Err(ScanError::new(format!("unterminated {what}"), start, self.pos));
        }
        Ok(decoded.data)
    }

    /// Tokens up to the matching `}`; the opening brace is consumed.
    fn scan_procedure(&mut self, start: usize) -> Result<Vec<Token>, ScanError> {
        let mut body = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            match self.peek() {
                None => return Err(ScanError::new("unterminated procedure", start, self.pos)),
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(body);
                }
                Some(_) => {
                    if let Some(tok) = self.next_token()? {
                        body.push(tok);
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Parse a regular-character run as a number, or `None` if it is a name.
fn parse_number(text: &str) -> Option<TokenKind> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    if let Some(hash) = text.find('#') {
        return parse_radix(&text[..hash], &text[hash + 1..]);
    }
    let digits = bytes
        .strip_prefix(b"+")
        .or_else(|| bytes.strip_prefix(b"-"))
        .unwrap_or(bytes);
    if digits.is_empty() {
        return None;
    }
    if digits.iter().all(u8::is_ascii_digit) {
        return Some(
            text.parse::<i64>()
                .map_or_else(|_| TokenKind::Real(text.parse().unwrap_or(0.0)), TokenKind::Integer),
        );
    }
    if is_real_syntax(digits) {
        return text.parse::<f64>().ok().map(TokenKind::Real);
    }
    None
}

/// `digits [. digits] [e [sign] digits]` with at least one digit in the
/// mantissa and either a point or an exponent.
fn is_real_syntax(s: &[u8]) -> bool {
    let mut i = 0;
    let int_digits = s.iter().take_while(|c| c.is_ascii_digit()).count();
    i += int_digits;
    let mut frac_digits = 0;
    let mut has_point = false;
    if s.get(i) == Some(&b'.') {
        has_point = true;
        i += 1;
        frac_digits = s[i..].iter().take_while(|c| c.is_ascii_digit()).count();
        i += frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return false;
    }
    let mut has_exp = false;
    if matches!(s.get(i), Some(b'e' | b'E')) {
        has_exp = true;
        i += 1;
        if matches!(s.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_digits = s[i..].iter().take_while(|c| c.is_ascii_digit()).count();
        if exp_digits == 0 {
            return false;
        }
        i += exp_digits;
    }
    i == s.len() && (has_point || has_exp)
}

fn parse_radix(base: &str, digits: &str) -> Option<TokenKind> {
    let radix: u32 = base.parse().ok()?;
    if !(2..=36).contains(&radix) || digits.is_empty() {
        return None;
    }
    i64::from_str_radix(digits, radix)
        .ok()
        .filter(|_| digits.bytes().all(|c| c.is_ascii_alphanumeric()))
        .map(TokenKind::Integer)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Scanner::new(src.as_bytes())
            .scan_all()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("42 -7 +3 1.5 .5 -3e2 1. 16#FF 2#101"),
            vec![
                TokenKind::Integer(42),
                TokenKind::Integer(-7),
                TokenKind::Integer(3),
                TokenKind::Real(1.5),
                TokenKind::Real(0.5),
                TokenKind::Real(-300.0),
                TokenKind::Real(1.0),
                TokenKind::Integer(255),
                TokenKind::Integer(5),
            ]
        );
    }

    #[test]
    fn integer_overflow_becomes_real() {
        assert_eq!(
            kinds("99999999999999999999"),
            vec![TokenKind::Real(1e20)]
        );
    }

    #[test]
    fn number_like_names() {
        assert_eq!(
            kinds("1a - e5 37#1"),
            vec![
                TokenKind::Name("1a".into()),
                TokenKind::Name("-".into()),
                TokenKind::Name("e5".into()),
                TokenKind::Name("37#1".into()),
            ]
        );
    }

    #[test]
    fn names_and_delimiters() {
        assert_eq!(
            kinds("/abc //def ghi[1]<</k 2>>"),
            vec![
                TokenKind::LiteralName("abc".into()),
                TokenKind::ImmediateName("def".into()),
                TokenKind::Name("ghi".into()),
                TokenKind::Name("[".into()),
                TokenKind::Integer(1),
                TokenKind::Name("]".into()),
                TokenKind::Name("<<".into()),
                TokenKind::LiteralName("k".into()),
                TokenKind::Integer(2),
                TokenKind::Name(">>".into()),
            ]
        );
    }

    #[test]
    fn names_keep_raw_bytes() {
        let toks = Scanner::new(b"/\x80a \x81").scan_all().unwrap();
        assert_eq!(toks[0].kind, TokenKind::LiteralName(vec![0x80, b'a']));
        assert_eq!(toks[1].kind, TokenKind::Name(vec![0x81]));
    }

    #[test]
    fn literal_strings() {
        assert_eq!(
            kinds(r"(a(b)c) (\n\101\\\)) (x\
y)"),
            vec![
                TokenKind::String(b"a(b)c".to_vec()),
                TokenKind::String(b"\nA\\)".to_vec()),
                TokenKind::String(b"xy".to_vec()),
            ]
        );
    }

    #[test]
    fn hex_and_ascii85_strings() {
        assert_eq!(
            kinds("<48 65 6c6C 6f> <414> <~87cURD]i,\"Ebo80~> <~z~>"),
            vec![
                TokenKind::String(b"Hello".to_vec()),
                TokenKind::String(vec![0x41, 0x40]),
                TokenKind::String(b"Hello World!".to_vec()),
                TokenKind::String(vec![0, 0, 0, 0]),
            ]
        );
    }

    #[test]
    fn nested_procedures() {
        let toks = kinds("{1 {2} add}");
        let TokenKind::Procedure(body) = &toks[0] else {
            panic!("expected procedure");
        };
        assert_eq!(body.len(), 3);
        assert!(matches!(body[1].kind, TokenKind::Procedure(_)));
        assert!(body[2].kind.is_name("add"));
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("1 % two\n3"),
            vec![TokenKind::Integer(1), TokenKind::Integer(3)]
        );
    }

    #[test]
    fn syntax_errors() {
        for src in ["(abc", "{1 2", "}", "<4G>", "<~ab"] {
            assert!(
                Scanner::new(src.as_bytes()).scan_all().is_err(),
                "expected error for {src:?}"
            );
        }
    }

    #[test]
    fn one_whitespace_after_name_is_consumed() {
        let src = b"abc  def";
        let mut sc = Scanner::new(src);
        sc.next_token().unwrap();
        assert_eq!(sc.position(), 4);
        // A string end consumes nothing further.
        let mut sc = Scanner::new(b"(x) y");
        sc.next_token().unwrap();
        assert_eq!(sc.position(), 3);
    }

    #[test]
    fn spans_cover_token() {
        let toks = Scanner::new(b"  /abc").scan_all().unwrap();
        assert_eq!(toks[0].span, Span::new(2, 6));
    }
}
