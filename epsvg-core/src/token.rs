//! Token types for the PostScript scanner.
//!
//! Tokens are plain data; turning them into interpreter values (which
//! allocates strings and procedures in VM) happens in the interpreter.

// ---------------------------------------------------------------------------
// Source location
// ---------------------------------------------------------------------------

/// A byte-offset span in the source input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A zero-length span at the given position.
    #[must_use]
    pub const fn at(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A lexical token produced by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// The kind and payload of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Integer(i64),
    Real(f64),
    /// Bytes of a `(...)`, `<...>` or `<~...~>` string.
    String(Vec<u8>),
    /// `name`, including the self-delimiting `[ ] << >>`. Names are
    /// bytes; only the self-delimiters are guaranteed ASCII.
    Name(Vec<u8>),
    /// `/name`.
    LiteralName(Vec<u8>),
    /// `//name`, replaced by its current value when materialized.
    ImmediateName(Vec<u8>),
    /// `{ ... }` with its nested tokens.
    Procedure(Vec<Token>),
}

impl TokenKind {
    /// Returns `true` if this is an executable name with the given text.
    #[must_use]
    pub fn is_name(&self, name: &str) -> bool {
        matches!(self, Self::Name(s) if s == name.as_bytes())
    }

    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Real(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let s = Span::new(10, 20);
        assert_eq!(s.len(), 10);
        assert!(!s.is_empty());
        assert!(Span::at(5).is_empty());
    }

    #[test]
    fn token_kind_predicates() {
        assert!(TokenKind::Name("add".into()).is_name("add"));
        assert!(!TokenKind::LiteralName("add".into()).is_name("add"));
        assert!(TokenKind::Real(0.5).is_number());
        assert!(!TokenKind::String(vec![]).is_number());
    }
}
