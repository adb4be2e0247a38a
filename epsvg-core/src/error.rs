//! Error types for the PostScript interpreter.
//!
//! Every language-level error carries an [`ErrorKind`] whose
//! [`name`](ErrorKind::name) is the key looked up in `errordict`. The run
//! loop turns these into redirected control flow. The one exception is
//! [`ErrorKind::Internal`], a broken interpreter invariant, which aborts
//! interpretation instead.

use std::fmt;

use epsvg_graphics::error::GraphicsError;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// An error raised by an operator or by the interpreter itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl InterpreterError {
    /// Create a new error.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A broken interpreter invariant. Never caught by `stopped`.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error aborts interpretation.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::Internal)
    }
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for InterpreterError {}

impl From<GraphicsError> for InterpreterError {
    fn from(err: GraphicsError) -> Self {
        let kind = match err {
            GraphicsError::NoCurrentPoint => ErrorKind::NoCurrentPoint,
            GraphicsError::UndefinedResult(_) => ErrorKind::UndefinedResult,
            GraphicsError::RangeCheck(_) => ErrorKind::RangeCheck,
            GraphicsError::Device(_) => ErrorKind::IoError,
        };
        Self::new(kind, err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Error kinds
// ---------------------------------------------------------------------------

/// PostScript error names, plus the fatal internal kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    StackUnderflow,
    StackOverflow,
    DictStackUnderflow,
    DictStackOverflow,
    ExecStackOverflow,
    TypeCheck,
    RangeCheck,
    InvalidAccess,
    Undefined,
    UnmatchedMark,
    InvalidExit,
    IoError,
    VmError,
    Unregistered,
    UndefinedResult,
    NoCurrentPoint,
    InvalidRestore,
    SyntaxError,
    LimitCheck,
    UndefinedFilename,
    InvalidFont,
    UndefinedResource,
    InvalidFileAccess,
    /// Interpreter bug. Aborts interpretation.
    Internal,
}

impl ErrorKind {
    /// Every kind that has an `errordict` entry.
    pub const RECOVERABLE: &[Self] = &[
        Self::StackUnderflow,
        Self::StackOverflow,
        Self::DictStackUnderflow,
        Self::DictStackOverflow,
        Self::ExecStackOverflow,
        Self::TypeCheck,
        Self::RangeCheck,
        Self::InvalidAccess,
        Self::Undefined,
        Self::UnmatchedMark,
        Self::InvalidExit,
        Self::IoError,
        Self::VmError,
        Self::Unregistered,
        Self::UndefinedResult,
        Self::NoCurrentPoint,
        Self::InvalidRestore,
        Self::SyntaxError,
        Self::LimitCheck,
        Self::UndefinedFilename,
        Self::InvalidFont,
        Self::UndefinedResource,
        Self::InvalidFileAccess,
    ];

    /// The PostScript error name, used as the `errordict` key.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StackUnderflow => "stackunderflow",
            Self::StackOverflow => "stackoverflow",
            Self::DictStackUnderflow => "dictstackunderflow",
            Self::DictStackOverflow => "dictstackoverflow",
            Self::ExecStackOverflow => "execstackoverflow",
            Self::TypeCheck => "typecheck",
            Self::RangeCheck => "rangecheck",
            Self::InvalidAccess => "invalidaccess",
            Self::Undefined => "undefined",
            Self::UnmatchedMark => "unmatchedmark",
            Self::InvalidExit => "invalidexit",
            Self::IoError => "ioerror",
            Self::VmError => "VMerror",
            Self::Unregistered => "unregistered",
            Self::UndefinedResult => "undefinedresult",
            Self::NoCurrentPoint => "nocurrentpoint",
            Self::InvalidRestore => "invalidrestore",
            Self::SyntaxError => "syntaxerror",
            Self::LimitCheck => "limitcheck",
            Self::UndefinedFilename => "undefinedfilename",
            Self::InvalidFont => "invalidfont",
            Self::UndefinedResource => "undefinedresource",
            Self::InvalidFileAccess => "invalidfileaccess",
            Self::Internal => "internalerror",
        }
    }

    /// Look up a kind by its PostScript name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::RECOVERABLE.iter().copied().find(|k| k.name() == name)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Convenience type alias for results using [`InterpreterError`].
pub type InterpResult<T> = Result<T, InterpreterError>;

/// Shorthand for the errors operators raise most.
pub(crate) fn typecheck(message: impl Into<String>) -> InterpreterError {
    InterpreterError::new(ErrorKind::TypeCheck, message)
}

pub(crate) fn rangecheck(message: impl Into<String>) -> InterpreterError {
    InterpreterError::new(ErrorKind::RangeCheck, message)
}

pub(crate) fn invalidaccess(message: impl Into<String>) -> InterpreterError {
    InterpreterError::new(ErrorKind::InvalidAccess, message)
}

/// A language feature this interpreter does not provide.
pub(crate) fn unregistered(what: impl Into<String>) -> InterpreterError {
    InterpreterError::new(ErrorKind::Unregistered, what)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = InterpreterError::new(ErrorKind::TypeCheck, "expected integer");
        assert_eq!(err.to_string(), "typecheck: expected integer");
        let bare = InterpreterError::new(ErrorKind::StackUnderflow, "");
        assert_eq!(bare.to_string(), "stackunderflow");
    }

    #[test]
    fn names_roundtrip() {
        for &kind in ErrorKind::RECOVERABLE {
            assert_eq!(ErrorKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ErrorKind::from_name("internalerror"), None);
    }

    #[test]
    fn only_internal_is_fatal() {
        assert!(InterpreterError::internal("bug").is_fatal());
        assert!(!InterpreterError::new(ErrorKind::Undefined, "x").is_fatal());
    }

    #[test]
    fn graphics_errors_map_to_ps_names() {
        let err: InterpreterError = GraphicsError::NoCurrentPoint.into();
        assert_eq!(err.kind, ErrorKind::NoCurrentPoint);
        let err: InterpreterError = GraphicsError::UndefinedResult("singular").into();
        assert_eq!(err.kind, ErrorKind::UndefinedResult);
    }
}
