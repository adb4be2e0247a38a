//! The PostScript object model.
//!
//! A [`Value`] pairs an [`Object`] payload with its access bits and its
//! literal/executable flag. Simple objects are stored inline; composite
//! objects (strings, arrays, dictionaries) hold a [`Handle`] into the
//! [`Vm`](crate::vm::Vm), so copies of a value share one body.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use epsvg_graphics::matrix::Matrix;

use crate::error::{InterpResult, typecheck};
use crate::operators::OperatorDef;

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// A PostScript name: a byte string compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(pub Arc<[u8]>);

impl Name {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(Arc::from(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The name as text; bytes that are not UTF-8 are replaced.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Reference to a composite body in VM.
///
/// The generation is fixed at allocation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    pub id: u64,
    pub global: bool,
}

/// A string value: a window onto a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringRef {
    pub handle: Handle,
    pub start: usize,
    pub len: usize,
}

/// An array value: a window onto a value buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayRef {
    pub handle: Handle,
    pub start: usize,
    pub len: usize,
    /// Created by `packedarray` or while packing was on.
    pub packed: bool,
}

impl ArrayRef {
    /// The sub-array `[index, index + count)`.
    #[must_use]
    pub const fn slice(self, index: usize, count: usize) -> Self {
        Self {
            start: self.start + index,
            len: count,
            ..self
        }
    }
}

impl StringRef {
    /// The substring `[index, index + count)`.
    #[must_use]
    pub const fn slice(self, index: usize, count: usize) -> Self {
        Self {
            start: self.start + index,
            len: count,
            ..self
        }
    }
}

/// A dictionary value. Access bits live in the dictionary body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DictRef {
    pub handle: Handle,
}

/// Index of an open file in the interpreter's file table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub usize);

/// Identifier of a `save` snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SaveId(pub u64);

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

/// Read/write/execute capability bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Access(u8);

impl Access {
    pub const READ: u8 = 1;
    pub const WRITE: u8 = 2;
    pub const EXECUTE: u8 = 4;

    pub const UNLIMITED: Self = Self(Self::READ | Self::WRITE | Self::EXECUTE);
    pub const READ_ONLY: Self = Self(Self::READ | Self::EXECUTE);
    pub const EXECUTE_ONLY: Self = Self(Self::EXECUTE);
    pub const NONE: Self = Self(0);

    #[must_use]
    pub const fn can_read(self) -> bool {
        self.0 & Self::READ != 0
    }

    #[must_use]
    pub const fn can_write(self) -> bool {
        self.0 & Self::WRITE != 0
    }

    #[must_use]
    pub const fn can_execute(self) -> bool {
        self.0 & Self::EXECUTE != 0
    }

    /// Intersect with `other`. Access can only ever shrink.
    #[must_use]
    pub const fn restrict(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }
}

impl Default for Access {
    fn default() -> Self {
        Self::UNLIMITED
    }
}

// ---------------------------------------------------------------------------
// Object and Value
// ---------------------------------------------------------------------------

/// The payload of a value.
#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Name(Name),
    String(StringRef),
    Array(ArrayRef),
    Dict(DictRef),
    Operator(&'static OperatorDef),
    File(FileId),
    Mark,
    Null,
    /// A read-only six-element matrix (font matrices).
    Matrix(Matrix),
    Save(SaveId),
}

/// A PostScript object: payload plus attributes.
#[derive(Debug, Clone)]
pub struct Value {
    pub object: Object,
    pub access: Access,
    pub executable: bool,
}

impl Value {
    /// A literal value with unlimited access.
    #[must_use]
    pub const fn literal(object: Object) -> Self {
        Self {
            object,
            access: Access::UNLIMITED,
            executable: false,
        }
    }

    /// An executable value with unlimited access.
    #[must_use]
    pub const fn executable(object: Object) -> Self {
        Self {
            object,
            access: Access::UNLIMITED,
            executable: true,
        }
    }

    #[must_use]
    pub const fn int(v: i64) -> Self {
        Self::literal(Object::Integer(v))
    }

    #[must_use]
    pub const fn real(v: f64) -> Self {
        Self::literal(Object::Real(v))
    }

    #[must_use]
    pub const fn boolean(v: bool) -> Self {
        Self::literal(Object::Boolean(v))
    }

    #[must_use]
    pub const fn null() -> Self {
        Self::literal(Object::Null)
    }

    #[must_use]
    pub const fn mark() -> Self {
        Self::literal(Object::Mark)
    }

    /// A literal name (`/name`).
    #[must_use]
    pub fn name(text: &str) -> Self {
        Self::literal(Object::Name(Name::new(text)))
    }

    /// An executable name.
    #[must_use]
    pub fn exec_name(text: &str) -> Self {
        Self::executable(Object::Name(Name::new(text)))
    }

    #[must_use]
    pub const fn operator(def: &'static OperatorDef) -> Self {
        Self::executable(Object::Operator(def))
    }

    /// A number, kept integral when `v` is an exact integer that fits.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "range checked")]
    pub fn number(v: f64, as_integer: bool) -> Self {
        if as_integer && v.fract() == 0.0 && v.abs() < 9.0e15 {
            Self::int(v as i64)
        } else {
            Self::real(v)
        }
    }

    /// The same value with the executable flag set.
    #[must_use]
    pub fn cvx(mut self) -> Self {
        self.executable = true;
        self
    }

    /// The same value with the executable flag cleared.
    #[must_use]
    pub fn cvlit(mut self) -> Self {
        self.executable = false;
        self
    }

    // -- classification --

    /// The PostScript type name reported by `type`.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match &self.object {
            Object::Integer(_) => "integertype",
            Object::Real(_) => "realtype",
            Object::Boolean(_) => "booleantype",
            Object::Name(_) => "nametype",
            Object::String(_) => "stringtype",
            Object::Array(a) if a.packed => "packedarraytype",
            Object::Array(_) | Object::Matrix(_) => "arraytype",
            Object::Dict(_) => "dicttype",
            Object::Operator(_) => "operatortype",
            Object::File(_) => "filetype",
            Object::Mark => "marktype",
            Object::Null => "nulltype",
            Object::Save(_) => "savetype",
        }
    }

    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self.object, Object::Integer(_) | Object::Real(_))
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self.object, Object::Null)
    }

    #[must_use]
    pub const fn is_mark(&self) -> bool {
        matches!(self.object, Object::Mark)
    }

    /// An executable array (a procedure).
    #[must_use]
    pub const fn is_procedure(&self) -> bool {
        self.executable && matches!(self.object, Object::Array(_))
    }

    /// The VM handle of a composite value.
    #[must_use]
    pub const fn handle(&self) -> Option<Handle> {
        match &self.object {
            Object::String(s) => Some(s.handle),
            Object::Array(a) => Some(a.handle),
            Object::Dict(d) => Some(d.handle),
            _ => None,
        }
    }

    // -- coercions --

    pub fn to_int(&self) -> InterpResult<i64> {
        match self.object {
            Object::Integer(v) => Ok(v),
            _ => Err(typecheck(format!("expected integer, got {}", self.type_name()))),
        }
    }

    /// Numeric value; integers widen to reals.
    pub fn to_real(&self) -> InterpResult<f64> {
        match self.object {
            #[expect(clippy::cast_precision_loss, reason = "PostScript integer widening")]
            Object::Integer(v) => Ok(v as f64),
            Object::Real(v) => Ok(v),
            _ => Err(typecheck(format!("expected number, got {}", self.type_name()))),
        }
    }

    /// A non-negative integer usable as an index or count.
    pub fn to_index(&self) -> InterpResult<usize> {
        let v = self.to_int()?;
        usize::try_from(v).map_err(|_| crate::error::rangecheck(format!("negative index {v}")))
    }

    pub fn to_bool(&self) -> InterpResult<bool> {
        match self.object {
            Object::Boolean(b) => Ok(b),
            _ => Err(typecheck(format!("expected boolean, got {}", self.type_name()))),
        }
    }

    pub fn to_name(&self) -> InterpResult<&Name> {
        match &self.object {
            Object::Name(n) => Ok(n),
            _ => Err(typecheck(format!("expected name, got {}", self.type_name()))),
        }
    }

    pub fn to_dict(&self) -> InterpResult<DictRef> {
        match self.object {
            Object::Dict(d) => Ok(d),
            _ => Err(typecheck(format!("expected dictionary, got {}", self.type_name()))),
        }
    }

    pub fn to_array(&self) -> InterpResult<ArrayRef> {
        match self.object {
            Object::Array(a) => Ok(a),
            _ => Err(typecheck(format!("expected array, got {}", self.type_name()))),
        }
    }

    pub fn to_ps_string(&self) -> InterpResult<StringRef> {
        match self.object {
            Object::String(s) => Ok(s),
            _ => Err(typecheck(format!("expected string, got {}", self.type_name()))),
        }
    }

    pub fn to_file(&self) -> InterpResult<FileId> {
        match self.object {
            Object::File(f) => Ok(f),
            _ => Err(typecheck(format!("expected file, got {}", self.type_name()))),
        }
    }

    /// A procedure: an executable array.
    pub fn to_proc(&self) -> InterpResult<ArrayRef> {
        match self.object {
            Object::Array(a) if self.executable => Ok(a),
            _ => Err(typecheck(format!("expected procedure, got {}", self.type_name()))),
        }
    }

    pub fn to_save(&self) -> InterpResult<SaveId> {
        match self.object {
            Object::Save(s) => Ok(s),
            _ => Err(typecheck(format!("expected save, got {}", self.type_name()))),
        }
    }

    // -- access --

    /// Check the capabilities of a string or array value. Dictionary access
    /// lives in the dictionary body and is checked by the VM.
    pub fn check_access(&self, execute: bool, read: bool, write: bool) -> InterpResult<()> {
        let a = self.access;
        if (execute && !a.can_execute()) || (read && !a.can_read()) || (write && !a.can_write())
        {
            return Err(crate::error::invalidaccess(format!(
                "{} access denied",
                self.type_name()
            )));
        }
        Ok(())
    }

    /// Whether two values are the same object, as for `eq` on composites.
    #[must_use]
    pub fn same_object(&self, other: &Self) -> bool {
        match (&self.object, &other.object) {
            (Object::Array(a), Object::Array(b)) => {
                a.handle == b.handle && a.start == b.start && a.len == b.len
            }
            (Object::Dict(a), Object::Dict(b)) => a == b,
            (Object::File(a), Object::File(b)) => a == b,
            (Object::Save(a), Object::Save(b)) => a == b,
            (Object::Operator(a), Object::Operator(b)) => a.name == b.name,
            (Object::Mark, Object::Mark) | (Object::Null, Object::Null) => true,
            (Object::Matrix(a), Object::Matrix(b)) => a == b,
            _ => false,
        }
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
    fn integer_widens_to_real() {
        assert_eq!(Value::int(3).to_real().unwrap(), 3.0);
        assert!(Value::real(3.0).to_int().is_err());
    }

    #[test]
    fn coercion_failures_are_typecheck() {
        let err = Value::boolean(true).to_dict().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::TypeCheck);
    }

    #[test]
    fn access_only_shrinks() {
        let ro = Access::UNLIMITED.restrict(Access::READ_ONLY);
        assert!(ro.can_read() && !ro.can_write());
        let back = ro.restrict(Access::UNLIMITED);
        assert!(!back.can_write());
        assert!(!Access::EXECUTE_ONLY.can_read());
    }

    #[test]
    fn check_access_reports_invalidaccess() {
        let mut v = Value::int(1);
        v.access = Access::EXECUTE_ONLY;
        assert!(v.check_access(true, false, false).is_ok());
        let err = v.check_access(false, true, false).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidAccess);
    }

    #[test]
    fn number_keeps_integers() {
        assert!(matches!(Value::number(4.0, true).object, Object::Integer(4)));
        assert!(matches!(Value::number(4.0, false).object, Object::Real(_)));
        assert!(matches!(Value::number(4.5, true).object, Object::Real(_)));
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::mark().type_name(), "marktype");
        assert_eq!(Value::name("a").type_name(), "nametype");
        assert_eq!(
            Value::literal(Object::Matrix(Matrix::IDENTITY)).type_name(),
            "arraytype"
        );
    }

    #[test]
    fn cvx_and_cvlit() {
        let v = Value::name("x").cvx();
        assert!(v.executable);
        assert!(!v.cvlit().executable);
    }
}
