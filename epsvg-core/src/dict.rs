//! Dictionary bodies and key normalization.
//!
//! PostScript compares keys by value for simple objects and by identity for
//! composites. Strings are converted to names, and integral reals are the
//! same key as the equal integer, so `1` and `1.0` address one entry.

use indexmap::IndexMap;

use crate::error::{InterpResult, typecheck};
use crate::types::{Access, Name, Object, Value};
use crate::vm::Vm;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Normalized dictionary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    Name(Name),
    Integer(i64),
    /// Bit pattern of a non-integral real.
    Real(u64),
    Boolean(bool),
    Array { id: u64, start: usize, len: usize },
    Dict(u64),
    Operator(&'static str),
    File(usize),
    Save(u64),
    Matrix([u64; 6]),
    Mark,
}

impl DictKey {
    /// Key for a name given as text.
    #[must_use]
    pub fn name(text: &str) -> Self {
        Self::Name(Name::new(text))
    }

    /// Normalize `value` into a key. String contents are read from `vm`.
    pub fn from_value(value: &Value, vm: &Vm) -> InterpResult<Self> {
        Ok(match &value.object {
            Object::Name(n) => Self::Name(n.clone()),
            Object::String(s) => {
                let bytes = vm.string(*s)?;
                Self::Name(Name::from_bytes(bytes))
            }
            Object::Integer(i) => Self::Integer(*i),
            #[expect(clippy::cast_possible_truncation, reason = "integral and range checked")]
            Object::Real(r) => {
                if r.fract() == 0.0 && r.abs() < 9.0e15 {
                    Self::Integer(*r as i64)
                } else {
                    Self::Real(r.to_bits())
                }
            }
            Object::Boolean(b) => Self::Boolean(*b),
            Object::Array(a) => Self::Array {
                id: a.handle.id,
                start: a.start,
                len: a.len,
            },
            Object::Dict(d) => Self::Dict(d.handle.id),
            Object::Operator(op) => Self::Operator(op.name),
            Object::File(f) => Self::File(f.0),
            Object::Save(s) => Self::Save(s.0),
            Object::Matrix(m) => Self::Matrix(m.to_array().map(f64::to_bits)),
            Object::Mark => Self::Mark,
            Object::Null => return Err(typecheck("null cannot be a dictionary key")),
        })
    }
}

// ---------------------------------------------------------------------------
// Dictionary body
// ---------------------------------------------------------------------------

/// A dictionary body stored in VM.
///
/// Entries keep insertion order so that `forall` and printing are stable.
/// The declared capacity only matters for `maxlength`; dictionaries grow
/// on demand.
#[derive(Debug, Clone)]
pub struct Dict {
    entries: IndexMap<DictKey, (Value, Value)>,
    capacity: usize,
    pub access: Access,
}

impl Dict {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity.min(1024)),
            capacity,
            access: Access::UNLIMITED,
        }
    }

    #[must_use]
    pub fn get(&self, key: &DictKey) -> Option<&Value> {
        self.entries.get(key).map(|(_, v)| v)
    }

    /// Look up a name key given as text.
    #[must_use]
    pub fn get_name(&self, name: &str) -> Option<&Value> {
        self.get(&DictKey::name(name))
    }

    #[must_use]
    pub fn contains_key(&self, key: &DictKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace an entry. `key_value` is the key as PostScript
    /// sees it (returned by `forall`).
    pub fn insert(&mut self, key: DictKey, key_value: Value, value: Value) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.1 = value;
        } else {
            self.entries.insert(key, (key_value, value));
        }
    }

    /// Insert under a name key.
    pub fn insert_name(&mut self, name: &str, value: Value) {
        self.insert(DictKey::name(name), Value::name(name), value);
    }

    pub fn remove(&mut self, key: &DictKey) -> Option<Value> {
        self.entries.shift_remove(key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current capacity as reported by `maxlength`.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.capacity.max(self.entries.len())
    }

    /// Entries as `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.values().map(|(k, v)| (k, v))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_and_name_keys_match() {
        let mut vm = Vm::new(1000);
        let s = vm.new_string(b"abc".to_vec()).unwrap();
        let from_string = DictKey::from_value(&Value::literal(Object::String(s)), &vm).unwrap();
        assert_eq!(from_string, DictKey::name("abc"));
    }

    #[test]
    fn integral_real_matches_integer() {
        let vm = Vm::new(10);
        assert_eq!(
            DictKey::from_value(&Value::real(2.0), &vm).unwrap(),
            DictKey::Integer(2)
        );
        assert!(matches!(
            DictKey::from_value(&Value::real(2.5), &vm).unwrap(),
            DictKey::Real(_)
        ));
    }

    #[test]
    fn null_key_is_typecheck() {
        let vm = Vm::new(10);
        assert!(DictKey::from_value(&Value::null(), &vm).is_err());
    }

    #[test]
    fn insert_replaces_and_keeps_order() {
        let mut d = Dict::new(2);
        d.insert_name("a", Value::int(1));
        d.insert_name("b", Value::int(2));
        d.insert_name("a", Value::int(3));
        assert_eq!(d.len(), 2);
        let keys: Vec<String> = d
            .iter()
            .map(|(k, _)| k.to_name().unwrap().to_string())
            .collect();
        assert_eq!(keys, ["a", "b"]);
        assert!(matches!(d.get_name("a").unwrap().object, Object::Integer(3)));
    }

    #[test]
    fn maxlength_grows() {
        let mut d = Dict::new(1);
        d.insert_name("a", Value::null());
        d.insert_name("b", Value::null());
        assert_eq!(d.max_length(), 2);
        assert!(d.remove(&DictKey::name("a")).is_some());
        assert!(!d.contains_key(&DictKey::name("a")));
    }
}
