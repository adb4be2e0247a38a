//! Virtual memory: the store for composite object bodies.
//!
//! Bodies live in one of two generations. Local VM is what `save` snapshots
//! and `restore` rolls back; global VM persists across `restore`. Handles
//! are never reused: the id counter only grows, so a handle allocated after
//! a `save` cannot alias anything in the snapshot.

use std::collections::HashMap;

use crate::dict::Dict;
use crate::error::{ErrorKind, InterpResult, InterpreterError};
use crate::types::{ArrayRef, DictRef, Handle, StringRef, Value};

/// A composite body.
#[derive(Debug, Clone)]
pub enum Body {
    Array(Vec<Value>),
    String(Vec<u8>),
    Dict(Dict),
}

/// A frozen copy of local VM taken by `save`.
#[derive(Debug, Clone)]
pub struct Snapshot {
    local: HashMap<u64, Body>,
    /// First id allocated after the snapshot.
    pub mark: u64,
}

/// The two-generation object store.
#[derive(Debug)]
pub struct Vm {
    global: HashMap<u64, Body>,
    local: HashMap<u64, Body>,
    next_id: u64,
    global_mode: bool,
    max_objects: usize,
}

fn dangling(h: Handle) -> InterpreterError {
    InterpreterError::new(
        ErrorKind::VmError,
        format!("reference to discarded object {}", h.id),
    )
}

fn mismatch(what: &str) -> InterpreterError {
    InterpreterError::internal(format!("handle does not refer to {what}"))
}

impl Vm {
    /// Create an empty VM holding at most `max_objects` live bodies.
    #[must_use]
    pub fn new(max_objects: usize) -> Self {
        Self {
            global: HashMap::new(),
            local: HashMap::new(),
            next_id: 1,
            global_mode: false,
            max_objects,
        }
    }

    // -- allocation mode --

    /// Whether new objects go to global VM.
    #[must_use]
    pub const fn is_global(&self) -> bool {
        self.global_mode
    }

    pub const fn set_global(&mut self, global: bool) {
        self.global_mode = global;
    }

    // -- allocation --

    /// Store `body` in the current generation.
    pub fn allocate(&mut self, body: Body) -> InterpResult<Handle> {
        if self.global.len() + self.local.len() >= self.max_objects {
            return Err(InterpreterError::new(
                ErrorKind::VmError,
                format!("object limit of {} reached", self.max_objects),
            ));
        }
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| InterpreterError::internal("object id space exhausted"))?;
        let handle = Handle {
            id,
            global: self.global_mode,
        };
        self.generation_mut(handle.global).insert(id, body);
        Ok(handle)
    }

    pub fn new_array(&mut self, values: Vec<Value>) -> InterpResult<ArrayRef> {
        let len = values.len();
        let handle = self.allocate(Body::Array(values))?;
        Ok(ArrayRef {
            handle,
            start: 0,
            len,
            packed: false,
        })
    }

    pub fn new_string(&mut self, bytes: Vec<u8>) -> InterpResult<StringRef> {
        let len = bytes.len();
        let handle = self.allocate(Body::String(bytes))?;
        Ok(StringRef {
            handle,
            start: 0,
            len,
        })
    }

    pub fn new_dict(&mut self, capacity: usize) -> InterpResult<DictRef> {
        let handle = self.allocate(Body::Dict(Dict::new(capacity)))?;
        Ok(DictRef { handle })
    }

    // -- access --

    const fn generation(&self, global: bool) -> &HashMap<u64, Body> {
        if global { &self.global } else { &self.local }
    }

    const fn generation_mut(&mut self, global: bool) -> &mut HashMap<u64, Body> {
        if global {
            &mut self.global
        } else {
            &mut self.local
        }
    }

    pub fn body(&self, h: Handle) -> InterpResult<&Body> {
        self.generation(h.global)
            .get(&h.id)
            .ok_or_else(|| dangling(h))
    }

    pub fn body_mut(&mut self, h: Handle) -> InterpResult<&mut Body> {
        self.generation_mut(h.global)
            .get_mut(&h.id)
            .ok_or_else(|| dangling(h))
    }

    /// Elements visible through `r`.
    pub fn array(&self, r: ArrayRef) -> InterpResult<&[Value]> {
        match self.body(r.handle)? {
            Body::Array(v) => v
                .get(r.start..r.start + r.len)
                .ok_or_else(|| mismatch("an array window")),
            _ => Err(mismatch("an array")),
        }
    }

    pub fn array_mut(&mut self, r: ArrayRef) -> InterpResult<&mut [Value]> {
        match self.body_mut(r.handle)? {
            Body::Array(v) => v
                .get_mut(r.start..r.start + r.len)
                .ok_or_else(|| mismatch("an array window")),
            _ => Err(mismatch("an array")),
        }
    }

    /// Bytes visible through `r`.
    pub fn string(&self, r: StringRef) -> InterpResult<&[u8]> {
        match self.body(r.handle)? {
            Body::String(v) => v
                .get(r.start..r.start + r.len)
                .ok_or_else(|| mismatch("a string window")),
            _ => Err(mismatch("a string")),
        }
    }

    pub fn string_mut(&mut self, r: StringRef) -> InterpResult<&mut [u8]> {
        match self.body_mut(r.handle)? {
            Body::String(v) => v
                .get_mut(r.start..r.start + r.len)
                .ok_or_else(|| mismatch("a string window")),
            _ => Err(mismatch("a string")),
        }
    }

    pub fn dict(&self, r: DictRef) -> InterpResult<&Dict> {
        match self.body(r.handle)? {
            Body::Dict(d) => Ok(d),
            _ => Err(mismatch("a dictionary")),
        }
    }

    pub fn dict_mut(&mut self, r: DictRef) -> InterpResult<&mut Dict> {
        match self.body_mut(r.handle)? {
            Body::Dict(d) => Ok(d),
            _ => Err(mismatch("a dictionary")),
        }
    }

    // -- save / restore --

    /// Deep copy of local VM.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            local: self.local.clone(),
            mark: self.next_id,
        }
    }

    /// Replace local VM with `snapshot`, discarding every local body
    /// created or changed since it was taken.
    pub fn restore(&mut self, snapshot: Snapshot) {
        tracing::debug!(
            discarded = self.local.len().saturating_sub(snapshot.local.len()),
            "local VM restored"
        );
        self.local = snapshot.local;
    }

    // -- statistics --

    /// Number of live bodies in (local, global) VM.
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        (self.local.len(), self.global.len())
    }

    #[must_use]
    pub const fn max_objects(&self) -> usize {
        self.max_objects
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Object;

    #[test]
    fn handles_record_generation() {
        let mut vm = Vm::new(100);
        let local = vm.new_array(vec![]).unwrap();
        vm.set_global(true);
        let global = vm.new_array(vec![]).unwrap();
        assert!(!local.handle.global);
        assert!(global.handle.global);
        assert_ne!(local.handle.id, global.handle.id);
    }

    #[test]
    fn shared_bodies() {
        let mut vm = Vm::new(100);
        let a = vm.new_array(vec![Value::int(1), Value::int(2)]).unwrap();
        let b = a;
        vm.array_mut(a).unwrap()[0] = Value::int(9);
        assert!(matches!(vm.array(b).unwrap()[0].object, Object::Integer(9)));
    }

    #[test]
    fn windows_see_sub_ranges() {
        let mut vm = Vm::new(100);
        let s = vm.new_string(b"hello".to_vec()).unwrap();
        assert_eq!(vm.string(s.slice(1, 3)).unwrap(), b"ell");
    }

    #[test]
    fn restore_discards_local_changes_only() {
        let mut vm = Vm::new(100);
        let local = vm.new_string(b"abc".to_vec()).unwrap();
        vm.set_global(true);
        let global = vm.new_string(b"xyz".to_vec()).unwrap();
        vm.set_global(false);

        let snap = vm.snapshot();
        vm.string_mut(local).unwrap()[0] = b'Z';
        vm.string_mut(global).unwrap()[0] = b'Q';
        let later = vm.new_array(vec![]).unwrap();
        vm.restore(snap);

        assert_eq!(vm.string(local).unwrap(), b"abc");
        assert_eq!(vm.string(global).unwrap(), b"Qyz");
        let err = vm.array(later).unwrap_err();
        assert_eq!(err.kind, ErrorKind::VmError);
    }

    #[test]
    fn object_cap_is_vmerror() {
        let mut vm = Vm::new(1);
        vm.new_array(vec![]).unwrap();
        let err = vm.new_array(vec![]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::VmError);
    }

    #[test]
    fn snapshot_mark_is_next_id() {
        let mut vm = Vm::new(10);
        let before = vm.snapshot().mark;
        let a = vm.new_array(vec![]).unwrap();
        assert_eq!(a.handle.id, before);
    }
}
