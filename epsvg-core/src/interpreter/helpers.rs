//! Operand extraction, allocation and lookup helpers shared by the
//! operator modules.

use epsvg_graphics::device::OutputDevice;
use epsvg_graphics::error::GraphicsResult;
use epsvg_graphics::matrix::Matrix;
use epsvg_graphics::state::{DeviceId, GraphicsState};
use epsvg_graphics::types::{Point, Scalar};

use super::Interpreter;
use crate::dict::DictKey;
use crate::error::{ErrorKind, InterpResult, InterpreterError, invalidaccess, rangecheck, typecheck};
use crate::types::{Access, DictRef, Name, Object, StringRef, Value};

impl Interpreter {
    // =======================================================================
    // Operand stack
    // =======================================================================

    pub(crate) fn push(&mut self, v: Value) {
        self.ostack.push(v);
    }

    pub(crate) fn pop(&mut self) -> InterpResult<Value> {
        self.ostack.pop()
    }

    pub(crate) fn pop_int(&mut self) -> InterpResult<i64> {
        self.pop()?.to_int()
    }

    pub(crate) fn pop_real(&mut self) -> InterpResult<Scalar> {
        self.pop()?.to_real()
    }

    pub(crate) fn pop_bool(&mut self) -> InterpResult<bool> {
        self.pop()?.to_bool()
    }

    pub(crate) fn pop_index(&mut self) -> InterpResult<usize> {
        self.pop()?.to_index()
    }

    pub(crate) fn pop_dict(&mut self) -> InterpResult<DictRef> {
        self.pop()?.to_dict()
    }

    /// Pop a procedure (executable array).
    pub(crate) fn pop_proc(&mut self) -> InterpResult<Value> {
        let v = self.pop()?;
        v.to_proc()?;
        Ok(v)
    }

    /// Pop `x y`.
    pub(crate) fn pop_point(&mut self) -> InterpResult<Point> {
        let y = self.pop_real()?;
        let x = self.pop_real()?;
        Ok(Point::new(x, y))
    }

    /// Pop a readable string.
    pub(crate) fn pop_string(&mut self) -> InterpResult<(Value, StringRef)> {
        let v = self.pop()?;
        let s = v.to_ps_string()?;
        v.check_access(false, true, false)?;
        Ok((v, s))
    }

    /// Pop a string and copy out its bytes.
    pub(crate) fn pop_bytes(&mut self) -> InterpResult<Vec<u8>> {
        let (_, s) = self.pop_string()?;
        Ok(self.vm.string(s)?.to_vec())
    }

    // =======================================================================
    // Allocation
    // =======================================================================

    pub(crate) fn new_array_value(&mut self, values: Vec<Value>) -> InterpResult<Value> {
        Ok(Value::literal(Object::Array(self.vm.new_array(values)?)))
    }

    pub(crate) fn new_string_value(&mut self, bytes: Vec<u8>) -> InterpResult<Value> {
        Ok(Value::literal(Object::String(self.vm.new_string(bytes)?)))
    }

    pub(crate) fn new_dict_value(&mut self, capacity: usize) -> InterpResult<Value> {
        Ok(Value::literal(Object::Dict(self.vm.new_dict(capacity)?)))
    }

    /// Run `f` with allocation forced into global VM.
    pub(crate) fn in_global<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> InterpResult<T>,
    ) -> InterpResult<T> {
        let was = self.vm.is_global();
        self.vm.set_global(true);
        let out = f(self);
        self.vm.set_global(was);
        out
    }

    // =======================================================================
    // Composite contents
    // =======================================================================

    /// Elements of a readable array, or the six entries of a matrix.
    pub(crate) fn array_items(&self, v: &Value) -> InterpResult<Vec<Value>> {
        match &v.object {
            Object::Array(a) => {
                v.check_access(false, true, false)?;
                Ok(self.vm.array(*a)?.to_vec())
            }
            Object::Matrix(m) => Ok(m.to_array().into_iter().map(Value::real).collect()),
            _ => Err(typecheck(format!("expected array, got {}", v.type_name()))),
        }
    }

    /// Text of a string or name.
    pub(crate) fn text_bytes(&self, v: &Value) -> InterpResult<Vec<u8>> {
        match &v.object {
            Object::String(s) => {
                v.check_access(false, true, false)?;
                Ok(self.vm.string(*s)?.to_vec())
            }
            Object::Name(n) => Ok(n.as_bytes().to_vec()),
            _ => Err(typecheck(format!("expected string or name, got {}", v.type_name()))),
        }
    }

    /// Numbers of an array.
    pub(crate) fn numbers(&self, v: &Value) -> InterpResult<Vec<Scalar>> {
        self.array_items(v)?.iter().map(Value::to_real).collect()
    }

    /// A six-number array or matrix object as a matrix.
    pub(crate) fn value_to_matrix(&self, v: &Value) -> InterpResult<Matrix> {
        if let Object::Matrix(m) = v.object {
            return Ok(m);
        }
        let n = self.numbers(v)?;
        let m: [Scalar; 6] = n
            .try_into()
            .map_err(|_| rangecheck("matrix must have six elements"))?;
        Ok(Matrix::from_array(m))
    }

    pub(crate) fn pop_matrix(&mut self) -> InterpResult<Matrix> {
        let v = self.pop()?;
        self.value_to_matrix(&v)
    }

    /// Whether the top operand looks like a matrix operand.
    pub(crate) fn top_is_matrix(&self) -> bool {
        self.ostack
            .peek(0)
            .is_ok_and(|v| matches!(v.object, Object::Array(_) | Object::Matrix(_)))
    }

    /// Write `m` into the six-element array `target` and return it.
    pub(crate) fn store_matrix(&mut self, target: Value, m: Matrix) -> InterpResult<Value> {
        let a = target.to_array()?;
        if a.len != 6 {
            return Err(rangecheck("matrix must have six elements"));
        }
        target.check_access(false, false, true)?;
        let slots = self.vm.array_mut(a)?;
        for (slot, x) in slots.iter_mut().zip(m.to_array()) {
            *slot = Value::real(x);
        }
        Ok(target)
    }

    /// Copy `bytes` into the start of string `target` and return the
    /// written prefix.
    pub(crate) fn fill_string(&mut self, target: &Value, bytes: &[u8]) -> InterpResult<Value> {
        let s = target.to_ps_string()?;
        target.check_access(false, false, true)?;
        if bytes.len() > s.len {
            return Err(rangecheck("string too small"));
        }
        self.vm.string_mut(s)?[..bytes.len()].copy_from_slice(bytes);
        Ok(Value {
            object: Object::String(s.slice(0, bytes.len())),
            ..target.clone()
        })
    }

    // =======================================================================
    // Dictionaries
    // =======================================================================

    pub(crate) fn dict_key(&self, key: &Value) -> InterpResult<DictKey> {
        DictKey::from_value(key, &self.vm)
    }

    /// `get` on a dictionary with its read check.
    pub(crate) fn dict_get(&self, d: DictRef, key: &DictKey) -> InterpResult<Option<Value>> {
        let dict = self.vm.dict(d)?;
        if !dict.access.can_read() {
            return Err(invalidaccess("dictionary is not readable"));
        }
        Ok(dict.get(key).cloned())
    }

    /// `put` on a dictionary with its write check.
    pub(crate) fn dict_put(&mut self, d: DictRef, key: Value, value: Value) -> InterpResult<()> {
        let k = self.dict_key(&key)?;
        let mut key = key;
        if let (Object::String(_), DictKey::Name(n)) = (&key.object, &k) {
            key = Value::literal(Object::Name(n.clone()));
        }
        let dict = self.vm.dict_mut(d)?;
        if !dict.access.can_write() {
            return Err(invalidaccess("dictionary is read-only"));
        }
        dict.insert(k, key, value);
        Ok(())
    }

    /// Topmost dictionary on the dictionary stack holding `key`.
    pub(crate) fn where_key(&self, key: &DictKey) -> InterpResult<Option<DictRef>> {
        for &d in self.dstack.as_slice().iter().rev() {
            if self.vm.dict(d)?.contains_key(key) {
                return Ok(Some(d));
            }
        }
        Ok(None)
    }

    /// Value of `key` in the topmost dictionary holding it.
    pub(crate) fn lookup(&self, key: &DictKey) -> InterpResult<Option<Value>> {
        for &d in self.dstack.as_slice().iter().rev() {
            if let Some(v) = self.vm.dict(d)?.get(key) {
                return Ok(Some(v.clone()));
            }
        }
        Ok(None)
    }

    /// Look up a name; `undefined` if absent.
    pub(crate) fn lookup_name(&self, name: &Name) -> InterpResult<Value> {
        self.lookup(&DictKey::Name(name.clone()))?
            .ok_or_else(|| InterpreterError::new(ErrorKind::Undefined, name.to_string()))
    }

    /// `def` into the current dictionary.
    pub(crate) fn def(&mut self, key: Value, value: Value) -> InterpResult<()> {
        let top = self.dstack.top()?;
        self.dict_put(top, key, value)
    }

    /// Fetch a name entry of a dictionary held by value.
    pub(crate) fn entry(&self, dict: &Value, name: &str) -> InterpResult<Option<Value>> {
        let d = dict.to_dict()?;
        Ok(self.vm.dict(d)?.get_name(name).cloned())
    }

    // =======================================================================
    // Access attributes
    // =======================================================================

    /// Reduce the access of a value, in the body for dictionaries.
    pub(crate) fn restrict_access(&mut self, mut v: Value, access: Access) -> InterpResult<Value> {
        if let Object::Dict(d) = v.object {
            let dict = self.vm.dict_mut(d)?;
            dict.access = dict.access.restrict(access);
        } else {
            v.access = v.access.restrict(access);
        }
        Ok(v)
    }

    /// Effective access of a value.
    pub(crate) fn access_of(&self, v: &Value) -> InterpResult<Access> {
        match v.object {
            Object::Dict(d) => Ok(self.vm.dict(d)?.access),
            _ => Ok(v.access),
        }
    }

    // =======================================================================
    // Graphics
    // =======================================================================

    pub(crate) fn gfx(&mut self) -> &mut GraphicsState {
        &mut self.gstates.current.gfx
    }

    /// Call `f` with the device of the current graphics state.
    pub(crate) fn with_device(
        &mut self,
        f: impl FnOnce(&mut dyn OutputDevice, &GraphicsState) -> GraphicsResult<()>,
    ) -> InterpResult<()> {
        let state = &self.gstates.current.gfx;
        let device = self
            .devices
            .get_mut(state.device.0)
            .ok_or_else(|| InterpreterError::internal("graphics state names a missing device"))?;
        f(device.as_mut(), state)?;
        Ok(())
    }

    fn device_mut(&mut self, id: DeviceId) -> InterpResult<&mut dyn OutputDevice> {
        Ok(self
            .devices
            .get_mut(id.0)
            .ok_or_else(|| InterpreterError::internal("graphics state names a missing device"))?
            .as_mut())
    }

    pub(crate) fn open_scope(&mut self, id: DeviceId) -> InterpResult<()> {
        self.device_mut(id)?.start_scope()?;
        Ok(())
    }

    pub(crate) fn close_scope(&mut self, id: DeviceId) -> InterpResult<()> {
        self.device_mut(id)?.end_scope()?;
        Ok(())
    }

    /// Default matrix of the current device.
    pub(crate) fn default_matrix(&self) -> Matrix {
        self.devices
            .get(self.gstates.current.gfx.device.0)
            .map_or(Matrix::IDENTITY, |d| d.default_matrix())
    }
}
