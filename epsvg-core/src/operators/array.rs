//! Array, packed array and polymorphic composite operators.
//!
//! `length`, `get`, `put`, `getinterval` and `putinterval` accept arrays,
//! strings and dictionaries where PostScript does; they live here with the
//! array operators since arrays are the common case.

use crate::error::{ErrorKind, InterpResult, InterpreterError, invalidaccess, rangecheck, typecheck};
use crate::interpreter::Interpreter;
use crate::types::{Access, Object, Value};

/// Check that `[index, index + count)` lies within `len`.
fn check_interval(index: usize, count: usize, len: usize) -> InterpResult<()> {
    match index.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => Err(rangecheck(format!(
            "interval {index}+{count} outside length {len}"
        ))),
    }
}

pub(super) fn array(interp: &mut Interpreter) -> InterpResult<()> {
    let n = interp.pop_index()?;
    let v = interp.new_array_value(vec![Value::null(); n])?;
    interp.push(v);
    Ok(())
}

/// `]`: collect the operands above the topmost mark.
pub(super) fn array_from_mark(interp: &mut Interpreter) -> InterpResult<()> {
    let n = interp.ostack.count_to_mark()?;
    let items = interp.ostack.pop_n(n)?;
    interp.pop()?;
    let v = interp.new_array_value(items)?;
    interp.push(v);
    Ok(())
}

pub(super) fn aload(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    let items = interp.array_items(&v)?;
    for item in items {
        interp.push(item);
    }
    interp.push(v);
    Ok(())
}

pub(super) fn astore(interp: &mut Interpreter) -> InterpResult<()> {
    let target = interp.pop()?;
    let a = target.to_array()?;
    target.check_access(false, false, true)?;
    let items = interp.ostack.pop_n(a.len)?;
    interp.vm.array_mut(a)?.clone_from_slice(&items);
    interp.push(target);
    Ok(())
}

// ---------------------------------------------------------------------------
// Polymorphic access
// ---------------------------------------------------------------------------

pub(super) fn length(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    let n = match &v.object {
        Object::Array(a) => {
            v.check_access(false, true, false)?;
            a.len
        }
        Object::String(s) => {
            v.check_access(false, true, false)?;
            s.len
        }
        Object::Matrix(_) => 6,
        Object::Name(n) => n.as_bytes().len(),
        Object::Dict(d) => {
            let dict = interp.vm.dict(*d)?;
            if !dict.access.can_read() {
                return Err(invalidaccess("dictionary is not readable"));
            }
            dict.len()
        }
        _ => return Err(typecheck(format!("length of {}", v.type_name()))),
    };
    let n = i64::try_from(n).map_err(|_| rangecheck("length too large"))?;
    interp.push(Value::int(n));
    Ok(())
}

pub(super) fn get(interp: &mut Interpreter) -> InterpResult<()> {
    let key = interp.pop()?;
    let target = interp.pop()?;
    let result = match &target.object {
        Object::Dict(d) => {
            let k = interp.dict_key(&key)?;
            interp.dict_get(*d, &k)?.ok_or_else(|| {
                let text = String::from_utf8_lossy(&interp.text_of(&key)).into_owned();
                InterpreterError::new(ErrorKind::Undefined, text)
            })?
        }
        Object::Array(_) | Object::Matrix(_) => {
            let items = interp.array_items(&target)?;
            let i = key.to_index()?;
            items
                .get(i)
                .cloned()
                .ok_or_else(|| rangecheck(format!("index {i} out of range")))?
        }
        Object::String(s) => {
            target.check_access(false, true, false)?;
            let i = key.to_index()?;
            let byte = interp
                .vm
                .string(*s)?
                .get(i)
                .copied()
                .ok_or_else(|| rangecheck(format!("index {i} out of range")))?;
            Value::int(i64::from(byte))
        }
        _ => return Err(typecheck(format!("get from {}", target.type_name()))),
    };
    interp.push(result);
    Ok(())
}

pub(super) fn put(interp: &mut Interpreter) -> InterpResult<()> {
    let value = interp.pop()?;
    let key = interp.pop()?;
    let target = interp.pop()?;
    match &target.object {
        Object::Dict(d) => interp.dict_put(*d, key, value),
        Object::Array(a) => {
            target.check_access(false, false, true)?;
            let i = key.to_index()?;
            let slot = interp
                .vm
                .array_mut(*a)?
                .get_mut(i)
                .ok_or_else(|| rangecheck(format!("index {i} out of range")))?;
            *slot = value;
            Ok(())
        }
        Object::String(s) => {
            target.check_access(false, false, true)?;
            let i = key.to_index()?;
            let byte = value.to_int()?;
            let byte = u8::try_from(byte).map_err(|_| rangecheck(format!("byte {byte}")))?;
            let slot = interp
                .vm
                .string_mut(*s)?
                .get_mut(i)
                .ok_or_else(|| rangecheck(format!("index {i} out of range")))?;
            *slot = byte;
            Ok(())
        }
        Object::Matrix(_) => Err(invalidaccess("matrix is read-only")),
        _ => Err(typecheck(format!("put into {}", target.type_name()))),
    }
}

pub(super) fn getinterval(interp: &mut Interpreter) -> InterpResult<()> {
    let count = interp.pop_index()?;
    let index = interp.pop_index()?;
    let target = interp.pop()?;
    let object = match &target.object {
        Object::Array(a) => {
            target.check_access(false, true, false)?;
            check_interval(index, count, a.len)?;
            Object::Array(a.slice(index, count))
        }
        Object::String(s) => {
            target.check_access(false, true, false)?;
            check_interval(index, count, s.len)?;
            Object::String(s.slice(index, count))
        }
        Object::Matrix(_) => {
            check_interval(index, count, 6)?;
            let items = interp.array_items(&target)?[index..index + count].to_vec();
            Object::Array(interp.vm.new_array(items)?)
        }
        _ => return Err(typecheck(format!("getinterval of {}", target.type_name()))),
    };
    interp.push(Value { object, ..target });
    Ok(())
}

pub(super) fn putinterval(interp: &mut Interpreter) -> InterpResult<()> {
    let source = interp.pop()?;
    let index = interp.pop_index()?;
    let target = interp.pop()?;
    target.check_access(false, false, true)?;
    match (&target.object, &source.object) {
        (Object::Array(a), Object::Array(_) | Object::Matrix(_)) => {
            let items = interp.array_items(&source)?;
            check_interval(index, items.len(), a.len)?;
            interp.vm.array_mut(*a)?[index..index + items.len()].clone_from_slice(&items);
            Ok(())
        }
        (Object::String(s), Object::String(_)) => {
            let bytes = interp.text_bytes(&source)?;
            check_interval(index, bytes.len(), s.len)?;
            interp.vm.string_mut(*s)?[index..index + bytes.len()].copy_from_slice(&bytes);
            Ok(())
        }
        (Object::Matrix(_), _) => Err(invalidaccess("matrix is read-only")),
        _ => Err(typecheck(format!(
            "putinterval of {} into {}",
            source.type_name(),
            target.type_name()
        ))),
    }
}

/// The composite form of `copy`: copy `source` into `dest`, returning the
/// filled part of `dest` for arrays and strings.
pub(super) fn copy_composite(
    interp: &mut Interpreter,
    source: &Value,
    dest: Value,
) -> InterpResult<Value> {
    match (&source.object, &dest.object) {
        (Object::Array(_) | Object::Matrix(_), Object::Array(a)) => {
            let items = interp.array_items(source)?;
            dest.check_access(false, false, true)?;
            if items.len() > a.len {
                return Err(rangecheck("destination array too small"));
            }
            interp.vm.array_mut(*a)?[..items.len()].clone_from_slice(&items);
            let filled = a.slice(0, items.len());
            Ok(Value {
                object: Object::Array(filled),
                ..dest
            })
        }
        (Object::String(_), Object::String(_)) => {
            let bytes = interp.text_bytes(source)?;
            interp.fill_string(&dest, &bytes)
        }
        (Object::Dict(from), Object::Dict(to)) => {
            let entries: Vec<(Value, Value)> = {
                let dict = interp.vm.dict(*from)?;
                if !dict.access.can_read() {
                    return Err(invalidaccess("dictionary is not readable"));
                }
                dict.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
            };
            for (k, v) in entries {
                interp.dict_put(*to, k, v)?;
            }
            Ok(dest)
        }
        _ => Err(typecheck(format!(
            "copy of {} into {}",
            source.type_name(),
            dest.type_name()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Packed arrays
// ---------------------------------------------------------------------------

pub(super) fn packedarray(interp: &mut Interpreter) -> InterpResult<()> {
    let n = interp.pop_index()?;
    let items = interp.ostack.pop_n(n)?;
    let mut a = interp.vm.new_array(items)?;
    a.packed = true;
    let mut v = Value::literal(Object::Array(a));
    v.access = Access::READ_ONLY;
    interp.push(v);
    Ok(())
}

pub(super) fn setpacking(interp: &mut Interpreter) -> InterpResult<()> {
    interp.packing = interp.pop_bool()?;
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn currentpacking(interp: &mut Interpreter) -> InterpResult<()> {
    interp.push(Value::boolean(interp.packing));
    Ok(())
}

