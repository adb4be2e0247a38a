//! Dictionary and dictionary stack operators.

use crate::error::{ErrorKind, InterpResult, InterpreterError, invalidaccess, rangecheck};
use crate::interpreter::Interpreter;
use crate::types::{Object, Value};

fn undefined(interp: &Interpreter, key: &Value) -> InterpreterError {
    let text = String::from_utf8_lossy(&interp.text_of(key)).into_owned();
    InterpreterError::new(ErrorKind::Undefined, text)
}

pub(super) fn dict(interp: &mut Interpreter) -> InterpResult<()> {
    let n = interp.pop_index()?;
    let v = interp.new_dict_value(n)?;
    interp.push(v);
    Ok(())
}

/// `>>`: build a dictionary from the key/value pairs above the mark.
pub(super) fn dict_from_mark(interp: &mut Interpreter) -> InterpResult<()> {
    let n = interp.ostack.count_to_mark()?;
    if n % 2 != 0 {
        return Err(rangecheck("odd number of operands for >>"));
    }
    let items = interp.ostack.pop_n(n)?;
    interp.pop()?;
    let v = interp.new_dict_value(n / 2)?;
    let d = v.to_dict()?;
    let mut items = items.into_iter();
    while let (Some(key), Some(value)) = (items.next(), items.next()) {
        interp.dict_put(d, key, value)?;
    }
    interp.push(v);
    Ok(())
}

pub(super) fn maxlength(interp: &mut Interpreter) -> InterpResult<()> {
    let d = interp.pop_dict()?;
    let dict = interp.vm.dict(d)?;
    if !dict.access.can_read() {
        return Err(invalidaccess("dictionary is not readable"));
    }
    let n = i64::try_from(dict.max_length()).map_err(|_| rangecheck("dictionary too large"))?;
    interp.push(Value::int(n));
    Ok(())
}

pub(super) fn begin(interp: &mut Interpreter) -> InterpResult<()> {
    let d = interp.pop_dict()?;
    interp.dstack.push(d)
}

pub(super) fn end(interp: &mut Interpreter) -> InterpResult<()> {
    interp.dstack.pop()?;
    Ok(())
}

pub(super) fn def(interp: &mut Interpreter) -> InterpResult<()> {
    let value = interp.pop()?;
    let key = interp.pop()?;
    interp.def(key, value)
}

pub(super) fn load(interp: &mut Interpreter) -> InterpResult<()> {
    let key = interp.pop()?;
    let k = interp.dict_key(&key)?;
    let value = interp.lookup(&k)?.ok_or_else(|| undefined(interp, &key))?;
    interp.push(value);
    Ok(())
}

/// Replace the topmost definition of a key, or define it in the current
/// dictionary.
pub(super) fn store(interp: &mut Interpreter) -> InterpResult<()> {
    let value = interp.pop()?;
    let key = interp.pop()?;
    let k = interp.dict_key(&key)?;
    match interp.where_key(&k)? {
        Some(d) => interp.dict_put(d, key, value),
        None => interp.def(key, value),
    }
}

pub(super) fn known(interp: &mut Interpreter) -> InterpResult<()> {
    let key = interp.pop()?;
    let d = interp.pop_dict()?;
    let k = interp.dict_key(&key)?;
    let found = interp.dict_get(d, &k)?.is_some();
    interp.push(Value::boolean(found));
    Ok(())
}

pub(super) fn undef(interp: &mut Interpreter) -> InterpResult<()> {
    let key = interp.pop()?;
    let d = interp.pop_dict()?;
    let k = interp.dict_key(&key)?;
    let dict = interp.vm.dict_mut(d)?;
    if !dict.access.can_write() {
        return Err(invalidaccess("dictionary is read-only"));
    }
    dict.remove(&k);
    Ok(())
}

pub(super) fn where_op(interp: &mut Interpreter) -> InterpResult<()> {
    let key = interp.pop()?;
    let k = interp.dict_key(&key)?;
    match interp.where_key(&k)? {
        Some(d) => {
            interp.push(Value::literal(Object::Dict(d)));
            interp.push(Value::boolean(true));
        }
        None => interp.push(Value::boolean(false)),
    }
    Ok(())
}

pub(super) fn currentdict(interp: &mut Interpreter) -> InterpResult<()> {
    let d = interp.dstack.top()?;
    interp.push(Value::literal(Object::Dict(d)));
    Ok(())
}

pub(super) fn countdictstack(interp: &mut Interpreter) -> InterpResult<()> {
    let n = i64::try_from(interp.dstack.len()).map_err(|_| rangecheck("stack too deep"))?;
    interp.push(Value::int(n));
    Ok(())
}

/// Fill an array with the dictionary stack, bottom first.
pub(super) fn dictstack(interp: &mut Interpreter) -> InterpResult<()> {
    let target = interp.pop()?;
    let items: Vec<Value> = interp
        .dstack
        .as_slice()
        .iter()
        .map(|&d| Value::literal(Object::Dict(d)))
        .collect();
    let a = target.to_array()?;
    target.check_access(false, false, true)?;
    if items.len() > a.len {
        return Err(rangecheck("array too small for dictstack"));
    }
    interp.vm.array_mut(a)?[..items.len()].clone_from_slice(&items);
    interp.push(Value {
        object: Object::Array(a.slice(0, items.len())),
        ..target
    });
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn cleardictstack(interp: &mut Interpreter) -> InterpResult<()> {
    interp.dstack.clear();
    Ok(())
}
