//! User and system parameters.
//!
//! User parameters live in a local dictionary, so `restore` rolls them
//! back; the stack limits they carry are re-applied afterwards. System
//! parameters live in global VM.

use crate::error::{InterpResult, invalidaccess, rangecheck, typecheck};
use crate::interpreter::Interpreter;
use crate::types::{DictRef, Object, Value};

/// Integer user parameters that bound interpreter resources, with the
/// smallest value each accepts.
const LIMITS: &[(&str, i64)] = &[("MaxExecStack", 16), ("MaxOpStack", 16), ("MaxDictStack", 4)];

/// Copy every entry of `from` into a fresh dictionary.
fn copy_dict(interp: &mut Interpreter, from: DictRef) -> InterpResult<Value> {
    let entries: Vec<(Value, Value)> = interp
        .vm
        .dict(from)?
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let copy = interp.new_dict_value(entries.len())?;
    let d = copy.to_dict()?;
    for (k, v) in entries {
        interp.dict_put(d, k, v)?;
    }
    Ok(copy)
}

/// Merge the recognized entries of `from` into `into`.
fn merge(interp: &mut Interpreter, from: DictRef, into: DictRef) -> InterpResult<()> {
    if !interp.vm.dict(from)?.access.can_read() {
        return Err(invalidaccess("parameter dictionary is not readable"));
    }
    let entries: Vec<(Value, Value)> = interp
        .vm
        .dict(from)?
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (key, value) in entries {
        let k = interp.dict_key(&key)?;
        if !interp.vm.dict(into)?.contains_key(&k) {
            // Unknown parameters are ignored.
            continue;
        }
        let limit = match &key.object {
            Object::Name(n) => LIMITS.iter().find(|(name, _)| name.as_bytes() == n.as_bytes()),
            _ => None,
        };
        if let Some(&(name, min)) = limit {
            let v = value.to_int()?;
            if v < min {
                return Err(rangecheck(format!("{name} must be at least {min}")));
            }
        }
        interp.vm.dict_mut(into)?.insert(k, key, value);
    }
    Ok(())
}

/// Push the stack limits held in the user parameters into the stacks.
pub(crate) fn apply_user_params(interp: &mut Interpreter) -> InterpResult<()> {
    let params = interp.vm.dict(interp.dicts.user_params)?;
    let limit = |name: &str| -> Option<usize> {
        params
            .get_name(name)
            .and_then(|v| v.to_int().ok())
            .and_then(|v| usize::try_from(v).ok())
    };
    let (exec, op, dict) = (
        limit("MaxExecStack"),
        limit("MaxOpStack"),
        limit("MaxDictStack"),
    );
    if let Some(n) = exec {
        interp.options.max_exec_stack = n;
        interp.estack.set_limit(n);
    }
    if let Some(n) = op {
        interp.options.max_op_stack = n;
    }
    if let Some(n) = dict {
        interp.options.max_dict_stack = n;
        interp.dstack.set_limit(n);
    }
    Ok(())
}

pub(super) fn currentuserparams(interp: &mut Interpreter) -> InterpResult<()> {
    let params = interp.dicts.user_params;
    let copy = copy_dict(interp, params)?;
    interp.push(copy);
    Ok(())
}

pub(super) fn setuserparams(interp: &mut Interpreter) -> InterpResult<()> {
    let from = interp.pop_dict()?;
    let into = interp.dicts.user_params;
    merge(interp, from, into)?;
    apply_user_params(interp)
}

pub(super) fn currentsystemparams(interp: &mut Interpreter) -> InterpResult<()> {
    let params = interp.dicts.system_params;
    let copy = copy_dict(interp, params)?;
    interp.push(copy);
    Ok(())
}

/// Only the password-free parameters are writable; everything recognized
/// is stored as given.
pub(super) fn setsystemparams(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    let Object::Dict(from) = v.object else {
        return Err(typecheck(format!("expected dictionary, got {}", v.type_name())));
    };
    let into = interp.dicts.system_params;
    interp.in_global(|interp| merge(interp, from, into))
}
