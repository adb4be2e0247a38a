//! Operand stack manipulation.

use crate::error::{InterpResult, rangecheck};
use crate::interpreter::Interpreter;
use crate::types::{Object, Value};

pub(super) fn pop(interp: &mut Interpreter) -> InterpResult<()> {
    interp.pop()?;
    Ok(())
}

pub(super) fn exch(interp: &mut Interpreter) -> InterpResult<()> {
    let b = interp.pop()?;
    let a = interp.pop()?;
    interp.push(b);
    interp.push(a);
    Ok(())
}

pub(super) fn dup(interp: &mut Interpreter) -> InterpResult<()> {
    let top = interp.ostack.peek(0)?.clone();
    interp.push(top);
    Ok(())
}

/// `n copy` duplicates the top `n` values; with a composite on top it is
/// the composite copy.
pub(super) fn copy(interp: &mut Interpreter) -> InterpResult<()> {
    let top = interp.pop()?;
    if let Object::Integer(_) = top.object {
        let n = top.to_index()?;
        interp.ostack.require(n)?;
        let start = interp.ostack.len() - n;
        let items = interp.ostack.as_slice()[start..].to_vec();
        for v in items {
            interp.push(v);
        }
        return Ok(());
    }
    let source = interp.pop()?;
    let result = super::array::copy_composite(interp, &source, top)?;
    interp.push(result);
    Ok(())
}

pub(super) fn index(interp: &mut Interpreter) -> InterpResult<()> {
    let n = interp.pop_index()?;
    let v = interp
        .ostack
        .peek(n)
        .map_err(|_| rangecheck(format!("index {n} beyond stack")))?
        .clone();
    interp.push(v);
    Ok(())
}

/// `n j roll`: rotate the top `n` values by `j` positions upwards.
pub(super) fn roll(interp: &mut Interpreter) -> InterpResult<()> {
    let j = interp.pop_int()?;
    let n = interp.pop_index()?;
    if n == 0 {
        return Ok(());
    }
    let mut items = interp.ostack.pop_n(n)?;
    let n_i64 = i64::try_from(n).map_err(|_| rangecheck("roll count too large"))?;
    let shift = usize::try_from(j.rem_euclid(n_i64)).map_err(|_| rangecheck("bad roll"))?;
    items.rotate_right(shift);
    for v in items {
        interp.push(v);
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn clear(interp: &mut Interpreter) -> InterpResult<()> {
    interp.ostack.clear();
    Ok(())
}

pub(super) fn count(interp: &mut Interpreter) -> InterpResult<()> {
    let n = i64::try_from(interp.ostack.len()).map_err(|_| rangecheck("stack too deep"))?;
    interp.push(Value::int(n));
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn mark(interp: &mut Interpreter) -> InterpResult<()> {
    interp.push(Value::mark());
    Ok(())
}

pub(super) fn cleartomark(interp: &mut Interpreter) -> InterpResult<()> {
    let n = interp.ostack.count_to_mark()?;
    interp.ostack.pop_n(n + 1)?;
    Ok(())
}

pub(super) fn counttomark(interp: &mut Interpreter) -> InterpResult<()> {
    let n = interp.ostack.count_to_mark()?;
    let n = i64::try_from(n).map_err(|_| rangecheck("stack too deep"))?;
    interp.push(Value::int(n));
    Ok(())
}
