//! `save`/`restore` and VM allocation mode.

use crate::error::{ErrorKind, InterpResult, InterpreterError, rangecheck};
use crate::interpreter::{Interpreter, SaveRecord};
use crate::types::{Object, SaveId, Value};

fn invalid_restore(message: impl Into<String>) -> InterpreterError {
    InterpreterError::new(ErrorKind::InvalidRestore, message)
}

pub(super) fn save(interp: &mut Interpreter) -> InterpResult<()> {
    let id = SaveId(interp.next_save);
    interp.next_save += 1;
    let gstate_depth = interp.gstates.depth();
    let device = interp.gstates.push(true);
    interp.open_scope(device)?;
    interp.saves.push(SaveRecord {
        id,
        snapshot: interp.vm.snapshot(),
        gstate_depth,
        packing: interp.packing,
        global_mode: interp.vm.is_global(),
    });
    tracing::debug!(level = interp.saves.len(), "save");
    interp.push(Value::literal(Object::Save(id)));
    Ok(())
}

pub(super) fn restore(interp: &mut Interpreter) -> InterpResult<()> {
    let id = interp.ostack.peek(0)?.to_save()?;
    let index = interp
        .saves
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| invalid_restore("save object is no longer valid"))?;
    let mark = interp.saves[index].snapshot.mark;
    let newer_local = |v: &Value| v.handle().is_some_and(|h| !h.global && h.id >= mark);
    if interp.ostack.as_slice()[..interp.ostack.len() - 1]
        .iter()
        .any(newer_local)
    {
        return Err(invalid_restore("operand stack holds objects created after save"));
    }
    if interp
        .dstack
        .as_slice()
        .iter()
        .any(|d| !d.handle.global && d.handle.id >= mark)
    {
        return Err(invalid_restore("dictionary stack holds objects created after save"));
    }
    interp.pop()?;
    // Saves nested inside this one are discarded with it.
    let record = interp.saves.split_off(index).swap_remove(0);
    interp.vm.restore(record.snapshot);
    for device in interp.gstates.restore_to(record.gstate_depth) {
        interp.close_scope(device)?;
    }
    interp.packing = record.packing;
    interp.vm.set_global(record.global_mode);
    super::params::apply_user_params(interp)?;
    tracing::debug!(level = interp.saves.len(), "restore");
    Ok(())
}

pub(super) fn setglobal(interp: &mut Interpreter) -> InterpResult<()> {
    let global = interp.pop_bool()?;
    interp.vm.set_global(global);
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn currentglobal(interp: &mut Interpreter) -> InterpResult<()> {
    interp.push(Value::boolean(interp.vm.is_global()));
    Ok(())
}

/// Simple objects count as global.
pub(super) fn gcheck(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    let global = v.handle().is_none_or(|h| h.global);
    interp.push(Value::boolean(global));
    Ok(())
}

/// `level used maximum`, counting live composite objects.
pub(super) fn vmstatus(interp: &mut Interpreter) -> InterpResult<()> {
    let (local, global) = interp.vm.counts();
    let to_int = |n: usize| i64::try_from(n).map_err(|_| rangecheck("VM too large"));
    let level = to_int(interp.saves.len())?;
    let used = to_int(local + global)?;
    let maximum = to_int(interp.vm.max_objects())?;
    interp.push(Value::int(level));
    interp.push(Value::int(used));
    interp.push(Value::int(maximum));
    Ok(())
}
