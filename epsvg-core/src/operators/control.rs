//! Control operators and the loop continuations.
//!
//! A looping operator validates its operands, pushes its continuation
//! operator on the execution stack and one [`ContFrame`] on the
//! continuation stack, and returns. Each time the run loop reaches the
//! continuation operator it pops the frame, does one iteration's worth of
//! work and, unless the loop is finished, re-arms itself beneath the
//! procedure. `exit` and `stop` unwind by walking the execution stack and
//! dropping one frame per continuation operator they pass.

use std::collections::{HashSet, VecDeque};

use crate::dict::DictKey;
use crate::error::{ErrorKind, InterpResult, InterpreterError, rangecheck, typecheck};
use crate::interpreter::Interpreter;
use crate::operators::{OpRole, OperatorDef};
use crate::stacks::{ContFrame, ForCounter};
use crate::types::{Access, Object, Value};

pub(crate) static FOR_CONT: OperatorDef = OperatorDef::with_role("@for", for_cont, OpRole::Loop);
pub(crate) static FORALL_CONT: OperatorDef =
    OperatorDef::with_role("@forall", forall_cont, OpRole::Loop);
pub(crate) static LOOP_CONT: OperatorDef = OperatorDef::with_role("@loop", loop_cont, OpRole::Loop);
pub(crate) static REPEAT_CONT: OperatorDef =
    OperatorDef::with_role("@repeat", repeat_cont, OpRole::Loop);
pub(crate) static STOPPED_CONT: OperatorDef =
    OperatorDef::with_role("@stopped", stopped_cont, OpRole::Stopped);
pub(crate) static EXEC_MARKER: OperatorDef =
    OperatorDef::with_role("@exec", exec_marker, OpRole::Marker);

/// Start a loop: arm `op` with `frame`.
pub(crate) fn enter_loop(
    interp: &mut Interpreter,
    op: &'static OperatorDef,
    frame: ContFrame,
) -> InterpResult<()> {
    interp.estack.push(Value::operator(op))?;
    interp.cstack.push(frame);
    Ok(())
}

/// Re-arm `op` with `frame` and run `proc` first.
pub(crate) fn rearm(
    interp: &mut Interpreter,
    op: &'static OperatorDef,
    frame: ContFrame,
    proc: Value,
) -> InterpResult<()> {
    enter_loop(interp, op, frame)?;
    interp.estack.push(proc)
}

// ---------------------------------------------------------------------------
// Conditionals and exec
// ---------------------------------------------------------------------------

/// Run `v` as `exec` does. Operators are scheduled rather than called, so
/// an error inside one names that operator as the offending command.
fn schedule(interp: &mut Interpreter, v: Value) -> InterpResult<()> {
    if v.executable && matches!(v.object, Object::Operator(_)) {
        return interp.estack.push(v);
    }
    interp.execute_indirect(v)
}

pub(super) fn exec(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    schedule(interp, v)
}

pub(super) fn if_op(interp: &mut Interpreter) -> InterpResult<()> {
    let proc = interp.pop_proc()?;
    if interp.pop_bool()? {
        interp.estack.push(proc)?;
    }
    Ok(())
}

pub(super) fn ifelse(interp: &mut Interpreter) -> InterpResult<()> {
    let otherwise = interp.pop_proc()?;
    let then = interp.pop_proc()?;
    let chosen = if interp.pop_bool()? { then } else { otherwise };
    interp.estack.push(chosen)
}

// ---------------------------------------------------------------------------
// for
// ---------------------------------------------------------------------------

/// Integral value of a number operand, if it has one.
#[expect(clippy::cast_possible_truncation, reason = "integral and range checked")]
fn integral(v: &Value) -> InterpResult<Option<i64>> {
    Ok(match v.object {
        Object::Integer(i) => Some(i),
        Object::Real(r) if r == r.round() && r.abs() < 9.0e15 => Some(r as i64),
        _ => {
            v.to_real()?;
            None
        }
    })
}

pub(super) fn for_op(interp: &mut Interpreter) -> InterpResult<()> {
    let proc = interp.pop_proc()?;
    let limit = interp.pop()?;
    let increment = interp.pop()?;
    let initial = interp.pop()?;
    let counter = match (integral(&initial)?, integral(&increment)?, integral(&limit)?) {
        (Some(current), Some(increment), Some(limit)) => ForCounter::Integer {
            current,
            increment,
            limit,
        },
        _ => ForCounter::Real {
            current: initial.to_real()?,
            increment: increment.to_real()?,
            limit: limit.to_real()?,
        },
    };
    let zero_step = match counter {
        ForCounter::Integer { increment, .. } => increment == 0,
        ForCounter::Real { increment, .. } => increment == 0.0,
    };
    if zero_step {
        return Ok(());
    }
    enter_loop(interp, &FOR_CONT, ContFrame::For { counter, proc })
}

fn for_cont(interp: &mut Interpreter) -> InterpResult<()> {
    let (counter, proc) = interp.cstack.take("@for", |f| match f {
        ContFrame::For { counter, proc } => Ok((counter, proc)),
        other => Err(other),
    })?;
    let Some(value) = counter.value() else {
        return Ok(());
    };
    interp.push(value);
    // An integer counter that would overflow has passed every limit.
    let next = counter.advanced().unwrap_or(ForCounter::Real {
        current: f64::NAN,
        increment: 0.0,
        limit: 0.0,
    });
    rearm(
        interp,
        &FOR_CONT,
        ContFrame::For {
            counter: next,
            proc: proc.clone(),
        },
        proc,
    )
}

// ---------------------------------------------------------------------------
// repeat, loop
// ---------------------------------------------------------------------------

pub(super) fn repeat(interp: &mut Interpreter) -> InterpResult<()> {
    let proc = interp.pop_proc()?;
    let remaining = interp.pop_int()?;
    if remaining < 0 {
        return Err(rangecheck("negative repeat count"));
    }
    enter_loop(interp, &REPEAT_CONT, ContFrame::Repeat { remaining, proc })
}

fn repeat_cont(interp: &mut Interpreter) -> InterpResult<()> {
    let (remaining, proc) = interp.cstack.take("@repeat", |f| match f {
        ContFrame::Repeat { remaining, proc } => Ok((remaining, proc)),
        other => Err(other),
    })?;
    if remaining <= 0 {
        return Ok(());
    }
    rearm(
        interp,
        &REPEAT_CONT,
        ContFrame::Repeat {
            remaining: remaining - 1,
            proc: proc.clone(),
        },
        proc,
    )
}

pub(super) fn loop_op(interp: &mut Interpreter) -> InterpResult<()> {
    let proc = interp.pop_proc()?;
    enter_loop(interp, &LOOP_CONT, ContFrame::Loop { proc })
}

fn loop_cont(interp: &mut Interpreter) -> InterpResult<()> {
    let proc = interp.cstack.take("@loop", |f| match f {
        ContFrame::Loop { proc } => Ok(proc),
        other => Err(other),
    })?;
    rearm(interp, &LOOP_CONT, ContFrame::Loop { proc: proc.clone() }, proc)
}

// ---------------------------------------------------------------------------
// forall
// ---------------------------------------------------------------------------

/// Start a `forall`-style loop handing `per_step` items to `proc` per
/// iteration.
pub(crate) fn start_forall(
    interp: &mut Interpreter,
    per_step: usize,
    items: VecDeque<Value>,
    proc: Value,
) -> InterpResult<()> {
    enter_loop(
        interp,
        &FORALL_CONT,
        ContFrame::Forall {
            per_step,
            items,
            proc,
        },
    )
}

pub(super) fn forall(interp: &mut Interpreter) -> InterpResult<()> {
    let proc = interp.pop_proc()?;
    let target = interp.pop()?;
    let (per_step, items): (usize, VecDeque<Value>) = match &target.object {
        Object::Array(_) | Object::Matrix(_) => (1, interp.array_items(&target)?.into()),
        Object::String(s) => {
            target.check_access(false, true, false)?;
            let bytes = interp.vm.string(*s)?;
            (1, bytes.iter().map(|&b| Value::int(i64::from(b))).collect())
        }
        Object::Dict(d) => {
            let dict = interp.vm.dict(*d)?;
            if !dict.access.can_read() {
                return Err(crate::error::invalidaccess("dictionary is not readable"));
            }
            let pairs = dict
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect();
            (2, pairs)
        }
        _ => {
            return Err(typecheck(format!("forall over {}", target.type_name())));
        }
    };
    start_forall(interp, per_step, items, proc)
}

fn forall_cont(interp: &mut Interpreter) -> InterpResult<()> {
    let (per_step, mut items, proc) = interp.cstack.take("@forall", |f| match f {
        ContFrame::Forall {
            per_step,
            items,
            proc,
        } => Ok((per_step, items, proc)),
        other => Err(other),
    })?;
    if items.len() < per_step.max(1) {
        return Ok(());
    }
    for item in items.drain(..per_step) {
        interp.push(item);
    }
    rearm(
        interp,
        &FORALL_CONT,
        ContFrame::Forall {
            per_step,
            items,
            proc: proc.clone(),
        },
        proc,
    )
}

// ---------------------------------------------------------------------------
// exit, stop, stopped
// ---------------------------------------------------------------------------

fn invalid_exit(message: &str) -> InterpreterError {
    InterpreterError::new(ErrorKind::InvalidExit, message)
}

pub(super) fn exit(interp: &mut Interpreter) -> InterpResult<()> {
    let mut target = None;
    for (i, entry) in interp.estack.as_slice().iter().enumerate().rev() {
        match &entry.object {
            Object::Operator(op) if op.role == OpRole::Loop => {
                target = Some(i);
                break;
            }
            Object::Operator(op) if op.role != OpRole::Plain => {
                return Err(invalid_exit("exit would leave a stopped context"));
            }
            Object::File(_) if entry.executable => {
                return Err(invalid_exit("exit outside of a loop"));
            }
            _ => {}
        }
    }
    let Some(index) = target else {
        return Err(invalid_exit("exit outside of a loop"));
    };
    interp.estack.truncate(index);
    interp.cstack.pop()?;
    Ok(())
}

pub(super) fn stop(interp: &mut Interpreter) -> InterpResult<()> {
    while let Some(entry) = interp.estack.pop() {
        let Object::Operator(op) = &entry.object else {
            continue;
        };
        match op.role {
            OpRole::Loop => {
                interp.cstack.pop()?;
            }
            OpRole::Stopped => {
                interp.set_error_pending(true)?;
                interp.estack.force_push(entry);
                return Ok(());
            }
            OpRole::Plain | OpRole::Marker => {}
        }
    }
    interp.cstack.clear();
    Ok(())
}

pub(super) fn stopped(interp: &mut Interpreter) -> InterpResult<()> {
    let target = interp.pop()?;
    enter_loop(interp, &STOPPED_CONT, ContFrame::Stopped)?;
    schedule(interp, target)
}

fn stopped_cont(interp: &mut Interpreter) -> InterpResult<()> {
    interp.cstack.take("@stopped", |f| match f {
        ContFrame::Stopped => Ok(()),
        other => Err(other),
    })?;
    let pending = interp.error_pending()?;
    interp.set_error_pending(false)?;
    interp.push(Value::boolean(pending));
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
const fn exec_marker(_interp: &mut Interpreter) -> InterpResult<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Execution stack inspection
// ---------------------------------------------------------------------------

pub(super) fn countexecstack(interp: &mut Interpreter) -> InterpResult<()> {
    let n = i64::try_from(interp.estack.len()).map_err(|_| rangecheck("stack too deep"))?;
    interp.push(Value::int(n));
    Ok(())
}

/// The execution stack as PostScript code sees it. Continuation
/// operators only make sense beside their own frame, so they appear as
/// executable nulls.
pub(crate) fn visible_exec_stack(interp: &Interpreter) -> Vec<Value> {
    interp
        .estack
        .as_slice()
        .iter()
        .map(|v| match &v.object {
            Object::Operator(op) if op.role != OpRole::Plain => Value {
                executable: true,
                ..Value::null()
            },
            _ => v.clone(),
        })
        .collect()
}

pub(super) fn execstack(interp: &mut Interpreter) -> InterpResult<()> {
    let target = interp.pop()?;
    let a = target.to_array()?;
    target.check_access(false, false, true)?;
    let items = visible_exec_stack(interp);
    if items.len() > a.len {
        return Err(rangecheck("array too small for execstack"));
    }
    let n = items.len();
    interp.vm.array_mut(a)?[..n].clone_from_slice(&items);
    interp.push(Value {
        object: Object::Array(a.slice(0, n)),
        ..target
    });
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn quit(interp: &mut Interpreter) -> InterpResult<()> {
    tracing::debug!("quit");
    interp.estack.truncate(0);
    interp.cstack.clear();
    interp.quit = true;
    Ok(())
}

// ---------------------------------------------------------------------------
// bind
// ---------------------------------------------------------------------------

pub(super) fn bind(interp: &mut Interpreter) -> InterpResult<()> {
    let proc = interp.ostack.peek(0)?.clone();
    proc.to_proc()?;
    let mut seen = HashSet::new();
    bind_procedure(interp, &proc, &mut seen)
}

/// Replace executable names bound to operators by the operators, in
/// `proc` and every procedure nested in it. Nested procedures become
/// read-only; read-only procedures are only descended into.
fn bind_procedure(
    interp: &mut Interpreter,
    proc: &Value,
    seen: &mut HashSet<(u64, usize)>,
) -> InterpResult<()> {
    let a = proc.to_array()?;
    if !seen.insert((a.handle.id, a.start)) {
        return Ok(());
    }
    let writable = proc.access.can_write();
    let items = interp.vm.array(a)?.to_vec();
    for (i, item) in items.iter().enumerate() {
        match &item.object {
            Object::Name(n) if item.executable && writable => {
                let found = interp.lookup(&DictKey::Name(n.clone()))?;
                let is_operator =
                    |v: &Value| v.executable && matches!(v.object, Object::Operator(_));
                if let Some(op) = found.filter(is_operator) {
                    interp.vm.array_mut(a)?[i] = op;
                }
            }
            Object::Array(_) if item.executable => {
                bind_procedure(interp, item, seen)?;
                if writable {
                    interp.vm.array_mut(a)?[i].access = item.access.restrict(Access::READ_ONLY);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// `.errorproc`: record an error in `$error`. Runs as `errordict`
/// procedures do: `offending /name .errorproc stop`.
pub(super) fn errorproc(interp: &mut Interpreter) -> InterpResult<()> {
    let name = interp.pop()?;
    let command = interp.pop()?;
    let err = interp.dollar_error()?;
    let record = {
        let d = interp.vm.dict_mut(err)?;
        d.insert_name("newerror", Value::boolean(true));
        d.insert_name("errorname", name.cvlit());
        d.insert_name("command", command);
        d.insert_name("errorinfo", Value::null());
        d.get_name("recordstacks")
            .is_some_and(|v| matches!(v.object, Object::Boolean(true)))
    };
    if record {
        let ostack = interp.ostack.as_slice().to_vec();
        let mut estack = visible_exec_stack(interp);
        estack.pop();
        let dstack = interp
            .dstack
            .as_slice()
            .iter()
            .map(|&d| Value::literal(Object::Dict(d)))
            .collect();
        for (key, items) in [("ostack", ostack), ("estack", estack), ("dstack", dstack)] {
            // Out of VM: the stacks simply go unrecorded.
            if let Ok(array) = interp.new_array_value(items) {
                interp.vm.dict_mut(err)?.insert_name(key, array);
            }
        }
    }
    Ok(())
}

pub(super) fn handleerror(interp: &mut Interpreter) -> InterpResult<()> {
    report_error(interp)
}

fn describe(interp: &Interpreter, v: &Value) -> String {
    match v.object {
        Object::Name(_) | Object::Operator(_) => {
            String::from_utf8_lossy(&interp.text_of(v)).into_owned()
        }
        _ => interp.syntax_of(v),
    }
}

/// Default error report: print the error line, log it and clear
/// `newerror`.
pub(crate) fn report_error(interp: &mut Interpreter) -> InterpResult<()> {
    let err = interp.dollar_error()?;
    let (name, command, ostack) = {
        let d = interp.vm.dict(err)?;
        let field = |key| d.get_name(key).cloned().unwrap_or_else(Value::null);
        (field("errorname"), field("command"), field("ostack"))
    };
    let name = describe(interp, &name);
    let command = describe(interp, &command);
    let ostack = match ostack.object {
        Object::Array(_) => interp.syntax_of(&ostack),
        _ => String::new(),
    };
    let line = format!("%%[ Error: {name}; OffendingCommand: {command} ]%%\n");
    interp.stdout.extend_from_slice(line.as_bytes());
    tracing::error!(error = %name, command = %command, ostack = %ostack, "unhandled PostScript error");
    let kind = ErrorKind::from_name(&name).unwrap_or(ErrorKind::Undefined);
    interp.last_error = Some(InterpreterError::new(
        kind,
        format!("OffendingCommand: {command}"),
    ));
    interp.set_error_pending(false)
}
