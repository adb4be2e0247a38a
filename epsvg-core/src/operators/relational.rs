//! Comparison, boolean and bitwise operators.

use std::cmp::Ordering;

use crate::error::{InterpResult, typecheck};
use crate::interpreter::Interpreter;
use crate::types::{Object, Value};
use crate::vm::Vm;

/// `eq` semantics: numbers by value, strings and names by text, other
/// composites by identity.
pub(crate) fn values_equal(vm: &Vm, a: &Value, b: &Value) -> bool {
    if a.is_number() && b.is_number() {
        return matches!((a.to_real(), b.to_real()), (Ok(x), Ok(y)) if x == y);
    }
    let text = |v: &Value| -> Option<Vec<u8>> {
        match &v.object {
            Object::String(s) => vm.string(*s).ok().map(<[u8]>::to_vec),
            Object::Name(n) => Some(n.as_bytes().to_vec()),
            _ => None,
        }
    };
    match (&a.object, &b.object) {
        (Object::String(_) | Object::Name(_), Object::String(_) | Object::Name(_)) => {
            text(a) == text(b)
        }
        (Object::Boolean(x), Object::Boolean(y)) => x == y,
        _ => a.same_object(b),
    }
}

pub(super) fn eq(interp: &mut Interpreter) -> InterpResult<()> {
    let b = interp.pop()?;
    let a = interp.pop()?;
    let result = values_equal(&interp.vm, &a, &b);
    interp.push(Value::boolean(result));
    Ok(())
}

pub(super) fn ne(interp: &mut Interpreter) -> InterpResult<()> {
    let b = interp.pop()?;
    let a = interp.pop()?;
    let result = !values_equal(&interp.vm, &a, &b);
    interp.push(Value::boolean(result));
    Ok(())
}

/// Order two numbers or two strings.
fn compare(interp: &mut Interpreter) -> InterpResult<Option<Ordering>> {
    let b = interp.pop()?;
    let a = interp.pop()?;
    match (&a.object, &b.object) {
        (Object::String(_), Object::String(_)) => {
            let x = interp.text_bytes(&a)?;
            let y = interp.text_bytes(&b)?;
            Ok(Some(x.cmp(&y)))
        }
        _ if a.is_number() && b.is_number() => Ok(a.to_real()?.partial_cmp(&b.to_real()?)),
        _ => Err(typecheck(format!(
            "cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn relation(interp: &mut Interpreter, accept: fn(Ordering) -> bool) -> InterpResult<()> {
    let result = compare(interp)?.is_some_and(accept);
    interp.push(Value::boolean(result));
    Ok(())
}

pub(super) fn gt(interp: &mut Interpreter) -> InterpResult<()> {
    relation(interp, Ordering::is_gt)
}

pub(super) fn ge(interp: &mut Interpreter) -> InterpResult<()> {
    relation(interp, Ordering::is_ge)
}

pub(super) fn lt(interp: &mut Interpreter) -> InterpResult<()> {
    relation(interp, Ordering::is_lt)
}

pub(super) fn le(interp: &mut Interpreter) -> InterpResult<()> {
    relation(interp, Ordering::is_le)
}

// ---------------------------------------------------------------------------
// Logical and bitwise
// ---------------------------------------------------------------------------

fn logical(
    interp: &mut Interpreter,
    on_bool: fn(bool, bool) -> bool,
    on_int: fn(i64, i64) -> i64,
) -> InterpResult<()> {
    let b = interp.pop()?;
    let a = interp.pop()?;
    let result = match (&a.object, &b.object) {
        (Object::Boolean(x), Object::Boolean(y)) => Value::boolean(on_bool(*x, *y)),
        (Object::Integer(x), Object::Integer(y)) => Value::int(on_int(*x, *y)),
        _ => {
            return Err(typecheck(format!(
                "expected two booleans or two integers, got {} and {}",
                a.type_name(),
                b.type_name()
            )));
        }
    };
    interp.push(result);
    Ok(())
}

pub(super) fn and(interp: &mut Interpreter) -> InterpResult<()> {
    logical(interp, |a, b| a & b, |a, b| a & b)
}

pub(super) fn or(interp: &mut Interpreter) -> InterpResult<()> {
    logical(interp, |a, b| a | b, |a, b| a | b)
}

pub(super) fn xor(interp: &mut Interpreter) -> InterpResult<()> {
    logical(interp, |a, b| a ^ b, |a, b| a ^ b)
}

pub(super) fn not(interp: &mut Interpreter) -> InterpResult<()> {
    let a = interp.pop()?;
    let result = match a.object {
        Object::Boolean(x) => Value::boolean(!x),
        Object::Integer(x) => Value::int(!x),
        _ => return Err(typecheck(format!("not of {}", a.type_name()))),
    };
    interp.push(result);
    Ok(())
}

/// `int shift bitshift`: positive shifts go left. Shifts operate on 32
/// bits, as on a real interpreter.
pub(super) fn bitshift(interp: &mut Interpreter) -> InterpResult<()> {
    let shift = interp.pop_int()?;
    let value = interp.pop_int()?;
    #[expect(clippy::cast_possible_truncation, reason = "32-bit PostScript integers")]
    let bits = value as u32;
    let shifted = match u32::try_from(shift.unsigned_abs()) {
        Ok(n) if n < 32 && shift >= 0 => bits << n,
        Ok(n) if n < 32 => bits >> n,
        _ => 0,
    };
    #[expect(clippy::cast_possible_wrap, reason = "reinterpret as signed")]
    let signed = shifted as i32;
    interp.push(Value::int(i64::from(signed)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_across_types() {
        let vm = Vm::new(10);
        assert!(values_equal(&vm, &Value::int(1), &Value::real(1.0)));
        assert!(!values_equal(&vm, &Value::int(1), &Value::real(1.5)));
    }

    #[test]
    fn names_equal_strings_by_text() {
        let mut vm = Vm::new(10);
        let s = Value::literal(Object::String(vm.new_string(b"abc".to_vec()).unwrap()));
        assert!(values_equal(&vm, &s, &Value::name("abc")));
        assert!(!values_equal(&vm, &s, &Value::name("abd")));
    }

    #[test]
    fn arrays_compare_by_identity() {
        let mut vm = Vm::new(10);
        let a = Value::literal(Object::Array(vm.new_array(vec![]).unwrap()));
        let b = Value::literal(Object::Array(vm.new_array(vec![]).unwrap()));
        assert!(values_equal(&vm, &a, &a.clone()));
        assert!(!values_equal(&vm, &a, &b));
    }
}
