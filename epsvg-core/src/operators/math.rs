//! Arithmetic and mathematical operators.
//!
//! Integer operations use checked arithmetic and fall back to reals on
//! overflow. Real results that are not finite raise `undefinedresult`.

use crate::error::{ErrorKind, InterpResult, InterpreterError, rangecheck, typecheck};
use crate::interpreter::Interpreter;
use crate::types::{Object, Value};

/// A numeric operand.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Real(f64),
}

impl Num {
    #[expect(clippy::cast_precision_loss, reason = "PostScript integer widening")]
    const fn real(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Real(r) => r,
        }
    }
}

fn pop_num(interp: &mut Interpreter) -> InterpResult<Num> {
    let v = interp.pop()?;
    match v.object {
        Object::Integer(i) => Ok(Num::Int(i)),
        Object::Real(r) => Ok(Num::Real(r)),
        _ => Err(typecheck(format!("expected number, got {}", v.type_name()))),
    }
}

fn undefined_result(message: &str) -> InterpreterError {
    InterpreterError::new(ErrorKind::UndefinedResult, message)
}

/// A real result, rejecting infinities and NaN.
fn real_result(r: f64) -> InterpResult<Value> {
    if r.is_finite() {
        Ok(Value::real(r))
    } else {
        Err(undefined_result("result is not a finite number"))
    }
}

fn binary(
    interp: &mut Interpreter,
    int_op: fn(i64, i64) -> Option<i64>,
    real_op: fn(f64, f64) -> f64,
) -> InterpResult<()> {
    let b = pop_num(interp)?;
    let a = pop_num(interp)?;
    let result = match (a, b) {
        (Num::Int(x), Num::Int(y)) => match int_op(x, y) {
            Some(v) => Value::int(v),
            None => real_result(real_op(a.real(), b.real()))?,
        },
        _ => real_result(real_op(a.real(), b.real()))?,
    };
    interp.push(result);
    Ok(())
}

pub(super) fn add(interp: &mut Interpreter) -> InterpResult<()> {
    binary(interp, i64::checked_add, |a, b| a + b)
}

pub(super) fn sub(interp: &mut Interpreter) -> InterpResult<()> {
    binary(interp, i64::checked_sub, |a, b| a - b)
}

pub(super) fn mul(interp: &mut Interpreter) -> InterpResult<()> {
    binary(interp, i64::checked_mul, |a, b| a * b)
}

pub(super) fn div(interp: &mut Interpreter) -> InterpResult<()> {
    let b = pop_num(interp)?.real();
    let a = pop_num(interp)?.real();
    if b == 0.0 {
        return Err(undefined_result("division by zero"));
    }
    interp.push(real_result(a / b)?);
    Ok(())
}

fn integer_division(interp: &mut Interpreter, op: fn(i64, i64) -> Option<i64>) -> InterpResult<()> {
    let b = interp.pop_int()?;
    let a = interp.pop_int()?;
    if b == 0 {
        return Err(undefined_result("division by zero"));
    }
    let v = op(a, b).ok_or_else(|| undefined_result("integer overflow"))?;
    interp.push(Value::int(v));
    Ok(())
}

pub(super) fn idiv(interp: &mut Interpreter) -> InterpResult<()> {
    integer_division(interp, i64::checked_div)
}

pub(super) fn modulo(interp: &mut Interpreter) -> InterpResult<()> {
    integer_division(interp, i64::checked_rem)
}

fn unary(
    interp: &mut Interpreter,
    int_op: fn(i64) -> Option<i64>,
    real_op: fn(f64) -> f64,
) -> InterpResult<()> {
    let a = pop_num(interp)?;
    let result = match a {
        Num::Int(x) => match int_op(x) {
            Some(v) => Value::int(v),
            None => real_result(real_op(a.real()))?,
        },
        Num::Real(x) => real_result(real_op(x))?,
    };
    interp.push(result);
    Ok(())
}

pub(super) fn abs(interp: &mut Interpreter) -> InterpResult<()> {
    unary(interp, i64::checked_abs, f64::abs)
}

pub(super) fn neg(interp: &mut Interpreter) -> InterpResult<()> {
    unary(interp, i64::checked_neg, |x| -x)
}

pub(super) fn ceiling(interp: &mut Interpreter) -> InterpResult<()> {
    unary(interp, Some, f64::ceil)
}

pub(super) fn floor(interp: &mut Interpreter) -> InterpResult<()> {
    unary(interp, Some, f64::floor)
}

/// Halves round up, as PostScript requires (`-2.5 round` is `-2.0`).
pub(super) fn round(interp: &mut Interpreter) -> InterpResult<()> {
    unary(interp, Some, |x| (x + 0.5).floor())
}

pub(super) fn truncate(interp: &mut Interpreter) -> InterpResult<()> {
    unary(interp, Some, f64::trunc)
}

pub(super) fn sqrt(interp: &mut Interpreter) -> InterpResult<()> {
    let x = interp.pop_real()?;
    if x < 0.0 {
        return Err(rangecheck("square root of a negative number"));
    }
    interp.push(Value::real(x.sqrt()));
    Ok(())
}

/// `num den atan`: angle in degrees in `[0, 360)`.
pub(super) fn atan(interp: &mut Interpreter) -> InterpResult<()> {
    let den = interp.pop_real()?;
    let num = interp.pop_real()?;
    if num == 0.0 && den == 0.0 {
        return Err(undefined_result("atan of 0 0"));
    }
    let deg = num.atan2(den).to_degrees();
    let deg = if deg < 0.0 { deg + 360.0 } else { deg };
    interp.push(Value::real(deg));
    Ok(())
}

pub(super) fn cos(interp: &mut Interpreter) -> InterpResult<()> {
    let deg = interp.pop_real()?;
    interp.push(real_result(deg.to_radians().cos())?);
    Ok(())
}

pub(super) fn sin(interp: &mut Interpreter) -> InterpResult<()> {
    let deg = interp.pop_real()?;
    interp.push(real_result(deg.to_radians().sin())?);
    Ok(())
}

/// `base exponent exp`.
pub(super) fn exp(interp: &mut Interpreter) -> InterpResult<()> {
    let exponent = interp.pop_real()?;
    let base = interp.pop_real()?;
    if base < 0.0 && exponent.fract() != 0.0 {
        return Err(undefined_result("negative base with fractional exponent"));
    }
    interp.push(real_result(base.powf(exponent))?);
    Ok(())
}

pub(super) fn ln(interp: &mut Interpreter) -> InterpResult<()> {
    let x = interp.pop_real()?;
    if x <= 0.0 {
        return Err(rangecheck("logarithm of a non-positive number"));
    }
    interp.push(real_result(x.ln())?);
    Ok(())
}

pub(super) fn log(interp: &mut Interpreter) -> InterpResult<()> {
    let x = interp.pop_real()?;
    if x <= 0.0 {
        return Err(rangecheck("logarithm of a non-positive number"));
    }
    interp.push(real_result(x.log10())?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Random numbers
// ---------------------------------------------------------------------------

/// Advance the 31-bit linear congruential generator.
const fn next_random(state: u32) -> u32 {
    state.wrapping_mul(1_103_515_245).wrapping_add(12_345) & 0x7FFF_FFFF
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn rand(interp: &mut Interpreter) -> InterpResult<()> {
    interp.rng_state = next_random(interp.rng_state);
    interp.push(Value::int(i64::from(interp.rng_state)));
    Ok(())
}

pub(super) fn srand(interp: &mut Interpreter) -> InterpResult<()> {
    let seed = interp.pop_int()?;
    interp.rng_state = u32::try_from(seed & 0x7FFF_FFFF).unwrap_or_default();
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn rrand(interp: &mut Interpreter) -> InterpResult<()> {
    interp.push(Value::int(i64::from(interp.rng_state)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_stays_in_31_bits() {
        let mut s = 1;
        for _ in 0..1000 {
            s = next_random(s);
            assert!(s <= 0x7FFF_FFFF);
        }
    }

    #[test]
    fn generator_is_deterministic() {
        assert_eq!(next_random(42), next_random(42));
        assert_ne!(next_random(1), next_random(2));
    }
}
