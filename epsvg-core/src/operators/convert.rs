//! Type, attribute and conversion operators.

use crate::error::{InterpResult, rangecheck, typecheck};
use crate::interpreter::Interpreter;
use crate::scanner::Scanner;
use crate::token::TokenKind;
use crate::types::{Access, Name, Object, Value};

pub(super) fn type_op(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    interp.push(Value::exec_name(v.type_name()));
    Ok(())
}

pub(super) fn cvlit(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    interp.push(v.cvlit());
    Ok(())
}

pub(super) fn cvx(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    interp.push(v.cvx());
    Ok(())
}

pub(super) fn xcheck(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    interp.push(Value::boolean(v.executable));
    Ok(())
}

fn reduce_access(interp: &mut Interpreter, access: Access) -> InterpResult<()> {
    let v = interp.pop()?;
    match v.object {
        Object::Array(_) | Object::String(_) | Object::File(_) => {}
        Object::Dict(_) if access.can_read() => {}
        Object::Dict(_) => {
            return Err(typecheck("dictionaries cannot be execute-only"));
        }
        _ => return Err(typecheck(format!("cannot change access of {}", v.type_name()))),
    }
    let v = interp.restrict_access(v, access)?;
    interp.push(v);
    Ok(())
}

pub(super) fn executeonly(interp: &mut Interpreter) -> InterpResult<()> {
    reduce_access(interp, Access::EXECUTE_ONLY)
}

pub(super) fn noaccess(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    if !matches!(
        v.object,
        Object::Array(_) | Object::String(_) | Object::File(_) | Object::Dict(_)
    ) {
        return Err(typecheck(format!("cannot change access of {}", v.type_name())));
    }
    let v = interp.restrict_access(v, Access::NONE)?;
    interp.push(v);
    Ok(())
}

pub(super) fn readonly(interp: &mut Interpreter) -> InterpResult<()> {
    reduce_access(interp, Access::READ_ONLY)
}

fn check(interp: &mut Interpreter, test: fn(Access) -> bool) -> InterpResult<()> {
    let v = interp.pop()?;
    if !matches!(
        v.object,
        Object::Array(_) | Object::String(_) | Object::File(_) | Object::Dict(_) | Object::Matrix(_)
    ) {
        return Err(typecheck(format!("no access attribute on {}", v.type_name())));
    }
    let access = if let Object::Matrix(_) = v.object {
        Access::READ_ONLY
    } else {
        interp.access_of(&v)?
    };
    interp.push(Value::boolean(test(access)));
    Ok(())
}

pub(super) fn rcheck(interp: &mut Interpreter) -> InterpResult<()> {
    check(interp, Access::can_read)
}

pub(super) fn wcheck(interp: &mut Interpreter) -> InterpResult<()> {
    check(interp, Access::can_write)
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Parse a number the way the scanner would.
fn parse_number(bytes: &[u8]) -> InterpResult<f64> {
    let mut scanner = Scanner::new(bytes);
    let token = scanner.next_token()?;
    let rest = scanner.next_token()?;
    match (token.map(|t| t.kind), rest) {
        (Some(TokenKind::Integer(i)), None) => {
            #[expect(clippy::cast_precision_loss, reason = "PostScript integer widening")]
            let r = i as f64;
            Ok(r)
        }
        (Some(TokenKind::Real(r)), None) => Ok(r),
        _ => Err(typecheck("string is not a number")),
    }
}

#[expect(clippy::cast_possible_truncation, reason = "range checked")]
fn real_to_int(r: f64) -> InterpResult<i64> {
    let t = r.trunc();
    if !t.is_finite() || t.abs() >= 9.2e18 {
        return Err(rangecheck(format!("{r} does not fit an integer")));
    }
    Ok(t as i64)
}

pub(super) fn cvi(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    let i = match v.object {
        Object::Integer(i) => i,
        Object::Real(r) => real_to_int(r)?,
        Object::String(s) => {
            v.check_access(false, true, false)?;
            let bytes = interp.vm.string(s)?.to_vec();
            real_to_int(parse_number(&bytes)?)?
        }
        _ => return Err(typecheck(format!("cvi of {}", v.type_name()))),
    };
    interp.push(Value::int(i));
    Ok(())
}

pub(super) fn cvr(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    let r = match v.object {
        Object::Integer(_) | Object::Real(_) => v.to_real()?,
        Object::String(s) => {
            v.check_access(false, true, false)?;
            let bytes = interp.vm.string(s)?.to_vec();
            parse_number(&bytes)?
        }
        _ => return Err(typecheck(format!("cvr of {}", v.type_name()))),
    };
    interp.push(Value::real(r));
    Ok(())
}

pub(super) fn cvn(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    let bytes = match v.object {
        Object::String(_) => interp.text_bytes(&v)?,
        _ => return Err(typecheck(format!("cvn of {}", v.type_name()))),
    };
    let name = Name::from_bytes(&bytes);
    interp.push(Value {
        object: Object::Name(name),
        access: Access::UNLIMITED,
        executable: v.executable,
    });
    Ok(())
}

/// Digits of `n` in `radix`, upper case.
fn radix_digits(mut n: u64, radix: u64) -> Vec<u8> {
    if n == 0 {
        return b"0".to_vec();
    }
    let mut digits = Vec::new();
    while n > 0 {
        let d = u8::try_from(n % radix).unwrap_or_default();
        digits.push(if d < 10 { b'0' + d } else { b'A' + d - 10 });
        n /= radix;
    }
    digits.reverse();
    digits
}

/// `num radix string cvrs`. Radix 10 gives the `cvs` text; other radixes
/// write the 32-bit two's complement pattern of the truncated value.
pub(super) fn cvrs(interp: &mut Interpreter) -> InterpResult<()> {
    let target = interp.pop()?;
    let radix = interp.pop_int()?;
    let num = interp.pop()?;
    if !(2..=36).contains(&radix) {
        return Err(rangecheck(format!("radix {radix}")));
    }
    let text = if radix == 10 {
        if !num.is_number() {
            return Err(typecheck(format!("cvrs of {}", num.type_name())));
        }
        interp.text_of(&num)
    } else {
        let n = match num.object {
            Object::Integer(i) => i,
            Object::Real(r) => real_to_int(r)?,
            _ => return Err(typecheck(format!("cvrs of {}", num.type_name()))),
        };
        let bits = u64::try_from(n & 0xFFFF_FFFF).unwrap_or_default();
        radix_digits(bits, u64::try_from(radix).unwrap_or(10))
    };
    let result = interp.fill_string(&target, &text)?;
    interp.push(result);
    Ok(())
}

pub(super) fn cvs(interp: &mut Interpreter) -> InterpResult<()> {
    let target = interp.pop()?;
    let v = interp.pop()?;
    if let Object::String(_) = v.object {
        v.check_access(false, true, false)?;
    }
    let text = interp.text_of(&v);
    let result = interp.fill_string(&target, &text)?;
    interp.push(result);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn radix_conversion() {
        assert_eq!(radix_digits(255, 16), b"FF");
        assert_eq!(radix_digits(5, 2), b"101");
        assert_eq!(radix_digits(0, 8), b"0");
    }

    #[test]
    fn numbers_parse_like_tokens() {
        assert_eq!(parse_number(b" 12 ").unwrap(), 12.0);
        assert_eq!(parse_number(b"16#FF").unwrap(), 255.0);
        assert_eq!(parse_number(b"1.5e1").unwrap(), 15.0);
        assert!(parse_number(b"abc").is_err());
        assert!(parse_number(b"1 2").is_err());
    }

    #[test]
    fn truncation_toward_zero() {
        assert_eq!(real_to_int(-3.7).unwrap(), -3);
        assert!(real_to_int(f64::INFINITY).is_err());
    }
}
