//! String operators.

use crate::error::{InterpResult, typecheck};
use crate::interpreter::Interpreter;
use crate::scanner::Scanner;
use crate::types::{Object, Value};

pub(super) fn string(interp: &mut Interpreter) -> InterpResult<()> {
    let n = interp.pop_index()?;
    let v = interp.new_string_value(vec![0; n])?;
    interp.push(v);
    Ok(())
}

/// `string seek anchorsearch`: `post match true` or `string false`.
pub(super) fn anchorsearch(interp: &mut Interpreter) -> InterpResult<()> {
    let (_, seek) = interp.pop_string()?;
    let (target, s) = interp.pop_string()?;
    let hit = interp.vm.string(s)?.starts_with(interp.vm.string(seek)?);
    if hit {
        let post = s.slice(seek.len, s.len - seek.len);
        let matched = s.slice(0, seek.len);
        interp.push(Value {
            object: Object::String(post),
            ..target.clone()
        });
        interp.push(Value {
            object: Object::String(matched),
            ..target
        });
        interp.push(Value::boolean(true));
    } else {
        interp.push(target);
        interp.push(Value::boolean(false));
    }
    Ok(())
}

/// `string seek search`: `post match pre true` or `string false`.
pub(super) fn search(interp: &mut Interpreter) -> InterpResult<()> {
    let (_, seek) = interp.pop_string()?;
    let (target, s) = interp.pop_string()?;
    let found = {
        let hay = interp.vm.string(s)?;
        let needle = interp.vm.string(seek)?;
        if needle.is_empty() {
            Some(0)
        } else {
            hay.windows(needle.len()).position(|w| w == needle)
        }
    };
    let Some(at) = found else {
        interp.push(target);
        interp.push(Value::boolean(false));
        return Ok(());
    };
    let end = at + seek.len;
    for part in [
        s.slice(end, s.len - end),
        s.slice(at, seek.len),
        s.slice(0, at),
    ] {
        interp.push(Value {
            object: Object::String(part),
            ..target.clone()
        });
    }
    interp.push(Value::boolean(true));
    Ok(())
}

/// `token` on a string gives `post any true`; on a file `any true`.
/// Both give `false` at end of input.
pub(super) fn token(interp: &mut Interpreter) -> InterpResult<()> {
    let source = interp.pop()?;
    match source.object {
        Object::String(s) => {
            source.check_access(false, true, false)?;
            let (token, pos) = {
                let mut scanner = Scanner::new(interp.vm.string(s)?);
                let token = scanner.next_token()?;
                (token, scanner.position())
            };
            let Some(token) = token else {
                interp.push(Value::boolean(false));
                return Ok(());
            };
            let value = interp.token_value(token)?;
            interp.push(Value {
                object: Object::String(s.slice(pos, s.len - pos)),
                ..source
            });
            interp.push(value);
            interp.push(Value::boolean(true));
            Ok(())
        }
        Object::File(f) => {
            let (token, pos) = {
                let entry = interp.files.get(f)?;
                let (buf, pos) = entry.buffer();
                if entry.open {
                    let mut scanner = Scanner::at(buf, pos);
                    let token = scanner.next_token()?;
                    (token, scanner.position())
                } else {
                    (None, pos)
                }
            };
            interp.files.get_mut(f)?.set_position(pos);
            match token {
                Some(token) => {
                    let value = interp.token_value(token)?;
                    interp.push(value);
                    interp.push(Value::boolean(true));
                }
                None => {
                    interp.files.close(f)?;
                    interp.push(Value::boolean(false));
                }
            }
            Ok(())
        }
        _ => Err(typecheck(format!("token from {}", source.type_name()))),
    }
}
