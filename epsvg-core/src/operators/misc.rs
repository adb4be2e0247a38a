//! Clock and product information.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::InterpResult;
use crate::interpreter::Interpreter;
use crate::types::Value;

const VERSION: &[u8] = b"3010";
const REVISION: i64 = 1;

/// Milliseconds, wrapped into the 31-bit integer range.
fn millis(ms: u128) -> Value {
    Value::int(i64::try_from(ms % (1 << 31)).unwrap_or_default())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn realtime(interp: &mut Interpreter) -> InterpResult<()> {
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    interp.push(millis(ms));
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn usertime(interp: &mut Interpreter) -> InterpResult<()> {
    let ms = interp.started.elapsed().as_millis();
    interp.push(millis(ms));
    Ok(())
}

pub(super) fn version(interp: &mut Interpreter) -> InterpResult<()> {
    let mut v = interp.new_string_value(VERSION.to_vec())?;
    v.access = crate::types::Access::READ_ONLY;
    interp.push(v);
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn languagelevel(interp: &mut Interpreter) -> InterpResult<()> {
    interp.push(Value::int(3));
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn revision(interp: &mut Interpreter) -> InterpResult<()> {
    interp.push(Value::int(REVISION));
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn serialnumber(interp: &mut Interpreter) -> InterpResult<()> {
    interp.push(Value::int(0));
    Ok(())
}
