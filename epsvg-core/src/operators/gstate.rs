//! Graphics state operators: save/restore of the state and the
//! device-independent line and rendering parameters.

use epsvg_graphics::types::{DashPattern, LineCap, LineJoin};

use crate::error::{InterpResult, rangecheck, typecheck};
use crate::interpreter::Interpreter;
use crate::types::Value;

pub(super) fn gsave(interp: &mut Interpreter) -> InterpResult<()> {
    let device = interp.gstates.push(false);
    interp.open_scope(device)
}

pub(super) fn grestore(interp: &mut Interpreter) -> InterpResult<()> {
    if let Some((device, reopen)) = interp.gstates.grestore() {
        interp.close_scope(device)?;
        if reopen {
            interp.open_scope(device)?;
        }
    }
    Ok(())
}

pub(super) fn grestoreall(interp: &mut Interpreter) -> InterpResult<()> {
    let (closed, reopen) = interp.gstates.grestore_all();
    for &device in &closed {
        interp.close_scope(device)?;
    }
    if let (true, Some(&device)) = (reopen, closed.last()) {
        interp.open_scope(device)?;
    }
    Ok(())
}

pub(super) fn initgraphics(interp: &mut Interpreter) -> InterpResult<()> {
    let matrix = interp.default_matrix();
    interp.gfx().init_graphics(matrix);
    interp.with_device(|device, _| device.init_clip())
}

// ---------------------------------------------------------------------------
// Line parameters
// ---------------------------------------------------------------------------

pub(super) fn setlinewidth(interp: &mut Interpreter) -> InterpResult<()> {
    let w = interp.pop_real()?;
    interp.gfx().line.width = w.abs();
    Ok(())
}

pub(super) fn currentlinewidth(interp: &mut Interpreter) -> InterpResult<()> {
    let w = interp.gfx().line.width;
    interp.push(Value::real(w));
    Ok(())
}

pub(super) fn setlinecap(interp: &mut Interpreter) -> InterpResult<()> {
    let code = interp.pop_int()?;
    interp.gfx().line.cap =
        LineCap::from_code(code).ok_or_else(|| rangecheck(format!("line cap {code}")))?;
    Ok(())
}

pub(super) fn currentlinecap(interp: &mut Interpreter) -> InterpResult<()> {
    let code = match interp.gfx().line.cap {
        LineCap::Butt => 0,
        LineCap::Round => 1,
        LineCap::Square => 2,
    };
    interp.push(Value::int(code));
    Ok(())
}

pub(super) fn setlinejoin(interp: &mut Interpreter) -> InterpResult<()> {
    let code = interp.pop_int()?;
    interp.gfx().line.join =
        LineJoin::from_code(code).ok_or_else(|| rangecheck(format!("line join {code}")))?;
    Ok(())
}

pub(super) fn currentlinejoin(interp: &mut Interpreter) -> InterpResult<()> {
    let code = match interp.gfx().line.join {
        LineJoin::Miter => 0,
        LineJoin::Round => 1,
        LineJoin::Bevel => 2,
    };
    interp.push(Value::int(code));
    Ok(())
}

pub(super) fn setmiterlimit(interp: &mut Interpreter) -> InterpResult<()> {
    let limit = interp.pop_real()?;
    if limit < 1.0 {
        return Err(rangecheck(format!("miter limit {limit}")));
    }
    interp.gfx().line.miter_limit = limit;
    Ok(())
}

pub(super) fn currentmiterlimit(interp: &mut Interpreter) -> InterpResult<()> {
    let limit = interp.gfx().line.miter_limit;
    interp.push(Value::real(limit));
    Ok(())
}

/// `array offset setdash`. Lengths must be non-negative and not all zero.
pub(super) fn setdash(interp: &mut Interpreter) -> InterpResult<()> {
    let offset = interp.pop_real()?;
    let v = interp.pop()?;
    let dashes = interp.numbers(&v)?;
    if dashes.iter().any(|&d| d < 0.0) {
        return Err(rangecheck("negative dash length"));
    }
    if !dashes.is_empty() && dashes.iter().all(|&d| d == 0.0) {
        return Err(rangecheck("dash lengths are all zero"));
    }
    interp.gfx().line.dash = DashPattern { dashes, offset };
    Ok(())
}

pub(super) fn currentdash(interp: &mut Interpreter) -> InterpResult<()> {
    let dash = interp.gfx().line.dash.clone();
    let array = interp.new_array_value(dash.dashes.into_iter().map(Value::real).collect())?;
    interp.push(array);
    interp.push(Value::real(dash.offset));
    Ok(())
}

pub(super) fn setflat(interp: &mut Interpreter) -> InterpResult<()> {
    let flat = interp.pop_real()?;
    interp.gfx().flatness = flat.clamp(0.2, 100.0);
    Ok(())
}

pub(super) fn currentflat(interp: &mut Interpreter) -> InterpResult<()> {
    let flat = interp.gfx().flatness;
    interp.push(Value::real(flat));
    Ok(())
}

pub(super) fn setstrokeadjust(interp: &mut Interpreter) -> InterpResult<()> {
    let on = interp.pop_bool()?;
    interp.gfx().stroke_adjust = on;
    Ok(())
}

pub(super) fn currentstrokeadjust(interp: &mut Interpreter) -> InterpResult<()> {
    let on = interp.gfx().stroke_adjust;
    interp.push(Value::boolean(on));
    Ok(())
}

pub(super) fn setoverprint(interp: &mut Interpreter) -> InterpResult<()> {
    let on = interp.pop_bool()?;
    interp.gfx().overprint = on;
    Ok(())
}

pub(super) fn currentoverprint(interp: &mut Interpreter) -> InterpResult<()> {
    let on = interp.gfx().overprint;
    interp.push(Value::boolean(on));
    Ok(())
}

// ---------------------------------------------------------------------------
// Device-dependent parameters: stored and reported back, never applied
// ---------------------------------------------------------------------------

pub(super) fn settransfer(interp: &mut Interpreter) -> InterpResult<()> {
    interp.gstates.current.transfer = interp.pop_proc()?;
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn currenttransfer(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.gstates.current.transfer.clone();
    interp.push(v);
    Ok(())
}

pub(super) fn setblackgeneration(interp: &mut Interpreter) -> InterpResult<()> {
    interp.gstates.current.black_generation = interp.pop_proc()?;
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn currentblackgeneration(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.gstates.current.black_generation.clone();
    interp.push(v);
    Ok(())
}

pub(super) fn setundercolorremoval(interp: &mut Interpreter) -> InterpResult<()> {
    interp.gstates.current.undercolor_removal = interp.pop_proc()?;
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn currentundercolorremoval(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.gstates.current.undercolor_removal.clone();
    interp.push(v);
    Ok(())
}

pub(super) fn sethalftone(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    v.to_dict()?;
    interp.gstates.current.halftone = v;
    Ok(())
}

pub(super) fn currenthalftone(interp: &mut Interpreter) -> InterpResult<()> {
    let current = interp.gstates.current.halftone.clone();
    let v = if current.is_null() {
        // No halftone dictionary yet: describe the screen as a type 1
        // halftone.
        let [frequency, angle, spot] = interp.gstates.current.screen.clone();
        let v = interp.new_dict_value(4)?;
        let d = v.to_dict()?;
        let body = interp.vm.dict_mut(d)?;
        body.insert_name("HalftoneType", Value::int(1));
        body.insert_name("Frequency", frequency);
        body.insert_name("Angle", angle);
        body.insert_name("SpotFunction", spot);
        v
    } else {
        current
    };
    interp.push(v);
    Ok(())
}

pub(super) fn setscreen(interp: &mut Interpreter) -> InterpResult<()> {
    let spot = interp.pop()?;
    if !spot.is_procedure() && !matches!(spot.object, crate::types::Object::Dict(_)) {
        return Err(typecheck(format!("spot function is {}", spot.type_name())));
    }
    let angle = interp.pop()?;
    let frequency = interp.pop()?;
    angle.to_real()?;
    frequency.to_real()?;
    let current = &mut interp.gstates.current;
    current.screen = [frequency, angle, spot];
    current.halftone = Value::null();
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn currentscreen(interp: &mut Interpreter) -> InterpResult<()> {
    let screen = interp.gstates.current.screen.clone();
    for v in screen {
        interp.push(v);
    }
    Ok(())
}
