//! Color operators over the device color spaces.

use epsvg_graphics::color::{ColorSpace, DeviceColor};
use epsvg_graphics::types::Scalar;

use crate::error::{ErrorKind, InterpResult, InterpreterError, rangecheck, typecheck};
use crate::interpreter::Interpreter;
use crate::types::{Object, Value};

/// Pop `n` numbers, first operand first.
fn pop_components(interp: &mut Interpreter, n: usize) -> InterpResult<Vec<Scalar>> {
    interp
        .ostack
        .pop_n(n)?
        .iter()
        .map(Value::to_real)
        .collect()
}

fn set_color(interp: &mut Interpreter, space: ColorSpace) -> InterpResult<()> {
    let comps = pop_components(interp, space.components())?;
    interp.gfx().color = DeviceColor::from_components(space, &comps);
    Ok(())
}

fn push_reals(interp: &mut Interpreter, values: &[Scalar]) {
    for &v in values {
        interp.push(Value::real(v));
    }
}

pub(super) fn setgray(interp: &mut Interpreter) -> InterpResult<()> {
    set_color(interp, ColorSpace::DeviceGray)
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn currentgray(interp: &mut Interpreter) -> InterpResult<()> {
    let gray = interp.gfx().color.to_gray();
    interp.push(Value::real(gray));
    Ok(())
}

pub(super) fn setrgbcolor(interp: &mut Interpreter) -> InterpResult<()> {
    set_color(interp, ColorSpace::DeviceRgb)
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn currentrgbcolor(interp: &mut Interpreter) -> InterpResult<()> {
    let c = interp.gfx().color.to_rgb();
    push_reals(interp, &[c.r, c.g, c.b]);
    Ok(())
}

pub(super) fn sethsbcolor(interp: &mut Interpreter) -> InterpResult<()> {
    let hsb = pop_components(interp, 3)?;
    interp.gfx().color = DeviceColor::from_hsb(hsb[0], hsb[1], hsb[2]);
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn currenthsbcolor(interp: &mut Interpreter) -> InterpResult<()> {
    let (h, s, b) = interp.gfx().color.to_hsb();
    push_reals(interp, &[h, s, b]);
    Ok(())
}

pub(super) fn setcmykcolor(interp: &mut Interpreter) -> InterpResult<()> {
    set_color(interp, ColorSpace::DeviceCmyk)
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn currentcmykcolor(interp: &mut Interpreter) -> InterpResult<()> {
    let (c, m, y, k) = interp.gfx().color.to_cmyk();
    push_reals(interp, &[c, m, y, k]);
    Ok(())
}

// ---------------------------------------------------------------------------
// Color spaces
// ---------------------------------------------------------------------------

/// Resolve a color space operand: a family name or an array starting with
/// one. `ICCBased` spaces map to the device space with the same number of
/// components.
pub(crate) fn color_space(interp: &Interpreter, v: &Value) -> InterpResult<ColorSpace> {
    let (family, params) = match &v.object {
        Object::Name(n) => (n.clone(), None),
        Object::Array(_) => {
            let items = interp.array_items(v)?;
            let family = items
                .first()
                .ok_or_else(|| rangecheck("empty color space array"))?
                .to_name()?
                .clone();
            (family, items.get(1).cloned())
        }
        _ => return Err(typecheck(format!("color space is {}", v.type_name()))),
    };
    match family.text().as_ref() {
        "DeviceGray" | "CalGray" => Ok(ColorSpace::DeviceGray),
        "DeviceRGB" | "CalRGB" => Ok(ColorSpace::DeviceRgb),
        "DeviceCMYK" => Ok(ColorSpace::DeviceCmyk),
        "ICCBased" => {
            let stream = params.ok_or_else(|| rangecheck("ICCBased without parameters"))?;
            let n = interp
                .entry(&stream, "N")?
                .ok_or_else(|| rangecheck("ICCBased without /N"))?
                .to_int()?;
            match n {
                1 => Ok(ColorSpace::DeviceGray),
                3 => Ok(ColorSpace::DeviceRgb),
                4 => Ok(ColorSpace::DeviceCmyk),
                _ => Err(rangecheck(format!("ICCBased with {n} components"))),
            }
        }
        other => Err(InterpreterError::new(
            ErrorKind::Unregistered,
            format!("color space {other}"),
        )),
    }
}

pub(super) fn setcolorspace(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    let space = color_space(interp, &v)?;
    interp.gfx().color = space.initial_color();
    Ok(())
}

pub(super) fn currentcolorspace(interp: &mut Interpreter) -> InterpResult<()> {
    let name = interp.gfx().color.space().name();
    let v = interp.new_array_value(vec![Value::name(name)])?;
    interp.push(v);
    Ok(())
}

pub(super) fn setcolor(interp: &mut Interpreter) -> InterpResult<()> {
    let space = interp.gfx().color.space();
    set_color(interp, space)
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn currentcolor(interp: &mut Interpreter) -> InterpResult<()> {
    let comps = interp.gfx().color.components();
    push_reals(interp, &comps);
    Ok(())
}
