//! Matrix and coordinate transformation operators.
//!
//! Operators with an optional trailing matrix operand (`translate`,
//! `transform`, ...) apply to the CTM without it and compute into the
//! operand with it.

use epsvg_graphics::matrix::Matrix;
use epsvg_graphics::types::{Point, Vec2};

use crate::error::InterpResult;
use crate::interpreter::Interpreter;
use crate::types::Value;

pub(super) fn matrix(interp: &mut Interpreter) -> InterpResult<()> {
    let items = Matrix::IDENTITY.to_array().map(Value::real).to_vec();
    let v = interp.new_array_value(items)?;
    interp.push(v);
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn initmatrix(interp: &mut Interpreter) -> InterpResult<()> {
    let m = interp.default_matrix();
    interp.gfx().ctm = m;
    Ok(())
}

/// Pop a matrix operand and store `m` into it.
fn fill_matrix(interp: &mut Interpreter, m: Matrix) -> InterpResult<()> {
    let target = interp.pop()?;
    let v = interp.store_matrix(target, m)?;
    interp.push(v);
    Ok(())
}

pub(super) fn identmatrix(interp: &mut Interpreter) -> InterpResult<()> {
    fill_matrix(interp, Matrix::IDENTITY)
}

pub(super) fn defaultmatrix(interp: &mut Interpreter) -> InterpResult<()> {
    let m = interp.default_matrix();
    fill_matrix(interp, m)
}

pub(super) fn currentmatrix(interp: &mut Interpreter) -> InterpResult<()> {
    let m = interp.gfx().ctm;
    fill_matrix(interp, m)
}

pub(super) fn setmatrix(interp: &mut Interpreter) -> InterpResult<()> {
    let m = interp.pop_matrix()?;
    interp.gfx().ctm = m;
    Ok(())
}

/// Concatenate `m` onto the CTM, or store it into a matrix operand if one
/// is on top of the stack. `operands` pops the rest.
fn apply_or_store(
    interp: &mut Interpreter,
    operands: impl FnOnce(&mut Interpreter) -> InterpResult<Matrix>,
) -> InterpResult<()> {
    if interp.top_is_matrix() {
        let target = interp.pop()?;
        let m = operands(interp)?;
        let v = interp.store_matrix(target, m)?;
        interp.push(v);
    } else {
        let m = operands(interp)?;
        let gfx = interp.gfx();
        gfx.ctm = gfx.ctm.pre_concat(m);
    }
    Ok(())
}

pub(super) fn translate(interp: &mut Interpreter) -> InterpResult<()> {
    apply_or_store(interp, |interp| {
        let p = interp.pop_point()?;
        Ok(Matrix::translation(p.x, p.y))
    })
}

pub(super) fn scale(interp: &mut Interpreter) -> InterpResult<()> {
    apply_or_store(interp, |interp| {
        let p = interp.pop_point()?;
        Ok(Matrix::scaling(p.x, p.y))
    })
}

pub(super) fn rotate(interp: &mut Interpreter) -> InterpResult<()> {
    apply_or_store(interp, |interp| Ok(Matrix::rotation(interp.pop_real()?)))
}

pub(super) fn concat(interp: &mut Interpreter) -> InterpResult<()> {
    let m = interp.pop_matrix()?;
    let gfx = interp.gfx();
    gfx.ctm = gfx.ctm.pre_concat(m);
    Ok(())
}

/// `m1 m2 m3 concatmatrix`: m3 = m1 × m2.
pub(super) fn concatmatrix(interp: &mut Interpreter) -> InterpResult<()> {
    let target = interp.pop()?;
    let m2 = interp.pop_matrix()?;
    let m1 = interp.pop_matrix()?;
    let v = interp.store_matrix(target, m1.then(m2))?;
    interp.push(v);
    Ok(())
}

pub(super) fn invertmatrix(interp: &mut Interpreter) -> InterpResult<()> {
    let target = interp.pop()?;
    let m = interp.pop_matrix()?.invert()?;
    let v = interp.store_matrix(target, m)?;
    interp.push(v);
    Ok(())
}

// ---------------------------------------------------------------------------
// Coordinate transforms
// ---------------------------------------------------------------------------

/// Pop `x y` and an optional matrix (defaulting to the CTM).
fn pop_with_matrix(interp: &mut Interpreter) -> InterpResult<(Point, Matrix)> {
    let m = if interp.top_is_matrix() {
        interp.pop_matrix()?
    } else {
        interp.gfx().ctm
    };
    Ok((interp.pop_point()?, m))
}

fn push_pair(interp: &mut Interpreter, x: f64, y: f64) {
    interp.push(Value::real(x));
    interp.push(Value::real(y));
}

pub(super) fn transform(interp: &mut Interpreter) -> InterpResult<()> {
    let (p, m) = pop_with_matrix(interp)?;
    let q = m.transform_point(p);
    push_pair(interp, q.x, q.y);
    Ok(())
}

pub(super) fn dtransform(interp: &mut Interpreter) -> InterpResult<()> {
    let (p, m) = pop_with_matrix(interp)?;
    let d = m.transform_delta(Vec2::new(p.x, p.y));
    push_pair(interp, d.x, d.y);
    Ok(())
}

pub(super) fn itransform(interp: &mut Interpreter) -> InterpResult<()> {
    let (p, m) = pop_with_matrix(interp)?;
    let q = m.itransform_point(p)?;
    push_pair(interp, q.x, q.y);
    Ok(())
}

pub(super) fn idtransform(interp: &mut Interpreter) -> InterpResult<()> {
    let (p, m) = pop_with_matrix(interp)?;
    let d = m.itransform_delta(Vec2::new(p.x, p.y))?;
    push_pair(interp, d.x, d.y);
    Ok(())
}
