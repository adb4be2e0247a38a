//! Path construction, path queries and clipping.

use epsvg_graphics::path::Section;
use epsvg_graphics::types::{FillRule, Point, Scalar, Vec2};

use crate::error::{InterpResult, rangecheck, unregistered};
use crate::interpreter::Interpreter;
use crate::operators::control::{enter_loop, rearm};
use crate::operators::{OpRole, OperatorDef};
use crate::stacks::ContFrame;
use crate::types::{Object, Value};

pub(crate) static PATHFORALL_CONT: OperatorDef =
    OperatorDef::with_role("@pathforall", pathforall_cont, OpRole::Loop);

fn pop_delta(interp: &mut Interpreter) -> InterpResult<Vec2> {
    let p = interp.pop_point()?;
    Ok(Vec2::new(p.x, p.y))
}

fn push_point(interp: &mut Interpreter, p: Point) {
    interp.push(Value::real(p.x));
    interp.push(Value::real(p.y));
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn newpath(interp: &mut Interpreter) -> InterpResult<()> {
    interp.gfx().newpath();
    Ok(())
}

pub(super) fn currentpoint(interp: &mut Interpreter) -> InterpResult<()> {
    let p = interp.gfx().current_point()?;
    push_point(interp, p);
    Ok(())
}

pub(super) fn moveto(interp: &mut Interpreter) -> InterpResult<()> {
    let p = interp.pop_point()?;
    interp.gfx().moveto(p);
    Ok(())
}

pub(super) fn rmoveto(interp: &mut Interpreter) -> InterpResult<()> {
    let d = pop_delta(interp)?;
    interp.gfx().rmoveto(d)?;
    Ok(())
}

pub(super) fn lineto(interp: &mut Interpreter) -> InterpResult<()> {
    let p = interp.pop_point()?;
    interp.gfx().lineto(p)?;
    Ok(())
}

pub(super) fn rlineto(interp: &mut Interpreter) -> InterpResult<()> {
    let d = pop_delta(interp)?;
    interp.gfx().rlineto(d)?;
    Ok(())
}

pub(super) fn curveto(interp: &mut Interpreter) -> InterpResult<()> {
    let p = interp.pop_point()?;
    let c2 = interp.pop_point()?;
    let c1 = interp.pop_point()?;
    interp.gfx().curveto(c1, c2, p)?;
    Ok(())
}

pub(super) fn rcurveto(interp: &mut Interpreter) -> InterpResult<()> {
    let d3 = pop_delta(interp)?;
    let d2 = pop_delta(interp)?;
    let d1 = pop_delta(interp)?;
    interp.gfx().rcurveto(d1, d2, d3)?;
    Ok(())
}

fn arc_common(interp: &mut Interpreter, ccw: bool) -> InterpResult<()> {
    let angle2 = interp.pop_real()?;
    let angle1 = interp.pop_real()?;
    let radius = interp.pop_real()?;
    let center = interp.pop_point()?;
    interp.gfx().arc(center, radius, angle1, angle2, ccw)?;
    Ok(())
}

pub(super) fn arc(interp: &mut Interpreter) -> InterpResult<()> {
    arc_common(interp, true)
}

pub(super) fn arcn(interp: &mut Interpreter) -> InterpResult<()> {
    arc_common(interp, false)
}

fn tangent_arc(interp: &mut Interpreter) -> InterpResult<[Point; 2]> {
    let radius = interp.pop_real()?;
    let p2 = interp.pop_point()?;
    let p1 = interp.pop_point()?;
    Ok(interp.gfx().arct(p1, p2, radius)?)
}

pub(super) fn arct(interp: &mut Interpreter) -> InterpResult<()> {
    tangent_arc(interp)?;
    Ok(())
}

/// Like `arct`, but pushes the two tangent points.
pub(super) fn arcto(interp: &mut Interpreter) -> InterpResult<()> {
    let [t1, t2] = tangent_arc(interp)?;
    push_point(interp, t1);
    push_point(interp, t2);
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn closepath(interp: &mut Interpreter) -> InterpResult<()> {
    interp.gfx().closepath();
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn flattenpath(interp: &mut Interpreter) -> InterpResult<()> {
    interp.gfx().flatten_path();
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn reversepath(interp: &mut Interpreter) -> InterpResult<()> {
    interp.gfx().reverse_path();
    Ok(())
}

pub(super) fn pathbbox(interp: &mut Interpreter) -> InterpResult<()> {
    let bb = interp.gfx().path_bbox()?;
    for v in [bb.min_x, bb.min_y, bb.max_x, bb.max_y] {
        interp.push(Value::real(v));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// pathforall
// ---------------------------------------------------------------------------

/// `move line curve close pathforall`: enumerate the current path in user
/// space.
pub(super) fn pathforall(interp: &mut Interpreter) -> InterpResult<()> {
    let close = interp.pop_proc()?;
    let curve = interp.pop_proc()?;
    let line = interp.pop_proc()?;
    let mv = interp.pop_proc()?;
    let gfx = interp.gfx();
    let to_user = gfx.ctm.invert()?;
    let sections = gfx
        .path
        .sections()
        .iter()
        .map(|s| s.transformed(to_user))
        .collect();
    enter_loop(
        interp,
        &PATHFORALL_CONT,
        ContFrame::PathForall {
            sections,
            procs: [mv, line, curve, close],
        },
    )
}

fn pathforall_cont(interp: &mut Interpreter) -> InterpResult<()> {
    let (mut sections, procs) = interp.cstack.take("@pathforall", |f| match f {
        ContFrame::PathForall { sections, procs } => Ok((sections, procs)),
        other => Err(other),
    })?;
    let Some(section) = sections.pop_front() else {
        return Ok(());
    };
    let which = match section {
        Section::MoveTo(p) => {
            push_point(interp, p);
            0
        }
        Section::LineTo(p) => {
            push_point(interp, p);
            1
        }
        Section::CurveTo(c1, c2, p) => {
            for q in [c1, c2, p] {
                push_point(interp, q);
            }
            2
        }
        Section::ClosePath(_) => 3,
    };
    let proc = procs[which].clone();
    rearm(
        interp,
        &PATHFORALL_CONT,
        ContFrame::PathForall { sections, procs },
        proc,
    )
}

// ---------------------------------------------------------------------------
// Rectangles
// ---------------------------------------------------------------------------

/// Pop the operands of `rectfill`, `rectstroke` and `rectclip`: either
/// `x y w h` or an array of numbers in groups of four.
pub(super) fn pop_rects(interp: &mut Interpreter) -> InterpResult<Vec<[Scalar; 4]>> {
    if matches!(interp.ostack.peek(0)?.object, Object::Array(_)) {
        let v = interp.pop()?;
        let numbers = interp.numbers(&v)?;
        if numbers.len() % 4 != 0 {
            return Err(rangecheck("rectangle array length is not a multiple of 4"));
        }
        return Ok(numbers
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect());
    }
    let h = interp.pop_real()?;
    let w = interp.pop_real()?;
    let origin = interp.pop_point()?;
    Ok(vec![[origin.x, origin.y, w, h]])
}

/// Replace the current path by the given rectangles.
pub(super) fn rect_path(interp: &mut Interpreter, rects: &[[Scalar; 4]]) {
    let gfx = interp.gfx();
    gfx.newpath();
    for &[x, y, w, h] in rects {
        gfx.rectangle(x, y, w, h);
    }
}

// ---------------------------------------------------------------------------
// Clipping
// ---------------------------------------------------------------------------

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn clippath(interp: &mut Interpreter) -> InterpResult<()> {
    let gfx = interp.gfx();
    gfx.path = gfx.clip.clone();
    gfx.position = gfx.path.sections().last().map(Section::end_point);
    Ok(())
}

pub(super) fn initclip(interp: &mut Interpreter) -> InterpResult<()> {
    interp.gfx().init_clip();
    interp.with_device(|device, _| device.init_clip())
}

/// Intersect the clip with the current path. The path is kept.
fn clip_with(interp: &mut Interpreter, rule: FillRule) -> InterpResult<()> {
    interp.with_device(|device, state| device.clip(&state.path, rule))?;
    interp.gfx().clip_to_path(rule);
    Ok(())
}

pub(super) fn clip(interp: &mut Interpreter) -> InterpResult<()> {
    clip_with(interp, FillRule::NonZero)
}

pub(super) fn eoclip(interp: &mut Interpreter) -> InterpResult<()> {
    clip_with(interp, FillRule::EvenOdd)
}

pub(super) fn rectclip(interp: &mut Interpreter) -> InterpResult<()> {
    let rects = pop_rects(interp)?;
    rect_path(interp, &rects);
    clip_with(interp, FillRule::NonZero)?;
    interp.gfx().newpath();
    Ok(())
}

/// The device keeps one clip per graphics state level, so a separate clip
/// stack cannot be replayed into it.
#[allow(clippy::needless_pass_by_ref_mut, reason = "operator signature")]
pub(super) fn clipsave(_interp: &mut Interpreter) -> InterpResult<()> {
    Err(unregistered("clipsave"))
}

#[allow(clippy::needless_pass_by_ref_mut, reason = "operator signature")]
pub(super) fn cliprestore(_interp: &mut Interpreter) -> InterpResult<()> {
    Err(unregistered("cliprestore"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use crate::interpreter::Interpreter;

    fn reals(interp: &Interpreter) -> Vec<f64> {
        interp
            .operand_stack()
            .iter()
            .map(|v| v.to_real().unwrap_or(f64::NAN))
            .collect()
    }

    fn close(actual: &[f64], expected: &[f64]) -> bool {
        actual.len() == expected.len()
            && actual
                .iter()
                .zip(expected)
                .all(|(a, e)| (a - e).abs() < 1e-6)
    }

    #[test]
    fn currentpoint_is_in_user_space() {
        let mut interp = Interpreter::new();
        interp
            .run("2 2 scale 10 20 moveto 5 5 rlineto currentpoint")
            .unwrap();
        assert!(close(&reals(&interp), &[15.0, 25.0]));
    }

    #[test]
    fn pathbbox_of_rectangle() {
        let mut interp = Interpreter::new();
        interp
            .run("newpath 10 10 moveto 50 10 lineto 50 30 lineto closepath pathbbox")
            .unwrap();
        assert!(close(&reals(&interp), &[10.0, 10.0, 50.0, 30.0]));
    }

    #[test]
    fn pathforall_visits_every_section() {
        let mut interp = Interpreter::new();
        interp
            .run(
                "newpath 1 2 moveto 3 4 lineto closepath \
                 {pop pop (m)} {pop pop (l)} {6 {pop} repeat (c)} {(z)} pathforall",
            )
            .unwrap();
        let names: Vec<String> = interp
            .operand_stack()
            .iter()
            .map(|v| String::from_utf8_lossy(&interp.text_of(v)).into_owned())
            .collect();
        assert_eq!(names, ["m", "l", "z"]);
    }

    #[test]
    fn arcto_pushes_tangent_points() {
        let mut interp = Interpreter::new();
        interp
            .run("newpath 0 0 moveto 10 0 10 10 2 arcto")
            .unwrap();
        assert!(close(&reals(&interp), &[8.0, 0.0, 10.0, 2.0]));
    }

    #[test]
    fn lineto_without_current_point_fails() {
        let mut interp = Interpreter::new();
        interp
            .run("{newpath 1 1 lineto} stopped $error /errorname get")
            .unwrap();
        // The operands of the failed lineto are restored.
        let stack = interp.operand_stack();
        assert_eq!(stack.len(), 4);
        assert!(stack[2].to_bool().unwrap());
        assert_eq!(interp.text_of(&stack[3]), b"nocurrentpoint");
    }

    #[test]
    fn clip_stack_is_unregistered() {
        let mut interp = Interpreter::new();
        interp
            .run("{clipsave} stopped $error /errorname get")
            .unwrap();
        let stack = interp.operand_stack();
        assert!(stack[0].to_bool().unwrap());
        assert_eq!(interp.text_of(&stack[1]), b"unregistered");
    }
}
