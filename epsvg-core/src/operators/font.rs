//! Font dictionaries and the `show` family.
//!
//! Only metrics-level fonts exist: `findfont` synthesizes a Type 1-shaped
//! dictionary for any name it cannot find, and glyph placement is left to
//! the [`TextHandler`](crate::text::TextHandler).

use std::sync::Arc;

use epsvg_graphics::matrix::Matrix;
use epsvg_graphics::types::{Scalar, Vec2};

use crate::error::{ErrorKind, InterpResult, InterpreterError, rangecheck, typecheck, unregistered};
use crate::interpreter::Interpreter;
use crate::operators::control::{enter_loop, rearm};
use crate::operators::{OpRole, OperatorDef};
use crate::stacks::ContFrame;
use crate::text::{FontInfo, GLYPH_WIDTH, Spacing};
use crate::types::{Access, Name, Object, Value};

pub(crate) static KSHOW_CONT: OperatorDef =
    OperatorDef::with_role("@kshow", kshow_cont, OpRole::Loop);
pub(crate) static CSHOW_CONT: OperatorDef =
    OperatorDef::with_role("@cshow", cshow_cont, OpRole::Loop);

/// The base 35 fonts. Other names are substituted with a debug log.
const STANDARD_FONTS: [&str; 35] = [
    "AvantGarde-Book",
    "AvantGarde-BookOblique",
    "AvantGarde-Demi",
    "AvantGarde-DemiOblique",
    "Bookman-Demi",
    "Bookman-DemiItalic",
    "Bookman-Light",
    "Bookman-LightItalic",
    "Courier",
    "Courier-Bold",
    "Courier-BoldOblique",
    "Courier-Oblique",
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-BoldOblique",
    "Helvetica-Narrow",
    "Helvetica-Narrow-Bold",
    "Helvetica-Narrow-BoldOblique",
    "Helvetica-Narrow-Oblique",
    "Helvetica-Oblique",
    "NewCenturySchlbk-Bold",
    "NewCenturySchlbk-BoldItalic",
    "NewCenturySchlbk-Italic",
    "NewCenturySchlbk-Roman",
    "Palatino-Bold",
    "Palatino-BoldItalic",
    "Palatino-Italic",
    "Palatino-Roman",
    "Symbol",
    "Times-Bold",
    "Times-BoldItalic",
    "Times-Italic",
    "Times-Roman",
    "ZapfChancery-MediumItalic",
    "ZapfDingbats",
];

const FONT_MATRIX: Matrix = Matrix::new(0.001, 0.0, 0.0, 0.001, 0.0, 0.0);
const FONT_BBOX: [i64; 4] = [0, -200, 600, 800];

fn invalidfont(message: impl Into<String>) -> InterpreterError {
    InterpreterError::new(ErrorKind::InvalidFont, message)
}

// ---------------------------------------------------------------------------
// Font dictionaries
// ---------------------------------------------------------------------------

/// What the text handler needs from a font dictionary.
pub(crate) fn font_info(interp: &Interpreter, font: &Value) -> InterpResult<FontInfo> {
    if !matches!(font.object, Object::Dict(_)) {
        return Err(invalidfont("no current font"));
    }
    let matrix = interp
        .entry(font, "FontMatrix")?
        .ok_or_else(|| invalidfont("font without /FontMatrix"))?;
    let matrix = interp.value_to_matrix(&matrix)?;
    let name: Arc<str> = match interp.entry(font, "FontName")? {
        Some(v) => String::from_utf8_lossy(&interp.text_bytes(&v)?).into(),
        None => Arc::from("Courier"),
    };
    let encoding = match interp.entry(font, "Encoding")? {
        Some(v) if matches!(v.object, Object::Array(_)) => Some(
            interp
                .array_items(&v)?
                .iter()
                .map(|glyph| match &glyph.object {
                    Object::Name(n) => Arc::from(n.text().as_ref()),
                    _ => Arc::from(".notdef"),
                })
                .collect(),
        ),
        _ => None,
    };
    Ok(FontInfo {
        name,
        matrix,
        encoding,
    })
}

fn current_font_info(interp: &Interpreter) -> InterpResult<FontInfo> {
    font_info(interp, &interp.gstates.current.font)
}

/// Add `FID`, make the dictionary read-only and register it in
/// `FontDirectory`.
fn register_font(interp: &mut Interpreter, key: &Value, font: Value) -> InterpResult<Value> {
    let d = font.to_dict()?;
    if interp.entry(&font, "FontMatrix")?.is_none() {
        return Err(invalidfont("font without /FontMatrix"));
    }
    let id = i64::try_from(d.handle.id).map_err(|_| invalidfont("font id out of range"))?;
    let body = interp.vm.dict_mut(d)?;
    if body.get_name("FID").is_none() {
        body.insert_name("FID", Value::int(id));
    }
    let resources = interp.resources;
    resources.define(&mut interp.vm, "Font", key, font)
}

/// Build a metrics-only font for `name` in global VM.
fn synthesize_font(interp: &mut Interpreter, key: &Value) -> InterpResult<Value> {
    let bytes = interp.text_bytes(key)?;
    let name = Value::literal(Object::Name(Name::from_bytes(&bytes)));
    let text = String::from_utf8_lossy(&bytes);
    if !STANDARD_FONTS.contains(&&*text) {
        tracing::debug!(font = %text, "substituting a metrics-only font");
    }
    let encoding = interp.standard_encoding.clone();
    let font = interp.in_global(|interp| {
        let bbox = interp.new_array_value(FONT_BBOX.map(Value::int).to_vec())?;
        let font = interp.new_dict_value(8)?;
        let body = interp.vm.dict_mut(font.to_dict()?)?;
        body.insert_name("FontName", name.clone());
        body.insert_name("FontType", Value::int(1));
        body.insert_name("PaintType", Value::int(0));
        body.insert_name("FontMatrix", Value::literal(Object::Matrix(FONT_MATRIX)));
        body.insert_name("Encoding", encoding);
        body.insert_name("FontBBox", bbox);
        Ok(font)
    })?;
    register_font(interp, &name, font)
}

/// `key findfont`: the registered font, or a synthesized one.
pub(super) fn find_font(interp: &mut Interpreter, key: &Value) -> InterpResult<Value> {
    let resources = interp.resources;
    if let Some(font) = resources.find(&mut interp.vm, "Font", key)? {
        return Ok(font);
    }
    synthesize_font(interp, key)
}

pub(super) fn findfont(interp: &mut Interpreter) -> InterpResult<()> {
    let key = interp.pop()?;
    let font = find_font(interp, &key)?;
    interp.push(font);
    Ok(())
}

/// A copy of `font` with its font matrix transformed by `m`.
fn transform_font(interp: &mut Interpreter, font: &Value, m: Matrix) -> InterpResult<Value> {
    let d = font.to_dict()?;
    let old = interp
        .entry(font, "FontMatrix")?
        .ok_or_else(|| invalidfont("font without /FontMatrix"))?;
    let matrix = interp.value_to_matrix(&old)?.then(m);
    let entries: Vec<(Value, Value)> = interp
        .vm
        .dict(d)?
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let global = d.handle.global;
    let copy_into = |interp: &mut Interpreter| -> InterpResult<Value> {
        let copy = interp.new_dict_value(entries.len() + 1)?;
        let cd = copy.to_dict()?;
        for (k, v) in entries {
            interp.dict_put(cd, k, v)?;
        }
        let body = interp.vm.dict_mut(cd)?;
        body.insert_name("FontMatrix", Value::literal(Object::Matrix(matrix)));
        body.access = body.access.restrict(Access::READ_ONLY);
        Ok(copy)
    };
    if global {
        interp.in_global(copy_into)
    } else {
        copy_into(interp)
    }
}

pub(super) fn scalefont(interp: &mut Interpreter) -> InterpResult<()> {
    let scale = interp.pop_real()?;
    let font = interp.pop()?;
    let scaled = transform_font(interp, &font, Matrix::scaling(scale, scale))?;
    interp.push(scaled);
    Ok(())
}

pub(super) fn makefont(interp: &mut Interpreter) -> InterpResult<()> {
    let m = interp.pop_matrix()?;
    let font = interp.pop()?;
    let made = transform_font(interp, &font, m)?;
    interp.push(made);
    Ok(())
}

pub(super) fn setfont(interp: &mut Interpreter) -> InterpResult<()> {
    let font = interp.pop()?;
    font.to_dict()?;
    interp.gstates.current.font = font;
    Ok(())
}

pub(super) fn currentfont(interp: &mut Interpreter) -> InterpResult<()> {
    let mut font = interp.gstates.current.font.clone();
    if font.is_null() {
        // No setfont yet: report the default font.
        font = find_font(interp, &Value::name("Courier"))?;
    }
    interp.push(font);
    Ok(())
}

/// `key scale selectfont` or `key matrix selectfont`.
pub(super) fn selectfont(interp: &mut Interpreter) -> InterpResult<()> {
    let m = if interp.top_is_matrix() {
        interp.pop_matrix()?
    } else {
        let s = interp.pop_real()?;
        Matrix::scaling(s, s)
    };
    let key = interp.pop()?;
    let font = find_font(interp, &key)?;
    interp.gstates.current.font = transform_font(interp, &font, m)?;
    Ok(())
}

pub(super) fn definefont(interp: &mut Interpreter) -> InterpResult<()> {
    let font = interp.pop()?;
    let key = interp.pop()?;
    let font = register_font(interp, &key, font)?;
    interp.push(font);
    Ok(())
}

pub(super) fn undefinefont(interp: &mut Interpreter) -> InterpResult<()> {
    let key = interp.pop()?;
    let resources = interp.resources;
    resources.undefine(&mut interp.vm, "Font", &key)
}

// ---------------------------------------------------------------------------
// Showing text
// ---------------------------------------------------------------------------

/// Draw `text` with the current font and advance the current point.
fn show_with(interp: &mut Interpreter, text: &[u8], spacing: &Spacing) -> InterpResult<()> {
    let font = current_font_info(interp)?;
    let state = &interp.gstates.current.gfx;
    let device = interp
        .devices
        .get_mut(state.device.0)
        .ok_or_else(|| InterpreterError::internal("graphics state names a missing device"))?;
    let advance = interp
        .text
        .show_text(device.as_mut(), state, &font, text, spacing)?;
    interp.gfx().rmoveto(advance)?;
    Ok(())
}

fn pop_vec(interp: &mut Interpreter) -> InterpResult<Vec2> {
    let p = interp.pop_point()?;
    Ok(Vec2::new(p.x, p.y))
}

fn pop_char_code(interp: &mut Interpreter) -> InterpResult<u8> {
    // Only the low byte selects the character.
    Ok(interp.pop_int()?.to_le_bytes()[0])
}

pub(super) fn show(interp: &mut Interpreter) -> InterpResult<()> {
    let text = interp.pop_bytes()?;
    show_with(interp, &text, &Spacing::default())
}

/// `ax ay string ashow`.
pub(super) fn ashow(interp: &mut Interpreter) -> InterpResult<()> {
    let text = interp.pop_bytes()?;
    let all = pop_vec(interp)?;
    show_with(
        interp,
        &text,
        &Spacing {
            all,
            ..Spacing::default()
        },
    )
}

/// `cx cy char string widthshow`.
pub(super) fn widthshow(interp: &mut Interpreter) -> InterpResult<()> {
    let text = interp.pop_bytes()?;
    let code = pop_char_code(interp)?;
    let extra = pop_vec(interp)?;
    show_with(
        interp,
        &text,
        &Spacing {
            extra,
            char_code: Some(code),
            ..Spacing::default()
        },
    )
}

/// `cx cy char ax ay string awidthshow`.
pub(super) fn awidthshow(interp: &mut Interpreter) -> InterpResult<()> {
    let text = interp.pop_bytes()?;
    let all = pop_vec(interp)?;
    let code = pop_char_code(interp)?;
    let extra = pop_vec(interp)?;
    show_with(
        interp,
        &text,
        &Spacing {
            all,
            extra,
            char_code: Some(code),
        },
    )
}

/// `proc string kshow`: show each character, running `proc` with the
/// codes of every adjacent pair in between.
pub(super) fn kshow(interp: &mut Interpreter) -> InterpResult<()> {
    let text = interp.pop_bytes()?;
    let proc = interp.pop_proc()?;
    current_font_info(interp)?;
    enter_loop(
        interp,
        &KSHOW_CONT,
        ContFrame::Kshow {
            proc,
            remaining: text.into(),
            previous: None,
            pending: false,
        },
    )
}

fn kshow_cont(interp: &mut Interpreter) -> InterpResult<()> {
    let (proc, mut remaining, previous, pending) = interp.cstack.take("@kshow", |f| match f {
        ContFrame::Kshow {
            proc,
            remaining,
            previous,
            pending,
        } => Ok((proc, remaining, previous, pending)),
        other => Err(other),
    })?;
    let Some(&next) = remaining.front() else {
        return Ok(());
    };
    match (previous, pending) {
        (Some(prev), false) => {
            interp.push(Value::int(i64::from(prev)));
            interp.push(Value::int(i64::from(next)));
            rearm(
                interp,
                &KSHOW_CONT,
                ContFrame::Kshow {
                    proc: proc.clone(),
                    remaining,
                    previous,
                    pending: true,
                },
                proc,
            )
        }
        _ => {
            remaining.pop_front();
            show_with(interp, &[next], &Spacing::default())?;
            enter_loop(
                interp,
                &KSHOW_CONT,
                ContFrame::Kshow {
                    proc,
                    remaining,
                    previous: Some(next),
                    pending: false,
                },
            )
        }
    }
}

/// `proc string cshow`: run `proc` with the code and width of each
/// character. Nothing is drawn unless `proc` draws it.
pub(super) fn cshow(interp: &mut Interpreter) -> InterpResult<()> {
    let text = interp.pop_bytes()?;
    let proc = interp.pop_proc()?;
    current_font_info(interp)?;
    enter_loop(
        interp,
        &CSHOW_CONT,
        ContFrame::Cshow {
            proc,
            remaining: text.into(),
        },
    )
}

fn cshow_cont(interp: &mut Interpreter) -> InterpResult<()> {
    let (proc, mut remaining) = interp.cstack.take("@cshow", |f| match f {
        ContFrame::Cshow { proc, remaining } => Ok((proc, remaining)),
        other => Err(other),
    })?;
    let Some(code) = remaining.pop_front() else {
        return Ok(());
    };
    let font = current_font_info(interp)?;
    let width = interp.text.string_width(&font, &[code]);
    interp.push(Value::int(i64::from(code)));
    interp.push(Value::real(width.x));
    interp.push(Value::real(width.y));
    rearm(
        interp,
        &CSHOW_CONT,
        ContFrame::Cshow {
            proc: proc.clone(),
            remaining,
        },
        proc,
    )
}

/// Numbers of an `xshow` family displacement array.
fn pop_numarray(interp: &mut Interpreter) -> InterpResult<Vec<Scalar>> {
    let v = interp.pop()?;
    match v.object {
        Object::Array(_) => interp.numbers(&v),
        Object::String(_) => Err(unregistered("encoded number strings")),
        _ => Err(typecheck(format!(
            "displacements must be an array, got {}",
            v.type_name()
        ))),
    }
}

/// `string numarray`: show each character, then move by its displacement
/// instead of its width. `step` turns `per_char` numbers into one move.
fn show_displaced(
    interp: &mut Interpreter,
    per_char: usize,
    step: fn(&[Scalar]) -> Vec2,
) -> InterpResult<()> {
    let numbers = pop_numarray(interp)?;
    let text = interp.pop_bytes()?;
    if numbers.len() < text.len() * per_char {
        return Err(rangecheck(format!(
            "{} displacements for {} characters",
            numbers.len(),
            text.len()
        )));
    }
    let font = current_font_info(interp)?;
    for (&code, numbers) in text.iter().zip(numbers.chunks_exact(per_char)) {
        let width = interp.text.string_width(&font, &[code]);
        let spacing = Spacing {
            all: step(numbers) - width,
            ..Spacing::default()
        };
        show_with(interp, &[code], &spacing)?;
    }
    Ok(())
}

pub(super) fn xshow(interp: &mut Interpreter) -> InterpResult<()> {
    show_displaced(interp, 1, |n| Vec2::new(n[0], 0.0))
}

pub(super) fn yshow(interp: &mut Interpreter) -> InterpResult<()> {
    show_displaced(interp, 1, |n| Vec2::new(0.0, n[0]))
}

pub(super) fn xyshow(interp: &mut Interpreter) -> InterpResult<()> {
    show_displaced(interp, 2, |n| Vec2::new(n[0], n[1]))
}

/// `name glyphshow`. A glyph missing from the encoding is not drawn but
/// still advances like an ordinary glyph.
pub(super) fn glyphshow(interp: &mut Interpreter) -> InterpResult<()> {
    let glyph = interp.pop()?;
    let Object::Name(name) = &glyph.object else {
        return Err(typecheck(format!(
            "glyphshow needs a glyph name, got {}",
            glyph.type_name()
        )));
    };
    let font = current_font_info(interp)?;
    if let Some(code) = font.code_for(&name.text()) {
        return show_with(interp, &[code], &Spacing::default());
    }
    tracing::debug!(glyph = %name, font = %font.name, "glyph outside the encoding");
    let advance = font.matrix.transform_delta(Vec2::new(GLYPH_WIDTH, 0.0));
    interp.gfx().rmoveto(advance)?;
    Ok(())
}

/// Check `n` numeric operands of a glyph metrics operator and drop them.
/// Glyph procedures are never run for painting, so the metrics have no
/// cache to go into.
fn drop_metrics(interp: &mut Interpreter, n: usize) -> InterpResult<()> {
    for _ in 0..n {
        interp.pop_real()?;
    }
    Ok(())
}

/// `wx wy setcharwidth`.
pub(super) fn setcharwidth(interp: &mut Interpreter) -> InterpResult<()> {
    drop_metrics(interp, 2)
}

/// `wx wy llx lly urx ury setcachedevice`.
pub(super) fn setcachedevice(interp: &mut Interpreter) -> InterpResult<()> {
    drop_metrics(interp, 6)
}

/// `w0x w0y llx lly urx ury w1x w1y vx vy setcachedevice2`.
pub(super) fn setcachedevice2(interp: &mut Interpreter) -> InterpResult<()> {
    drop_metrics(interp, 10)
}

pub(super) fn stringwidth(interp: &mut Interpreter) -> InterpResult<()> {
    let text = interp.pop_bytes()?;
    let font = current_font_info(interp)?;
    let w = interp.text.string_width(&font, &text);
    interp.push(Value::real(w.x));
    interp.push(Value::real(w.y));
    Ok(())
}

/// `string bool charpath`: append the glyph outlines to the path.
pub(super) fn charpath(interp: &mut Interpreter) -> InterpResult<()> {
    interp.pop_bool()?;
    let text = interp.pop_bytes()?;
    let font = current_font_info(interp)?;
    let (outline, advance) = interp
        .text
        .char_path(&interp.gstates.current.gfx, &font, &text)?;
    let gfx = interp.gfx();
    gfx.path.extend(&outline);
    gfx.rmoveto(advance)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use epsvg_graphics::picture::GraphicsObject;

    use crate::interpreter::Interpreter;

    fn reals(interp: &Interpreter) -> Vec<f64> {
        interp
            .operand_stack()
            .iter()
            .map(|v| v.to_real().unwrap_or(f64::NAN))
            .collect()
    }

    #[test]
    fn findfont_synthesizes_and_registers() {
        let mut interp = Interpreter::new();
        interp
            .run(
                "/Times-Roman findfont dup /FontName get /Times-Roman eq \
                 exch /Times-Roman findfont eq \
                 FontDirectory /Times-Roman known",
            )
            .unwrap();
        let stack = interp.operand_stack();
        assert!(stack.iter().all(|v| v.to_bool().unwrap()));
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn scalefont_scales_the_matrix() {
        let mut interp = Interpreter::new();
        interp
            .run("/Courier findfont 10 scalefont /FontMatrix get aload pop")
            .unwrap();
        let m = reals(&interp);
        assert!((m[0] - 0.01).abs() < 1e-12 && (m[3] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn show_advances_current_point() {
        let mut interp = Interpreter::new();
        interp
            .run("/Courier 10 selectfont 0 0 moveto (abc) show currentpoint")
            .unwrap();
        let p = reals(&interp);
        assert!((p[0] - 18.0).abs() < 1e-9 && p[1].abs() < 1e-9);
        let page = &interp.pictures()[0];
        assert!(matches!(page.objects[0], GraphicsObject::Text(_)));
    }

    #[test]
    fn stringwidth_uses_space_advance() {
        let mut interp = Interpreter::new();
        interp
            .run("/Courier findfont 100 scalefont setfont (a b) stringwidth")
            .unwrap();
        assert!((reals(&interp)[0] - (60.0 + 27.8 + 60.0)).abs() < 1e-9);
    }

    #[test]
    fn kshow_runs_between_pairs() {
        let mut interp = Interpreter::new();
        interp
            .run("/Courier 10 selectfont 0 0 moveto {2 array astore} (abc) kshow count")
            .unwrap();
        let stack = interp.operand_stack();
        assert_eq!(stack.last().unwrap().to_int().unwrap(), 2);
    }

    #[test]
    fn cshow_hands_widths_to_the_procedure() {
        let mut interp = Interpreter::new();
        interp
            .run(
                "/Courier 10 selectfont 0 0 moveto \
                 {3 array astore} (a ) cshow currentpoint",
            )
            .unwrap();
        let stack = interp.operand_stack();
        assert_eq!(stack.len(), 4);
        let first: Vec<f64> = interp
            .array_items(&stack[0])
            .unwrap()
            .iter()
            .map(|v| v.to_real().unwrap())
            .collect();
        assert_eq!(first[0], 97.0);
        assert!((first[1] - 6.0).abs() < 1e-9 && first[2].abs() < 1e-9);
        let second = interp.array_items(&stack[1]).unwrap();
        assert!((second[1].to_real().unwrap() - 2.78).abs() < 1e-9);
        // Nothing was shown.
        assert!(stack[2].to_real().unwrap().abs() < 1e-9);
        assert!(interp.pictures().iter().all(|p| p.objects.is_empty()));
    }

    #[test]
    fn xshow_family_uses_the_given_displacements() {
        let mut interp = Interpreter::new();
        interp
            .run(
                "/Courier 10 selectfont \
                 0 0 moveto (ab) [20 30] xshow currentpoint \
                 0 0 moveto (ab) [5 7] yshow currentpoint \
                 0 0 moveto (ab) [1 2 3 4] xyshow currentpoint",
            )
            .unwrap();
        let p = reals(&interp);
        let expected = [50.0, 0.0, 0.0, 12.0, 4.0, 6.0];
        assert_eq!(p.len(), expected.len());
        assert!(p.iter().zip(expected).all(|(a, e)| (a - e).abs() < 1e-9), "{p:?}");
    }

    #[test]
    fn xshow_needs_a_displacement_per_character() {
        let mut interp = Interpreter::new();
        interp
            .run(
                "/Courier 10 selectfont 0 0 moveto \
                 {(abc) [1 2] xshow} stopped $error /errorname get",
            )
            .unwrap();
        let stack = interp.operand_stack();
        assert_eq!(interp.text_of(&stack[stack.len() - 1]), b"rangecheck");
    }

    #[test]
    fn glyphshow_finds_the_code_by_name() {
        let mut interp = Interpreter::new();
        interp
            .run(
                "/Courier 10 selectfont 0 0 moveto /space glyphshow currentpoint \
                 0 0 moveto /nosuchglyph glyphshow currentpoint",
            )
            .unwrap();
        let p = reals(&interp);
        assert!((p[0] - 2.78).abs() < 1e-9);
        assert!((p[2] - 6.0).abs() < 1e-9);
        assert_eq!(interp.pictures()[0].objects.len(), 1);
        interp.run("{1 glyphshow} stopped").unwrap();
        assert!(interp.operand_stack().last().unwrap().to_bool().unwrap());
    }

    #[test]
    fn cache_device_operators_check_their_operands() {
        let mut interp = Interpreter::new();
        interp
            .run(
                "1 2 3 4 5 6 setcachedevice \
                 1 2 3 4 5 6 7 8 9 10 setcachedevice2 1 0 setcharwidth",
            )
            .unwrap();
        assert!(interp.operand_stack().is_empty());
        interp
            .run("{1 2 3 4 5 setcachedevice} stopped $error /errorname get")
            .unwrap();
        let stack = interp.operand_stack();
        assert_eq!(interp.text_of(&stack[stack.len() - 1]), b"stackunderflow");
    }

    #[test]
    fn show_without_font_is_invalidfont() {
        let mut interp = Interpreter::new();
        interp
            .run("0 0 moveto {(x) show} stopped $error /errorname get")
            .unwrap();
        let stack = interp.operand_stack();
        assert_eq!(interp.text_of(&stack[stack.len() - 1]), b"invalidfont");
    }
}
