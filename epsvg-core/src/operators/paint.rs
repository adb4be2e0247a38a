//! Painting operators: fills, strokes, sampled images, smooth shadings and
//! page output.

use epsvg_graphics::color::{ColorSpace, DeviceColor};
use epsvg_graphics::device::{Image, Shading, ShadingGeometry};
use epsvg_graphics::matrix::Matrix;
use epsvg_graphics::state::DeviceId;
use epsvg_graphics::types::{FillRule, Point, Scalar};

use crate::error::{InterpResult, rangecheck, typecheck, unregistered};
use crate::interpreter::Interpreter;
use crate::operators::path::{pop_rects, rect_path};
use crate::types::{Object, Value};

/// Index of the device `nulldevice` installs.
const NULL_DEVICE: DeviceId = DeviceId(1);

// ---------------------------------------------------------------------------
// Fill and stroke
// ---------------------------------------------------------------------------

fn fill_with(interp: &mut Interpreter, rule: FillRule) -> InterpResult<()> {
    interp.with_device(|device, state| device.fill(state, rule))?;
    interp.gfx().newpath();
    Ok(())
}

pub(super) fn fill(interp: &mut Interpreter) -> InterpResult<()> {
    fill_with(interp, FillRule::NonZero)
}

pub(super) fn eofill(interp: &mut Interpreter) -> InterpResult<()> {
    fill_with(interp, FillRule::EvenOdd)
}

pub(super) fn stroke(interp: &mut Interpreter) -> InterpResult<()> {
    interp.with_device(|device, state| device.stroke(state))?;
    interp.gfx().newpath();
    Ok(())
}

/// Paint rectangles without disturbing the current path.
fn paint_rects(interp: &mut Interpreter, stroke: bool) -> InterpResult<()> {
    let rects = pop_rects(interp)?;
    let gfx = interp.gfx();
    let saved = (gfx.path.clone(), gfx.position);
    rect_path(interp, &rects);
    let result = if stroke {
        interp.with_device(|device, state| device.stroke(state))
    } else {
        interp.with_device(|device, state| device.fill(state, FillRule::NonZero))
    };
    let gfx = interp.gfx();
    (gfx.path, gfx.position) = saved;
    result
}

pub(super) fn rectfill(interp: &mut Interpreter) -> InterpResult<()> {
    paint_rects(interp, false)
}

pub(super) fn rectstroke(interp: &mut Interpreter) -> InterpResult<()> {
    // The optional trailing matrix is applied to the stroke only.
    let top = interp.ostack.peek(0)?.clone();
    let has_matrix = interp.top_is_matrix()
        && interp.array_items(&top).is_ok_and(|items| items.len() == 6)
        && interp
            .ostack
            .peek(1)
            .is_ok_and(|v| v.is_number() || matches!(v.object, Object::Array(_)));
    let matrix = if has_matrix {
        Some(interp.pop_matrix()?)
    } else {
        None
    };
    let Some(m) = matrix else {
        return paint_rects(interp, true);
    };
    let rects = pop_rects(interp)?;
    let gfx = interp.gfx();
    let saved = (gfx.path.clone(), gfx.position, gfx.ctm);
    rect_path(interp, &rects);
    let gfx = interp.gfx();
    gfx.ctm = gfx.ctm.pre_concat(m);
    let result = interp.with_device(|device, state| device.stroke(state));
    let gfx = interp.gfx();
    (gfx.path, gfx.position, gfx.ctm) = saved;
    result
}

pub(super) fn erasepage(interp: &mut Interpreter) -> InterpResult<()> {
    interp.with_device(|device, _| device.erase_page())
}

// ---------------------------------------------------------------------------
// Pages and devices
// ---------------------------------------------------------------------------

pub(super) fn showpage(interp: &mut Interpreter) -> InterpResult<()> {
    tracing::debug!("showpage");
    interp.with_device(|device, _| {
        device.show_page()?;
        device.erase_page()
    })?;
    super::gstate::initgraphics(interp)
}

pub(super) fn copypage(interp: &mut Interpreter) -> InterpResult<()> {
    interp.with_device(|device, _| device.show_page())
}

/// Route painting to a device that discards it.
#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn nulldevice(interp: &mut Interpreter) -> InterpResult<()> {
    let gfx = interp.gfx();
    gfx.device = NULL_DEVICE;
    gfx.ctm = Matrix::IDENTITY;
    gfx.newpath();
    Ok(())
}

/// `dict setpagedevice`. The page size comes from the document header, so
/// requests are checked and dropped.
pub(super) fn setpagedevice(interp: &mut Interpreter) -> InterpResult<()> {
    let request = interp.pop()?;
    request.to_dict()?;
    tracing::debug!("setpagedevice request ignored");
    Ok(())
}

/// `currentpagedevice dict`: a fresh dictionary with `PageSize`.
pub(super) fn currentpagedevice(interp: &mut Interpreter) -> InterpResult<()> {
    let page = interp.page();
    let size = interp.new_array_value(vec![
        Value::real(page.width()),
        Value::real(page.height()),
    ])?;
    let device = interp.new_dict_value(1)?;
    interp
        .vm
        .dict_mut(device.to_dict()?)?
        .insert_name("PageSize", size);
    interp.push(device);
    Ok(())
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Operands of the image operators, before the samples are read.
struct ImageParams {
    width: u32,
    height: u32,
    bits: u8,
    matrix: Matrix,
    decode: Option<Vec<Scalar>>,
    sources: Vec<Value>,
}

fn dimension(v: i64, what: &str) -> InterpResult<u32> {
    u32::try_from(v)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| rangecheck(format!("image {what} {v}")))
}

fn bits_per_component(v: i64) -> InterpResult<u8> {
    match v {
        1 | 2 | 4 | 8 | 12 | 16 => u8::try_from(v).map_err(|_| rangecheck("bits per component")),
        _ => Err(rangecheck(format!("{v} bits per component"))),
    }
}

/// `width height bits matrix source`, with `bits` already popped by the
/// caller for `imagemask`.
fn pop_image_operands(
    interp: &mut Interpreter,
    sources: usize,
    bits: Option<u8>,
) -> InterpResult<ImageParams> {
    let sources = interp.ostack.pop_n(sources)?;
    let matrix = interp.pop_matrix()?;
    let bits = match bits {
        Some(b) => b,
        None => bits_per_component(interp.pop_int()?)?,
    };
    let height = dimension(interp.pop_int()?, "height")?;
    let width = dimension(interp.pop_int()?, "width")?;
    Ok(ImageParams {
        width,
        height,
        bits,
        matrix,
        decode: None,
        sources,
    })
}

/// The dictionary form of `image` and `imagemask`.
fn image_dict(interp: &Interpreter, dict: &Value, mask: bool) -> InterpResult<ImageParams> {
    let required = |key: &str| -> InterpResult<Value> {
        interp
            .entry(dict, key)?
            .ok_or_else(|| rangecheck(format!("image dictionary without /{key}")))
    };
    let kind = required("ImageType")?.to_int()?;
    if kind != 1 {
        return Err(rangecheck(format!("ImageType {kind}")));
    }
    let multiple = interp
        .entry(dict, "MultipleDataSources")?
        .map(|v| v.to_bool())
        .transpose()?
        .unwrap_or(false);
    if multiple {
        return Err(unregistered("MultipleDataSources in an image dictionary"));
    }
    let bits = if mask {
        1
    } else {
        bits_per_component(required("BitsPerComponent")?.to_int()?)?
    };
    let decode = interp
        .entry(dict, "Decode")?
        .map(|v| interp.numbers(&v))
        .transpose()?;
    Ok(ImageParams {
        width: dimension(required("Width")?.to_int()?, "width")?,
        height: dimension(required("Height")?.to_int()?, "height")?,
        bits,
        matrix: interp.value_to_matrix(&required("ImageMatrix")?)?,
        decode,
        sources: vec![required("DataSource")?],
    })
}

/// Read up to `needed` bytes from an image data source. Strings are
/// reused until enough data has arrived; procedures are called until they
/// return an empty string.
fn read_source(interp: &mut Interpreter, source: &Value, needed: usize) -> InterpResult<Vec<u8>> {
    let mut data = Vec::with_capacity(needed);
    match &source.object {
        Object::File(id) => {
            let file = interp.files.get_mut(*id)?;
            while data.len() < needed {
                let Some(b) = file.read_byte() else { break };
                data.push(b);
            }
        }
        Object::Array(_) if source.executable => {
            while data.len() < needed {
                interp.run_object(source.clone())?;
                let chunk = interp.pop()?;
                if !matches!(chunk.object, Object::String(_)) {
                    return Err(typecheck(format!(
                        "image procedure returned {}",
                        chunk.type_name()
                    )));
                }
                let bytes = interp.text_bytes(&chunk)?;
                if bytes.is_empty() {
                    break;
                }
                data.extend_from_slice(&bytes);
            }
            data.truncate(needed);
        }
        Object::String(_) => {
            let bytes = interp.text_bytes(source)?;
            while !bytes.is_empty() && data.len() < needed {
                let take = (needed - data.len()).min(bytes.len());
                data.extend_from_slice(&bytes[..take]);
            }
        }
        _ => {
            return Err(typecheck(format!(
                "image data source is {}",
                source.type_name()
            )));
        }
    }
    if data.len() < needed {
        tracing::debug!(needed, got = data.len(), "image data ended early");
    }
    Ok(data)
}

fn decode_pairs(
    decode: Option<Vec<Scalar>>,
    components: usize,
) -> InterpResult<Vec<(Scalar, Scalar)>> {
    match decode {
        None => Ok(vec![(0.0, 1.0); components]),
        Some(d) if d.len() == 2 * components => {
            Ok(d.chunks_exact(2).map(|c| (c[0], c[1])).collect())
        }
        Some(d) => Err(rangecheck(format!(
            "Decode has {} entries for {components} components",
            d.len()
        ))),
    }
}

/// Read the samples and hand the image to the device.
fn paint_image(
    interp: &mut Interpreter,
    params: ImageParams,
    space: ColorSpace,
    mask: Option<bool>,
) -> InterpResult<()> {
    let components = if mask.is_some() { 1 } else { space.components() };
    let mut image = Image {
        width: params.width,
        height: params.height,
        bits_per_component: params.bits,
        space,
        decode: decode_pairs(params.decode, components)?,
        data: Vec::new(),
        matrix: params.matrix,
        mask,
    };
    let needed = image.data_len();
    image.data = match params.sources.as_slice() {
        [source] => read_source(interp, source, needed)?,
        planes => {
            // One source per component: interleave 8-bit planes.
            if params.bits != 8 {
                return Err(unregistered("multiple data sources with other than 8 bits"));
            }
            let plane_len = needed / planes.len();
            let mut read = Vec::with_capacity(planes.len());
            for source in planes {
                read.push(read_source(interp, source, plane_len)?);
            }
            (0..plane_len)
                .flat_map(|i| read.iter().map(move |p| p.get(i).copied().unwrap_or(0)))
                .collect()
        }
    };
    interp.with_device(|device, state| device.image(&image, state))
}

/// `width height bits matrix source image` or `dict image`.
pub(super) fn image(interp: &mut Interpreter) -> InterpResult<()> {
    let space = interp.gfx().color.space();
    if matches!(interp.ostack.peek(0)?.object, Object::Dict(_)) {
        let dict = interp.pop()?;
        let params = image_dict(interp, &dict, false)?;
        return paint_image(interp, params, space, None);
    }
    let params = pop_image_operands(interp, 1, None)?;
    paint_image(interp, params, ColorSpace::DeviceGray, None)
}

/// `width height polarity matrix source imagemask` or `dict imagemask`.
pub(super) fn imagemask(interp: &mut Interpreter) -> InterpResult<()> {
    if matches!(interp.ostack.peek(0)?.object, Object::Dict(_)) {
        let dict = interp.pop()?;
        let mut params = image_dict(interp, &dict, true)?;
        // Decode [1 0] paints the 1 bits.
        let polarity = params.decode.take().is_some_and(|d| d.first() == Some(&1.0));
        return paint_image(interp, params, ColorSpace::DeviceGray, Some(polarity));
    }
    let source = interp.pop()?;
    let matrix = interp.pop()?;
    let polarity = interp.pop_bool()?;
    interp.push(matrix);
    interp.push(source);
    let params = pop_image_operands(interp, 1, Some(1))?;
    paint_image(interp, params, ColorSpace::DeviceGray, Some(polarity))
}

/// `width height bits matrix source... multi ncomp colorimage`.
pub(super) fn colorimage(interp: &mut Interpreter) -> InterpResult<()> {
    let ncomp = interp.pop_int()?;
    let multi = interp.pop_bool()?;
    let space = match ncomp {
        1 => ColorSpace::DeviceGray,
        3 => ColorSpace::DeviceRgb,
        4 => ColorSpace::DeviceCmyk,
        _ => return Err(rangecheck(format!("colorimage with {ncomp} components"))),
    };
    let sources = if multi { space.components() } else { 1 };
    let params = pop_image_operands(interp, sources, None)?;
    paint_image(interp, params, space, None)
}

// ---------------------------------------------------------------------------
// Smooth shading
// ---------------------------------------------------------------------------

/// Start color, end color and exponent of a type 2 (exponential) function
/// or an array of them, one per component.
fn shading_function(
    interp: &Interpreter,
    function: &Value,
) -> InterpResult<(Vec<Scalar>, Vec<Scalar>, Scalar)> {
    let functions = match function.object {
        Object::Array(_) => interp.array_items(function)?,
        Object::Dict(_) => vec![function.clone()],
        _ => return Err(typecheck(format!("shading function is {}", function.type_name()))),
    };
    let (mut c0, mut c1, mut exponent) = (Vec::new(), Vec::new(), 1.0);
    for f in &functions {
        let kind = interp
            .entry(f, "FunctionType")?
            .ok_or_else(|| rangecheck("function without /FunctionType"))?
            .to_int()?;
        if kind != 2 {
            return Err(unregistered(format!("FunctionType {kind}")));
        }
        let values = |key: &str, default: Scalar| -> InterpResult<Vec<Scalar>> {
            interp
                .entry(f, key)?
                .map_or_else(|| Ok(vec![default]), |v| interp.numbers(&v))
        };
        c0.extend(values("C0", 0.0)?);
        c1.extend(values("C1", 1.0)?);
        exponent = interp
            .entry(f, "N")?
            .ok_or_else(|| rangecheck("function without /N"))?
            .to_real()?;
    }
    Ok((c0, c1, exponent))
}

fn parse_shading(interp: &Interpreter, dict: &Value) -> InterpResult<Shading> {
    let required = |key: &str| -> InterpResult<Value> {
        interp
            .entry(dict, key)?
            .ok_or_else(|| rangecheck(format!("shading without /{key}")))
    };
    let space = super::color::color_space(interp, &required("ColorSpace")?)?;
    let coords = interp.numbers(&required("Coords")?)?;
    let geometry = match (required("ShadingType")?.to_int()?, coords.as_slice()) {
        (2, &[x0, y0, x1, y1]) => ShadingGeometry::Axial {
            from: Point::new(x0, y0),
            to: Point::new(x1, y1),
        },
        (3, &[x0, y0, r0, x1, y1, r1]) => ShadingGeometry::Radial {
            c0: Point::new(x0, y0),
            r0,
            c1: Point::new(x1, y1),
            r1,
        },
        (2 | 3, _) => return Err(rangecheck("wrong number of shading coordinates")),
        (kind, _) => return Err(unregistered(format!("ShadingType {kind}"))),
    };
    let (c0, c1, exponent) = shading_function(interp, &required("Function")?)?;
    if c0.len() != space.components() || c1.len() != space.components() {
        return Err(rangecheck("shading function does not match the color space"));
    }
    let extend = match interp.entry(dict, "Extend")? {
        Some(v) => {
            let flags = interp.array_items(&v)?;
            match flags.as_slice() {
                [a, b] => (a.to_bool()?, b.to_bool()?),
                _ => return Err(rangecheck("Extend needs two booleans")),
            }
        }
        None => (false, false),
    };
    Ok(Shading {
        geometry,
        start: DeviceColor::from_components(space, &c0),
        end: DeviceColor::from_components(space, &c1),
        exponent,
        extend,
    })
}

pub(super) fn shfill(interp: &mut Interpreter) -> InterpResult<()> {
    let dict = interp.pop()?;
    dict.to_dict()?;
    let shading = parse_shading(interp, &dict)?;
    interp.with_device(|device, state| device.shfill(&shading, state))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use epsvg_graphics::picture::GraphicsObject;

    use crate::interpreter::Interpreter;

    fn objects(interp: &Interpreter) -> &[GraphicsObject] {
        &interp.pictures()[0].objects
    }

    #[test]
    fn fill_records_and_clears_path() {
        let mut interp = Interpreter::new();
        interp
            .run("0 0 moveto 10 0 lineto 10 10 lineto closepath fill {currentpoint} stopped")
            .unwrap();
        assert!(matches!(objects(&interp)[0], GraphicsObject::Fill(_)));
        assert!(interp.operand_stack()[0].to_bool().unwrap());
    }

    #[test]
    fn page_device_reports_the_page_size() {
        let mut interp = Interpreter::new();
        interp
            .run(
                "%!PS-Adobe-3.0 EPSF-3.0\n%%BoundingBox: 0 0 200 100\n\
                 << /PageSize [595 842] >> setpagedevice \
                 currentpagedevice /PageSize get aload pop",
            )
            .unwrap();
        let stack = interp.operand_stack();
        assert_eq!(stack[0].to_real().unwrap(), 200.0);
        assert_eq!(stack[1].to_real().unwrap(), 100.0);
        interp.run("{5 setpagedevice} stopped").unwrap();
        assert!(interp.operand_stack().last().unwrap().to_bool().unwrap());
    }

    #[test]
    fn rectfill_keeps_current_path() {
        let mut interp = Interpreter::new();
        interp.run("5 5 moveto 0 0 10 10 rectfill currentpoint").unwrap();
        assert_eq!(interp.operand_stack().len(), 2);
        assert_eq!(objects(&interp).len(), 1);
    }

    #[test]
    fn image_reads_procedure_data() {
        let mut interp = Interpreter::new();
        interp
            .run("/n 0 def 2 2 8 [2 0 0 2 0 0] {/n n 1 add def <00ff>} image n")
            .unwrap();
        let GraphicsObject::Image(img) = &objects(&interp)[0] else {
            panic!("expected an image");
        };
        assert_eq!(img.image.data, [0x00, 0xff, 0x00, 0xff]);
        assert_eq!(interp.operand_stack()[0].to_int().unwrap(), 2);
    }

    #[test]
    fn colorimage_interleaves_planes() {
        let mut interp = Interpreter::new();
        interp
            .run("1 1 8 [1 0 0 1 0 0] <10> <20> <30> true 3 colorimage")
            .unwrap();
        let GraphicsObject::Image(img) = &objects(&interp)[0] else {
            panic!("expected an image");
        };
        assert_eq!(img.image.data, [0x10, 0x20, 0x30]);
    }

    #[test]
    fn axial_shading() {
        let mut interp = Interpreter::new();
        interp
            .run(
                "<< /ShadingType 2 /ColorSpace /DeviceRGB /Coords [0 0 100 0] \
                 /Function << /FunctionType 2 /Domain [0 1] /C0 [1 0 0] /C1 [0 0 1] /N 1 >> \
                 /Extend [true true] >> shfill",
            )
            .unwrap();
        assert!(matches!(objects(&interp)[0], GraphicsObject::Shading(_)));
    }

    #[test]
    fn unsupported_shading_type_is_unregistered() {
        let mut interp = Interpreter::new();
        interp
            .run(
                "{<< /ShadingType 4 /ColorSpace /DeviceGray /Coords [] /Function 0 >> shfill} \
                 stopped $error /errorname get",
            )
            .unwrap();
        let stack = interp.operand_stack();
        assert_eq!(interp.text_of(&stack[stack.len() - 1]), b"unregistered");
    }

    #[test]
    fn nulldevice_discards_painting() {
        let mut interp = Interpreter::new();
        interp.run("nulldevice 0 0 10 10 rectfill").unwrap();
        assert!(objects(&interp).is_empty());
    }
}
