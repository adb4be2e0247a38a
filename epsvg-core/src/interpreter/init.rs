//! Building a fresh interpreter: VM, fixed dictionaries, devices and the
//! initial graphics state.

use std::time::Instant;

use epsvg_graphics::bbox::BoundingBox;
use epsvg_graphics::device::{NullDevice, OutputDevice};
use epsvg_graphics::picture::PictureDevice;
use epsvg_graphics::state::{DeviceId, GraphicsState};

use crate::encoding::{iso_latin1_encoding, standard_encoding};
use crate::error::{ErrorKind, InterpResult, InterpreterError};
use crate::file::FileTable;
use crate::filesystem::NullFileSystem;
use crate::gstate::{GState, GstateStack};
use crate::operators::{self, OPERATORS};
use crate::options::Options;
use crate::resources::ResourceManager;
use crate::stacks::{ContStack, DictStack, ExecStack, OperandStack};
use crate::text::MetricsTextHandler;
use crate::types::{Access, DictRef, Object, Value};
use crate::vm::Vm;

use super::Interpreter;

/// Enough objects for the initial dictionaries and a small program.
const MIN_VM_OBJECTS: usize = 256;

/// Procedures that select a paper size on a printer; here they do nothing.
const PAGE_SIZES: &[&str] = &[
    "letter", "lettersmall", "legal", "ledger", "11x17", "note", "a3", "a4", "a4small", "a5",
    "b5",
];

/// Dictionaries the interpreter needs even when the program has redefined
/// their names.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedDicts {
    pub errordict: DictRef,
    pub dollar_error: DictRef,
    /// Local VM, so `restore` rolls them back.
    pub user_params: DictRef,
    pub system_params: DictRef,
}

pub(super) fn build(mut options: Options) -> Interpreter {
    options.max_vm_objects = options.max_vm_objects.max(MIN_VM_OBJECTS);
    #[expect(clippy::expect_used, reason = "the VM limit was raised to fit")]
    try_build(options).expect("initial dictionaries fit in VM")
}

fn literal_dict(d: DictRef) -> Value {
    Value::literal(Object::Dict(d))
}

fn int_of(n: usize) -> Value {
    Value::int(i64::try_from(n).unwrap_or(i64::MAX))
}

fn operator_named(name: &str) -> InterpResult<Value> {
    operators::lookup(name)
        .map(Value::operator)
        .ok_or_else(|| InterpreterError::internal(format!("operator {name} is not registered")))
}

/// A read-only array of glyph names.
fn encoding_array(vm: &mut Vm, names: &[&str; 256]) -> InterpResult<Value> {
    let glyphs = names.iter().map(|n| Value::name(n)).collect();
    let mut v = Value::literal(Object::Array(vm.new_array(glyphs)?));
    v.access = Access::READ_ONLY;
    Ok(v)
}

fn try_build(options: Options) -> InterpResult<Interpreter> {
    let mut vm = Vm::new(options.max_vm_objects);

    // -- global VM --
    vm.set_global(true);
    let systemdict = vm.new_dict(OPERATORS.len() + 64)?;
    let globaldict = vm.new_dict(64)?;
    let font_directory = vm.new_dict(64)?;
    let statusdict = vm.new_dict(16)?;
    let system_params = vm.new_dict(8)?;
    let standard = encoding_array(&mut vm, &standard_encoding())?;
    let latin1 = encoding_array(&mut vm, &iso_latin1_encoding())?;
    let mut identity = Value::executable(Object::Array(vm.new_array(Vec::new())?));
    identity.access = Access::READ_ONLY;
    let printer_name = Value::literal(Object::String(vm.new_string(b"epsvg".to_vec())?));
    let resources = ResourceManager::new(&mut vm, font_directory)?;
    for (name, encoding) in [
        ("StandardEncoding", &standard),
        ("ISOLatin1Encoding", &latin1),
    ] {
        resources.define(&mut vm, "Encoding", &Value::name(name), encoding.clone())?;
    }
    {
        let params = vm.dict_mut(system_params)?;
        params.insert_name("PrinterName", printer_name);
        params.insert_name("MaxFontCache", Value::int(0));
        params.insert_name("BuildTime", Value::int(0));
        params.insert_name("ByteOrder", Value::boolean(false));
    }

    // -- local VM --
    vm.set_global(false);
    let userdict = vm.new_dict(200)?;
    let errordict = vm.new_dict(ErrorKind::RECOVERABLE.len() + 1)?;
    let dollar_error = vm.new_dict(16)?;
    let user_params = vm.new_dict(16)?;
    let job_name = Value::literal(Object::String(
        vm.new_string(options.job_name.as_bytes().to_vec())?,
    ));

    let errorproc = operator_named(".errorproc")?;
    let stop = operator_named("stop")?;
    for kind in ErrorKind::RECOVERABLE {
        let body = vec![Value::name(kind.name()), errorproc.clone(), stop.clone()];
        let mut handler = Value::executable(Object::Array(vm.new_array(body)?));
        handler.access = Access::READ_ONLY;
        vm.dict_mut(errordict)?.insert_name(kind.name(), handler);
    }
    vm.dict_mut(errordict)?
        .insert_name("handleerror", operator_named(".handleerror")?);

    {
        let err = vm.dict_mut(dollar_error)?;
        err.insert_name("newerror", Value::boolean(false));
        for key in ["errorname", "command", "errorinfo", "ostack", "estack", "dstack"] {
            err.insert_name(key, Value::null());
        }
        err.insert_name("recordstacks", Value::boolean(options.record_stacks));
        err.insert_name("binary", Value::boolean(false));
    }
    {
        let params = vm.dict_mut(user_params)?;
        params.insert_name("MaxExecStack", int_of(options.max_exec_stack));
        params.insert_name("MaxOpStack", int_of(options.max_op_stack));
        params.insert_name("MaxDictStack", int_of(options.max_dict_stack));
        params.insert_name("MaxLocalVM", int_of(options.max_vm_objects));
        params.insert_name("VMThreshold", Value::int(1_000_000));
        params.insert_name("JobName", job_name);
    }

    // -- systemdict --
    {
        let sys = vm.dict_mut(systemdict)?;
        for op in OPERATORS {
            sys.insert_name(op.name, Value::operator(op));
        }
        for (name, d) in [
            ("systemdict", systemdict),
            ("globaldict", globaldict),
            ("userdict", userdict),
            ("statusdict", statusdict),
            ("errordict", errordict),
            ("$error", dollar_error),
            ("FontDirectory", font_directory),
            ("GlobalFontDirectory", font_directory),
        ] {
            sys.insert_name(name, literal_dict(d));
        }
        sys.insert_name("true", Value::boolean(true));
        sys.insert_name("false", Value::boolean(false));
        sys.insert_name("null", Value::null());
        sys.insert_name("StandardEncoding", standard.clone());
        sys.insert_name("ISOLatin1Encoding", latin1);
        for name in PAGE_SIZES {
            sys.insert_name(name, identity.clone());
        }
        sys.access = Access::READ_ONLY;
    }

    // -- devices and graphics state --
    let mut devices: Vec<Box<dyn OutputDevice>> =
        vec![Box::new(PictureDevice::new()), Box::new(NullDevice)];
    for device in &mut devices {
        device.init(&BoundingBox::A4)?;
    }
    let default_matrix = devices[0].default_matrix();
    let gfx = GraphicsState::new(default_matrix, BoundingBox::A4, DeviceId(0));
    let gstates = GstateStack::new(GState::new(gfx, &identity));

    Ok(Interpreter {
        dstack: DictStack::new([systemdict, globaldict, userdict], options.max_dict_stack),
        ostack: OperandStack::new(),
        estack: ExecStack::new(options.max_exec_stack),
        cstack: ContStack::new(),
        gstates,
        devices,
        saves: Vec::new(),
        next_save: 1,
        files: FileTable::new(options.stdin.clone()),
        fs: Box::new(NullFileSystem),
        text: Box::new(MetricsTextHandler),
        resources,
        dicts: FixedDicts {
            errordict,
            dollar_error,
            user_params,
            system_params,
        },
        standard_encoding: standard,
        packing: false,
        rng_state: 0,
        started: Instant::now(),
        page: BoundingBox::A4,
        quit: false,
        stdout: Vec::new(),
        stderr: Vec::new(),
        last_error: None,
        vm,
        options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::DictKey;

    #[test]
    fn systemdict_is_read_only_and_complete() {
        let interp = Interpreter::new();
        let sys = interp.dstack.as_slice()[0];
        let body = interp.vm.dict(sys).unwrap();
        assert!(!body.access.can_write());
        for op in OPERATORS {
            assert!(body.get_name(op.name).is_some(), "{} missing", op.name);
        }
        for name in ["$error", "errordict", "FontDirectory", "StandardEncoding", "a4"] {
            assert!(body.get_name(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn errordict_covers_every_error() {
        let interp = Interpreter::new();
        let errordict = interp.vm.dict(interp.dicts.errordict).unwrap();
        for kind in ErrorKind::RECOVERABLE {
            let handler = errordict.get_name(kind.name()).unwrap();
            assert!(handler.is_procedure());
        }
        assert!(errordict.get(&DictKey::name("handleerror")).is_some());
    }

    #[test]
    fn tiny_vm_limit_is_raised() {
        let interp = Interpreter::with_options(Options {
            max_vm_objects: 1,
            ..Options::default()
        });
        assert!(interp.vm.max_objects() >= MIN_VM_OBJECTS);
    }
}
