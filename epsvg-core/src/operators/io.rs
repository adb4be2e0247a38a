//! File and output operators.
//!
//! Output to `%stdout` and `%stderr` is collected in the interpreter's
//! buffers. Input files are read-only byte buffers obtained from the
//! [`FileSystem`](crate::filesystem::FileSystem).

use crate::error::{
    ErrorKind, InterpResult, InterpreterError, invalidaccess, rangecheck, typecheck, unregistered,
};
use crate::file::{FileKind, FileTable};
use crate::filter::{Filter, hex_value};
use crate::interpreter::Interpreter;
use crate::types::{Access, FileId, Object, Value};

fn undefined_filename(name: &str) -> InterpreterError {
    InterpreterError::new(ErrorKind::UndefinedFilename, name)
}

/// Append `bytes` to the stream behind a writable file.
fn write_to(interp: &mut Interpreter, file: FileId, bytes: &[u8]) -> InterpResult<()> {
    match interp.files.get(file)?.kind {
        FileKind::Stdout => interp.stdout.extend_from_slice(bytes),
        FileKind::Stderr => interp.stderr.extend_from_slice(bytes),
        FileKind::Stdin | FileKind::Memory => {
            return Err(invalidaccess("file is not open for writing"));
        }
    }
    Ok(())
}

/// Pop a file operand checked for reading.
fn pop_input(interp: &mut Interpreter) -> InterpResult<FileId> {
    let v = interp.pop()?;
    let f = v.to_file()?;
    v.check_access(false, true, false)?;
    if interp.files.get(f)?.is_writable() {
        return Err(invalidaccess("file is not open for reading"));
    }
    Ok(f)
}

fn pop_output(interp: &mut Interpreter) -> InterpResult<FileId> {
    let v = interp.pop()?;
    let f = v.to_file()?;
    if !interp.files.get(f)?.is_writable() {
        return Err(invalidaccess("file is not open for writing"));
    }
    Ok(f)
}

fn file_value(id: FileId, access: Access) -> Value {
    let mut v = Value::literal(Object::File(id));
    v.access = access;
    v
}

// ---------------------------------------------------------------------------
// Printing
// ---------------------------------------------------------------------------

pub(super) fn print(interp: &mut Interpreter) -> InterpResult<()> {
    let bytes = interp.pop_bytes()?;
    interp.stdout.extend_from_slice(&bytes);
    Ok(())
}

/// `=`
pub(super) fn print_text(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    let mut text = interp.text_of(&v);
    text.push(b'\n');
    interp.stdout.extend_from_slice(&text);
    Ok(())
}

/// `==`
pub(super) fn print_syntax(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    let text = interp.syntax_of(&v);
    interp.stdout.extend_from_slice(text.as_bytes());
    interp.stdout.push(b'\n');
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn stack(interp: &mut Interpreter) -> InterpResult<()> {
    let items = interp.ostack.as_slice().to_vec();
    for v in items.iter().rev() {
        let mut text = interp.text_of(v);
        text.push(b'\n');
        interp.stdout.extend_from_slice(&text);
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) fn pstack(interp: &mut Interpreter) -> InterpResult<()> {
    let items = interp.ostack.as_slice().to_vec();
    for v in items.iter().rev() {
        let text = interp.syntax_of(v);
        interp.stdout.extend_from_slice(text.as_bytes());
        interp.stdout.push(b'\n');
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps, reason = "operator signature")]
pub(super) const fn flush(_interp: &mut Interpreter) -> InterpResult<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// The file being executed: the topmost executable file on the execution
/// stack, or a closed file if there is none.
pub(super) fn currentfile(interp: &mut Interpreter) -> InterpResult<()> {
    let current = interp
        .estack
        .as_slice()
        .iter()
        .rev()
        .find(|v| v.executable && matches!(v.object, Object::File(_)))
        .cloned();
    let v = match current {
        Some(v) => v.cvlit(),
        None => {
            let id = interp.files.open("%nofile", Vec::new());
            interp.files.close(id)?;
            file_value(id, Access::READ_ONLY)
        }
    };
    interp.push(v);
    Ok(())
}

pub(super) fn closefile(interp: &mut Interpreter) -> InterpResult<()> {
    let f = interp.pop()?.to_file()?;
    interp.files.close(f)
}

pub(super) fn read(interp: &mut Interpreter) -> InterpResult<()> {
    let f = pop_input(interp)?;
    match interp.files.get_mut(f)?.read_byte() {
        Some(b) => {
            interp.push(Value::int(i64::from(b)));
            interp.push(Value::boolean(true));
        }
        None => {
            interp.files.close(f)?;
            interp.push(Value::boolean(false));
        }
    }
    Ok(())
}

/// Pop `file string`, checking the string is writable.
fn pop_file_and_buffer(interp: &mut Interpreter) -> InterpResult<(FileId, Value, usize)> {
    let target = interp.pop()?;
    let s = target.to_ps_string()?;
    target.check_access(false, false, true)?;
    let f = pop_input(interp)?;
    Ok((f, target, s.len))
}

/// Push the filled prefix of `target` and the completion flag.
fn push_filled(interp: &mut Interpreter, target: &Value, bytes: &[u8], full: bool) -> InterpResult<()> {
    let prefix = interp.fill_string(target, bytes)?;
    interp.push(prefix);
    interp.push(Value::boolean(full));
    Ok(())
}

pub(super) fn readstring(interp: &mut Interpreter) -> InterpResult<()> {
    let (f, target, len) = pop_file_and_buffer(interp)?;
    if len == 0 {
        return Err(rangecheck("readstring into an empty string"));
    }
    let entry = interp.files.get_mut(f)?;
    let mut bytes = Vec::with_capacity(len);
    while bytes.len() < len {
        match entry.read_byte() {
            Some(b) => bytes.push(b),
            None => break,
        }
    }
    let full = bytes.len() == len;
    push_filled(interp, &target, &bytes, full)
}

/// Read up to an end-of-line (`\n`, `\r` or `\r\n`), which is consumed but
/// not stored.
pub(super) fn readline(interp: &mut Interpreter) -> InterpResult<()> {
    let (f, target, len) = pop_file_and_buffer(interp)?;
    let entry = interp.files.get_mut(f)?;
    let mut bytes = Vec::new();
    let mut terminated = false;
    while let Some(b) = entry.read_byte() {
        match b {
            b'\n' => {
                terminated = true;
                break;
            }
            b'\r' => {
                if entry.read_byte().is_some_and(|next| next != b'\n') {
                    entry.unread();
                }
                terminated = true;
                break;
            }
            _ if bytes.len() == len => {
                return Err(rangecheck("line longer than the string"));
            }
            _ => bytes.push(b),
        }
    }
    push_filled(interp, &target, &bytes, terminated)
}

/// Read hex digit pairs, skipping anything that is not a hex digit.
pub(super) fn readhexstring(interp: &mut Interpreter) -> InterpResult<()> {
    let (f, target, len) = pop_file_and_buffer(interp)?;
    let entry = interp.files.get_mut(f)?;
    let mut bytes = Vec::with_capacity(len);
    let mut high: Option<u8> = None;
    while bytes.len() < len {
        let Some(b) = entry.read_byte() else {
            break;
        };
        let Some(nibble) = hex_value(b) else {
            continue;
        };
        match high.take() {
            Some(h) => bytes.push((h << 4) | nibble),
            None => high = Some(nibble),
        }
    }
    let full = bytes.len() == len;
    push_filled(interp, &target, &bytes, full)
}

pub(super) fn bytesavailable(interp: &mut Interpreter) -> InterpResult<()> {
    let f = interp.pop()?.to_file()?;
    let entry = interp.files.get(f)?;
    let n = if entry.open && !entry.is_writable() {
        i64::try_from(entry.remaining().len()).map_err(|_| rangecheck("file too large"))?
    } else {
        -1
    };
    interp.push(Value::int(n));
    Ok(())
}

/// On an input file, discard the rest of the input.
pub(super) fn flushfile(interp: &mut Interpreter) -> InterpResult<()> {
    let f = interp.pop()?.to_file()?;
    if !interp.files.get(f)?.is_writable() {
        let entry = interp.files.get_mut(f)?;
        while entry.read_byte().is_some() {}
        interp.files.close(f)?;
    }
    Ok(())
}

/// `name access file`. Only the standard streams and files known to the
/// filesystem can be opened, and the latter only for reading.
pub(super) fn file(interp: &mut Interpreter) -> InterpResult<()> {
    let mode = interp.pop_bytes()?;
    let name_bytes = interp.pop_bytes()?;
    let name = String::from_utf8_lossy(&name_bytes).into_owned();
    let reading = match mode.first() {
        Some(b'r') => true,
        Some(b'w' | b'a') => false,
        _ => return Err(InterpreterError::new(ErrorKind::InvalidFileAccess, "bad access mode")),
    };
    let v = match (name.as_str(), reading) {
        ("%stdin" | "%lineedit" | "%statementedit", true) => {
            file_value(FileTable::STDIN, Access::READ_ONLY)
        }
        ("%stdout", false) => file_value(FileTable::STDOUT, Access::UNLIMITED),
        ("%stderr", false) => file_value(FileTable::STDERR, Access::UNLIMITED),
        (_, false) => {
            return Err(InterpreterError::new(
                ErrorKind::InvalidFileAccess,
                format!("cannot write {name}"),
            ));
        }
        (_, true) => {
            let data = interp
                .fs
                .read_file(&name)
                .ok_or_else(|| undefined_filename(&name))?;
            tracing::debug!(file = %name, bytes = data.len(), "file opened");
            let id = interp.files.open(&name, data);
            file_value(id, Access::READ_ONLY)
        }
    };
    interp.push(v);
    Ok(())
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// The decode filter called `name`, popping the extra operands
/// `SubFileDecode` takes.
fn filter_named(interp: &mut Interpreter, name: &str) -> InterpResult<Filter> {
    match name {
        "ASCIIHexDecode" => Ok(Filter::AsciiHex),
        "ASCII85Decode" => Ok(Filter::Ascii85),
        "RunLengthDecode" => Ok(Filter::RunLength),
        "SubFileDecode" => {
            let eod = interp.pop_bytes()?;
            let count = usize::try_from(interp.pop_int()?)
                .map_err(|_| rangecheck("negative EODCount"))?;
            Ok(Filter::SubFile { count, eod })
        }
        "FlateDecode" | "LZWDecode" | "DCTDecode" | "CCITTFaxDecode" | "ReusableStreamDecode"
        | "NullEncode" | "ASCIIHexEncode" | "ASCII85Encode" | "RunLengthEncode"
        | "FlateEncode" | "LZWEncode" | "DCTEncode" | "CCITTFaxEncode" => {
            Err(unregistered(format!("{name} filter")))
        }
        _ => Err(InterpreterError::new(
            ErrorKind::Undefined,
            format!("no filter named {name}"),
        )),
    }
}

/// Run `filter` over its data source. A file is read only up to the end
/// of the encoded data. A procedure is called until it returns an empty
/// string or the filter has seen its end of data.
fn decode_source(
    interp: &mut Interpreter,
    source: &Value,
    filter: &Filter,
) -> InterpResult<Vec<u8>> {
    match &source.object {
        Object::File(id) => {
            if interp.files.get(*id)?.is_writable() {
                return Err(invalidaccess("filter source is not open for reading"));
            }
            let file = interp.files.get_mut(*id)?;
            let decoded = filter.decode(file.remaining())?;
            let pos = file.position();
            file.set_position(pos + decoded.consumed);
            Ok(decoded.data)
        }
        Object::String(_) => {
            let bytes = interp.text_bytes(source)?;
            Ok(filter.decode(&bytes)?.data)
        }
        Object::Array(_) if source.executable => {
            let mut input = Vec::new();
            loop {
                interp.run_object(source.clone())?;
                let chunk = interp.pop()?;
                if !matches!(chunk.object, Object::String(_)) {
                    return Err(typecheck(format!(
                        "filter procedure returned {}",
                        chunk.type_name()
                    )));
                }
                let bytes = interp.text_bytes(&chunk)?;
                if bytes.is_empty() {
                    break;
                }
                input.extend_from_slice(&bytes);
                if filter.decode(&input)?.finished {
                    break;
                }
            }
            Ok(filter.decode(&input)?.data)
        }
        _ => Err(typecheck(format!(
            "filter source is {}",
            source.type_name()
        ))),
    }
}

/// `source [dict] /name filter file`. The source is decoded at once and
/// the result read back through a read-only file.
pub(super) fn filter(interp: &mut Interpreter) -> InterpResult<()> {
    let name = interp.pop()?;
    let name = name.to_name()?.text().into_owned();
    let filter = filter_named(interp, &name)?;
    if matches!(interp.ostack.peek(0)?.object, Object::Dict(_)) {
        interp.pop()?;
    }
    let source = interp.pop()?;
    let data = decode_source(interp, &source, &filter)?;
    tracing::debug!(filter = %name, bytes = data.len(), "filter decoded");
    let id = interp.files.open(&format!("%{name}"), data);
    interp.push(file_value(id, Access::READ_ONLY));
    Ok(())
}

/// Execute the contents of a named file.
pub(super) fn run(interp: &mut Interpreter) -> InterpResult<()> {
    let name_bytes = interp.pop_bytes()?;
    let name = String::from_utf8_lossy(&name_bytes).into_owned();
    let data = interp
        .fs
        .read_file(&name)
        .ok_or_else(|| undefined_filename(&name))?;
    tracing::debug!(file = %name, bytes = data.len(), "run");
    let id = interp.files.open(&name, data);
    interp.estack.push(file_value(id, Access::READ_ONLY).cvx())
}

pub(super) fn write(interp: &mut Interpreter) -> InterpResult<()> {
    let byte = interp.pop_int()?;
    let f = pop_output(interp)?;
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "low byte")]
    let b = (byte & 0xFF) as u8;
    write_to(interp, f, &[b])
}

pub(super) fn writestring(interp: &mut Interpreter) -> InterpResult<()> {
    let bytes = interp.pop_bytes()?;
    let f = pop_output(interp)?;
    write_to(interp, f, &bytes)
}

/// On a file: whether it is open. On a name: `pages bytes referenced
/// created true` if the filesystem knows it, `false` otherwise.
pub(super) fn status(interp: &mut Interpreter) -> InterpResult<()> {
    let v = interp.pop()?;
    match v.object {
        Object::File(f) => {
            let open = interp.files.get(f)?.open;
            interp.push(Value::boolean(open));
        }
        Object::String(_) => {
            let name = String::from_utf8_lossy(&interp.text_bytes(&v)?).into_owned();
            match interp.fs.read_file(&name) {
                Some(data) => {
                    let bytes = i64::try_from(data.len()).map_err(|_| rangecheck("file too large"))?;
                    interp.push(Value::int((bytes + 1023) / 1024));
                    interp.push(Value::int(bytes));
                    interp.push(Value::int(0));
                    interp.push(Value::int(0));
                    interp.push(Value::boolean(true));
                }
                None => interp.push(Value::boolean(false)),
            }
        }
        _ => return Err(typecheck(format!("status of {}", v.type_name()))),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::interpreter::Interpreter;

    fn all_true(source: &str) {
        let mut interp = Interpreter::new();
        interp.run(source).unwrap();
        let stack = interp.operand_stack();
        assert!(!stack.is_empty(), "{source}: empty operand stack");
        assert!(
            stack.iter().all(|v| v.to_bool().unwrap_or(false)),
            "{source}: {} operands",
            stack.len()
        );
    }

    fn error_name(source: &str) -> Vec<u8> {
        let mut interp = Interpreter::new();
        interp.run(source).unwrap();
        let stack = interp.operand_stack();
        interp.text_of(&stack[stack.len() - 1])
    }

    #[test]
    fn filter_over_currentfile_resumes_after_the_data() {
        all_true(
            "currentfile /ASCIIHexDecode filter\n48656c6c6f>\n\
             5 string readstring exch (Hello) eq 1 1 eq",
        );
    }

    #[test]
    fn ascii85_filter_over_a_string() {
        all_true(
            "(87cURD]i,\"Ebo80~>) /ASCII85Decode filter \
             dup 12 string readstring pop (Hello World!) eq exch read not",
        );
    }

    #[test]
    fn run_length_and_subfile_filters() {
        all_true(
            "<02616263fe7880> /RunLengthDecode filter \
             10 string readstring not exch (abcxxx) eq",
        );
        all_true("(a%%b%%c) 1 (%%) /SubFileDecode filter 10 string readstring pop (a%%b) eq");
        all_true("(41>) << >> /ASCIIHexDecode filter read pop 65 eq");
    }

    #[test]
    fn filter_calls_a_procedure_source_until_end_of_data() {
        all_true(
            "/n 0 def {/n n 1 add def n 1 eq {(48 65>)} {(ff)} ifelse} \
             /ASCIIHexDecode filter 4 string readstring not exch (He) eq n 1 eq",
        );
    }

    #[test]
    fn unknown_and_unsupported_filters() {
        assert_eq!(
            error_name("{(x) /NoSuchDecode filter} stopped $error /errorname get"),
            b"undefined"
        );
        assert_eq!(
            error_name("{(x) /FlateDecode filter} stopped $error /errorname get"),
            b"unregistered"
        );
        assert_eq!(
            error_name("{(4x>) /ASCIIHexDecode filter} stopped $error /errorname get"),
            b"ioerror"
        );
    }

    #[test]
    fn readhexstring_skips_non_hex_characters() {
        all_true("(4 8-6\n5) 0 () /SubFileDecode filter 2 string readhexstring pop (He) eq");
    }
}
