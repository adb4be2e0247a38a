//! The PostScript interpreter.
//!
//! Execution is a single loop over the execution stack. Each step takes
//! the next token from the top entry: one element of a procedure, one
//! scanned token of an executable string or file, or a whole name or
//! operator. Loops never recurse natively. A looping operator parks its
//! state on the continuation stack and re-arms an internal continuation
//! operator on the execution stack, so `exit` and `stop` are plain stack
//! unwinding.
//!
//! # Errors
//!
//! A PostScript error raised while executing a token rolls the operand
//! stack back to its state before the token, pushes the offending object
//! and runs the matching `errordict` procedure. Only
//! [`ErrorKind::Internal`] errors escape [`Interpreter::start`].

mod display;
pub(crate) mod helpers;
mod init;

#[cfg(test)]
mod tests;

use std::time::Instant;

use epsvg_graphics::bbox::BoundingBox;
use epsvg_graphics::device::OutputDevice;
use epsvg_graphics::picture::Picture;

use crate::dict::DictKey;
use crate::dsc::{DscHeader, postscript_section};
use crate::error::{ErrorKind, InterpResult, InterpreterError};
use crate::file::FileTable;
use crate::filesystem::FileSystem;
use crate::gstate::GstateStack;
use crate::options::Options;
use crate::resources::ResourceManager;
use crate::scanner::Scanner;
use crate::stacks::{ContStack, DictStack, ExecStack, OperandStack};
use crate::text::TextHandler;
use crate::token::{Token, TokenKind};
use crate::types::{Access, Name, Object, SaveId, Value};
use crate::vm::{Snapshot, Vm};

pub(crate) use init::FixedDicts;

/// State captured by `save`.
#[derive(Debug)]
pub(crate) struct SaveRecord {
    pub id: SaveId,
    pub snapshot: Snapshot,
    pub gstate_depth: usize,
    pub packing: bool,
    pub global_mode: bool,
}

/// A failed token fetch: the error and the object being read.
type FetchError = (InterpreterError, Value);

// ---------------------------------------------------------------------------
// Interpreter state
// ---------------------------------------------------------------------------

/// The PostScript interpreter.
pub struct Interpreter {
    pub(crate) options: Options,
    pub(crate) vm: Vm,
    pub(crate) ostack: OperandStack,
    pub(crate) dstack: DictStack,
    pub(crate) estack: ExecStack,
    pub(crate) cstack: ContStack,
    pub(crate) gstates: GstateStack,
    /// Device 0 records the output; device 1 is the null device.
    pub(crate) devices: Vec<Box<dyn OutputDevice>>,
    pub(crate) saves: Vec<SaveRecord>,
    pub(crate) next_save: u64,
    pub(crate) files: FileTable,
    pub(crate) fs: Box<dyn FileSystem>,
    pub(crate) text: Box<dyn TextHandler>,
    pub(crate) resources: ResourceManager,
    pub(crate) dicts: FixedDicts,
    pub(crate) standard_encoding: Value,
    /// Whether new procedures are packed.
    pub(crate) packing: bool,
    pub(crate) rng_state: u32,
    pub(crate) started: Instant,
    pub(crate) page: BoundingBox,
    /// Set by `quit`.
    pub(crate) quit: bool,
    pub(crate) stdout: Vec<u8>,
    pub(crate) stderr: Vec<u8>,
    pub(crate) last_error: Option<InterpreterError>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create an interpreter with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    /// Create an interpreter.
    ///
    /// # Panics
    ///
    /// Never in practice: building the initial dictionaries only fails if
    /// `options.max_vm_objects` is too small to hold them, in which case
    /// the limit is raised to fit.
    #[must_use]
    pub fn with_options(options: Options) -> Self {
        init::build(options)
    }

    /// Set the filesystem used by `run` and `file`.
    pub fn set_filesystem(&mut self, fs: Box<dyn FileSystem>) {
        self.fs = fs;
    }

    /// Replace the text handler.
    pub fn set_text_handler(&mut self, text: Box<dyn TextHandler>) {
        self.text = text;
    }

    // =======================================================================
    // Driver API
    // =======================================================================

    /// Run a complete program given as text.
    pub fn run(&mut self, source: &str) -> InterpResult<()> {
        self.run_bytes(source.as_bytes())
    }

    /// Run a complete program: scan the DSC header for the page box, then
    /// execute the input as a file.
    pub fn run_bytes(&mut self, source: &[u8]) -> InterpResult<()> {
        let source = postscript_section(source).ok_or_else(|| {
            InterpreterError::new(ErrorKind::IoError, "truncated DOS EPS binary")
        })?;
        let header = DscHeader::scan(source);
        let page = self
            .options
            .bounding_box
            .or(header.bounding_box)
            .unwrap_or(BoundingBox::A4);
        tracing::info!(
            title = header.title.as_deref().unwrap_or(""),
            min_x = page.min_x,
            min_y = page.min_y,
            max_x = page.max_x,
            max_y = page.max_y,
            "page box"
        );
        self.set_page(page)?;
        let file = self.files.open(&self.options.job_name, source.to_vec());
        let mut value = Value::executable(Object::File(file));
        value.access = Access::READ_ONLY;
        self.estack.push(value)?;
        self.start()
    }

    /// Drain the execution stack, report an unhandled error, and close the
    /// output.
    pub fn start(&mut self) -> InterpResult<()> {
        self.drain(0)?;
        if self.error_pending()? {
            let handler = self
                .error_dict()
                .and_then(|d| Ok(self.vm.dict(d)?.get_name("handleerror").cloned()))?;
            match handler {
                Some(h) => {
                    self.estack.force_push(h);
                    self.drain(0)?;
                }
                None => crate::operators::control::report_error(self)?,
            }
        }
        self.quit = false;
        let page_device = &mut self.devices[0];
        page_device.finish()?;
        Ok(())
    }

    /// Execute `value` and run until it has finished. Used for callbacks
    /// into PostScript from the host.
    pub fn run_object(&mut self, value: Value) -> InterpResult<()> {
        let floor = self.estack.len();
        self.estack
            .push(Value::operator(&crate::operators::control::EXEC_MARKER))?;
        self.estack.push(value)?;
        self.drain(floor)
    }

    // -- accessors --

    /// The operand stack, bottom first.
    #[must_use]
    pub fn operand_stack(&self) -> &[Value] {
        self.ostack.as_slice()
    }

    /// Bytes written to `%stdout`.
    #[must_use]
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Bytes written to `%stderr`.
    #[must_use]
    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    /// Pages recorded by the output device.
    #[must_use]
    pub fn pictures(&self) -> &[Picture] {
        self.devices[0].output()
    }

    /// The last error reported by `handleerror`.
    #[must_use]
    pub const fn last_error(&self) -> Option<&InterpreterError> {
        self.last_error.as_ref()
    }

    /// The virtual memory, for inspecting values.
    #[must_use]
    pub const fn vm(&self) -> &Vm {
        &self.vm
    }

    /// The page box in effect.
    #[must_use]
    pub const fn page(&self) -> BoundingBox {
        self.page
    }

    fn set_page(&mut self, page: BoundingBox) -> InterpResult<()> {
        self.page = page;
        for device in &mut self.devices {
            device.init(&page)?;
        }
        let matrix = self.devices[0].default_matrix();
        let gfx = &mut self.gstates.current.gfx;
        gfx.page = page;
        gfx.init_graphics(matrix);
        Ok(())
    }

    // =======================================================================
    // Main loop
    // =======================================================================

    /// Run until the execution stack is back down to `floor` entries.
    pub(crate) fn drain(&mut self, floor: usize) -> InterpResult<()> {
        while self.estack.len() > floor && !self.quit {
            self.ostack.checkpoint();
            let token = match self.next_token(floor) {
                Ok(Some(token)) => token,
                Ok(None) => break,
                Err((err, source)) => {
                    self.recover(err, source)?;
                    continue;
                }
            };
            if let Err(err) = self.execute(token.clone()) {
                self.recover(err, token)?;
            } else if self.ostack.len() > self.options.max_op_stack {
                let err = InterpreterError::new(
                    ErrorKind::StackOverflow,
                    format!("more than {} operands", self.options.max_op_stack),
                );
                self.recover(err, token)?;
            }
        }
        Ok(())
    }

    /// Take the next token from the top of the execution stack.
    fn next_token(&mut self, floor: usize) -> Result<Option<Value>, FetchError> {
        while self.estack.len() > floor {
            let Some(top) = self.estack.pop() else {
                break;
            };
            if !top.executable {
                return Ok(Some(top));
            }
            match top.object {
                Object::Array(a) => {
                    if a.len == 0 {
                        continue;
                    }
                    let first = match self.vm.array(a) {
                        Ok(items) => items[0].clone(),
                        Err(e) => return Err((e, top)),
                    };
                    if a.len > 1 {
                        self.estack.force_push(Value {
                            object: Object::Array(a.slice(1, a.len - 1)),
                            ..top
                        });
                    }
                    return Ok(Some(first));
                }
                Object::String(s) => {
                    let scanned = self.vm.string(s).and_then(|bytes| {
                        let mut scanner = Scanner::new(bytes);
                        let token = scanner.next_token()?;
                        Ok((token, scanner.position()))
                    });
                    let (token, pos) = scanned.map_err(|e| (e, top.clone()))?;
                    let Some(token) = token else {
                        continue;
                    };
                    if pos < s.len {
                        self.estack.force_push(Value {
                            object: Object::String(s.slice(pos, s.len - pos)),
                            ..top.clone()
                        });
                    }
                    return self.token_value(token).map(Some).map_err(|e| (e, top));
                }
                Object::File(f) => {
                    let scanned = self.files.get(f).and_then(|entry| {
                        let (buf, pos) = entry.buffer();
                        if !entry.open {
                            return Ok((None, pos));
                        }
                        let mut scanner = Scanner::at(buf, pos);
                        let token = scanner.next_token()?;
                        Ok((token, scanner.position()))
                    });
                    let (token, pos) = scanned.map_err(|e| (e, top.clone()))?;
                    let Some(token) = token else {
                        if let Err(e) = self.files.close(f) {
                            tracing::debug!(error = %e, "closing exhausted input file");
                        }
                        continue;
                    };
                    if let Ok(entry) = self.files.get_mut(f) {
                        entry.set_position(pos);
                    }
                    self.estack.force_push(top.clone());
                    return self.token_value(token).map(Some).map_err(|e| (e, top));
                }
                _ => return Ok(Some(top)),
            }
        }
        Ok(None)
    }

    /// Turn a scanned token into a value, allocating strings and
    /// procedures in the current VM.
    pub(crate) fn token_value(&mut self, token: Token) -> InterpResult<Value> {
        Ok(match token.kind {
            TokenKind::Integer(i) => Value::int(i),
            TokenKind::Real(r) => Value::real(r),
            TokenKind::String(bytes) => Value::literal(Object::String(self.vm.new_string(bytes)?)),
            TokenKind::Name(n) => Value::executable(Object::Name(Name::from_bytes(&n))),
            TokenKind::LiteralName(n) => Value::literal(Object::Name(Name::from_bytes(&n))),
            TokenKind::ImmediateName(n) => {
                let name = Name::from_bytes(&n);
                self.lookup(&DictKey::Name(name.clone()))?.ok_or_else(|| {
                    InterpreterError::new(ErrorKind::Undefined, format!("//{name}"))
                })?
            }
            TokenKind::Procedure(tokens) => {
                let values = tokens
                    .into_iter()
                    .map(|t| self.token_value(t))
                    .collect::<InterpResult<Vec<_>>>()?;
                let mut array = self.vm.new_array(values)?;
                array.packed = self.packing;
                let mut v = Value::executable(Object::Array(array));
                if self.packing {
                    v.access = Access::READ_ONLY;
                }
                v
            }
        })
    }

    /// Execute a token taken directly from a procedure, string or file.
    ///
    /// Executable arrays met this way are data: they are pushed, not run.
    pub(crate) fn execute(&mut self, value: Value) -> InterpResult<()> {
        if !value.executable {
            self.ostack.push(value);
            return Ok(());
        }
        match &value.object {
            Object::Name(name) => {
                let found = self.lookup_name(name)?;
                self.execute_indirect(found)
            }
            Object::Operator(def) => self.call_operator(def),
            Object::String(_) | Object::File(_) => self.estack.push(value),
            Object::Null => Ok(()),
            _ => {
                self.ostack.push(value);
                Ok(())
            }
        }
    }

    /// Execute a value reached through a name lookup or `exec`: procedures
    /// run.
    pub(crate) fn execute_indirect(&mut self, value: Value) -> InterpResult<()> {
        if !value.executable {
            self.ostack.push(value);
            return Ok(());
        }
        match &value.object {
            Object::Array(_) | Object::String(_) => {
                value.check_access(true, false, false)?;
                self.estack.push(value)
            }
            Object::File(_) | Object::Name(_) => self.estack.push(value),
            Object::Operator(def) => self.call_operator(def),
            Object::Null => Ok(()),
            _ => {
                self.ostack.push(value);
                Ok(())
            }
        }
    }

    fn call_operator(&mut self, def: &'static crate::operators::OperatorDef) -> InterpResult<()> {
        tracing::trace!(op = def.name, depth = self.ostack.len(), "execute");
        (def.func)(self)
    }

    // =======================================================================
    // Error recovery
    // =======================================================================

    /// Redirect a PostScript error to its `errordict` handler.
    fn recover(&mut self, err: InterpreterError, offending: Value) -> InterpResult<()> {
        if err.is_fatal() {
            tracing::error!(error = %err, "fatal interpreter error");
            return Err(err);
        }
        let name = err.kind.name();
        tracing::debug!(error = name, message = %err.message, "redirecting to errordict");
        self.ostack.rollback();
        if err.kind == ErrorKind::StackOverflow {
            // The handler needs room to run.
            tracing::debug!(depth = self.ostack.len(), "clearing full operand stack");
            self.ostack.clear();
        }
        self.ostack.push(offending);
        let handler = self.error_dict().and_then(|d| {
            Ok(self
                .vm
                .dict(d)?
                .get_name(name)
                .filter(|h| h.executable)
                .cloned())
        });
        if let Ok(Some(handler)) = handler {
            self.estack.force_push(handler);
            return Ok(());
        }
        // errordict is damaged: run the default handler body inline.
        let errorproc = crate::operators::lookup(".errorproc");
        let stop = crate::operators::lookup("stop");
        let (Some(errorproc), Some(stop)) = (errorproc, stop) else {
            return Err(InterpreterError::internal("error operators are not registered"));
        };
        self.ostack.push(Value::name(name));
        self.estack.force_push(Value::operator(stop));
        self.estack.force_push(Value::operator(errorproc));
        Ok(())
    }

    /// The `errordict` in scope, falling back to the built-in one.
    pub(crate) fn error_dict(&self) -> InterpResult<crate::types::DictRef> {
        match self.lookup(&DictKey::name("errordict"))? {
            Some(v) => v.to_dict(),
            None => Ok(self.dicts.errordict),
        }
    }

    /// The `$error` dictionary in scope, falling back to the built-in one.
    pub(crate) fn dollar_error(&self) -> InterpResult<crate::types::DictRef> {
        match self.lookup(&DictKey::name("$error"))? {
            Some(v) => v.to_dict(),
            None => Ok(self.dicts.dollar_error),
        }
    }

    /// `$error /newerror`.
    pub(crate) fn error_pending(&self) -> InterpResult<bool> {
        let d = self.dollar_error()?;
        Ok(self
            .vm
            .dict(d)?
            .get_name("newerror")
            .is_some_and(|v| matches!(v.object, Object::Boolean(true))))
    }

    pub(crate) fn set_error_pending(&mut self, pending: bool) -> InterpResult<()> {
        let d = self.dollar_error()?;
        self.vm
            .dict_mut(d)?
            .insert_name("newerror", Value::boolean(pending));
        Ok(())
    }
}
