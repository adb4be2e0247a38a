//! The interpreter's four stacks.
//!
//! - [`OperandStack`]: data. Supports a cheap checkpoint/rollback so the run
//!   loop can undo a failed operator without copying the whole stack.
//! - [`DictStack`]: the name-lookup scope chain, anchored by three permanent
//!   dictionaries.
//! - [`ExecStack`]: pending executable objects.
//! - [`ContStack`]: state of suspended loops, one [`ContFrame`] per loop.

use std::collections::VecDeque;

use epsvg_graphics::path::Section;

use crate::error::{ErrorKind, InterpResult, InterpreterError};
use crate::types::{DictRef, Value};

// ---------------------------------------------------------------------------
// Operand stack
// ---------------------------------------------------------------------------

fn underflow() -> InterpreterError {
    InterpreterError::new(ErrorKind::StackUnderflow, "operand stack is empty")
}

/// The operand stack.
///
/// Between [`checkpoint`](Self::checkpoint) and
/// [`rollback`](Self::rollback) every value popped from below the
/// checkpoint height is journaled, so rollback restores the exact prior
/// contents. All mutation goes through `push`/`pop`, which keeps the
/// journal complete.
#[derive(Debug, Default)]
pub struct OperandStack {
    items: Vec<Value>,
    /// Lowest height reached since the checkpoint.
    low: usize,
    /// Values popped from below the checkpoint, most recent last.
    journal: Vec<Value>,
}

impl OperandStack {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            low: 0,
            journal: Vec::new(),
        }
    }

    pub fn push(&mut self, v: Value) {
        self.items.push(v);
    }

    pub fn pop(&mut self) -> InterpResult<Value> {
        let v = self.items.pop().ok_or_else(underflow)?;
        let idx = self.items.len();
        if idx < self.low {
            self.journal.push(v.clone());
            self.low = idx;
        }
        Ok(v)
    }

    /// Pop `n` values, returned bottom-first.
    pub fn pop_n(&mut self, n: usize) -> InterpResult<Vec<Value>> {
        if n > self.items.len() {
            return Err(underflow());
        }
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.pop()?);
        }
        out.reverse();
        Ok(out)
    }

    /// The value `depth` entries below the top (0 = top).
    pub fn peek(&self, depth: usize) -> InterpResult<&Value> {
        self.items
            .len()
            .checked_sub(depth + 1)
            .and_then(|i| self.items.get(i))
            .ok_or_else(underflow)
    }

    /// Fail with `stackunderflow` unless at least `n` values are present.
    pub fn require(&self, n: usize) -> InterpResult<()> {
        if self.items.len() < n {
            return Err(underflow());
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pop everything.
    pub fn clear(&mut self) {
        while self.pop().is_ok() {}
    }

    /// Number of values above the topmost mark.
    pub fn count_to_mark(&self) -> InterpResult<usize> {
        self.items
            .iter()
            .rev()
            .position(Value::is_mark)
            .ok_or_else(|| InterpreterError::new(ErrorKind::UnmatchedMark, "no mark on stack"))
    }

    /// All values, bottom first.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    /// Start a new undo window at the current height.
    pub fn checkpoint(&mut self) {
        self.low = self.items.len();
        self.journal.clear();
    }

    /// Restore the contents at the last checkpoint.
    pub fn rollback(&mut self) {
        self.items.truncate(self.low);
        while let Some(v) = self.journal.pop() {
            self.items.push(v);
        }
        self.low = self.items.len();
    }
}

// ---------------------------------------------------------------------------
// Dictionary stack
// ---------------------------------------------------------------------------

/// Number of dictionaries that can never be popped: systemdict, globaldict
/// and userdict.
pub const PERMANENT_DICTS: usize = 3;

#[derive(Debug)]
pub struct DictStack {
    dicts: Vec<DictRef>,
    limit: usize,
}

impl DictStack {
    /// A stack holding the permanent dictionaries, bottom first.
    #[must_use]
    pub fn new(permanent: [DictRef; PERMANENT_DICTS], limit: usize) -> Self {
        Self {
            dicts: permanent.to_vec(),
            limit,
        }
    }

    pub fn push(&mut self, d: DictRef) -> InterpResult<()> {
        if self.dicts.len() >= self.limit {
            return Err(InterpreterError::new(
                ErrorKind::DictStackOverflow,
                format!("more than {} dictionaries", self.limit),
            ));
        }
        self.dicts.push(d);
        Ok(())
    }

    /// Pop the top dictionary. The permanent ones stay.
    pub fn pop(&mut self) -> InterpResult<DictRef> {
        if self.dicts.len() <= PERMANENT_DICTS {
            return Err(InterpreterError::new(
                ErrorKind::DictStackUnderflow,
                "only permanent dictionaries remain",
            ));
        }
        self.dicts
            .pop()
            .ok_or_else(|| InterpreterError::internal("dictionary stack lost its base"))
    }

    /// The current dictionary.
    pub fn top(&self) -> InterpResult<DictRef> {
        self.dicts
            .last()
            .copied()
            .ok_or_else(|| InterpreterError::internal("dictionary stack lost its base"))
    }

    /// Drop everything above the permanent dictionaries.
    pub fn clear(&mut self) {
        self.dicts.truncate(PERMANENT_DICTS);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dicts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dicts.is_empty()
    }

    /// Dictionaries bottom first.
    #[must_use]
    pub fn as_slice(&self) -> &[DictRef] {
        &self.dicts
    }

    pub const fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }
}

// ---------------------------------------------------------------------------
// Execution stack
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ExecStack {
    items: Vec<Value>,
    limit: usize,
}

impl ExecStack {
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            limit,
        }
    }

    pub fn push(&mut self, v: Value) -> InterpResult<()> {
        if self.items.len() >= self.limit {
            return Err(InterpreterError::new(
                ErrorKind::ExecStackOverflow,
                format!("execution nested deeper than {}", self.limit),
            ));
        }
        self.items.push(v);
        Ok(())
    }

    /// Push ignoring the depth limit. Used for error handlers, which must
    /// run even when the overflow is what they report.
    pub fn force_push(&mut self, v: Value) {
        self.items.push(v);
    }

    /// Pop the top entry; `None` means there is nothing left to run.
    pub fn pop(&mut self) -> Option<Value> {
        self.items.pop()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Entries bottom first.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    pub const fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }
}

// ---------------------------------------------------------------------------
// Continuation stack
// ---------------------------------------------------------------------------

/// Counter of a `for` loop. Stays integral when all three operands are.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForCounter {
    Integer { current: i64, increment: i64, limit: i64 },
    Real { current: f64, increment: f64, limit: f64 },
}

impl ForCounter {
    /// The value to hand to the body, or `None` once the limit is passed.
    #[must_use]
    pub fn value(&self) -> Option<Value> {
        match *self {
            Self::Integer {
                current,
                increment,
                limit,
            } => {
                let go = (increment >= 0 && current <= limit) || (increment < 0 && current >= limit);
                go.then(|| Value::int(current))
            }
            Self::Real {
                current,
                increment,
                limit,
            } => {
                let go = (increment >= 0.0 && current <= limit)
                    || (increment < 0.0 && current >= limit);
                go.then(|| Value::real(current))
            }
        }
    }

    /// The counter after one step, or `None` if an integer counter would
    /// overflow (which also ends the loop).
    #[must_use]
    pub fn advanced(self) -> Option<Self> {
        match self {
            Self::Integer {
                current,
                increment,
                limit,
            } => current.checked_add(increment).map(|current| Self::Integer {
                current,
                increment,
                limit,
            }),
            Self::Real {
                current,
                increment,
                limit,
            } => Some(Self::Real {
                current: current + increment,
                increment,
                limit,
            }),
        }
    }
}

/// State of one suspended control construct.
#[derive(Debug, Clone)]
pub enum ContFrame {
    For { counter: ForCounter, proc: Value },
    /// `forall` over any composite: `per_step` values are handed to the
    /// procedure on each iteration.
    Forall {
        per_step: usize,
        items: VecDeque<Value>,
        proc: Value,
    },
    Loop { proc: Value },
    Repeat { remaining: i64, proc: Value },
    /// `pathforall`: sections already in user space; procs are
    /// moveto, lineto, curveto, closepath.
    PathForall {
        sections: VecDeque<Section>,
        procs: [Value; 4],
    },
    /// `kshow`: characters still to show.
    Kshow {
        proc: Value,
        remaining: VecDeque<u8>,
        /// Previously shown character; `None` before the first.
        previous: Option<u8>,
        /// The procedure ran for the next character; show it now.
        pending: bool,
    },
    /// `cshow`: characters still to hand to the procedure.
    Cshow { proc: Value, remaining: VecDeque<u8> },
    /// A `stopped` context boundary.
    Stopped,
}

fn outside_construct(op: &str) -> InterpreterError {
    InterpreterError::new(ErrorKind::InvalidExit, format!("{op} outside of its construct"))
}

/// Suspended-loop state. Every looping or `stopped` operator on the
/// execution stack owns exactly one frame here.
#[derive(Debug, Default)]
pub struct ContStack {
    frames: Vec<ContFrame>,
}

impl ContStack {
    #[must_use]
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: ContFrame) {
        self.frames.push(frame);
    }

    /// Pop the current frame.
    pub fn pop(&mut self) -> InterpResult<ContFrame> {
        self.frames.pop().ok_or_else(|| outside_construct("continuation"))
    }

    /// Pop the frame owned by continuation operator `op`. `extract` hands
    /// back frames of another construct, which stay on the stack; running
    /// `op` outside its own loop is then an `invalidexit`, not a crash.
    pub fn take<T>(
        &mut self,
        op: &str,
        extract: impl FnOnce(ContFrame) -> Result<T, ContFrame>,
    ) -> InterpResult<T> {
        let frame = self.frames.pop().ok_or_else(|| outside_construct(op))?;
        extract(frame).map_err(|frame| {
            self.frames.push(frame);
            outside_construct(op)
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::types::{Handle, Object};

    fn ints(stack: &OperandStack) -> Vec<i64> {
        stack.as_slice().iter().map(|v| v.to_int().unwrap()).collect()
    }

    #[test]
    fn pop_on_empty_is_underflow() {
        let mut s = OperandStack::new();
        assert_eq!(s.pop().unwrap_err().kind, ErrorKind::StackUnderflow);
        assert_eq!(s.peek(0).unwrap_err().kind, ErrorKind::StackUnderflow);
    }

    #[test]
    fn rollback_restores_popped_values() {
        let mut s = OperandStack::new();
        for i in 1..=4 {
            s.push(Value::int(i));
        }
        s.checkpoint();
        s.pop().unwrap();
        s.pop().unwrap();
        s.push(Value::int(10));
        s.pop().unwrap();
        s.pop().unwrap();
        s.push(Value::int(20));
        s.rollback();
        assert_eq!(ints(&s), [1, 2, 3, 4]);
    }

    #[test]
    fn rollback_drops_pushed_values() {
        let mut s = OperandStack::new();
        s.push(Value::int(1));
        s.checkpoint();
        s.push(Value::int(2));
        s.push(Value::int(3));
        s.rollback();
        assert_eq!(ints(&s), [1]);
    }

    #[test]
    fn pop_n_is_bottom_first_and_atomic() {
        let mut s = OperandStack::new();
        s.push(Value::int(1));
        s.push(Value::int(2));
        assert!(s.pop_n(3).is_err());
        assert_eq!(s.len(), 2);
        let v = s.pop_n(2).unwrap();
        assert_eq!(v[0].to_int().unwrap(), 1);
    }

    #[test]
    fn count_to_mark() {
        let mut s = OperandStack::new();
        s.push(Value::mark());
        s.push(Value::int(1));
        s.push(Value::int(2));
        assert_eq!(s.count_to_mark().unwrap(), 2);
        s.clear();
        assert_eq!(s.count_to_mark().unwrap_err().kind, ErrorKind::UnmatchedMark);
    }

    fn dict(id: u64) -> DictRef {
        DictRef {
            handle: Handle { id, global: false },
        }
    }

    #[test]
    fn permanent_dicts_cannot_be_popped() {
        let mut ds = DictStack::new([dict(1), dict(2), dict(3)], 10);
        ds.push(dict(4)).unwrap();
        assert_eq!(ds.pop().unwrap(), dict(4));
        assert_eq!(ds.pop().unwrap_err().kind, ErrorKind::DictStackUnderflow);
        assert_eq!(ds.len(), PERMANENT_DICTS);
    }

    #[test]
    fn dict_stack_limit() {
        let mut ds = DictStack::new([dict(1), dict(2), dict(3)], 4);
        ds.push(dict(4)).unwrap();
        assert_eq!(ds.push(dict(5)).unwrap_err().kind, ErrorKind::DictStackOverflow);
    }

    #[test]
    fn exec_stack_limit() {
        let mut es = ExecStack::new(1);
        es.push(Value::null()).unwrap();
        let err = es.push(Value::null()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExecStackOverflow);
        assert!(es.pop().is_some());
        assert!(es.pop().is_none());
    }

    #[test]
    fn integer_for_counter() {
        let c = ForCounter::Integer {
            current: 1,
            increment: 2,
            limit: 4,
        };
        assert!(matches!(c.value().unwrap().object, Object::Integer(1)));
        let c = c.advanced().unwrap();
        assert!(matches!(c.value().unwrap().object, Object::Integer(3)));
        assert!(c.advanced().unwrap().value().is_none());
    }

    #[test]
    fn descending_real_counter() {
        let c = ForCounter::Real {
            current: 1.0,
            increment: -0.5,
            limit: 0.0,
        };
        let values: Vec<f64> = std::iter::successors(Some(c), |c| c.advanced())
            .map_while(|c| c.value())
            .map(|v| v.to_real().unwrap())
            .collect();
        assert_eq!(values, [1.0, 0.5, 0.0]);
    }

    #[test]
    fn integer_counter_overflow_ends_loop() {
        let c = ForCounter::Integer {
            current: i64::MAX,
            increment: 1,
            limit: i64::MAX,
        };
        assert!(c.value().is_some());
        assert!(c.advanced().is_none());
    }

    #[test]
    fn cont_stack_pop_on_empty_is_invalidexit() {
        let mut cs = ContStack::new();
        let err = cs.pop().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidExit);
        assert!(!err.is_fatal());
        cs.push(ContFrame::Stopped);
        assert_eq!(cs.len(), 1);
    }

    #[test]
    fn take_leaves_foreign_frames_alone() {
        let mut cs = ContStack::new();
        cs.push(ContFrame::Stopped);
        let err = cs
            .take("@loop", |f| match f {
                ContFrame::Loop { proc } => Ok(proc),
                other => Err(other),
            })
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidExit);
        assert_eq!(cs.len(), 1);
        assert!(
            cs.take("@stopped", |f| match f {
                ContFrame::Stopped => Ok(()),
                other => Err(other),
            })
            .is_ok()
        );
        assert!(cs.is_empty());
    }
}
