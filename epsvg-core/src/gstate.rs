//! The graphics-state stack.
//!
//! [`GState`] extends the device-independent [`GraphicsState`] with the
//! attributes that are PostScript objects (font, transfer functions,
//! halftone). `gsave` and `save` push copies; entries pushed by `save` are
//! boundaries that `grestore` copies from without popping and `grestoreall`
//! never crosses.

use epsvg_graphics::state::{DeviceId, GraphicsState};

use crate::types::Value;

/// The complete graphics state.
#[derive(Debug, Clone)]
pub struct GState {
    pub gfx: GraphicsState,
    /// Current font dictionary, or null before `setfont`.
    pub font: Value,
    pub transfer: Value,
    pub black_generation: Value,
    pub undercolor_removal: Value,
    pub halftone: Value,
    /// Frequency, angle and spot function of `setscreen`.
    pub screen: [Value; 3],
}

impl GState {
    /// Initial state. The procedure-valued attributes start as `identity`,
    /// an empty executable array supplied by the caller.
    #[must_use]
    pub fn new(gfx: GraphicsState, identity: &Value) -> Self {
        Self {
            gfx,
            font: Value::null(),
            transfer: identity.clone(),
            black_generation: identity.clone(),
            undercolor_removal: identity.clone(),
            halftone: Value::null(),
            screen: [Value::real(60.0), Value::real(45.0), identity.clone()],
        }
    }
}

#[derive(Debug, Clone)]
struct Saved {
    state: GState,
    from_save: bool,
}

/// Current graphics state plus the saved ones.
#[derive(Debug)]
pub struct GstateStack {
    pub current: GState,
    saved: Vec<Saved>,
}

impl GstateStack {
    #[must_use]
    pub const fn new(initial: GState) -> Self {
        Self {
            current: initial,
            saved: Vec::new(),
        }
    }

    /// Push a copy of the current state. Returns the device that should
    /// open a scope.
    pub fn push(&mut self, from_save: bool) -> DeviceId {
        self.saved.push(Saved {
            state: self.current.clone(),
            from_save,
        });
        self.current.gfx.device
    }

    /// Number of saved states.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// `grestore`. Returns the device whose scope closes and whether the
    /// scope must be reopened (the state came from a `save` and stays on
    /// the stack). `None` if nothing is saved.
    pub fn grestore(&mut self) -> Option<(DeviceId, bool)> {
        let top = self.saved.last()?;
        let device = top.state.gfx.device;
        if top.from_save {
            self.current = top.state.clone();
            return Some((device, true));
        }
        let top = self.saved.pop()?;
        self.current = top.state;
        Some((device, false))
    }

    /// `grestoreall`: restore from the bottom-most state above the last
    /// `save` boundary. Returns the devices of the closed scopes, innermost
    /// first, and whether the last one must be reopened.
    pub fn grestore_all(&mut self) -> (Vec<DeviceId>, bool) {
        let mut closed = Vec::new();
        while let Some(top) = self.saved.last() {
            if top.from_save {
                closed.push(top.state.gfx.device);
                self.current = top.state.clone();
                return (closed, true);
            }
            if let Some(top) = self.saved.pop() {
                closed.push(top.state.gfx.device);
                self.current = top.state;
            }
        }
        (closed, false)
    }

    /// `restore`: go back to the state pushed by the `save` that left
    /// `depth` entries below it. Returns the devices of the closed scopes,
    /// innermost first.
    pub fn restore_to(&mut self, depth: usize) -> Vec<DeviceId> {
        let mut closed = Vec::new();
        while self.saved.len() > depth {
            if let Some(top) = self.saved.pop() {
                closed.push(top.state.gfx.device);
                self.current = top.state;
            }
        }
        closed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use epsvg_graphics::bbox::BoundingBox;
    use epsvg_graphics::matrix::Matrix;

    fn stack() -> GstateStack {
        let gfx = GraphicsState::new(Matrix::IDENTITY, BoundingBox::A4, DeviceId(0));
        GstateStack::new(GState::new(gfx, &Value::null()))
    }

    #[test]
    fn grestore_pops_gsave() {
        let mut s = stack();
        s.push(false);
        s.current.gfx.line.width = 5.0;
        assert_eq!(s.grestore(), Some((DeviceId(0), false)));
        assert_eq!(s.current.gfx.line.width, 1.0);
        assert_eq!(s.depth(), 0);
        assert_eq!(s.grestore(), None);
    }

    #[test]
    fn grestore_keeps_save_boundary() {
        let mut s = stack();
        s.push(true);
        s.current.gfx.line.width = 5.0;
        assert_eq!(s.grestore(), Some((DeviceId(0), true)));
        assert_eq!(s.current.gfx.line.width, 1.0);
        assert_eq!(s.depth(), 1);
    }

    #[test]
    fn grestoreall_stops_at_save() {
        let mut s = stack();
        s.current.gfx.line.width = 2.0;
        s.push(true);
        s.current.gfx.line.width = 3.0;
        s.push(false);
        s.push(false);
        s.current.gfx.line.width = 4.0;
        let (closed, reopen) = s.grestore_all();
        assert_eq!(closed.len(), 3);
        assert!(reopen);
        assert_eq!(s.current.gfx.line.width, 2.0);
        assert_eq!(s.depth(), 1);
    }

    #[test]
    fn restore_unwinds_nested_gsaves() {
        let mut s = stack();
        s.push(false);
        let depth = s.depth();
        s.current.gfx.line.width = 2.0;
        s.push(true);
        s.current.gfx.line.width = 3.0;
        s.push(false);
        s.current.gfx.line.width = 4.0;
        assert_eq!(s.restore_to(depth).len(), 2);
        assert_eq!(s.current.gfx.line.width, 2.0);
        assert_eq!(s.depth(), 1);
    }
}
