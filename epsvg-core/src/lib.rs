//! PostScript-subset object model, virtual memory and interpreter.
//!
//! [`Interpreter`] runs a program and records each page as an
//! [`epsvg_graphics::picture::Picture`].

pub mod dict;
pub mod dsc;
pub mod encoding;
pub mod error;
pub mod file;
pub mod filter;
pub mod filesystem;
pub mod gstate;
pub mod interpreter;
pub mod operators;
pub mod options;
pub mod resources;
pub mod scanner;
pub mod stacks;
pub mod text;
pub mod token;
pub mod types;
pub mod vm;

pub use interpreter::Interpreter;
pub use options::Options;
