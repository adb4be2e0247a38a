//! Geometry, graphics state and output devices for the `epsvg` interpreter.

pub mod types;

pub mod bbox;
pub mod color;
pub mod device;
pub mod error;
pub mod matrix;
pub mod path;
pub mod picture;
pub mod state;
