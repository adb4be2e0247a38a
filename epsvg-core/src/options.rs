//! Interpreter configuration.

use epsvg_graphics::bbox::BoundingBox;

/// Settings fixed when an [`Interpreter`](crate::Interpreter) is built.
#[derive(Debug, Clone)]
pub struct Options {
    /// Page box to use instead of the one in the DSC header.
    pub bounding_box: Option<BoundingBox>,
    /// Initial value of `$error /recordstacks`.
    pub record_stacks: bool,
    /// Value of the `JobName` user parameter.
    pub job_name: String,
    /// Maximum number of live composite objects; more is `VMerror`.
    pub max_vm_objects: usize,
    /// Execution stack depth; more is `execstackoverflow`.
    pub max_exec_stack: usize,
    /// Operand stack depth; more is `stackoverflow`.
    pub max_op_stack: usize,
    /// Dictionary stack depth; more is `dictstackoverflow`.
    pub max_dict_stack: usize,
    /// Bytes readable from `%stdin`.
    pub stdin: Vec<u8>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            bounding_box: None,
            record_stacks: true,
            job_name: "job".into(),
            max_vm_objects: 4_000_000,
            max_exec_stack: 10_000,
            max_op_stack: 100_000,
            max_dict_stack: 1_000,
            stdin: Vec::new(),
        }
    }
}
