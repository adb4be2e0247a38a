use thiserror::Error;

/// Errors returned by graphics operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphicsError {
    /// A path operation needed a current point and there is none.
    #[error("no current point")]
    NoCurrentPoint,
    /// A numeric result is undefined (e.g. inverting a singular matrix).
    #[error("undefined result: {0}")]
    UndefinedResult(&'static str),
    /// A parameter is outside its valid range.
    #[error("range check: {0}")]
    RangeCheck(&'static str),
    /// A device could not complete an operation.
    #[error("device error: {0}")]
    Device(String),
}

/// Convenience alias for graphics results.
pub type GraphicsResult<T> = Result<T, GraphicsError>;
