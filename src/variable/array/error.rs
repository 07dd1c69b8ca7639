use thiserror::Error;

/// Errors returned when building an [`crate::variable::array::Array`] from a shape and data.
#[derive(Debug, Error)]
pub enum ArrayValidationError {
    /// `product(shape)` (or its byte size) overflowed `usize`.
    #[error("shape element count overflow")]
    ShapeOverflow,
    /// The byte buffer length doesn't match the expected size.
    #[error("wrong byte length: expected {expected}, got {actual}")]
    WrongByteLen { expected: usize, actual: usize },
    /// The number of provided elements doesn't match `product(shape)`.
    #[error("wrong element count: expected {expected}, got {actual}")]
    WrongElementCount { expected: usize, actual: usize },
}
