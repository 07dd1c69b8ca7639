use crate::variable::array::error::ArrayValidationError;

pub fn num_elements(shape: &[usize]) -> Result<usize, ArrayValidationError> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or(ArrayValidationError::ShapeOverflow)
}

pub fn num_bytes(shape: &[usize], byte_width: usize) -> Result<usize, ArrayValidationError> {
    num_elements(shape)?
        .checked_mul(byte_width)
        .ok_or(ArrayValidationError::ShapeOverflow)
}
