//! Typed arrays backed by owned element buffers.
//!
//! [`Array`] is a contiguous, row-major buffer of `T::Native` elements plus a shape. The element
//! interpretation is controlled by an [`ArrayDataType`].
//!
//! The extractor uses an `Array` as the page buffer of a transfer: it is allocated zeroed for the
//! page's count vector, filled through [`Array::as_bytes_mut`] by a container read and handed to a
//! container write through [`Array::as_bytes`]. Because the storage is a `Vec<T::Native>`, the
//! buffer is always aligned for `T::Native` and is released when the array is dropped.
use smallvec::SmallVec;

use crate::{
    dtype::DataType,
    variable::array::{
        datatype::ArrayDataType,
        error::ArrayValidationError,
        util::{num_bytes, num_elements},
    },
};

pub mod datatype;
pub mod error;
pub mod util;

pub use datatype::Char;

/// A typed array backed by a contiguous element buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Array<T: ArrayDataType> {
    data: Vec<T::Native>,
    shape: SmallVec<[usize; 4]>,
}

impl<T: ArrayDataType> Array<T> {
    /// Allocate a zero-filled array for `shape`.
    ///
    /// # Errors
    /// Returns [`ArrayValidationError::ShapeOverflow`] if the element count or byte size of
    /// `shape` overflows `usize`.
    pub fn zeroed(shape: &[usize]) -> Result<Self, ArrayValidationError> {
        let n = num_elements(shape)?;
        num_bytes(shape, T::BYTE_WIDTH)?;
        Ok(Self {
            data: vec![T::Native::default(); n],
            shape: SmallVec::from_slice(shape),
        })
    }

    /// Construct an array from elements in row-major order.
    ///
    /// # Errors
    /// Returns [`ArrayValidationError`] if `data.len()` does not match the element count implied
    /// by `shape`, or if that count overflows.
    pub fn try_from_shape_and_vec(
        shape: &[usize],
        data: Vec<T::Native>,
    ) -> Result<Self, ArrayValidationError> {
        let expected = num_elements(shape)?;
        if data.len() != expected {
            return Err(ArrayValidationError::WrongElementCount {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            shape: SmallVec::from_slice(shape),
        })
    }

    /// Raw bytes of the elements.
    pub fn as_bytes(&self) -> &[u8] {
        T::as_bytes(&self.data)
    }

    /// Mutable raw bytes of the elements.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        T::as_bytes_mut(&mut self.data)
    }

    /// Elements in row-major order.
    pub fn as_slice(&self) -> &[T::Native] {
        &self.data
    }

    /// Return the logical shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size of the element buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len() * T::BYTE_WIDTH
    }

    /// Return the logical datatype of this array.
    pub const fn data_type(&self) -> DataType {
        T::TYPE
    }
}
