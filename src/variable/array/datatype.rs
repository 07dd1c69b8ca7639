//! Array datatype definitions.
//!
//! This module defines [`ArrayDataType`], which ties a logical [`DataType`] to the Rust element
//! type used for in-memory buffers of that kind.
//!
//! ## Core responsibilities
//! - Define the logical [`crate::dtype::DataType`] for the array.
//! - Specify the fixed element width (`BYTE_WIDTH`).
//! - Reinterpret typed element slices as raw bytes for positioned container IO.
//!
//! Only fixed-width, plain-old-data element types implement the trait: every bit pattern of
//! `BYTE_WIDTH` bytes is a valid `Native` value. The trait is sealed to keep it that way.
use crate::dtype::DataType;

mod private {
    pub trait Sealed {}
}

pub trait ArrayDataType: private::Sealed {
    /// The in-memory element type.
    type Native: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static;

    /// The logical datatype for this array.
    const TYPE: DataType;

    /// Fixed byte width of one element.
    const BYTE_WIDTH: usize = std::mem::size_of::<Self::Native>();

    /// View typed elements as their raw bytes.
    fn as_bytes(data: &[Self::Native]) -> &[u8] {
        // Safety: `Native` is plain-old-data without padding, so its bytes are initialized and
        // the span covers exactly `data.len() * BYTE_WIDTH` bytes of the same allocation.
        unsafe {
            std::slice::from_raw_parts(data.as_ptr() as *const u8, std::mem::size_of_val(data))
        }
    }

    /// View typed elements as mutable raw bytes.
    fn as_bytes_mut(data: &mut [Self::Native]) -> &mut [u8] {
        // Safety: as in `as_bytes`; additionally any byte pattern written through the view is a
        // valid `Native` value.
        unsafe {
            std::slice::from_raw_parts_mut(
                data.as_mut_ptr() as *mut u8,
                std::mem::size_of_val(data),
            )
        }
    }
}

macro_rules! impl_array_datatype_numeric {
    ($ty:ty, $dtype:ident) => {
        impl private::Sealed for $ty {}

        impl ArrayDataType for $ty {
            type Native = $ty;
            const TYPE: DataType = DataType::$dtype;
        }
    };
}

/// Marker type for character arrays: one text byte per element.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Char(pub u8);

impl_array_datatype_numeric!(i8, I8);
impl_array_datatype_numeric!(Char, Char);
impl_array_datatype_numeric!(i16, I16);
impl_array_datatype_numeric!(i32, I32);
impl_array_datatype_numeric!(i64, I64);
impl_array_datatype_numeric!(u8, U8);
impl_array_datatype_numeric!(u16, U16);
impl_array_datatype_numeric!(u32, U32);
impl_array_datatype_numeric!(u64, U64);
impl_array_datatype_numeric!(f32, F32);
impl_array_datatype_numeric!(f64, F64);
