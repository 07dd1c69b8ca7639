use compact_str::CompactString;
use thiserror::Error;

use crate::{dtype::DataType, variable::array::error::ArrayValidationError};

/// Errors returned by [`crate::container::Container`].
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid container header: {0}")]
    Header(#[from] simd_json::Error),

    #[error(transparent)]
    InvalidArray(#[from] ArrayValidationError),

    #[error("not an atlas container (bad magic number)")]
    InvalidMagic,

    #[error("container has no header (it was not closed after writing)")]
    MissingHeader,

    #[error("unsupported container format version {0}")]
    UnsupportedVersion(u32),

    #[error("corrupt container header: {0}")]
    CorruptHeader(String),

    #[error("container is opened read-only")]
    ReadOnly,

    #[error("dimension '{0}' already exists")]
    DuplicateDimension(CompactString),

    #[error("variable '{0}' already exists")]
    DuplicateVariable(CompactString),

    #[error("unknown dimension id {0}")]
    UnknownDimension(u32),

    #[error("unknown variable id {0}")]
    UnknownVariable(u32),

    #[error("variable '{variable}': unbounded dimension '{dimension}' must be its leading dimension")]
    UnboundedNotLeading {
        variable: CompactString,
        dimension: CompactString,
    },

    #[error("variable '{variable}': region rank {actual} does not match variable rank {expected}")]
    RankMismatch {
        variable: CompactString,
        expected: usize,
        actual: usize,
    },

    #[error(
        "variable '{variable}': region start {start} count {count} exceeds axis {axis} of length {len}"
    )]
    RegionOutOfBounds {
        variable: CompactString,
        axis: usize,
        start: usize,
        count: usize,
        len: usize,
    },

    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("data type mismatch: variable is {expected}, requested {actual}")]
    DataTypeMismatch {
        expected: DataType,
        actual: DataType,
    },

    #[error("variable '{variable}': size overflows the addressable range")]
    SizeOverflow { variable: CompactString },

    #[error("variable '{variable}': record {record} has no storage")]
    UnallocatedRecord {
        variable: CompactString,
        record: usize,
    },
}
