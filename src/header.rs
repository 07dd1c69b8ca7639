use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{consts, dtype::DataType};

/// Index of a dimension inside the container that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionId(pub u32);

/// Index of a variable inside the container that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(pub u32);

impl DimensionId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl VariableId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The container header, serialized as JSON at the end of the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub format_version: u32,
    /// DimensionId -> DimensionDef
    pub dimensions: Vec<DimensionDef>,
    /// VariableId -> VariableDef
    pub variables: Vec<VariableDef>,
}

impl Header {
    pub fn new_empty() -> Self {
        Self {
            format_version: consts::FORMAT_VERSION,
            dimensions: Vec::new(),
            variables: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDef {
    pub name: CompactString,
    /// Fixed size, or for an unbounded dimension the largest record count written so far.
    pub len: usize,
    pub unbounded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDef {
    pub name: CompactString,
    pub data_type: DataType,
    pub dimensions: SmallVec<[DimensionId; 4]>,
    /// Record runs stored in the file, ordered by `first_record`, non-overlapping.
    pub extents: Vec<Extent>,
}

impl VariableDef {
    /// Number of records backed by storage. Records past this read as zeros.
    pub fn allocated_records(&self) -> usize {
        self.extents.last().map_or(0, Extent::end_record)
    }
}

/// A contiguous run of records of one variable.
///
/// A record is one index along the leading axis (a scalar has exactly one record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    pub first_record: usize,
    pub records: usize,
    /// Absolute file offset of `first_record`.
    pub offset: u64,
}

impl Extent {
    pub const fn end_record(&self) -> usize {
        self.first_record + self.records
    }

    pub const fn contains(&self, record: usize) -> bool {
        record >= self.first_record && record < self.end_record()
    }
}

/// Location of the serialized [`Header`], stored right after the magic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderHandle {
    pub offset: u64,
    pub size: u64,
}

impl HeaderHandle {
    pub fn to_bytes(self) -> [u8; consts::HEADER_HANDLE_LEN] {
        let mut out = [0u8; consts::HEADER_HANDLE_LEN];
        out[..8].copy_from_slice(&self.offset.to_le_bytes());
        out[8..].copy_from_slice(&self.size.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; consts::HEADER_HANDLE_LEN]) -> Self {
        let mut offset = [0u8; 8];
        let mut size = [0u8; 8];
        offset.copy_from_slice(&bytes[..8]);
        size.copy_from_slice(&bytes[8..]);
        Self {
            offset: u64::from_le_bytes(offset),
            size: u64::from_le_bytes(size),
        }
    }

    /// A handle that has never been patched (container not closed).
    pub const fn is_unset(&self) -> bool {
        self.offset == 0 && self.size == 0
    }
}
