//! Single-file array containers.
//!
//! A [`Container`] owns the schema (dimensions and variables) of one container file and performs
//! positioned reads and writes of hyper-rectangular regions of its variables.
//!
//! ## Layout
//!
//! ```text
//! 0         4                  20                                          EOF
//! +---------+------------------+-------------------------------------------+--------+
//! | "ATLS"  | HeaderHandle     | extents (raw row-major element bytes) ... | header |
//! +---------+------------------+-------------------------------------------+--------+
//!                              ^ PAYLOAD_OFFSET_START
//! ```
//!
//! - The [`Header`] is JSON, written at the end of the payload by [`Container::close`]; the
//!   handle right after the magic number points at it.
//! - Every variable stores its data as a list of [`Extent`]s, each a contiguous run of records
//!   (indices along the leading axis) at a file offset.
//! - A fixed-size variable receives one extent covering all of its records when it is created.
//!   A variable whose leading dimension is unbounded receives new extents as writes extend the
//!   record range; the dimension's length is the largest record count written so far.
//! - Records without storage read back as zeros.
//!
//! ## Handles
//! Dimensions and variables are addressed by [`DimensionId`] / [`VariableId`], plain indices into
//! the container's header. They are never freed individually and are only meaningful for the
//! container that returned them.
use std::path::Path;

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::{
    consts,
    dtype::DataType,
    header::{DimensionDef, DimensionId, Extent, Header, HeaderHandle, VariableDef, VariableId},
    io::{AtlasStdFile, IOProvider},
    variable::array::{Array, datatype::ArrayDataType},
};

pub mod error;
mod layout;

pub use error::ContainerError;

pub type ContainerResult<T> = Result<T, ContainerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

pub struct Container {
    io: Box<dyn IOProvider + Send + Sync>,
    mode: AccessMode,
    header: Header,
    /// First free payload byte; new extents are reserved from here.
    file_offset: u64,
    dirty: bool,
    closed: bool,
}

/// Addressing information for one variable, derived from its current shape.
struct VariableLayout {
    shape: SmallVec<[usize; 4]>,
    strides: SmallVec<[usize; 4]>,
    width: usize,
    /// Elements per record (product of all but the leading axis).
    record_elems: usize,
    leading_unbounded: bool,
}

impl VariableLayout {
    fn record_bytes(&self) -> usize {
        self.record_elems * self.width
    }
}

impl Container {
    /// Open an existing container file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> ContainerResult<Self> {
        let io = AtlasStdFile::open(path)?;
        Self::load(io, AccessMode::ReadOnly)
    }

    /// Create a new container file, replacing any existing file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> ContainerResult<Self> {
        let io = AtlasStdFile::create(path)?;
        Self::create_with_provider(io)
    }

    /// Initialize an empty container on `io`.
    pub fn create_with_provider<I>(io: I) -> ContainerResult<Self>
    where
        I: IOProvider + Send + Sync + 'static,
    {
        io.write_all_at(consts::MAGIC_NUMBER, 0)?;
        io.write_all_at(
            &HeaderHandle::default().to_bytes(),
            consts::MAGIC_NUMBER.len() as u64,
        )?;

        Ok(Self {
            io: Box::new(io),
            mode: AccessMode::ReadWrite,
            header: Header::new_empty(),
            file_offset: consts::PAYLOAD_OFFSET_START,
            dirty: true,
            closed: false,
        })
    }

    /// Load an existing container from `io`.
    pub fn load<I>(io: I, mode: AccessMode) -> ContainerResult<Self>
    where
        I: IOProvider + Send + Sync + 'static,
    {
        let mut prefix = [0u8; consts::PAYLOAD_OFFSET_START as usize];
        match io.read_exact_at(&mut prefix, 0) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(ContainerError::InvalidMagic);
            }
            Err(e) => return Err(e.into()),
        }
        let (magic, handle_bytes) = prefix.split_at(consts::MAGIC_NUMBER.len());
        if magic != consts::MAGIC_NUMBER {
            return Err(ContainerError::InvalidMagic);
        }
        let mut handle_buf = [0u8; consts::HEADER_HANDLE_LEN];
        handle_buf.copy_from_slice(handle_bytes);
        let handle = HeaderHandle::from_bytes(&handle_buf);
        if handle.is_unset() {
            return Err(ContainerError::MissingHeader);
        }

        let header_len = usize::try_from(handle.size)
            .map_err(|_| ContainerError::CorruptHeader("header size out of range".into()))?;
        let mut header_bytes = vec![0u8; header_len];
        io.read_exact_at(&mut header_bytes, handle.offset)?;
        let header: Header = simd_json::serde::from_slice(&mut header_bytes)?;
        if header.format_version != consts::FORMAT_VERSION {
            return Err(ContainerError::UnsupportedVersion(header.format_version));
        }

        let mut container = Self {
            io: Box::new(io),
            mode,
            header,
            file_offset: consts::PAYLOAD_OFFSET_START,
            dirty: false,
            closed: false,
        };
        container.file_offset = container.validate_header()?;
        Ok(container)
    }

    /// Check the references and extents of a freshly loaded header.
    ///
    /// Returns the end of the payload (first byte after the last extent).
    fn validate_header(&self) -> ContainerResult<u64> {
        let mut payload_end = consts::PAYLOAD_OFFSET_START;
        for (index, var) in self.header.variables.iter().enumerate() {
            for dim in &var.dimensions {
                if dim.index() >= self.header.dimensions.len() {
                    return Err(ContainerError::CorruptHeader(format!(
                        "variable '{}' references missing dimension {}",
                        var.name, dim.0
                    )));
                }
            }
            let layout = self.layout(VariableId(index as u32))?;
            let mut previous_end = 0usize;
            for extent in &var.extents {
                if extent.first_record < previous_end {
                    return Err(ContainerError::CorruptHeader(format!(
                        "variable '{}' has overlapping extents",
                        var.name
                    )));
                }
                previous_end = extent.end_record();
                let end = extent
                    .records
                    .checked_mul(layout.record_bytes())
                    .and_then(|bytes| extent.offset.checked_add(bytes as u64))
                    .ok_or_else(|| ContainerError::SizeOverflow {
                        variable: var.name.clone(),
                    })?;
                payload_end = payload_end.max(end);
            }
        }
        Ok(payload_end)
    }

    pub fn access_mode(&self) -> AccessMode {
        self.mode
    }

    /* ---------------- Schema queries ---------------- */

    pub fn dimensions(&self) -> impl Iterator<Item = (DimensionId, &DimensionDef)> + '_ {
        self.header
            .dimensions
            .iter()
            .enumerate()
            .map(|(i, d)| (DimensionId(i as u32), d))
    }

    pub fn variables(&self) -> impl Iterator<Item = (VariableId, &VariableDef)> + '_ {
        self.header
            .variables
            .iter()
            .enumerate()
            .map(|(i, v)| (VariableId(i as u32), v))
    }

    pub fn dimension(&self, id: DimensionId) -> ContainerResult<&DimensionDef> {
        self.header
            .dimensions
            .get(id.index())
            .ok_or(ContainerError::UnknownDimension(id.0))
    }

    pub fn variable(&self, id: VariableId) -> ContainerResult<&VariableDef> {
        self.header
            .variables
            .get(id.index())
            .ok_or(ContainerError::UnknownVariable(id.0))
    }

    pub fn find_dimension(&self, name: &str) -> Option<DimensionId> {
        self.header
            .dimensions
            .iter()
            .position(|d| d.name == name)
            .map(|i| DimensionId(i as u32))
    }

    pub fn find_variable(&self, name: &str) -> Option<VariableId> {
        self.header
            .variables
            .iter()
            .position(|v| v.name == name)
            .map(|i| VariableId(i as u32))
    }

    /// Current shape of a variable (unbounded axes report their current length).
    pub fn variable_shape(&self, id: VariableId) -> ContainerResult<SmallVec<[usize; 4]>> {
        let var = self.variable(id)?;
        var.dimensions
            .iter()
            .map(|&dim| self.dimension(dim).map(|d| d.len))
            .collect()
    }

    fn layout(&self, id: VariableId) -> ContainerResult<VariableLayout> {
        let var = self.variable(id)?;
        let shape = self.variable_shape(id)?;
        let overflow = || ContainerError::SizeOverflow {
            variable: var.name.clone(),
        };

        let strides = layout::row_major_strides(&shape).ok_or_else(overflow)?;
        let width = var.data_type.byte_width();
        let record_elems = match shape.len() {
            0 => 1,
            _ => strides[0],
        };
        record_elems.checked_mul(width).ok_or_else(overflow)?;

        let leading_unbounded = match var.dimensions.first() {
            Some(&dim) => self.dimension(dim)?.unbounded,
            None => false,
        };

        Ok(VariableLayout {
            shape,
            strides,
            width,
            record_elems,
            leading_unbounded,
        })
    }

    /* ---------------- Schema mutation ---------------- */

    fn ensure_writable(&self) -> ContainerResult<()> {
        match self.mode {
            AccessMode::ReadWrite => Ok(()),
            AccessMode::ReadOnly => Err(ContainerError::ReadOnly),
        }
    }

    /// Add a dimension of fixed size `len`.
    pub fn add_dimension(&mut self, name: &str, len: usize) -> ContainerResult<DimensionId> {
        self.push_dimension(name, len, false)
    }

    /// Add an unbounded (appendable) dimension. Its length starts at zero.
    pub fn add_unbounded_dimension(&mut self, name: &str) -> ContainerResult<DimensionId> {
        self.push_dimension(name, 0, true)
    }

    fn push_dimension(
        &mut self,
        name: &str,
        len: usize,
        unbounded: bool,
    ) -> ContainerResult<DimensionId> {
        self.ensure_writable()?;
        if self.find_dimension(name).is_some() {
            return Err(ContainerError::DuplicateDimension(name.into()));
        }

        let id = DimensionId(self.header.dimensions.len() as u32);
        self.header.dimensions.push(DimensionDef {
            name: CompactString::from(name),
            len,
            unbounded,
        });
        self.dirty = true;
        Ok(id)
    }

    /// Add a variable over `dimensions` (outermost first).
    ///
    /// Storage for a fixed-size variable is reserved immediately and reads as zeros until
    /// written. An unbounded dimension may only appear as the leading dimension.
    pub fn add_variable(
        &mut self,
        name: &str,
        data_type: DataType,
        dimensions: &[DimensionId],
    ) -> ContainerResult<VariableId> {
        self.ensure_writable()?;
        if self.find_variable(name).is_some() {
            return Err(ContainerError::DuplicateVariable(name.into()));
        }
        for (axis, &dim) in dimensions.iter().enumerate() {
            let def = self.dimension(dim)?;
            if def.unbounded && axis != 0 {
                return Err(ContainerError::UnboundedNotLeading {
                    variable: name.into(),
                    dimension: def.name.clone(),
                });
            }
        }

        let id = VariableId(self.header.variables.len() as u32);
        self.header.variables.push(VariableDef {
            name: CompactString::from(name),
            data_type,
            dimensions: SmallVec::from_slice(dimensions),
            extents: Vec::new(),
        });
        self.dirty = true;

        let reserved = self.layout(id).and_then(|layout| {
            if layout.leading_unbounded {
                return Ok(());
            }
            let records = layout.shape.first().copied().unwrap_or(1);
            self.ensure_records(id, &layout, records)
        });
        if let Err(e) = reserved {
            self.header.variables.pop();
            return Err(e);
        }

        tracing::debug!(variable = name, %data_type, rank = dimensions.len(), "added variable");
        Ok(id)
    }

    /* ---------------- Storage ---------------- */

    /// Reserve `bytes` of zeroed payload and return its offset.
    fn reserve(&mut self, bytes: u64) -> ContainerResult<u64> {
        let offset = self.file_offset;
        let end = offset.checked_add(bytes).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::FileTooLarge, "container too large")
        })?;

        // A previously flushed header may sit at the old end of the payload.
        let current = self.io.file_size()?;
        if current > offset {
            let stale = usize::try_from(current.min(end) - offset)
                .map_err(std::io::Error::other)?;
            self.io.write_all_at(&vec![0u8; stale], offset)?;
        }
        self.io.grow(end)?;
        self.file_offset = end;
        Ok(offset)
    }

    /// Make sure storage exists for all records below `end_record`.
    fn ensure_records(
        &mut self,
        id: VariableId,
        layout: &VariableLayout,
        end_record: usize,
    ) -> ContainerResult<()> {
        let record_bytes = layout.record_bytes();
        let allocated = self.variable(id)?.allocated_records();
        if end_record <= allocated || record_bytes == 0 {
            return Ok(());
        }

        let records = end_record - allocated;
        let bytes = records
            .checked_mul(record_bytes)
            .ok_or_else(|| ContainerError::SizeOverflow {
                variable: self.header.variables[id.index()].name.clone(),
            })?;
        let offset = self.reserve(bytes as u64)?;

        let var = &mut self.header.variables[id.index()];
        var.extents.push(Extent {
            first_record: allocated,
            records,
            offset,
        });
        tracing::trace!(
            variable = %var.name,
            first_record = allocated,
            records,
            offset,
            "reserved extent"
        );
        Ok(())
    }

    /// Validate a region against the variable and the buffer, returning the layout.
    fn check_region(
        &self,
        id: VariableId,
        start: &[usize],
        count: &[usize],
        buf_len: usize,
        appending: bool,
    ) -> ContainerResult<VariableLayout> {
        let layout = self.layout(id)?;
        let var = self.variable(id)?;
        let rank = layout.shape.len();
        for actual in [start.len(), count.len()] {
            if actual != rank {
                return Err(ContainerError::RankMismatch {
                    variable: var.name.clone(),
                    expected: rank,
                    actual,
                });
            }
        }

        let overflow = || ContainerError::SizeOverflow {
            variable: var.name.clone(),
        };
        for axis in 0..rank {
            let end = start[axis].checked_add(count[axis]).ok_or_else(overflow)?;
            let growable = appending && axis == 0 && layout.leading_unbounded;
            if end > layout.shape[axis] && !growable {
                return Err(ContainerError::RegionOutOfBounds {
                    variable: var.name.clone(),
                    axis,
                    start: start[axis],
                    count: count[axis],
                    len: layout.shape[axis],
                });
            }
        }
        if rank > 0 {
            // Keeps every linear byte offset inside the region representable.
            (start[0] + count[0])
                .checked_mul(layout.record_bytes())
                .ok_or_else(overflow)?;
        }

        let expected = count
            .iter()
            .try_fold(layout.width, |acc, &c| acc.checked_mul(c))
            .ok_or_else(overflow)?;
        if buf_len != expected {
            return Err(ContainerError::BufferSizeMismatch {
                expected,
                actual: buf_len,
            });
        }
        Ok(layout)
    }

    /// Read the region `(start, count)` of a variable into `buf` (row-major element bytes).
    ///
    /// `buf.len()` must equal `product(count) * byte_width`.
    pub fn read_region(
        &self,
        id: VariableId,
        start: &[usize],
        count: &[usize],
        buf: &mut [u8],
    ) -> ContainerResult<()> {
        let layout = self.check_region(id, start, count, buf.len(), false)?;
        let var = self.variable(id)?;

        let mut cursor = 0usize;
        layout::for_each_run(
            &layout.shape,
            &layout.strides,
            start,
            count,
            |linear, elems| {
                let len = elems * layout.width;
                self.read_span(var, &layout, linear, &mut buf[cursor..cursor + len])?;
                cursor += len;
                Ok::<(), ContainerError>(())
            },
        )
    }

    /// Write `buf` (row-major element bytes) to the region `(start, count)` of a variable.
    ///
    /// For a variable whose leading dimension is unbounded the region may extend past the
    /// dimension's current length, which grows the dimension.
    pub fn write_region(
        &mut self,
        id: VariableId,
        start: &[usize],
        count: &[usize],
        buf: &[u8],
    ) -> ContainerResult<()> {
        self.ensure_writable()?;
        let layout = self.check_region(id, start, count, buf.len(), true)?;

        // Records along the leading axis count even when the trailing axes are empty.
        if layout.leading_unbounded && count[0] > 0 {
            let end_record = start[0] + count[0];
            self.ensure_records(id, &layout, end_record)?;
            let leading = self.header.variables[id.index()].dimensions[0];
            let dim = &mut self.header.dimensions[leading.index()];
            if end_record > dim.len {
                dim.len = end_record;
                self.dirty = true;
            }
        }
        if buf.is_empty() {
            return Ok(());
        }
        self.dirty = true;

        let var = self.variable(id)?;
        let mut cursor = 0usize;
        layout::for_each_run(
            &layout.shape,
            &layout.strides,
            start,
            count,
            |linear, elems| {
                let len = elems * layout.width;
                self.write_span(var, &layout, linear, &buf[cursor..cursor + len])?;
                cursor += len;
                Ok::<(), ContainerError>(())
            },
        )
    }

    /// Read `out.len() / width` elements starting at linear element index `linear`.
    fn read_span(
        &self,
        var: &VariableDef,
        layout: &VariableLayout,
        mut linear: usize,
        out: &mut [u8],
    ) -> ContainerResult<()> {
        let width = layout.width;
        let record_elems = layout.record_elems;
        let mut done = 0usize;
        while done < out.len() {
            let remaining = (out.len() - done) / width;
            let record = linear / record_elems;
            let within = linear % record_elems;

            let taken = match layout::find_extent(&var.extents, record) {
                Ok(i) => {
                    let extent = &var.extents[i];
                    let available = (extent.end_record() - record) * record_elems - within;
                    let take = remaining.min(available);
                    let offset = extent.offset
                        + (((record - extent.first_record) * record_elems + within) * width)
                            as u64;
                    self.io
                        .read_exact_at(&mut out[done..done + take * width], offset)?;
                    take
                }
                Err(next) => {
                    let available = match var.extents.get(next) {
                        Some(extent) => (extent.first_record - record) * record_elems - within,
                        None => remaining,
                    };
                    let take = remaining.min(available);
                    out[done..done + take * width].fill(0);
                    take
                }
            };

            linear += taken;
            done += taken * width;
        }
        Ok(())
    }

    /// Write `data` starting at linear element index `linear`. Storage must already exist.
    fn write_span(
        &self,
        var: &VariableDef,
        layout: &VariableLayout,
        mut linear: usize,
        data: &[u8],
    ) -> ContainerResult<()> {
        let width = layout.width;
        let record_elems = layout.record_elems;
        let mut done = 0usize;
        while done < data.len() {
            let remaining = (data.len() - done) / width;
            let record = linear / record_elems;
            let within = linear % record_elems;

            let Ok(i) = layout::find_extent(&var.extents, record) else {
                return Err(ContainerError::UnallocatedRecord {
                    variable: var.name.clone(),
                    record,
                });
            };
            let extent = &var.extents[i];
            let available = (extent.end_record() - record) * record_elems - within;
            let take = remaining.min(available);
            let offset = extent.offset
                + (((record - extent.first_record) * record_elems + within) * width) as u64;
            self.io.write_all_at(&data[done..done + take * width], offset)?;

            linear += take;
            done += take * width;
        }
        Ok(())
    }

    /// Read a whole variable as a typed array.
    pub fn read_array<T: ArrayDataType>(&self, id: VariableId) -> ContainerResult<Array<T>> {
        let var = self.variable(id)?;
        if var.data_type != T::TYPE {
            return Err(ContainerError::DataTypeMismatch {
                expected: var.data_type,
                actual: T::TYPE,
            });
        }
        let shape = self.variable_shape(id)?;
        let start: SmallVec<[usize; 4]> = SmallVec::from_elem(0, shape.len());
        let mut array = Array::<T>::zeroed(&shape)?;
        self.read_region(id, &start, &shape, array.as_bytes_mut())?;
        Ok(array)
    }

    /// Write a typed array at `start`. The array's shape is the region's count vector.
    pub fn write_array<T: ArrayDataType>(
        &mut self,
        id: VariableId,
        start: &[usize],
        array: &Array<T>,
    ) -> ContainerResult<()> {
        let var = self.variable(id)?;
        if var.data_type != T::TYPE {
            return Err(ContainerError::DataTypeMismatch {
                expected: var.data_type,
                actual: T::TYPE,
            });
        }
        self.write_region(id, start, array.shape(), array.as_bytes())
    }

    /* ---------------- Lifecycle ---------------- */

    /// Write the header and patch the header handle. No-op for read-only or clean containers.
    pub fn flush(&mut self) -> ContainerResult<()> {
        if self.mode == AccessMode::ReadOnly || !self.dirty {
            return Ok(());
        }

        let header_bytes = simd_json::serde::to_vec(&self.header)?;
        let handle = HeaderHandle {
            offset: self.file_offset,
            size: header_bytes.len() as u64,
        };
        self.io.write_all_at(&header_bytes, handle.offset)?;
        self.io
            .write_all_at(&handle.to_bytes(), consts::MAGIC_NUMBER.len() as u64)?;
        self.io.sync()?;
        self.dirty = false;
        Ok(())
    }

    /// Flush and close the container.
    pub fn close(mut self) -> ContainerResult<()> {
        self.closed = true;
        self.flush()
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if self.closed || self.mode == AccessMode::ReadOnly || !self.dirty {
            return;
        }
        if let Err(e) = self.flush() {
            tracing::error!(error = %e, "failed to flush container on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemIOProvider;

    fn reopen(io: &MemIOProvider) -> Container {
        Container::load(io.clone(), AccessMode::ReadOnly).unwrap()
    }

    #[test]
    fn schema_survives_close_and_reopen() {
        let io = MemIOProvider::new();
        let mut c = Container::create_with_provider(io.clone()).unwrap();
        let time = c.add_unbounded_dimension("time").unwrap();
        let x = c.add_dimension("x", 3).unwrap();
        c.add_variable("temp", DataType::F32, &[time, x]).unwrap();
        c.close().unwrap();

        let c = reopen(&io);
        let (_, time) = c.dimensions().next().unwrap();
        assert_eq!(time.name, "time");
        assert!(time.unbounded);
        let temp = c.find_variable("temp").unwrap();
        assert_eq!(c.variable(temp).unwrap().data_type, DataType::F32);
        assert_eq!(c.variable_shape(temp).unwrap().as_slice(), &[0, 3]);
    }

    #[test]
    fn interior_region_roundtrip() {
        let io = MemIOProvider::new();
        let mut c = Container::create_with_provider(io.clone()).unwrap();
        let y = c.add_dimension("y", 4).unwrap();
        let x = c.add_dimension("x", 5).unwrap();
        let v = c.add_variable("v", DataType::I32, &[y, x]).unwrap();

        let all: Vec<i32> = (0..20).collect();
        let arr = Array::<i32>::try_from_shape_and_vec(&[4, 5], all).unwrap();
        c.write_array(v, &[0, 0], &arr).unwrap();

        let mut block = Array::<i32>::zeroed(&[2, 3]).unwrap();
        c.read_region(v, &[1, 1], &[2, 3], block.as_bytes_mut()).unwrap();
        assert_eq!(block.as_slice(), &[6, 7, 8, 11, 12, 13]);
        c.close().unwrap();

        let c = reopen(&io);
        let got = c.read_array::<i32>(v).unwrap();
        assert_eq!(got.as_slice(), arr.as_slice());
    }

    #[test]
    fn unwritten_fixed_variable_reads_zeros() {
        let mut c = Container::create_with_provider(MemIOProvider::new()).unwrap();
        let x = c.add_dimension("x", 4).unwrap();
        let v = c.add_variable("v", DataType::F64, &[x]).unwrap();
        let part = Array::<f64>::try_from_shape_and_vec(&[1], vec![1.5]).unwrap();
        c.write_array(v, &[2], &part).unwrap();

        let got = c.read_array::<f64>(v).unwrap();
        assert_eq!(got.as_slice(), &[0.0, 0.0, 1.5, 0.0]);
    }

    #[test]
    fn unbounded_dimension_grows_with_writes() {
        let io = MemIOProvider::new();
        let mut c = Container::create_with_provider(io.clone()).unwrap();
        let time = c.add_unbounded_dimension("time").unwrap();
        let x = c.add_dimension("x", 2).unwrap();
        let a = c.add_variable("a", DataType::I16, &[time, x]).unwrap();
        let b = c.add_variable("b", DataType::I16, &[time]).unwrap();

        let first = Array::<i16>::try_from_shape_and_vec(&[2, 2], vec![1, 2, 3, 4]).unwrap();
        c.write_array(a, &[0, 0], &first).unwrap();
        let b0 = Array::<i16>::try_from_shape_and_vec(&[1], vec![9]).unwrap();
        c.write_array(b, &[0], &b0).unwrap();
        let second = Array::<i16>::try_from_shape_and_vec(&[1, 2], vec![5, 6]).unwrap();
        c.write_array(a, &[2, 0], &second).unwrap();

        assert_eq!(c.dimension(time).unwrap().len, 3);
        c.close().unwrap();

        let c = reopen(&io);
        assert_eq!(c.read_array::<i16>(a).unwrap().as_slice(), &[1, 2, 3, 4, 5, 6]);
        // `b` only wrote record 0, the rest of the shared length reads as fill.
        assert_eq!(c.read_array::<i16>(b).unwrap().as_slice(), &[9, 0, 0]);
    }

    #[test]
    fn empty_records_still_grow_unbounded_dimension() {
        let io = MemIOProvider::new();
        let mut c = Container::create_with_provider(io.clone()).unwrap();
        let time = c.add_unbounded_dimension("time").unwrap();
        let empty = c.add_dimension("empty", 0).unwrap();
        let v = c.add_variable("v", DataType::F32, &[time, empty]).unwrap();

        c.write_region(v, &[0, 0], &[4, 0], &[]).unwrap();
        assert_eq!(c.dimension(time).unwrap().len, 4);
        c.close().unwrap();

        let c = reopen(&io);
        assert_eq!(c.variable_shape(v).unwrap().as_slice(), &[4, 0]);
        assert!(c.read_array::<f32>(v).unwrap().is_empty());
    }

    #[test]
    fn reserve_clears_stale_header_bytes() {
        let io = MemIOProvider::new();
        let mut c = Container::create_with_provider(io.clone()).unwrap();
        let x = c.add_dimension("x", 2).unwrap();
        c.add_variable("first", DataType::I32, &[x]).unwrap();
        c.flush().unwrap();

        // The next extent is reserved over the flushed header.
        let second = c.add_variable("second", DataType::I32, &[x]).unwrap();
        assert_eq!(c.read_array::<i32>(second).unwrap().as_slice(), &[0, 0]);
    }

    #[test]
    fn scalar_and_empty_variables() {
        let mut c = Container::create_with_provider(MemIOProvider::new()).unwrap();
        let s = c.add_variable("s", DataType::F64, &[]).unwrap();
        let scalar = Array::<f64>::try_from_shape_and_vec(&[], vec![2.25]).unwrap();
        c.write_array(s, &[], &scalar).unwrap();
        assert_eq!(c.read_array::<f64>(s).unwrap().as_slice(), &[2.25]);

        let empty = c.add_dimension("empty", 0).unwrap();
        let e = c.add_variable("e", DataType::I8, &[empty]).unwrap();
        c.write_region(e, &[0], &[0], &[]).unwrap();
        assert!(c.read_array::<i8>(e).unwrap().is_empty());
    }

    #[test]
    fn region_errors() {
        let mut c = Container::create_with_provider(MemIOProvider::new()).unwrap();
        let x = c.add_dimension("x", 3).unwrap();
        let v = c.add_variable("v", DataType::I8, &[x]).unwrap();

        let err = c.write_region(v, &[0, 0], &[1, 1], &[0]).unwrap_err();
        assert!(matches!(err, ContainerError::RankMismatch { expected: 1, actual: 2, .. }));

        let err = c.write_region(v, &[2], &[2], &[0, 0]).unwrap_err();
        assert!(matches!(err, ContainerError::RegionOutOfBounds { axis: 0, len: 3, .. }));

        let err = c.write_region(v, &[0], &[2], &[0]).unwrap_err();
        assert!(matches!(
            err,
            ContainerError::BufferSizeMismatch {
                expected: 2,
                actual: 1
            }
        ));

        let err = c.read_array::<f32>(v).unwrap_err();
        assert!(matches!(err, ContainerError::DataTypeMismatch { .. }));
    }

    #[test]
    fn schema_errors() {
        let mut c = Container::create_with_provider(MemIOProvider::new()).unwrap();
        let x = c.add_dimension("x", 3).unwrap();
        let time = c.add_unbounded_dimension("time").unwrap();

        let err = c.add_dimension("x", 4).unwrap_err();
        assert!(matches!(err, ContainerError::DuplicateDimension(name) if name == "x"));

        let err = c.add_variable("v", DataType::F32, &[x, time]).unwrap_err();
        assert!(matches!(err, ContainerError::UnboundedNotLeading { .. }));
        assert!(c.find_variable("v").is_none());

        c.add_variable("v", DataType::F32, &[x]).unwrap();
        let err = c.add_variable("v", DataType::F32, &[x]).unwrap_err();
        assert!(matches!(err, ContainerError::DuplicateVariable(_)));

        let err = c.add_variable("w", DataType::F32, &[DimensionId(99)]).unwrap_err();
        assert!(matches!(err, ContainerError::UnknownDimension(99)));
    }

    #[test]
    fn read_only_container_rejects_mutation() {
        let io = MemIOProvider::new();
        let mut c = Container::create_with_provider(io.clone()).unwrap();
        let x = c.add_dimension("x", 1).unwrap();
        let v = c.add_variable("v", DataType::I8, &[x]).unwrap();
        c.close().unwrap();

        let mut c = reopen(&io);
        assert_eq!(c.access_mode(), AccessMode::ReadOnly);
        assert!(matches!(c.add_dimension("y", 1), Err(ContainerError::ReadOnly)));
        assert!(matches!(c.write_region(v, &[0], &[1], &[1]), Err(ContainerError::ReadOnly)));
    }

    #[test]
    fn load_rejects_foreign_and_unclosed_files() {
        let io = MemIOProvider::new();
        io.write_all_at(b"CDF\x01 not an atlas container", 0).unwrap();
        assert!(matches!(
            Container::load(io, AccessMode::ReadOnly),
            Err(ContainerError::InvalidMagic)
        ));

        let io = MemIOProvider::new();
        assert!(matches!(
            Container::load(io, AccessMode::ReadOnly),
            Err(ContainerError::InvalidMagic)
        ));

        let io = MemIOProvider::new();
        let c = Container::create_with_provider(io.clone()).unwrap();
        std::mem::forget(c);
        assert!(matches!(
            Container::load(io, AccessMode::ReadOnly),
            Err(ContainerError::MissingHeader)
        ));
    }

    #[test]
    fn drop_flushes_header() {
        let io = MemIOProvider::new();
        {
            let mut c = Container::create_with_provider(io.clone()).unwrap();
            c.add_dimension("x", 2).unwrap();
        }
        let c = reopen(&io);
        assert!(c.find_dimension("x").is_some());
    }
}
