//! Positioned IO primitives.
//!
//! This module provides a small, random-access IO abstraction ([`IOProvider`]) used by
//! [`crate::container::Container`] to read and write variable extents and the header of a
//! container file.
//!
//! **Backends**
//! - [`AtlasStdFile`]: a `std::fs::File` using `std::os::unix::fs::FileExt` positioned IO.
//! - [`MemIOProvider`]: a growable in-memory byte vector (tests, scratch containers).
//!
//! **Semantics**
//! - `read_exact_at(buf, offset)` fills all of `buf` or fails with `UnexpectedEof`.
//! - `write_all_at(buf, offset)` writes all of `buf` or fails with `WriteZero`.
//! - `grow(len)` makes the backing store at least `len` bytes long. New bytes read as zero.
//!
//! All calls block until the underlying storage completes them.
use std::os::unix::fs::FileExt;
use std::path::Path;
use std::sync::Arc;

/// Abstraction over random-access reads and writes used by the container.
pub trait IOProvider {
    /// Read exactly `buf.len()` bytes starting at `offset`.
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> std::io::Result<()>;

    /// Write all of `buf` starting at `offset`.
    fn write_all_at(&self, buf: &[u8], offset: u64) -> std::io::Result<()>;

    /// Current size of the backing store in bytes.
    fn file_size(&self) -> std::io::Result<u64>;

    /// Extend the backing store to at least `len` bytes. Never shrinks.
    fn grow(&self, len: u64) -> std::io::Result<()>;

    /// Flush buffered writes to the storage device.
    fn sync(&self) -> std::io::Result<()> {
        Ok(())
    }
}

/// `IOProvider` implementation backed by a `std::fs::File`.
pub struct AtlasStdFile {
    file: std::fs::File,
}

impl AtlasStdFile {
    /// Open an existing file for reading only.
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self { file })
    }

    /// Create a file for reading and writing, truncating any existing content.
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self { file })
    }
}

impl IOProvider for AtlasStdFile {
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
        let mut read_total = 0usize;
        while read_total < buf.len() {
            let n = self
                .file
                .read_at(&mut buf[read_total..], offset + read_total as u64)?;
            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "short read",
                ));
            }
            read_total += n;
        }
        Ok(())
    }

    fn write_all_at(&self, buf: &[u8], offset: u64) -> std::io::Result<()> {
        let mut written_total = 0usize;
        while written_total < buf.len() {
            let n = self
                .file
                .write_at(&buf[written_total..], offset + written_total as u64)?;
            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "short write",
                ));
            }
            written_total += n;
        }
        Ok(())
    }

    fn file_size(&self) -> std::io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn grow(&self, len: u64) -> std::io::Result<()> {
        if self.file_size()? < len {
            // Sparse extension, the new range reads back as zeros.
            self.file.set_len(len)?;
        }
        Ok(())
    }

    fn sync(&self) -> std::io::Result<()> {
        self.file.sync_data()
    }
}

/// In-memory `IOProvider`.
///
/// Cloning shares the same bytes, so a container written through one clone can be reopened
/// through another.
#[derive(Default, Clone)]
pub struct MemIOProvider {
    data: Arc<parking_lot::RwLock<Vec<u8>>>,
}

impl MemIOProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.read().clone()
    }
}

impl IOProvider for MemIOProvider {
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
        let data = self.data.read();
        let start = usize::try_from(offset).map_err(std::io::Error::other)?;
        let end = start.saturating_add(buf.len());
        if end > data.len() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "short read",
            ));
        }
        buf.copy_from_slice(&data[start..end]);
        Ok(())
    }

    fn write_all_at(&self, buf: &[u8], offset: u64) -> std::io::Result<()> {
        let mut data = self.data.write();
        let start = usize::try_from(offset).map_err(std::io::Error::other)?;
        let end = start.saturating_add(buf.len());
        if end > data.len() {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        Ok(())
    }

    fn file_size(&self) -> std::io::Result<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn grow(&self, len: u64) -> std::io::Result<()> {
        let len = usize::try_from(len).map_err(std::io::Error::other)?;
        let mut data = self.data.write();
        if data.len() < len {
            data.resize(len, 0);
        }
        Ok(())
    }
}
