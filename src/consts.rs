pub const MAGIC_NUMBER: &[u8; 4] = b"ATLS";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the container header layout written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// Container layout:
///     MAGIC_NUMBER | HeaderHandle | variable extents ... | header (JSON)
///
/// The header handle is two little endian u64 values: header offset and header length.
pub const HEADER_HANDLE_LEN: usize = 16;
pub const PAYLOAD_OFFSET_START: u64 = (MAGIC_NUMBER.len() + HEADER_HANDLE_LEN) as u64;

/// Default byte budget of a single page buffer.
pub const DEFAULT_PAGE_BUDGET: u64 = 1_000_000_000;

pub const PAGE_SIZE_ENV: &str = "ATLAS_EXTRACT_PAGE_SIZE";
