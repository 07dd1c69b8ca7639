//! In-memory representation of variable data.
//!
//! Variable contents travel between containers as typed [`array::Array`] buffers, one page at a
//! time.

pub mod array;
