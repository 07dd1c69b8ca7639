//! Row-major addressing helpers for hyper-rectangular regions.
//!
//! A region `(start, count)` of a row-major variable is decomposed into *runs*: maximal spans of
//! elements that are contiguous in the variable's linear index space. Trailing axes that the
//! region covers completely are folded into the run, so a region that spans full rows costs one
//! positioned IO call per row block instead of one per element row.
//!
//! ```text
//! shape [4, 5], start [1, 0], count [2, 5]  -> one run:  linear 5..15
//! shape [4, 5], start [1, 1], count [2, 3]  -> two runs: linear 6..9, 11..14
//! ```
use smallvec::{SmallVec, smallvec};

use crate::header::Extent;

/// Row-major element strides for `shape`. Returns `None` on overflow.
pub(crate) fn row_major_strides(shape: &[usize]) -> Option<SmallVec<[usize; 4]>> {
    let mut strides: SmallVec<[usize; 4]> = smallvec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1].checked_mul(shape[axis + 1])?;
    }
    Some(strides)
}

/// Call `f(linear_start, elements)` for every contiguous run of the region, in row-major order.
///
/// `shape[0]` is not consulted, so a region may extend past the current length of the leading
/// axis (used when appending along an unbounded dimension). Callers validate bounds and
/// overflow beforehand. A region with a zero count on any axis produces no runs; a scalar
/// (rank 0) produces one run of one element.
pub(crate) fn for_each_run<E, F>(
    shape: &[usize],
    strides: &[usize],
    start: &[usize],
    count: &[usize],
    mut f: F,
) -> Result<(), E>
where
    F: FnMut(usize, usize) -> Result<(), E>,
{
    let rank = shape.len();
    if rank == 0 {
        return f(0, 1);
    }
    if count.contains(&0) {
        return Ok(());
    }

    // Innermost axis that the region does not fully cover.
    let mut k = rank - 1;
    while k > 0 && start[k] == 0 && count[k] == shape[k] {
        k -= 1;
    }
    let run_elems = count[k] * strides[k];

    let mut index: SmallVec<[usize; 4]> = smallvec![0; k];
    loop {
        let mut linear = start[k] * strides[k];
        for axis in 0..k {
            linear += (start[axis] + index[axis]) * strides[axis];
        }
        f(linear, run_elems)?;

        let mut axis = k;
        loop {
            if axis == 0 {
                return Ok(());
            }
            axis -= 1;
            index[axis] += 1;
            if index[axis] < count[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
}

/// Locate the extent holding `record`.
///
/// `Ok(i)` when `extents[i]` contains it, `Err(i)` with the index of the next extent after
/// `record` otherwise (`extents.len()` if there is none). `extents` must be sorted.
pub(crate) fn find_extent(extents: &[Extent], record: usize) -> Result<usize, usize> {
    let idx = extents.partition_point(|e| e.end_record() <= record);
    match extents.get(idx) {
        Some(extent) if extent.contains(record) => Ok(idx),
        _ => Err(idx),
    }
}
