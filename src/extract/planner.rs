//! Chunk planner.
//!
//! Partitions a variable's index space into *pages*: hyper-rectangles whose buffer fits the page
//! budget. A variable that fits is copied in one page. Otherwise the largest axis (the first one
//! on ties) is split into runs of `page_extent` indices and every other axis is copied at full
//! length:
//!
//! ```text
//! shape [7] f64, budget 24 bytes  -> page_extent 3
//! pages: start [0] count [3] | start [3] count [3] | start [6] count [1]
//! ```
//!
//! When a single index of the split axis is already larger than the budget, pages hold one index
//! each and exceed the budget. The plan is still produced; it is flagged as oversized and a
//! warning is logged.
use smallvec::{SmallVec, smallvec};

use crate::memory::{MemoryProbe, NoopMemoryProbe};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("page budget must be greater than zero")]
    ZeroBudget,

    #[error("variable of shape {shape:?} with {width}-byte elements overflows the addressable size")]
    SizeOverflow { shape: Vec<usize>, width: usize },
}

/// One hyper-rectangular block of a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub start: SmallVec<[usize; 4]>,
    pub count: SmallVec<[usize; 4]>,
}

impl Page {
    /// Number of elements covered by the page.
    pub fn num_elements(&self) -> usize {
        self.count.iter().product()
    }
}

/// The partitioning of one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    shape: SmallVec<[usize; 4]>,
    total_bytes: u64,
    /// `None` when the variable fits a single page.
    split_axis: Option<usize>,
    page_extent: usize,
    num_pages: usize,
    oversized: bool,
    budget_exceeds_available: bool,
}

impl PagePlan {
    fn single(shape: &[usize], total_bytes: u64) -> Self {
        Self {
            shape: SmallVec::from_slice(shape),
            total_bytes,
            split_axis: None,
            page_extent: shape.first().copied().unwrap_or(1),
            num_pages: 1,
            oversized: false,
            budget_exceeds_available: false,
        }
    }

    pub fn split_axis(&self) -> Option<usize> {
        self.split_axis
    }

    /// Indices of the split axis per page (all but possibly the last page).
    pub fn page_extent(&self) -> usize {
        self.page_extent
    }

    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    /// Whether pages exceed the budget because one split-axis index alone does.
    pub fn is_oversized(&self) -> bool {
        self.oversized
    }

    /// Whether the budget was at least the available memory reported by the probe.
    pub fn budget_exceeds_available(&self) -> bool {
        self.budget_exceeds_available
    }

    /// Byte size of the largest page buffer.
    pub fn max_page_bytes(&self) -> u64 {
        match self.split_axis {
            Some(axis) => {
                let other_bytes = self.total_bytes / self.shape[axis] as u64;
                other_bytes * self.page_extent as u64
            }
            None => self.total_bytes,
        }
    }

    /// Page `index`, or `None` past the last page.
    pub fn page(&self, index: usize) -> Option<Page> {
        if index >= self.num_pages {
            return None;
        }

        let mut start: SmallVec<[usize; 4]> = smallvec![0; self.shape.len()];
        let mut count = self.shape.clone();
        if let Some(axis) = self.split_axis {
            let offset = index * self.page_extent;
            start[axis] = offset;
            count[axis] = self.page_extent.min(self.shape[axis] - offset);
        }
        Some(Page { start, count })
    }

    /// Pages in ascending order, produced on demand.
    pub fn pages(&self) -> Pages<'_> {
        Pages {
            plan: self,
            next: 0,
        }
    }
}

/// Iterator over the pages of a [`PagePlan`].
#[derive(Debug, Clone)]
pub struct Pages<'a> {
    plan: &'a PagePlan,
    next: usize,
}

impl Iterator for Pages<'_> {
    type Item = Page;

    fn next(&mut self) -> Option<Page> {
        let page = self.plan.page(self.next)?;
        self.next += 1;
        Some(page)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.plan.num_pages.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Pages<'_> {}

/// Computes [`PagePlan`]s for a fixed page budget.
#[derive(Debug)]
pub struct ChunkPlanner {
    budget: u64,
    probe: Box<dyn MemoryProbe>,
}

impl ChunkPlanner {
    /// A planner limiting page buffers to `budget` bytes.
    pub fn new(budget: u64) -> Result<Self, PlanError> {
        if budget == 0 {
            return Err(PlanError::ZeroBudget);
        }
        Ok(Self {
            budget,
            probe: Box::new(NoopMemoryProbe),
        })
    }

    /// Consult `probe` for available memory on every plan.
    pub fn with_probe(mut self, probe: Box<dyn MemoryProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Plan the pages of a variable with `shape` and `element_width`-byte elements.
    pub fn plan(&self, shape: &[usize], element_width: usize) -> Result<PagePlan, PlanError> {
        let overflow = || PlanError::SizeOverflow {
            shape: shape.to_vec(),
            width: element_width,
        };
        let total_bytes = shape
            .iter()
            .try_fold(element_width, |acc, &len| acc.checked_mul(len))
            .and_then(|bytes| u64::try_from(bytes).ok())
            .ok_or_else(overflow)?;

        let mut plan = if total_bytes <= self.budget || shape.is_empty() {
            let mut plan = PagePlan::single(shape, total_bytes);
            plan.oversized = total_bytes > self.budget;
            plan
        } else {
            self.split(shape, total_bytes)
        };

        if plan.oversized {
            tracing::warn!(
                budget = self.budget,
                page_bytes = plan.max_page_bytes(),
                "a single index of the split axis exceeds the page budget, pages will be larger than the budget"
            );
        }

        if let Some(available) = self.probe.available_memory() {
            if self.budget >= available {
                tracing::warn!(
                    budget = self.budget,
                    available,
                    "page budget exceeds available memory"
                );
                plan.budget_exceeds_available = true;
            }
        }

        tracing::debug!(
            ?shape,
            split_axis = ?plan.split_axis,
            page_extent = plan.page_extent,
            num_pages = plan.num_pages,
            "planned pages"
        );
        Ok(plan)
    }

    /// `total_bytes > budget` here, so every axis is non-empty.
    fn split(&self, shape: &[usize], total_bytes: u64) -> PagePlan {
        let mut axis = 0;
        for (i, &len) in shape.iter().enumerate() {
            if len > shape[axis] {
                axis = i;
            }
        }
        let axis_len = shape[axis];

        let other_bytes = total_bytes / axis_len as u64;
        let fitting = self.budget / other_bytes;
        // `fitting < axis_len` because the whole variable does not fit.
        let page_extent = usize::try_from(fitting).unwrap_or(axis_len).max(1);

        PagePlan {
            shape: SmallVec::from_slice(shape),
            total_bytes,
            split_axis: Some(axis),
            page_extent,
            num_pages: axis_len.div_ceil(page_extent),
            oversized: other_bytes > self.budget,
            budget_exceeds_available: false,
        }
    }
}
