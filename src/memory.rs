//! Available-memory probes consulted by the chunk planner.

use parking_lot::Mutex;
use sysinfo::System;

/// Reports how much memory the process could still allocate.
///
/// Probing is advisory. A probe that cannot tell returns `None` and planning proceeds with the
/// page budget alone.
pub trait MemoryProbe: std::fmt::Debug {
    /// Available memory in bytes.
    fn available_memory(&self) -> Option<u64>;
}

/// Probe backed by the operating system's memory statistics.
///
/// One `System` is kept for the lifetime of the probe and only its memory figures are refreshed
/// per query.
pub struct SystemMemoryProbe {
    sys: Mutex<System>,
}

impl SystemMemoryProbe {
    pub fn new() -> Self {
        Self {
            sys: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SystemMemoryProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemMemoryProbe").finish_non_exhaustive()
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn available_memory(&self) -> Option<u64> {
        let mut sys = self.sys.lock();
        sys.refresh_memory();

        // Unsupported platforms report zero for everything.
        if sys.total_memory() == 0 {
            return None;
        }
        let available = sys.available_memory();
        tracing::debug!(available, total = sys.total_memory(), "probed system memory");
        Some(available)
    }
}

/// Probe that never reports, for runs that skip the memory check.
#[derive(Debug, Default)]
pub struct NoopMemoryProbe;

impl MemoryProbe for NoopMemoryProbe {
    fn available_memory(&self) -> Option<u64> {
        None
    }
}

/// Probe returning a fixed amount.
#[derive(Debug, Clone, Copy)]
pub struct FixedMemoryProbe(pub u64);

impl MemoryProbe for FixedMemoryProbe {
    fn available_memory(&self) -> Option<u64> {
        Some(self.0)
    }
}
