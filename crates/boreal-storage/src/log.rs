//! Log manager handle.
//!
//! The buffer pool references the log manager by identity only; the
//! write-ahead protocol itself lives elsewhere. What this handle provides
//! today is a monotonic source of log sequence numbers.

use std::sync::atomic::{AtomicU64, Ordering};

use boreal_common::types::Lsn;

/// Hands out monotonically increasing log sequence numbers.
#[derive(Debug)]
pub struct LogManager {
    next_lsn: AtomicU64,
}

impl LogManager {
    /// Creates a log manager starting at the first valid LSN.
    pub fn new() -> Self {
        Self {
            next_lsn: AtomicU64::new(Lsn::FIRST.as_u64()),
        }
    }

    /// Returns the next LSN and advances the counter.
    pub fn next_lsn(&self) -> Lsn {
        Lsn::new(self.next_lsn.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the LSN the next call to [`next_lsn`](Self::next_lsn) will
    /// hand out.
    pub fn current_lsn(&self) -> Lsn {
        Lsn::new(self.next_lsn.load(Ordering::Relaxed))
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
