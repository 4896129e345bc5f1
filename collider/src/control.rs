//! Cooperative cancellation and progress reporting.
//!
//! The search runs on one thread and never blocks. A host on another thread
//! stops it by setting a flag the search polls at the top of every loop, and
//! watches it through a pair of atomic counters.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Read-only view of a stop request.
pub trait CancellationToken {
    fn is_cancelled(&self) -> bool;
}

impl CancellationToken for AtomicBool {
    #[inline]
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: CancellationToken + ?Sized> CancellationToken for Arc<T> {
    #[inline]
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<T: CancellationToken + ?Sized> CancellationToken for &T {
    #[inline]
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// A token that is never cancelled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancellationToken for NeverCancel {
    #[inline]
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Checkpoint reached by the current search phase.
///
/// Each rejection or acceptance point of a phase has a fixed ordinal between
/// 1 and the phase maximum. `current` holds the last one reached, so a host
/// polling it sees how deep candidates get before they are rejected.
#[derive(Debug, Default)]
pub struct Progress {
    current: AtomicU32,
    max: AtomicU32,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the counter for a new phase with `max` checkpoints.
    pub fn begin_phase(&self, max: u32) {
        self.current.store(0, Ordering::Relaxed);
        self.max.store(max, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn checkpoint(&self, ordinal: u32) {
        self.current.store(ordinal, Ordering::Relaxed);
    }

    /// `(current, max)` of the running phase.
    pub fn snapshot(&self) -> (u32, u32) {
        (self.current.load(Ordering::Relaxed), self.max.load(Ordering::Relaxed))
    }
}
