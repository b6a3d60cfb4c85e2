//! Canonical timestamp cell.
//!
//! The right image stream is the reference: every right image overwrites the
//! stored instant, and every other relayed stream is stamped with whatever
//! value is current at the time it is handled.
//!
//! There is no pairing between a reference frame and the frames
//! stamped from it. A camera-info handler running concurrently with a right
//! image handler may read the previous instant; staleness of up to one
//! inter-arrival period is accepted.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Single-slot "latest value" cell for the canonical timestamp.
///
/// Lock-free: one writer stream and any number of reader streams. The
/// `written` flag distinguishes "no reference seen yet" from a real stamp of 0.
#[derive(Debug, Default)]
pub struct TimestampArbiter {
    stamp_us: AtomicU64,
    written: AtomicBool,
}

impl TimestampArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `stamp_us` as the current canonical instant.
    pub fn observe_reference(&self, stamp_us: u64) {
        self.stamp_us.store(stamp_us, Ordering::Relaxed);
        self.written.store(true, Ordering::Release);
    }

    /// Most recent canonical instant, or `None` before the first observation.
    pub fn current(&self) -> Option<u64> {
        if self.written.load(Ordering::Acquire) {
            Some(self.stamp_us.load(Ordering::Relaxed))
        } else {
            None
        }
    }
}
