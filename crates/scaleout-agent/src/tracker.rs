//! Live worker-count tracking
//!
//! Keeps the current worker count and a time-stamped history of every
//! transition. Worker add/remove events may arrive from a thread other than
//! the host's dispatch thread, so the compound state sits behind a single
//! lock; the raw count is additionally mirrored in an atomic for lock-free
//! reads where a momentarily stale value is acceptable.

use crate::host::WorkerDirectory;
use crate::models::WorkerCountSample;
use anyhow::Result;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Compound state guarded by one lock: consistency between the flags and the
/// history matters when deciding whether an adjustment may be recorded.
#[derive(Debug, Default)]
struct TrackerState {
    active: bool,
    context_established: bool,
    history: Vec<WorkerCountSample>,
}

/// Concurrent worker-count tracker with an append-only transition history.
#[derive(Debug, Default)]
pub struct WorkerCountTracker {
    scale_out: AtomicU32,
    state: Mutex<TrackerState>,
}

impl WorkerCountTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting adjustments.
    pub fn activate(&self) {
        self.state.lock().expect("tracker lock poisoned").active = true;
    }

    /// Stop accepting adjustments; later calls to [`adjust`] are no-ops.
    ///
    /// [`adjust`]: WorkerCountTracker::adjust
    pub fn deactivate(&self) {
        self.state.lock().expect("tracker lock poisoned").active = false;
    }

    /// Record that the host processing context exists.
    ///
    /// Workers can register before the application context does; until this
    /// is called those adjustments are dropped rather than failed.
    pub fn mark_context_established(&self) {
        self.state
            .lock()
            .expect("tracker lock poisoned")
            .context_established = true;
    }

    /// Apply a worker-count delta of `+1` or `-1` at the given time.
    ///
    /// Returns whether the adjustment was recorded. A call before activation
    /// or context establishment is silently dropped, which absorbs the race
    /// where workers register ahead of the application context.
    pub fn adjust(&self, delta: i32, timestamp_ms: i64) -> bool {
        let mut state = self.state.lock().expect("tracker lock poisoned");
        if !state.active || !state.context_established {
            debug!(delta, timestamp_ms, "dropping worker adjustment before context");
            return false;
        }

        let current = self.scale_out.load(Ordering::Relaxed);
        let updated = if delta >= 0 {
            current.saturating_add(delta as u32)
        } else {
            current.saturating_sub(delta.unsigned_abs())
        };
        self.scale_out.store(updated, Ordering::Relaxed);
        state.history.push(WorkerCountSample {
            scale_out: updated,
            timestamp_ms,
        });
        true
    }

    /// Lock-free read of the current worker count.
    ///
    /// May be momentarily stale relative to history appends.
    pub fn current(&self) -> u32 {
        self.scale_out.load(Ordering::Relaxed)
    }

    /// Immutable copy of the transition history, in insertion order.
    pub fn snapshot_history(&self) -> Vec<WorkerCountSample> {
        self.state
            .lock()
            .expect("tracker lock poisoned")
            .history
            .clone()
    }

    /// Measure the actually-provisioned worker count from the host directory.
    ///
    /// Excludes the coordinator's own address and overwrites the tracked
    /// count with the result. Used lazily at first job start to correct
    /// drift between the requested and the provisioned count.
    pub async fn measure_actual(
        &self,
        directory: &dyn WorkerDirectory,
        coordinator_address: &str,
    ) -> Result<u32> {
        let addresses = directory.live_worker_addresses().await?;
        let measured = addresses
            .iter()
            .filter(|address| address.as_str() != coordinator_address)
            .count() as u32;

        // Hold the lock for the store so concurrent adjustments cannot
        // interleave between the measurement and the write.
        let _state = self.state.lock().expect("tracker lock poisoned");
        let previous = self.scale_out.swap(measured, Ordering::Relaxed);
        if previous != measured {
            warn!(previous, measured, "measured worker count differs from tracked count");
        }
        Ok(measured)
    }
}
