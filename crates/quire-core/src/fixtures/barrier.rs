//! Count-based completion barrier for fixture loads.
//!
//! The counter starts at 1 so that loads finishing before [`LoadBarrier::start`] cannot
//! release the continuation early. `start` drops that initial bias. The continuation
//! runs at most once per [`LoadBarrier::reset`], when the counter reaches exactly 0 and
//! the barrier has been started. Completion order does not matter.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

type Continuation = Box<dyn FnOnce() + Send + 'static>;

struct BarrierState {
    outstanding: i64,
    started: bool,
    continuation: Option<Continuation>,
}

impl Default for BarrierState {
    fn default() -> Self {
        Self {
            outstanding: 1,
            started: false,
            continuation: None,
        }
    }
}

/// Explicit load-barrier context. Share it behind an `Arc`.
#[derive(Default)]
pub struct LoadBarrier {
    state: Mutex<BarrierState>,
}

impl fmt::Debug for LoadBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("LoadBarrier")
            .field("outstanding", &state.outstanding)
            .field("started", &state.started)
            .field("armed", &state.continuation.is_some())
            .finish()
    }
}

impl LoadBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Begin a fresh batch: not started, counter back to 1, new continuation.
    pub fn reset(&self, continuation: impl FnOnce() + Send + 'static) {
        let mut state = self.lock();
        *state = BarrierState {
            continuation: Some(Box::new(continuation)),
            ..BarrierState::default()
        };
    }

    /// Register one outstanding load. Call before issuing the read.
    pub fn begin_load(self: &Arc<Self>) -> LoadToken {
        self.lock().outstanding += 1;
        LoadToken {
            barrier: Arc::clone(self),
        }
    }

    /// Apply `delta` to the counter and run the continuation if the batch is complete.
    pub fn end_load(&self, delta: i64) {
        let ready = {
            let mut state = self.lock();
            state.outstanding += delta;
            if state.outstanding == 0 && state.started {
                state.continuation.take()
            } else {
                None
            }
        };
        // Outside the lock so the continuation may touch the barrier.
        if let Some(continuation) = ready {
            debug!("all fixture loads complete");
            continuation();
        }
    }

    /// Mark the batch as started and release the initial bias.
    pub fn start(&self) {
        self.lock().started = true;
        self.end_load(-1);
    }

    pub fn outstanding(&self) -> i64 {
        self.lock().outstanding
    }

    pub fn is_started(&self) -> bool {
        self.lock().started
    }
}

/// Completion token for one outstanding load.
///
/// Dropping the token without [`LoadToken::complete`] leaves the load outstanding;
/// a failed read must never count as completed.
#[must_use = "a load token must be completed once the read finishes"]
pub struct LoadToken {
    barrier: Arc<LoadBarrier>,
}

impl fmt::Debug for LoadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadToken").finish_non_exhaustive()
    }
}

impl LoadToken {
    pub fn complete(self) {
        self.barrier.end_load(-1);
    }
}
