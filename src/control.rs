//! Pause / resume / cancel signalling between a caller and a running engine.
//!
//! A [`ControlHandle`] is a cheap clone around shared atomics, so a UI thread,
//! a stdin reader or an event sink can steer a run that is executing on
//! another thread. The engine reads the signal only at its checkpoints.
//!
//! ```text
//!            pause()             cancel()
//! Running ───────────▶ Paused ───────────▶ Cancelled
//!    ▲                   │                    ▲
//!    └──── resume() ─────┘                    │
//!    └────────────────── cancel() ────────────┘
//! ```
//!
//! `reset()` returns any state to `Running` and must be called between runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

const RUNNING: u8 = 0;
const PAUSED: u8 = 1;
const CANCELLED: u8 = 2;

const PHASE_IDLE: u8 = 0;
const PHASE_RUNNING: u8 = 1;
const PHASE_COMPLETED: u8 = 2;
const PHASE_CANCELLED: u8 = 3;

/// The signal the caller has set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Running,
    Paused,
    Cancelled,
}

/// Where the engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
}

#[derive(Debug)]
struct Shared {
    signal: AtomicU8,
    phase: AtomicU8,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            signal: AtomicU8::new(RUNNING),
            phase: AtomicU8::new(PHASE_IDLE),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ControlHandle {
    shared: Arc<Shared>,
}

impl ControlHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ControlState {
        match self.shared.signal.load(Ordering::SeqCst) {
            PAUSED => ControlState::Paused,
            CANCELLED => ControlState::Cancelled,
            _ => ControlState::Running,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state() == ControlState::Paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == ControlState::Cancelled
    }

    /// Request a pause. Has no effect once cancelled; returns whether the
    /// state changed.
    pub fn pause(&self) -> bool {
        self.transition(RUNNING, PAUSED)
    }

    /// Leave a pause. Has no effect unless paused.
    pub fn resume(&self) -> bool {
        self.transition(PAUSED, RUNNING)
    }

    /// Request cancellation. Idempotent, and clears any pause.
    pub fn cancel(&self) {
        self.shared.signal.store(CANCELLED, Ordering::SeqCst);
    }

    /// Clear signals left over from a previous run.
    pub fn reset(&self) {
        self.shared.signal.store(RUNNING, Ordering::SeqCst);
    }

    pub fn engine_state(&self) -> EngineState {
        match self.shared.phase.load(Ordering::SeqCst) {
            PHASE_RUNNING if self.is_paused() => EngineState::Paused,
            PHASE_RUNNING => EngineState::Running,
            PHASE_COMPLETED => EngineState::Completed,
            PHASE_CANCELLED => EngineState::Cancelled,
            PHASE_IDLE => EngineState::Idle,
            // Only the constants above are ever stored.
            _ => EngineState::Idle,
        }
    }

    pub(crate) fn mark_running(&self) {
        self.shared.phase.store(PHASE_RUNNING, Ordering::SeqCst);
    }

    pub(crate) fn mark_finished(&self, cancelled: bool) {
        let phase = if cancelled {
            PHASE_CANCELLED
        } else {
            PHASE_COMPLETED
        };
        self.shared.phase.store(phase, Ordering::SeqCst);
    }

    fn transition(&self, from: u8, to: u8) -> bool {
        self.shared
            .signal
            .compare_exchange(from, to, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}
