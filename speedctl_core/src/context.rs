//! `ControlContext`: the single exclusion domain around the engine.
//!
//! Every public operation takes the lock for its whole duration, including
//! persistence and the actuator write, so callers (console requests and the
//! oscillator) are serialized.
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use speedctl_config::{ControlRecord, RecordPatch};

use crate::builder::{ControlContextBuilder, Missing};
use crate::calibration::Bound;
use crate::engine::{Engine, Snapshot};
use crate::error::{ControlError, Result};
use crate::oscillator::Sweep;
use crate::state::ControlState;
use crate::stepper::Direction;

/// Cloneable handle to the shared engine.
#[derive(Clone)]
pub struct ControlContext {
    pub(crate) inner: Arc<Mutex<Engine>>,
}

impl core::fmt::Debug for ControlContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.inner.try_lock() {
            Ok(engine) => f
                .debug_struct("ControlContext")
                .field("engine", &*engine)
                .finish(),
            Err(_) => f.debug_struct("ControlContext").finish_non_exhaustive(),
        }
    }
}

impl ControlContext {
    /// Start building a context.
    pub fn builder() -> ControlContextBuilder<Missing, Missing> {
        ControlContextBuilder::default()
    }

    pub(crate) fn from_engine(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Engine>> {
        self.inner.lock().map_err(|_| ControlError::Poisoned)
    }

    /// Move up by `steps` logical units.
    pub fn increment(&self, steps: u32, calibrating: bool) -> Result<ControlState> {
        self.lock()?.step(Direction::Up, steps, calibrating)
    }

    /// Move down by `steps` logical units.
    pub fn decrement(&self, steps: u32, calibrating: bool) -> Result<ControlState> {
        self.lock()?.step(Direction::Down, steps, calibrating)
    }

    /// Return to step 0 at the duty floor.
    pub fn zero(&self) -> Result<ControlState> {
        self.lock()?.zero()
    }

    /// Pin the lower end of the speed range to the live duty value.
    /// Returns the pinned duty and the state after re-zeroing.
    pub fn set_lower_bound(&self, speed: u32) -> Result<(u32, ControlState)> {
        self.lock()?.calibrate(Bound::Lower, speed)
    }

    /// Pin the upper end of the speed range to the live duty value.
    pub fn set_upper_bound(&self, speed: u32) -> Result<(u32, ControlState)> {
        self.lock()?.calibrate(Bound::Upper, speed)
    }

    /// Merge `patch` onto the current record, persist it and re-zero.
    pub fn save(&self, patch: &RecordPatch) -> Result<ControlRecord> {
        self.lock()?.save(patch)
    }

    /// Drag the oscillation bound sitting at `from` to `to`, persist the
    /// result and re-zero.
    pub fn move_osc_bound(&self, from: u32, to: u32) -> Result<ControlRecord> {
        self.lock()?.move_osc_bound(from, to)
    }

    /// Replace the in-memory record with the persisted one. The control
    /// state is kept; the returned step is the current one.
    pub fn load(&self) -> Result<(ControlRecord, u32)> {
        self.lock()?.load()
    }

    /// Persist the store's defaults, make them current and re-zero.
    pub fn reset_to_defaults(&self) -> Result<(ControlRecord, u32)> {
        self.lock()?.reset_to_defaults()
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.lock()?.snapshot())
    }

    pub fn record(&self) -> Result<ControlRecord> {
        Ok(self.lock()?.record)
    }

    pub fn state(&self) -> Result<ControlState> {
        Ok(self.lock()?.state)
    }

    /// Initial sweep direction and tick period for a new oscillation run.
    pub fn begin_sweep(&self) -> Result<(Sweep, Duration)> {
        let engine = self.lock()?;
        let sweep = Sweep::starting_at(engine.state.current_step, &engine.record);
        Ok((sweep, Duration::from_millis(engine.record.interval_ms)))
    }

    /// One oscillation tick: direction decision and step in one critical
    /// section.
    pub fn sweep_tick(&self, sweep: &mut Sweep) -> Result<ControlState> {
        self.lock()?.sweep_tick(sweep)
    }
}
