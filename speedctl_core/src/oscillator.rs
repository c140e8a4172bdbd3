//! Oscillation ("program") mode.
//!
//! An `Oscillator` owns at most one worker thread that ticks every
//! `interval_ms` and asks the shared `ControlContext` to take one sweep step.
//! The worker holds no control state of its own apart from the sweep
//! direction; each tick re-acquires the context lock.
//!
//! Dropping the `Oscillator` stops the worker and joins it.
use crossbeam_channel as xch;
use speedctl_config::ControlRecord;

use crate::context::ControlContext;
use crate::error::{ControlError, Result};
use crate::stepper::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramState {
    Idle,
    Sweeping,
}

impl ProgramState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Sweeping => "sweeping",
        }
    }
}

/// Direction bookkeeping for a sweep between the record's oscillation bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sweep {
    direction: Direction,
}

impl Sweep {
    /// Initial direction: up while below the upper bound, down otherwise.
    pub fn starting_at(current_step: u32, record: &ControlRecord) -> Self {
        let direction = if current_step < record.max_osc_step {
            Direction::Up
        } else {
            Direction::Down
        };
        Self { direction }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Pick the direction for the next tick from the live step index.
    ///
    /// At or below `min_osc_step` the sweep turns up; one step short of
    /// `max_osc_step` it turns down. With a degenerate range both hold and
    /// the downward turn wins.
    pub fn advance(&mut self, current_step: u32, record: &ControlRecord) -> Direction {
        if current_step <= record.min_osc_step {
            self.direction = Direction::Up;
        }
        if current_step >= record.max_osc_step.saturating_sub(1) {
            self.direction = Direction::Down;
        }
        self.direction
    }
}

struct Worker {
    stop_tx: xch::Sender<()>,
    join_handle: std::thread::JoinHandle<()>,
}

pub struct Oscillator {
    ctx: ControlContext,
    worker: Option<Worker>,
}

impl core::fmt::Debug for Oscillator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Oscillator")
            .field("state", &self.state())
            .finish()
    }
}

impl Oscillator {
    pub fn new(ctx: ControlContext) -> Self {
        Self { ctx, worker: None }
    }

    pub fn state(&self) -> ProgramState {
        if self.worker.is_some() {
            ProgramState::Sweeping
        } else {
            ProgramState::Idle
        }
    }

    /// Start sweeping. The tick period is read from the record once, here.
    /// Starting while already sweeping does nothing.
    pub fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            tracing::debug!("oscillator already sweeping");
            return Ok(());
        }
        let (mut sweep, interval) = self.ctx.begin_sweep()?;
        let (stop_tx, stop_rx) = xch::bounded::<()>(0);
        let ctx = self.ctx.clone();

        let join_handle = std::thread::Builder::new()
            .name("speedctl-oscillator".into())
            .spawn(move || {
                let ticker = xch::tick(interval);
                loop {
                    xch::select! {
                        recv(stop_rx) -> _ => {
                            tracing::debug!("oscillator received stop");
                            break;
                        }
                        recv(ticker) -> _ => {
                            match ctx.sweep_tick(&mut sweep) {
                                Ok(state) => tracing::trace!(
                                    step = state.current_step,
                                    duty = state.current_duty,
                                    "sweep tick"
                                ),
                                Err(ControlError::Poisoned) => {
                                    tracing::error!("control lock poisoned, oscillator exiting");
                                    break;
                                }
                                Err(e) => tracing::warn!(error = %e, "sweep tick failed"),
                            }
                        }
                    }
                }
                tracing::trace!("oscillator thread exiting cleanly");
            })?;

        tracing::info!(?interval, "oscillation started");
        self.worker = Some(Worker {
            stop_tx,
            join_handle,
        });
        Ok(())
    }

    /// Stop sweeping and wait for the worker. A tick already in progress
    /// completes first. Stopping an idle oscillator does nothing.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        // Dropping the sender disconnects the channel and wakes the select.
        drop(worker.stop_tx);
        match worker.join_handle.join() {
            Ok(()) => tracing::info!("oscillation stopped"),
            Err(e) => tracing::warn!(?e, "oscillator thread panicked during shutdown"),
        }
    }
}

impl Drop for Oscillator {
    fn drop(&mut self) {
        self.stop();
    }
}
