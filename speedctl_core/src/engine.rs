//! The control engine: record, derived scale, control state, and the two
//! collaborators it drives.
//!
//! Every mutation follows validate → build candidate → persist → swap →
//! write through. The state is only committed after the actuator accepted the
//! duty value, so `state.current_duty` is always the last value written.

use speedctl_config::{ControlRecord, RecordPatch};
use speedctl_traits::Actuator;

use crate::calibration::{self, Bound};
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::oscillator::Sweep;
use crate::scale::StepScale;
use crate::state::ControlState;
use crate::stepper::{self, Direction};
use crate::store::ConfigStore;

/// Point-in-time copy of the engine for status queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub record: ControlRecord,
    pub scale: StepScale,
    pub state: ControlState,
}

pub(crate) struct Engine {
    pub(crate) record: ControlRecord,
    pub(crate) scale: StepScale,
    pub(crate) state: ControlState,
    pub(crate) channel: u8,
    pub(crate) actuator: Box<dyn Actuator + Send>,
    pub(crate) store: Box<dyn ConfigStore + Send>,
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("record", &self.record)
            .field("scale", &self.scale)
            .field("state", &self.state)
            .field("channel", &self.channel)
            .finish()
    }
}

impl Engine {
    pub(crate) fn new(
        record: ControlRecord,
        channel: u8,
        actuator: Box<dyn Actuator + Send>,
        store: Box<dyn ConfigStore + Send>,
    ) -> Self {
        Self {
            record,
            scale: StepScale::from_record(&record),
            state: ControlState::floor(&record),
            channel,
            actuator,
            store,
        }
    }

    /// Write `next` to the actuator and commit it.
    pub(crate) fn apply(&mut self, next: ControlState) -> Result<ControlState> {
        self.actuator
            .set_duty(self.channel, next.current_duty)
            .map_err(|e| map_hw_error(&*e))?;
        self.state = next;
        Ok(next)
    }

    pub(crate) fn step(
        &mut self,
        dir: Direction,
        steps: u32,
        calibrating: bool,
    ) -> Result<ControlState> {
        let next = stepper::next_state(
            self.state,
            &self.record,
            &self.scale,
            dir,
            steps,
            calibrating,
        )?;
        let applied = self.apply(next)?;
        tracing::debug!(
            ?dir,
            steps,
            calibrating,
            step = applied.current_step,
            duty = applied.current_duty,
            "step applied"
        );
        Ok(applied)
    }

    pub(crate) fn zero(&mut self) -> Result<ControlState> {
        let applied = self.apply(ControlState::floor(&self.record))?;
        tracing::debug!(duty = applied.current_duty, "zeroed");
        Ok(applied)
    }

    /// Persist `record`, make it current and return to the zero position.
    fn commit(&mut self, record: ControlRecord) -> Result<ControlState> {
        self.store.save_config(&record)?;
        self.install(record);
        self.zero()
    }

    fn install(&mut self, record: ControlRecord) {
        self.record = record;
        self.scale = StepScale::from_record(&record);
        tracing::info!(
            min_speed = record.min_speed,
            max_speed = record.max_speed,
            min_duty = record.min_duty,
            max_duty = record.max_duty,
            total_steps = self.scale.total_steps,
            duty_per_step = self.scale.duty_per_step,
            "record installed"
        );
    }

    /// Returns the duty that was pinned to the bound and the re-zeroed state.
    pub(crate) fn calibrate(
        &mut self,
        bound: Bound,
        speed: u32,
    ) -> Result<(u32, ControlState)> {
        let anchored_duty = self.state.current_duty;
        let candidate = calibration::anchor(&self.record, bound, speed, anchored_duty)?;
        tracing::info!(?bound, speed, duty = anchored_duty, "calibration pinned");
        let state = self.commit(candidate)?;
        Ok((anchored_duty, state))
    }

    pub(crate) fn save(&mut self, patch: &RecordPatch) -> Result<ControlRecord> {
        let merged = patch.merge_onto(&self.record)?;
        self.commit(merged)?;
        Ok(self.record)
    }

    pub(crate) fn move_osc_bound(&mut self, from: u32, to: u32) -> Result<ControlRecord> {
        let moved = self.record.move_osc_bound(from, to)?;
        self.commit(moved)?;
        Ok(self.record)
    }

    pub(crate) fn load(&mut self) -> Result<(ControlRecord, u32)> {
        let stored = self.store.load_config()?;
        stored.validate()?;
        self.install(stored);
        Ok((self.record, self.state.current_step))
    }

    pub(crate) fn reset_to_defaults(&mut self) -> Result<(ControlRecord, u32)> {
        let defaults = self.store.load_defaults();
        defaults.validate()?;
        let state = self.commit(defaults)?;
        Ok((self.record, state.current_step))
    }

    /// One oscillation tick: choose the direction from the live position and
    /// step by the record's `step_size`.
    pub(crate) fn sweep_tick(&mut self, sweep: &mut Sweep) -> Result<ControlState> {
        let dir = sweep.advance(self.state.current_step, &self.record);
        let steps = self.record.step_size;
        self.step(dir, steps, false)
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            record: self.record,
            scale: self.scale,
            state: self.state,
        }
    }
}
