//! The persisted control record and its partial-update form.
//!
//! JSON keys follow the control surface (`minSpeedUnit`, `maxDuty`, ...).
//! Keys written by the legacy trolling controller (`minRevs`, `servoMinPWM`,
//! ...) are accepted on read so an existing `params.json` keeps loading.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invariant violations of a [`ControlRecord`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("minSpeedUnit ({min}) must be below maxSpeedUnit ({max})")]
    SpeedRange { min: u32, max: u32 },
    #[error("stepSize must be > 0")]
    ZeroStepSize,
    #[error("minDuty ({min}) must be below maxDuty ({max})")]
    DutyRange { min: u32, max: u32 },
    #[error("intervalMillis must be > 0")]
    ZeroInterval,
    #[error("minOscStep ({min}) must be below maxOscStep ({max})")]
    OscRange { min: u32, max: u32 },
    #[error("maxOscStep ({max}) exceeds the {total} available steps")]
    OscBeyondTotal { max: u32, total: u32 },
    #[error("step {0} is not an oscillation bound")]
    NotABound(u32),
}

/// Operating configuration of the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRecord {
    /// Logical lower bound (e.g. rpm).
    #[serde(rename = "minSpeedUnit", alias = "minRevs")]
    pub min_speed: u32,
    /// Logical upper bound.
    #[serde(rename = "maxSpeedUnit", alias = "maxRevs")]
    pub max_speed: u32,
    /// Logical units per discrete step.
    #[serde(rename = "stepSize")]
    pub step_size: u32,
    /// Lower step index of the oscillation program.
    #[serde(rename = "minOscStep", alias = "minStep")]
    pub min_osc_step: u32,
    /// Upper step index of the oscillation program.
    #[serde(rename = "maxOscStep", alias = "maxStep")]
    pub max_osc_step: u32,
    /// Oscillation tick period.
    #[serde(rename = "intervalMillis", alias = "intervalMs")]
    pub interval_ms: u64,
    /// Physical duty floor accepted by the driver.
    #[serde(rename = "minDuty", alias = "servoMinPWM")]
    pub min_duty: u32,
    /// Physical duty ceiling accepted by the driver.
    #[serde(rename = "maxDuty", alias = "servoMaxPWM")]
    pub max_duty: u32,
}

impl Default for ControlRecord {
    fn default() -> Self {
        Self {
            min_speed: 800,
            max_speed: 2000,
            step_size: 25,
            min_osc_step: 10,
            max_osc_step: 20,
            interval_ms: 1000,
            min_duty: 100,
            max_duty: 750,
        }
    }
}

impl ControlRecord {
    /// Number of discrete steps: `ceil((max - min) / step_size) + 1`.
    pub fn total_steps(&self) -> u32 {
        let range = self.max_speed.saturating_sub(self.min_speed);
        range.div_ceil(self.step_size.max(1)).saturating_add(1)
    }

    /// Logical speed shown for step `i` (1-based meter block; 0 is the floor).
    pub fn speed_at_step(&self, i: u32) -> u32 {
        let offset = i.saturating_sub(1).saturating_mul(self.step_size);
        self.min_speed.saturating_add(offset).min(self.max_speed)
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        if self.min_speed >= self.max_speed {
            return Err(RecordError::SpeedRange {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        if self.step_size == 0 {
            return Err(RecordError::ZeroStepSize);
        }
        if self.min_duty >= self.max_duty {
            return Err(RecordError::DutyRange {
                min: self.min_duty,
                max: self.max_duty,
            });
        }
        if self.interval_ms == 0 {
            return Err(RecordError::ZeroInterval);
        }
        if self.min_osc_step >= self.max_osc_step {
            return Err(RecordError::OscRange {
                min: self.min_osc_step,
                max: self.max_osc_step,
            });
        }
        let total = self.total_steps();
        if self.max_osc_step > total {
            return Err(RecordError::OscBeyondTotal {
                max: self.max_osc_step,
                total,
            });
        }
        Ok(())
    }

    /// Clamp the oscillation range into `[0, total_steps]`, keeping `min < max`
    /// whenever at least two steps exist.
    pub fn fit_osc_range(mut self) -> Self {
        let total = self.total_steps();
        self.max_osc_step = self.max_osc_step.clamp(1, total.max(1));
        if self.min_osc_step >= self.max_osc_step {
            self.min_osc_step = self.max_osc_step - 1;
        }
        self
    }

    /// Move the oscillation bound sitting at `from` to step `to`.
    ///
    /// Moving a bound past the other one swaps their roles: the old max
    /// becomes the new min (or the old min the new max).
    pub fn move_osc_bound(&self, from: u32, to: u32) -> Result<Self, RecordError> {
        let mut next = *self;
        if from == self.max_osc_step {
            if to > self.min_osc_step {
                next.max_osc_step = to;
            } else {
                next.max_osc_step = self.min_osc_step;
                next.min_osc_step = to;
            }
        } else if from == self.min_osc_step {
            if to < self.max_osc_step {
                next.min_osc_step = to;
            } else {
                next.min_osc_step = self.max_osc_step;
                next.max_osc_step = to;
            }
        } else {
            return Err(RecordError::NotABound(from));
        }
        next.validate()?;
        Ok(next)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A partial record: fields that are `None` keep the base value on merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPatch {
    #[serde(
        rename = "minSpeedUnit",
        alias = "minRevs",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_speed: Option<u32>,
    #[serde(
        rename = "maxSpeedUnit",
        alias = "maxRevs",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_speed: Option<u32>,
    #[serde(rename = "stepSize", skip_serializing_if = "Option::is_none")]
    pub step_size: Option<u32>,
    #[serde(
        rename = "minOscStep",
        alias = "minStep",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_osc_step: Option<u32>,
    #[serde(
        rename = "maxOscStep",
        alias = "maxStep",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_osc_step: Option<u32>,
    #[serde(
        rename = "intervalMillis",
        alias = "intervalMs",
        skip_serializing_if = "Option::is_none"
    )]
    pub interval_ms: Option<u64>,
    #[serde(
        rename = "minDuty",
        alias = "servoMinPWM",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_duty: Option<u32>,
    #[serde(
        rename = "maxDuty",
        alias = "servoMaxPWM",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_duty: Option<u32>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay this patch on `base` and validate the result. `base` is untouched.
    pub fn merge_onto(&self, base: &ControlRecord) -> Result<ControlRecord, RecordError> {
        let merged = ControlRecord {
            min_speed: self.min_speed.unwrap_or(base.min_speed),
            max_speed: self.max_speed.unwrap_or(base.max_speed),
            step_size: self.step_size.unwrap_or(base.step_size),
            min_osc_step: self.min_osc_step.unwrap_or(base.min_osc_step),
            max_osc_step: self.max_osc_step.unwrap_or(base.max_osc_step),
            interval_ms: self.interval_ms.unwrap_or(base.interval_ms),
            min_duty: self.min_duty.unwrap_or(base.min_duty),
            max_duty: self.max_duty.unwrap_or(base.max_duty),
        };
        merged.validate()?;
        Ok(merged)
    }
}

impl From<ControlRecord> for RecordPatch {
    fn from(r: ControlRecord) -> Self {
        Self {
            min_speed: Some(r.min_speed),
            max_speed: Some(r.max_speed),
            step_size: Some(r.step_size),
            min_osc_step: Some(r.min_osc_step),
            max_osc_step: Some(r.max_osc_step),
            interval_ms: Some(r.interval_ms),
            min_duty: Some(r.min_duty),
            max_duty: Some(r.max_duty),
        }
    }
}
