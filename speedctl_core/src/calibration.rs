//! Calibration: pin one end of the speed range to the actuator's live duty.
//!
//! The operator jogs the actuator with calibrating steps until the physical
//! output matches the wanted extreme, then pins it. The functions here only
//! build and check the candidate record; committing is the engine's job.

use speedctl_config::ControlRecord;

use crate::error::{ControlError, Result};

/// Which end of the range is being redefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

/// Candidate record with `bound` moved to `speed` and anchored at `current_duty`.
///
/// The oscillation range is fitted to the new step count; the candidate must
/// satisfy every record invariant or the calibration is rejected.
pub fn anchor(
    record: &ControlRecord,
    bound: Bound,
    speed: u32,
    current_duty: u32,
) -> Result<ControlRecord> {
    let candidate = match bound {
        Bound::Lower => {
            if speed >= record.max_speed {
                return Err(ControlError::InvalidCalibration(format!(
                    "minSpeedUnit {speed} must be below maxSpeedUnit {}",
                    record.max_speed
                )));
            }
            ControlRecord {
                min_speed: speed,
                min_duty: current_duty,
                ..*record
            }
        }
        Bound::Upper => {
            if speed <= record.min_speed {
                return Err(ControlError::InvalidCalibration(format!(
                    "maxSpeedUnit {speed} must be above minSpeedUnit {}",
                    record.min_speed
                )));
            }
            ControlRecord {
                max_speed: speed,
                max_duty: current_duty,
                ..*record
            }
        }
    }
    .fit_osc_range();

    candidate
        .validate()
        .map_err(|e| ControlError::InvalidCalibration(e.to_string()))?;
    Ok(candidate)
}
