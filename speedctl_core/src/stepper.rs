//! Step controller: turns a logical step request into the next control state.
//!
//! These functions are pure; the engine applies the result to the actuator
//! and only commits it once the write succeeded.

use speedctl_config::ControlRecord;

use crate::error::{ControlError, Result};
use crate::scale::StepScale;
use crate::state::ControlState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Next state after moving `steps` logical units in `dir`.
///
/// Outside calibration the result is clamped into the record's duty envelope
/// and the step index into `[0, total_steps]`. While calibrating, bounds are
/// not enforced so the operator can jog the actuator past the recorded range;
/// duty and step only saturate at zero.
pub fn next_state(
    state: ControlState,
    record: &ControlRecord,
    scale: &StepScale,
    dir: Direction,
    steps: u32,
    calibrating: bool,
) -> Result<ControlState> {
    if steps == 0 {
        return Err(ControlError::InvalidInput(
            "stepSize must be a positive integer".into(),
        ));
    }
    let delta = scale.duty_delta(steps);
    let moved = match dir {
        Direction::Up => ControlState {
            current_step: state.current_step.saturating_add(1),
            current_duty: state.current_duty.saturating_add(delta),
        },
        Direction::Down => ControlState {
            current_step: state.current_step.saturating_sub(1),
            current_duty: state.current_duty.saturating_sub(delta),
        },
    };
    if calibrating {
        return Ok(moved);
    }
    Ok(clamp_to_envelope(moved, record, scale))
}

/// Snap a state into the operating envelope.
pub fn clamp_to_envelope(
    state: ControlState,
    record: &ControlRecord,
    scale: &StepScale,
) -> ControlState {
    if state.current_duty > record.max_duty {
        ControlState {
            current_step: scale.total_steps,
            current_duty: record.max_duty,
        }
    } else if state.current_duty < record.min_duty {
        ControlState::floor(record)
    } else {
        ControlState {
            current_step: state.current_step.min(scale.total_steps),
            current_duty: state.current_duty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (ControlRecord, StepScale) {
        let r = ControlRecord::default();
        let s = StepScale::from_record(&r);
        (r, s)
    }

    #[test]
    fn first_increment_from_floor() {
        let (r, s) = fixture();
        let next = next_state(ControlState::floor(&r), &r, &s, Direction::Up, 25, false).unwrap();
        assert_eq!(
            next,
            ControlState {
                current_step: 1,
                current_duty: 114
            }
        );
    }

    #[test]
    fn zero_steps_is_invalid_input() {
        let (r, s) = fixture();
        let err = next_state(ControlState::floor(&r), &r, &s, Direction::Up, 0, false).unwrap_err();
        assert!(matches!(err, ControlError::InvalidInput(_)));
    }

    #[test]
    fn decrement_below_floor_snaps_to_zero_position() {
        let (r, s) = fixture();
        let start = ControlState {
            current_step: 1,
            current_duty: 110,
        };
        let next = next_state(start, &r, &s, Direction::Down, 25, false).unwrap();
        assert_eq!(next, ControlState::floor(&r));
    }

    #[test]
    fn calibrating_ignores_envelope() {
        let (r, s) = fixture();
        let start = ControlState {
            current_step: 49,
            current_duty: 750,
        };
        let up = next_state(start, &r, &s, Direction::Up, 25, true).unwrap();
        assert_eq!(up.current_duty, 764);
        assert_eq!(up.current_step, 50);

        let low = ControlState {
            current_step: 0,
            current_duty: 100,
        };
        let down = next_state(low, &r, &s, Direction::Down, 25, true).unwrap();
        assert_eq!(down.current_duty, 86);
        assert_eq!(down.current_step, 0);
    }

    #[test]
    fn calibrating_saturates_at_zero_duty() {
        let (r, s) = fixture();
        let start = ControlState {
            current_step: 0,
            current_duty: 3,
        };
        let down = next_state(start, &r, &s, Direction::Down, 25, true).unwrap();
        assert_eq!(down.current_duty, 0);
    }

    #[test]
    fn normal_step_pulls_calibrated_state_back_inside() {
        let (r, s) = fixture();
        let outside = ControlState {
            current_step: 52,
            current_duty: 800,
        };
        let next = next_state(outside, &r, &s, Direction::Down, 25, false).unwrap();
        assert_eq!(
            next,
            ControlState {
                current_step: 49,
                current_duty: 750
            }
        );
    }

    #[test]
    fn step_index_never_passes_total_inside_envelope() {
        let (r, s) = fixture();
        // Tiny moves add the minimum delta but still count as whole steps.
        let start = ControlState {
            current_step: 49,
            current_duty: 400,
        };
        let next = next_state(start, &r, &s, Direction::Up, 1, false).unwrap();
        assert_eq!(next.current_step, 49);
        assert_eq!(next.current_duty, 402);
    }
}
