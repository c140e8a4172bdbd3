//! Step to duty conversion derived from the control record.
//!
//! The factor is kept at four decimal places so the duty delta of a step is
//! reproducible across restarts regardless of float formatting in the store.
use speedctl_config::ControlRecord;

/// Smallest duty change a single step may produce.
pub const MIN_DUTY_DELTA: u32 = 2;
/// Decimal places kept in `duty_per_step`.
pub const DUTY_FACTOR_DECIMALS: i32 = 4;

/// Round `x` to `decimals` places, ties away from zero.
#[inline]
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let m = 10f64.powi(decimals);
    (x * m).round() / m
}

/// Derived values of a [`ControlRecord`], recomputed whenever it changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepScale {
    /// `ceil((max_speed - min_speed) / step_size) + 1`
    pub total_steps: u32,
    /// Duty units per logical speed unit.
    pub duty_per_step: f64,
}

impl StepScale {
    pub fn from_record(r: &ControlRecord) -> Self {
        let speed_range = r.max_speed.saturating_sub(r.min_speed);
        let duty_range = r.max_duty.saturating_sub(r.min_duty);
        let duty_per_step = if speed_range == 0 {
            0.0
        } else {
            round_to(
                f64::from(duty_range) / f64::from(speed_range),
                DUTY_FACTOR_DECIMALS,
            )
        };
        Self {
            total_steps: r.total_steps(),
            duty_per_step,
        }
    }

    /// Duty change for a move of `steps` logical units, never below
    /// [`MIN_DUTY_DELTA`].
    pub fn duty_delta(&self, steps: u32) -> u32 {
        let raw = (self.duty_per_step * f64::from(steps)).round();
        let delta = if !raw.is_finite() || raw <= 0.0 {
            0
        } else if raw >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            raw as u32
        };
        delta.max(MIN_DUTY_DELTA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_defaults() {
        let s = StepScale::from_record(&ControlRecord::default());
        assert_eq!(s.total_steps, 49);
        assert!((s.duty_per_step - 0.5417).abs() < 1e-12);
        assert_eq!(s.duty_delta(25), 14);
        assert_eq!(s.duty_delta(10), 5);
    }

    #[test]
    fn tiny_moves_still_change_duty() {
        let s = StepScale::from_record(&ControlRecord::default());
        assert_eq!(s.duty_delta(1), MIN_DUTY_DELTA);
        assert_eq!(s.duty_delta(3), MIN_DUTY_DELTA);
    }

    #[test]
    fn degenerate_speed_range_has_zero_factor() {
        let r = ControlRecord {
            min_speed: 1000,
            max_speed: 1000,
            ..ControlRecord::default()
        };
        let s = StepScale::from_record(&r);
        assert_eq!(s.duty_per_step, 0.0);
        assert_eq!(s.duty_delta(25), MIN_DUTY_DELTA);
    }

    #[test]
    fn rounding_keeps_four_places() {
        assert_eq!(round_to(0.541_666_6, 4), 0.5417);
        assert_eq!(round_to(2.0, 4), 2.0);
        assert_eq!(round_to(0.000_04, 4), 0.0);
    }
}
