//! PWM clock arithmetic for the BCM283x PWM peripheral.
//!
//! The peripheral counts ticks of `PWM_BASE_CLOCK_HZ / clock_divider`. A duty
//! value is a number of ticks the output stays high within a period of
//! `range` ticks.
use std::time::Duration;

/// Oscillator feeding the PWM clock manager.
pub const PWM_BASE_CLOCK_HZ: u64 = 19_200_000;
/// Largest divider the clock manager accepts (12-bit integer part).
pub const MAX_CLOCK_DIVIDER: u32 = 4095;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Length of one PWM tick in nanoseconds, rounded to nearest.
#[inline]
pub fn tick_ns(clock_divider: u32) -> u64 {
    let div = u64::from(clock_divider.clamp(1, MAX_CLOCK_DIVIDER));
    (div * NANOS_PER_SEC + PWM_BASE_CLOCK_HZ / 2) / PWM_BASE_CLOCK_HZ
}

/// Full PWM period for `range` ticks.
#[inline]
pub fn period(clock_divider: u32, range: u32) -> Duration {
    Duration::from_nanos(tick_ns(clock_divider).saturating_mul(u64::from(range)))
}

/// Pulse width for a duty value, clamped to the period.
#[inline]
pub fn pulse_width(duty: u32, clock_divider: u32, range: u32) -> Duration {
    let ticks = u64::from(duty.min(range));
    Duration::from_nanos(tick_ns(clock_divider).saturating_mul(ticks))
}
