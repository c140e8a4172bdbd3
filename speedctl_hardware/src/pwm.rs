//! Raspberry Pi hardware PWM output backed by `rppal`.
use rppal::pwm::{Channel, Polarity, Pwm};
use speedctl_traits::Actuator;
use std::time::Duration;

use crate::error::{HwError, Result};
use crate::timing;

pub struct HardwareActuator {
    pwm: Pwm,
    channel: u8,
    clock_divider: u32,
    range: u32,
}

fn channel_for(index: u8) -> Result<Channel> {
    match index {
        0 => Ok(Channel::Pwm0),
        1 => Ok(Channel::Pwm1),
        other => Err(HwError::UnknownChannel(other)),
    }
}

impl HardwareActuator {
    /// Enable `channel` (0 = BCM GPIO18, 1 = BCM GPIO19) with the output held low.
    pub fn new(channel: u8, clock_divider: u32, range: u32) -> Result<Self> {
        let ch = channel_for(channel)?;
        let period = timing::period(clock_divider, range);
        let pwm = Pwm::with_period(ch, period, Duration::ZERO, Polarity::Normal, true)
            .map_err(|e| HwError::Pwm(format!("open pwm channel {channel}: {e}")))?;
        tracing::info!(
            channel,
            clock_divider,
            range,
            period_us = period.as_micros() as u64,
            "hardware pwm enabled"
        );
        Ok(Self {
            pwm,
            channel,
            clock_divider,
            range,
        })
    }
}

impl Actuator for HardwareActuator {
    fn set_duty(
        &mut self,
        channel: u8,
        value: u32,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if channel != self.channel {
            return Err(Box::new(HwError::UnknownChannel(channel)));
        }
        if value > self.range {
            tracing::warn!(value, range = self.range, "duty above pwm range, clamping");
        }
        let width = timing::pulse_width(value, self.clock_divider, self.range);
        self.pwm
            .set_pulse_width(width)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        tracing::trace!(channel, value, width_ns = width.as_nanos() as u64, "pwm duty");
        Ok(())
    }
}

impl Drop for HardwareActuator {
    fn drop(&mut self) {
        if let Err(e) = self.pwm.disable() {
            tracing::warn!(error = %e, "failed to disable pwm channel");
        }
    }
}
