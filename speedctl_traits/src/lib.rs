//! Hardware seams shared by the control engine and the drivers.

/// A PWM output that accepts a raw duty value on a channel.
///
/// Implementations must be synchronous and must not block: the control engine
/// calls `set_duty` while holding its exclusion lock.
pub trait Actuator {
    fn set_duty(
        &mut self,
        channel: u8,
        value: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn set_duty(
        &mut self,
        channel: u8,
        value: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_duty(channel, value)
    }
}
