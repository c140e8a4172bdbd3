//! Maps `Box<dyn Error>` from the actuator boundary to a typed `ControlError`.
//!
//! `speedctl_traits::Actuator` uses `Box<dyn Error + Send + Sync>` so any
//! driver can plug in; this module converts those into `HardwareFault`, with
//! an optional feature-gated path for `speedctl_hardware::HwError` downcasting.

use crate::error::ControlError;

/// Map an actuator error to a typed `ControlError`.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ControlError {
    #[cfg(feature = "hardware-errors")]
    {
        use speedctl_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::UnknownChannel(ch) => {
                    ControlError::HardwareFault(format!("pwm channel {ch} is not available"))
                }
                HwError::Io(io) => ControlError::HardwareFault(format!("pwm device io: {io}")),
                other => ControlError::HardwareFault(other.to_string()),
            };
        }
    }

    ControlError::HardwareFault(e.to_string())
}
