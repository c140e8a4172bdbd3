pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod pwm;
pub mod timing;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use pwm::HardwareActuator;

use speedctl_traits::Actuator;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Simulated PWM output.
///
/// Every write is recorded; clone a [`ActuatorProbe`] before handing the
/// actuator to the engine to observe what the engine wrote.
#[derive(Debug, Default)]
pub struct SimulatedActuator {
    shared: Arc<Shared>,
}

#[derive(Debug, Default)]
struct Shared {
    last: AtomicU32,
    writes: AtomicUsize,
    history: Mutex<Vec<(u8, u32)>>,
}

impl SimulatedActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only handle onto the writes this actuator receives.
    pub fn probe(&self) -> ActuatorProbe {
        ActuatorProbe {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Actuator for SimulatedActuator {
    fn set_duty(
        &mut self,
        channel: u8,
        value: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.shared.last.store(value, Ordering::Relaxed);
        self.shared.writes.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut h) = self.shared.history.lock() {
            h.push((channel, value));
        }
        tracing::debug!(channel, value, "pwm duty (simulated)");
        Ok(())
    }
}

/// Observer for a [`SimulatedActuator`].
#[derive(Debug, Clone)]
pub struct ActuatorProbe {
    shared: Arc<Shared>,
}

impl ActuatorProbe {
    /// Last duty value written, 0 before the first write.
    pub fn last(&self) -> u32 {
        self.shared.last.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> usize {
        self.shared.writes.load(Ordering::Relaxed)
    }

    /// All `(channel, duty)` writes in order.
    pub fn history(&self) -> Vec<(u8, u32)> {
        self.shared
            .history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }
}
