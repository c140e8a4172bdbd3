//! Runtime position of the actuator.

use speedctl_config::ControlRecord;

/// Current step index and the duty value last written to the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlState {
    pub current_step: u32,
    pub current_duty: u32,
}

impl ControlState {
    /// Zero position for `record`: step 0 at the duty floor.
    pub fn floor(record: &ControlRecord) -> Self {
        Self {
            current_step: 0,
            current_duty: record.min_duty,
        }
    }

    /// Whether the duty lies inside the record's physical envelope.
    pub fn within(&self, record: &ControlRecord) -> bool {
        (record.min_duty..=record.max_duty).contains(&self.current_duty)
    }
}
