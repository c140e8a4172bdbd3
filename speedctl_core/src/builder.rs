//! Type-state builder for `ControlContext`.
//!
//! The builder enforces at compile time that an actuator and a store are
//! provided before `build()` is available. `try_build()` is always available
//! for dynamic checks.

use std::marker::PhantomData;

use speedctl_traits::Actuator;

use crate::context::ControlContext;
use crate::engine::Engine;
use crate::error::BuildError;
use crate::hw_error::map_hw_error;
use crate::state::ControlState;
use crate::store::ConfigStore;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `ControlContext`.
///
/// Building loads the record from the store (seeding defaults when the store
/// is empty), validates it, and writes the zero position to the actuator.
pub struct ControlContextBuilder<A, S> {
    actuator: Option<Box<dyn Actuator + Send>>,
    store: Option<Box<dyn ConfigStore + Send>>,
    channel: u8,
    _a: PhantomData<A>,
    _s: PhantomData<S>,
}

impl Default for ControlContextBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            actuator: None,
            store: None,
            channel: 0,
            _a: PhantomData,
            _s: PhantomData,
        }
    }
}

impl<A, S> ControlContextBuilder<A, S> {
    /// Provide the actuator driver.
    pub fn with_actuator(
        self,
        actuator: impl Actuator + Send + 'static,
    ) -> ControlContextBuilder<Set, S> {
        ControlContextBuilder {
            actuator: Some(Box::new(actuator)),
            store: self.store,
            channel: self.channel,
            _a: PhantomData,
            _s: PhantomData,
        }
    }

    /// Provide the persistence gateway.
    pub fn with_store(
        self,
        store: impl ConfigStore + Send + 'static,
    ) -> ControlContextBuilder<A, Set> {
        ControlContextBuilder {
            actuator: self.actuator,
            store: Some(Box::new(store)),
            channel: self.channel,
            _a: PhantomData,
            _s: PhantomData,
        }
    }

    /// PWM channel passed to every actuator write (default 0).
    #[must_use]
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Validate and construct, reporting what is missing at runtime.
    pub fn try_build(self) -> Result<ControlContext, BuildError> {
        let mut actuator = self.actuator.ok_or(BuildError::MissingActuator)?;
        let mut store = self.store.ok_or(BuildError::MissingStore)?;

        let record = store
            .load_or_seed()
            .map_err(|e| BuildError::Store(e.to_string()))?;
        record.validate()?;

        let zero = ControlState::floor(&record);
        actuator
            .set_duty(self.channel, zero.current_duty)
            .map_err(|e| BuildError::Hardware(map_hw_error(&*e).to_string()))?;

        tracing::info!(
            channel = self.channel,
            duty = zero.current_duty,
            total_steps = record.total_steps(),
            "control context ready"
        );
        Ok(ControlContext::from_engine(Engine::new(
            record,
            self.channel,
            actuator,
            store,
        )))
    }
}

impl ControlContextBuilder<Set, Set> {
    /// Build with both collaborators present.
    pub fn build(self) -> Result<ControlContext, BuildError> {
        self.try_build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MemoryStore;
    use speedctl_config::ControlRecord;
    use speedctl_hardware::SimulatedActuator;

    #[test]
    fn missing_store_is_reported() {
        let err = ControlContext::builder()
            .with_actuator(SimulatedActuator::new())
            .try_build()
            .unwrap_err();
        assert_eq!(err, BuildError::MissingStore);
    }

    #[test]
    fn missing_actuator_is_reported() {
        let err = ControlContext::builder()
            .with_store(MemoryStore::new(ControlRecord::default()))
            .try_build()
            .unwrap_err();
        assert_eq!(err, BuildError::MissingActuator);
    }

    #[test]
    fn build_seeds_empty_store_and_writes_floor() {
        let store = MemoryStore::new(ControlRecord::default());
        let act = SimulatedActuator::new();
        let probe = act.probe();
        let ctx = ControlContext::builder()
            .with_actuator(act)
            .with_store(store.clone())
            .build()
            .unwrap();
        assert_eq!(store.stored(), Some(ControlRecord::default()));
        assert_eq!(probe.last(), 100);
        assert_eq!(probe.writes(), 1);
        assert_eq!(ctx.state().unwrap(), ControlState::floor(&ControlRecord::default()));
    }

    #[test]
    fn invalid_stored_record_is_rejected() {
        let bad = ControlRecord {
            min_duty: 800,
            ..ControlRecord::default()
        };
        let err = ControlContext::builder()
            .with_actuator(SimulatedActuator::new())
            .with_store(MemoryStore::with_record(bad))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidRecord(_)));
    }

    #[test]
    fn unreadable_store_is_a_store_error() {
        let store = MemoryStore::with_record(ControlRecord::default());
        store.fail_reads(true);
        let err = ControlContext::builder()
            .with_actuator(SimulatedActuator::new())
            .with_store(store)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::Store(_)));
    }

    #[test]
    fn actuator_failure_at_startup_is_reported() {
        let err = ControlContext::builder()
            .with_actuator(crate::mocks::FailingActuator)
            .with_store(MemoryStore::new(ControlRecord::default()))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::Hardware("hardware fault: actuator offline".into())
        );
    }
}
