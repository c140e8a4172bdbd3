//! Test and helper mocks for speedctl_core

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use speedctl_config::ControlRecord;

use crate::store::ConfigStore;

/// In-memory store. Clones share the same slot, so a test can keep one
/// handle to inspect what the engine persisted and to inject failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<ControlRecord>>>,
    defaults: ControlRecord,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Empty store; the first `load_or_seed` writes `defaults`.
    pub fn new(defaults: ControlRecord) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    /// Store already holding `record`.
    pub fn with_record(record: ControlRecord) -> Self {
        let s = Self::new(ControlRecord::default());
        s.put(record);
        s
    }

    /// Overwrite the stored record behind the engine's back.
    pub fn put(&self, record: ControlRecord) {
        if let Ok(mut g) = self.slot.lock() {
            *g = Some(record);
        }
    }

    pub fn stored(&self) -> Option<ControlRecord> {
        self.slot.lock().ok().and_then(|g| *g)
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::Relaxed);
    }

    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::Relaxed);
    }
}

impl ConfigStore for MemoryStore {
    fn load_config(&self) -> io::Result<ControlRecord> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(io::Error::other("memory store: read failure"));
        }
        self.stored()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "memory store: empty"))
    }

    fn save_config(&mut self, record: &ControlRecord) -> io::Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(io::Error::other("memory store: write failure"));
        }
        self.put(*record);
        Ok(())
    }

    fn load_defaults(&self) -> ControlRecord {
        self.defaults
    }
}

/// An actuator that rejects every write; useful for exercising the
/// hardware-fault path.
pub struct FailingActuator;

impl speedctl_traits::Actuator for FailingActuator {
    fn set_duty(
        &mut self,
        _channel: u8,
        _value: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(io::Error::other("actuator offline")))
    }
}
