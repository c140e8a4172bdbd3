#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core speed control logic (hardware-agnostic).
//!
//! All hardware interaction goes through `speedctl_traits::Actuator`, all
//! persistence through [`store::ConfigStore`].
//!
//! ## Architecture
//!
//! - **Scale**: step to duty conversion derived from the record (`scale`)
//! - **Step controller**: bounded increments and zeroing (`stepper`)
//! - **Calibration**: pin a speed bound to the live duty (`calibration`)
//! - **Oscillation**: timer-driven sweep between two step bounds (`oscillator`)
//! - **Persistence**: record store trait and JSON file store (`store`)
//!
//! [`ControlContext`] ties these together behind one lock. Every mutation is
//! validated before anything is persisted or written to the actuator, and
//! the control state only changes once the actuator accepted the new duty.

pub mod builder;
pub mod calibration;
pub mod context;
pub mod engine;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod oscillator;
pub mod scale;
pub mod state;
pub mod stepper;
pub mod store;

pub use builder::ControlContextBuilder;
pub use calibration::Bound;
pub use context::ControlContext;
pub use engine::Snapshot;
pub use error::{BuildError, ControlError, Result};
pub use oscillator::{Oscillator, ProgramState, Sweep};
pub use scale::StepScale;
pub use state::ControlState;
pub use stepper::Direction;
pub use store::{ConfigStore, JsonFileStore};
