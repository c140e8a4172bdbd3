#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for the speed controller.
//!
//! - `ControlRecord` is the persisted operating record (JSON) and
//!   `RecordPatch` its partial form used for merges.
//! - `Config` is the TOML application config (PWM output, store location,
//!   logging, default record overrides) and is validated before use.
use serde::Deserialize;

pub mod record;

pub use record::{ControlRecord, RecordError, RecordPatch};

/// Largest PWM clock divider the BCM283x clock manager accepts.
const MAX_CLOCK_DIVIDER: u32 = 4095;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PwmCfg {
    /// Hardware PWM channel: 0 = BCM GPIO18 (physical pin 12), 1 = BCM GPIO19
    pub channel: u8,
    /// Divider applied to the 19.2 MHz PWM oscillator
    pub clock_divider: u32,
    /// Ticks per PWM period; duty values are expressed in these ticks
    pub range: u32,
}

impl Default for PwmCfg {
    fn default() -> Self {
        Self {
            channel: 0,
            clock_divider: 64,
            range: 1024,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreCfg {
    /// JSON file holding the persisted control record
    pub path: String,
}

impl Default for StoreCfg {
    fn default() -> Self {
        Self {
            path: "params.json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pwm: PwmCfg,
    #[serde(default)]
    pub store: StoreCfg,
    #[serde(default)]
    pub logging: Logging,
    /// Overrides applied on top of the built-in default record
    #[serde(default)]
    pub defaults: RecordPatch,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    /// The record used for first start and `reset`: built-in defaults with
    /// `[defaults]` overrides applied.
    pub fn default_record(&self) -> Result<ControlRecord, RecordError> {
        self.defaults.merge_onto(&ControlRecord::default())
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // PWM
        if self.pwm.channel > 1 {
            eyre::bail!("pwm.channel must be 0 or 1");
        }
        if self.pwm.clock_divider == 0 || self.pwm.clock_divider > MAX_CLOCK_DIVIDER {
            eyre::bail!("pwm.clock_divider must be in [1, {MAX_CLOCK_DIVIDER}]");
        }
        if self.pwm.range == 0 {
            eyre::bail!("pwm.range must be > 0");
        }

        // Store
        if self.store.path.trim().is_empty() {
            eyre::bail!("store.path must not be empty");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        // Defaults
        let record = self
            .default_record()
            .map_err(|e| eyre::eyre!("defaults: {e}"))?;
        if record.max_duty > self.pwm.range {
            eyre::bail!(
                "defaults.maxDuty ({}) exceeds pwm.range ({})",
                record.max_duty,
                self.pwm.range
            );
        }

        Ok(())
    }
}
