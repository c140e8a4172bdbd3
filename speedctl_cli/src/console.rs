//! JSON-lines control console.
//!
//! One request object per input line, one response object per output line.
//! Every response carries `status` (200, 400 or 500); failures add `reason`
//! and `error`.

use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Deserialize;
use serde_json::{Value, json};
use speedctl_config::RecordPatch;
use speedctl_core::{ControlContext, ControlError, ControlState, Oscillator};

use crate::error_fmt::{reason_name, status_for};

#[derive(Debug, Deserialize)]
pub struct StepArgs {
    #[serde(rename = "stepSize", default)]
    step_size: Option<i64>,
    #[serde(default)]
    calib: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    Increase(StepArgs),
    Decrease(StepArgs),
    Zero,
    CalibrateMin {
        #[serde(rename = "minSpeedUnit", default)]
        speed: Option<i64>,
    },
    CalibrateMax {
        #[serde(rename = "maxSpeedUnit", default)]
        speed: Option<i64>,
    },
    SaveConfig {
        #[serde(default)]
        config: RecordPatch,
    },
    /// Drag an oscillation bound from one step to another, swapping the
    /// bounds when they cross.
    MoveOscBound {
        from: u32,
        to: u32,
    },
    LoadConfig,
    ResetConfig,
    ProgramStart,
    ProgramStop,
    Status,
}

impl Request {
    fn name(&self) -> &'static str {
        match self {
            Self::Increase(_) => "increase",
            Self::Decrease(_) => "decrease",
            Self::Zero => "zero",
            Self::CalibrateMin { .. } => "calibrateMin",
            Self::CalibrateMax { .. } => "calibrateMax",
            Self::SaveConfig { .. } => "saveConfig",
            Self::MoveOscBound { .. } => "moveOscBound",
            Self::LoadConfig => "loadConfig",
            Self::ResetConfig => "resetConfig",
            Self::ProgramStart => "programStart",
            Self::ProgramStop => "programStop",
            Self::Status => "status",
        }
    }
}

fn positive_steps(v: Option<i64>) -> Result<u32, ControlError> {
    match v {
        Some(n) if n > 0 => u32::try_from(n)
            .map_err(|_| ControlError::InvalidInput(format!("stepSize {n} is too large"))),
        _ => Err(ControlError::InvalidInput(
            "stepSize must be a positive integer".into(),
        )),
    }
}

fn speed_arg(v: Option<i64>, key: &str) -> Result<u32, ControlError> {
    v.and_then(|n| u32::try_from(n).ok()).ok_or_else(|| {
        ControlError::InvalidInput(format!("{key} must be a non-negative integer"))
    })
}

fn position(s: ControlState) -> Value {
    json!({ "currentDuty": s.current_duty, "currentStep": s.current_step })
}

/// Request dispatcher bound to one control context and its oscillator.
#[derive(Clone)]
pub struct Console {
    ctx: ControlContext,
    osc: Arc<Mutex<Oscillator>>,
}

impl Console {
    pub fn new(ctx: ControlContext) -> Self {
        let osc = Arc::new(Mutex::new(Oscillator::new(ctx.clone())));
        Self { ctx, osc }
    }

    fn oscillator(&self) -> Result<MutexGuard<'_, Oscillator>, ControlError> {
        self.osc.lock().map_err(|_| ControlError::Poisoned)
    }

    /// Parse and execute one request line, always producing a response.
    pub fn handle_line(&self, line: &str) -> Value {
        let req: Request = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable request");
                return json!({
                    "status": 400,
                    "reason": "InvalidInput",
                    "error": format!("bad request: {e}"),
                });
            }
        };
        let op = req.name();
        match self.dispatch(req) {
            Ok(mut body) => {
                body["status"] = json!(200);
                tracing::debug!(op, status = 200, "request handled");
                body
            }
            Err(e) => {
                let status = status_for(&e);
                tracing::warn!(op, status, error = %e, "request failed");
                json!({ "status": status, "reason": reason_name(&e), "error": e.to_string() })
            }
        }
    }

    fn dispatch(&self, req: Request) -> Result<Value, ControlError> {
        match req {
            Request::Increase(a) => {
                let steps = positive_steps(a.step_size)?;
                Ok(position(self.ctx.increment(steps, a.calib)?))
            }
            Request::Decrease(a) => {
                let steps = positive_steps(a.step_size)?;
                Ok(position(self.ctx.decrement(steps, a.calib)?))
            }
            Request::Zero => Ok(position(self.ctx.zero()?)),
            Request::CalibrateMin { speed } => {
                let speed = speed_arg(speed, "minSpeedUnit")?;
                let (pinned, s) = self.ctx.set_lower_bound(speed)?;
                Ok(json!({ "currentDuty": pinned, "currentStep": s.current_step }))
            }
            Request::CalibrateMax { speed } => {
                let speed = speed_arg(speed, "maxSpeedUnit")?;
                let (pinned, s) = self.ctx.set_upper_bound(speed)?;
                Ok(json!({ "currentDuty": pinned, "currentStep": s.current_step }))
            }
            Request::SaveConfig { config } => {
                let saved = self.ctx.save(&config)?;
                Ok(json!({ "config": saved }))
            }
            Request::MoveOscBound { from, to } => {
                let saved = self.ctx.move_osc_bound(from, to)?;
                Ok(json!({ "config": saved }))
            }
            Request::LoadConfig => {
                let (record, step) = self.ctx.load()?;
                Ok(json!({ "config": record, "currentStep": step }))
            }
            Request::ResetConfig => {
                let (record, step) = self.ctx.reset_to_defaults()?;
                Ok(json!({ "config": record, "currentStep": step }))
            }
            Request::ProgramStart => {
                let mut osc = self.oscillator()?;
                osc.start()?;
                Ok(json!({ "program": osc.state().as_str() }))
            }
            Request::ProgramStop => {
                let mut osc = self.oscillator()?;
                osc.stop();
                Ok(json!({ "program": osc.state().as_str() }))
            }
            Request::Status => {
                let program = self.oscillator()?.state();
                let snap = self.ctx.snapshot()?;
                Ok(json!({
                    "config": snap.record,
                    "currentStep": snap.state.current_step,
                    "currentDuty": snap.state.current_duty,
                    "totalSteps": snap.scale.total_steps,
                    "dutyPerStep": snap.scale.duty_per_step,
                    "program": program.as_str(),
                }))
            }
        }
    }

    /// Stop oscillating and park the actuator at the duty floor.
    pub fn shutdown(&self) {
        match self.oscillator() {
            Ok(mut osc) => osc.stop(),
            Err(e) => tracing::warn!(error = %e, "oscillator unavailable at shutdown"),
        }
        match self.ctx.zero() {
            Ok(s) => tracing::info!(duty = s.current_duty, "actuator parked"),
            Err(e) => tracing::warn!(error = %e, "failed to park actuator"),
        }
    }

    /// Serve requests until `input` is exhausted, then shut down.
    pub fn serve<R: BufRead, W: Write>(&self, input: R, mut output: W) -> eyre::Result<()> {
        tracing::info!("console ready");
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let resp = self.handle_line(&line);
            writeln!(output, "{resp}")?;
            output.flush()?;
        }
        tracing::info!("console input closed");
        self.shutdown();
        Ok(())
    }
}
