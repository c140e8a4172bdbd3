//! Human-readable error descriptions and structured JSON error formatting.

use speedctl_core::error::{BuildError, ControlError};

/// Stable name of a control error kind, used as `reason` in JSON output.
pub fn reason_name(e: &ControlError) -> &'static str {
    match e {
        ControlError::InvalidInput(_) => "InvalidInput",
        ControlError::InvalidCalibration(_) => "InvalidCalibration",
        ControlError::InvalidConfig(_) => "InvalidConfig",
        ControlError::Io(_) => "Io",
        ControlError::HardwareFault(_) => "HardwareFault",
        ControlError::Poisoned => "Poisoned",
    }
}

/// Console status code for a failed request.
pub fn status_for(e: &ControlError) -> u16 {
    match e {
        ControlError::InvalidInput(_) | ControlError::InvalidCalibration(_) => 400,
        _ => 500,
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingActuator | BuildError::MissingStore => format!(
                "What happened: {be}.\nLikely causes: The controller was assembled without all collaborators.\nHow to fix: This is a bug in the binary; please report it."
            ),
            BuildError::InvalidRecord(e) => format!(
                "What happened: The persisted record is invalid ({e}).\nLikely causes: params.json was edited by hand or written by an incompatible tool.\nHow to fix: Fix the file, or run `speedctl reset` to restore the configured defaults."
            ),
            BuildError::Store(msg) => format!(
                "What happened: The record store could not be opened ({msg}).\nLikely causes: Wrong [store].path, missing permissions, or a corrupt JSON file.\nHow to fix: Check [store].path in the config and the file's contents."
            ),
            BuildError::Hardware(msg) => format!(
                "What happened: The initial duty write failed ({msg}).\nLikely causes: PWM not enabled in the device tree or insufficient permissions.\nHow to fix: Enable the pwm overlay, check [pwm].channel, and run with access to /sys/class/pwm."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<ControlError>() {
        return match ce {
            ControlError::InvalidConfig(e) => format!(
                "What happened: The record violates an invariant ({e}).\nLikely causes: A saved or loaded value is out of range.\nHow to fix: Correct the offending field and retry."
            ),
            ControlError::Io(msg) => format!(
                "What happened: Persistence failed ({msg}).\nLikely causes: Disk full, read-only filesystem, or missing permissions.\nHow to fix: Check [store].path and the filesystem, then retry."
            ),
            ControlError::HardwareFault(msg) => format!(
                "What happened: The actuator rejected a duty write ({msg}).\nLikely causes: PWM device gone or misconfigured.\nHow to fix: Check wiring and [pwm] settings; re-run with --log-level=debug."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: {msg}.\nLikely causes: Wrong --config path.\nHow to fix: Pass --config FILE or create etc/speedctl.toml."
        );
    }

    if lower.contains("parse config") || lower.contains("invalid config") {
        let mut cause = String::new();
        if let Some(src) = err.source() {
            cause = format!(" ({src})");
        }
        return format!(
            "What happened: Configuration is invalid{cause}.\nLikely causes: Out-of-range [pwm] values, empty [store].path, or [defaults] breaking record invariants.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable process exit codes per error kind; anything untyped returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(ce) = err.downcast_ref::<ControlError>() {
        return match ce {
            ControlError::InvalidInput(_) | ControlError::InvalidCalibration(_) => 3,
            ControlError::InvalidConfig(_) => 4,
            ControlError::Io(_) => 5,
            ControlError::HardwareFault(_) => 6,
            ControlError::Poisoned => 1,
        };
    }
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidRecord(_) => 4,
            BuildError::Store(_) => 5,
            BuildError::Hardware(_) => 6,
            BuildError::MissingActuator | BuildError::MissingStore => 1,
        };
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = if let Some(ce) = err.downcast_ref::<ControlError>() {
        reason_name(ce)
    } else if let Some(be) = err.downcast_ref::<BuildError>() {
        match be {
            BuildError::InvalidRecord(_) => "InvalidConfig",
            BuildError::Store(_) => "Io",
            BuildError::Hardware(_) => "HardwareFault",
            BuildError::MissingActuator | BuildError::MissingStore => "Build",
        }
    } else {
        "Error"
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
