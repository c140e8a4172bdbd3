mod cli;
mod console;
mod error_fmt;
mod logging;

use std::io::Write;

use clap::Parser;
use eyre::WrapErr;
use speedctl_config::{Config, ControlRecord};
use speedctl_core::{ConfigStore, ControlContext, JsonFileStore, StepScale};
use speedctl_traits::Actuator;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::console::Console;
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error hooks: {e}");
    }

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "speedctl failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    let text = std::fs::read_to_string(&cli.config)
        .wrap_err_with(|| format!("read config {}", cli.config.display()))?;
    let cfg = speedctl_config::load_toml(&text).wrap_err("parse config")?;
    cfg.validate().wrap_err("invalid config")?;

    logging::init(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::info!(
        config = %cli.config.display(),
        store = %cfg.store.path,
        channel = cfg.pwm.channel,
        "speedctl starting"
    );

    let defaults = cfg.default_record()?;
    match cli.cmd {
        Commands::Console => run_console(&cfg, defaults),
        Commands::Show => show(&cfg, defaults, cli.json),
        Commands::Reset => reset(&cfg, defaults, cli.json),
        Commands::SelfCheck => self_check(&cfg, defaults),
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_actuator(cfg: &Config) -> eyre::Result<Box<dyn Actuator + Send>> {
    let hw = speedctl_hardware::HardwareActuator::new(
        cfg.pwm.channel,
        cfg.pwm.clock_divider,
        cfg.pwm.range,
    )
    .wrap_err("open pwm")?;
    Ok(Box::new(hw))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_actuator(cfg: &Config) -> eyre::Result<Box<dyn Actuator + Send>> {
    tracing::info!(
        channel = cfg.pwm.channel,
        "using simulated actuator (build with --features hardware for PWM output)"
    );
    Ok(Box::new(speedctl_hardware::SimulatedActuator::new()))
}

fn open_context(cfg: &Config, defaults: ControlRecord) -> eyre::Result<ControlContext> {
    let ctx = ControlContext::builder()
        .with_actuator(open_actuator(cfg)?)
        .with_store(JsonFileStore::new(&cfg.store.path, defaults))
        .with_channel(cfg.pwm.channel)
        .build()?;
    Ok(ctx)
}

fn run_console(cfg: &Config, defaults: ControlRecord) -> eyre::Result<()> {
    let console = Console::new(open_context(cfg, defaults)?);

    let on_signal = console.clone();
    ctrlc::set_handler(move || {
        tracing::info!("interrupt received, parking actuator");
        on_signal.shutdown();
        std::process::exit(130);
    })
    .wrap_err("install Ctrl-C handler")?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    console.serve(stdin.lock(), stdout.lock())
}

/// Stored record, or the defaults when nothing has been persisted yet.
fn stored_or_defaults(store: &JsonFileStore) -> eyre::Result<(ControlRecord, bool)> {
    match store.load_config() {
        Ok(r) => Ok((r, true)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok((store.load_defaults(), false)),
        Err(e) => Err(speedctl_core::ControlError::from(e).into()),
    }
}

fn show(cfg: &Config, defaults: ControlRecord, json: bool) -> eyre::Result<()> {
    let store = JsonFileStore::new(&cfg.store.path, defaults);
    let (record, persisted) = stored_or_defaults(&store)?;
    record
        .validate()
        .map_err(speedctl_core::ControlError::from)?;
    let scale = StepScale::from_record(&record);

    let table: Vec<(u32, u32, u32)> = (0..=scale.total_steps)
        .map(|i| {
            let duty = if i == scale.total_steps {
                record.max_duty
            } else {
                record
                    .min_duty
                    .saturating_add(scale.duty_delta(record.step_size).saturating_mul(i))
                    .min(record.max_duty)
            };
            (i, record.speed_at_step(i), duty)
        })
        .collect();

    let mut out = std::io::stdout().lock();
    if json {
        let steps: Vec<_> = table
            .iter()
            .map(|&(step, speed, duty)| serde_json::json!({ "step": step, "speed": speed, "duty": duty }))
            .collect();
        let doc = serde_json::json!({
            "path": store.path().display().to_string(),
            "persisted": persisted,
            "config": record,
            "totalSteps": scale.total_steps,
            "dutyPerStep": scale.duty_per_step,
            "steps": steps,
        });
        writeln!(out, "{doc}")?;
        return Ok(());
    }

    let origin = if persisted { "" } else { " (not yet persisted, showing defaults)" };
    writeln!(out, "record: {}{origin}", store.path().display())?;
    writeln!(
        out,
        "  speed      {} .. {} (step {})",
        record.min_speed, record.max_speed, record.step_size
    )?;
    writeln!(out, "  duty       {} .. {}", record.min_duty, record.max_duty)?;
    writeln!(
        out,
        "  program    steps {} .. {} every {} ms",
        record.min_osc_step, record.max_osc_step, record.interval_ms
    )?;
    writeln!(
        out,
        "  scale      {} steps, {} duty/unit",
        scale.total_steps, scale.duty_per_step
    )?;
    writeln!(out, "{:>6} {:>8} {:>6}", "step", "speed", "duty")?;
    for (step, speed, duty) in table {
        let mark = if (record.min_osc_step..=record.max_osc_step).contains(&step) {
            " *"
        } else {
            ""
        };
        writeln!(out, "{step:>6} {speed:>8} {duty:>6}{mark}")?;
    }
    Ok(())
}

fn reset(cfg: &Config, defaults: ControlRecord, json: bool) -> eyre::Result<()> {
    let mut store = JsonFileStore::new(&cfg.store.path, defaults);
    store
        .save_config(&defaults)
        .map_err(speedctl_core::ControlError::from)?;
    tracing::info!(path = %store.path().display(), "record reset to defaults");
    let mut out = std::io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::json!({ "config": defaults }))?;
    } else {
        writeln!(out, "reset {} to defaults", store.path().display())?;
    }
    Ok(())
}

fn self_check(cfg: &Config, defaults: ControlRecord) -> eyre::Result<()> {
    let ctx = open_context(cfg, defaults)?;
    let snap = ctx.snapshot()?;
    tracing::info!(
        total_steps = snap.scale.total_steps,
        duty = snap.state.current_duty,
        "self-check passed"
    );
    println!("OK");
    Ok(())
}
