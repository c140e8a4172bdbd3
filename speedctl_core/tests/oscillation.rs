//! Oscillation mode: deterministic sweep ticks and worker thread lifecycle.

use speedctl_config::ControlRecord;
use speedctl_core::mocks::MemoryStore;
use speedctl_core::{ControlContext, Direction, Oscillator, ProgramState, Sweep};
use speedctl_hardware::SimulatedActuator;
use std::time::Duration;

fn context_with(record: ControlRecord) -> ControlContext {
    ControlContext::builder()
        .with_actuator(SimulatedActuator::new())
        .with_store(MemoryStore::with_record(record))
        .build()
        .unwrap()
}

#[test]
fn steady_state_stays_within_oscillation_bounds() {
    let ctx = context_with(ControlRecord::default());
    let (mut sweep, interval) = ctx.begin_sweep().unwrap();
    assert_eq!(sweep.direction(), Direction::Up);
    assert_eq!(interval, Duration::from_millis(1000));

    let mut seen = Vec::new();
    for _ in 0..200 {
        seen.push(ctx.sweep_tick(&mut sweep).unwrap().current_step);
    }
    // The first ticks climb from step 0 into the range.
    let steady = &seen[30..];
    assert!(steady.iter().all(|s| (10..=20).contains(s)), "{steady:?}");
    assert_eq!(steady.iter().min(), Some(&10));
    assert_eq!(steady.iter().max(), Some(&19));
}

#[test]
fn sweep_starts_downward_above_the_range() {
    let ctx = context_with(ControlRecord::default());
    for _ in 0..25 {
        ctx.increment(25, false).unwrap();
    }
    let (mut sweep, _) = ctx.begin_sweep().unwrap();
    assert_eq!(sweep.direction(), Direction::Down);
    let s = ctx.sweep_tick(&mut sweep).unwrap();
    assert_eq!(s.current_step, 24);
}

#[test]
fn degenerate_range_hovers_without_panicking() {
    // Validation keeps such a record out of the context; the sweep itself
    // must still cope with it.
    let bent = ControlRecord {
        min_osc_step: 5,
        max_osc_step: 5,
        ..ControlRecord::default()
    };
    let mut sweep = Sweep::starting_at(5, &bent);
    let mut step = 5u32;
    for _ in 0..20 {
        step = match sweep.advance(step, &bent) {
            Direction::Up => step + 1,
            Direction::Down => step.saturating_sub(1),
        };
        assert!((3..=5).contains(&step), "step {step}");
    }

    let flat = ControlRecord {
        min_osc_step: 0,
        max_osc_step: 0,
        ..ControlRecord::default()
    };
    let mut sweep = Sweep::starting_at(0, &flat);
    assert_eq!(sweep.advance(0, &flat), Direction::Down);
}

#[test]
fn worker_ticks_and_stops() {
    let ctx = context_with(ControlRecord {
        interval_ms: 5,
        ..ControlRecord::default()
    });
    let mut osc = Oscillator::new(ctx.clone());
    assert_eq!(osc.state(), ProgramState::Idle);

    osc.start().unwrap();
    assert_eq!(osc.state(), ProgramState::Sweeping);
    // Second start is a no-op.
    osc.start().unwrap();
    assert_eq!(osc.state(), ProgramState::Sweeping);

    std::thread::sleep(Duration::from_millis(200));
    osc.stop();
    assert_eq!(osc.state(), ProgramState::Idle);

    let after_stop = ctx.state().unwrap();
    assert!(after_stop.current_step > 0);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(ctx.state().unwrap(), after_stop);

    // Stopping twice is harmless.
    osc.stop();
}

#[test]
fn dropping_the_oscillator_joins_the_worker() {
    let ctx = context_with(ControlRecord {
        interval_ms: 2,
        ..ControlRecord::default()
    });
    for _ in 0..10 {
        let mut osc = Oscillator::new(ctx.clone());
        osc.start().unwrap();
        std::thread::sleep(Duration::from_millis(5));
        drop(osc);
    }
    let settled = ctx.state().unwrap();
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(ctx.state().unwrap(), settled);
}

#[test]
fn requests_interleave_with_sweeping() {
    let ctx = context_with(ControlRecord {
        interval_ms: 3,
        ..ControlRecord::default()
    });
    let mut osc = Oscillator::new(ctx.clone());
    osc.start().unwrap();
    for _ in 0..20 {
        let s = ctx.zero().unwrap();
        assert_eq!(s.current_step, 0);
        std::thread::sleep(Duration::from_millis(1));
    }
    osc.stop();
    let s = ctx.state().unwrap();
    assert!(s.within(&ctx.record().unwrap()));
}
