#![no_main]
use libfuzzer_sys::fuzz_target;
use speedctl_config::{ControlRecord, RecordPatch};

fuzz_target!(|data: &str| {
    let Ok(record) = ControlRecord::from_json(data) else {
        return;
    };
    if record.validate().is_err() {
        return;
    }
    // Derived values and helpers must not panic on any valid record.
    let total = record.total_steps();
    let _ = record.speed_at_step(total);
    let fitted = record.fit_osc_range();
    assert!(fitted.max_osc_step <= total.max(1));
    let _ = record.move_osc_bound(record.max_osc_step, total);
    let _ = RecordPatch::from(record).merge_onto(&ControlRecord::default());
});
