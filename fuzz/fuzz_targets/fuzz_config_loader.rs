#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // TOML parsing and validation of Config must reject bad input without panicking.
    if let Ok(cfg) = speedctl_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // A validated config always yields a valid default record.
            let record = cfg.default_record().unwrap();
            record.validate().unwrap();
        }
    }
});
