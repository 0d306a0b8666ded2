#![no_main]

use dimcal::config::CalibrationConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parsing and validation must reject bad input with an error, never a panic
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(config) = CalibrationConfig::from_toml_str(input) {
            let _ = config.reseed_target();
            let _ = config.admin_base_url();
        }
    }
});
