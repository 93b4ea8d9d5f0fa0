#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use mockupsim::config::{ConfigLimits, ConfigLoader};

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        let loader = ConfigLoader::new(ConfigLimits {
            max_config_size: 64 * 1024,
        });

        // Only panics matter here
        let _ = loader.load_str(yaml_str, Path::new("fuzz.yaml"));
    }
});
