use std::fs;

use super::die;

pub fn settings_export() {
    print!("{}", livefix_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        livefix_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: service.endpoint={}, detection.debounce_ms={}, suggestion.visible_ms={}, cache.max_entries={}",
        s.service.endpoint, s.detection.debounce_ms, s.suggestion.visible_ms, s.cache.max_entries
    );
}
