//! Target-script detection.
//!
//! The engine only ever corrects Tamil text. Detection is a fixed block
//! check; it does not try to tell languages sharing the block apart.

use std::ops::RangeInclusive;

/// The Tamil block, U+0B80..U+0BFF.
pub const TARGET_SCRIPT: RangeInclusive<char> = '\u{0B80}'..='\u{0BFF}';

pub fn is_target_script(c: char) -> bool {
    TARGET_SCRIPT.contains(&c)
}

/// True when `s` contains at least one target-script codepoint.
pub fn contains_target_script(s: &str) -> bool {
    s.chars().any(is_target_script)
}
