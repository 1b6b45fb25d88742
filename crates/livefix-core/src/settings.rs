//! Engine settings loaded from TOML.
//!
//! - `parse_settings_toml(toml)` parses and validates a complete document
//! - `Settings::default()` parses the embedded `default_settings.toml`
//! - `load_settings(path)` reads a file from disk
//!
//! There is no process-wide instance; each engine owns its `Settings`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::service::Operation;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub service: ServiceSettings,
    pub detection: DetectionSettings,
    pub suggestion: SuggestionSettings,
    pub cache: CacheSettings,
    pub overlay: OverlaySettings,
}

impl Default for Settings {
    fn default() -> Self {
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("embedded settings TOML must be valid")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSettings {
    pub endpoint: String,
    pub timeout_ms: u64,
    /// Number of background request workers.
    pub workers: usize,
    pub word_operation: Operation,
    pub sentence_operation: Operation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionSettings {
    /// Delay between a boundary trigger and word extraction. A newer trigger
    /// on the same surface restarts the delay.
    pub debounce_ms: u64,
    pub min_word_chars: usize,
    pub sentence_correction: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionSettings {
    /// How long a shown suggestion stays up before it expires.
    pub visible_ms: u64,
    /// How long the "applied" feedback overlay stays up.
    pub feedback_ms: u64,
    pub style: RenderStyle,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub max_entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverlaySettings {
    pub width: f32,
    pub height: f32,
    /// Gap between the field and an overlay placed below it.
    pub gap: f32,
    /// Minimum distance from the viewport's horizontal edges.
    pub margin: f32,
    /// Distance from the field's top edge to an overlay flipped above it.
    pub above_offset: f32,
    /// How far left of the word the overlay starts.
    pub word_lead: f32,
    /// Per-column width used when text cannot be measured by the host.
    pub fallback_char_width: f32,
}

/// How the host should draw a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStyle {
    Popup,
    DarkTooltip,
    SpellTooltip,
    SentenceTooltip,
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_settings_toml(&content)
}

fn invalid(field: &str, reason: &str) -> SettingsError {
    SettingsError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive {
        ($section:ident . $field:ident, $zero:expr) => {
            if !(s.$section.$field > $zero) {
                return Err(invalid(
                    concat!(stringify!($section), ".", stringify!($field)),
                    "must be positive",
                ));
            }
        };
    }

    if s.service.endpoint.trim().is_empty() {
        return Err(invalid("service.endpoint", "must not be empty"));
    }
    check_positive!(service.timeout_ms, 0);
    check_positive!(service.workers, 0);
    check_positive!(detection.min_word_chars, 0);
    check_positive!(suggestion.visible_ms, 0);
    check_positive!(cache.max_entries, 0);
    check_positive!(overlay.width, 0.0);
    check_positive!(overlay.height, 0.0);
    check_positive!(overlay.fallback_char_width, 0.0);

    for (field, value) in [
        ("overlay.gap", s.overlay.gap),
        ("overlay.margin", s.overlay.margin),
        ("overlay.above_offset", s.overlay.above_offset),
        ("overlay.word_lead", s.overlay.word_lead),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(field, "must be a finite non-negative number"));
        }
    }
    Ok(())
}
