//! # commhistory-settings
//!
//! Settings for history views, loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`HistorySettings::default()`]
//! 2. **User file**: `~/.commhistory/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `COMMHISTORY_*` overrides
//!
//! There is no global instance; callers load settings once and pass the
//! relevant sections to the model and telemetry setup.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = HistorySettings::default();
        assert_eq!(settings.grouping.phone_match_length, 7);
        assert_eq!(settings.logging.level, LogLevel::Info);
        assert!(!settings.logging.json);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn settings_path_ends_with_file_name() {
        let path = settings_path();
        assert!(path.ends_with(".commhistory/settings.json"));
    }
}
