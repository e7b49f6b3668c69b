//! Settings type definitions.
//!
//! All types use camelCase field names and implement [`Default`]. Every
//! struct is `#[serde(default)]`, so partial JSON fills in the rest.

mod grouping;
mod logging;

pub use grouping::*;
pub use logging::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "grouping": { "phoneMatchLength": 9, "callSorting": "by_time" },
///   "logging": { "level": "debug", "modules": { "commhistory_model": "trace" } }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistorySettings {
    pub grouping: GroupingSettings,
    pub logging: LoggingSettings,
}

impl HistorySettings {
    /// Reject values that parse but cannot be used.
    pub fn validate(&self) -> Result<()> {
        let length = self.grouping.phone_match_length;
        if !PHONE_MATCH_LENGTH_RANGE.contains(&length) {
            return Err(SettingsError::InvalidValue(format!(
                "grouping.phoneMatchLength must be within {}..={}, got {length}",
                PHONE_MATCH_LENGTH_RANGE.start(),
                PHONE_MATCH_LENGTH_RANGE.end()
            )));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use commhistory_core::CallSorting;

    #[test]
    fn partial_json_keeps_defaults() {
        let json = serde_json::json!({ "grouping": { "callSorting": "by_time" } });
        let settings: HistorySettings = serde_json::from_value(json).unwrap();
        assert_eq!(settings.grouping.call_sorting, CallSorting::ByTime);
        assert_eq!(settings.grouping.phone_match_length, 7);
        assert_eq!(settings.logging, LoggingSettings::default());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(HistorySettings::default()).unwrap();
        assert!(json["grouping"].get("phoneMatchLength").is_some());
        assert!(json["grouping"].get("callSorting").is_some());
        assert_eq!(json["logging"]["level"], "info");
    }

    #[test]
    fn validate_rejects_zero_window() {
        let mut settings = HistorySettings::default();
        settings.grouping.phone_match_length = 0;
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidValue(_))));
    }
}
