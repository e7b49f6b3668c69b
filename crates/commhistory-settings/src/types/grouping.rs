use std::ops::RangeInclusive;

use commhistory_core::{AddressMatcher, CallSorting, DEFAULT_MATCH_LENGTH};
use serde::{Deserialize, Serialize};

/// Accepted trailing-window widths for phone number matching.
pub const PHONE_MATCH_LENGTH_RANGE: RangeInclusive<usize> = 1..=32;

/// Call grouping configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupingSettings {
    /// Number of trailing digits compared when matching phone numbers.
    pub phone_match_length: usize,
    /// Grouping used by the call history.
    pub call_sorting: CallSorting,
}

impl Default for GroupingSettings {
    fn default() -> Self {
        Self {
            phone_match_length: DEFAULT_MATCH_LENGTH,
            call_sorting: CallSorting::ByContact,
        }
    }
}

impl GroupingSettings {
    pub fn matcher(&self) -> AddressMatcher {
        AddressMatcher::new(self.phone_match_length)
    }
}
