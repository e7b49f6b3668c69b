//! Remote address normalization and matching.
//!
//! Phone numbers are compared on a fixed-length tail window after stripping
//! punctuation and post-dial sequences, so `+1 (555) 123-4567` and
//! `5551234567` refer to the same party. Anything that is not a phone number
//! (IM handles, email addresses) normalizes to the empty string and is
//! compared literally.

use serde::{Deserialize, Serialize};

/// Number of trailing digits compared when matching phone numbers.
pub const DEFAULT_MATCH_LENGTH: usize = 7;

const SEPARATORS: &[char] = &['(', ')', '-', '.', ' '];
const SERVICE_CODES: &[&str] = &["*31#", "#31#"];

/// Normalize a phone number for comparison.
///
/// Returns an empty string when `number` is not a dialable phone number.
pub fn normalize_phone_number(number: &str) -> String {
    let stripped: String = number.chars().filter(|c| !SEPARATORS.contains(c)).collect();

    if !stripped
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '#' | '*' | '+' | 'X' | 'x' | 'W' | 'w' | 'P' | 'p'))
    {
        return String::new();
    }

    // Everything from the first pause/wait/extension marker on is post-dial.
    let dialable = match stripped.find(['X', 'x', 'W', 'w', 'P', 'p']) {
        Some(cut) => &stripped[..cut],
        None => stripped.as_str(),
    };

    if dialable.contains('+') && SERVICE_CODES.iter().any(|code| dialable.contains(code)) {
        return String::new();
    }

    dialable.to_string()
}

/// Compares remote addresses using a trailing window of `match_length` digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressMatcher {
    pub match_length: usize,
}

impl Default for AddressMatcher {
    fn default() -> Self {
        Self {
            match_length: DEFAULT_MATCH_LENGTH,
        }
    }
}

impl AddressMatcher {
    pub fn new(match_length: usize) -> Self {
        Self { match_length }
    }

    /// True if `candidate` refers to the same party as `address`.
    ///
    /// Not symmetric for phone numbers shorter than the window: the tail of
    /// `address` must appear at the end of `candidate`.
    pub fn matches(&self, address: &str, candidate: &str) -> bool {
        let phone = normalize_phone_number(address);

        if phone.is_empty() {
            return address == candidate;
        }

        let tail = &phone[phone.len().saturating_sub(self.match_length)..];
        normalize_phone_number(candidate).ends_with(tail)
    }
}

/// One address entry of a contact card.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactAddress {
    /// Account the address belongs to. Empty matches every local account.
    pub local_address: String,
    pub remote_address: String,
}

impl ContactAddress {
    pub fn phone(number: impl Into<String>) -> Self {
        Self {
            local_address: String::new(),
            remote_address: number.into(),
        }
    }

    pub fn account(local_address: impl Into<String>, remote_address: impl Into<String>) -> Self {
        Self {
            local_address: local_address.into(),
            remote_address: remote_address.into(),
        }
    }
}

/// True if `(local, remote)` is reachable through any of `addresses`.
pub fn address_matches_list(
    matcher: &AddressMatcher,
    local: &str,
    remote: &str,
    addresses: &[ContactAddress],
) -> bool {
    addresses.iter().any(|address| {
        (address.local_address.is_empty() || address.local_address == local)
            && matcher.matches(remote, &address.remote_address)
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
