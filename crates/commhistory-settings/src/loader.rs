//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`HistorySettings::default()`]
//! 2. If `~/.commhistory/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate ranges
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use commhistory_core::CallSorting;
use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{HistorySettings, LogLevel, PHONE_MATCH_LENGTH_RANGE};

/// Resolve the path to the settings file (`~/.commhistory/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".commhistory").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<HistorySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or out-of-range values, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<HistorySettings> {
    let defaults = serde_json::to_value(HistorySettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: HistorySettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `COMMHISTORY_*` environment overrides.
///
/// Invalid values are ignored with a warning.
pub fn apply_env_overrides(settings: &mut HistorySettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
pub fn apply_overrides<F>(settings: &mut HistorySettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // ── Grouping ────────────────────────────────────────────────────
    let (min, max) = (*PHONE_MATCH_LENGTH_RANGE.start(), *PHONE_MATCH_LENGTH_RANGE.end());
    if let Some(v) = read_usize(&lookup, "COMMHISTORY_MATCH_LENGTH", min, max) {
        settings.grouping.phone_match_length = v;
    }
    if let Some(v) = read_parsed::<CallSorting, _>(&lookup, "COMMHISTORY_CALL_SORTING") {
        settings.grouping.call_sorting = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_parsed::<LogLevel, _>(&lookup, "COMMHISTORY_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read_bool(&lookup, "COMMHISTORY_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Readers (thin wrappers) ─────────────────────────────────────────────────

fn read_bool<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str) -> Option<bool> {
    let val = lookup(name)?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_usize<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str, min: usize, max: usize) -> Option<usize> {
    let val = lookup(name)?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
    }
    result
}

fn read_parsed<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: std::str::FromStr<Err = String>,
    F: Fn(&str) -> Option<String>,
{
    let val = lookup(name).filter(|v| !v.is_empty())?;
    match val.parse() {
        Ok(parsed) => Some(parsed),
        Err(reason) => {
            tracing::warn!(key = name, value = %val, %reason, "invalid env var, ignoring");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
