//! # commhistory-telemetry
//!
//! Installs the process-wide `tracing` subscriber: an [`EnvFilter`] built
//! from a default level plus per-module overrides (`RUST_LOG` wins when set)
//! and a fmt layer writing JSON lines or human-readable output to stderr.

#![deny(unsafe_code)]

use commhistory_settings::{LogLevel, LoggingSettings};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by `RUST_LOG`.
    pub log_level: Level,
    /// Per-module level overrides (e.g. `"commhistory_model" => DEBUG`).
    pub module_levels: Vec<(String, Level)>,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self {
            log_level: to_level(settings.level),
            module_levels: settings
                .modules
                .iter()
                .map(|(module, level)| (module.clone(), to_level(*level)))
                .collect(),
            json: settings.json,
        }
    }

    /// Filter directives equivalent to this configuration.
    pub fn filter_directives(&self) -> String {
        let mut directives = self.log_level.as_str().to_lowercase();
        for (module, level) in &self.module_levels {
            directives.push(',');
            directives.push_str(module);
            directives.push('=');
            directives.push_str(&level.as_str().to_lowercase());
        }
        directives
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

fn to_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

/// Initialize the telemetry subsystem. Call once at startup.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    let json_layer = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!config.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn default_directives_are_info() {
        assert_eq!(TelemetryConfig::default().filter_directives(), "info");
    }

    #[test]
    fn module_levels_become_directives() {
        let config = TelemetryConfig {
            log_level: Level::WARN,
            module_levels: vec![
                ("commhistory_model".into(), Level::DEBUG),
                ("commhistory_settings::loader".into(), Level::TRACE),
            ],
            json: false,
        };
        assert_eq!(
            config.filter_directives(),
            "warn,commhistory_model=debug,commhistory_settings::loader=trace"
        );
        assert!(EnvFilter::try_new(config.filter_directives()).is_ok());
    }

    #[test]
    fn from_settings_maps_levels() {
        let settings = LoggingSettings {
            level: LogLevel::Debug,
            json: true,
            modules: BTreeMap::from([("commhistory_model::engine".to_string(), LogLevel::Trace)]),
        };
        let config = TelemetryConfig::from_settings(&settings);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.module_levels, vec![("commhistory_model::engine".to_string(), Level::TRACE)]);
        assert!(config.json);
    }
}
