//! Injector configuration.
//!
//! Settings come from code, from `FERROUS_WIRE_*` environment variables, or
//! (with the `config` feature) from JSON.

use std::env;
use std::time::Duration;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default prefix for environment variables.
pub const ENV_PREFIX: &str = "FERROUS_WIRE";

/// Runtime knobs for a [`DependencyInjector`](crate::DependencyInjector).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ferrous_wire::InjectorConfig;
///
/// let config = InjectorConfig::default()
///     .trace_attachments(true)
///     .slow_resolution_threshold(Duration::from_millis(5));
/// assert!(config.trace_attachments);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct InjectorConfig {
    /// Log every attached and skipped capability at `debug` instead of `trace`
    pub trace_attachments: bool,
    /// Resolutions taking at least this long are logged at `warn`
    #[cfg_attr(feature = "config", serde(rename = "slow_resolution_ms", with = "millis"))]
    pub slow_resolution_threshold: Duration,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            trace_attachments: false,
            slow_resolution_threshold: Duration::from_millis(50),
        }
    }
}

impl InjectorConfig {
    pub fn trace_attachments(mut self, enabled: bool) -> Self {
        self.trace_attachments = enabled;
        self
    }

    pub fn slow_resolution_threshold(mut self, threshold: Duration) -> Self {
        self.slow_resolution_threshold = threshold;
        self
    }

    /// Reads `FERROUS_WIRE_TRACE_ATTACHMENTS` and
    /// `FERROUS_WIRE_SLOW_RESOLUTION_MS` over the defaults.
    pub fn from_env() -> Self {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Like [`from_env`](Self::from_env) with a custom variable prefix.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn from_env_with_prefix(prefix: &str) -> Self {
        let mut config = Self::default();
        let prefix = prefix.to_uppercase();

        let name = format!("{prefix}_TRACE_ATTACHMENTS");
        if let Ok(value) = env::var(&name) {
            match parse_bool(&value) {
                Some(enabled) => config.trace_attachments = enabled,
                None => warn!(variable = %name, %value, "ignoring unparsable boolean"),
            }
        }

        let name = format!("{prefix}_SLOW_RESOLUTION_MS");
        if let Ok(value) = env::var(&name) {
            match value.trim().parse::<u64>() {
                Ok(ms) => config.slow_resolution_threshold = Duration::from_millis(ms),
                Err(_) => warn!(variable = %name, %value, "ignoring unparsable duration"),
            }
        }

        config
    }

    /// Parses a JSON document such as
    /// `{"trace_attachments": true, "slow_resolution_ms": 10}`.
    /// Missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(feature = "config")]
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
