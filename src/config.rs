//! Container configuration.
//!
//! Settings can come from code, from the environment, or (with the `config`
//! feature) from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};

const DEFAULT_ENV_PREFIX: &str = "CONTAINER";

/// Resolution limits and guards.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{Container, ContainerConfig};
///
/// let config = ContainerConfig::new().with_max_depth(64);
/// let container = Container::with_config(config);
/// assert_eq!(container.config().max_depth, 64);
/// assert!(container.config().detect_cycles);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerConfig {
    /// Fail with `Circular` when a concrete is re-entered on the build stack
    pub detect_cycles: bool,
    /// Maximum nesting of `resolve` calls before `DepthExceeded`
    pub max_depth: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            detect_cycles: true,
            max_depth: 256,
        }
    }
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cycle_detection(mut self, enabled: bool) -> Self {
        self.detect_cycles = enabled;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Reads `CONTAINER_DETECT_CYCLES` and `CONTAINER_MAX_DEPTH`.
    pub fn from_env() -> DiResult<Self> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Reads `{PREFIX}_DETECT_CYCLES` and `{PREFIX}_MAX_DEPTH`; unset values keep their defaults.
    pub fn from_env_with_prefix(prefix: &str) -> DiResult<Self> {
        Self::from_lookup(prefix, |name| env::var(name).ok())
    }

    fn from_lookup<F>(prefix: &str, lookup: F) -> DiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let prefix = prefix.to_uppercase();

        let name = format!("{}_DETECT_CYCLES", prefix);
        if let Some(raw) = lookup(&name) {
            config.detect_cycles = parse_bool(&raw)
                .ok_or_else(|| DiError::InvalidConfig(format!("{} = {:?}", name, raw)))?;
        }

        let name = format!("{}_MAX_DEPTH", prefix);
        if let Some(raw) = lookup(&name) {
            config.max_depth = raw
                .trim()
                .parse()
                .map_err(|_| DiError::InvalidConfig(format!("{} = {:?}", name, raw)))?;
        }

        Ok(config)
    }

    /// Parses a JSON object; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|e| DiError::InvalidConfig(e.to_string()))
    }

    #[cfg(feature = "config")]
    pub fn to_json_string(&self) -> DiResult<String> {
        serde_json::to_string(self).map_err(|e| DiError::InvalidConfig(e.to_string()))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
