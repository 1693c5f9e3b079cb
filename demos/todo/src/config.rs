//! Configuration management for the todo application.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unset or blank variables fall back to the default; present but invalid
//! values are errors rather than silently ignored.

use crate::reducer::ReducerMode;
use crate::types::{Theme, TodoState};
use serde::{Deserialize, Serialize};
use statekit_runtime::{DEFAULT_BROADCAST_CAPACITY, StoreConfig};
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Initial theme (`light` or `dark`)
pub const THEME_VAR: &str = "TODO_THEME";
/// Reducer mode (`full` or `legacy`)
pub const MODE_VAR: &str = "TODO_REDUCER_MODE";
/// Buffered actions per action subscriber (positive integer)
pub const BROADCAST_CAPACITY_VAR: &str = "TODO_BROADCAST_CAPACITY";

/// Configuration error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to something unusable
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Environment variable name
        key: &'static str,
        /// Raw value found
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoConfig {
    /// Theme the list starts with
    pub theme: Theme,
    /// Which transitions the reducer implements
    pub mode: ReducerMode,
    /// Action broadcast capacity for the store
    pub broadcast_capacity: usize,
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            mode: ReducerMode::Full,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl TodoConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let broadcast_capacity = parse_var(&lookup, BROADCAST_CAPACITY_VAR)?
            .unwrap_or(defaults.broadcast_capacity);
        if broadcast_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: BROADCAST_CAPACITY_VAR,
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            theme: parse_var(&lookup, THEME_VAR)?.unwrap_or(defaults.theme),
            mode: parse_var(&lookup, MODE_VAR)?.unwrap_or(defaults.mode),
            broadcast_capacity,
        })
    }

    /// Store settings derived from this configuration
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default().with_broadcast_capacity(self.broadcast_capacity)
    }

    /// Empty list in the configured theme
    #[must_use]
    pub const fn initial_state(&self) -> TodoState {
        TodoState::with_theme(self.theme)
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse()
        .map(Some)
        .map_err(|error: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: error.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = TodoConfig::from_lookup(lookup(&[])).unwrap_or_default();
        assert_eq!(config, TodoConfig::default());
        assert_eq!(config.initial_state(), TodoState::new());
    }

    #[test]
    fn reads_every_variable() {
        let config = TodoConfig::from_lookup(lookup(&[
            (THEME_VAR, "dark"),
            (MODE_VAR, "legacy"),
            (BROADCAST_CAPACITY_VAR, "64"),
        ]));

        assert_eq!(
            config,
            Ok(TodoConfig {
                theme: Theme::Dark,
                mode: ReducerMode::Legacy,
                broadcast_capacity: 64,
            })
        );
    }

    #[test]
    fn blank_values_fall_back() {
        let config = TodoConfig::from_lookup(lookup(&[(THEME_VAR, "  ")]));
        assert_eq!(config.map(|c| c.theme), Ok(Theme::Light));
    }

    #[test]
    fn rejects_invalid_theme() {
        let err = TodoConfig::from_lookup(lookup(&[(THEME_VAR, "sepia")]));
        assert!(matches!(err, Err(ConfigError::Invalid { key: THEME_VAR, .. })));
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = TodoConfig::from_lookup(lookup(&[(BROADCAST_CAPACITY_VAR, "0")]));
        assert!(matches!(
            err,
            Err(ConfigError::Invalid {
                key: BROADCAST_CAPACITY_VAR,
                ..
            })
        ));
    }

    #[test]
    fn rejects_non_numeric_capacity() {
        let err = TodoConfig::from_lookup(lookup(&[(BROADCAST_CAPACITY_VAR, "lots")]));
        assert!(err.is_err());
    }

    #[test]
    fn store_config_carries_capacity() {
        let config = TodoConfig {
            broadcast_capacity: 128,
            ..TodoConfig::default()
        };
        assert_eq!(config.store_config().broadcast_capacity, 128);
    }
}
