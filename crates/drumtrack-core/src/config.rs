//! Tracker configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults:
//!
//! - `DRUMTRACK_RETURN_POLICY` - `cumulative` (default) or `per_request`
//! - `DRUMTRACK_MAX_LINE_ITEMS` - lines per sale submission (default: 100)
//! - `DRUMTRACK_MAX_LINE_QUANTITY` - drums per line (default: 999)
//!
//! The 30-day return window is not configurable; see
//! [`RETURN_WINDOW_DAYS`](crate::RETURN_WINDOW_DAYS).

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::{MAX_LINE_ITEMS, MAX_LINE_QUANTITY};

/// How return quantities are checked against the originating sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnPolicy {
    /// Pending + approved returns for a sale may not exceed its quantity.
    #[default]
    Cumulative,
    /// Each request is checked alone against the sale quantity; repeated
    /// requests can add up past it.
    PerRequest,
}

impl FromStr for ReturnPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cumulative" => Ok(ReturnPolicy::Cumulative),
            "per_request" | "per-request" => Ok(ReturnPolicy::PerRequest),
            _ => Err(ConfigError::InvalidValue("DRUMTRACK_RETURN_POLICY".to_string())),
        }
    }
}

/// Tracker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Return quantity policy
    pub return_policy: ReturnPolicy,

    /// Maximum category lines in one sale submission
    pub max_line_items: usize,

    /// Maximum drums on one line
    pub max_line_quantity: i64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            return_policy: ReturnPolicy::default(),
            max_line_items: MAX_LINE_ITEMS,
            max_line_quantity: MAX_LINE_QUANTITY,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = TrackerConfig::default();

        let config = TrackerConfig {
            return_policy: match lookup("DRUMTRACK_RETURN_POLICY") {
                Some(v) => v.parse()?,
                None => defaults.return_policy,
            },

            max_line_items: parse_or(&lookup, "DRUMTRACK_MAX_LINE_ITEMS", defaults.max_line_items)?,

            max_line_quantity: parse_or(
                &lookup,
                "DRUMTRACK_MAX_LINE_QUANTITY",
                defaults.max_line_quantity,
            )?,
        };

        if config.max_line_items == 0 {
            return Err(ConfigError::InvalidValue("DRUMTRACK_MAX_LINE_ITEMS".to_string()));
        }
        if config.max_line_quantity < 1 {
            return Err(ConfigError::InvalidValue("DRUMTRACK_MAX_LINE_QUANTITY".to_string()));
        }

        Ok(config)
    }

    pub fn with_return_policy(mut self, policy: ReturnPolicy) -> Self {
        self.return_policy = policy;
        self
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
