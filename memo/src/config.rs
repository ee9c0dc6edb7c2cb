// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Configuration
//!
//! Layered configuration for a memoized cache's defaults: defaults, then
//! an optional TOML file, then environment variables, built on the
//! `config` crate's own layering builder. `MemoConfig` is immutable after
//! construction: parse once, validate, then share the result.

use memo_core::Policy as EvictionPolicy;
use serde::Deserialize;
use std::path::Path;

/// Log level, mirroring the bootstrap crate's own enum
/// (`bootstrap::config::LogLevel`) so `memo`'s logging init takes the same
/// shape of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn default_policy_name() -> String {
    "lru".into()
}

fn default_capacity() -> usize {
    1024
}

/// The defaults a named cache falls back to when its call site doesn't
/// override them explicitly.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoConfig {
    #[serde(default = "default_policy_name")]
    policy: String,
    #[serde(default = "default_capacity")]
    capacity: usize,
    #[serde(default)]
    log_level: LogLevel,
    #[serde(default)]
    metrics_enabled: bool,
    #[serde(default)]
    archive_dir: Option<String>,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            policy: default_policy_name(),
            capacity: default_capacity(),
            log_level: LogLevel::default(),
            metrics_enabled: false,
            archive_dir: None,
        }
    }
}

impl MemoConfig {
    /// Loads configuration layered as: built-in defaults, then an optional
    /// TOML file at `path` if it exists, then `MEMO_*` environment
    /// variables (`MEMO_CAPACITY`, `MEMO_POLICY`, `MEMO_LOG_LEVEL`,
    /// `MEMO_METRICS_ENABLED`, `MEMO_ARCHIVE_DIR`) — each layer overriding
    /// the one before it.
    pub fn load(path: Option<&Path>) -> memo_core::Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("policy", default_policy_name())
            .map_err(config_err)?
            .set_default("capacity", default_capacity() as i64)
            .map_err(config_err)?
            .set_default("log_level", "info")
            .map_err(config_err)?
            .set_default("metrics_enabled", false)
            .map_err(config_err)?;

        if let Some(path) = path {
            if path.exists() {
                builder = builder.add_source(config::File::from(path));
            }
        }

        let built = builder
            .add_source(config::Environment::with_prefix("MEMO").try_parsing(true))
            .build()
            .map_err(config_err)?;

        let config: Self = built.try_deserialize().map_err(config_err)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> memo_core::Result<()> {
        self.policy().map(|_| ())
    }

    pub fn policy(&self) -> memo_core::Result<EvictionPolicy> {
        match self.policy.to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionPolicy::Lru),
            "lfu" => Ok(EvictionPolicy::Lfu),
            "mru" => Ok(EvictionPolicy::Mru),
            "rr" => Ok(EvictionPolicy::Rr),
            "inf" | "unbounded" => Ok(EvictionPolicy::Inf),
            "no" | "no_cache" => Ok(EvictionPolicy::No),
            other => Err(memo_core::MemoError::capacity(format!("unknown policy: {other}"))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }

    pub fn archive_dir(&self) -> Option<&str> {
        self.archive_dir.as_deref()
    }
}

fn config_err(e: config::ConfigError) -> memo_core::MemoError {
    memo_core::MemoError::invariant(format!("configuration error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_with_no_file_or_env() {
        let config = MemoConfig::load(None).unwrap();
        assert_eq!(config.capacity(), 1024);
        assert!(matches!(config.policy().unwrap(), EvictionPolicy::Lru));
        assert_eq!(config.log_level(), LogLevel::Info);
        assert!(!config.metrics_enabled());
    }

    #[test]
    fn rejects_an_unknown_policy_name() {
        let config = MemoConfig {
            policy: "bogus".into(),
            ..MemoConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
