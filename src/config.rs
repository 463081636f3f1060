//! Layered evaluation settings.
//!
//! Sources, lowest priority first:
//! 1. built-in defaults
//! 2. `attrscript.toml` in the current directory, or the file given with `--config`
//! 3. `ATTRSCRIPT_*` environment variables, with `__` separating sections
//!
//! `ATTRSCRIPT_RUNNER__TIMEOUT_SECS=10` maps to `runner.timeout_secs`, and
//! `ATTRSCRIPT_LIMITS__MAX_STEPS=500` to `limits.max_steps`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::interp::Limits;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "attrscript.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "ATTRSCRIPT_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalConfig {
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// How `run(...)` executes commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub timeout_secs: u64,
    /// Command prefix for read-only runs, e.g. `["bwrap", "--ro-bind", "/", "/", "--dev", "/dev", "--"]`.
    pub read_only_wrapper: Vec<String>,
    /// Command prefix for read-write runs.
    pub read_write_wrapper: Vec<String>,
    /// Added to the inherited environment of every command.
    pub env: BTreeMap<String, String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            read_only_wrapper: Vec::new(),
            read_write_wrapper: Vec::new(),
            env: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_call_depth: usize,
    pub max_steps: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            max_call_depth: limits.max_call_depth,
            max_steps: limits.max_steps,
        }
    }
}

impl From<&LimitsConfig> for Limits {
    fn from(config: &LimitsConfig) -> Self {
        Limits {
            max_call_depth: config.max_call_depth,
            max_steps: config.max_steps,
        }
    }
}

impl EvalConfig {
    /// Load from defaults, `attrscript.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`load`](Self::load), reading `path` instead of `attrscript.toml`. An explicit file must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path)?.extract()?;
        config.validate()?;
        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }

    /// The provider chain, exposed so tests can layer more providers on top.
    pub fn figment(path: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::InvalidValue {
                        field: "--config".to_string(),
                        reason: format!("{} does not exist", path.display()),
                    });
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let local = PathBuf::from(CONFIG_FILE);
                if local.exists() {
                    figment = figment.merge(Toml::file(local));
                }
            }
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| {
            Err(ConfigError::InvalidValue {
                field: field.to_string(),
                reason: reason.to_string(),
            })
        };
        if self.runner.timeout_secs == 0 {
            return invalid("runner.timeout_secs", "must be at least 1");
        }
        if self.limits.max_call_depth == 0 {
            return invalid("limits.max_call_depth", "must be at least 1");
        }
        if self.limits.max_steps == 0 {
            return invalid("limits.max_steps", "must be at least 1");
        }
        Ok(())
    }

    pub fn limits(&self) -> Limits {
        Limits::from(&self.limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EvalConfig::default();
        assert_eq!(config.runner.timeout_secs, 5);
        assert!(config.runner.read_only_wrapper.is_empty());
        assert_eq!(config.limits(), Limits::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_toml_then_env_layering() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                [runner]
                timeout_secs = 9
                read_only_wrapper = ["bwrap", "--ro-bind", "/", "/", "--"]

                [limits]
                max_steps = 100
                "#,
            )?;
            jail.set_env("ATTRSCRIPT_LIMITS__MAX_STEPS", "200");
            jail.set_env("ATTRSCRIPT_RUNNER__ENV__LANG", "C");

            let config = EvalConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.runner.timeout_secs, 9);
            assert_eq!(config.runner.read_only_wrapper[0], "bwrap");
            assert_eq!(config.limits.max_steps, 200);
            assert_eq!(config.limits.max_call_depth, 64);
            // Figment lowercases environment keys.
            assert_eq!(config.runner.env.get("lang").map(String::as_str), Some("C"));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[runner]\ntimeout_secs = 2\n")?;
            let config = EvalConfig::load_from(Some(Path::new("custom.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.runner.timeout_secs, 2);
            assert!(EvalConfig::load_from(Some(Path::new("missing.toml"))).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_rejects_zero_limits() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ATTRSCRIPT_RUNNER__TIMEOUT_SECS", "0");
            let err = EvalConfig::load().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }));
            Ok(())
        });
    }
}
