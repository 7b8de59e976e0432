//! Process configuration resolved from environment variables.
//!
//! # Responsibility
//! - Resolve cache/log locations, log level, engine bundle and id strategy.
//! - Reject malformed values instead of silently falling back.
//!
//! # Invariants
//! - Empty or whitespace-only variables count as unset.

use crate::bridge::BridgeConfig;
use crate::engine::EngineBundle;
use crate::logging::default_log_level;
use crate::model::id::IdStrategy;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const CACHE_DIR_ENV: &str = "PARQTODO_CACHE_DIR";
pub const LOG_LEVEL_ENV: &str = "PARQTODO_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "PARQTODO_LOG_DIR";
pub const ENGINE_BUNDLE_ENV: &str = "PARQTODO_ENGINE_BUNDLE";
pub const ID_STRATEGY_ENV: &str = "PARQTODO_ID_STRATEGY";

const DEFAULT_CACHE_DIR_NAME: &str = "parqtodo-cache";
const LOG_SUBDIR: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                var,
                value,
                expected,
            } => write!(f, "{var}=`{value}` is invalid; expected {expected}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub cache_dir: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub bridge: BridgeConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let cache_dir = read(CACHE_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_CACHE_DIR_NAME));
        let log_dir = read(LOG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| cache_dir.join(LOG_SUBDIR));
        let log_level = read(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string());

        let bundle = match read(ENGINE_BUNDLE_ENV) {
            Some(value) => Some(EngineBundle::parse(&value).ok_or(ConfigError::InvalidValue {
                var: ENGINE_BUNDLE_ENV,
                value,
                expected: "worker|inline",
            })?),
            None => None,
        };
        let id_strategy = match read(ID_STRATEGY_ENV) {
            Some(value) => IdStrategy::parse(&value).ok_or(ConfigError::InvalidValue {
                var: ID_STRATEGY_ENV,
                value,
                expected: "monotonic|random|wallclock",
            })?,
            None => IdStrategy::default(),
        };

        Ok(Self {
            cache_dir,
            log_level,
            log_dir,
            bridge: BridgeConfig {
                bundle,
                id_strategy,
                ..BridgeConfig::default()
            },
        })
    }
}
