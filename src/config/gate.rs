//! Top-level gate configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::SerializerConfig;
use crate::util::serde::ActorId;

/// Environment variable holding the owner id.
pub const ENV_OWNER_ID: &str = "IMAGINE_OWNER_ID";
/// Environment variable overriding the whitelist path.
pub const ENV_WHITELIST_PATH: &str = "IMAGINE_WHITELIST_PATH";
/// Environment variable disabling the start-up warm-up when set to a truthy value.
pub const ENV_NO_WARMUP: &str = "IMAGINE_NO_WARMUP";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// An environment variable held an unusable value.
    #[error("invalid value for {name}: {value}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
    /// A field failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Everything needed to assemble the whitelist and the serializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Actor that receives the bootstrap tier-3 entry.
    pub owner_id: ActorId,
    /// Location of the persisted whitelist document.
    #[serde(default = "default_whitelist_path")]
    pub whitelist_path: PathBuf,
    /// Run one throwaway job through the model at start-up.
    #[serde(default = "default_warmup")]
    pub warmup: bool,
    /// Entries per page when listing the whitelist.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Compute worker settings.
    #[serde(default)]
    pub serializer: SerializerConfig,
}

fn default_whitelist_path() -> PathBuf {
    PathBuf::from("whitelist.json")
}

const fn default_warmup() -> bool {
    true
}

const fn default_page_size() -> usize {
    10
}

impl GateConfig {
    /// Configuration with defaults for everything but the owner.
    #[must_use]
    pub fn new(owner_id: ActorId) -> Self {
        Self {
            owner_id,
            whitelist_path: default_whitelist_path(),
            warmup: default_warmup(),
            page_size: default_page_size(),
            serializer: SerializerConfig::default(),
        }
    }

    /// Set the whitelist document location.
    #[must_use]
    pub fn with_whitelist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.whitelist_path = path.into();
        self
    }

    /// Enable or disable the start-up warm-up.
    #[must_use]
    pub const fn with_warmup(mut self, warmup: bool) -> Self {
        self.warmup = warmup;
        self
    }

    /// Set the listing page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner_id == 0 {
            return Err(ConfigError::Invalid("owner_id must be greater than 0".into()));
        }
        if self.whitelist_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("whitelist_path must not be empty".into()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be greater than 0".into()));
        }
        self.serializer
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("serializer: {e}")))
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(input)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment, loading `.env`
    /// first if present.
    ///
    /// # Errors
    ///
    /// Missing or malformed owner id, or validation failure.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`GateConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_owner = lookup(ENV_OWNER_ID).ok_or_else(|| {
            ConfigError::Invalid(format!("{ENV_OWNER_ID} must be set"))
        })?;
        let owner_id = raw_owner
            .trim()
            .parse::<ActorId>()
            .map_err(|_| ConfigError::InvalidEnv {
                name: ENV_OWNER_ID,
                value: raw_owner.clone(),
            })?;

        let mut cfg = Self::new(owner_id);
        if let Some(path) = lookup(ENV_WHITELIST_PATH).filter(|p| !p.trim().is_empty()) {
            cfg.whitelist_path = PathBuf::from(path);
        }
        if let Some(flag) = lookup(ENV_NO_WARMUP) {
            cfg.warmup = !parse_flag(ENV_NO_WARMUP, &flag)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            name,
            value: value.to_string(),
        }),
    }
}
