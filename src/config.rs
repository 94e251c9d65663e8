//! # Configuration Management
//!
//! Centralized configuration for the codec, the dispatch table, and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! ```toml
//! [codec]
//! max_string_len = 1048576
//! max_array_len = 65536
//!
//! [dispatch]
//! catch_panics = true
//! log_subscriber_failures = true
//!
//! [dispatch.groups]
//! VoteEvent = 1
//! ChatEvent = 2
//!
//! [logging]
//! app_name = "eventwire"
//! log_level = "info"
//! json_format = false
//! ```
//!
//! ## Security Considerations
//! Decode limits bound what a single length prefix from an untrusted peer can
//! make the decoder allocate. The defaults are generous for game traffic; tighten
//! them for public-facing endpoints.

use crate::core::codec::DecodeLimits;
use crate::error::{ProtocolError, Result};
use crate::protocol::dispatcher::GroupId;
use crate::protocol::subscribers::DeliveryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Default maximum decoded string length (1 MiB)
pub const DEFAULT_MAX_STRING_LEN: usize = 1024 * 1024;

/// Default maximum decoded array element count
pub const DEFAULT_MAX_ARRAY_LEN: usize = 64 * 1024;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct EventwireConfig {
    /// Decode limits
    #[serde(default)]
    pub codec: CodecConfig,

    /// Group identifiers and subscriber isolation
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EventwireConfig {
    /// Load configuration from a TOML file
    ///
    /// A file that cannot be opened or read is [`ProtocolError::Io`]; one that
    /// does not parse is [`ProtocolError::ConfigError`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `EVENTWIRE_*` overrides read through `lookup`.
    ///
    /// Unparseable values are configuration errors rather than silently ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("EVENTWIRE_MAX_STRING_LEN") {
            self.codec.max_string_len = parse_env("EVENTWIRE_MAX_STRING_LEN", &value)?;
        }

        if let Some(value) = lookup("EVENTWIRE_MAX_ARRAY_LEN") {
            self.codec.max_array_len = parse_env("EVENTWIRE_MAX_ARRAY_LEN", &value)?;
        }

        if let Some(value) = lookup("EVENTWIRE_LOG_LEVEL") {
            self.logging.log_level = parse_env("EVENTWIRE_LOG_LEVEL", &value)?;
        }

        Ok(())
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.codec.validate());
        errors.extend(self.dispatch.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ProtocolError::ConfigError(format!("Invalid value for {key}: '{value}'")))
}

/// Limits applied while decoding untrusted input
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum string length in bytes
    pub max_string_len: usize,

    /// Maximum number of elements in a single array
    pub max_array_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_string_len: DEFAULT_MAX_STRING_LEN,
            max_array_len: DEFAULT_MAX_ARRAY_LEN,
        }
    }
}

impl CodecConfig {
    pub fn limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_string_len: self.max_string_len,
            max_array_len: self.max_array_len,
        }
    }

    /// Validate codec configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let prefix_max = i32::MAX as usize;

        if self.max_string_len == 0 {
            errors.push("Max string length must be greater than 0".to_string());
        } else if self.max_string_len > prefix_max {
            errors.push(format!(
                "Max string length {} exceeds the length prefix range ({prefix_max})",
                self.max_string_len
            ));
        }

        if self.max_array_len == 0 {
            errors.push("Max array length must be greater than 0".to_string());
        } else if self.max_array_len > prefix_max {
            errors.push(format!(
                "Max array length {} exceeds the length prefix range ({prefix_max})",
                self.max_array_len
            ));
        }

        errors
    }
}

/// Dispatch table configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Whether to contain panicking subscribers
    pub catch_panics: bool,

    /// Whether to log each failed subscriber
    pub log_subscriber_failures: bool,

    /// Group identifiers by group name
    pub groups: BTreeMap<String, GroupId>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            catch_panics: true,
            log_subscriber_failures: true,
            groups: BTreeMap::new(),
        }
    }
}

impl DispatchConfig {
    pub fn policy(&self) -> DeliveryPolicy {
        DeliveryPolicy {
            catch_panics: self.catch_panics,
            log_failures: self.log_subscriber_failures,
        }
    }

    /// Validate dispatch configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut owners: HashMap<GroupId, &str> = HashMap::new();

        for (name, id) in &self.groups {
            if name.trim().is_empty() {
                errors.push("Group name cannot be empty".to_string());
            }
            if let Some(previous) = owners.insert(*id, name) {
                errors.push(format!(
                    "Group identifier {id} assigned to both '{previous}' and '{name}'"
                ));
            }
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("eventwire"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
