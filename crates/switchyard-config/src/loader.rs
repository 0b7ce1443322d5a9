//! Layered configuration loading.
//!
//! Layers apply in order, later ones overriding earlier ones:
//! 1. Defaults (or a preset)
//! 2. A TOML or JSON file
//! 3. Environment variables `PREFIX__SECTION__KEY`

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::{ConfigError, SwitchyardConfig};

/// Builds a [`SwitchyardConfig`] from defaults, a file and the environment.
///
/// # Example
///
/// ```no_run
/// use switchyard_config::ConfigLoader;
///
/// # fn main() -> Result<(), switchyard_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("switchyard.toml")?
///     .with_env_prefix("SWITCHYARD")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: SwitchyardConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader holding the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SwitchyardConfig::default(),
            env_prefix: None,
        }
    }

    /// Resets to the default configuration.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = SwitchyardConfig::default();
        self
    }

    /// Starts from [`SwitchyardConfig::development`].
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = SwitchyardConfig::development();
        self
    }

    /// Starts from [`SwitchyardConfig::production`].
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = SwitchyardConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file, chosen by extension.
    ///
    /// The file is merged over the current configuration, so keys it omits
    /// keep the values set by earlier layers such as a preset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, of an
    /// unknown format, malformed, or contains unknown keys.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.merge_layer(parse_layer(&content, format)?)?;
        Ok(self)
    }

    /// Like [`ConfigLoader::with_file`], but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists and cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merges configuration text in `format` (`toml` or `json`) over the
    /// current configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unknown or parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use switchyard_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[server]\nport = 3000\n", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.port, 3000);
    /// assert_eq!(config.server.host, "0.0.0.0");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.merge_layer(parse_layer(content, format)?)?;
        Ok(self)
    }

    /// Enables environment overrides under `prefix`.
    ///
    /// With prefix `SWITCHYARD`, `SWITCHYARD__SERVER__PORT=9000` sets
    /// `server.port`. Unrecognized keys under the prefix are ignored.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies environment overrides, validates, and returns the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation
    /// fails.
    pub fn load(mut self) -> Result<SwitchyardConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_overrides(&prefix, env::vars())?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without environment overrides or
    /// validation.
    #[must_use]
    pub fn load_unvalidated(self) -> SwitchyardConfig {
        self.config
    }

    fn merge_layer(&mut self, layer: Value) -> Result<(), ConfigError> {
        let mut merged = serde_json::to_value(&self.config)?;
        merge(&mut merged, layer);
        self.config = serde_json::from_value(merged)?;
        Ok(())
    }

    fn apply_overrides<I>(&mut self, prefix: &str, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let section_prefix = format!("{prefix}__");
        for (key, value) in vars {
            if let Some(path) = key.strip_prefix(&section_prefix) {
                let parts: Vec<&str> = path.split("__").collect();
                self.apply_var(&key, &parts, &value)?;
            }
        }
        Ok(())
    }

    fn apply_var(&mut self, key: &str, parts: &[&str], value: &str) -> Result<(), ConfigError> {
        let config = &mut self.config;

        match parts {
            ["SERVER", "HOST"] => config.server.host = value.to_string(),
            ["SERVER", "PORT"] => config.server.port = parse_number(key, value)?,
            ["SERVER", "READ_TIMEOUT_SECS"] => {
                config.server.read_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "WRITE_TIMEOUT_SECS"] => {
                config.server.write_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "MAX_HEADER_BYTES"] => {
                config.server.max_header_bytes = parse_number(key, value)?;
            }

            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_flag(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => config.logging.format = value.to_lowercase(),

            ["METRICS", "ENABLED"] => config.metrics.enabled = parse_flag(key, value)?,
            ["METRICS", "ADDR"] => config.metrics.addr = value.to_string(),

            _ => {}
        }

        Ok(())
    }
}

/// Parses one layer, returning only the keys it sets.
///
/// The text is first checked as a whole config so unknown keys and bad
/// types fail with the error of its own format.
fn parse_layer(content: &str, format: &str) -> Result<Value, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => {
            toml::from_str::<SwitchyardConfig>(content)?;
            Ok(toml::from_str(content)?)
        }
        "json" => {
            serde_json::from_str::<SwitchyardConfig>(content)?;
            Ok(serde_json::from_str(content)?)
        }
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn merge(base: &mut Value, layer: Value) {
    match layer {
        Value::Object(entries) => {
            if let Value::Object(map) = base {
                for (key, value) in entries {
                    merge(map.entry(key).or_insert(Value::Null), value);
                }
            } else {
                *base = Value::Object(entries);
            }
        }
        other => *base = other,
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected a non-negative integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}
