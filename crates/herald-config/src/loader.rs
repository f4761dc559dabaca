//! Layered configuration loading.
//!
//! Layers apply in order: a preset, then files or strings, then environment
//! variables. File layers are merged key by key over the current values, so a
//! file naming only `[server] http_addr` keeps every other setting.

use std::env;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{ConfigError, HeraldConfig, LogFormat};

/// Configuration loader with a layered approach.
///
/// # Example
///
/// ```no_run
/// use herald_config::ConfigLoader;
///
/// # fn main() -> Result<(), herald_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_production()
///     .with_file("herald.toml")?
///     .with_env_prefix("HERALD")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HeraldConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader starting from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HeraldConfig::default(),
            env_prefix: None,
        }
    }

    /// Resets to the default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HeraldConfig::default();
        self
    }

    /// Resets to the development preset.
    ///
    /// ```
    /// use herald_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HeraldConfig::development();
        self
    }

    /// Resets to the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HeraldConfig::production();
        self
    }

    /// Merges a TOML or JSON file, chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed,
    /// or names unknown fields.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match extension.as_deref() {
            Some(format @ ("toml" | "json")) => self.with_string(&content, format),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    /// Merges a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be merged.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merges configuration text in `"toml"` or `"json"` format.
    ///
    /// ```
    /// use herald_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [server]
    ///     http_addr = "127.0.0.1:3000"
    ///
    ///     [mappings.payload_root]
    ///     "{urn:herald:echo}EchoRequest" = "echo"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    /// assert_eq!(config.server.request_timeout_ms, 30_000);
    /// assert_eq!(config.mappings.payload_root["{urn:herald:echo}EchoRequest"], "echo");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for malformed text, unknown fields, or an
    /// unsupported format.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: Value = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        if !layer.is_object() {
            return Err(ConfigError::validation_error("configuration root must be a table"));
        }

        let mut merged = serde_json::to_value(&self.config)?;
        merge_values(&mut merged, layer);
        self.config = serde_json::from_value(merged)?;
        Ok(self)
    }

    /// Reads variables as `PREFIX__SECTION__KEY` when loading.
    ///
    /// For example, with prefix `HERALD`:
    /// - `HERALD__SERVER__HTTP_ADDR=0.0.0.0:9000`
    /// - `HERALD__DISPATCHER__SOAP_VERSION=1.2`
    /// - `HERALD__TELEMETRY__LOGGING__LEVEL=debug`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads a `.env` file into the environment if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if a `.env` file exists but is
    /// malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::validation_error(format!("failed to load .env: {e}"))),
        }
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable fails to parse or the result does
    /// not validate.
    pub fn load(mut self) -> Result<HeraldConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the layers merged so far, without environment overrides or
    /// validation.
    #[must_use]
    pub fn load_unvalidated(self) -> HeraldConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut env_vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with(&marker))
            .collect();
        env_vars.sort();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => {
                config.server.http_addr = value.to_string();
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                config.server.request_timeout_ms = parse_number(key, value)?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                config.server.max_body_bytes = parse_number(key, value)?;
            }

            ["DISPATCHER", "SOAP_VERSION"] => {
                config.dispatcher.soap_version = parse_enum(key, value, "expected '1.1' or '1.2'")?;
            }
            ["DISPATCHER", "MESSAGE_FACTORY"] => {
                config.dispatcher.message_factory =
                    parse_enum(key, &value.to_lowercase(), "expected 'tree' or 'streaming'")?;
            }
            ["DISPATCHER", "PAYLOAD_CACHING"] => {
                config.dispatcher.payload_caching = parse_flag(key, value)?;
            }
            ["DISPATCHER", "MUST_UNDERSTAND_FAULT_STRING"] => {
                config.dispatcher.must_understand_fault_string = value.to_string();
            }
            ["DISPATCHER", "MUST_UNDERSTAND_FAULT_LOCALE"] => {
                config.dispatcher.must_understand_fault_locale = value.to_string();
            }
            ["DISPATCHER", "ACTORS_OR_ROLES"] => {
                config.dispatcher.actors_or_roles = split_list(value);
            }
            ["DISPATCHER", "ULTIMATE_RECEIVER"] => {
                config.dispatcher.ultimate_receiver = parse_flag(key, value)?;
            }

            ["MAPPINGS", "DEFAULT_ENDPOINT"] => {
                config.mappings.default_endpoint = non_empty(value);
            }

            ["FAULTS", "DEFAULT_FAULT"] => {
                config.faults.default_fault = non_empty(value);
            }
            ["FAULTS", "FALLBACK_TO_SERVER_FAULT"] => {
                config.faults.fallback_to_server_fault = parse_flag(key, value)?;
            }

            ["ADDRESSING", "ENABLED"] => {
                config.addressing.enabled = parse_flag(key, value)?;
            }
            ["ADDRESSING", "VERSIONS"] => {
                config.addressing.versions = split_list(value)
                    .iter()
                    .map(|v| parse_enum(key, v, "expected a list of '2004/08' or '1.0'"))
                    .collect::<Result<_, _>>()?;
            }
            ["ADDRESSING", "OUTPUT_ACTION_SUFFIX"] => {
                config.addressing.output_action_suffix = value.to_string();
            }
            ["ADDRESSING", "FAULT_ACTION_SUFFIX"] => {
                config.addressing.fault_action_suffix = value.to_string();
            }
            ["ADDRESSING", "DETECT_DUPLICATES"] => {
                config.addressing.detect_duplicates = parse_flag(key, value)?;
            }

            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                config.telemetry.logging.enabled = parse_flag(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => {
                config.telemetry.logging.level = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                config.telemetry.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env_parse_error(key, "expected 'json' or 'pretty'")),
                };
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
                config.telemetry.logging.include_location = parse_flag(key, value)?;
            }
            ["TELEMETRY", "METRICS", "ENABLED"] => {
                config.telemetry.metrics.enabled = parse_flag(key, value)?;
            }
            ["TELEMETRY", "METRICS", "ADDR"] => {
                config.telemetry.metrics.addr = non_empty(value);
            }

            _ => {}
        }

        Ok(())
    }
}

// Objects merge key by key; anything else in `layer` replaces `base`.
fn merge_values(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

// Uses the serde spelling of the enum.
fn parse_enum<T: DeserializeOwned>(key: &str, value: &str, expected: &str) -> Result<T, ConfigError> {
    serde_json::from_value(Value::String(value.trim().to_string()))
        .map_err(|_| ConfigError::env_parse_error(key, expected))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
