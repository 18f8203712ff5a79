//! Layered configuration.
//!
//! Built-in defaults, then `giftmatch.toml` (or `config/giftmatch.toml`) with `${VAR}`
//! interpolation, then `GIFTMATCH_*` environment variables, then [`ConfigOverrides`].
//! The result is validated once before it is handed out.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::{ScoringWeights, DEFAULT_BROWSE_LIMIT, DEFAULT_MAX_RETRIES};

const CONFIG_FILE_CANDIDATES: [&str; 2] = ["giftmatch.toml", "config/giftmatch.toml"];

/// Config key set by each supported environment variable.
pub const ENV_KEYS: &[(&str, &str)] = &[
    ("database.url", "GIFTMATCH_DATABASE_URL"),
    ("database.max_connections", "GIFTMATCH_DATABASE_MAX_CONNECTIONS"),
    ("database.timeout_secs", "GIFTMATCH_DATABASE_TIMEOUT_SECS"),
    ("server.bind_address", "GIFTMATCH_SERVER_BIND_ADDRESS"),
    ("server.port", "GIFTMATCH_SERVER_PORT"),
    ("server.graceful_shutdown_secs", "GIFTMATCH_SERVER_GRACEFUL_SHUTDOWN_SECS"),
    ("matching.browse_limit", "GIFTMATCH_MATCHING_BROWSE_LIMIT"),
    ("matching.max_retries", "GIFTMATCH_MATCHING_MAX_RETRIES"),
    ("matching.max_per_category", "GIFTMATCH_MATCHING_MAX_PER_CATEGORY"),
    ("logging.level", "GIFTMATCH_LOGGING_LEVEL"),
    ("logging.format", "GIFTMATCH_LOGGING_FORMAT"),
];

/// Shorter spellings, consulted when the canonical variable is unset.
const ENV_ALIASES: &[(&str, &str)] = &[
    ("GIFTMATCH_LOGGING_LEVEL", "GIFTMATCH_LOG_LEVEL"),
    ("GIFTMATCH_LOGGING_FORMAT", "GIFTMATCH_LOG_FORMAT"),
];

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub matching: MatchingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub weights: ScoringWeights,
    pub browse_limit: usize,
    pub max_retries: u32,
    /// Per-category diversity cap; `None` disables it.
    pub max_per_category: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Programmatic overrides; they win over every other layer.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub server_port: Option<u16>,
    pub browse_limit: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation(message.into())
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://giftmatch.db".to_string(), max_connections: 5, timeout_secs: 30 }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), port: 8080, graceful_shutdown_secs: 15 }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            browse_limit: DEFAULT_BROWSE_LIMIT,
            max_retries: DEFAULT_MAX_RETRIES,
            max_per_category: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(invalid(format!("logging.format `{other}` is not compact|pretty|json"))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = match config_file_path(options.config_path.as_deref()) {
            Some(path) => read_file(&path)?,
            None if options.require_file => {
                let expected = options
                    .config_path
                    .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
                return Err(ConfigError::MissingConfigFile(expected));
            }
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        for &(field, key) in ENV_KEYS {
            let alias = ENV_ALIASES
                .iter()
                .find(|(canonical, _)| *canonical == key)
                .map(|(_, alias)| *alias);
            if let Some(value) = read_env(key).or_else(|| alias.and_then(read_env)) {
                self.set_from_env(field, key, value)?;
            }
        }
        Ok(())
    }

    fn set_from_env(&mut self, field: &str, key: &str, value: String) -> Result<(), ConfigError> {
        match field {
            "database.url" => self.database.url = value,
            "database.max_connections" => self.database.max_connections = parse_env(key, &value)?,
            "database.timeout_secs" => self.database.timeout_secs = parse_env(key, &value)?,
            "server.bind_address" => self.server.bind_address = value,
            "server.port" => self.server.port = parse_env(key, &value)?,
            "server.graceful_shutdown_secs" => {
                self.server.graceful_shutdown_secs = parse_env(key, &value)?
            }
            "matching.browse_limit" => self.matching.browse_limit = parse_env(key, &value)?,
            "matching.max_retries" => self.matching.max_retries = parse_env(key, &value)?,
            "matching.max_per_category" => {
                self.matching.max_per_category = Some(parse_env(key, &value)?)
            }
            "logging.level" => self.logging.level = value,
            "logging.format" => self.logging.format = value.parse()?,
            other => return Err(invalid(format!("unknown config key `{other}`"))),
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides { database_url, log_level, server_port, browse_limit } = overrides;
        if let Some(url) = database_url {
            self.database.url = url;
        }
        if let Some(level) = log_level {
            self.logging.level = level;
        }
        self.server.port = server_port.unwrap_or(self.server.port);
        self.matching.browse_limit = browse_limit.unwrap_or(self.matching.browse_limit);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.server.validate()?;
        self.matching.validate()?;
        self.logging.validate()
    }
}

impl DatabaseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.url.trim();
        if !(url.starts_with("sqlite:") || url == ":memory:") {
            return Err(invalid(
                "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)",
            ));
        }
        if self.max_connections == 0 {
            return Err(invalid("database.max_connections must be at least 1"));
        }
        if !(1..=300).contains(&self.timeout_secs) {
            return Err(invalid("database.timeout_secs must be in range 1..=300"));
        }
        Ok(())
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(invalid("server.port must be at least 1"));
        }
        if self.graceful_shutdown_secs == 0 {
            return Err(invalid("server.graceful_shutdown_secs must be at least 1"));
        }
        Ok(())
    }
}

impl MatchingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some((name, _)) =
            self.weights.entries().into_iter().find(|(_, weight)| !weight.is_finite() || *weight < 0.0)
        {
            return Err(invalid(format!("matching.weights.{name} must be a non-negative number")));
        }
        if !(1..=100).contains(&self.browse_limit) {
            return Err(invalid("matching.browse_limit must be in range 1..=100"));
        }
        if self.max_per_category == Some(0) {
            return Err(invalid("matching.max_per_category must be at least 1 when set"));
        }
        Ok(())
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(invalid("logging.level must be one of trace|debug|info|warn|error")),
        }
    }
}

/// Explicit path if it exists, otherwise the first default location present.
pub fn config_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => CONFIG_FILE_CANDIDATES.iter().map(PathBuf::from).find(|path| path.exists()),
    }
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&interpolate_env_vars(&raw)?)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Replaces every `${VAR}` with the variable's value.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let end = tail.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &tail[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &tail[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}
