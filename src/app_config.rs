use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::compression::CompressionBudget;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// API key for the translation endpoint; may also come from the
    /// `GEMINI_API_KEY` environment variable
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Endpoint URL override (empty uses the public API)
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Instruction text sent alongside the image
    #[serde(default = "default_instruction")]
    pub instruction: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Concurrency gate settings
    #[serde(default)]
    pub gate: GateConfig,

    /// Image compression budget
    #[serde(default)]
    pub compression: CompressionBudget,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Retry policy for the translation pipeline.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetryConfig {
    /// Number of retries after the first attempt
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base delay in milliseconds; attempt `n` waits `base * (n+1)^2`
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

/// Concurrency gate settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GateConfig {
    /// Maximum concurrent in-flight requests
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Minimum spacing between dispatches in milliseconds
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

/// Log level wrapper for configuration
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warn level
    Warn,
    /// Info level (default)
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

impl LogLevel {
    /// Convert to the log crate's level filter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}

fn default_instruction() -> String {
    "Translate all foreign-language text in this image to English. \
     Edit the image so the original text is replaced with its translation, \
     preserving the layout, fonts and colors as closely as possible. \
     Return the edited image."
        .to_string()
}

fn default_timeout_secs() -> u64 {
    90
}

fn default_retry_count() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_max_in_flight() -> usize {
    2
}

fn default_min_interval_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: String::new(),
            model: default_model(),
            instruction: default_instruction(),
            timeout_secs: default_timeout_secs(),
            retry: RetryConfig::default(),
            gate: GateConfig::default(),
            compression: CompressionBudget::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file, writing the defaults to disk
    /// first if the file does not exist yet.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            let config = Self::default();
            config
                .save_to_file(path)
                .with_context(|| format!("Failed to write default config to {}", path.display()))?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Resolve the API key from the config or the environment.
    pub fn resolved_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }
        std::env::var("GEMINI_API_KEY").unwrap_or_default()
    }

    /// Validate the configuration for consistency and required values.
    ///
    /// An absent API key is not a validation error; its presence is a
    /// per-call precondition checked by the pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(anyhow!("Model name must not be empty"));
        }

        if !self.endpoint.is_empty() {
            Url::parse(&self.endpoint)
                .with_context(|| format!("Invalid endpoint URL: {}", self.endpoint))?;
        }

        if self.timeout_secs == 0 {
            return Err(anyhow!("Request timeout must be non-zero"));
        }

        self.compression.validate()?;
        Ok(())
    }
}
