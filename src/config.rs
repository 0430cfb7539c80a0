//! Configuration management for the trip planner
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TripPlannerError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

const MIN_SIGNING_KEY_LEN: usize = 32;

/// Root configuration structure for the trip planner
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TripPlannerConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// LLM provider settings
    pub llm: LlmConfig,
    /// Outgoing email settings
    pub email: EmailConfig,
    /// Travel research settings
    pub research: ResearchConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Directory served under `/static`
    pub static_dir: String,
    /// Upper bound for a whole request, LLM call included
    pub request_timeout_seconds: u32,
    /// PEM certificate, enables HTTPS together with `tls_key_path`
    pub tls_cert_path: Option<String>,
    /// PEM private key
    pub tls_key_path: Option<String>,
    /// Secret for signing emailed plans; a random per-process key when unset
    pub signing_key: Option<String>,
}

/// LLM provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key (falls back to `GROQ_API_KEY`)
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Completion token limit
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

/// Outgoing email settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// SMTP relay host (STARTTLS)
    pub smtp_host: String,
    /// SMTP port
    pub smtp_port: u16,
    /// Sender address (falls back to `SENDER_EMAIL`)
    pub sender_address: Option<String>,
    /// Sender password or app password (falls back to `SENDER_PASSWORD`)
    pub sender_password: Option<String>,
    /// Display name on outgoing mail
    pub sender_name: String,
}

/// Travel research settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Gather destination facts before prompting
    pub enabled: bool,
    /// Wikipedia REST summary endpoint
    pub wikipedia_url: String,
    /// Nominatim search endpoint
    pub nominatim_url: String,
    /// DuckDuckGo instant answer endpoint
    pub duckduckgo_url: String,
    /// Appended to place lookups, e.g. a country name
    pub region_hint: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_seconds: u32,
    /// User agent sent to the public APIs
    pub user_agent: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
    /// OTLP/HTTP collector endpoint for trace export
    pub otlp_endpoint: Option<String>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_request_timeout() -> u32 {
    180
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_llm_max_tokens() -> u32 {
    8000
}

fn default_llm_temperature() -> f32 {
    0.7
}

fn default_llm_timeout() -> u32 {
    120
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_sender_name() -> String {
    "AI Trip Planner".to_string()
}

fn default_wikipedia_url() -> String {
    "https://en.wikipedia.org/api/rest_v1/page/summary".to_string()
}

fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_duckduckgo_url() -> String {
    "https://api.duckduckgo.com/".to_string()
}

fn default_region_hint() -> Option<String> {
    Some("India".to_string())
}

fn default_research_timeout() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("TripPlannerApp/{}", crate::VERSION)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            request_timeout_seconds: default_request_timeout(),
            tls_cert_path: None,
            tls_key_path: None,
            signing_key: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            max_tokens: default_llm_max_tokens(),
            temperature: default_llm_temperature(),
            timeout_seconds: default_llm_timeout(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            sender_address: None,
            sender_password: None,
            sender_name: default_sender_name(),
        }
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            wikipedia_url: default_wikipedia_url(),
            nominatim_url: default_nominatim_url(),
            duckduckgo_url: default_duckduckgo_url(),
            region_hint: default_region_hint(),
            timeout_seconds: default_research_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl TripPlannerConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRIPPLANNER_LLM__MODEL overrides llm.model
        builder = builder.add_source(
            Environment::with_prefix("TRIPPLANNER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TripPlannerConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_env_fallbacks();
        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("trip-planner").join("config.toml"))
    }

    /// Fill secrets from the conventional environment variables
    pub fn apply_env_fallbacks(&mut self) {
        if self.llm.api_key.is_none() {
            self.llm.api_key = non_empty_env("GROQ_API_KEY");
        }
        if self.email.sender_address.is_none() {
            self.email.sender_address = non_empty_env("SENDER_EMAIL");
        }
        if self.email.sender_password.is_none() {
            self.email.sender_password = non_empty_env("SENDER_PASSWORD");
        }
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
        if self.server.static_dir.is_empty() {
            self.server.static_dir = default_static_dir();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.llm.base_url.is_empty() {
            self.llm.base_url = default_llm_base_url();
        }
        if self.llm.model.is_empty() {
            self.llm.model = default_llm_model();
        }
        if self.llm.max_tokens == 0 {
            self.llm.max_tokens = default_llm_max_tokens();
        }
        if self.llm.timeout_seconds == 0 {
            self.llm.timeout_seconds = default_llm_timeout();
        }
        if self.email.smtp_host.is_empty() {
            self.email.smtp_host = default_smtp_host();
        }
        if self.email.smtp_port == 0 {
            self.email.smtp_port = default_smtp_port();
        }
        if self.email.sender_name.is_empty() {
            self.email.sender_name = default_sender_name();
        }
        if self.research.timeout_seconds == 0 {
            self.research.timeout_seconds = default_research_timeout();
        }
        if self.research.user_agent.is_empty() {
            self.research.user_agent = default_user_agent();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_credentials()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_credentials(&self) -> Result<()> {
        // The service starts without credentials; generation and email then
        // report "not configured" to the user.
        if let Some(api_key) = &self.llm.api_key {
            if api_key.trim().is_empty() {
                return Err(TripPlannerError::config(
                    "LLM API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }
        }

        if let Some(key) = &self.server.signing_key {
            if key.trim().len() < MIN_SIGNING_KEY_LEN {
                return Err(TripPlannerError::config(format!(
                    "server.signing_key must be at least {MIN_SIGNING_KEY_LEN} characters"
                ))
                .into());
            }
        }

        if self.server.tls_cert_path.is_some() != self.server.tls_key_path.is_some() {
            return Err(TripPlannerError::config(
                "TLS requires both server.tls_cert_path and server.tls_key_path",
            )
            .into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.llm.timeout_seconds > 300 {
            return Err(TripPlannerError::config("LLM timeout cannot exceed 300 seconds").into());
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(
                TripPlannerError::config("LLM temperature must be between 0.0 and 2.0").into(),
            );
        }

        if self.llm.max_tokens > 32_768 {
            return Err(TripPlannerError::config("LLM max tokens cannot exceed 32768").into());
        }

        if self.research.timeout_seconds > 60 {
            return Err(
                TripPlannerError::config("Research timeout cannot exceed 60 seconds").into(),
            );
        }

        if self.server.request_timeout_seconds < self.llm.timeout_seconds {
            return Err(TripPlannerError::config(
                "Server request timeout must not be shorter than the LLM timeout",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TripPlannerError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TripPlannerError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("llm.base_url", &self.llm.base_url),
            ("research.wikipedia_url", &self.research.wikipedia_url),
            ("research.nominatim_url", &self.research.nominatim_url),
            ("research.duckduckgo_url", &self.research.duckduckgo_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TripPlannerError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if let Some(endpoint) = &self.logging.otlp_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(TripPlannerError::config(
                    "logging.otlp_endpoint must be a valid HTTP or HTTPS URL",
                )
                .into());
            }
        }

        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
