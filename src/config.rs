//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

use axum::http::HeaderValue;

/// Default JSON body limit (100kb).
pub const DEFAULT_JSON_BODY_LIMIT: usize = 100 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Allowed CORS origins; `["*"]` accepts any origin
    pub cors_allowed_origins: Vec<String>,

    /// Maximum accepted JSON body size in bytes
    pub json_body_limit: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let cors_allowed_origins = parse_origins(
            &lookup("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| "*".to_string()),
        )?;

        let json_body_limit = match lookup("JSON_BODY_LIMIT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JSON_BODY_LIMIT"))?,
            None => DEFAULT_JSON_BODY_LIMIT,
        };

        let config = Self {
            host,
            port,
            environment,
            cors_allowed_origins,
            json_body_limit,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with: an empty JSON body limit
    /// or a CORS origin that is not a valid header value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.json_body_limit == 0 {
            return Err(ConfigError::InvalidValue("JSON_BODY_LIMIT"));
        }

        if !self.allows_any_origin()
            && self
                .cors_allowed_origins
                .iter()
                .any(|origin| HeaderValue::from_str(origin).is_err())
        {
            return Err(ConfigError::InvalidValue("CORS_ALLOWED_ORIGINS"));
        }

        Ok(())
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// True when CORS accepts requests from any origin
    pub fn allows_any_origin(&self) -> bool {
        self.cors_allowed_origins.iter().any(|origin| origin == "*")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: "development".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
            json_body_limit: DEFAULT_JSON_BODY_LIMIT,
        }
    }
}

fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        return Err(ConfigError::InvalidValue("CORS_ALLOWED_ORIGINS"));
    }
    Ok(origins)
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
