use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Upper bound for retries around a failed transport round trip.
pub const MAX_TRANSPORT_RETRIES: u32 = 5;

/// Server configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server host address
    #[validate(length(min = 1, message = "HTTP host cannot be empty"))]
    pub http_host: String,

    /// HTTP server port (1-65535)
    #[validate(range(
        min = 1,
        max = 65535,
        message = "HTTP port must be between 1 and 65535"
    ))]
    pub http_port: u16,

    /// Table catalog YAML; the embedded Sales History catalog when unset
    pub catalog_path: Option<String>,

    /// Server-side deadline for one select, in milliseconds
    #[validate(range(
        min = 1,
        max = 600000,
        message = "Query timeout must be between 1 ms and 10 minutes"
    ))]
    pub query_timeout_ms: u64,

    /// Largest accepted request body
    #[validate(range(
        min = 1024,
        max = 16777216,
        message = "Max request size must be between 1 KiB and 16 MiB"
    ))]
    pub max_request_bytes: usize,

    /// Whether to run server in daemon mode
    pub daemon: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            catalog_path: None,
            query_timeout_ms: 30_000,
            max_request_bytes: 1024 * 1024,
            daemon: false,
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            http_host: env::var("QUERYWIRE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: parse_env_var("QUERYWIRE_PORT", "8080")?,
            catalog_path: env::var("QUERYWIRE_CATALOG_PATH").ok(),
            query_timeout_ms: parse_env_var("QUERYWIRE_QUERY_TIMEOUT_MS", "30000")?,
            max_request_bytes: parse_env_var("QUERYWIRE_MAX_REQUEST_BYTES", "1048576")?,
            daemon: false, // Environment-based config always runs in foreground
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let config = Self {
            http_host: cli.http_host,
            http_port: cli.http_port,
            catalog_path: cli.catalog_path,
            query_timeout_ms: cli.query_timeout_ms,
            max_request_bytes: cli.max_request_bytes,
            daemon: cli.daemon,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = read_config_file(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub http_host: String,
    pub http_port: u16,
    pub catalog_path: Option<String>,
    pub query_timeout_ms: u64,
    pub max_request_bytes: usize,
    pub daemon: bool,
}

/// Client-side settings for talking to a query server
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server base URL, e.g. `http://localhost:8080`
    #[validate(custom(function = "validate_base_url"))]
    pub base_url: String,

    /// Bound on one round trip; also shipped to the server as its deadline
    #[validate(range(
        min = 1,
        max = 600000,
        message = "Request timeout must be between 1 ms and 10 minutes"
    ))]
    pub request_timeout_ms: u64,

    /// Extra attempts after a transport failure
    #[validate(range(max = 5, message = "At most 5 transport retries are allowed"))]
    pub transport_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            request_timeout_ms: 30_000,
            transport_retries: 2,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            base_url: base_url.into(),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            base_url: env::var("QUERYWIRE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            request_timeout_ms: parse_env_var("QUERYWIRE_REQUEST_TIMEOUT_MS", "30000")?,
            transport_retries: parse_env_var("QUERYWIRE_TRANSPORT_RETRIES", "2")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = read_config_file(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }
}

fn validate_base_url(url: &str) -> Result<(), ValidationError> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => {
            let mut err = ValidationError::new("base_url");
            err.message = Some("Base URL must start with http:// or https://".into());
            Err(err)
        }
    }
}

fn read_config_file<P: AsRef<std::path::Path>>(path: P) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
        field: "yaml_file".to_string(),
        value: "file read failed".to_string(),
        source: Box::new(e),
    })
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
