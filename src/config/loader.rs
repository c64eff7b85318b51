//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    /// An environment-variable override held an unusable value.
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "{}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load the service configuration.
///
/// Starts from the TOML file named by `SERVICE_CONFIG` (defaults when the
/// variable is unset), applies environment-variable overrides, then runs
/// semantic validation.
pub fn load() -> Result<ServiceConfig, ConfigError> {
    let mut config = match std::env::var("SERVICE_CONFIG") {
        Ok(path) => load_file(Path::new(&path))?,
        Err(_) => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load configuration from a TOML file without overrides or validation.
pub fn load_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

fn apply_env_overrides(config: &mut ServiceConfig) -> Result<(), ConfigError> {
    if let Ok(host) = std::env::var("BIND_HOST") {
        config.bind_host = host;
    }
    if let Ok(port) = std::env::var("BIND_PORT") {
        config.bind_port = port.parse().map_err(|_| ConfigError::Env {
            var: "BIND_PORT",
            message: format!("expected a port number, got {:?}", port),
        })?;
    }
    if let Ok(env) = std::env::var("APP_ENV") {
        config.environment = env.parse().map_err(|message| ConfigError::Env {
            var: "APP_ENV",
            message,
        })?;
    }
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        config.log_level = level;
    }
    if let Ok(grace) = std::env::var("SHUTDOWN_GRACE_MS") {
        config.shutdown_grace_ms = grace.parse().map_err(|_| ConfigError::Env {
            var: "SHUTDOWN_GRACE_MS",
            message: format!("expected milliseconds, got {:?}", grace),
        })?;
    }
    Ok(())
}
