//! Configuration schema definitions.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Deployment environment the service runs in.
///
/// Controls log formatting, test-time log suppression, and error-message
/// redaction. Behavior is deterministic for a given value: components
/// receive it through their constructors instead of probing the process
/// environment at call sites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" => Ok(Environment::Production),
            other => Err(format!(
                "unknown environment {:?} (expected development, test or production)",
                other
            )),
        }
    }
}

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Host to bind the listener to.
    pub bind_host: String,

    /// Port to bind the listener to. 0 requests an ephemeral port.
    pub bind_port: u16,

    /// Deployment environment.
    pub environment: Environment,

    /// Maximum time to wait for in-flight requests during shutdown.
    pub shutdown_grace_ms: u64,

    /// Default log level when RUST_LOG is not set.
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            bind_port: 8080,
            environment: Environment::Development,
            shutdown_grace_ms: 10_000,
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Full bind address in `host:port` form.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }

    /// Shutdown grace period as a [`Duration`].
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
