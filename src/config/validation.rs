//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Returns every violation,
//! not just the first, so an operator can fix a bad config in one pass.

use crate::config::schema::ServiceConfig;

/// A single semantic violation in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

const KNOWN_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a loaded configuration. Pure function, no side effects.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bind_host.trim().is_empty() {
        errors.push(ValidationError {
            field: "bind_host",
            message: "must not be empty".to_string(),
        });
    }

    if config.shutdown_grace_ms == 0 {
        errors.push(ValidationError {
            field: "shutdown_grace_ms",
            message: "must be greater than zero".to_string(),
        });
    }

    if !KNOWN_LEVELS.contains(&config.log_level.as_str()) {
        errors.push(ValidationError {
            field: "log_level",
            message: format!(
                "unknown level {:?} (expected one of {})",
                config.log_level,
                KNOWN_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
