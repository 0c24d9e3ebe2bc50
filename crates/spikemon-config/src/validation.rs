// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! All problems are collected and reported together.

use crate::{ConfigError, ConfigResult, SpikemonConfig};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every failed check
pub fn validate_config(config: &SpikemonConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_reader(config, &mut errors);
    validate_output(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_reader(config: &SpikemonConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.reader.chunk_records == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "reader.chunk_records".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    if config.reader.bin_width_ms == Some(0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "reader.bin_width_ms".to_string(),
            reason: "bin width must be greater than 0 ms".to_string(),
        });
    }
}

fn validate_output(config: &SpikemonConfig, errors: &mut Vec<ConfigValidationError>) {
    if let Some(path) = &config.output.spike_file {
        if path.as_os_str().is_empty() {
            errors.push(ConfigValidationError::InvalidValue {
                field: "output.spike_file".to_string(),
                reason: "path must not be empty".to_string(),
            });
        }
    }
}

fn validate_logging(config: &SpikemonConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !VALID_LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                config.logging.level,
                VALID_LOG_LEVELS.join(", ")
            ),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_zero_chunk_rejected() {
        let mut config = SpikemonConfig::default();
        config.reader.chunk_records = 0;

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("reader.chunk_records"));
    }

    #[test]
    fn test_all_errors_reported() {
        let mut config = SpikemonConfig::default();
        config.reader.bin_width_ms = Some(0);
        config.output.spike_file = Some(PathBuf::new());
        config.logging.level = "loud".to_string();

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("reader.bin_width_ms"));
        assert!(message.contains("output.spike_file"));
        assert!(message.contains("logging.level"));
    }

    #[test]
    fn test_log_level_case_insensitive() {
        let mut config = SpikemonConfig::default();
        config.logging.level = "WARN".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
