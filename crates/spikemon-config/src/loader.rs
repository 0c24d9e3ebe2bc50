// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later tiers win:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, SpikemonConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "spikemon.toml";

/// Find the spikemon configuration file
///
/// Search order:
/// 1. `SPIKEMON_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("SPIKEMON_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by SPIKEMON_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet SPIKEMON_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file and apply overrides
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<SpikemonConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: SpikemonConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_bool(value: &str) -> bool {
    let lowered = value.to_lowercase();
    lowered == "true" || lowered == "1" || lowered == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `SPIKEMON_PERSISTENT_MODE` -> `recording.persistent_mode`
/// - `SPIKEMON_SPIKE_FILE` -> `output.spike_file`
/// - `SPIKEMON_READER_CHUNK_RECORDS` -> `reader.chunk_records`
/// - `SPIKEMON_READER_BIN_WIDTH_MS` -> `reader.bin_width_ms`
/// - `SPIKEMON_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut SpikemonConfig) {
    if let Ok(value) = env::var("SPIKEMON_PERSISTENT_MODE") {
        config.recording.persistent_mode = parse_bool(&value);
    }
    if let Ok(value) = env::var("SPIKEMON_SPIKE_FILE") {
        config.output.spike_file = Some(PathBuf::from(value));
    }
    if let Ok(value) = env::var("SPIKEMON_READER_CHUNK_RECORDS") {
        if let Ok(chunk) = value.parse::<usize>() {
            config.reader.chunk_records = chunk;
        }
    }
    if let Ok(value) = env::var("SPIKEMON_READER_BIN_WIDTH_MS") {
        if let Ok(width) = value.parse::<u32>() {
            config.reader.bin_width_ms = Some(width);
        }
    }
    if let Ok(value) = env::var("SPIKEMON_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// Recognised keys: `persistent_mode`, `spike_file`, `chunk_records`, `bin_width_ms`,
/// `log_level`, `log_dir`.
pub fn apply_cli_overrides(config: &mut SpikemonConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("persistent_mode") {
        config.recording.persistent_mode = parse_bool(value);
    }
    if let Some(value) = cli_args.get("spike_file") {
        config.output.spike_file = Some(PathBuf::from(value));
    }
    if let Some(value) = cli_args.get("chunk_records") {
        if let Ok(chunk) = value.parse::<usize>() {
            config.reader.chunk_records = chunk;
        }
    }
    if let Some(value) = cli_args.get("bin_width_ms") {
        if let Ok(width) = value.parse::<u32>() {
            config.reader.bin_width_ms = Some(width);
        }
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("log_dir") {
        config.logging.log_dir = Some(PathBuf::from(value));
    }
}
