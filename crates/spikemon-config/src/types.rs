// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `spikemon.toml`. Every section is optional in the
//! file; missing keys fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of records the offline reader pulls per chunk
pub const DEFAULT_READER_CHUNK_RECORDS: usize = 1_000_000;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SpikemonConfig {
    pub recording: RecordingConfig,
    pub output: OutputConfig,
    pub reader: ReaderConfig,
    pub logging: LoggingConfig,
}

/// Recording session behaviour
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Keep buffers and accumulate time across start/stop probes
    pub persistent_mode: bool,
    /// Spike slots reserved per neuron when a session is created (0 = grow on demand)
    pub buffer_capacity_hint: usize,
}

/// Spike file output
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Spike file bound to new sessions; `None` keeps recording in memory only
    pub spike_file: Option<PathBuf>,
}

/// Offline reader settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Records decoded per bulk read
    pub chunk_records: usize,
    /// Bin width in ms for binned mode; `None` reads raw (AER) pairs
    pub bin_width_ms: Option<u32>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_records: DEFAULT_READER_CHUNK_RECORDS,
            bin_width_ms: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Directory for JSON log files; `None` logs to the console only
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}
