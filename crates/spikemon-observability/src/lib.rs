// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # spikemon-observability
//!
//! Logging setup shared by the spikemon crates and tools, with per-crate debug flags.
//!
//! ## Features
//! - `file-logging`: JSON log files in a timestamped run folder (desktop only)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known spikemon crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "spikemon-config",
    "spikemon-format",
    "spikemon-monitor",
    "spikemon-observability",
    "spike_reader",
];
