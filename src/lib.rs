// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # spikemon - Spike Monitor for Spiking Neural Network Simulators
//!
//! Records the spikes of a neuron population during simulation, answers firing-rate queries
//! over the recorded window and persists spikes to a compact binary file that can be analyzed
//! offline.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! spikemon = "0.1"
//! ```
//!
//! ```rust,no_run
//! use spikemon::prelude::*;
//!
//! let clock = ManualClock::new(0);
//! let mut monitor = MonitorSession::new("excitatory", 0, 800, clock.clone())?;
//! monitor.bind_output_file("excitatory.dat")?;
//!
//! monitor.start()?;
//! // ... simulation pushes spikes
//! monitor.push_event(17, 3)?;
//! clock.set_ms(1000);
//! monitor.stop()?;
//!
//! println!("{}", monitor.report(false)?);
//!
//! // Offline analysis
//! let matrix = SpikeFileReader::open("excitatory.dat")?.read_binned(100)?;
//! println!("{} x {} bins", matrix.rows(), matrix.columns());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! spikemon-config         TOML + env + CLI configuration
//! spikemon-observability  tracing setup, per-crate debug flags
//! spikemon-format         spike file writer, reader, occupancy binning
//! spikemon-monitor        recording session, firing-rate statistics, reports
//! ```
//!
//! ## Feature Flags
//! - **`file-logging`** (default): JSON log files through `tracing-appender`

pub use spikemon_config as config;
pub use spikemon_format as format;
pub use spikemon_monitor as monitor;
pub use spikemon_observability as observability;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{load_config, validate_config, SpikemonConfig};
    pub use crate::format::{
        FormatError, OccupancyMatrix, ReadMode, SpikeData, SpikeFileReader, SpikeFileWriter,
        SpikeRecord,
    };
    pub use crate::monitor::{
        ManualClock, MonitorError, MonitorReport, MonitorSession, RecordingState, SimulationClock,
    };
}
