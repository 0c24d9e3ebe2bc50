// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Spike Monitor
//!
//! Records the spikes of one neuron population and answers firing-rate queries.
//!
//! A [`MonitorSession`] is a two-state machine:
//! - **Idle**: lifecycle calls (`start`, `clear`, output binding) and every query
//! - **Recording**: only `push_event` and `stop`
//!
//! Calls made in the wrong state are rejected with [`MonitorError::InvalidState`]
//! and leave the session untouched.
//!
//! ## Usage
//! ```rust
//! use spikemon_monitor::{ManualClock, MonitorSession};
//!
//! let clock = ManualClock::new(0);
//! let mut monitor = MonitorSession::new("excitatory", 0, 4, clock.clone()).unwrap();
//!
//! monitor.start().unwrap();
//! monitor.push_event(2, 10).unwrap();
//! monitor.push_event(2, 40).unwrap();
//! clock.set_ms(1000);
//! monitor.stop().unwrap();
//!
//! assert_eq!(monitor.neuron_rate(2).unwrap(), 2.0);
//! assert_eq!(monitor.silent_neuron_count().unwrap(), 3);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use std::fmt;

use spikemon_format::FormatError;
use thiserror::Error;

mod analysis;
mod clock;
mod output;
mod report;
mod session;

pub use clock::{ManualClock, SimulationClock};
pub use report::{MonitorReport, NeuronReport};
pub use session::MonitorSession;

/// Externally visible recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "idle"),
            RecordingState::Recording => write!(f, "recording"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("{operation} requires the monitor to be {required}, but it is {actual}")]
    InvalidState {
        operation: &'static str,
        required: RecordingState,
        actual: RecordingState,
    },

    #[error("neuron count must be > 0")]
    EmptyPopulation,

    #[error("neuron index {index} out of range for population of {neuron_count}")]
    NeuronOutOfRange { index: u32, neuron_count: u32 },

    #[error("invalid firing-rate range [{lo}, {hi}]: need 0 <= lo <= hi")]
    InvalidRange { lo: f32, hi: f32 },

    #[error(
        "clock inconsistency: probe started at {probe_start} ms, stopped at {now} ms with {accumulated} ms accumulated"
    )]
    ClockInconsistency {
        probe_start: i64,
        now: i64,
        accumulated: i64,
    },

    #[error("output '{label}' is already bound to this monitor")]
    OutputAlreadyBound { label: String },

    #[error("spike file error: {0}")]
    Format(#[from] FormatError),
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::Format(FormatError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
