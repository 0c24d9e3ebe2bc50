// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Human-readable monitor summary.

use std::fmt;

use tracing::info;

use crate::session::MonitorSession;
use crate::{RecordingState, Result, SimulationClock};

/// Spike times printed per table row before wrapping
const SPIKE_TIMES_PER_ROW: usize = 7;

/// Snapshot of a monitor's statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct MonitorReport {
    /// Simulation time when the report was taken (ms)
    pub sim_time_ms: i64,
    pub population_name: String,
    pub monitor_id: u32,
    pub spike_count: u64,
    pub total_time_ms: i64,
    pub mean_rate: f32,
    pub std_rate: f32,
    /// Per-neuron rows, present when spike times were requested
    pub neurons: Option<Vec<NeuronReport>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NeuronReport {
    pub neuron: u32,
    pub rate: f32,
    pub spike_times: Vec<i64>,
}

impl fmt::Display for MonitorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(t={:.3}s) SpikeMonitor for group {}({}) has {} spikes in {} ms ({:.2} +/- {:.2} Hz)",
            self.sim_time_ms as f64 / 1000.0,
            self.population_name,
            self.monitor_id,
            self.spike_count,
            self.total_time_ms,
            self.mean_rate,
            self.std_rate
        )?;

        let Some(neurons) = &self.neurons else {
            return Ok(());
        };
        writeln!(f)?;
        writeln!(f, "| Neur ID | Rate (Hz) | Spike Times (ms)")?;
        write!(f, "|- - - - -|- - - - - -|- - - - - - - - - - - - - - - - -")?;
        for neuron in neurons {
            writeln!(f)?;
            write!(f, "{neuron}")?;
        }
        Ok(())
    }
}

impl fmt::Display for NeuronReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "| {:7} | {:9.2} | ", self.neuron, self.rate)?;
        for (row, times) in self.spike_times.chunks(SPIKE_TIMES_PER_ROW).enumerate() {
            if row > 0 {
                write!(f, "\n|         |           | ")?;
            }
            for time in times {
                write!(f, "{time:8}")?;
            }
        }
        Ok(())
    }
}

impl<C: SimulationClock> MonitorSession<C> {
    /// Summarize the recording; `include_spike_times` adds the per-neuron table.
    pub fn report(&mut self, include_spike_times: bool) -> Result<MonitorReport> {
        self.require("report", RecordingState::Idle)?;

        let neurons = if include_spike_times {
            let rates = self.all_rates()?.to_vec();
            Some(
                rates
                    .into_iter()
                    .zip(&self.spikes)
                    .enumerate()
                    .map(|(neuron, (rate, spike_times))| NeuronReport {
                        neuron: neuron as u32,
                        rate,
                        spike_times: spike_times.clone(),
                    })
                    .collect(),
            )
        } else {
            None
        };

        Ok(MonitorReport {
            sim_time_ms: self.clock().now_ms(),
            population_name: self.population_name().to_string(),
            monitor_id: self.monitor_id(),
            spike_count: self.population_spike_count()?,
            total_time_ms: self.total_time().unwrap_or(0),
            mean_rate: self.population_mean_rate()?,
            std_rate: self.population_std_rate()?,
            neurons,
        })
    }

    /// Emit [`MonitorSession::report`] through `tracing`, one event per line.
    pub fn log_summary(&mut self, include_spike_times: bool) -> Result<()> {
        let report = self.report(include_spike_times)?;
        for line in report.to_string().lines() {
            info!(target: "spikemon-monitor", "{}", line);
        }
        Ok(())
    }
}
