// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Recording session: per-neuron spike buffers, the Idle/Recording state machine and
//! probe time accounting.
//!
//! Time accounting:
//! - non-persistent (default): every `start()` clears the buffers; `total_time` covers the
//!   last probe only
//! - persistent: buffers survive across probes and `total_time` is the sum of all probes

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use spikemon_config::SpikemonConfig;
use spikemon_format::SpikeRecord;
use tracing::{debug, info, warn};

use crate::analysis::FiringRateCache;
use crate::output::OutputBinding;
use crate::{MonitorError, RecordingState, Result, SimulationClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Recording { probe_start: i64 },
}

/// Spike monitor for one neuron population.
///
/// Not internally synchronized: one logical thread drives a session. Hosts that toggle
/// recording from another thread must serialize the calls themselves.
pub struct MonitorSession<C: SimulationClock> {
    population_name: String,
    monitor_id: u32,
    neuron_count: u32,
    clock: C,
    phase: Phase,
    persistent_mode: bool,

    // Probe timing (ms); `None` = unset
    start_time: Option<i64>,
    last_probe_start: Option<i64>,
    stop_time: Option<i64>,
    accumulated_time: i64,
    total_time: Option<i64>,

    pub(crate) spikes: Vec<Vec<i64>>,
    pub(crate) rates: FiringRateCache,
    output: Option<OutputBinding>,
}

impl<C: SimulationClock> MonitorSession<C> {
    /// Attach a monitor to a population of `neuron_count` neurons.
    pub fn new(
        population_name: impl Into<String>,
        monitor_id: u32,
        neuron_count: u32,
        clock: C,
    ) -> Result<Self> {
        Self::with_capacity(population_name, monitor_id, neuron_count, clock, 0)
    }

    /// Like [`MonitorSession::new`], reserving `spikes_per_neuron` slots in every buffer.
    pub fn with_capacity(
        population_name: impl Into<String>,
        monitor_id: u32,
        neuron_count: u32,
        clock: C,
        spikes_per_neuron: usize,
    ) -> Result<Self> {
        if neuron_count == 0 {
            return Err(MonitorError::EmptyPopulation);
        }
        let population_name = population_name.into();
        debug!(
            target: "spikemon-monitor",
            "Monitor {} attached to '{}' ({} neurons)",
            monitor_id,
            population_name,
            neuron_count
        );

        Ok(Self {
            population_name,
            monitor_id,
            neuron_count,
            clock,
            phase: Phase::Idle,
            persistent_mode: false,
            start_time: None,
            last_probe_start: None,
            stop_time: None,
            accumulated_time: 0,
            total_time: None,
            spikes: (0..neuron_count)
                .map(|_| Vec::with_capacity(spikes_per_neuron))
                .collect(),
            rates: FiringRateCache::new(neuron_count as usize),
            output: None,
        })
    }

    /// Build a session from the `recording` and `output` config sections.
    pub fn from_config(
        population_name: impl Into<String>,
        monitor_id: u32,
        neuron_count: u32,
        clock: C,
        config: &SpikemonConfig,
    ) -> Result<Self> {
        let mut session = Self::with_capacity(
            population_name,
            monitor_id,
            neuron_count,
            clock,
            config.recording.buffer_capacity_hint,
        )?;
        session.persistent_mode = config.recording.persistent_mode;
        if let Some(path) = &config.output.spike_file {
            session.bind_output_file(path)?;
        }
        Ok(session)
    }

    // region State machine

    pub fn state(&self) -> RecordingState {
        match self.phase {
            Phase::Idle => RecordingState::Idle,
            Phase::Recording { .. } => RecordingState::Recording,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.phase, Phase::Recording { .. })
    }

    /// Single guard for every state-dependent entry point.
    pub(crate) fn require(&self, operation: &'static str, required: RecordingState) -> Result<()> {
        if self.state() != required {
            return Err(self.state_error(operation, required));
        }
        Ok(())
    }

    fn state_error(&self, operation: &'static str, required: RecordingState) -> MonitorError {
        MonitorError::InvalidState {
            operation,
            required,
            actual: self.state(),
        }
    }

    pub fn set_persistent_mode(&mut self, persistent: bool) -> Result<()> {
        self.require("set_persistent_mode", RecordingState::Idle)?;
        self.persistent_mode = persistent;
        Ok(())
    }

    pub fn is_persistent_mode(&self) -> bool {
        self.persistent_mode
    }

    /// Begin a probe.
    ///
    /// In non-persistent mode the buffers and timers are cleared first.
    pub fn start(&mut self) -> Result<()> {
        self.require("start", RecordingState::Idle)?;

        if !self.persistent_mode {
            self.reset();
        }

        let now = self.clock.now_ms();
        if self.persistent_mode {
            self.start_time.get_or_insert(now);
            self.accumulated_time = self.total_time.unwrap_or(0).max(0);
        } else {
            self.start_time = Some(now);
            self.accumulated_time = 0;
        }
        self.last_probe_start = Some(now);
        self.rates.invalidate();
        self.phase = Phase::Recording { probe_start: now };

        debug!(
            target: "spikemon-monitor",
            "Monitor {} started recording at {} ms (persistent={}, accumulated={} ms)",
            self.monitor_id,
            now,
            self.persistent_mode,
            self.accumulated_time
        );
        Ok(())
    }

    /// End the current probe and flush queued output records.
    ///
    /// The session is Idle whenever this returns `Ok` or a spike file error; only a
    /// clock inconsistency leaves it recording.
    pub fn stop(&mut self) -> Result<()> {
        let Phase::Recording { probe_start } = self.phase else {
            return Err(self.state_error("stop", RecordingState::Recording));
        };

        let now = self.clock.now_ms();
        let total = now - probe_start + self.accumulated_time;
        if total < 0 {
            return Err(MonitorError::ClockInconsistency {
                probe_start,
                now,
                accumulated: self.accumulated_time,
            });
        }

        self.stop_time = Some(now);
        self.total_time = Some(total);
        self.phase = Phase::Idle;
        debug!(
            target: "spikemon-monitor",
            "Monitor {} stopped at {} ms, total recording time {} ms",
            self.monitor_id,
            now,
            total
        );

        self.flush_output()
    }

    /// Empty all buffers and reset every timer.
    pub fn clear(&mut self) -> Result<()> {
        self.require("clear", RecordingState::Idle)?;
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        for buffer in &mut self.spikes {
            buffer.clear();
        }
        self.start_time = None;
        self.last_probe_start = None;
        self.stop_time = None;
        self.accumulated_time = 0;
        self.total_time = None;
        self.rates.invalidate();
    }

    /// Record one spike. Only valid while recording.
    #[inline]
    pub fn push_event(&mut self, neuron_index: u32, timestamp_ms: i64) -> Result<()> {
        self.require("push_event", RecordingState::Recording)?;
        let neuron_count = self.neuron_count;
        let buffer = self
            .spikes
            .get_mut(neuron_index as usize)
            .ok_or(MonitorError::NeuronOutOfRange {
                index: neuron_index,
                neuron_count,
            })?;

        if let Some(output) = self.output.as_mut() {
            output.queue(SpikeRecord::try_from_event(timestamp_ms, neuron_index)?);
        }
        buffer.push(timestamp_ms);
        Ok(())
    }

    // endregion

    // region Output

    /// Bind a spike file at `path`, truncating it and writing the header.
    ///
    /// The file is labelled by its canonical path (canonical parent directory plus file
    /// name), so binding the file that is already bound under any spelling is rejected
    /// before the file is touched.
    pub fn bind_output_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.require("bind_output_file", RecordingState::Idle)?;
        let path = canonical_output_path(path.as_ref())?;
        let label = path.display().to_string();
        self.check_not_bound(&label)?;

        let file = File::create(&path)?;
        self.attach(label, Box::new(BufWriter::new(file)))
    }

    /// Bind any writer as the spike sink; `label` identifies it for duplicate checks.
    pub fn bind_output<W>(&mut self, label: impl Into<String>, writer: W) -> Result<()>
    where
        W: std::io::Write + Send + 'static,
    {
        self.require("bind_output", RecordingState::Idle)?;
        let label = label.into();
        self.check_not_bound(&label)?;
        self.attach(label, Box::new(writer))
    }

    fn check_not_bound(&self, label: &str) -> Result<()> {
        match &self.output {
            Some(current) if current.label() == label => Err(MonitorError::OutputAlreadyBound {
                label: label.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn attach(&mut self, label: String, sink: crate::output::BoxedSink) -> Result<()> {
        // Finish the previous sink before switching
        self.flush_output()?;
        let binding = OutputBinding::new(label, sink)?;
        info!(
            target: "spikemon-monitor",
            "Monitor {} writing spikes to '{}'",
            self.monitor_id,
            binding.label()
        );
        self.output = Some(binding);
        Ok(())
    }

    /// Write queued records to the bound sink.
    pub fn flush(&mut self) -> Result<()> {
        self.require("flush", RecordingState::Idle)?;
        self.flush_output()
    }

    /// Flush and release the bound sink, returning how many records it received.
    pub fn close_output(&mut self) -> Result<Option<u64>> {
        self.require("close_output", RecordingState::Idle)?;
        self.flush_output()?;
        Ok(self.output.take().map(|output| output.records_written()))
    }

    pub fn output_label(&self) -> Option<&str> {
        self.output.as_ref().map(|output| output.label())
    }

    /// Records queued for the sink but not yet written
    pub fn pending_output_records(&self) -> usize {
        self.output.as_ref().map_or(0, |output| output.pending_len())
    }

    fn flush_output(&mut self) -> Result<()> {
        if let Some(output) = self.output.as_mut() {
            let written = output.flush_pending()?;
            if written > 0 {
                debug!(
                    target: "spikemon-monitor",
                    "Monitor {} flushed {} spike records to '{}'",
                    self.monitor_id,
                    written,
                    output.label()
                );
            }
        }
        Ok(())
    }

    // endregion

    // region Accessors

    pub fn population_name(&self) -> &str {
        &self.population_name
    }

    pub fn monitor_id(&self) -> u32 {
        self.monitor_id
    }

    pub fn neuron_count(&self) -> u32 {
        self.neuron_count
    }

    pub(crate) fn clock(&self) -> &C {
        &self.clock
    }

    /// Start of the first probe since the last clear
    pub fn start_time(&self) -> Option<i64> {
        self.start_time
    }

    pub fn recording_start_time_of_last_probe(&self) -> Option<i64> {
        self.last_probe_start
    }

    pub fn stop_time(&self) -> Option<i64> {
        self.stop_time
    }

    /// Recorded duration in ms; `None` until the first stop
    pub fn total_time(&self) -> Option<i64> {
        self.total_time
    }

    /// Per-neuron spike times in push order.
    pub fn raw_spike_buffers(&self) -> Result<&[Vec<i64>]> {
        self.require("raw_spike_buffers", RecordingState::Idle)?;
        Ok(&self.spikes)
    }

    // endregion
}

/// Canonical parent directory joined with the file name; the file itself may not exist yet.
fn canonical_output_path(path: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("spike file path has no file name: {}", path.display()),
        )
    })?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(fs::canonicalize(parent)?.join(file_name))
}

impl<C: SimulationClock> Drop for MonitorSession<C> {
    fn drop(&mut self) {
        if let Some(output) = self.output.as_mut() {
            if let Err(e) = output.flush_pending() {
                warn!(
                    target: "spikemon-monitor",
                    "Monitor {} lost {} spike records while closing '{}': {}",
                    self.monitor_id,
                    output.pending_len(),
                    output.label(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;

    fn session(neurons: u32) -> (ManualClock, MonitorSession<ManualClock>) {
        let clock = ManualClock::new(0);
        let monitor = MonitorSession::new("test", 1, neurons, clock.clone()).unwrap();
        (clock, monitor)
    }

    #[test]
    fn test_empty_population_rejected() {
        let result = MonitorSession::new("empty", 0, 0, ManualClock::new(0));
        assert!(matches!(result, Err(MonitorError::EmptyPopulation)));
    }

    #[test]
    fn test_double_start_rejected() {
        let (_, mut monitor) = session(2);
        monitor.start().unwrap();
        let err = monitor.start().unwrap_err();
        assert!(matches!(
            err,
            MonitorError::InvalidState {
                operation: "start",
                required: RecordingState::Idle,
                actual: RecordingState::Recording,
            }
        ));
        assert!(monitor.is_recording());
    }

    #[test]
    fn test_idle_only_operations_rejected_while_recording() {
        let (_, mut monitor) = session(2);
        monitor.start().unwrap();

        assert!(monitor.clear().is_err());
        assert!(monitor.set_persistent_mode(true).is_err());
        assert!(monitor.raw_spike_buffers().is_err());
        assert!(monitor.flush().is_err());
        assert!(monitor.bind_output("mem", Vec::new()).is_err());
        assert!(monitor.population_mean_rate().is_err());
    }

    #[test]
    fn test_recording_only_operations_rejected_while_idle() {
        let (_, mut monitor) = session(2);
        assert!(matches!(
            monitor.stop(),
            Err(MonitorError::InvalidState {
                operation: "stop",
                ..
            })
        ));
        assert!(matches!(
            monitor.push_event(0, 1),
            Err(MonitorError::InvalidState {
                operation: "push_event",
                ..
            })
        ));
    }

    #[test]
    fn test_out_of_range_neuron() {
        let (_, mut monitor) = session(3);
        monitor.start().unwrap();
        monitor.push_event(2, 5).unwrap();
        assert!(matches!(
            monitor.push_event(3, 5),
            Err(MonitorError::NeuronOutOfRange {
                index: 3,
                neuron_count: 3
            })
        ));
        monitor.stop().unwrap();
        assert_eq!(monitor.raw_spike_buffers().unwrap()[2], vec![5]);
    }

    #[test]
    fn test_clock_going_backwards_keeps_recording() {
        let (clock, mut monitor) = session(1);
        clock.set_ms(100);
        monitor.start().unwrap();
        clock.set_ms(40);

        assert!(matches!(
            monitor.stop(),
            Err(MonitorError::ClockInconsistency {
                probe_start: 100,
                now: 40,
                accumulated: 0
            })
        ));
        assert!(monitor.is_recording());

        clock.set_ms(130);
        monitor.stop().unwrap();
        assert_eq!(monitor.total_time(), Some(30));
    }

    #[test]
    fn test_clear_resets_timers() {
        let (clock, mut monitor) = session(2);
        monitor.start().unwrap();
        monitor.push_event(0, 1).unwrap();
        clock.set_ms(10);
        monitor.stop().unwrap();

        monitor.clear().unwrap();
        assert_eq!(monitor.total_time(), None);
        assert_eq!(monitor.start_time(), None);
        assert_eq!(monitor.stop_time(), None);
        assert!(monitor.raw_spike_buffers().unwrap().iter().all(Vec::is_empty));
    }

    #[test]
    fn test_persistent_start_time_kept() {
        let (clock, mut monitor) = session(1);
        monitor.set_persistent_mode(true).unwrap();

        clock.set_ms(20);
        monitor.start().unwrap();
        clock.set_ms(30);
        monitor.stop().unwrap();
        clock.set_ms(70);
        monitor.start().unwrap();
        clock.set_ms(75);
        monitor.stop().unwrap();

        assert_eq!(monitor.start_time(), Some(20));
        assert_eq!(monitor.recording_start_time_of_last_probe(), Some(70));
        assert_eq!(monitor.stop_time(), Some(75));
        assert_eq!(monitor.total_time(), Some(15));
    }

    #[test]
    fn test_same_output_label_rejected() {
        let (_, mut monitor) = session(1);
        monitor.bind_output("mem", Vec::new()).unwrap();
        assert!(matches!(
            monitor.bind_output("mem", Vec::new()),
            Err(MonitorError::OutputAlreadyBound { .. })
        ));
        monitor.bind_output("other", Vec::new()).unwrap();
        assert_eq!(monitor.output_label(), Some("other"));
    }

    #[test]
    fn test_out_of_range_timestamp_rejected_with_output() {
        let (_, mut monitor) = session(1);
        monitor.bind_output("mem", Vec::new()).unwrap();
        monitor.start().unwrap();

        let err = monitor.push_event(0, i64::from(i32::MAX) + 1).unwrap_err();
        assert!(matches!(err, MonitorError::Format(_)));
        monitor.push_event(0, 7).unwrap();
        assert_eq!(monitor.pending_output_records(), 1);
        monitor.stop().unwrap();

        assert_eq!(monitor.raw_spike_buffers().unwrap()[0], vec![7]);
        assert_eq!(monitor.pending_output_records(), 0);
    }
}
