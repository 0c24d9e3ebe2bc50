// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Firing-rate statistics over the recorded spike buffers.
//!
//! Per-neuron rates and their sorted copy are cached. `start()` and `clear()` mark both
//! stale; each is rebuilt lazily by the first query that needs it, so repeated queries
//! between mutations return bit-identical values without recomputation.

use tracing::{debug, warn};

use crate::session::MonitorSession;
use crate::{MonitorError, RecordingState, Result, SimulationClock};

/// Cached per-neuron rates (Hz) with independent dirty flags for the rate vector and
/// its sorted copy.
#[derive(Debug)]
pub(crate) struct FiringRateCache {
    rates: Vec<f32>,
    sorted: Vec<f32>,
    needs_recompute: bool,
    needs_resort: bool,
    recompute_count: u64,
    sort_count: u64,
}

impl FiringRateCache {
    pub(crate) fn new(neuron_count: usize) -> Self {
        Self {
            rates: vec![0.0; neuron_count],
            sorted: vec![0.0; neuron_count],
            needs_recompute: true,
            needs_resort: true,
            recompute_count: 0,
            sort_count: 0,
        }
    }

    pub(crate) fn invalidate(&mut self) {
        self.needs_recompute = true;
        self.needs_resort = true;
    }

    fn recompute(&mut self, spikes: &[Vec<i64>], total_time: Option<i64>) {
        match total_time {
            Some(total) if total > 0 => {
                let total = total as f64;
                for (rate, buffer) in self.rates.iter_mut().zip(spikes) {
                    *rate = (buffer.len() as f64 * 1000.0 / total) as f32;
                }
            }
            _ => {
                if total_time.is_some() {
                    warn!(
                        target: "spikemon-monitor",
                        "Recording duration is zero, all firing rates reported as 0 Hz"
                    );
                }
                self.rates.fill(0.0);
            }
        }
        self.needs_recompute = false;
        self.recompute_count += 1;
    }

    fn resort(&mut self) {
        self.sorted.clear();
        self.sorted.extend_from_slice(&self.rates);
        self.sorted.sort_unstable_by(f32::total_cmp);
        self.needs_resort = false;
        self.sort_count += 1;
    }
}

impl<C: SimulationClock> MonitorSession<C> {
    fn refresh_rates(&mut self) {
        if self.rates.needs_recompute {
            let total_time = self.total_time();
            self.rates.recompute(&self.spikes, total_time);
            debug!(
                target: "spikemon-monitor",
                "Monitor {} recomputed firing rates for {} neurons",
                self.monitor_id(),
                self.neuron_count()
            );
        }
    }

    fn refresh_sorted(&mut self) {
        self.refresh_rates();
        if self.rates.needs_resort {
            self.rates.resort();
        }
    }

    fn check_neuron(&self, index: u32) -> Result<usize> {
        if index >= self.neuron_count() {
            return Err(MonitorError::NeuronOutOfRange {
                index,
                neuron_count: self.neuron_count(),
            });
        }
        Ok(index as usize)
    }

    /// Firing rate of every neuron, indexed by neuron.
    pub fn all_rates(&mut self) -> Result<&[f32]> {
        self.require("all_rates", RecordingState::Idle)?;
        self.refresh_rates();
        Ok(&self.rates.rates)
    }

    /// Firing rates in ascending order.
    pub fn all_rates_sorted(&mut self) -> Result<&[f32]> {
        self.require("all_rates_sorted", RecordingState::Idle)?;
        self.refresh_sorted();
        Ok(&self.rates.sorted)
    }

    /// Spikes per second of neuron `index` over the recorded duration.
    pub fn neuron_rate(&mut self, index: u32) -> Result<f32> {
        self.require("neuron_rate", RecordingState::Idle)?;
        let index = self.check_neuron(index)?;
        self.refresh_rates();
        Ok(self.rates.rates[index])
    }

    pub fn neuron_spike_count(&self, index: u32) -> Result<usize> {
        self.require("neuron_spike_count", RecordingState::Idle)?;
        let index = self.check_neuron(index)?;
        Ok(self.spikes[index].len())
    }

    pub fn population_spike_count(&self) -> Result<u64> {
        self.require("population_spike_count", RecordingState::Idle)?;
        Ok(self.total_spikes())
    }

    pub(crate) fn total_spikes(&self) -> u64 {
        self.spikes.iter().map(|buffer| buffer.len() as u64).sum()
    }

    /// Mean rate across the population: total spikes / (duration * neurons).
    pub fn population_mean_rate(&self) -> Result<f32> {
        self.require("population_mean_rate", RecordingState::Idle)?;
        match self.total_time() {
            Some(total) if total > 0 => {
                let denominator = total as f64 * f64::from(self.neuron_count());
                Ok((self.total_spikes() as f64 * 1000.0 / denominator) as f32)
            }
            _ => Ok(0.0),
        }
    }

    /// Sample standard deviation (n - 1) of the per-neuron rates.
    pub fn population_std_rate(&mut self) -> Result<f32> {
        self.require("population_std_rate", RecordingState::Idle)?;
        let n = self.rates.rates.len();
        if n <= 1 || !matches!(self.total_time(), Some(total) if total > 0) {
            return Ok(0.0);
        }
        self.refresh_rates();

        let rates = &self.rates.rates;
        let mean = rates.iter().map(|&r| f64::from(r)).sum::<f64>() / n as f64;
        let sum_sq: f64 = rates
            .iter()
            .map(|&r| {
                let d = f64::from(r) - mean;
                d * d
            })
            .sum();
        Ok((sum_sq / (n - 1) as f64).sqrt() as f32)
    }

    pub fn min_rate(&mut self) -> Result<f32> {
        self.require("min_rate", RecordingState::Idle)?;
        self.refresh_sorted();
        Ok(self.rates.sorted.first().copied().unwrap_or(0.0))
    }

    pub fn max_rate(&mut self) -> Result<f32> {
        self.require("max_rate", RecordingState::Idle)?;
        self.refresh_sorted();
        Ok(self.rates.sorted.last().copied().unwrap_or(0.0))
    }

    /// Number of neurons whose rate lies in `[lo, hi]`.
    ///
    /// Requires `0 <= lo <= hi`; NaN bounds are rejected.
    pub fn count_in_range(&mut self, lo: f32, hi: f32) -> Result<u32> {
        self.require("count_in_range", RecordingState::Idle)?;
        if lo.is_nan() || hi.is_nan() || lo < 0.0 || lo > hi {
            return Err(MonitorError::InvalidRange { lo, hi });
        }
        self.refresh_sorted();

        let sorted = &self.rates.sorted;
        let first = sorted.partition_point(|&rate| rate < lo);
        let past_last = sorted.partition_point(|&rate| rate <= hi);
        Ok(past_last.saturating_sub(first) as u32)
    }

    pub fn percent_in_range(&mut self, lo: f32, hi: f32) -> Result<f32> {
        let count = self.count_in_range(lo, hi)?;
        Ok(count as f32 * 100.0 / self.neuron_count() as f32)
    }

    /// Neurons that did not fire at all during the recorded duration.
    pub fn silent_neuron_count(&mut self) -> Result<u32> {
        self.count_in_range(0.0, 0.0)
    }

    pub fn percent_silent_neurons(&mut self) -> Result<f32> {
        self.percent_in_range(0.0, 0.0)
    }

    /// How many times the per-neuron rates have been rebuilt
    pub fn rate_recompute_count(&self) -> u64 {
        self.rates.recompute_count
    }

    /// How many times the sorted rate sequence has been rebuilt
    pub fn rate_sort_count(&self) -> u64 {
        self.rates.sort_count
    }
}

#[cfg(test)]
mod tests {
    use crate::{ManualClock, MonitorError, MonitorSession};

    /// Record `counts[i]` spikes for neuron i over `[0, duration_ms]`.
    fn recorded(counts: &[usize], duration_ms: i64) -> MonitorSession<ManualClock> {
        let clock = ManualClock::new(0);
        let mut monitor =
            MonitorSession::new("analysis", 7, counts.len() as u32, clock.clone()).unwrap();
        monitor.start().unwrap();
        for (neuron, &count) in counts.iter().enumerate() {
            for t in 0..count {
                monitor.push_event(neuron as u32, t as i64).unwrap();
            }
        }
        clock.set_ms(duration_ms);
        monitor.stop().unwrap();
        monitor
    }

    #[test]
    fn test_rates_and_population_stats() {
        let mut monitor = recorded(&[0, 2, 4, 6], 2000);

        assert_eq!(monitor.all_rates().unwrap(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(monitor.population_spike_count().unwrap(), 12);
        assert_eq!(monitor.neuron_spike_count(3).unwrap(), 6);
        assert_eq!(monitor.population_mean_rate().unwrap(), 1.5);

        // rates 0,1,2,3: sample variance 5/3
        let std = monitor.population_std_rate().unwrap();
        assert!((std - (5.0f32 / 3.0).sqrt()).abs() < 1e-6);

        assert_eq!(monitor.min_rate().unwrap(), 0.0);
        assert_eq!(monitor.max_rate().unwrap(), 3.0);
        assert_eq!(monitor.silent_neuron_count().unwrap(), 1);
        assert_eq!(monitor.percent_silent_neurons().unwrap(), 25.0);
        assert_eq!(monitor.count_in_range(1.0, 2.0).unwrap(), 2);
        assert_eq!(monitor.percent_in_range(0.5, 10.0).unwrap(), 75.0);
    }

    #[test]
    fn test_queries_are_cached_between_mutations() {
        let mut monitor = recorded(&[3, 1, 2], 1000);

        let first = monitor.all_rates().unwrap().to_vec();
        let max = monitor.max_rate().unwrap();
        let silent = monitor.silent_neuron_count().unwrap();
        for _ in 0..5 {
            assert_eq!(monitor.all_rates().unwrap(), first.as_slice());
            assert_eq!(monitor.max_rate().unwrap().to_bits(), max.to_bits());
            assert_eq!(monitor.silent_neuron_count().unwrap(), silent);
        }
        assert_eq!(monitor.rate_recompute_count(), 1);
        assert_eq!(monitor.rate_sort_count(), 1);

        monitor.clear().unwrap();
        assert_eq!(monitor.max_rate().unwrap(), 0.0);
        assert_eq!(monitor.rate_recompute_count(), 2);
        assert_eq!(monitor.rate_sort_count(), 2);
    }

    #[test]
    fn test_sort_recomputes_stale_rates_first() {
        let mut monitor = recorded(&[1, 5], 1000);
        assert_eq!(monitor.all_rates_sorted().unwrap(), &[1.0, 5.0]);
        assert_eq!(monitor.rate_recompute_count(), 1);
        assert_eq!(monitor.rate_sort_count(), 1);
    }

    #[test]
    fn test_zero_duration_yields_zero_rates() {
        let mut monitor = recorded(&[4, 2], 0);
        assert_eq!(monitor.total_time(), Some(0));
        assert_eq!(monitor.all_rates().unwrap(), &[0.0, 0.0]);
        assert_eq!(monitor.population_mean_rate().unwrap(), 0.0);
        assert_eq!(monitor.population_std_rate().unwrap(), 0.0);
        assert_eq!(monitor.silent_neuron_count().unwrap(), 2);
    }

    #[test]
    fn test_never_recorded_session() {
        let mut monitor = MonitorSession::new("fresh", 0, 3, ManualClock::new(0)).unwrap();
        assert_eq!(monitor.neuron_rate(1).unwrap(), 0.0);
        assert_eq!(monitor.silent_neuron_count().unwrap(), 3);
        assert_eq!(monitor.population_spike_count().unwrap(), 0);
    }

    #[test]
    fn test_single_neuron_std_is_zero() {
        let mut monitor = recorded(&[10], 1000);
        assert_eq!(monitor.population_std_rate().unwrap(), 0.0);
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        let mut monitor = recorded(&[1, 2], 1000);
        for (lo, hi) in [(-1.0, 2.0), (3.0, 2.0), (f32::NAN, 1.0), (0.0, f32::NAN)] {
            assert!(matches!(
                monitor.count_in_range(lo, hi),
                Err(MonitorError::InvalidRange { .. })
            ));
        }
        assert!(matches!(
            monitor.neuron_rate(2),
            Err(MonitorError::NeuronOutOfRange { index: 2, .. })
        ));
    }
}
