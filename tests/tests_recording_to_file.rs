// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # End-to-End Tests
//!
//! A monitor records to disk and the offline reader reads the file back, raw and binned.

use ndarray::array;
use spikemon::prelude::*;
use tempfile::TempDir;

/// Record `events` in one probe of `duration_ms` into `path`
fn record_to_file(
    path: &std::path::Path,
    neurons: u32,
    events: &[(u32, i64)],
    duration_ms: i64,
) -> MonitorSession<ManualClock> {
    let clock = ManualClock::new(0);
    let mut monitor = MonitorSession::new("e2e", 0, neurons, clock.clone()).unwrap();
    monitor.bind_output_file(path).unwrap();
    monitor.start().unwrap();
    for &(neuron, t) in events {
        monitor.push_event(neuron, t).unwrap();
    }
    clock.set_ms(duration_ms);
    monitor.stop().unwrap();
    monitor
}

#[test]
fn test_recorded_spikes_read_back_raw() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("population.dat");

    let events: Vec<(u32, i64)> = (0..2_500).map(|i| ((i * 13 % 50) as u32, i)).collect();
    let monitor = record_to_file(&path, 50, &events, 2_500);
    drop(monitor);

    let mut reader = SpikeFileReader::open(&path)
        .unwrap()
        .with_chunk_records(300)
        .unwrap();
    let records = reader.read_all().unwrap();

    let expected: Vec<SpikeRecord> = events
        .iter()
        .map(|&(n, t)| SpikeRecord::new(t as i32, n as i32))
        .collect();
    assert_eq!(records, expected);
}

#[test]
fn test_recorded_spikes_read_back_binned() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("binned.dat");

    let events = [(3, 0), (3, 500), (3, 999), (3, 1000), (3, 2500)];
    let mut monitor = record_to_file(&path, 4, &events, 3_000);
    assert_eq!(monitor.neuron_spike_count(3).unwrap(), 5);
    monitor.close_output().unwrap();

    let data = SpikeFileReader::open(&path)
        .unwrap()
        .read(ReadMode::Binned { bin_width_ms: 1000 })
        .unwrap();
    let SpikeData::Binned(matrix) = data else {
        panic!("expected binned data");
    };

    assert_eq!(matrix.get(1, 4), 3);
    assert_eq!(matrix.get(2, 4), 1);
    assert_eq!(matrix.get(3, 4), 1);
    assert_eq!(
        matrix.as_array(),
        &array![[0u32, 0, 0, 3], [0, 0, 0, 1], [0, 0, 0, 1]]
    );
}

#[test]
fn test_persistent_probes_append_to_one_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("persistent.dat");

    let clock = ManualClock::new(0);
    let mut monitor = MonitorSession::new("persistent", 1, 2, clock.clone()).unwrap();
    monitor.set_persistent_mode(true).unwrap();
    monitor.bind_output_file(&path).unwrap();

    for (probe_start, probe_stop, neuron) in [(0, 100, 0), (500, 550, 1)] {
        clock.set_ms(probe_start);
        monitor.start().unwrap();
        monitor.push_event(neuron, probe_start + 1).unwrap();
        clock.set_ms(probe_stop);
        monitor.stop().unwrap();
    }
    assert_eq!(monitor.total_time(), Some(150));

    let records = SpikeFileReader::open(&path).unwrap().read_all().unwrap();
    assert_eq!(records, vec![SpikeRecord::new(1, 0), SpikeRecord::new(501, 1)]);
}

#[test]
fn test_corrupted_file_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("corrupted.dat");
    record_to_file(&path, 1, &[(0, 1)], 10);

    let mut bytes = std::fs::read(&path).unwrap();
    bytes[0] ^= 0xFF;
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        SpikeFileReader::open(&path),
        Err(FormatError::InvalidSignature { .. })
    ));
}
