// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Spike File Reader

Offline inspection of spike files written by a spike monitor.

Usage:
  cargo run --bin spike_reader -- <spikes.dat> [--bin-width <ms>] [--chunk-records <n>]

Raw mode prints the record count with the time and neuron spans. With `--bin-width` the
records are binned into an occupancy matrix and its shape is printed instead.
*/

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, FromArgMatches, Parser};
use spikemon::config::{load_config, validate_config, ConfigError, SpikemonConfig};
use spikemon::format::{SpikeFileReader, SpikeRecord};
use spikemon::observability::{debug_flags_help, init_logging, parse_debug_flags};
use tracing::{debug, info};

/// Inspect a binary spike file
#[derive(Parser, Debug)]
#[command(name = "spike_reader", version, long_about = None)]
struct Args {
    /// Spike file to read
    path: PathBuf,

    /// Bin width in ms; switches to binned mode
    #[arg(long)]
    bin_width: Option<u32>,

    /// Records read per chunk
    #[arg(long)]
    chunk_records: Option<usize>,

    /// Path to spikemon.toml (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(width) = self.bin_width {
            overrides.insert("bin_width_ms".to_string(), width.to_string());
        }
        if let Some(chunk) = self.chunk_records {
            overrides.insert("chunk_records".to_string(), chunk.to_string());
        }
        if let Some(level) = &self.log_level {
            overrides.insert("log_level".to_string(), level.clone());
        }
        overrides
    }
}

fn resolve_config(args: &Args) -> anyhow::Result<SpikemonConfig> {
    let overrides = args.overrides();
    let config = match load_config(args.config.as_deref(), Some(&overrides)) {
        Ok(config) => config,
        // No config file anywhere is fine for an offline tool
        Err(ConfigError::FileNotFound(_)) if args.config.is_none() => {
            let mut config = SpikemonConfig::default();
            spikemon::config::apply_environment_overrides(&mut config);
            spikemon::config::apply_cli_overrides(&mut config, &overrides);
            config
        }
        Err(e) => return Err(e).context("failed to load configuration"),
    };
    validate_config(&config).context("invalid configuration")?;
    Ok(config)
}

/// Running record count and min/max spans, fed one chunk at a time
#[derive(Debug, Default)]
struct AerSummary {
    records: u64,
    time: Option<(i32, i32)>,
    neuron: Option<(i32, i32)>,
}

fn widen(span: Option<(i32, i32)>, value: i32) -> Option<(i32, i32)> {
    Some(match span {
        Some((lo, hi)) => (lo.min(value), hi.max(value)),
        None => (value, value),
    })
}

impl AerSummary {
    fn add_chunk(&mut self, chunk: &[SpikeRecord]) {
        self.records += chunk.len() as u64;
        for record in chunk {
            self.time = widen(self.time, record.time);
            self.neuron = widen(self.neuron, record.neuron_id);
        }
    }
}

fn report(path: &Path, config: &SpikemonConfig) -> anyhow::Result<()> {
    let mut reader = SpikeFileReader::open(path)
        .with_context(|| format!("cannot open spike file {}", path.display()))?
        .with_chunk_records(config.reader.chunk_records)?;

    let header = *reader.header();
    println!("File:      {}", path.display());
    println!("Signature: {}", header.signature);
    println!("Version:   {:.1}", header.version);
    debug!(target: "spike_reader", "Chunk size: {} records", reader.chunk_records());

    match config.reader.bin_width_ms {
        Some(bin_width_ms) => {
            let matrix = reader.read_binned(bin_width_ms)?;
            println!("Bin width: {} ms", matrix.bin_width_ms());
            println!("Matrix:    {} bins x {} neurons", matrix.rows(), matrix.columns());
            println!("Events:    {}", matrix.total_events());
            println!("Non-zero:  {} cells", matrix.nonzero_cells());
        }
        None => {
            // Chunk by chunk so memory stays bounded by the chunk size
            let mut summary = AerSummary::default();
            while let Some(chunk) = reader.next_chunk()? {
                summary.add_chunk(&chunk);
            }
            println!("Records:   {}", summary.records);
            if let (Some((t_lo, t_hi)), Some((n_lo, n_hi))) = (summary.time, summary.neuron) {
                println!("Time:      {} .. {} ms", t_lo, t_hi);
                println!("Neurons:   {} .. {}", n_lo, n_hi);
            }
        }
    }

    info!(
        target: "spike_reader",
        "Read {} records from {}",
        reader.records_read(),
        path.display()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let debug_flags = parse_debug_flags();

    // --debug-* flags are handled above; clap never sees them
    let matches = Args::command()
        .after_help(debug_flags_help())
        .get_matches_from(std::env::args().filter(|arg| !arg.starts_with("--debug-")));
    let args = Args::from_arg_matches(&matches)?;

    let config = resolve_config(&args)?;
    let _logging = init_logging(
        &debug_flags,
        &config.logging.level,
        config.logging.log_dir.as_deref(),
    )?;

    report(&args.path, &config)
}
