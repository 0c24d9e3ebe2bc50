// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Spike File Format
//!
//! Binary format shared by the spike monitor (writer) and offline analysis (reader).
//!
//! ## Layout
//! ```text
//! [Header]  8 bytes
//! - Signature: i32 = 206661989
//! - Version:   f32 = 1.0
//! [Records] 8 bytes each, until EOF
//! - time:      i32 (ms)
//! - neuron_id: i32
//! ```
//! All fields are little-endian. There is no record count and no trailer.
//!
//! ## Usage
//! ```rust
//! use spikemon_format::{SpikeFileReader, SpikeFileWriter, SpikeRecord};
//! use std::io::Cursor;
//!
//! let mut writer = SpikeFileWriter::new(Vec::new()).unwrap();
//! writer.write_record(SpikeRecord::new(12, 3)).unwrap();
//! let bytes = writer.into_inner().unwrap();
//!
//! let mut reader = SpikeFileReader::new(Cursor::new(bytes)).unwrap();
//! assert_eq!(reader.read_all().unwrap(), vec![SpikeRecord::new(12, 3)]);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use thiserror::Error;

mod binning;
mod header;
mod reader;
mod record;
mod writer;

pub use binning::{OccupancyMatrix, MAX_MATRIX_CELLS};
pub use header::{SpikeFileHeader, SPIKE_FILE_SIGNATURE, SPIKE_FILE_VERSION};
pub use reader::{ReadMode, SpikeData, SpikeFileReader, DEFAULT_CHUNK_RECORDS};
pub use record::SpikeRecord;
pub use writer::SpikeFileWriter;

/// Spike file errors
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid spike file signature: expected {expected}, got {found}")]
    InvalidSignature { expected: i32, found: i32 },

    #[error("Unsupported spike file version: expected {expected}, got {found}")]
    UnsupportedVersion { expected: f32, found: f32 },

    #[error("Spike file header truncated: got {found} of {expected} bytes")]
    TruncatedHeader { expected: usize, found: usize },

    #[error("{field} value {value} does not fit in a 32-bit record field")]
    FieldOutOfRange { field: &'static str, value: i64 },

    #[error("Bin width must be > 0 ms")]
    InvalidBinWidth,

    #[error("Chunk size must be > 0 records")]
    InvalidChunkSize,

    #[error("Record ({time}, {neuron_id}) cannot be binned: time and neuron id must be >= 0")]
    NegativeBinIndex { time: i32, neuron_id: i32 },

    #[error("Occupancy matrix of {rows}x{cols} bins exceeds the 2^28 cell limit")]
    MatrixTooLarge { rows: usize, cols: usize },
}

pub type Result<T> = std::result::Result<T, FormatError>;
