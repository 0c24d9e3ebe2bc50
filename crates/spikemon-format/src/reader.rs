// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Chunked offline spike file reader
//!
//! The header is validated before anything else is read. Records are then pulled in
//! bulk chunks to bound memory; a short or empty read ends the stream.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::header::read_up_to;
use crate::{FormatError, OccupancyMatrix, Result, SpikeFileHeader, SpikeRecord};

/// Records decoded per bulk read unless configured otherwise
pub const DEFAULT_CHUNK_RECORDS: usize = 1_000_000;

/// How decoded records are returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Raw `(time, neuron_id)` pairs in file order
    Aer,
    /// Occupancy matrix with the given bin width in ms
    Binned { bin_width_ms: u32 },
}

/// Result of a full read
#[derive(Debug, Clone, PartialEq)]
pub enum SpikeData {
    Aer(Vec<SpikeRecord>),
    Binned(OccupancyMatrix),
}

pub struct SpikeFileReader<R: Read> {
    source: R,
    header: SpikeFileHeader,
    chunk_records: usize,
    buf: Vec<u8>,
    records_read: u64,
    exhausted: bool,
}

impl SpikeFileReader<BufReader<File>> {
    /// Open a spike file and validate its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        debug!(target: "spikemon-format", "Opened spike file {}", path.as_ref().display());
        Self::new(BufReader::new(file))
    }
}

impl<R: Read> SpikeFileReader<R> {
    /// Validate the header. On failure no record bytes have been consumed.
    pub fn new(mut source: R) -> Result<Self> {
        let header = SpikeFileHeader::read_from(&mut source)?;
        Ok(Self {
            source,
            header,
            chunk_records: DEFAULT_CHUNK_RECORDS,
            buf: Vec::new(),
            records_read: 0,
            exhausted: false,
        })
    }

    pub fn with_chunk_records(mut self, chunk_records: usize) -> Result<Self> {
        if chunk_records == 0 {
            return Err(FormatError::InvalidChunkSize);
        }
        self.chunk_records = chunk_records;
        Ok(self)
    }

    pub fn header(&self) -> &SpikeFileHeader {
        &self.header
    }

    pub fn chunk_records(&self) -> usize {
        self.chunk_records
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Decode the next chunk; `None` once the file is exhausted.
    ///
    /// A trailing partial record (fewer than 8 bytes before EOF) is discarded with a warning.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<SpikeRecord>>> {
        if self.exhausted {
            return Ok(None);
        }

        let wanted = self.chunk_records * SpikeRecord::BYTE_COUNT;
        self.buf.resize(wanted, 0);
        let got = read_up_to(&mut self.source, &mut self.buf)?;
        if got < wanted {
            self.exhausted = true;
        }

        let trailing = got % SpikeRecord::BYTE_COUNT;
        if trailing != 0 {
            warn!(
                target: "spikemon-format",
                "Discarding {} trailing bytes after record {}",
                trailing,
                self.records_read + (got / SpikeRecord::BYTE_COUNT) as u64
            );
        }

        let records: Vec<SpikeRecord> = self.buf[..got - trailing]
            .chunks_exact(SpikeRecord::BYTE_COUNT)
            .map(SpikeRecord::decode)
            .collect();
        if records.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        self.records_read += records.len() as u64;
        Ok(Some(records))
    }

    /// Raw (AER) mode: every record in file order.
    pub fn read_all(&mut self) -> Result<Vec<SpikeRecord>> {
        let mut all = Vec::new();
        while let Some(chunk) = self.next_chunk()? {
            all.extend_from_slice(&chunk);
        }
        info!(target: "spikemon-format", "Read {} spike records", all.len());
        Ok(all)
    }

    /// Binned mode: accumulate every chunk into one occupancy matrix.
    pub fn read_binned(&mut self, bin_width_ms: u32) -> Result<OccupancyMatrix> {
        let mut matrix = OccupancyMatrix::new(bin_width_ms)?;
        while let Some(chunk) = self.next_chunk()? {
            matrix.accumulate(&chunk)?;
        }
        info!(
            target: "spikemon-format",
            "Binned {} spike records into {}x{} matrix ({} ms bins)",
            self.records_read,
            matrix.rows(),
            matrix.columns(),
            bin_width_ms
        );
        Ok(matrix)
    }

    pub fn read(&mut self, mode: ReadMode) -> Result<SpikeData> {
        match mode {
            ReadMode::Aer => self.read_all().map(SpikeData::Aer),
            ReadMode::Binned { bin_width_ms } => self.read_binned(bin_width_ms).map(SpikeData::Binned),
        }
    }
}
