// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Streaming spike file writer

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::{Result, SpikeFileHeader, SpikeRecord};

/// Writes the header on construction, then appends records in call order.
///
/// The header is written exactly once per writer; a new sink needs a new writer.
///
/// Record bytes go through a staging buffer that is drained with plain `write` calls.
/// When the sink fails partway, the bytes it already accepted are dropped from the
/// buffer and the next write or flush resumes at the first unaccepted byte, so the
/// record stream on disk stays aligned to 8-byte boundaries.
#[derive(Debug)]
pub struct SpikeFileWriter<W: Write> {
    sink: W,
    staged: Vec<u8>,
    staged_offset: usize,
    record_bytes_accepted: u64,
}

impl SpikeFileWriter<BufWriter<File>> {
    /// Create (or truncate) a spike file and write its header.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        debug!(target: "spikemon-format", "Created spike file {}", path.as_ref().display());
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> SpikeFileWriter<W> {
    pub fn new(mut sink: W) -> Result<Self> {
        SpikeFileHeader::default().write_to(&mut sink)?;
        Ok(Self {
            sink,
            staged: Vec::new(),
            staged_offset: 0,
            record_bytes_accepted: 0,
        })
    }

    /// Encode a record into the staging buffer without touching the sink.
    #[inline]
    pub fn stage(&mut self, record: SpikeRecord) {
        let start = self.staged.len();
        self.staged.resize(start + SpikeRecord::BYTE_COUNT, 0);
        record.encode(&mut self.staged[start..]);
    }

    pub fn write_record(&mut self, record: SpikeRecord) -> Result<()> {
        self.stage(record);
        self.drain_staged()
    }

    /// Encode a batch and hand it to the sink in as few writes as it accepts.
    pub fn write_records(&mut self, records: &[SpikeRecord]) -> Result<()> {
        for &record in records {
            self.stage(record);
        }
        self.drain_staged()
    }

    /// Drain staged records, then flush the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.drain_staged()?;
        self.sink.flush()?;
        Ok(())
    }

    fn drain_staged(&mut self) -> Result<()> {
        while self.staged_offset < self.staged.len() {
            match self.sink.write(&self.staged[self.staged_offset..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "spike sink accepted no bytes",
                    )
                    .into())
                }
                Ok(n) => {
                    self.staged_offset += n;
                    self.record_bytes_accepted += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.staged.clear();
        self.staged_offset = 0;
        Ok(())
    }

    /// Records fully handed to the sink so far (header excluded)
    pub fn records_written(&self) -> u64 {
        self.record_bytes_accepted / SpikeRecord::BYTE_COUNT as u64
    }

    /// Records staged but not yet fully accepted by the sink; a record the sink took
    /// only part of counts as staged.
    pub fn staged_records(&self) -> usize {
        (self.staged.len() - self.staged_offset).div_ceil(SpikeRecord::BYTE_COUNT)
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Flush and return the underlying sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_written_on_construction() {
        let writer = SpikeFileWriter::new(Vec::new()).unwrap();
        assert_eq!(writer.get_ref().len(), SpikeFileHeader::BYTE_COUNT);
        assert_eq!(writer.records_written(), 0);
    }

    #[test]
    fn test_batch_matches_single_writes() {
        let records = [SpikeRecord::new(1, 0), SpikeRecord::new(5, 9), SpikeRecord::new(5, 2)];

        let mut single = SpikeFileWriter::new(Vec::new()).unwrap();
        for record in records {
            single.write_record(record).unwrap();
        }
        let mut batch = SpikeFileWriter::new(Vec::new()).unwrap();
        batch.write_records(&records).unwrap();

        assert_eq!(batch.records_written(), 3);
        assert_eq!(single.into_inner().unwrap(), batch.into_inner().unwrap());
    }

    /// Sink that accepts a fixed number of bytes, then fails until given more budget
    struct BudgetSink {
        bytes: Vec<u8>,
        budget: usize,
    }

    impl Write for BudgetSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "sink unavailable"));
            }
            let n = buf.len().min(self.budget);
            self.bytes.extend_from_slice(&buf[..n]);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_partial_write_resumes_on_record_boundary() {
        let sink = BudgetSink {
            bytes: Vec::new(),
            budget: SpikeFileHeader::BYTE_COUNT + 12,
        };
        let mut writer = SpikeFileWriter::new(sink).unwrap();

        let records = [SpikeRecord::new(10, 1), SpikeRecord::new(20, 2)];
        assert!(writer.write_records(&records).is_err());
        assert_eq!(writer.records_written(), 1);
        assert_eq!(writer.staged_records(), 1);

        writer.sink.budget = usize::MAX;
        writer.flush().unwrap();
        assert_eq!(writer.records_written(), 2);
        assert_eq!(writer.staged_records(), 0);

        let bytes = writer.into_inner().unwrap().bytes;
        let decoded: Vec<SpikeRecord> = bytes[SpikeFileHeader::BYTE_COUNT..]
            .chunks_exact(SpikeRecord::BYTE_COUNT)
            .map(SpikeRecord::decode)
            .collect();
        assert_eq!(decoded, records);
    }
}
