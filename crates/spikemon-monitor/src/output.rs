// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spike file sink bound to a monitor
//!
//! Records are staged while recording and written in bulk when the session stops or is
//! flushed. A failed write keeps every byte the sink has not accepted; the next flush
//! resumes exactly where the sink stopped.

use std::io::Write;

use spikemon_format::{SpikeFileWriter, SpikeRecord};

use crate::Result;

pub(crate) type BoxedSink = Box<dyn Write + Send>;

pub(crate) struct OutputBinding {
    label: String,
    writer: SpikeFileWriter<BoxedSink>,
}

impl OutputBinding {
    /// Writes and flushes the file header immediately.
    pub(crate) fn new(label: String, sink: BoxedSink) -> Result<Self> {
        let mut writer = SpikeFileWriter::new(sink)?;
        writer.flush()?;
        Ok(Self { label, writer })
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub(crate) fn queue(&mut self, record: SpikeRecord) {
        self.writer.stage(record);
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.writer.staged_records()
    }

    pub(crate) fn records_written(&self) -> u64 {
        self.writer.records_written()
    }

    pub(crate) fn flush_pending(&mut self) -> Result<usize> {
        let before = self.writer.records_written();
        self.writer.flush()?;
        Ok((self.writer.records_written() - before) as usize)
    }
}
