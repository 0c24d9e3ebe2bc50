// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use byteorder::{ByteOrder, LittleEndian};

use crate::{FormatError, Result};

/// One spike event as stored on disk: 8 bytes, `(time, neuron_id)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpikeRecord {
    /// Spike time in ms (simulation-relative)
    pub time: i32,
    pub neuron_id: i32,
}

impl SpikeRecord {
    pub const BYTE_COUNT: usize = 8;

    pub fn new(time: i32, neuron_id: i32) -> Self {
        Self { time, neuron_id }
    }

    /// Narrow an in-memory event to the 32-bit on-disk fields.
    pub fn try_from_event(time_ms: i64, neuron_index: u32) -> Result<Self> {
        let time = i32::try_from(time_ms).map_err(|_| FormatError::FieldOutOfRange {
            field: "time",
            value: time_ms,
        })?;
        let neuron_id = i32::try_from(neuron_index).map_err(|_| FormatError::FieldOutOfRange {
            field: "neuron_id",
            value: i64::from(neuron_index),
        })?;
        Ok(Self { time, neuron_id })
    }

    #[inline]
    pub fn encode(&self, out: &mut [u8]) {
        LittleEndian::write_i32(&mut out[0..4], self.time);
        LittleEndian::write_i32(&mut out[4..8], self.neuron_id);
    }

    #[inline]
    pub fn decode(bytes: &[u8]) -> Self {
        Self {
            time: LittleEndian::read_i32(&bytes[0..4]),
            neuron_id: LittleEndian::read_i32(&bytes[4..8]),
        }
    }
}

impl From<(i32, i32)> for SpikeRecord {
    fn from((time, neuron_id): (i32, i32)) -> Self {
        Self { time, neuron_id }
    }
}
