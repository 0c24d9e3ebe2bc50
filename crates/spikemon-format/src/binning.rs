// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Time-bin × neuron occupancy matrix for binned reads

use ndarray::{s, Array2};

use crate::{FormatError, Result, SpikeRecord};

/// Largest matrix a binned read may allocate (2^28 cells, 1 GiB of `u32` counts)
pub const MAX_MATRIX_CELLS: usize = 1 << 28;

/// Event counts per (time bin, neuron).
///
/// Public indices are 1-based: a record lands in row `floor(time / w) + 1` and column
/// `neuron_id + 1`. Storage is a 0-based `Array2` where cell `[row - 1, column - 1]`
/// holds that count. The matrix only grows.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyMatrix {
    bin_width_ms: u32,
    counts: Array2<u32>,
}

impl OccupancyMatrix {
    pub fn new(bin_width_ms: u32) -> Result<Self> {
        if bin_width_ms == 0 {
            return Err(FormatError::InvalidBinWidth);
        }
        Ok(Self {
            bin_width_ms,
            counts: Array2::zeros((0, 0)),
        })
    }

    pub fn bin_width_ms(&self) -> u32 {
        self.bin_width_ms
    }

    /// Number of time bins (highest row index seen)
    pub fn rows(&self) -> usize {
        self.counts.nrows()
    }

    /// Number of neuron columns (highest column index seen)
    pub fn columns(&self) -> usize {
        self.counts.ncols()
    }

    /// Count at 1-based `(row, column)`; 0 outside the matrix.
    pub fn get(&self, row: usize, column: usize) -> u32 {
        if row == 0 || column == 0 {
            return 0;
        }
        self.counts
            .get((row - 1, column - 1))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_events(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    pub fn nonzero_cells(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn as_array(&self) -> &Array2<u32> {
        &self.counts
    }

    pub fn into_array(self) -> Array2<u32> {
        self.counts
    }

    /// Add one chunk of records. The whole chunk is validated before any cell changes,
    /// including the grown size against [`MAX_MATRIX_CELLS`].
    pub fn accumulate(&mut self, records: &[SpikeRecord]) -> Result<()> {
        let width = i64::from(self.bin_width_ms);
        let mut needed_rows = self.rows();
        let mut needed_cols = self.columns();
        for record in records {
            if record.time < 0 || record.neuron_id < 0 {
                return Err(FormatError::NegativeBinIndex {
                    time: record.time,
                    neuron_id: record.neuron_id,
                });
            }
            let row = (i64::from(record.time) / width) as usize + 1;
            let col = record.neuron_id as usize + 1;
            needed_rows = needed_rows.max(row);
            needed_cols = needed_cols.max(col);
        }

        let cells = needed_rows.checked_mul(needed_cols);
        if cells.map_or(true, |cells| cells > MAX_MATRIX_CELLS) {
            return Err(FormatError::MatrixTooLarge {
                rows: needed_rows,
                cols: needed_cols,
            });
        }
        self.grow(needed_rows, needed_cols);

        for record in records {
            let row = (i64::from(record.time) / width) as usize;
            let col = record.neuron_id as usize;
            self.counts[[row, col]] += 1;
        }
        Ok(())
    }

    fn grow(&mut self, rows: usize, cols: usize) {
        let (old_rows, old_cols) = self.counts.dim();
        if rows <= old_rows && cols <= old_cols {
            return;
        }
        let mut grown = Array2::zeros((rows.max(old_rows), cols.max(old_cols)));
        grown
            .slice_mut(s![..old_rows, ..old_cols])
            .assign(&self.counts);
        self.counts = grown;
    }
}
