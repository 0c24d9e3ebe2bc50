// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spike file header

use std::io::{ErrorKind, Read, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::{FormatError, Result};

/// Signature stored in the first four bytes of every spike file
pub const SPIKE_FILE_SIGNATURE: i32 = 206_661_989;

/// The only format version this crate reads and writes
pub const SPIKE_FILE_VERSION: f32 = 1.0;

/// Validated 8-byte spike file header
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeFileHeader {
    pub signature: i32,
    pub version: f32,
}

impl Default for SpikeFileHeader {
    fn default() -> Self {
        Self {
            signature: SPIKE_FILE_SIGNATURE,
            version: SPIKE_FILE_VERSION,
        }
    }
}

impl SpikeFileHeader {
    pub const BYTE_COUNT: usize = 8;

    pub fn to_bytes(&self) -> [u8; Self::BYTE_COUNT] {
        let mut bytes = [0u8; Self::BYTE_COUNT];
        LittleEndian::write_i32(&mut bytes[0..4], self.signature);
        LittleEndian::write_f32(&mut bytes[4..8], self.version);
        bytes
    }

    /// Decode and validate a header. The signature is checked before the version.
    pub fn from_bytes(bytes: &[u8; Self::BYTE_COUNT]) -> Result<Self> {
        let signature = LittleEndian::read_i32(&bytes[0..4]);
        if signature != SPIKE_FILE_SIGNATURE {
            return Err(FormatError::InvalidSignature {
                expected: SPIKE_FILE_SIGNATURE,
                found: signature,
            });
        }

        let version = LittleEndian::read_f32(&bytes[4..8]);
        if version.to_bits() != SPIKE_FILE_VERSION.to_bits() {
            return Err(FormatError::UnsupportedVersion {
                expected: SPIKE_FILE_VERSION,
                found: version,
            });
        }

        Ok(Self { signature, version })
    }

    pub fn write_to<W: Write>(&self, sink: &mut W) -> Result<()> {
        sink.write_i32::<LittleEndian>(self.signature)?;
        sink.write_f32::<LittleEndian>(self.version)?;
        Ok(())
    }

    /// Read exactly the header bytes from `source` and validate them.
    pub fn read_from<R: Read>(source: &mut R) -> Result<Self> {
        let mut bytes = [0u8; Self::BYTE_COUNT];
        let found = read_up_to(source, &mut bytes)?;
        if found < Self::BYTE_COUNT {
            return Err(FormatError::TruncatedHeader {
                expected: Self::BYTE_COUNT,
                found,
            });
        }
        Self::from_bytes(&bytes)
    }
}

/// Fill `buf` as far as the source allows; returns the number of bytes read.
pub(crate) fn read_up_to<R: Read>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_bytes_are_fixed() {
        let bytes = SpikeFileHeader::default().to_bytes();
        assert_eq!(&bytes[0..4], &206_661_989i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_bad_signature_checked_first() {
        let mut bytes = [0u8; 8];
        LittleEndian::write_i32(&mut bytes[0..4], 42);
        LittleEndian::write_f32(&mut bytes[4..8], 2.0);

        let err = SpikeFileHeader::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            FormatError::InvalidSignature { found: 42, .. }
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let header = SpikeFileHeader {
            signature: SPIKE_FILE_SIGNATURE,
            version: 0.3,
        };
        let err = SpikeFileHeader::from_bytes(&header.to_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_truncated_header() {
        let mut source = Cursor::new(vec![1u8, 2, 3]);
        let err = SpikeFileHeader::read_from(&mut source).unwrap_err();
        assert!(matches!(
            err,
            FormatError::TruncatedHeader {
                expected: 8,
                found: 3
            }
        ));
    }
}
