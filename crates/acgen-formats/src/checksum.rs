//! ACPI table checksum
//!
//! A finalized table's bytes, checksum included, sum to zero modulo 256. The
//! checksum byte sits at offset 9 of the header, right after `Revision`.

use crate::header::TableHeader;
use thiserror::Error;

/// Offset of the checksum byte within a table
pub const CHECKSUM_OFFSET: usize = TableHeader::CHECKSUM_OFFSET;

/// Errors raised by checksum finalization
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChecksumError {
    /// The record does not reach the checksum byte
    #[error("record of {len} bytes has no checksum byte at offset 9")]
    RecordTooShort {
        /// Record length
        len: usize,
    },
}

impl ChecksumError {
    /// Taxonomy name of this condition
    pub fn condition(&self) -> &'static str {
        match self {
            Self::RecordTooShort { .. } => "RecordTooShort",
        }
    }
}

/// Wrapping byte sum of `bytes`
pub fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Checksum byte for `record`, treating its current checksum byte as zero
pub fn compute(record: &[u8]) -> Result<u8, ChecksumError> {
    let current = *record
        .get(CHECKSUM_OFFSET)
        .ok_or(ChecksumError::RecordTooShort { len: record.len() })?;
    Ok(0u8.wrapping_sub(sum(record).wrapping_sub(current)))
}

/// Patch the checksum byte in place and return it
///
/// Only the checksum byte is touched. Finalizing an already finalized
/// record writes back the same value.
pub fn finalize(record: &mut [u8]) -> Result<u8, ChecksumError> {
    let checksum = compute(record)?;
    record[CHECKSUM_OFFSET] = checksum;
    Ok(checksum)
}

/// Whether `record` sums to zero modulo 256
pub fn is_valid(record: &[u8]) -> bool {
    sum(record) == 0
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// 36-byte header, `Length = 36`, other bytes summing to 0x07
    fn sample_header() -> Vec<u8> {
        let mut header = vec![0u8; 36];
        header[4] = 36; // Length (0x24)
        header[0] = 0x07u8.wrapping_sub(36); // Rest of the bytes bring the sum to 0x07
        header
    }

    #[test]
    fn test_documented_example() {
        let mut header = sample_header();
        assert_eq!(sum(&header), 0x07);

        let checksum = finalize(&mut header).expect("Test operation should succeed");
        assert_eq!(checksum, 0xF9);
        assert_eq!(header[CHECKSUM_OFFSET], 0xF9);
        assert!(is_valid(&header));
    }

    #[test]
    fn test_documented_example_between_magics() {
        use crate::magic::{END_MAGIC, START_MAGIC, scan_all};

        let mut artifact = b"lead".to_vec();
        artifact.extend_from_slice(&START_MAGIC);
        artifact.extend_from_slice(&sample_header());
        artifact.extend_from_slice(&END_MAGIC);
        artifact.extend_from_slice(b"tail");

        let records = scan_all(&artifact).expect("Test operation should succeed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].len(), 36);
        records[0]
            .validate_length(&artifact)
            .expect("Test operation should succeed");

        let mut table = records[0].bytes(&artifact).to_vec();
        assert_eq!(finalize(&mut table), Ok(0xF9));
        assert!(is_valid(&table));
    }

    #[test]
    fn test_idempotent() {
        let mut header = sample_header();
        let first = finalize(&mut header).expect("Test operation should succeed");
        let snapshot = header.clone();
        let second = finalize(&mut header).expect("Test operation should succeed");
        assert_eq!(first, second);
        assert_eq!(header, snapshot);
    }

    #[test]
    fn test_stale_checksum_is_ignored() {
        let mut header = sample_header();
        header[CHECKSUM_OFFSET] = 0x5A;
        assert_eq!(compute(&header), Ok(0xF9));
    }

    #[test]
    fn test_too_short() {
        let mut short = vec![0u8; CHECKSUM_OFFSET];
        assert_eq!(
            finalize(&mut short),
            Err(ChecksumError::RecordTooShort { len: 9 })
        );
        assert_eq!(compute(&[0u8; 10]), Ok(0));
    }

    proptest! {
        #[test]
        fn prop_finalized_sums_to_zero(mut record in proptest::collection::vec(any::<u8>(), 10..512)) {
            finalize(&mut record).expect("Test operation should succeed");
            prop_assert!(is_valid(&record));
        }

        #[test]
        fn prop_only_checksum_byte_changes(record in proptest::collection::vec(any::<u8>(), 10..256)) {
            let mut patched = record.clone();
            finalize(&mut patched).expect("Test operation should succeed");
            for (i, (a, b)) in record.iter().zip(&patched).enumerate() {
                if i != CHECKSUM_OFFSET {
                    prop_assert_eq!(a, b);
                }
            }
        }
    }
}
