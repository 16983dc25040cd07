#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for the author → embed → scan → finalize lifecycle
//!
//! Authors the built-in platform tables, embeds them in synthetic artifacts
//! and checks that extraction yields byte-identical, finalizable records.

use acgen_formats::author::Artifact;
use acgen_formats::checksum;
use acgen_formats::magic::{MagicScanner, ScanError, START_MAGIC, scan_all};
use acgen_formats::platform::{Platform, qcom};
use acgen_formats::{SchemaError, TableHeader};
use pretty_assertions::assert_eq;

fn every_table() -> Vec<Vec<u8>> {
    Platform::ALL
        .into_iter()
        .flat_map(|platform| platform.tables().expect("Test operation should succeed"))
        .collect()
}

// --- Full lifecycle ---

#[test]
fn platform_tables_extract_and_finalize() {
    let tables = every_table();
    let mut artifact = Artifact::new();
    artifact.filler(b"\x7fELF\x02\x01\x01");
    for table in &tables {
        artifact.embed(table).filler(&[0u8; 5]);
    }
    let bytes = artifact.into_bytes();

    let records = scan_all(&bytes).expect("Test operation should succeed");
    assert_eq!(records.len(), tables.len());

    for (record, original) in records.iter().zip(&tables) {
        let header = record
            .validate_length(&bytes)
            .expect("Test operation should succeed");
        assert_eq!(header.length as usize, original.len());
        assert_eq!(header.checksum, 0, "authored tables carry a zero checksum");

        let mut table = record.bytes(&bytes).to_vec();
        let value = checksum::finalize(&mut table).expect("Test operation should succeed");
        assert!(checksum::is_valid(&table));
        assert_eq!(table[TableHeader::CHECKSUM_OFFSET], value);

        // Only the checksum byte differs from the authored table
        let differing: Vec<usize> = table
            .iter()
            .zip(original)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert!(differing.is_empty() || differing == vec![TableHeader::CHECKSUM_OFFSET]);
    }
}

#[test]
fn back_to_back_instances_are_independent() {
    let gtdt = qcom::sm8150_gtdt().expect("Test operation should succeed");
    let dbg2 = qcom::sm8850_dbg2().expect("Test operation should succeed");

    let mut artifact = Artifact::new();
    artifact.embed(&gtdt).embed(&dbg2);
    let bytes = artifact.into_bytes();

    let records = scan_all(&bytes).expect("Test operation should succeed");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].range().end + 8, records[1].range().start);

    let mut first = records[0].bytes(&bytes).to_vec();
    let mut second = records[1].bytes(&bytes).to_vec();
    checksum::finalize(&mut first).expect("Test operation should succeed");
    checksum::finalize(&mut second).expect("Test operation should succeed");

    // Finalizing each alone gives the same result as finalizing together
    let mut lone = gtdt.clone();
    checksum::finalize(&mut lone).expect("Test operation should succeed");
    assert_eq!(first, lone);
    assert_eq!(second.len(), qcom::SM8850_DBG2_SIZE);
    assert!(checksum::is_valid(&second));
}

#[test]
fn repeated_instances_yield_disjoint_records() {
    let gtdt = qcom::sm8150_gtdt().expect("Test operation should succeed");
    let mut artifact = Artifact::new();
    for n in 0..6u8 {
        artifact.filler(&vec![0xA5; usize::from(n)]).embed(&gtdt);
    }
    let bytes = artifact.into_bytes();

    let records: Vec<_> = MagicScanner::new(&bytes)
        .collect::<Result<_, _>>()
        .expect("Test operation should succeed");
    assert_eq!(records.len(), 6);
    for pair in records.windows(2) {
        assert!(pair[0].range().end < pair[1].range().start);
    }
    for record in &records {
        assert_eq!(record.bytes(&bytes), gtdt.as_slice());
    }
}

// --- Failure modes ---

#[test]
fn trailing_start_magic_aborts_scan() {
    let mut artifact = Platform::Sm8850.artifact().expect("Test operation should succeed");
    artifact.filler(&START_MAGIC).filler(b"DBG2");

    match scan_all(artifact.as_bytes()) {
        Err(ScanError::TruncatedArtifact { .. }) => {}
        other => panic!("expected TruncatedArtifact, got {other:?}"),
    }
}

#[test]
fn corrupted_length_is_detected() {
    let mut gtdt = qcom::sm8150_gtdt().expect("Test operation should succeed");
    gtdt[TableHeader::LENGTH_OFFSET] = 0x90;

    let mut artifact = Artifact::new();
    artifact.embed(&gtdt);
    let bytes = artifact.into_bytes();

    let records = scan_all(&bytes).expect("Test operation should succeed");
    let err = records[0]
        .validate_length(&bytes)
        .expect_err("Test operation should fail");
    assert_eq!(err.condition(), "LengthMismatch");
}

#[test]
fn wrong_documented_size_is_rejected() {
    use acgen_formats::tables::gtdt;

    let block = gtdt::timer_block(1).expect("Test operation should succeed");
    let err = gtdt::table(&[("GENERIC_TIMER", block)], 152).expect_err("Test operation should fail");
    assert!(matches!(
        err,
        SchemaError::SizeMismatch {
            expected: 152,
            actual: 156,
            ..
        }
    ));
}
