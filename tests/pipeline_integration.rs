//! End-to-end pipeline: scan, persist, reload, score.

use std::fs;

use tbt::db::{Algorithm, HashStore};
use tbt::scan::{ScanOrchestrator, Selection};
use tbt::{Comparator, TbtError};

#[test]
fn rescan_of_identical_tree_scores_100_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("report.txt"),
        b"quarterly numbers, padded out so the chunker has material to work with",
    )
    .unwrap();

    let scanner = ScanOrchestrator::with_defaults();
    let baseline = scanner.scan(dir.path(), Selection::All).unwrap();
    let fresh = scanner.scan(dir.path(), Selection::All).unwrap();

    let comparator = Comparator::with_defaults();
    for algorithm in [Algorithm::Ctph, Algorithm::Simhash] {
        let left = baseline.select(algorithm).unwrap();
        let right = fresh.select(algorithm).unwrap();
        let report = comparator.compare_across(left, right).unwrap();
        assert!(!report.is_empty());
        for entry in report.entries() {
            assert_eq!(entry.score, 100, "{algorithm} self-similarity");
        }
    }
}

#[test]
fn near_duplicate_files_score_above_unrelated_ones() {
    let dir = tempfile::tempdir().unwrap();
    let base: Vec<u8> = (0..20_000u32)
        .map(|i| (i.wrapping_mul(2654435761) >> 24) as u8)
        .collect();
    let mut tweaked = base.clone();
    for b in &mut tweaked[10_000..10_016] {
        *b ^= 0x5A;
    }
    let unrelated: Vec<u8> = (0..20_000u32)
        .map(|i| (i.wrapping_mul(40503).wrapping_add(977) >> 8) as u8)
        .collect();

    fs::write(dir.path().join("base"), &base).unwrap();
    fs::write(dir.path().join("tweaked"), &tweaked).unwrap();
    fs::write(dir.path().join("unrelated"), &unrelated).unwrap();

    let store = ScanOrchestrator::with_defaults()
        .scan(dir.path(), Selection::All)
        .unwrap();
    let comparator = Comparator::with_defaults();

    for algorithm in [Algorithm::Ctph, Algorithm::Simhash] {
        let db = store.select(algorithm).unwrap();
        let report = comparator.compare_database(db, None).unwrap();
        let score_of = |a: &str, b: &str| {
            report
                .entries()
                .iter()
                .find(|e| {
                    e.identifier_a.ends_with(a) && e.identifier_b.ends_with(b)
                        || e.identifier_a.ends_with(b) && e.identifier_b.ends_with(a)
                })
                .map(|e| e.score)
                .unwrap()
        };
        let near = score_of("base", "tweaked");
        let far = score_of("base", "unrelated");
        assert!(near > far, "{algorithm}: near={near} far={far}");
    }
}

#[test]
fn cross_algorithm_comparison_is_rejected_before_output() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("input"), b"bytes to hash for the mismatch test").unwrap();

    let scanner = ScanOrchestrator::with_defaults();
    let ctph_store = scanner.scan(dir.path(), Selection::Ctph).unwrap();
    let db_path = dir.path().join("ctph.db");
    ctph_store.save(&db_path).unwrap();

    // Loading a CTPH-only database and requesting SIMHASH must fail with a
    // non-empty message and must never yield a numeric score.
    let loaded = HashStore::load(&db_path).unwrap();
    let err = loaded.select(Algorithm::Simhash).unwrap_err();
    assert!(matches!(err, TbtError::AlgorithmMismatch { .. }));
    assert!(err.to_string().contains("SIMHASH"));

    let simhash_store = scanner.scan(dir.path(), Selection::Simhash).unwrap();
    let comparator = Comparator::with_defaults();
    let a = &ctph_store.select(Algorithm::Ctph).unwrap().records()[0];
    let b = &simhash_store.select(Algorithm::Simhash).unwrap().records()[0];
    assert!(comparator.compare(&a.digest, &b.digest).is_err());
}

#[test]
fn failed_save_leaves_no_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("input"), b"content").unwrap();
    let store = ScanOrchestrator::with_defaults()
        .scan(dir.path(), Selection::Ctph)
        .unwrap();

    // Destination directory does not exist: the temp file cannot be
    // created there, so nothing is published.
    let target = dir.path().join("missing-dir").join("out.db");
    assert!(store.save(&target).is_err());
    assert!(!target.exists());
}

