//! Similarity scoring across digests and databases.
//!
//! Cross-algorithm comparisons are rejected outright: CTPH and SIMHASH
//! scores are not commensurable, so mixing them is a hard error, never a
//! silently low score.

use std::fmt;

use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::ctph::CtphEngine;
use crate::db::{Digest, HashDatabase};
use crate::error::{Result, TbtError};
use crate::simhash::SimhashEngine;

/// One scored pair. 0 means unrelated, 100 means (approximately)
/// byte-identical content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub identifier_a: String,
    pub identifier_b: String,
    pub score: u32,
}

/// Ordered sequence of scored pairs.
#[derive(Debug, Clone, Default)]
pub struct SimilarityReport {
    entries: Vec<ReportEntry>,
}

impl SimilarityReport {
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for SimilarityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(
                f,
                "{:3}  {}  {}",
                entry.score, entry.identifier_a, entry.identifier_b
            )?;
        }
        Ok(())
    }
}

/// Scores digest pairs and whole databases.
#[derive(Debug, Clone)]
pub struct Comparator {
    ctph: CtphEngine,
    simhash: SimhashEngine,
}

impl Comparator {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self {
            ctph: CtphEngine::new(cfg.ctph.clone()),
            simhash: SimhashEngine::new(cfg.simhash.clone()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&EngineConfig::default())
    }

    /// Scores two digests of the same algorithm on 0..=100.
    ///
    /// Fails with `AlgorithmMismatch` for cross-algorithm pairs and
    /// `WidthMismatch` for SIMHASH vectors of differing width; a numeric
    /// score is never produced for either.
    pub fn compare(&self, a: &Digest, b: &Digest) -> Result<u32> {
        match (a, b) {
            (Digest::Ctph(x), Digest::Ctph(y)) => self.ctph.compare(x, y),
            (Digest::Simhash(x), Digest::Simhash(y)) => self.simhash.compare(x, y),
            _ => Err(TbtError::algorithm_mismatch(a.algorithm(), &[b.tag()])),
        }
    }

    /// Pairwise comparison of all record pairs (i < j) in one database,
    /// optionally restricted to identifiers containing `identifier_filter`.
    ///
    /// Pairs are scored in parallel; the report order is deterministic
    /// (record order, not worker order).
    pub fn compare_database(
        &self,
        db: &HashDatabase,
        identifier_filter: Option<&str>,
    ) -> Result<SimilarityReport> {
        let records: Vec<_> = db
            .records()
            .iter()
            .filter(|r| {
                identifier_filter
                    .map(|needle| r.identifier.contains(needle))
                    .unwrap_or(true)
            })
            .collect();

        let mut pairs = Vec::new();
        for i in 0..records.len() {
            for j in (i + 1)..records.len() {
                pairs.push((i, j));
            }
        }

        let entries = pairs
            .par_iter()
            .map(|&(i, j)| {
                let score = self.compare(&records[i].digest, &records[j].digest)?;
                Ok(ReportEntry {
                    identifier_a: records[i].identifier.clone(),
                    identifier_b: records[j].identifier.clone(),
                    score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SimilarityReport { entries })
    }

    /// Compares every record of `left` against every record of `right`
    /// (the re-scan-versus-loaded-database mode). Database tags must agree.
    pub fn compare_across(
        &self,
        left: &HashDatabase,
        right: &HashDatabase,
    ) -> Result<SimilarityReport> {
        if left.tag() != right.tag() {
            return Err(TbtError::algorithm_mismatch(left.tag(), &[right.tag()]));
        }

        let mut pairs = Vec::new();
        for i in 0..left.len() {
            for j in 0..right.len() {
                pairs.push((i, j));
            }
        }

        let entries = pairs
            .par_iter()
            .map(|&(i, j)| {
                let a = &left.records()[i];
                let b = &right.records()[j];
                let score = self.compare(&a.digest, &b.digest)?;
                Ok(ReportEntry {
                    identifier_a: a.identifier.clone(),
                    identifier_b: b.identifier.clone(),
                    score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SimilarityReport { entries })
    }
}
