//! Hash database model and on-disk format.
//!
//! A database is homogeneous: its declared [`AlgorithmTag`] and every
//! record's digest must agree, enforced at the API boundary ([`HashDatabase::push`])
//! rather than by convention. A [`HashStore`] holds one or more homogeneous
//! databases and is what a default scan (both algorithms) serializes as.
//!
//! On disk a store is newline-delimited text. Each section starts with a
//! header line (`CTPH`, or `SIMHASH:<width>`), followed by one
//! `identifier,digest` line per record. A line without a comma is a header;
//! identifiers may themselves contain commas because the digest is split
//! off at the last one.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::ctph;
use crate::error::{Result, TbtError};
use crate::simhash::{SimhashDigest, SimhashWidth};

/// The two fuzzy-hash algorithms. Closed set: digest shapes differ
/// structurally, so this is a tagged variant rather than a trait object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Ctph,
    Simhash,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Ctph => write!(f, "CTPH"),
            Algorithm::Simhash => write!(f, "SIMHASH"),
        }
    }
}

/// A database's declared algorithm, including the bit width for SIMHASH.
///
/// Renders as the on-disk header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmTag {
    Ctph,
    Simhash(SimhashWidth),
}

impl AlgorithmTag {
    pub fn algorithm(self) -> Algorithm {
        match self {
            AlgorithmTag::Ctph => Algorithm::Ctph,
            AlgorithmTag::Simhash(_) => Algorithm::Simhash,
        }
    }

    /// Parses a header line.
    pub fn parse(header: &str) -> Option<Self> {
        if header == "CTPH" {
            return Some(AlgorithmTag::Ctph);
        }
        let width = header.strip_prefix("SIMHASH:")?;
        let bits: u32 = width.parse().ok()?;
        SimhashWidth::from_bits(bits).map(AlgorithmTag::Simhash)
    }
}

impl fmt::Display for AlgorithmTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmTag::Ctph => write!(f, "CTPH"),
            AlgorithmTag::Simhash(w) => write!(f, "SIMHASH:{}", w.bits()),
        }
    }
}

/// An immutable computed digest, tagged by algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Digest {
    Ctph(String),
    Simhash(SimhashDigest),
}

impl Digest {
    pub fn tag(&self) -> AlgorithmTag {
        match self {
            Digest::Ctph(_) => AlgorithmTag::Ctph,
            Digest::Simhash(d) => AlgorithmTag::Simhash(d.width()),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.tag().algorithm()
    }

    /// The on-disk text form.
    pub fn to_text(&self) -> String {
        match self {
            Digest::Ctph(s) => s.clone(),
            Digest::Simhash(d) => d.to_hex(),
        }
    }

    /// Parses a digest text of the shape the tag demands.
    pub fn from_text(text: &str, tag: AlgorithmTag) -> Result<Self> {
        match tag {
            AlgorithmTag::Ctph => {
                ctph::parse_digest(text)?;
                Ok(Digest::Ctph(text.to_string()))
            }
            AlgorithmTag::Simhash(width) => {
                Ok(Digest::Simhash(SimhashDigest::from_hex(text, width)?))
            }
        }
    }
}

/// One hashed source: an opaque identifier (usually a path) and its digest.
///
/// Identifier uniqueness is not enforced; re-hashing the same path twice
/// legitimately yields two records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRecord {
    pub identifier: String,
    pub digest: Digest,
}

impl HashRecord {
    pub fn new(identifier: impl Into<String>, digest: Digest) -> Self {
        Self {
            identifier: identifier.into(),
            digest,
        }
    }
}

/// An ordered, homogeneous sequence of hash records.
#[derive(Debug, Clone)]
pub struct HashDatabase {
    tag: AlgorithmTag,
    records: Vec<HashRecord>,
}

impl HashDatabase {
    pub fn new(tag: AlgorithmTag) -> Self {
        Self {
            tag,
            records: Vec::new(),
        }
    }

    pub fn tag(&self) -> AlgorithmTag {
        self.tag
    }

    pub fn records(&self) -> &[HashRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends a record. A digest whose tag differs from the database's
    /// declared tag is rejected; homogeneity is structural, not advisory.
    pub fn push(&mut self, record: HashRecord) -> Result<()> {
        if record.digest.tag() != self.tag {
            return Err(TbtError::algorithm_mismatch(
                record.digest.tag(),
                &[self.tag],
            ));
        }
        self.records.push(record);
        Ok(())
    }

    /// Sorts records by identifier for deterministic serialization.
    pub fn sort_by_identifier(&mut self) {
        self.records.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    }
}

/// One or more homogeneous databases, in serialization order.
///
/// A single-algorithm scan produces a store with one section; a default
/// scan produces one section per algorithm.
#[derive(Debug, Clone, Default)]
pub struct HashStore {
    databases: Vec<HashDatabase>,
}

impl HashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_database(&mut self, db: HashDatabase) {
        self.databases.push(db);
    }

    pub fn databases(&self) -> &[HashDatabase] {
        &self.databases
    }

    pub fn tags(&self) -> Vec<AlgorithmTag> {
        self.databases.iter().map(|db| db.tag()).collect()
    }

    pub fn record_count(&self) -> usize {
        self.databases.iter().map(|db| db.len()).sum()
    }

    /// The section computed with `algorithm`, or an `AlgorithmMismatch`
    /// naming what the store actually contains.
    pub fn select(&self, algorithm: Algorithm) -> Result<&HashDatabase> {
        self.databases
            .iter()
            .find(|db| db.tag().algorithm() == algorithm)
            .ok_or_else(|| TbtError::algorithm_mismatch(algorithm, &self.tags()))
    }

    /// Renders the store in its on-disk text form.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for db in &self.databases {
            out.push_str(&db.tag().to_string());
            out.push('\n');
            for record in db.records() {
                out.push_str(&record.identifier);
                out.push(',');
                out.push_str(&record.digest.to_text());
                out.push('\n');
            }
        }
        out
    }

    /// Parses the on-disk text form, re-validating homogeneity and the
    /// digest shape of every line. Any malformed line is fatal.
    pub fn parse(text: &str) -> Result<Self> {
        let mut store = HashStore::new();
        let mut current: Option<HashDatabase> = None;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            if line.is_empty() {
                continue;
            }
            match line.rsplit_once(',') {
                None => {
                    // Header line: open a new section
                    let tag = AlgorithmTag::parse(line).ok_or_else(|| TbtError::Parse {
                        line: line_no,
                        message: format!("unknown algorithm header '{line}'"),
                    })?;
                    if let Some(db) = current.take() {
                        store.push_database(db);
                    }
                    current = Some(HashDatabase::new(tag));
                }
                Some((identifier, digest_text)) => {
                    let db = current.as_mut().ok_or_else(|| TbtError::Parse {
                        line: line_no,
                        message: "record before any algorithm header".to_string(),
                    })?;
                    let digest =
                        Digest::from_text(digest_text, db.tag()).map_err(|e| TbtError::Parse {
                            line: line_no,
                            message: e.to_string(),
                        })?;
                    // Shape already matches the section tag, push cannot fail
                    db.push(HashRecord::new(identifier, digest))?;
                }
            }
        }

        match current.take() {
            Some(db) => store.push_database(db),
            None => {
                return Err(TbtError::Parse {
                    line: 1,
                    message: "empty database file".to_string(),
                })
            }
        }

        Ok(store)
    }

    /// Loads a store from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let store = Self::parse(&text)?;
        debug!(
            path = %path.display(),
            sections = store.databases().len(),
            records = store.record_count(),
            "loaded hash database"
        );
        Ok(store)
    }

    /// Writes the store to `path` atomically: the text goes to a temporary
    /// file in the destination directory and is renamed into place only
    /// after a successful write, so failures never leave a partial file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new_in(".")?,
        };
        tmp.write_all(self.to_text().as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| TbtError::Io(e.error))?;
        debug!(path = %path.display(), records = self.record_count(), "wrote hash database");
        Ok(())
    }
}
