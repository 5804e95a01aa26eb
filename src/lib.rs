//! tbt: dual-algorithm fuzzy hashing for triaging binaries.
//!
//! Two approximate-similarity fingerprints over byte streams:
//!
//! - **CTPH** (context-triggered piecewise hashing): a rolling checksum
//!   chunks the stream at content-defined boundaries and each chunk
//!   contributes one symbol to a short signature.
//! - **SIMHASH**: overlapping shingles vote bit-by-bit into a fixed-width
//!   vector whose Hamming distance tracks shingle overlap.
//!
//! Digests are stored in homogeneous [`db::HashDatabase`]s, grouped into a
//! [`db::HashStore`] on disk, and scored 0..=100 by [`compare::Comparator`].
//! Scores are heuristics over approximate fingerprints, never exact-match
//! guarantees.

/// Similarity scoring across digests and databases
pub mod compare;
/// Engine and I/O configuration
pub mod config;
/// Context-triggered piecewise hashing
pub mod ctph;
/// Hash database model and on-disk format
pub mod db;
/// Error types
pub mod error;
/// Section-aware input extraction for ELF binaries
pub mod extract;
/// Tracing setup
pub mod logging;
/// Directory scanning and store assembly
pub mod scan;
/// SIMHASH feature hashing
pub mod simhash;

pub use compare::{Comparator, SimilarityReport};
pub use config::EngineConfig;
pub use db::{Algorithm, AlgorithmTag, Digest, HashDatabase, HashRecord, HashStore};
pub use error::{Result, TbtError};
pub use scan::{ScanOrchestrator, Selection};
