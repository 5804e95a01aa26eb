//! Error types for the tbt fuzzy-hashing engine.
//!
//! Structural errors (bad database format, algorithm conflicts) abort the
//! whole operation; per-file I/O errors during a scan are handled locally by
//! the orchestrator and never surface through this type unless every file
//! failed.

use thiserror::Error;

use crate::db::AlgorithmTag;

/// Main error type for tbt operations.
#[derive(Debug, Error)]
pub enum TbtError {
    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed database file; fatal for the whole load
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Requested algorithm conflicts with what a database declares
    #[error("algorithm mismatch: requested {requested}, database contains {found}")]
    AlgorithmMismatch { requested: String, found: String },

    /// SIMHASH digests of differing bit width cannot be compared
    #[error("SIMHASH width mismatch: {left} bits vs {right} bits")]
    WidthMismatch { left: u32, right: u32 },

    /// A digest string that does not match its algorithm's expected shape
    #[error("malformed {algorithm} digest: {message}")]
    MalformedDigest { algorithm: String, message: String },

    /// A scan that found candidates but hashed none of them
    #[error("no files could be hashed under {path}")]
    EmptyScan { path: String },
}

impl TbtError {
    /// Builds an [`TbtError::AlgorithmMismatch`] naming the tags actually present.
    pub fn algorithm_mismatch(requested: impl std::fmt::Display, found: &[AlgorithmTag]) -> Self {
        let found = found
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        TbtError::AlgorithmMismatch {
            requested: requested.to_string(),
            found: if found.is_empty() {
                "nothing".to_string()
            } else {
                found
            },
        }
    }
}

/// Result type alias for tbt operations
pub type Result<T> = std::result::Result<T, TbtError>;
