//! Engine configuration.
//!
//! Centralized configuration for both hash engines and the scan
//! orchestrator, with defaults that form the on-disk compatibility
//! contract: digests are only comparable between runs that used the
//! same constants.

use serde::{Deserialize, Serialize};

use crate::simhash::SimhashWidth;

/// Master configuration for the hashing pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// CTPH engine configuration.
    pub ctph: CtphConfig,
    /// SIMHASH engine configuration.
    pub simhash: SimhashConfig,
    /// I/O limits for the scan orchestrator.
    pub io: IoLimits,
}

/// Configuration for the CTPH engine.
///
/// The defaults are the classic spamsum constants; changing them produces
/// digests that score 0 against databases built with the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CtphConfig {
    /// Smallest trigger block size tried during block-size selection.
    pub min_block_size: u64,
    /// Target signature length in symbols.
    pub signature_length: usize,
}

impl Default for CtphConfig {
    fn default() -> Self {
        Self {
            min_block_size: 3,
            signature_length: 64,
        }
    }
}

/// Configuration for the SIMHASH engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimhashConfig {
    /// Shingle (overlapping n-gram) size in bytes.
    pub shingle_size: usize,
    /// Output bit width; fixed per database.
    pub width: SimhashWidth,
}

impl Default for SimhashConfig {
    fn default() -> Self {
        Self {
            shingle_size: 4,
            width: SimhashWidth::W128,
        }
    }
}

/// Resource limits applied while reading candidate files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoLimits {
    /// Files larger than this are skipped (recorded as per-file errors).
    pub max_file_size: u64,
}

impl Default for IoLimits {
    fn default() -> Self {
        Self {
            max_file_size: 256 * 1024 * 1024, // 256MB
        }
    }
}
