//! SIMHASH: feature hashing with majority-vote bit selection.
//!
//! Overlapping byte shingles are hashed with MD5 and each hash votes on
//! every bit position of the output vector (+1 for a set bit, -1 for a
//! clear one). Hamming distance between two vectors then correlates
//! inversely with the proportion of shingles the two inputs share.

use serde::{Deserialize, Serialize};

use crate::config::SimhashConfig;
use crate::error::{Result, TbtError};

/// Output bit width, fixed per database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimhashWidth {
    /// MD5 truncated to its first 8 bytes.
    W64,
    /// The full MD5 digest.
    W128,
}

impl SimhashWidth {
    pub fn bits(self) -> u32 {
        match self {
            SimhashWidth::W64 => 64,
            SimhashWidth::W128 => 128,
        }
    }

    pub fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            64 => Some(SimhashWidth::W64),
            128 => Some(SimhashWidth::W128),
            _ => None,
        }
    }
}

/// A computed SIMHASH bit vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimhashDigest {
    width: SimhashWidth,
    bits: Vec<u8>,
}

impl SimhashDigest {
    pub fn width(&self) -> SimhashWidth {
        self.width
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Lowercase hex, exactly `width / 4` characters.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bits)
    }

    /// Parses and shape-checks a hex digest of the given width.
    pub fn from_hex(text: &str, width: SimhashWidth) -> Result<Self> {
        let malformed = |message: String| TbtError::MalformedDigest {
            algorithm: "SIMHASH".to_string(),
            message,
        };
        if text.len() != width.bytes() * 2 {
            return Err(malformed(format!(
                "expected {} hex characters, got {}",
                width.bytes() * 2,
                text.len()
            )));
        }
        let bits = hex::decode(text).map_err(|e| malformed(e.to_string()))?;
        Ok(Self { width, bits })
    }

    /// Number of differing bits between two vectors of the same width.
    pub fn hamming_distance(&self, other: &SimhashDigest) -> Result<u32> {
        if self.width != other.width {
            return Err(TbtError::WidthMismatch {
                left: self.width.bits(),
                right: other.width.bits(),
            });
        }
        Ok(self
            .bits
            .iter()
            .zip(other.bits.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum())
    }
}

/// The SIMHASH engine: digest generation and Hamming-based scoring.
#[derive(Debug, Clone)]
pub struct SimhashEngine {
    cfg: SimhashConfig,
}

impl SimhashEngine {
    pub fn new(cfg: SimhashConfig) -> Self {
        Self { cfg }
    }

    pub fn with_defaults() -> Self {
        Self::new(SimhashConfig::default())
    }

    pub fn width(&self) -> SimhashWidth {
        self.cfg.width
    }

    /// Computes the digest of `data`.
    ///
    /// Inputs shorter than the shingle size contribute a single
    /// whole-input shingle; empty input yields the all-zero vector.
    pub fn hash(&self, data: &[u8]) -> SimhashDigest {
        let width = self.cfg.width;
        let out_bytes = width.bytes();
        let mut accumulators = vec![0i64; width.bits() as usize];

        let shingle_size = self.cfg.shingle_size.max(1).min(data.len().max(1));
        if !data.is_empty() {
            for shingle in data.windows(shingle_size) {
                let feature = md5::compute(shingle);
                for (i, acc) in accumulators.iter_mut().enumerate() {
                    let bit = (feature[i / 8] >> (i % 8)) & 1;
                    *acc += if bit == 1 { 1 } else { -1 };
                }
            }
        }

        let mut bits = vec![0u8; out_bytes];
        for (i, acc) in accumulators.iter().enumerate() {
            if *acc > 0 {
                bits[i / 8] |= 1 << (i % 8);
            }
        }

        SimhashDigest { width, bits }
    }

    /// Scores two digests on 0..=100: `100 * (1 - hamming / width)`.
    pub fn compare(&self, a: &SimhashDigest, b: &SimhashDigest) -> Result<u32> {
        let distance = a.hamming_distance(b)?;
        let width = a.width().bits() as f64;
        Ok((100.0 * (1.0 - distance as f64 / width)).round() as u32)
    }
}
