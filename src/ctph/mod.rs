//! Context-Triggered Piecewise Hashing (CTPH).
//!
//! A rolling checksum over a 7-byte window decides chunk boundaries; an
//! FNV-1a hash accumulated between boundaries contributes one base64 symbol
//! per chunk. The digest carries two signatures, one at the chosen block
//! size and one at twice that size, so digests whose block sizes differ by
//! a single doubling remain comparable:
//! `<block_size>:<signature>:<signature_at_2x>`.

pub mod edit_dist;
pub mod rolling;

use crate::config::CtphConfig;
use crate::error::{Result, TbtError};

use edit_dist::edit_distance;
use rolling::{RollingHasher, ROLLING_WINDOW};

/// Symbol alphabet for chunk hashes (one symbol per 6 bits).
const B64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Longest run of one symbol kept when scoring (longer runs carry almost
/// no information and bias the edit distance).
const MAX_SEQUENCE: usize = 3;

/// A CTPH digest split into its three fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestParts<'a> {
    pub block_size: u64,
    pub sig1: &'a str,
    pub sig2: &'a str,
}

/// Parses and shape-checks a CTPH digest string.
pub fn parse_digest(digest: &str) -> Result<DigestParts<'_>> {
    let malformed = |message: &str| TbtError::MalformedDigest {
        algorithm: "CTPH".to_string(),
        message: message.to_string(),
    };

    let mut fields = digest.splitn(3, ':');
    let block = fields.next().ok_or_else(|| malformed("empty digest"))?;
    let sig1 = fields
        .next()
        .ok_or_else(|| malformed("missing first signature"))?;
    let sig2 = fields
        .next()
        .ok_or_else(|| malformed("missing second signature"))?;

    let block_size: u64 = block
        .parse()
        .map_err(|_| malformed("block size is not a number"))?;
    if block_size == 0 {
        return Err(malformed("block size is zero"));
    }
    for sig in [sig1, sig2] {
        if !sig.bytes().all(|b| B64_ALPHABET.contains(&b)) {
            return Err(malformed("signature contains non-alphabet symbols"));
        }
    }

    Ok(DigestParts {
        block_size,
        sig1,
        sig2,
    })
}

/// The CTPH engine: digest generation and digest-to-digest scoring.
#[derive(Debug, Clone)]
pub struct CtphEngine {
    cfg: CtphConfig,
}

impl CtphEngine {
    pub fn new(mut cfg: CtphConfig) -> Self {
        // Shortest usable signature: one triggered symbol plus the
        // end-of-stream flush. Anything below that came from a hand-built
        // or deserialized config and would break the slot arithmetic.
        cfg.signature_length = cfg.signature_length.max(2);
        Self { cfg }
    }

    pub fn with_defaults() -> Self {
        Self::new(CtphConfig::default())
    }

    /// Smallest `min_block_size * 2^k` whose expected trigger count over
    /// `len` bytes does not exceed the target signature length.
    fn initial_block_size(&self, len: u64) -> u64 {
        let mut block_size = self.cfg.min_block_size.max(1);
        while block_size.saturating_mul(self.cfg.signature_length as u64) < len {
            block_size = block_size.saturating_mul(2);
        }
        block_size
    }

    /// One streaming pass: emit a symbol per triggered chunk, capped so the
    /// last signature slot stays reserved for the end-of-stream flush.
    fn signature_at(&self, data: &[u8], block_size: u64) -> String {
        let target = self.cfg.signature_length;
        let mut signature = String::with_capacity(target);
        let mut roll = RollingHasher::new();
        let mut chunk_hash = FNV_OFFSET_BASIS;
        let mut in_chunk = false;
        let mut seen = 0usize;

        for &byte in data {
            roll.update(byte);
            chunk_hash ^= byte as u64;
            chunk_hash = chunk_hash.wrapping_mul(FNV_PRIME);
            in_chunk = true;
            seen += 1;
            if seen < ROLLING_WINDOW {
                continue;
            }
            if roll.is_trigger(block_size) {
                if signature.len() < target - 1 {
                    signature.push(B64_ALPHABET[(chunk_hash & 0x3F) as usize] as char);
                }
                chunk_hash = FNV_OFFSET_BASIS;
                in_chunk = false;
            }
        }

        // Final partial chunk between the last trigger and end of stream
        if in_chunk {
            signature.push(B64_ALPHABET[(chunk_hash & 0x3F) as usize] as char);
        }

        signature
    }

    /// Computes the digest of `data`.
    ///
    /// Deterministic: the block size is derived from the input length alone
    /// and re-derived downward while the signature comes out shorter than
    /// half the target, so identical bytes always yield identical digests.
    pub fn hash(&self, data: &[u8]) -> String {
        let min_block_size = self.cfg.min_block_size.max(1);
        let mut block_size = self.initial_block_size(data.len() as u64);

        loop {
            let sig1 = self.signature_at(data, block_size);
            if sig1.len() < self.cfg.signature_length / 2 && block_size > min_block_size {
                block_size /= 2;
                continue;
            }
            let sig2 = self.signature_at(data, block_size.saturating_mul(2));
            return format!("{block_size}:{sig1}:{sig2}");
        }
    }

    /// Scores two digests on 0..=100.
    ///
    /// Digests are comparable when their block sizes are equal or differ by
    /// exactly one doubling; anything further apart scores 0.
    pub fn compare(&self, a: &str, b: &str) -> Result<u32> {
        let pa = parse_digest(a)?;
        let pb = parse_digest(b)?;

        // Identical well-formed digests at the same block size are a
        // perfect match; skip the scoring machinery.
        if pa.block_size == pb.block_size && pa.sig1 == pb.sig1 && pa.sig2 == pb.sig2 {
            return Ok(100);
        }

        let s1a = eliminate_sequences(pa.sig1);
        let s2a = eliminate_sequences(pa.sig2);
        let s1b = eliminate_sequences(pb.sig1);
        let s2b = eliminate_sequences(pb.sig2);

        let score = if pa.block_size == pb.block_size {
            let low = self.score_strings(&s1a, &s1b, pa.block_size);
            let high = self.score_strings(&s2a, &s2b, pa.block_size * 2);
            low.max(high)
        } else if pa.block_size.saturating_mul(2) == pb.block_size {
            // a's double-block signature lines up with b's primary one
            self.score_strings(&s2a, &s1b, pb.block_size)
        } else if pb.block_size.saturating_mul(2) == pa.block_size {
            self.score_strings(&s1a, &s2b, pa.block_size)
        } else {
            0
        };

        Ok(score)
    }

    /// Scores two signature strings produced at the same block size.
    fn score_strings(&self, s1: &str, s2: &str, block_size: u64) -> u32 {
        let (l1, l2) = (s1.len(), s2.len());
        if l1 == 0 && l2 == 0 {
            return 100;
        }
        if l1 == 0 || l2 == 0 {
            return 0;
        }

        let dist = edit_distance(s1.as_bytes(), s2.as_bytes()) as u64;
        let max_len = l1.max(l2) as u64;
        let scaled = (100 * dist) / max_len;
        let mut score = 100u64.saturating_sub(scaled) as u32;

        // A small block size means very few chunks of real content went
        // into each symbol; cap the score so short signatures over tiny
        // inputs cannot claim a strong match.
        let min_block_size = self.cfg.min_block_size.max(1);
        let exempt = (99 + ROLLING_WINDOW as u64) / ROLLING_WINDOW as u64 * min_block_size;
        if block_size < exempt {
            let cap = (block_size / min_block_size) * l1.min(l2) as u64;
            score = score.min(cap.min(u32::MAX as u64) as u32);
        }

        score.min(100)
    }
}

/// Collapses runs longer than [`MAX_SEQUENCE`] of one symbol.
fn eliminate_sequences(signature: &str) -> String {
    let mut out = String::with_capacity(signature.len());
    let mut run = 0usize;
    let mut prev = None;
    for c in signature.chars() {
        if Some(c) == prev {
            run += 1;
            if run >= MAX_SEQUENCE {
                continue;
            }
        } else {
            run = 0;
            prev = Some(c);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        // Deterministic pseudo-random bytes, enough structure to trigger
        let mut state = 0x2545f4914f6cdd1du64;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state & 0xFF) as u8
            })
            .collect()
    }

    #[test]
    fn test_digest_shape() {
        let engine = CtphEngine::with_defaults();
        let digest = engine.hash(&sample(4096));
        let parts = parse_digest(&digest).unwrap();
        assert!(parts.block_size >= 3);
        assert!(!parts.sig1.is_empty());
        assert!(parts.sig1.len() <= 64);
        assert!(parts.sig2.len() <= 64);
    }

    #[test]
    fn test_deterministic() {
        let engine = CtphEngine::with_defaults();
        let data = sample(10_000);
        assert_eq!(engine.hash(&data), engine.hash(&data));
    }

    #[test]
    fn test_identical_inputs_score_100() {
        let engine = CtphEngine::with_defaults();
        let data = sample(8192);
        let d = engine.hash(&data);
        assert_eq!(engine.compare(&d, &d).unwrap(), 100);
    }

    #[test]
    fn test_similar_inputs_score_high() {
        let engine = CtphEngine::with_defaults();
        let mut data = sample(16_384);
        let original = engine.hash(&data);
        // A small edit in the middle leaves most chunks untouched
        data[8000] ^= 0xFF;
        data[8001] ^= 0xFF;
        let edited = engine.hash(&data);
        let score = engine.compare(&original, &edited).unwrap();
        assert!(score > 50, "score was {score}");
    }

    #[test]
    fn test_unrelated_inputs_score_low() {
        let engine = CtphEngine::with_defaults();
        let a = engine.hash(&sample(16_384));
        let b: Vec<u8> = sample(16_384).iter().map(|x| x.wrapping_mul(37).wrapping_add(11)).collect();
        let b = engine.hash(&b);
        let score = engine.compare(&a, &b).unwrap();
        assert!(score < 50, "score was {score}");
    }

    #[test]
    fn test_symmetric() {
        let engine = CtphEngine::with_defaults();
        let a = engine.hash(&sample(10_000));
        let b = engine.hash(&sample(10_000)[..9_000].to_vec());
        assert_eq!(
            engine.compare(&a, &b).unwrap(),
            engine.compare(&b, &a).unwrap()
        );
    }

    #[test]
    fn test_one_doubling_block_sizes_are_comparable() {
        let engine = CtphEngine::with_defaults();
        // a's double-block signature lines up with b's primary one
        let a = "96:mnopqrst:abcdefghijkl";
        let b = "192:abcdefghijkl:uvwx";
        assert_eq!(engine.compare(a, b).unwrap(), 100);
        assert_eq!(engine.compare(b, a).unwrap(), 100);

        // Partial overlap on the matched pair still scores, symmetrically
        let c = "192:abcdefghwxyz:uvwx";
        let partial = engine.compare(a, c).unwrap();
        assert!(partial > 0 && partial < 100, "score was {partial}");
        assert_eq!(partial, engine.compare(c, a).unwrap());
    }

    #[test]
    fn test_degenerate_signature_length_is_clamped() {
        for signature_length in [0, 1] {
            let engine = CtphEngine::new(CtphConfig {
                min_block_size: 3,
                signature_length,
            });
            let d = engine.hash(&sample(4096));
            assert_eq!(engine.compare(&d, &d).unwrap(), 100);
        }
    }

    #[test]
    fn test_incompatible_block_sizes_score_zero() {
        let engine = CtphEngine::with_defaults();
        // Far-apart block sizes: hand-built digests with valid shapes
        let a = "3:ABCDEF:GHIJKL";
        let b = "96:ABCDEF:GHIJKL";
        assert_eq!(engine.compare(a, b).unwrap(), 0);
    }

    #[test]
    fn test_malformed_digest_is_an_error() {
        let engine = CtphEngine::with_defaults();
        assert!(engine.compare("not-a-digest", "3:AA:BB").is_err());
        assert!(engine.compare("0:AA:BB", "3:AA:BB").is_err());
        assert!(engine.compare("3:A!A:BB", "3:AA:BB").is_err());
        assert!(parse_digest("3:AA").is_err());
    }

    #[test]
    fn test_empty_input() {
        let engine = CtphEngine::with_defaults();
        let d = engine.hash(b"");
        let parts = parse_digest(&d).unwrap();
        assert_eq!(parts.block_size, 3);
        assert!(parts.sig1.is_empty());
        assert!(parts.sig2.is_empty());
        assert_eq!(engine.compare(&d, &d).unwrap(), 100);
    }

    #[test]
    fn test_tiny_input() {
        let engine = CtphEngine::with_defaults();
        let d = engine.hash(b"ab");
        assert_eq!(engine.compare(&d, &d).unwrap(), 100);
    }

    #[test]
    fn test_block_size_grows_with_input() {
        let engine = CtphEngine::with_defaults();
        let small = parse_digest(&engine.hash(&sample(512)))
            .unwrap()
            .block_size;
        let large = parse_digest(&engine.hash(&sample(1 << 20)))
            .unwrap()
            .block_size;
        assert!(large > small);
    }

    #[test]
    fn test_eliminate_sequences() {
        assert_eq!(eliminate_sequences("AAAAAB"), "AAAB");
        assert_eq!(eliminate_sequences("AAAB"), "AAAB");
        assert_eq!(eliminate_sequences("ABAB"), "ABAB");
        assert_eq!(eliminate_sequences(""), "");
    }
}
