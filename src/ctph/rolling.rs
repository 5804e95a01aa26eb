//! Windowed rolling checksum used as the CTPH chunk trigger.
//!
//! The checksum covers the last [`ROLLING_WINDOW`] bytes of the stream and
//! updates in O(1) per byte: the incoming byte is added and the byte that
//! falls out of the window is subtracted. Because the value depends only on
//! local content, identical substrings in two files trigger chunk boundaries
//! at the same relative points regardless of insertions elsewhere.

/// Window size in bytes.
pub const ROLLING_WINDOW: usize = 7;

/// Rolling checksum state: a fixed ring window and three running components.
///
/// `h1` is the plain sum of the window, `h2` a recency-weighted sum (the
/// newest byte counts with weight [`ROLLING_WINDOW`], the oldest with 1) and
/// `h3` a shift/xor mixer that ages bytes out of its value after seven
/// updates. The reported hash is the wrapping sum of the three.
#[derive(Debug, Clone, Copy)]
pub struct RollingHasher {
    window: [u8; ROLLING_WINDOW],
    index: usize,
    h1: u32,
    h2: u32,
    h3: u32,
}

impl RollingHasher {
    pub fn new() -> Self {
        Self {
            window: [0; ROLLING_WINDOW],
            index: 0,
            h1: 0,
            h2: 0,
            h3: 0,
        }
    }

    /// Feed one byte into the window.
    #[inline]
    pub fn update(&mut self, byte: u8) {
        let outgoing = self.window[self.index] as u32;
        self.h2 = self.h2.wrapping_sub(self.h1);
        self.h2 = self
            .h2
            .wrapping_add((ROLLING_WINDOW as u32).wrapping_mul(byte as u32));
        self.h1 = self.h1.wrapping_add(byte as u32).wrapping_sub(outgoing);
        self.window[self.index] = byte;
        self.index += 1;
        if self.index == ROLLING_WINDOW {
            self.index = 0;
        }
        self.h3 = (self.h3 << 5) ^ (byte as u32);
    }

    /// Current checksum over the window.
    #[inline]
    pub fn hash(&self) -> u32 {
        self.h1.wrapping_add(self.h2).wrapping_add(self.h3)
    }

    /// Whether the current position is a chunk boundary for `block_size`.
    #[inline]
    pub fn is_trigger(&self, block_size: u64) -> bool {
        (self.hash() as u64) % block_size == block_size - 1
    }
}

impl Default for RollingHasher {
    fn default() -> Self {
        Self::new()
    }
}
