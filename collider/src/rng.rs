//! Seeded bit generator driving every random choice of the search.
//!
//! The search only needs fast, reproducible bits, not cryptographic ones. A
//! 64-bit xorshift variant seeded from the MD5 of the caller's seed gives the
//! same stream for the same seed on every platform.

use crate::md5::hash;

/// Xorshift generator with two 32-bit words of state.
#[derive(Debug, Clone)]
pub struct Xrng64 {
    s1: u32,
    s2: u32,
}

impl Xrng64 {
    /// Seeds from arbitrary bytes.
    ///
    /// The seed is hashed with MD5 and the digest read as four little-endian
    /// words `w0..w3`; the state becomes `(w0 ^ w1, w2 ^ w3)`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use md5_collider::Xrng64;
    ///
    /// let mut a = Xrng64::from_seed(b"seed");
    /// let mut b = Xrng64::from_seed(b"seed");
    /// assert_eq!(a.next_u32(), b.next_u32());
    /// ```
    pub fn from_seed(seed: &[u8]) -> Self {
        let digest = hash(seed);
        let word = |i: usize| {
            u32::from_le_bytes([digest[4 * i], digest[4 * i + 1], digest[4 * i + 2], digest[4 * i + 3]])
        };
        Self {
            s1: word(0) ^ word(1),
            s2: word(2) ^ word(3),
        }
    }

    #[inline(always)]
    pub fn next_u32(&mut self) -> u32 {
        let t = self.s1 ^ (self.s1 << 10);
        self.s1 = self.s2;
        self.s2 = self.s2 ^ (self.s2 >> 10) ^ t ^ (t >> 13);
        self.s1
    }
}
