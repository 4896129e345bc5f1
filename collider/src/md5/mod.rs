//! MD5 compression and hashing.
//!
//! The collision search works one compression at a time, so the central entry
//! point is [`compress`]. [`hash`] and [`hash_with_iv`] add RFC 1321 padding on
//! top of it and are used to check finished collisions end to end.

pub mod step;

use crate::error::{ColliderError, Result};
use step::{ff, gg, hh, ii, AC};

/// One 512-bit message block as sixteen little-endian words.
pub type MessageBlock = [u32; 16];

/// MD5 chaining value (the four-word hash state between blocks).
///
/// The standard value starts every message; a collision search may start from
/// any value produced by earlier blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainingValue {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
}

impl ChainingValue {
    /// RFC 1321 initial value.
    pub const STANDARD: Self = Self {
        a: 0x67452301,
        b: 0xefcdab89,
        c: 0x98badcfe,
        d: 0x10325476,
    };

    pub const fn new(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self { a, b, c, d }
    }

    /// Reads four little-endian words, the layout an MD5 digest uses.
    pub fn from_le_bytes(bytes: &[u8; 16]) -> Self {
        let word = |i: usize| {
            u32::from_le_bytes([bytes[4 * i], bytes[4 * i + 1], bytes[4 * i + 2], bytes[4 * i + 3]])
        };
        Self::new(word(0), word(1), word(2), word(3))
    }

    /// Decodes a 16-byte chaining value from a slice of unchecked length.
    ///
    /// # Errors
    /// [`ColliderError::InvalidChainingValueLength`] unless `bytes` is exactly
    /// 16 bytes long.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; 16] = bytes
            .try_into()
            .map_err(|_| ColliderError::InvalidChainingValueLength(bytes.len()))?;
        Ok(Self::from_le_bytes(bytes))
    }

    /// Serialises as the 16-byte digest this chaining value would produce.
    pub fn to_le_bytes(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.words()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    pub const fn words(self) -> [u32; 4] {
        [self.a, self.b, self.c, self.d]
    }

    /// Adds `delta` word by word, modulo 2^32.
    pub const fn wrapping_offset(self, delta: [u32; 4]) -> Self {
        Self {
            a: self.a.wrapping_add(delta[0]),
            b: self.b.wrapping_add(delta[1]),
            c: self.c.wrapping_add(delta[2]),
            d: self.d.wrapping_add(delta[3]),
        }
    }

    /// Word-wise modular difference `self - other`.
    pub const fn wrapping_difference(self, other: Self) -> [u32; 4] {
        [
            self.a.wrapping_sub(other.a),
            self.b.wrapping_sub(other.b),
            self.c.wrapping_sub(other.c),
            self.d.wrapping_sub(other.d),
        ]
    }
}

impl Default for ChainingValue {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Compresses one block into a chaining value.
///
/// Runs the 64 MD5 steps from `cv` over `block` and adds `cv` back in
/// (Davies-Meyer feed-forward). No padding is applied.
///
/// # Example
///
/// ```rust
/// use md5_collider::md5::{compress, ChainingValue};
///
/// // An empty message is a single block holding only the padding bit.
/// let mut block = [0u32; 16];
/// block[0] = 0x80;
/// let cv = compress(ChainingValue::STANDARD, &block);
/// assert_eq!(cv.a, 0xd98c1dd4);
/// ```
pub fn compress(cv: ChainingValue, block: &MessageBlock) -> ChainingValue {
    let (mut a, mut b, mut c, mut d) = (cv.a, cv.b, cv.c, cv.d);

    macro_rules! round {
        ( $f:ident, $a:ident, $b:ident, $c:ident, $d:ident, $k:expr, $s:expr, $i:expr ) => {
            $a = $b.wrapping_add(
                ($a.wrapping_add($f($b, $c, $d))
                    .wrapping_add(block[$k])
                    .wrapping_add(AC[$i]))
                .rotate_left($s),
            )
        };
    }

    // Round 1: shifts 7, 12, 17, 22
    round!(ff, a, b, c, d, 0, 7, 0);
    round!(ff, d, a, b, c, 1, 12, 1);
    round!(ff, c, d, a, b, 2, 17, 2);
    round!(ff, b, c, d, a, 3, 22, 3);
    round!(ff, a, b, c, d, 4, 7, 4);
    round!(ff, d, a, b, c, 5, 12, 5);
    round!(ff, c, d, a, b, 6, 17, 6);
    round!(ff, b, c, d, a, 7, 22, 7);
    round!(ff, a, b, c, d, 8, 7, 8);
    round!(ff, d, a, b, c, 9, 12, 9);
    round!(ff, c, d, a, b, 10, 17, 10);
    round!(ff, b, c, d, a, 11, 22, 11);
    round!(ff, a, b, c, d, 12, 7, 12);
    round!(ff, d, a, b, c, 13, 12, 13);
    round!(ff, c, d, a, b, 14, 17, 14);
    round!(ff, b, c, d, a, 15, 22, 15);

    // Round 2: shifts 5, 9, 14, 20
    round!(gg, a, b, c, d, 1, 5, 16);
    round!(gg, d, a, b, c, 6, 9, 17);
    round!(gg, c, d, a, b, 11, 14, 18);
    round!(gg, b, c, d, a, 0, 20, 19);
    round!(gg, a, b, c, d, 5, 5, 20);
    round!(gg, d, a, b, c, 10, 9, 21);
    round!(gg, c, d, a, b, 15, 14, 22);
    round!(gg, b, c, d, a, 4, 20, 23);
    round!(gg, a, b, c, d, 9, 5, 24);
    round!(gg, d, a, b, c, 14, 9, 25);
    round!(gg, c, d, a, b, 3, 14, 26);
    round!(gg, b, c, d, a, 8, 20, 27);
    round!(gg, a, b, c, d, 13, 5, 28);
    round!(gg, d, a, b, c, 2, 9, 29);
    round!(gg, c, d, a, b, 7, 14, 30);
    round!(gg, b, c, d, a, 12, 20, 31);

    // Round 3: shifts 4, 11, 16, 23
    round!(hh, a, b, c, d, 5, 4, 32);
    round!(hh, d, a, b, c, 8, 11, 33);
    round!(hh, c, d, a, b, 11, 16, 34);
    round!(hh, b, c, d, a, 14, 23, 35);
    round!(hh, a, b, c, d, 1, 4, 36);
    round!(hh, d, a, b, c, 4, 11, 37);
    round!(hh, c, d, a, b, 7, 16, 38);
    round!(hh, b, c, d, a, 10, 23, 39);
    round!(hh, a, b, c, d, 13, 4, 40);
    round!(hh, d, a, b, c, 0, 11, 41);
    round!(hh, c, d, a, b, 3, 16, 42);
    round!(hh, b, c, d, a, 6, 23, 43);
    round!(hh, a, b, c, d, 9, 4, 44);
    round!(hh, d, a, b, c, 12, 11, 45);
    round!(hh, c, d, a, b, 15, 16, 46);
    round!(hh, b, c, d, a, 2, 23, 47);

    // Round 4: shifts 6, 10, 15, 21
    round!(ii, a, b, c, d, 0, 6, 48);
    round!(ii, d, a, b, c, 7, 10, 49);
    round!(ii, c, d, a, b, 14, 15, 50);
    round!(ii, b, c, d, a, 5, 21, 51);
    round!(ii, a, b, c, d, 12, 6, 52);
    round!(ii, d, a, b, c, 3, 10, 53);
    round!(ii, c, d, a, b, 10, 15, 54);
    round!(ii, b, c, d, a, 1, 21, 55);
    round!(ii, a, b, c, d, 8, 6, 56);
    round!(ii, d, a, b, c, 15, 10, 57);
    round!(ii, c, d, a, b, 6, 15, 58);
    round!(ii, b, c, d, a, 13, 21, 59);
    round!(ii, a, b, c, d, 4, 6, 60);
    round!(ii, d, a, b, c, 11, 10, 61);
    round!(ii, c, d, a, b, 2, 15, 62);
    round!(ii, b, c, d, a, 9, 21, 63);

    cv.wrapping_offset([a, b, c, d])
}

/// Reads a 64-byte chunk as sixteen little-endian words.
pub fn block_from_le_bytes(bytes: &[u8; 64]) -> MessageBlock {
    let mut block = [0u32; 16];
    for (word, chunk) in block.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    block
}

pub fn block_to_le_bytes(block: &MessageBlock) -> [u8; 64] {
    let mut out = [0u8; 64];
    for (chunk, word) in out.chunks_exact_mut(4).zip(block) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    out
}

/// Parses a block written as 128 hex digits of its little-endian bytes.
///
/// Whitespace is ignored, so blocks may be split across lines.
///
/// # Errors
/// [`ColliderError::InvalidHex`] on a non-hex character and
/// [`ColliderError::InvalidBlockLength`] when the input is not 64 bytes.
pub fn parse_hex_block(text: &str) -> Result<MessageBlock> {
    let bytes = parse_hex(text)?;
    let bytes: [u8; 64] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| ColliderError::InvalidBlockLength(bytes.len()))?;
    Ok(block_from_le_bytes(&bytes))
}

/// Decodes a hex string (whitespace ignored) into bytes.
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| {
            c.to_digit(16)
                .map(|v| v as u8)
                .ok_or_else(|| ColliderError::InvalidHex(text.to_string()))
        })
        .collect::<Result<_>>()?;
    if digits.len() % 2 != 0 {
        return Err(ColliderError::InvalidHex(text.to_string()));
    }
    Ok(digits.chunks_exact(2).map(|p| (p[0] << 4) | p[1]).collect())
}

/// Apply MD5 padding to the input message.
///
/// Appends a single `1` bit, zeros up to 448 mod 512 bits, and the bit
/// length as a 64-bit little-endian integer.
pub(crate) fn bit_padding(input: &[u8]) -> Vec<u8> {
    let mut padded = input.to_vec();
    let bit_length = (input.len() as u64).wrapping_mul(8);

    padded.push(0x80);
    while padded.len() % 64 != 56 {
        padded.push(0x00);
    }
    padded.extend_from_slice(&bit_length.to_le_bytes());
    padded
}

/// Compute the MD5 hash of a byte slice.
///
/// # Example
///
/// ```rust
/// use md5_collider::md5::{hash, to_hex};
///
/// assert_eq!(to_hex(&hash(b"abc")), "900150983cd24fb0d6963f7d28e17f72");
/// ```
pub fn hash(input: &[u8]) -> [u8; 16] {
    hash_with_iv(input, ChainingValue::STANDARD)
}

/// Compute MD5 with a custom starting chaining value.
///
/// The length field still counts only `input`, so this equals hashing a
/// message whose earlier blocks produced `iv` only when the caller accounts
/// for the prefix length separately.
///
/// # Example
///
/// ```rust
/// use md5_collider::md5::{hash, hash_with_iv, ChainingValue};
///
/// assert_eq!(hash_with_iv(b"test", ChainingValue::STANDARD), hash(b"test"));
/// let custom = ChainingValue::new(0x12345678, 0x9abcdef0, 0x11111111, 0x22222222);
/// assert_ne!(hash_with_iv(b"test", custom), hash(b"test"));
/// ```
pub fn hash_with_iv(input: &[u8], iv: ChainingValue) -> [u8; 16] {
    let padded = bit_padding(input);
    let mut cv = iv;
    for chunk in padded.chunks_exact(64) {
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(chunk);
        cv = compress(cv, &block_from_le_bytes(&bytes));
    }
    cv.to_le_bytes()
}

/// Lowercase hexadecimal rendering of a byte string.
///
/// # Example
///
/// ```rust
/// use md5_collider::md5::{hash, to_hex};
///
/// let result = hash(b"");
/// assert_eq!(to_hex(&result), "d41d8cd98f00b204e9800998ecf8427e");
/// ```
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_lengths() {
        assert_eq!(bit_padding(b"").len(), 64);
        assert_eq!(bit_padding(&[0u8; 55]).len(), 64);
        assert_eq!(bit_padding(&[0u8; 56]).len(), 128);
        assert_eq!(bit_padding(&[0u8; 64]).len(), 128);
    }

    #[test]
    fn test_padding_length_field() {
        let padded = bit_padding(b"abc");
        assert_eq!(padded[3], 0x80);
        assert_eq!(&padded[56..], &24u64.to_le_bytes());
    }

    #[test]
    fn test_chaining_value_byte_round_trip() {
        let cv = ChainingValue::new(0x01234567, 0x89abcdef, 0xdeadbeef, 0x0badf00d);
        assert_eq!(ChainingValue::from_le_bytes(&cv.to_le_bytes()), cv);
        assert_eq!(cv.to_le_bytes()[0], 0x67);
    }

    #[test]
    fn test_chaining_value_rejects_wrong_length() {
        assert_eq!(
            ChainingValue::try_from_slice(&[0u8; 15]),
            Err(ColliderError::InvalidChainingValueLength(15))
        );
        assert!(ChainingValue::try_from_slice(&[0u8; 16]).is_ok());
    }

    #[test]
    fn test_offset_and_difference_are_inverse() {
        let cv = ChainingValue::STANDARD;
        let delta = [1 << 31, (1 << 31) + (1 << 25), 0xffffffff, 7];
        assert_eq!(cv.wrapping_offset(delta).wrapping_difference(cv), delta);
    }

    #[test]
    fn test_parse_hex_block() {
        let hex = "00".repeat(63) + "ff";
        let block = parse_hex_block(&hex).unwrap();
        assert_eq!(block[15], 0xff000000);
        assert_eq!(block[..15], [0u32; 15]);

        assert!(matches!(parse_hex_block("zz"), Err(ColliderError::InvalidHex(_))));
        assert_eq!(parse_hex_block("abcd"), Err(ColliderError::InvalidBlockLength(2)));
    }

    #[test]
    fn test_block_byte_round_trip() {
        let mut block = [0u32; 16];
        for (i, w) in block.iter_mut().enumerate() {
            *w = (i as u32).wrapping_mul(0x01010101);
        }
        assert_eq!(block_from_le_bytes(&block_to_le_bytes(&block)), block);
    }
}
