//! Differential-path deltas and collision verification.
//!
//! A two-block identical-prefix collision is fixed by three published
//! differences: the message difference of block 0, the chaining-value
//! difference it must produce, and the message difference of block 1 that
//! cancels it. Everything found by the search is checked against these
//! exactly, as modular (additive) differences.

use serde::Serialize;

use crate::md5::{block_to_le_bytes, compress, hash, to_hex, ChainingValue, MessageBlock};

const HIGH: u32 = 1 << 31;

/// Block-0 message difference: +2^31 on word 4, +2^15 on word 11, +2^31 on word 14.
pub const BLOCK0_MESSAGE_DELTA: MessageBlock = [
    0, 0, 0, 0,
    HIGH, // 2^31 at position 4
    0, 0, 0,
    0, 0, 0,
    1 << 15, // 2^15 at position 11
    0, 0,
    HIGH, // 2^31 at position 14
    0,
];

/// Block-1 message difference: as block 0 but -2^15 on word 11.
pub const BLOCK1_MESSAGE_DELTA: MessageBlock = [
    0, 0, 0, 0,
    HIGH,
    0, 0, 0,
    0, 0, 0,
    (1u32 << 15).wrapping_neg(),
    0, 0,
    HIGH,
    0,
];

/// Chaining-value difference after block 0.
pub const BLOCK0_OUTPUT_DELTA: [u32; 4] = [
    HIGH,
    HIGH.wrapping_add(1 << 25),
    HIGH.wrapping_add(1 << 25),
    HIGH.wrapping_add(1 << 25),
];

/// Adds a message difference word by word.
pub fn apply_delta(block: &MessageBlock, delta: &MessageBlock) -> MessageBlock {
    let mut out = *block;
    for (word, d) in out.iter_mut().zip(delta) {
        *word = word.wrapping_add(*d);
    }
    out
}

/// Checks that two compressions differ by exactly `expected`.
///
/// Compresses `block` from `cv` and `twin_block` from `twin_cv` and compares
/// `twin_output - output` against `expected`, word by word.
pub fn differs_by(
    cv: ChainingValue,
    block: &MessageBlock,
    twin_cv: ChainingValue,
    twin_block: &MessageBlock,
    expected: [u32; 4],
) -> bool {
    compress(twin_cv, twin_block).wrapping_difference(compress(cv, block)) == expected
}

/// Checks a block-0 candidate: the twin block must move the chaining value
/// by exactly [`BLOCK0_OUTPUT_DELTA`].
pub fn verify_block0(cv: ChainingValue, block: &MessageBlock) -> bool {
    differs_by(cv, block, cv, &apply_delta(block, &BLOCK0_MESSAGE_DELTA), BLOCK0_OUTPUT_DELTA)
}

/// Checks a block-1 candidate: starting from `cv` and from `cv` shifted by
/// [`BLOCK0_OUTPUT_DELTA`], message 1 and message 2 must compress to the
/// same chaining value.
pub fn verify_block1(cv: ChainingValue, block: &MessageBlock) -> bool {
    differs_by(
        cv,
        block,
        cv.wrapping_offset(BLOCK0_OUTPUT_DELTA),
        &apply_delta(block, &BLOCK1_MESSAGE_DELTA),
        [0; 4],
    )
}

/// Two distinct 128-byte messages with the same MD5 chaining value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionPair {
    /// Chaining value both messages start from
    pub ihv: ChainingValue,
    pub message1: [u8; 128],
    pub message2: [u8; 128],
    /// Chaining value after both blocks (identical for both messages)
    pub chaining_value: ChainingValue,
}

impl CollisionPair {
    /// Builds the pair from the two blocks of message 1.
    ///
    /// Message 2 follows from the fixed block deltas.
    pub fn from_blocks(ihv: ChainingValue, block0: &MessageBlock, block1: &MessageBlock) -> Self {
        let twin0 = apply_delta(block0, &BLOCK0_MESSAGE_DELTA);
        let twin1 = apply_delta(block1, &BLOCK1_MESSAGE_DELTA);
        Self {
            ihv,
            message1: encode_message(block0, block1),
            message2: encode_message(&twin0, &twin1),
            chaining_value: compress(compress(ihv, block0), block1),
        }
    }

    /// Recomputes both chains and checks that they meet while the messages differ.
    pub fn is_collision(&self) -> bool {
        self.message1 != self.message2
            && chain(self.ihv, &self.message1) == self.chaining_value
            && chain(self.ihv, &self.message2) == self.chaining_value
    }

    /// Full MD5 digests of both messages.
    ///
    /// Only equal when the search started from the standard initial value.
    pub fn md5_digests(&self) -> ([u8; 16], [u8; 16]) {
        (hash(&self.message1), hash(&self.message2))
    }

    pub fn report(&self) -> CollisionReport {
        let (md5_1, md5_2) = self.md5_digests();
        CollisionReport {
            ihv: to_hex(&self.ihv.to_le_bytes()),
            message1: to_hex(&self.message1),
            message2: to_hex(&self.message2),
            chaining_value: to_hex(&self.chaining_value.to_le_bytes()),
            md5_message1: to_hex(&md5_1),
            md5_message2: to_hex(&md5_2),
        }
    }
}

/// Hex rendering of a [`CollisionPair`] for display and JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct CollisionReport {
    pub ihv: String,
    pub message1: String,
    pub message2: String,
    pub chaining_value: String,
    pub md5_message1: String,
    pub md5_message2: String,
}

fn encode_message(block0: &MessageBlock, block1: &MessageBlock) -> [u8; 128] {
    let mut out = [0u8; 128];
    out[..64].copy_from_slice(&block_to_le_bytes(block0));
    out[64..].copy_from_slice(&block_to_le_bytes(block1));
    out
}

fn chain(ihv: ChainingValue, message: &[u8; 128]) -> ChainingValue {
    message.chunks_exact(64).fold(ihv, |cv, chunk| {
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(chunk);
        compress(cv, &crate::md5::block_from_le_bytes(&bytes))
    })
}

/// Known MD5 collision example from Wang et al.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WangCollisionExample {
    /// First message block M0
    pub m0: [u32; 16],
    /// Second message block M1
    pub m1: [u32; 16],
    /// First message block prime M0'
    pub m0_prime: [u32; 16],
    /// Second message block prime M1'
    pub m1_prime: [u32; 16],
}

/// First known Wang collision (from "How to Break MD5 and Other Hash Functions", 2005)
pub const WANG_COLLISION_0: WangCollisionExample = WangCollisionExample {
    m0: [
        0x2dd31d1, 0xc4eee6c5, 0x69a3d69, 0x5cf9af98, 0x87b5ca2f, 0xab7e4612, 0x3e580440,
        0x897ffbb8, 0x634ad55, 0x2b3f409, 0x8388e483, 0x5a417125, 0xe8255108, 0x9fc9cdf7,
        0xf2bd1dd9, 0x5b3c3780,
    ],
    m1: [
        0xd11d0b96, 0x9c7b41dc, 0xf497d8e4, 0xd555655a, 0xc79a7335, 0xcfdebf0, 0x66f12930,
        0x8fb109d1, 0x797f2775, 0xeb5cd530, 0xbaade822, 0x5c15cc79, 0xddcb74ed, 0x6dd3c55f,
        0xd80a9bb1, 0xe3a7cc35,
    ],
    m0_prime: [
        0x2dd31d1, 0xc4eee6c5, 0x69a3d69, 0x5cf9af98, 0x7b5ca2f, 0xab7e4612, 0x3e580440,
        0x897ffbb8, 0x634ad55, 0x2b3f409, 0x8388e483, 0x5a41f125, 0xe8255108, 0x9fc9cdf7,
        0x72bd1dd9, 0x5b3c3780,
    ],
    m1_prime: [
        0xd11d0b96, 0x9c7b41dc, 0xf497d8e4, 0xd555655a, 0x479a7335, 0xcfdebf0, 0x66f12930,
        0x8fb109d1, 0x797f2775, 0xeb5cd530, 0xbaade822, 0x5c154c79, 0xddcb74ed, 0x6dd3c55f,
        0x580a9bb1, 0xe3a7cc35,
    ],
};

/// Second known Wang collision
pub const WANG_COLLISION_1: WangCollisionExample = WangCollisionExample {
    m0: [
        0x2dd31d1, 0xc4eee6c5, 0x69a3d69, 0x5cf9af98, 0x87b5ca2f, 0xab7e4612, 0x3e580440,
        0x897ffbb8, 0x634ad55, 0x2b3f409, 0x8388e483, 0x5a417125, 0xe8255108, 0x9fc9cdf7,
        0xf2bd1dd9, 0x5b3c3780,
    ],
    m1: [
        0x313e82d8, 0x5b8f3456, 0xd4ac6dae, 0xc619c936, 0xb4e253dd, 0xfd03da87, 0x6633902,
        0xa0cd48d2, 0x42339fe9, 0xe87e570f, 0x70b654ce, 0x1e0da880, 0xbc2198c6, 0x9383a8b6,
        0x2b65f996, 0x702af76f,
    ],
    m0_prime: [
        0x2dd31d1, 0xc4eee6c5, 0x69a3d69, 0x5cf9af98, 0x7b5ca2f, 0xab7e4612, 0x3e580440,
        0x897ffbb8, 0x634ad55, 0x2b3f409, 0x8388e483, 0x5a41f125, 0xe8255108, 0x9fc9cdf7,
        0x72bd1dd9, 0x5b3c3780,
    ],
    m1_prime: [
        0x313e82d8, 0x5b8f3456, 0xd4ac6dae, 0xc619c936, 0x34e253dd, 0xfd03da87, 0x6633902,
        0xa0cd48d2, 0x42339fe9, 0xe87e570f, 0x70b654ce, 0x1e0d2880, 0xbc2198c6, 0x9383a8b6,
        0xab65f996, 0x702af76f,
    ],
};

impl WangCollisionExample {
    /// Verify that this collision example actually produces a collision
    pub fn verify(&self) -> bool {
        self.as_pair().is_collision()
            && self.m0_prime == apply_delta(&self.m0, &BLOCK0_MESSAGE_DELTA)
            && self.m1_prime == apply_delta(&self.m1, &BLOCK1_MESSAGE_DELTA)
    }

    /// The example as a [`CollisionPair`] from the standard initial value.
    pub fn as_pair(&self) -> CollisionPair {
        CollisionPair::from_blocks(ChainingValue::STANDARD, &self.m0, &self.m1)
    }

    /// Get the intermediate state after M0
    pub fn intermediate_state_0(&self) -> ChainingValue {
        compress(ChainingValue::STANDARD, &self.m0)
    }

    /// Get the intermediate state after M0'
    pub fn intermediate_state_0_prime(&self) -> ChainingValue {
        compress(ChainingValue::STANDARD, &self.m0_prime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wang_collision_0_verify() {
        assert!(WANG_COLLISION_0.verify(), "Wang collision 0 should be valid");
    }

    #[test]
    fn test_wang_collision_1_verify() {
        assert!(WANG_COLLISION_1.verify(), "Wang collision 1 should be valid");
    }

    #[test]
    fn test_wang_block0_has_published_output_delta() {
        let example = WANG_COLLISION_0;
        let diff = example
            .intermediate_state_0_prime()
            .wrapping_difference(example.intermediate_state_0());
        assert_eq!(diff, BLOCK0_OUTPUT_DELTA);
        assert!(verify_block0(ChainingValue::STANDARD, &example.m0));
    }

    #[test]
    fn test_wang_block1_cancels_difference() {
        for example in [WANG_COLLISION_0, WANG_COLLISION_1] {
            assert!(verify_block1(example.intermediate_state_0(), &example.m1));
        }
    }

    #[test]
    fn test_tampered_block_fails_verification() {
        let mut m0 = WANG_COLLISION_0.m0;
        m0[0] ^= 1;
        assert!(!verify_block0(ChainingValue::STANDARD, &m0));

        let mut m1 = WANG_COLLISION_0.m1;
        m1[7] = m1[7].wrapping_add(1);
        assert!(!verify_block1(WANG_COLLISION_0.intermediate_state_0(), &m1));
    }

    #[test]
    fn test_block_deltas_cancel_on_high_words() {
        let both = apply_delta(&BLOCK0_MESSAGE_DELTA, &BLOCK1_MESSAGE_DELTA);
        assert_eq!(both, [0u32; 16]);
    }

    #[test]
    fn test_standard_iv_pair_has_equal_md5() {
        let pair = WANG_COLLISION_1.as_pair();
        let (h1, h2) = pair.md5_digests();
        assert_eq!(h1, h2);
        assert_ne!(pair.message1, pair.message2);

        let report = pair.report();
        assert_eq!(report.md5_message1, report.md5_message2);
        assert_eq!(report.message1.len(), 256);
    }
}
