//! Second-block differential paths.
//!
//! Which path block 1 follows depends on the chaining value block 0 left
//! behind. Wang's original path works for every block-0 output the search
//! accepts; Stevens' four paths need extra conditions but are much faster
//! when they apply. Each path is a [`VariantTable`] of constants driving the
//! one routine in [`block1`](super::block1).

use std::fmt;

use crate::mask::MaskTable;
use crate::md5::ChainingValue;
use crate::rng::Xrng64;
use crate::state::WorkingState;

use super::HIGH;

/// Free-bit table parameters, built into a [`MaskTable`] per search call.
#[derive(Debug, Clone, Copy)]
pub struct MaskSpec {
    pub bits: u32,
    pub shifts: &'static [u32],
    pub span: u32,
}

impl MaskSpec {
    pub fn build(&self) -> MaskTable {
        MaskTable::new(self.bits, self.shifts, self.span)
    }
}

/// How a joint `Q[9]`/`Q[10]` pattern is merged into the sampled values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Or,
    Xor,
}

impl Merge {
    #[inline(always)]
    pub fn apply(self, base: u32, flip: u32) -> u32 {
        match self {
            Merge::Or => base | flip,
            Merge::Xor => base ^ flip,
        }
    }
}

/// Constants of one second-block path.
#[derive(Debug, Clone, Copy)]
pub struct VariantTable {
    /// Samples `Q[2..=16]` under the first-round conditions
    pub sample: fn(&mut WorkingState, &mut Xrng64),
    /// Fixed bits of `Q[1]`, from the sampled state
    pub q1_fixed: fn(&WorkingState) -> u32,
    /// Bits of `Q[1]` drawn from the generator
    pub q1_free: u32,
    /// `(mask, expected)` for `Q[17] ^ Q[16]`
    pub q17: (u32, u32),
    /// Expected `(Q[18] ^ Q[17]) & 0xa0020000`
    pub q18: u32,
    /// Expected `Q[19] & 0x80020000`
    pub q19: u32,
    /// Required MSB of `Q[22]`
    pub q22_msb: bool,
    /// Free bits of `Q[4]`; without them `Q[21]` is tested inside level 1
    pub q4_flips: Option<MaskSpec>,
    /// Joint free bits of `Q[9]` and `Q[10]`
    pub q9q10_flips: MaskSpec,
    pub q9_part: u32,
    pub q10_part: u32,
    pub merge: Merge,
    /// Free bits of `Q[9]` alone
    pub q9_flips: MaskSpec,
    /// Required bit 15 of the step-34 sum
    pub step34_bit15: bool,
}

/// Second-block path, chosen from the block-0 output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathVariant {
    Wang,
    Stevens00,
    Stevens01,
    Stevens10,
    Stevens11,
}

impl PathVariant {
    /// Picks the path for a block-0 output chaining value.
    ///
    /// Stevens paths need `b`, `c` and `d` to share their MSB, bit 25 clear
    /// in all three, and equal bit 0 in `b` and `c`. Bits 6 and 0 of `b`
    /// then name the sub-variant.
    pub fn select(cv: ChainingValue) -> Self {
        let ChainingValue { b, c, d, .. } = cv;
        let stevens = (b ^ c) & HIGH == 0
            && (b ^ d) & HIGH == 0
            && d & (1 << 25) == 0
            && c & (1 << 25) == 0
            && b & (1 << 25) == 0
            && (b ^ c) & 1 == 0;
        if !stevens {
            return PathVariant::Wang;
        }
        match (b & (1 << 6) != 0, b & 1 != 0) {
            (true, true) => PathVariant::Stevens11,
            (true, false) => PathVariant::Stevens10,
            (false, true) => PathVariant::Stevens01,
            (false, false) => PathVariant::Stevens00,
        }
    }

    pub fn is_stevens(self) -> bool {
        self != PathVariant::Wang
    }

    pub fn table(self) -> &'static VariantTable {
        match self {
            PathVariant::Wang => &WANG,
            PathVariant::Stevens00 => &STEVENS_00,
            PathVariant::Stevens01 => &STEVENS_01,
            PathVariant::Stevens10 => &STEVENS_10,
            PathVariant::Stevens11 => &STEVENS_11,
        }
    }
}

impl fmt::Display for PathVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PathVariant::Wang => "Wang",
            PathVariant::Stevens00 => "Stevens 00",
            PathVariant::Stevens01 => "Stevens 01",
            PathVariant::Stevens10 => "Stevens 10",
            PathVariant::Stevens11 => "Stevens 11",
        };
        f.write_str(name)
    }
}

fn sample_stevens_00(q: &mut WorkingState, rng: &mut Xrng64) {
    let aa1 = q[0] & HIGH;
    q[2] = (rng.next_u32() & 0x49a0e73e) | 0x221f00c1 | aa1;
    q[3] = (rng.next_u32() & 0x0000040c) | 0x3fce1a71 | (q[2] & 0x8000e000);
    q[4] = (rng.next_u32() & 0x00000004) | (0xa5f281a2 ^ (q[3] & 0x80000008));
    q[5] = (rng.next_u32() & 0x00000004) | 0x67fd823b;
    q[6] = (rng.next_u32() & 0x00001044) | 0x15e5829a;
    q[7] = (rng.next_u32() & 0x00200806) | 0x950430b0;
    q[8] = (rng.next_u32() & 0x60050110) | 0x1bd29ca2 | (q[7] & 0x00000004);
    q[9] = (rng.next_u32() & 0x40044000) | 0xb8820004;
    q[10] = 0xf288b209 | (q[9] & 0x00044000);
    q[11] = (rng.next_u32() & 0x12888008) | 0x85712f57;
    q[12] = (rng.next_u32() & 0x1ed98d7f) | 0xc0023080 | (!q[11] & 0x00200000);
    q[13] = (rng.next_u32() & 0x0efb1d77) | 0x1000c008;
    q[14] = (rng.next_u32() & 0x0fff5d77) | 0xa000a288;
    q[15] = (rng.next_u32() & 0x0efe7ff7) | 0xe0008000 | (!q[14] & 0x00010000);
    q[16] = (rng.next_u32() & 0x0ffdffff) | 0xf0000000 | (!q[15] & 0x00020000);
}

fn sample_stevens_01(q: &mut WorkingState, rng: &mut Xrng64) {
    let aa1 = q[0] & HIGH;
    q[2] = (rng.next_u32() & 0x4db0e03e) | 0x32460441 | aa1;
    q[3] = (rng.next_u32() & 0x0c000008) | 0x123c3af1 | (q[2] & 0x80800002);
    q[4] = 0xe398f812 ^ (q[3] & 0x88000000);
    q[5] = (rng.next_u32() & 0x82000000) | 0x4c66e99e;
    q[6] = (rng.next_u32() & 0x80000000) | 0x27180590;
    q[7] = (rng.next_u32() & 0x00010130) | 0x51ea9e47;
    q[8] = (rng.next_u32() & 0x40200800) | 0xb7c291e5;
    q[9] = (rng.next_u32() & 0x00044000) | 0x380002b4;
    q[10] = 0xb282b208 | (q[9] & 0x00044000);
    q[11] = (rng.next_u32() & 0x12808008) | 0xc5712f47;
    q[12] = (rng.next_u32() & 0x1ef18d7f) | 0x000a3080;
    q[13] = (rng.next_u32() & 0x1efb1d77) | 0x4004c008;
    q[14] = (rng.next_u32() & 0x1fff5d77) | 0x6000a288;
    q[15] = (rng.next_u32() & 0x1efe7ff7) | 0xa0008000 | (!q[14] & 0x00010000);
    q[16] = (rng.next_u32() & 0x1ffdffff) | 0x20000000 | (!q[15] & 0x00020000);
}

fn sample_stevens_10(q: &mut WorkingState, rng: &mut Xrng64) {
    let aa1 = q[0] & HIGH;
    q[2] = (rng.next_u32() & 0x79b0c6ba) | 0x024c3841 | aa1;
    q[3] = (rng.next_u32() & 0x19300210) | 0x2603096d | (q[2] & 0x80000082);
    q[4] = (rng.next_u32() & 0x10300000) | 0xe4cae30c | (q[3] & 0x01000030);
    q[5] = (rng.next_u32() & 0x10000000) | 0x63494061 | (q[4] & 0x00300000);
    q[6] = 0x7deaff68;
    q[7] = (rng.next_u32() & 0x20444000) | 0x09091ee0;
    q[8] = (rng.next_u32() & 0x09040000) | 0xb2529f6d;
    q[9] = (rng.next_u32() & 0x00040000) | 0x10885184;
    q[10] = (rng.next_u32() & 0x00000080) | 0x428afb11 | (q[9] & 0x00040000);
    q[11] = (rng.next_u32() & 0x128a8110) | 0x6571266b | (q[10] & 0x00000080);
    q[12] = (rng.next_u32() & 0x3ef38d7f) | 0x00003080 | (!q[11] & 0x00080000);
    q[13] = (rng.next_u32() & 0x3efb1d77) | 0x0004c008;
    q[14] = (rng.next_u32() & 0x5fff5d77) | 0x8000a288;
    q[15] = (rng.next_u32() & 0x1efe7ff7) | 0xe0008000 | (!q[14] & 0x00010000);
    q[16] = (rng.next_u32() & 0x5ffdffff) | 0x20000000 | (!q[15] & 0x00020000);
}

fn sample_stevens_11(q: &mut WorkingState, rng: &mut Xrng64) {
    let aa1 = q[0] & HIGH;
    q[2] = (rng.next_u32() & 0x75bef63e) | 0x0a410041 | aa1;
    q[3] = (rng.next_u32() & 0x10345614) | 0x0202a9e1 | (q[2] & 0x84000002);
    q[4] = (rng.next_u32() & 0x00145400) | 0xe84ba909 | (q[3] & 0x00000014);
    q[5] = (rng.next_u32() & 0x80000000) | 0x75e90b1d | (q[4] & 0x00145400);
    q[6] = 0x7c23ff5a | (q[5] & 0x80000000);
    q[7] = (rng.next_u32() & 0x40000880) | 0x114bf41a;
    q[8] = (rng.next_u32() & 0x00002090) | 0xb352dd01;
    q[9] = (rng.next_u32() & 0x00044000) | 0x7a803124;
    q[10] = (rng.next_u32() & 0x00002000) | 0xf28a92c9 | (q[9] & 0x00044000);
    q[11] = (rng.next_u32() & 0x128a8108) | 0xc5710ed7 | (q[10] & 0x00002000);
    q[12] = (rng.next_u32() & 0x9edb8d7f) | 0x20003080 | (!q[11] & 0x00200000);
    q[13] = (rng.next_u32() & 0x3efb1d77) | 0x4004c008 | (q[12] & 0x80000000);
    q[14] = (rng.next_u32() & 0x1fff5d77) | 0x0000a288;
    q[15] = (rng.next_u32() & 0x1efe7ff7) | 0x20008000 | (!q[14] & 0x00010000);
    q[16] = (rng.next_u32() & 0x1ffdffff) | 0x20000000 | (!q[15] & 0x40020000);
}

fn sample_wang(q: &mut WorkingState, rng: &mut Xrng64) {
    let aa1 = q[0] & HIGH;
    let bb1 = HIGH ^ aa1;
    q[2] = (rng.next_u32() & 0x71de7799) | 0x0c008840 | bb1;
    q[3] = (rng.next_u32() & 0x01c06601) | 0x3e1f0966 | (q[2] & 0x80000018);
    q[4] = 0x3a040010 | (q[3] & 0x80000601);
    q[5] = (rng.next_u32() & 0x03c0e000) | 0x482f0e50 | aa1;
    q[6] = (rng.next_u32() & 0x600c0000) | 0x05e2ec56 | aa1;
    q[7] = (rng.next_u32() & 0x604c203e) | 0x16819e01 | bb1 | (q[6] & 0x01000000);
    q[8] = (rng.next_u32() & 0x604c7c1c) | 0x043283e0 | (q[7] & 0x80000002);
    q[9] = (rng.next_u32() & 0x00002800) | 0x1c0101c1 | (q[8] & 0x80001000);
    q[10] = 0x078bcbc0 | bb1;
    q[11] = (rng.next_u32() & 0x07800000) | 0x607dc7df | bb1;
    q[12] = (rng.next_u32() & 0x00f00f7f) | 0x00081080 | (q[11] & 0xe7000000);
    q[13] = (rng.next_u32() & 0x00701f77) | 0x3f0fe008 | aa1;
    q[14] = (rng.next_u32() & 0x00701f77) | 0x408be088 | aa1;
    q[15] = (rng.next_u32() & 0x00ff3ff7) | 0x7d000000;
    q[16] = (rng.next_u32() & 0x4ffdffff) | 0x20000000 | (!q[15] & 0x00020000);
}

pub static STEVENS_00: VariantTable = VariantTable {
    sample: sample_stevens_00,
    q1_fixed: |q| 0x02020801 | (q[0] & 0x80000000),
    q1_free: 0x7dfdf7be,
    q17: (0x80008008, 0x80000000),
    q18: 0x80020000,
    q19: 0x80000000,
    q22_msb: true,
    q4_flips: None,
    q9q10_flips: MaskSpec { bits: 3, shifts: &[5, 12, 25], span: 0x08002020 },
    q9_part: 0x00002000,
    q10_part: 0x08000020,
    merge: Merge::Or,
    q9_flips: MaskSpec { bits: 9, shifts: &[1, 3, 6, 8, 11, 14, 18], span: 0x04310d12 },
    step34_bit15: false,
};

pub static STEVENS_01: VariantTable = VariantTable {
    sample: sample_stevens_01,
    q1_fixed: |q| 0x02000021 ^ (q[0] & 0x80000020),
    q1_free: 0x7dfff39e,
    q17: (0x80008008, 0x80000000),
    q18: 0x80020000,
    q19: 0,
    q22_msb: false,
    q4_flips: None,
    q9q10_flips: MaskSpec { bits: 5, shifts: &[4, 11, 24, 27], span: 0x88002030 },
    q9_part: 0x80002000,
    q10_part: 0x08000030,
    merge: Merge::Or,
    q9_flips: MaskSpec { bits: 9, shifts: &[1, 7, 9, 12, 15, 19, 22], span: 0x44310d02 },
    step34_bit15: false,
};

pub static STEVENS_10: VariantTable = VariantTable {
    sample: sample_stevens_10,
    q1_fixed: |q| 0x02000941 ^ (q[0] & 0x80000000),
    q1_free: 0x7dfdf6be,
    q17: (0x80008008, 0x80000000),
    q18: 0x80020000,
    q19: 0,
    q22_msb: false,
    q4_flips: None,
    q9q10_flips: MaskSpec { bits: 4, shifts: &[2, 8, 11, 25], span: 0x08004204 },
    q9_part: 0x00004200,
    q10_part: 0x08000004,
    merge: Merge::Or,
    q9_flips: MaskSpec { bits: 10, shifts: &[1, 2, 3, 7, 12, 15, 18, 20], span: 0x2471042a },
    step34_bit15: false,
};

pub static STEVENS_11: VariantTable = VariantTable {
    sample: sample_stevens_11,
    q1_fixed: |q| 0x02000861 ^ (q[0] & 0x80000020),
    q1_free: 0x7dfff79e,
    q17: (0xc0008008, 0x40000000),
    q18: 0x80020000,
    q19: 0x80000000,
    q22_msb: true,
    q4_flips: None,
    q9q10_flips: MaskSpec { bits: 5, shifts: &[5, 6, 7, 24, 27], span: 0x880002a0 },
    q9_part: 0x80000280,
    q10_part: 0x08000040,
    merge: Merge::Or,
    q9_flips: MaskSpec { bits: 9, shifts: &[1, 3, 8, 12, 15, 18], span: 0x04710c12 },
    step34_bit15: false,
};

pub static WANG: VariantTable = VariantTable {
    sample: sample_wang,
    q1_fixed: |q| 0x04200040 | (q[2] & 0xf01e1080),
    q1_free: 0x01c0e71f,
    q17: (0xc0008008, 0x40000000),
    q18: 0x00020000,
    q19: 0,
    q22_msb: false,
    q4_flips: Some(MaskSpec { bits: 6, shifts: &[13, 19], span: 0x01c0e000 }),
    q9q10_flips: MaskSpec { bits: 5, shifts: &[5, 13, 17, 24], span: 0x18084020 },
    q9_part: 0x00084000,
    q10_part: 0x18000020,
    merge: Merge::Xor,
    q9_flips: MaskSpec { bits: 10, shifts: &[1, 7, 14, 15, 22], span: 0x6074041c },
    step34_bit15: true,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::WANG_COLLISION_0;

    const ALL: [PathVariant; 5] = [
        PathVariant::Wang,
        PathVariant::Stevens00,
        PathVariant::Stevens01,
        PathVariant::Stevens10,
        PathVariant::Stevens11,
    ];

    #[test]
    fn test_select_stevens_sub_variants() {
        let base = ChainingValue::new(0x01234567, 0x1c3d5e00, 0x10203040, 0x04050607);
        assert_eq!(PathVariant::select(base), PathVariant::Stevens00);
        assert_eq!(
            PathVariant::select(ChainingValue { b: base.b | 1, c: base.c | 1, ..base }),
            PathVariant::Stevens01
        );
        assert_eq!(
            PathVariant::select(ChainingValue { b: base.b | 0x40, ..base }),
            PathVariant::Stevens10
        );
        assert_eq!(
            PathVariant::select(ChainingValue { b: base.b | 0x41, c: base.c | 1, ..base }),
            PathVariant::Stevens11
        );
    }

    #[test]
    fn test_select_falls_back_to_wang() {
        let base = ChainingValue::new(0x01234567, 0x1c3d5e00, 0x10203040, 0x04050607);
        // bit 25 of c
        assert_eq!(
            PathVariant::select(ChainingValue { c: base.c | (1 << 25), ..base }),
            PathVariant::Wang
        );
        // MSB of d differs from b
        assert_eq!(
            PathVariant::select(ChainingValue { d: base.d | HIGH, ..base }),
            PathVariant::Wang
        );
        // bit 0 of b and c differ
        assert_eq!(PathVariant::select(ChainingValue { b: base.b | 1, ..base }), PathVariant::Wang);

        assert_eq!(PathVariant::select(WANG_COLLISION_0.intermediate_state_0()), PathVariant::Wang);
    }

    #[test]
    fn test_tables_are_complete() {
        for variant in ALL {
            let table = variant.table();
            let mut specs = vec![table.q9q10_flips, table.q9_flips];
            specs.extend(table.q4_flips);
            for spec in specs {
                let masks = spec.build();
                let mut seen: Vec<u32> = masks.iter().collect();
                seen.sort_unstable();
                seen.dedup();
                assert_eq!(seen.len(), 1 << spec.bits, "{} span {:#x}", variant, spec.span);
            }
            assert_eq!(
                table.q9q10_flips.span,
                table.q9_part | table.q10_part,
                "{}: joint span must split into Q[9] and Q[10] parts",
                variant
            );
            assert_eq!(table.q9_part & table.q10_part, 0);
        }
    }

    #[test]
    fn test_samplers_keep_fixed_bits() {
        let mut rng = Xrng64::from_seed(b"variant samplers");
        for variant in ALL {
            let mut q = WorkingState::new(ChainingValue::STANDARD);
            (variant.table().sample)(&mut q, &mut rng);
            // Bit 17 of Q[16] is always the complement of bit 17 of Q[15].
            assert_ne!(q[16] & 0x00020000, q[15] & 0x00020000, "{}", variant);
        }
    }

    #[test]
    fn test_only_wang_flips_q4() {
        for variant in ALL {
            assert_eq!(variant.table().q4_flips.is_some(), !variant.is_stevens());
            assert_eq!(variant.table().step34_bit15, !variant.is_stevens());
        }
    }
}
