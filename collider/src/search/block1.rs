//! Second near-collision block.
//!
//! Starting from the chaining value after block 0, finds a block that
//! cancels the block-0 difference: message 1 and message 2 (each shifted by
//! its block delta) compress to the same value. One routine serves all five
//! paths; the constants come from [`VariantTable`].
//!
//! Stevens paths are written for message 2's side of the pair, so they
//! search from the shifted chaining value and hand back the block plus the
//! block-0 message delta.

use log::{debug, info};

use super::variant::{PathVariant, VariantTable};
use super::{run_tail, Search, HIGH, TAIL_CHECKS};
use crate::collision::{apply_delta, verify_block1, BLOCK0_MESSAGE_DELTA, BLOCK0_OUTPUT_DELTA};
use crate::control::CancellationToken;
use crate::mask::MaskTable;
use crate::md5::step::{ff, gg, AC};
use crate::md5::{ChainingValue, MessageBlock};
use crate::state::WorkingState;

const REJECT_Q17: u32 = 1;
const REJECT_Q17_BIT17: u32 = 2;
const REJECT_Q18: u32 = 3;
const REJECT_Q19: u32 = 4;
const REJECT_Q20: u32 = 5;
const REJECT_Q21: u32 = 6;
const LEVEL1_EXHAUSTED: u32 = 7;
const REJECT_Q22: u32 = 8;
const REJECT_Q23_SUM: u32 = 9;
const REJECT_Q23: u32 = 10;
const REJECT_Q24: u32 = 11;
const TAIL: u32 = 12;
const REJECT_OUTPUT: u32 = TAIL + TAIL_CHECKS;
const FOUND: u32 = REJECT_OUTPUT + 1;

/// Checkpoints reported by [`find_block1`].
///
/// One scale for all five paths. Stevens-00 is often shown on a 29-step
/// scale elsewhere; hosts should read the maximum from
/// [`Progress`](crate::control::Progress) instead of assuming either.
pub const BLOCK1_CHECKPOINTS: u32 = FOUND;

const LEVEL1_TRIES: u32 = 1 << 12;

/// Searches for the second block of message 1.
///
/// `cv` is message 1's chaining value after block 0. Returns `None` only
/// when cancelled. Progress is reported on a scale of [`BLOCK1_CHECKPOINTS`].
pub fn find_block1<C: CancellationToken + ?Sized>(
    cv: ChainingValue,
    search: &mut Search<'_, C>,
) -> Option<MessageBlock> {
    search.progress.begin_phase(BLOCK1_CHECKPOINTS);
    let variant = PathVariant::select(cv);
    info!("block 1: {} path from {:08x?}", variant, cv.words());

    let start = if variant.is_stevens() {
        cv.wrapping_offset(BLOCK0_OUTPUT_DELTA)
    } else {
        cv
    };
    let block = search_path(cv, start, variant, search)?;
    info!("block 1: found");
    Some(block)
}

/// Message-1 block for a candidate found from the search's starting point.
#[inline(always)]
fn message1_block(variant: PathVariant, block: &MessageBlock) -> MessageBlock {
    if variant.is_stevens() {
        apply_delta(block, &BLOCK0_MESSAGE_DELTA)
    } else {
        *block
    }
}

fn search_path<C: CancellationToken + ?Sized>(
    cv: ChainingValue,
    start: ChainingValue,
    variant: PathVariant,
    search: &mut Search<'_, C>,
) -> Option<MessageBlock> {
    let table: &VariantTable = variant.table();
    let q4_flips = table.q4_flips.map_or_else(MaskTable::single, |spec| spec.build());
    let q9q10_flips = table.q9q10_flips.build();
    let q9_flips = table.q9_flips.build();
    let (q17_mask, q17_expected) = table.q17;

    let mut q = WorkingState::new(start);
    let mut block: MessageBlock = [0; 16];
    let mut restarts: u64 = 0;

    loop {
        if search.cancelled() {
            return None;
        }
        restarts += 1;
        if restarts % (1 << 12) == 0 {
            debug!("block 1: {} restarts", restarts);
        }

        (table.sample)(&mut q, &mut *search.rng);
        for t in [5, 6, 7, 11, 14, 15] {
            q.solve_word(t, &mut block);
        }

        let tt17 = gg(q[16], q[15], q[14]).wrapping_add(q[13]).wrapping_add(AC[16]);
        let tt18 = q[14].wrapping_add(AC[17]).wrapping_add(block[6]);
        let tt19 = q[15].wrapping_add(AC[18]).wrapping_add(block[11]);
        let tt0 = ff(q[0], q[-1], q[-2]).wrapping_add(q[-3]).wrapping_add(AC[0]);
        let tt1 = q[-2].wrapping_add(AC[1]);
        let q1_fixed = (table.q1_fixed)(&q);

        // Level 1: Q[1] until Q[17..=20] hold (and Q[21] when Q[4] is fixed).
        let mut found = false;
        for _ in 0..LEVEL1_TRIES {
            if search.cancelled() {
                return None;
            }

            let q1 = q1_fixed | (search.next_u32() & table.q1_free);
            let m1 = q[2]
                .wrapping_sub(q1)
                .rotate_right(12)
                .wrapping_sub(ff(q1, q[0], q[-1]))
                .wrapping_sub(tt1);

            let q16 = q[16];
            let q17 = tt17.wrapping_add(m1).rotate_left(5).wrapping_add(q16);
            if (q17 ^ q16) & q17_mask != q17_expected {
                search.checkpoint(REJECT_Q17);
                continue;
            }
            if q17 & 0x00020000 != 0 {
                search.checkpoint(REJECT_Q17_BIT17);
                continue;
            }

            let q18 = gg(q17, q16, q[15]).wrapping_add(tt18).rotate_left(9).wrapping_add(q17);
            if (q18 ^ q17) & 0xa0020000 != table.q18 {
                search.checkpoint(REJECT_Q18);
                continue;
            }

            let q19 = gg(q18, q17, q16).wrapping_add(tt19).rotate_left(14).wrapping_add(q18);
            if q19 & 0x80020000 != table.q19 {
                search.checkpoint(REJECT_Q19);
                continue;
            }

            let m0 = q1.wrapping_sub(q[0]).rotate_right(7).wrapping_sub(tt0);
            let q20 = gg(q19, q18, q17)
                .wrapping_add(q16)
                .wrapping_add(AC[19])
                .wrapping_add(m0)
                .rotate_left(20)
                .wrapping_add(q19);
            if (q20 ^ q19) & 0x80040000 != 0x00040000 {
                search.checkpoint(REJECT_Q20);
                continue;
            }

            q[1] = q1;
            q[17] = q17;
            q[18] = q18;
            q[19] = q19;
            q[20] = q20;
            block[0] = m0;
            block[1] = m1;

            if table.q4_flips.is_none() {
                q.solve_word(5, &mut block);
                let q21 = gg(q[20], q[19], q[18])
                    .wrapping_add(q[17])
                    .wrapping_add(AC[20])
                    .wrapping_add(block[5])
                    .rotate_left(5)
                    .wrapping_add(q[20]);
                if (q21 ^ q[20]) & 0x80020000 != 0 {
                    search.checkpoint(REJECT_Q21);
                    continue;
                }
                q[21] = q21;
            }

            found = true;
            break;
        }
        if !found {
            search.checkpoint(LEVEL1_EXHAUSTED);
            continue;
        }

        q.solve_word(2, &mut block);

        let q4_base = q[4];
        let q9_base = q[9];
        let q10_base = q[10];
        let tt21 = gg(q[20], q[19], q[18]).wrapping_add(q[17]).wrapping_add(AC[20]);

        // Level 2: free bits of Q[4] (a single empty pattern for Stevens paths).
        for q4_flip in q4_flips.iter() {
            if search.cancelled() {
                return None;
            }

            if table.q4_flips.is_some() {
                q[4] = q4_base ^ q4_flip;
                q.solve_word(5, &mut block);
                let q21 = tt21.wrapping_add(block[5]).rotate_left(5).wrapping_add(q[20]);
                if (q21 ^ q[20]) & 0x80020000 != 0 {
                    search.checkpoint(REJECT_Q21);
                    continue;
                }
                q[21] = q21;
            }

            for t in [3, 4, 7] {
                q.solve_word(t, &mut block);
            }

            let tt10 = q[7].wrapping_add(AC[10]);
            let tt22 = gg(q[21], q[20], q[19]).wrapping_add(q[18]).wrapping_add(AC[21]);
            let tt23 = q[19].wrapping_add(AC[22]).wrapping_add(block[15]);
            let tt24 = q[20].wrapping_add(AC[23]).wrapping_add(block[4]);

            // Level 3: Q[9] and Q[10] jointly, testing Q[22..=24].
            for joint in q9q10_flips.iter() {
                if search.cancelled() {
                    return None;
                }

                let q10 = table.merge.apply(q10_base, joint & table.q10_part);
                let q9 = table.merge.apply(q9_base, joint & table.q9_part);
                let m10 = q[11]
                    .wrapping_sub(q10)
                    .rotate_right(17)
                    .wrapping_sub(ff(q10, q9, q[8]).wrapping_add(tt10));

                let aa = q[21];
                let dd = tt22.wrapping_add(m10).rotate_left(9).wrapping_add(aa);
                if (dd & HIGH != 0) != table.q22_msb {
                    search.checkpoint(REJECT_Q22);
                    continue;
                }

                let bb = q[20];
                let cc = tt23.wrapping_add(gg(dd, aa, bb));
                if cc & 0x20000 != 0 {
                    search.checkpoint(REJECT_Q23_SUM);
                    continue;
                }
                let cc = cc.rotate_left(14).wrapping_add(dd);
                if cc & HIGH != 0 {
                    search.checkpoint(REJECT_Q23);
                    continue;
                }

                let bb = tt24.wrapping_add(gg(cc, dd, aa)).rotate_left(20).wrapping_add(cc);
                if bb & HIGH == 0 {
                    search.checkpoint(REJECT_Q24);
                    continue;
                }

                block[10] = m10;
                q[9] = q9;
                q[10] = q10;
                q.solve_word(13, &mut block);
                q[22] = dd;
                q[23] = cc;
                q[24] = bb;

                // Level 4: free bits of Q[9], then the remaining 40 steps.
                for q9_flip in q9_flips.iter() {
                    if search.cancelled() {
                        return None;
                    }

                    q[9] = q9 ^ q9_flip;
                    for t in [8, 9, 12] {
                        q.solve_word(t, &mut block);
                    }

                    if let Err(check) = run_tail(&mut q, &block, table.step34_bit15) {
                        search.checkpoint(TAIL + check);
                        continue;
                    }

                    let candidate = message1_block(variant, &block);
                    if !verify_block1(cv, &candidate) {
                        search.checkpoint(REJECT_OUTPUT);
                        continue;
                    }

                    search.checkpoint(FOUND);
                    debug!("block 1: {} restarts", restarts);
                    return Some(candidate);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{NeverCancel, Progress};
    use crate::md5::compress;
    use crate::rng::Xrng64;

    fn run(cv: ChainingValue, seed: &[u8]) -> (MessageBlock, (u32, u32)) {
        let progress = Progress::new();
        let mut rng = Xrng64::from_seed(seed);
        let mut search = Search::new(&mut rng, &NeverCancel, &progress);
        let block = find_block1(cv, &mut search).unwrap();
        (block, progress.snapshot())
    }

    #[test]
    fn test_stevens_00_block_cancels_difference() {
        let cv = ChainingValue::new(0x01234567, 0x1c3d5e00, 0x10203040, 0x04050607);
        assert_eq!(PathVariant::select(cv), PathVariant::Stevens00);

        let (block, progress) = run(cv, b"s00-0");
        assert!(verify_block1(cv, &block));
        assert_eq!(progress, (FOUND, BLOCK1_CHECKPOINTS));
    }

    #[test]
    fn test_stevens_11_block_cancels_difference() {
        let cv = ChainingValue::new(0x01234567, 0x1c3d5e41, 0x10203041, 0x04050607);
        assert_eq!(PathVariant::select(cv), PathVariant::Stevens11);

        let (block, _) = run(cv, b"s11-5");
        let twin = apply_delta(&block, &crate::collision::BLOCK1_MESSAGE_DELTA);
        assert_eq!(
            compress(cv, &block),
            compress(cv.wrapping_offset(BLOCK0_OUTPUT_DELTA), &twin)
        );
    }

    #[test]
    fn test_stevens_01_block_cancels_difference() {
        let base = ChainingValue::new(0x01234567, 0x1c3d5e00, 0x10203040, 0x04050607);
        let cv = ChainingValue { b: base.b | 1, c: base.c | 1, ..base };
        assert_eq!(PathVariant::select(cv), PathVariant::Stevens01);

        let (block, progress) = run(cv, b"p01");
        assert!(verify_block1(cv, &block));
        assert_eq!(progress, (FOUND, BLOCK1_CHECKPOINTS));
    }

    #[test]
    fn test_stevens_10_block_cancels_difference() {
        let base = ChainingValue::new(0x01234567, 0x1c3d5e00, 0x10203040, 0x04050607);
        let cv = ChainingValue { b: base.b | 0x40, ..base };
        assert_eq!(PathVariant::select(cv), PathVariant::Stevens10);

        let (block, progress) = run(cv, b"p10");
        assert!(verify_block1(cv, &block));
        assert_eq!(progress, (FOUND, BLOCK1_CHECKPOINTS));
    }

    #[test]
    fn test_wang_block_after_published_first_block() {
        let cv = crate::collision::WANG_COLLISION_0.intermediate_state_0();
        assert_eq!(PathVariant::select(cv), PathVariant::Wang);

        let (block, progress) = run(cv, b"w-0");
        assert!(verify_block1(cv, &block));
        assert_eq!(progress, (FOUND, BLOCK1_CHECKPOINTS));
    }

    #[test]
    fn test_message1_block_only_shifts_stevens() {
        let block = [7u32; 16];
        assert_eq!(message1_block(PathVariant::Wang, &block), block);
        let shifted = message1_block(PathVariant::Stevens10, &block);
        assert_eq!(shifted[11], 7 + (1 << 15));
        assert_eq!(shifted[4], 7 + (1 << 31));
    }
}
