//! First near-collision block.
//!
//! Finds a block whose twin (the block plus [`BLOCK0_MESSAGE_DELTA`]) moves
//! the chaining value by exactly [`BLOCK0_OUTPUT_DELTA`]. The search nests
//! four levels, each cheaper and more numerous than the one outside it:
//!
//! | level | varies                  | tries      | tests           |
//! |-------|-------------------------|------------|-----------------|
//! | 0     | `Q[1]`, `Q[3..=16]`     | unbounded  | none            |
//! | 1     | `Q[17]`                 | up to 2^7  | `Q[18..=20]`    |
//! | 2     | free bits of `Q[4]`     | 2^4        | `Q[21]`         |
//! | 3     | free bits of `Q[9..=10]`| 2^3        | `Q[22..=24]`    |
//! | 4     | free bits of `Q[9]`     | 2^16       | steps 24..64    |
//!
//! [`BLOCK0_MESSAGE_DELTA`]: crate::collision::BLOCK0_MESSAGE_DELTA
//! [`BLOCK0_OUTPUT_DELTA`]: crate::collision::BLOCK0_OUTPUT_DELTA

use log::{debug, info};

use super::{run_tail, Search, HIGH, TAIL_CHECKS};
use crate::collision::verify_block0;
use crate::control::CancellationToken;
use crate::mask::MaskTable;
use crate::md5::step::{ff, gg, AC};
use crate::md5::{ChainingValue, MessageBlock};
use crate::rng::Xrng64;
use crate::state::WorkingState;

const REJECT_Q18: u32 = 1;
const REJECT_Q19: u32 = 2;
const REJECT_Q20: u32 = 3;
const LEVEL1_EXHAUSTED: u32 = 4;
const REJECT_Q21: u32 = 5;
const REJECT_Q22: u32 = 6;
const REJECT_Q23_SUM: u32 = 7;
const REJECT_Q23: u32 = 8;
const REJECT_Q24: u32 = 9;
const TAIL: u32 = 10;
const REJECT_OUTPUT: u32 = TAIL + TAIL_CHECKS;
const FOUND: u32 = REJECT_OUTPUT + 1;

/// Checkpoints reported by [`find_block0`].
pub const BLOCK0_CHECKPOINTS: u32 = FOUND;

/// Samples `Q[1]` and `Q[3..=16]` under the first-round conditions.
///
/// One generator call per free field, in increasing `Q` order.
fn sample_round_one(q: &mut WorkingState, rng: &mut Xrng64) {
    q[1] = rng.next_u32();
    q[3] = (rng.next_u32() & 0xfe87bc3f) | 0x017841c0;
    q[4] = (rng.next_u32() & 0x44000033) | 0x000002c0 | (q[3] & 0x0287bc00);
    q[5] = 0x41ffffc8 | (q[4] & 0x04000033);
    q[6] = 0xb84b82d6;
    q[7] = (rng.next_u32() & 0x68000084) | 0x02401b43;
    q[8] = (rng.next_u32() & 0x2b8f6e04) | 0x005090d3 | (!q[7] & 0x40000000);
    q[9] = 0x20040068 | (q[8] & 0x00020000) | (!q[8] & 0x40000000);
    q[10] = (rng.next_u32() & 0x40000000) | 0x1040b089;
    q[11] = (rng.next_u32() & 0x10408008) | 0x0fbb7f16 | (!q[10] & 0x40000000);
    q[12] = (rng.next_u32() & 0x1ed9df7f) | 0x00022080 | (!q[11] & 0x40200000);
    q[13] = (rng.next_u32() & 0x5efb4f77) | 0x20049008;
    q[14] = (rng.next_u32() & 0x1fff5f77) | 0x0000a088 | (!q[13] & 0x40000000);
    q[15] = (rng.next_u32() & 0x5efe7ff7) | 0x80008000 | (!q[14] & 0x00010000);
    q[16] = (rng.next_u32() & 0x1ffdffff) | 0xa0000000 | (!q[15] & 0x40020000);
}

/// Chaining-value conditions block 1 can continue from.
///
/// Either the Wang or the Stevens family of second-block paths must accept
/// the output before the exact difference is worth checking.
fn output_accepted(cv: ChainingValue, q: &WorkingState) -> bool {
    let ihv1 = cv.b.wrapping_add(q[64]);
    let ihv2 = cv.c.wrapping_add(q[63]);
    let ihv3 = cv.d.wrapping_add(q[62]);

    let wang = (ihv2 ^ ihv1) & 0x86000000 == 0x02000000
        && (ihv1 ^ ihv3) & 0x82000000 == 0
        && ihv1 & 0x06000020 == 0;
    let stevens = (ihv1 ^ ihv2) >> 31 == 0
        && (ihv1 ^ ihv3) >> 31 == 0
        && ihv3 & (1 << 25) == 0
        && ihv2 & (1 << 25) == 0
        && ihv1 & (1 << 25) == 0
        && (ihv2 ^ ihv1) & 1 == 0;
    wang || stevens
}

/// Searches for the first block of message 1 starting from `cv`.
///
/// Returns `None` only when cancelled. Progress is reported on a scale of
/// [`BLOCK0_CHECKPOINTS`].
pub fn find_block0<C: CancellationToken + ?Sized>(
    cv: ChainingValue,
    search: &mut Search<'_, C>,
) -> Option<MessageBlock> {
    search.progress.begin_phase(BLOCK0_CHECKPOINTS);
    info!("block 0: searching from {:08x?}", cv.words());

    let q4_flips = MaskTable::new(4, &[2, 26], 0x38000004);
    let q9q10_flips = MaskTable::new(3, &[13, 4], 0x2060);
    let q9_flips = MaskTable::new(16, &[1, 2, 5, 7, 8, 10, 11, 13], 0x0eb94f16);

    let mut q = WorkingState::new(cv);
    let mut block: MessageBlock = [0; 16];
    let mut restarts: u64 = 0;

    loop {
        if search.cancelled() {
            return None;
        }
        restarts += 1;
        if restarts % (1 << 16) == 0 {
            debug!("block 0: {} restarts", restarts);
        }

        sample_round_one(&mut q, &mut *search.rng);
        for t in [0, 6, 7, 11, 14, 15] {
            q.solve_word(t, &mut block);
        }

        let tt1 = ff(q[1], q[0], q[-1]).wrapping_add(q[-2]).wrapping_add(AC[1]);
        let tt17 = gg(q[16], q[15], q[14]).wrapping_add(q[13]).wrapping_add(AC[16]);
        let tt18 = q[14].wrapping_add(AC[17]).wrapping_add(block[6]);
        let tt19 = q[15].wrapping_add(AC[18]).wrapping_add(block[11]);
        let tt20 = q[16].wrapping_add(AC[19]).wrapping_add(block[0]);
        let tt5 = q[6]
            .wrapping_sub(q[5])
            .rotate_right(12)
            .wrapping_sub(ff(q[5], q[4], q[3]))
            .wrapping_sub(AC[5]);

        // Level 1: Q[17] until Q[18..=20] hold.
        let mut found = false;
        for _ in 0..1 << 7 {
            if search.cancelled() {
                return None;
            }

            let q16 = q[16];
            let q17 = ((search.next_u32() & 0x3ffd7ff7) | (q16 & 0xc0008008)) ^ 0x40000000;

            let q18 = gg(q17, q16, q[15]).wrapping_add(tt18).rotate_left(9).wrapping_add(q17);
            if (q18 ^ q17) & 0xa0020000 != 0x00020000 {
                search.checkpoint(REJECT_Q18);
                continue;
            }

            let q19 = gg(q18, q17, q16).wrapping_add(tt19).rotate_left(14).wrapping_add(q18);
            if q19 & 0x80020000 != 0x80000000 {
                search.checkpoint(REJECT_Q19);
                continue;
            }

            let q20 = gg(q19, q18, q17).wrapping_add(tt20).rotate_left(20).wrapping_add(q19);
            if (q20 ^ q19) & 0x80040000 != 0x00040000 {
                search.checkpoint(REJECT_Q20);
                continue;
            }

            block[1] = q17.wrapping_sub(q16).rotate_right(5).wrapping_sub(tt17);
            let q2 = block[1].wrapping_add(tt1).rotate_left(12).wrapping_add(q[1]);
            block[5] = tt5.wrapping_sub(q2);

            q[2] = q2;
            q[17] = q17;
            q[18] = q18;
            q[19] = q19;
            q[20] = q20;
            q.solve_word(2, &mut block);
            found = true;
            break;
        }
        if !found {
            search.checkpoint(LEVEL1_EXHAUSTED);
            continue;
        }

        let q4_base = q[4];
        let q9_base = q[9];
        let tt21 = gg(q[20], q[19], q[18]).wrapping_add(q[17]).wrapping_add(AC[20]);

        // Level 2: free bits of Q[4], keeping Q[1..=20] intact.
        for q4_flip in q4_flips.iter() {
            if search.cancelled() {
                return None;
            }

            q[4] = q4_base ^ q4_flip;
            q.solve_word(5, &mut block);
            let q21 = tt21.wrapping_add(block[5]).rotate_left(5).wrapping_add(q[20]);
            if (q21 ^ q[20]) & 0x80020000 != 0 {
                search.checkpoint(REJECT_Q21);
                continue;
            }

            q[21] = q21;
            for t in [3, 4, 7] {
                q.solve_word(t, &mut block);
            }

            let tt22 = gg(q[21], q[20], q[19]).wrapping_add(q[18]).wrapping_add(AC[21]);
            let tt23 = q[19].wrapping_add(AC[22]).wrapping_add(block[15]);
            let tt24 = q[20].wrapping_add(AC[23]).wrapping_add(block[4]);

            let tt9 = q[6].wrapping_add(AC[9]);
            let tt10 = q[7].wrapping_add(AC[10]);
            let tt8 = ff(q[8], q[7], q[6]).wrapping_add(q[5]).wrapping_add(AC[8]);
            let tt12 = q[13].wrapping_sub(q[12]).rotate_right(7).wrapping_sub(AC[12]);
            let tt13 = q[14]
                .wrapping_sub(q[13])
                .rotate_right(12)
                .wrapping_sub(ff(q[13], q[12], q[11]))
                .wrapping_sub(AC[13]);

            // Level 3: Q[9] and Q[10] jointly, testing Q[22..=24].
            for q9q10_flip in q9q10_flips.iter() {
                if search.cancelled() {
                    return None;
                }

                let q10 = q[10] ^ (q9q10_flip & 0x60);
                q[9] = q9_base ^ (q9q10_flip & 0x2000);
                let m10 = q[11]
                    .wrapping_sub(q10)
                    .rotate_right(17)
                    .wrapping_sub(ff(q10, q[9], q[8]).wrapping_add(tt10));

                let aa = q[21];
                let dd = tt22.wrapping_add(m10).rotate_left(9).wrapping_add(aa);
                if dd & HIGH == 0 {
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
                block[13] = tt13.wrapping_sub(q10);
                q[22] = dd;
                q[23] = cc;
                q[24] = bb;

                // Level 4: free bits of Q[9], then the remaining 40 steps.
                let q9 = q[9];
                for q9_flip in q9_flips.iter() {
                    if search.cancelled() {
                        return None;
                    }

                    let q9 = q9 ^ q9_flip;
                    block[12] = tt12.wrapping_sub(ff(q[12], q[11], q10)).wrapping_sub(q9);
                    block[8] = q9.wrapping_sub(q[8]).rotate_right(7).wrapping_sub(tt8);
                    block[9] = q10
                        .wrapping_sub(q9)
                        .rotate_right(12)
                        .wrapping_sub(ff(q9, q[8], q[7]))
                        .wrapping_sub(tt9);

                    if let Err(check) = run_tail(&mut q, &block, false) {
                        search.checkpoint(TAIL + check);
                        continue;
                    }

                    if !output_accepted(cv, &q) {
                        search.checkpoint(REJECT_OUTPUT);
                        continue;
                    }
                    if !verify_block0(cv, &block) {
                        debug!("block 0: output conditions held but the difference check failed");
                        search.checkpoint(REJECT_OUTPUT);
                        continue;
                    }

                    search.checkpoint(FOUND);
                    info!("block 0: found after {} restarts", restarts);
                    return Some(block);
                }
            }
        }
    }
}
