//! Near-collision block search.
//!
//! Both blocks are found the same way: choose round values `Q[1..=16]` that
//! satisfy the path's sufficient conditions, solve the message words they
//! imply, then spend the remaining freedom on `Q[17..=24]` and a few free bits
//! of early round values. Every candidate is pushed through steps 24..64
//! with a bit test after each step, and the few survivors are verified by
//! full compression.
//!
//! [`find_block0`] and [`find_block1`] are the two phases. They share the
//! step 24..64 tail in this module.

mod block0;
mod block1;
mod variant;

pub use block0::{find_block0, BLOCK0_CHECKPOINTS};
pub use block1::{find_block1, BLOCK1_CHECKPOINTS};
pub use variant::{PathVariant, VariantTable};

use crate::control::{CancellationToken, Progress};
use crate::md5::step::{self, MESSAGE_INDEX, RC};
use crate::md5::MessageBlock;
use crate::rng::Xrng64;
use crate::state::WorkingState;

const HIGH: u32 = 1 << 31;

/// Everything one search phase borrows from its caller.
pub struct Search<'a, C: CancellationToken + ?Sized> {
    rng: &'a mut Xrng64,
    cancel: &'a C,
    progress: &'a Progress,
}

impl<'a, C: CancellationToken + ?Sized> Search<'a, C> {
    pub fn new(rng: &'a mut Xrng64, cancel: &'a C, progress: &'a Progress) -> Self {
        Self { rng, cancel, progress }
    }

    #[inline(always)]
    fn cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    #[inline(always)]
    fn checkpoint(&self, ordinal: u32) {
        self.progress.checkpoint(ordinal);
    }
}

/// Number of bit tests in [`run_tail`].
pub(crate) const TAIL_CHECKS: u32 = 17;

/// Runs steps 24..64 on a state whose `Q[21..=24]` are set.
///
/// Returns the index of the first failed test: 0 for bit 15 of the step-34
/// sum (which must equal `step34_bit15`), 1 for the MSB of `Q[48]` against
/// `Q[46]`, and `2 + i` for the MSB of `Q[49 + i]` against `Q[47 + i]`.
/// Those must agree except for `Q[50]` and `Q[60]`, which must differ.
#[inline(always)]
pub(crate) fn run_tail(
    q: &mut WorkingState,
    block: &MessageBlock,
    step34_bit15: bool,
) -> Result<(), u32> {
    for t in 24..34 {
        q.forward_step(t, block);
    }

    let window = q.window(34);
    let sum = step::pre_rotation(34, window, block[MESSAGE_INDEX[34]]);
    if (sum & (1 << 15) != 0) != step34_bit15 {
        return Err(0);
    }
    q[35] = window[0].wrapping_add(sum.rotate_left(RC[34]));

    for t in 35..48 {
        q.forward_step(t, block);
    }
    if (q[48] ^ q[46]) & HIGH != 0 {
        return Err(1);
    }

    for t in 48..63 {
        let next = q.forward_step(t, block);
        let differ = (next ^ q[t as i32 - 1]) & HIGH != 0;
        if differ != (t == 49 || t == 59) {
            return Err(2 + (t - 48) as u32);
        }
    }
    q.forward_step(63, block);
    Ok(())
}
