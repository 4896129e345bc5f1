//! Round values of one compression, addressed the way sufficient conditions are written.

use std::ops::{Index, IndexMut};

use crate::md5::step::{self, MESSAGE_INDEX};
use crate::md5::{ChainingValue, MessageBlock};

const OFFSET: i32 = 3;

/// Round values `Q[-3..=64]` of one compression.
///
/// `Q[-3..=0]` hold the chaining value permuted to `(a, d, c, b)`, so that
/// step `t` always reads `Q[t-3..=t]` and writes `Q[t+1]`. After step 63 the
/// output registers are `(Q[61], Q[64], Q[63], Q[62])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingState {
    q: [u32; 68],
}

impl WorkingState {
    pub fn new(cv: ChainingValue) -> Self {
        let mut state = Self { q: [0; 68] };
        state[-3] = cv.a;
        state[-2] = cv.d;
        state[-1] = cv.c;
        state[0] = cv.b;
        state
    }

    /// Runs a full compression and records every round value.
    pub fn trace(cv: ChainingValue, block: &MessageBlock) -> Self {
        let mut state = Self::new(cv);
        for t in 0..64 {
            state.forward_step(t, block);
        }
        state
    }

    /// `[Q[t], Q[t-1], Q[t-2], Q[t-3]]`, the inputs of step `t`.
    #[inline(always)]
    pub fn window(&self, t: usize) -> [u32; 4] {
        let i = t + OFFSET as usize;
        [self.q[i], self.q[i - 1], self.q[i - 2], self.q[i - 3]]
    }

    /// Computes and stores `Q[t+1]`.
    #[inline(always)]
    pub fn forward_step(&mut self, t: usize, block: &MessageBlock) -> u32 {
        let next = step::forward(t, self.window(t), block[MESSAGE_INDEX[t]]);
        self.q[t + 1 + OFFSET as usize] = next;
        next
    }

    /// Solves step `t` for the message word that links `Q[t-3..=t]` to `Q[t+1]`.
    #[inline(always)]
    pub fn reverse_step(&self, t: usize) -> u32 {
        step::reverse(t, self.q[t + 1 + OFFSET as usize], self.window(t))
    }

    /// Stores the word solved by [`reverse_step`](Self::reverse_step) into `block`.
    ///
    /// Only meaningful for `t < 16`, where step `t` consumes word `t`.
    #[inline(always)]
    pub fn solve_word(&self, t: usize, block: &mut MessageBlock) {
        block[MESSAGE_INDEX[t]] = self.reverse_step(t);
    }

    /// Chaining value after step 63, with feed-forward from `Q[-3..=0]`.
    pub fn output(&self) -> ChainingValue {
        ChainingValue::new(
            self[-3].wrapping_add(self[61]),
            self[0].wrapping_add(self[64]),
            self[-1].wrapping_add(self[63]),
            self[-2].wrapping_add(self[62]),
        )
    }
}

impl Index<i32> for WorkingState {
    type Output = u32;

    #[inline(always)]
    fn index(&self, t: i32) -> &u32 {
        &self.q[(t + OFFSET) as usize]
    }
}

impl IndexMut<i32> for WorkingState {
    #[inline(always)]
    fn index_mut(&mut self, t: i32) -> &mut u32 {
        &mut self.q[(t + OFFSET) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::md5::compress;

    fn sample_block() -> MessageBlock {
        let mut block = [0u32; 16];
        for (i, w) in block.iter_mut().enumerate() {
            *w = 0x9e3779b9u32.wrapping_mul(i as u32 + 7);
        }
        block
    }

    #[test]
    fn test_initial_permutation() {
        let state = WorkingState::new(ChainingValue::STANDARD);
        assert_eq!(state[-3], 0x67452301);
        assert_eq!(state[-2], 0x10325476);
        assert_eq!(state[-1], 0x98badcfe);
        assert_eq!(state[0], 0xefcdab89);
    }

    #[test]
    fn test_trace_matches_compress() {
        let block = sample_block();
        let cv = ChainingValue::new(1, 2, 3, 4);
        assert_eq!(WorkingState::trace(cv, &block).output(), compress(cv, &block));
    }

    #[test]
    fn test_reverse_recovers_every_word() {
        let block = sample_block();
        let state = WorkingState::trace(ChainingValue::STANDARD, &block);
        for t in 0..64 {
            assert_eq!(state.reverse_step(t), block[MESSAGE_INDEX[t]], "step {}", t);
        }

        let mut solved = [0u32; 16];
        for t in 0..16 {
            state.solve_word(t, &mut solved);
        }
        assert_eq!(solved, block);
    }
}
