//! Free-bit mask tables.
//!
//! At each level the search walks every assignment of a small set of "free"
//! bits in some round value. A table lists those assignments: entry `k`
//! spreads the bits of `k` over the free positions by shifting copies of `k`
//! and masking with the span of the free positions.

/// All `2^bits` flip patterns of one free-bit set.
#[derive(Debug, Clone)]
pub struct MaskTable {
    masks: Vec<u32>,
}

impl MaskTable {
    /// Builds `(k << s0 ^ k << s1 ^ ...) & span` for `k` in `0..2^bits`.
    pub fn new(bits: u32, shifts: &[u32], span: u32) -> Self {
        let masks = (0..1u32 << bits)
            .map(|k| shifts.iter().fold(0, |acc, &s| acc ^ (k << s)) & span)
            .collect();
        Self { masks }
    }

    /// A table with only the empty pattern, for levels without free bits.
    pub fn single() -> Self {
        Self { masks: vec![0] }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.masks.iter().copied()
    }
}
