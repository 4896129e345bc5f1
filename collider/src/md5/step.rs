//! Single MD5 steps.
//!
//! MD5 is usually written as four registers rotating through 64 operations.
//! Collision search prefers the equivalent "round value" view, where step `t`
//! produces one new 32-bit value from the four before it:
//!
//! ```text
//! Q[t+1] = Q[t] + ((Q[t-3] + f_t(Q[t], Q[t-1], Q[t-2]) + W[t] + AC[t]) <<< RC[t])
//! ```
//!
//! with `W[t] = X[MESSAGE_INDEX[t]]`. Because the step is a bijection in `W[t]`
//! once the other round values are fixed, the search can choose round values
//! first and solve for the message word afterwards ([`reverse`]).

/// Additive constants, `floor(2^32 * |sin(t + 1)|)`.
pub const AC: [u32; 64] = [
    0xd76aa478, 0xe8c7b756, 0x242070db, 0xc1bdceee, 0xf57c0faf, 0x4787c62a, 0xa8304613, 0xfd469501,
    0x698098d8, 0x8b44f7af, 0xffff5bb1, 0x895cd7be, 0x6b901122, 0xfd987193, 0xa679438e, 0x49b40821,
    0xf61e2562, 0xc040b340, 0x265e5a51, 0xe9b6c7aa, 0xd62f105d, 0x02441453, 0xd8a1e681, 0xe7d3fbc8,
    0x21e1cde6, 0xc33707d6, 0xf4d50d87, 0x455a14ed, 0xa9e3e905, 0xfcefa3f8, 0x676f02d9, 0x8d2a4c8a,
    0xfffa3942, 0x8771f681, 0x6d9d6122, 0xfde5380c, 0xa4beea44, 0x4bdecfa9, 0xf6bb4b60, 0xbebfbc70,
    0x289b7ec6, 0xeaa127fa, 0xd4ef3085, 0x04881d05, 0xd9d4d039, 0xe6db99e5, 0x1fa27cf8, 0xc4ac5665,
    0xf4292244, 0x432aff97, 0xab9423a7, 0xfc93a039, 0x655b59c3, 0x8f0ccc92, 0xffeff47d, 0x85845dd1,
    0x6fa87e4f, 0xfe2ce6e0, 0xa3014314, 0x4e0811a1, 0xf7537e82, 0xbd3af235, 0x2ad7d2bb, 0xeb86d391,
];

/// Rotation amounts.
pub const RC: [u32; 64] = [
    7, 12, 17, 22, 7, 12, 17, 22, 7, 12, 17, 22, 7, 12, 17, 22,
    5, 9, 14, 20, 5, 9, 14, 20, 5, 9, 14, 20, 5, 9, 14, 20,
    4, 11, 16, 23, 4, 11, 16, 23, 4, 11, 16, 23, 4, 11, 16, 23,
    6, 10, 15, 21, 6, 10, 15, 21, 6, 10, 15, 21, 6, 10, 15, 21,
];

/// Message word consumed by each step.
pub const MESSAGE_INDEX: [usize; 64] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
    1, 6, 11, 0, 5, 10, 15, 4, 9, 14, 3, 8, 13, 2, 7, 12,
    5, 8, 11, 14, 1, 4, 7, 10, 13, 0, 3, 6, 9, 12, 15, 2,
    0, 7, 14, 5, 12, 3, 10, 1, 8, 15, 6, 13, 4, 11, 2, 9,
];

/// F: bitwise "if b then c else d" (steps 0-15).
#[inline(always)]
pub fn ff(b: u32, c: u32, d: u32) -> u32 {
    d ^ (b & (c ^ d))
}

/// G: bitwise "if d then b else c" (steps 16-31).
#[inline(always)]
pub fn gg(b: u32, c: u32, d: u32) -> u32 {
    c ^ (d & (b ^ c))
}

/// H: parity (steps 32-47).
#[inline(always)]
pub fn hh(b: u32, c: u32, d: u32) -> u32 {
    b ^ c ^ d
}

/// I (steps 48-63).
#[inline(always)]
pub fn ii(b: u32, c: u32, d: u32) -> u32 {
    c ^ (b | !d)
}

/// Boolean function of step `t`.
#[inline(always)]
pub fn round_function(t: usize, b: u32, c: u32, d: u32) -> u32 {
    match t >> 4 {
        0 => ff(b, c, d),
        1 => gg(b, c, d),
        2 => hh(b, c, d),
        _ => ii(b, c, d),
    }
}

/// Sum fed into the rotation of step `t`, before rotating.
///
/// `q` holds `[Q[t], Q[t-1], Q[t-2], Q[t-3]]`. Some sufficient conditions
/// constrain this intermediate value rather than the step output.
#[inline(always)]
pub fn pre_rotation(t: usize, q: [u32; 4], w: u32) -> u32 {
    q[3].wrapping_add(round_function(t, q[0], q[1], q[2]))
        .wrapping_add(w)
        .wrapping_add(AC[t])
}

/// Computes `Q[t+1]` from `q = [Q[t], Q[t-1], Q[t-2], Q[t-3]]` and the
/// message word `w` of step `t`.
#[inline(always)]
pub fn forward(t: usize, q: [u32; 4], w: u32) -> u32 {
    q[0].wrapping_add(pre_rotation(t, q, w).rotate_left(RC[t]))
}

/// Solves step `t` for its message word.
///
/// Given `next = Q[t+1]` and `q = [Q[t], Q[t-1], Q[t-2], Q[t-3]]`, returns
/// the unique `w` with `forward(t, q, w) == next`.
#[inline(always)]
pub fn reverse(t: usize, next: u32, q: [u32; 4]) -> u32 {
    next.wrapping_sub(q[0])
        .rotate_right(RC[t])
        .wrapping_sub(round_function(t, q[0], q[1], q[2]))
        .wrapping_sub(q[3])
        .wrapping_sub(AC[t])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_match_sine_table() {
        for (t, &ac) in AC.iter().enumerate() {
            let expected = (4294967296.0 * ((t + 1) as f64).sin().abs()) as u32;
            assert_eq!(ac, expected, "AC[{}]", t);
        }
    }

    #[test]
    fn test_message_schedule_is_permutation_per_round() {
        for round in MESSAGE_INDEX.chunks(16) {
            let mut seen = [false; 16];
            for &k in round {
                assert!(!seen[k], "word {} used twice in one round", k);
                seen[k] = true;
            }
        }
    }

    #[test]
    fn test_reverse_undoes_forward() {
        let q = [0x01234567, 0x89abcdef, 0xfedcba98, 0x76543210];
        for t in 0..64 {
            let w = 0x9e3779b9u32.wrapping_mul(t as u32 + 1);
            let next = forward(t, q, w);
            assert_eq!(reverse(t, next, q), w, "step {}", t);
        }
    }

    #[test]
    fn test_boolean_functions() {
        assert_eq!(ff(0xffffffff, 0x12345678, 0x9abcdef0), 0x12345678);
        assert_eq!(ff(0, 0x12345678, 0x9abcdef0), 0x9abcdef0);
        assert_eq!(gg(0x12345678, 0x9abcdef0, 0xffffffff), 0x12345678);
        assert_eq!(gg(0x12345678, 0x9abcdef0, 0), 0x9abcdef0);
        assert_eq!(hh(0xf0f0f0f0, 0x0f0f0f0f, 0xffffffff), 0);
        assert_eq!(ii(0, 0, 0xffffffff), 0xffffffff);
    }
}
