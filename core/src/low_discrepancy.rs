//! Low Discrepancy Sequences

use crate::pbrt::*;
use crate::rng::ONE_MINUS_EPSILON;

/// Number of dimensions with a dedicated prime base.
pub const PRIME_TABLE_SIZE: usize = 64;

/// The first `PRIME_TABLE_SIZE` prime numbers, used as Halton bases.
pub const PRIMES: [u64; PRIME_TABLE_SIZE] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311,
];

/// Returns the radical inverse of `a` in the prime base selected by
/// `base_index`; i.e. the `a`-th value of the `base_index`-th Halton
/// dimension.
///
/// * `base_index` - Index into `PRIMES`; must be less than `PRIME_TABLE_SIZE`.
/// * `a`          - The sample index.
pub fn radical_inverse(base_index: usize, a: u64) -> Float {
    assert!(
        base_index < PRIME_TABLE_SIZE,
        "radical_inverse(): base index {base_index} out of range"
    );

    let base = PRIMES[base_index];
    let inv_base = 1.0 / base as f64;
    let mut reversed_digits: u64 = 0;
    let mut inv_base_n = 1.0_f64;
    let mut a = a;
    while a > 0 {
        let next = a / base;
        let digit = a - next * base;
        reversed_digits = reversed_digits * base + digit;
        inv_base_n *= inv_base;
        a = next;
    }
    min((reversed_digits as f64 * inv_base_n) as Float, ONE_MINUS_EPSILON)
}

/// Apply a Cranley-Patterson rotation: shift `u` by `offset` and wrap the
/// result back into [0, 1).
///
/// * `u`      - Sample value in [0, 1).
/// * `offset` - Rotation in [0, 1).
#[inline]
pub fn cranley_patterson(u: Float, offset: Float) -> Float {
    let v = u + offset;
    let v = if v >= 1.0 { v - 1.0 } else { v };
    min(v, ONE_MINUS_EPSILON)
}
