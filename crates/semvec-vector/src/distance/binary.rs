//! Bit-level distances.

/// Number of differing bits between two equally long word slices.
///
/// ```
/// use semvec_vector::distance::binary::hamming_distance;
///
/// assert_eq!(hamming_distance(&[0b1111_0000], &[0b1010_1010]), 4);
/// ```
#[inline]
#[must_use]
pub fn hamming_distance(a: &[u64], b: &[u64]) -> u32 {
    debug_assert_eq!(a.len(), b.len(), "bit vectors must have same length");
    a.iter().zip(b).fold(0, |bits, (x, y)| bits + (x ^ y).count_ones())
}
