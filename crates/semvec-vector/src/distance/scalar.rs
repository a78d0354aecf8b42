//! Plain-loop kernels, selected when SIMD is off.

/// Dot product of two equal-length slices.
#[inline]
#[must_use]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same dimension");
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Squared Euclidean norm.
#[inline]
#[must_use]
pub fn sum_of_squares(v: &[f32]) -> f32 {
    dot_product(v, v)
}

/// Euclidean norm.
#[inline]
#[must_use]
pub fn l2_norm(v: &[f32]) -> f32 {
    sum_of_squares(v).sqrt()
}

/// Cosine of the angle between two slices, 0.0 if either is zero.
#[inline]
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let denominator = (sum_of_squares(a) * sum_of_squares(b)).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        dot_product(a, b) / denominator
    }
}

/// `acc += weight * x`, component-wise.
#[inline]
pub fn add_scaled(acc: &mut [f32], x: &[f32], weight: f32) {
    debug_assert_eq!(acc.len(), x.len(), "vectors must have same dimension");
    acc.iter_mut().zip(x).for_each(|(a, v)| *a += weight * v);
}
