//! Dense kernels on `wide::f32x8` lanes.
//!
//! Slices are walked in exact chunks of eight; the remainder is finished in
//! scalar code.

use wide::f32x8;

const LANES: usize = 8;

#[inline]
fn load(chunk: &[f32]) -> f32x8 {
    let mut lane = [0.0; LANES];
    lane.copy_from_slice(chunk);
    f32x8::from(lane)
}

#[inline]
fn total(v: f32x8) -> f32 {
    v.to_array().iter().sum()
}

/// Dot product of two equal-length slices.
#[inline]
#[must_use]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same dimension");

    let (a, b) = (a.chunks_exact(LANES), b.chunks_exact(LANES));
    let tail: f32 = a.remainder().iter().zip(b.remainder()).map(|(x, y)| x * y).sum();
    total(a.zip(b).fold(f32x8::ZERO, |acc, (x, y)| acc + load(x) * load(y))) + tail
}

/// Squared Euclidean norm.
#[inline]
#[must_use]
pub fn sum_of_squares(v: &[f32]) -> f32 {
    let chunks = v.chunks_exact(LANES);
    let tail: f32 = chunks.remainder().iter().map(|x| x * x).sum();
    total(chunks.fold(f32x8::ZERO, |acc, x| {
        let x = load(x);
        acc + x * x
    })) + tail
}

/// Euclidean norm.
#[inline]
#[must_use]
pub fn l2_norm(v: &[f32]) -> f32 {
    sum_of_squares(v).sqrt()
}

/// Cosine of the angle between two slices, 0.0 if either is zero.
///
/// The dot product and both norms come from one pass.
#[inline]
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same dimension");

    let (ca, cb) = (a.chunks_exact(LANES), b.chunks_exact(LANES));
    let (mut dot, mut aa, mut bb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in ca.remainder().iter().zip(cb.remainder()) {
        dot += x * y;
        aa += x * x;
        bb += y * y;
    }

    let zero = (f32x8::ZERO, f32x8::ZERO, f32x8::ZERO);
    let (vd, va, vb) = ca.zip(cb).fold(zero, |(d, na, nb), (x, y)| {
        let (x, y) = (load(x), load(y));
        (d + x * y, na + x * x, nb + y * y)
    });
    dot += total(vd);
    aa += total(va);
    bb += total(vb);

    let denominator = (aa * bb).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        dot / denominator
    }
}

/// `acc += weight * x`, component-wise.
#[inline]
pub fn add_scaled(acc: &mut [f32], x: &[f32], weight: f32) {
    debug_assert_eq!(acc.len(), x.len(), "vectors must have same dimension");

    let w = f32x8::splat(weight);
    let mut out = acc.chunks_exact_mut(LANES);
    let mut input = x.chunks_exact(LANES);
    for (o, i) in (&mut out).zip(&mut input) {
        let sum = load(o) + w * load(i);
        o.copy_from_slice(&sum.to_array());
    }
    for (o, i) in out.into_remainder().iter_mut().zip(input.remainder()) {
        *o += weight * i;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    fn ramp(len: usize, offset: f32) -> Vec<f32> {
        (0..len).map(|i| (i as f32 + offset).sin()).collect()
    }

    #[test]
    fn kernels_match_naive_loops_across_tails() {
        for len in 0..27 {
            let a = ramp(len, 0.0);
            let b = ramp(len, 1.5);
            assert!((dot_product(&a, &b) - naive_dot(&a, &b)).abs() < 1e-4, "len {len}");
            assert!((sum_of_squares(&a) - naive_dot(&a, &a)).abs() < 1e-4, "len {len}");

            let mut acc = b.clone();
            add_scaled(&mut acc, &a, -2.0);
            for i in 0..len {
                assert!((acc[i] - (b[i] - 2.0 * a[i])).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn cosine_bounds() {
        let a = ramp(200, 0.0);
        let negated: Vec<f32> = a.iter().map(|x| -x).collect();
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-5);
        assert!((cosine_similarity(&a, &negated) + 1.0).abs() < 1e-5);
        assert_eq!(cosine_similarity(&[0.0; 9], &[1.0; 9]), 0.0);
    }

    #[test]
    fn norm_of_pythagorean_triple() {
        let mut v = [0.0f32; 9];
        v[0] = 3.0;
        v[1] = 4.0;
        v[8] = 12.0;
        assert!((l2_norm(&v) - 13.0).abs() < 1e-6);
    }
}
