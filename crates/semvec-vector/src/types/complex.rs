//! Dense complex-valued vectors.

use num_complex::Complex32;

use super::UNIT_TOLERANCE;
use crate::error::VectorError;
use crate::permutation::Permutation;

/// A dense vector of complex components.
///
/// Normalization maps every non-zero component onto the unit circle,
/// keeping its phase.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexVector {
    data: Vec<Complex32>,
}

impl ComplexVector {
    /// Create a new vector from complex components.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector is empty or any part is not finite.
    pub fn new(data: Vec<Complex32>) -> Result<Self, VectorError> {
        if data.is_empty() {
            return Err(VectorError::InvalidDimension { expected: 1, actual: 0 });
        }

        for (i, c) in data.iter().enumerate() {
            if !c.re.is_finite() || !c.im.is_finite() {
                let value = if c.re.is_finite() { c.im } else { c.re };
                return Err(VectorError::InvalidValue {
                    index: i,
                    value,
                    reason: "complex components must be finite",
                });
            }
        }

        Ok(Self { data })
    }

    /// Create a zero-filled vector of the given dimension.
    ///
    /// # Errors
    ///
    /// Returns an error if dimension is 0.
    pub fn zeros(dimension: usize) -> Result<Self, VectorError> {
        if dimension == 0 {
            return Err(VectorError::InvalidDimension { expected: 1, actual: 0 });
        }
        Ok(Self { data: vec![Complex32::new(0.0, 0.0); dimension] })
    }

    /// Get the dimension of the vector.
    #[inline]
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Get the components as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Complex32] {
        &self.data
    }

    pub(crate) fn set(&mut self, index: usize, value: Complex32) {
        self.data[index] = value;
    }

    /// Add `weight * permuted(other)` to this vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions or the permutation length differ.
    pub fn superpose(
        &mut self,
        other: &Self,
        weight: f32,
        permutation: Option<&Permutation>,
    ) -> Result<(), VectorError> {
        if self.dimension() != other.dimension() {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }
        if let Some(p) = permutation {
            if p.len() != self.dimension() {
                return Err(VectorError::DimensionMismatch {
                    expected: self.dimension(),
                    actual: p.len(),
                });
            }
        }

        for (i, &x) in other.data.iter().enumerate() {
            let target = permutation.map_or(i, |p| p.target(i));
            self.data[target] += x * weight;
        }
        Ok(())
    }

    /// Scale every non-zero component to modulus 1.
    ///
    /// Components already on the unit circle within tolerance are left
    /// untouched, so normalizing twice equals normalizing once.
    pub fn normalize(&mut self) {
        for c in &mut self.data {
            let modulus = f64::from(c.re).hypot(f64::from(c.im));
            if modulus == 0.0 || (modulus - 1.0).abs() <= UNIT_TOLERANCE {
                continue;
            }
            c.re = (f64::from(c.re) / modulus) as f32;
            c.im = (f64::from(c.im) / modulus) as f32;
        }
    }

    /// Euclidean norm over all real and imaginary parts.
    #[must_use]
    pub fn l2_norm(&self) -> f32 {
        self.data.iter().map(Complex32::norm_sqr).sum::<f32>().sqrt()
    }

    /// Cosine similarity: `Re(sum(a * conj(b))) / (|a| * |b|)`.
    ///
    /// Returns 0.0 if either vector is zero.
    #[must_use]
    pub fn similarity(&self, other: &Self) -> f32 {
        debug_assert_eq!(self.data.len(), other.data.len(), "vectors must have same dimension");

        let mut dot = 0.0f64;
        let mut norm_a = 0.0f64;
        let mut norm_b = 0.0f64;
        for (a, b) in self.data.iter().zip(other.data.iter()) {
            dot += f64::from((a * b.conj()).re);
            norm_a += f64::from(a.norm_sqr());
            norm_b += f64::from(b.norm_sqr());
        }

        let denominator = (norm_a * norm_b).sqrt();
        if denominator == 0.0 {
            0.0
        } else {
            (dot / denominator) as f32
        }
    }

    /// Whether every component is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|c| c.re == 0.0 && c.im == 0.0)
    }
}

impl AsRef<[Complex32]> for ComplexVector {
    #[inline]
    fn as_ref(&self) -> &[Complex32] {
        &self.data
    }
}
