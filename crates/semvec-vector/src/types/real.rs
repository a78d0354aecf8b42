//! Dense real-valued vectors.

use std::ops::Deref;

use super::UNIT_TOLERANCE;
use crate::distance::{add_scaled, cosine_similarity, l2_norm};
use crate::error::VectorError;
use crate::permutation::Permutation;

/// A dense vector of `f32` components.
///
/// Superposition is elementwise scaled addition and normalization scales the
/// vector to unit Euclidean length.
///
/// # Example
///
/// ```
/// use semvec_vector::types::RealVector;
///
/// let mut v = RealVector::new(vec![3.0, 4.0]).unwrap();
/// v.normalize();
/// assert!((v.l2_norm() - 1.0).abs() < 1e-6);
/// assert!(v[0] < v[1]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RealVector {
    data: Vec<f32>,
}

impl RealVector {
    /// Create a new vector from a vector of f32 values.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector is empty or contains NaN/Infinite values.
    pub fn new(data: Vec<f32>) -> Result<Self, VectorError> {
        if data.is_empty() {
            return Err(VectorError::InvalidDimension { expected: 1, actual: 0 });
        }

        for (i, &value) in data.iter().enumerate() {
            if !value.is_finite() {
                return Err(VectorError::InvalidValue {
                    index: i,
                    value,
                    reason: if value.is_nan() {
                        "NaN values are not allowed"
                    } else {
                        "Infinite values are not allowed"
                    },
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
        Ok(Self { data: vec![0.0; dimension] })
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
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consume the vector and return the underlying components.
    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    pub(crate) fn set(&mut self, index: usize, value: f32) {
        self.data[index] = value;
    }

    /// Add `weight * permuted(other)` to this vector.
    ///
    /// Component `i` of `other` lands on component `permutation.target(i)`.
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

        match permutation {
            None => add_scaled(&mut self.data, &other.data, weight),
            Some(p) => {
                if p.len() != self.dimension() {
                    return Err(VectorError::DimensionMismatch {
                        expected: self.dimension(),
                        actual: p.len(),
                    });
                }
                for (i, &x) in other.data.iter().enumerate() {
                    if x != 0.0 {
                        self.data[p.target(i)] += weight * x;
                    }
                }
            }
        }
        Ok(())
    }

    /// Scale the vector to unit length (L2 norm = 1).
    ///
    /// The zero vector is left unchanged, as is a vector whose norm is
    /// already 1 within tolerance, so normalizing twice equals normalizing once.
    pub fn normalize(&mut self) {
        let norm = self.data.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt();

        if norm == 0.0 || (norm - 1.0).abs() <= UNIT_TOLERANCE {
            return;
        }

        for x in &mut self.data {
            *x = (f64::from(*x) / norm) as f32;
        }
    }

    /// Calculate the L2 (Euclidean) norm of the vector.
    #[inline]
    #[must_use]
    pub fn l2_norm(&self) -> f32 {
        l2_norm(&self.data)
    }

    /// Cosine similarity with another vector of the same dimension.
    #[inline]
    #[must_use]
    pub fn similarity(&self, other: &Self) -> f32 {
        cosine_similarity(&self.data, &other.data)
    }

    /// Whether every component is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&x| x == 0.0)
    }
}

impl Deref for RealVector {
    type Target = [f32];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl AsRef<[f32]> for RealVector {
    #[inline]
    fn as_ref(&self) -> &[f32] {
        &self.data
    }
}
