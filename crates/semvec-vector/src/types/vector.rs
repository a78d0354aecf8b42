//! The tagged vector union and its type tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{BinaryVector, ComplexVector, RealVector};
use crate::error::VectorError;
use crate::permutation::Permutation;

/// The algebraic space a vector lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorType {
    /// Dense `f32` components.
    #[default]
    Real,
    /// Bit-packed binary components.
    Binary,
    /// Dense complex components.
    Complex,
}

impl VectorType {
    /// Lowercase name, as used in configuration and store headers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Binary => "binary",
            Self::Complex => "complex",
        }
    }
}

impl fmt::Display for VectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VectorType {
    type Err = VectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "real" => Ok(Self::Real),
            "binary" => Ok(Self::Binary),
            "complex" => Ok(Self::Complex),
            other => Err(VectorError::InvalidParameter(format!("unknown vector type: {other}"))),
        }
    }
}

/// A vector of any supported type.
#[derive(Debug, Clone, PartialEq)]
pub enum Vector {
    /// A dense real vector.
    Real(RealVector),
    /// A bit-packed binary vector.
    Binary(BinaryVector),
    /// A dense complex vector.
    Complex(ComplexVector),
}

impl Vector {
    /// The zero vector of a type: the starting point of every derived vector.
    ///
    /// Binary zero vectors are empty vote accumulators.
    ///
    /// # Errors
    ///
    /// Returns an error if `dimension` is zero.
    pub fn zero(vector_type: VectorType, dimension: usize) -> Result<Self, VectorError> {
        Ok(match vector_type {
            VectorType::Real => Self::Real(RealVector::zeros(dimension)?),
            VectorType::Binary => Self::Binary(BinaryVector::accumulator(dimension)?),
            VectorType::Complex => Self::Complex(ComplexVector::zeros(dimension)?),
        })
    }

    /// The type tag of this vector.
    #[must_use]
    pub fn vector_type(&self) -> VectorType {
        match self {
            Self::Real(_) => VectorType::Real,
            Self::Binary(_) => VectorType::Binary,
            Self::Complex(_) => VectorType::Complex,
        }
    }

    /// The dimension of this vector.
    #[must_use]
    pub fn dimension(&self) -> usize {
        match self {
            Self::Real(v) => v.dimension(),
            Self::Binary(v) => v.dimension(),
            Self::Complex(v) => v.dimension(),
        }
    }

    /// Add `weight * permuted(other)` to this vector.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::TypeMismatch`] if the types differ, and a
    /// dimension error if the dimensions or permutation length differ.
    pub fn superpose(
        &mut self,
        other: &Self,
        weight: f32,
        permutation: Option<&Permutation>,
    ) -> Result<(), VectorError> {
        match (self, other) {
            (Self::Real(a), Self::Real(b)) => a.superpose(b, weight, permutation),
            (Self::Binary(a), Self::Binary(b)) => a.superpose(b, weight, permutation),
            (Self::Complex(a), Self::Complex(b)) => a.superpose(b, weight, permutation),
            (a, b) => Err(VectorError::TypeMismatch {
                expected: a.vector_type(),
                actual: b.vector_type(),
            }),
        }
    }

    /// Normalize in the type's own sense. Idempotent.
    pub fn normalize(&mut self) {
        match self {
            Self::Real(v) => v.normalize(),
            Self::Binary(v) => v.normalize(),
            Self::Complex(v) => v.normalize(),
        }
    }

    /// Type-appropriate similarity, in `[-1, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the types or dimensions differ.
    pub fn similarity(&self, other: &Self) -> Result<f32, VectorError> {
        if self.dimension() != other.dimension() {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }
        match (self, other) {
            (Self::Real(a), Self::Real(b)) => Ok(a.similarity(b)),
            (Self::Binary(a), Self::Binary(b)) => Ok(a.similarity(b)),
            (Self::Complex(a), Self::Complex(b)) => Ok(a.similarity(b)),
            (a, b) => Err(VectorError::TypeMismatch {
                expected: a.vector_type(),
                actual: b.vector_type(),
            }),
        }
    }

    /// Whether the vector carries no information yet.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Real(v) => v.is_zero(),
            Self::Binary(v) => v.is_zero(),
            Self::Complex(v) => v.is_zero(),
        }
    }

    /// Number of positive and negative non-zero analogues.
    ///
    /// Complex components are classified by the sign of their real part.
    #[must_use]
    pub fn polarity_counts(&self) -> (usize, usize) {
        fn count(values: impl Iterator<Item = f32> + Clone) -> (usize, usize) {
            (values.clone().filter(|&x| x > 0.0).count(), values.filter(|&x| x < 0.0).count())
        }

        match self {
            Self::Real(v) => count(v.iter().copied()),
            Self::Binary(v) => v.polarity_counts(),
            Self::Complex(v) => count(v.as_slice().iter().map(|c| c.re)),
        }
    }

    /// Borrow as a real vector, if it is one.
    #[must_use]
    pub fn as_real(&self) -> Option<&RealVector> {
        match self {
            Self::Real(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as a binary vector, if it is one.
    #[must_use]
    pub fn as_binary(&self) -> Option<&BinaryVector> {
        match self {
            Self::Binary(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as a complex vector, if it is one.
    #[must_use]
    pub fn as_complex(&self) -> Option<&ComplexVector> {
        match self {
            Self::Complex(v) => Some(v),
            _ => None,
        }
    }
}

impl From<RealVector> for Vector {
    fn from(v: RealVector) -> Self {
        Self::Real(v)
    }
}

impl From<BinaryVector> for Vector {
    fn from(v: BinaryVector) -> Self {
        Self::Binary(v)
    }
}

impl From<ComplexVector> for Vector {
    fn from(v: ComplexVector) -> Self {
        Self::Complex(v)
    }
}
