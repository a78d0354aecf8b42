//! Sparse ternary elemental vectors.
//!
//! An elemental vector has exactly `seed_length` non-zero analogues at
//! distinct positions drawn uniformly from `[0, dimension)`. Samples alternate
//! between `+1` and `-1`, so the two polarities differ in count by at most one.
//!
//! # Example
//!
//! ```
//! use semvec_vector::generator::ElementalVectorGenerator;
//! use semvec_vector::types::VectorType;
//!
//! let mut generator = ElementalVectorGenerator::new(VectorType::Real, 512, 10)
//!     .unwrap()
//!     .deterministic(true);
//!
//! let a = generator.generate("apple").unwrap();
//! let b = generator.generate("apple").unwrap();
//! assert_eq!(a, b);
//! assert_eq!(a.polarity_counts(), (5, 5));
//! ```

use num_complex::Complex32;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::VectorError;
use crate::types::{BinaryVector, ComplexVector, RealVector, Vector, VectorType};

/// Stable 64-bit seed for an identifier (FNV-1a over its UTF-8 bytes).
///
/// The same identifier yields the same seed on every platform and run.
#[must_use]
pub fn identifier_seed(id: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in id.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn check_shape(dimension: usize, seed_length: usize) -> Result<(), VectorError> {
    if dimension == 0 {
        return Err(VectorError::InvalidDimension { expected: 1, actual: 0 });
    }
    if seed_length == 0 || seed_length > dimension {
        return Err(VectorError::InvalidParameter(format!(
            "seed length must be in 1..={dimension}, got {seed_length}"
        )));
    }
    Ok(())
}

/// Draw one sparse elemental vector from `rng`.
///
/// # Errors
///
/// Returns an error if `dimension` is zero or `seed_length` is zero or larger
/// than `dimension`.
pub fn random_vector<R: Rng + ?Sized>(
    vector_type: VectorType,
    dimension: usize,
    seed_length: usize,
    rng: &mut R,
) -> Result<Vector, VectorError> {
    check_shape(dimension, seed_length)?;

    let positions = sample(rng, dimension, seed_length);
    let (positive, negative): (Vec<_>, Vec<_>) =
        positions.iter().enumerate().partition(|(n, _)| n % 2 == 0);
    let positive: Vec<usize> = positive.into_iter().map(|(_, p)| p).collect();
    let negative: Vec<usize> = negative.into_iter().map(|(_, p)| p).collect();

    Ok(match vector_type {
        VectorType::Real => {
            let mut v = RealVector::zeros(dimension)?;
            positive.iter().for_each(|&p| v.set(p, 1.0));
            negative.iter().for_each(|&p| v.set(p, -1.0));
            Vector::Real(v)
        }
        VectorType::Complex => {
            let mut v = ComplexVector::zeros(dimension)?;
            positive.iter().for_each(|&p| v.set(p, Complex32::new(1.0, 0.0)));
            negative.iter().for_each(|&p| v.set(p, Complex32::new(-1.0, 0.0)));
            Vector::Complex(v)
        }
        VectorType::Binary => Vector::Binary(BinaryVector::sparse(dimension, &positive, &negative)?),
    })
}

/// Produces elemental vectors for one vector space.
///
/// By default vectors come from a single RNG stream (seeded from entropy, or
/// from [`with_seed`](Self::with_seed)). In deterministic mode the RNG is
/// re-seeded per identifier, so a vector depends only on its identifier, the
/// base seed and the shape.
#[derive(Debug, Clone)]
pub struct ElementalVectorGenerator {
    vector_type: VectorType,
    dimension: usize,
    seed_length: usize,
    seed: Option<u64>,
    deterministic: bool,
    rng: ChaCha8Rng,
}

impl ElementalVectorGenerator {
    /// Create a generator for the given vector space.
    ///
    /// # Errors
    ///
    /// Returns an error if `dimension` is zero or `seed_length` is zero or larger
    /// than `dimension`.
    pub fn new(
        vector_type: VectorType,
        dimension: usize,
        seed_length: usize,
    ) -> Result<Self, VectorError> {
        check_shape(dimension, seed_length)?;
        Ok(Self {
            vector_type,
            dimension,
            seed_length,
            seed: None,
            deterministic: false,
            rng: ChaCha8Rng::from_entropy(),
        })
    }

    /// Seed the RNG stream. `None` keeps entropy seeding.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self.rng = seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        self
    }

    /// Derive each vector from a hash of its identifier.
    #[must_use]
    pub const fn deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }

    /// Generate the elemental vector for `id`.
    ///
    /// # Errors
    ///
    /// Propagates shape errors from [`random_vector`]; none occur for a
    /// generator built through [`new`](Self::new).
    pub fn generate(&mut self, id: &str) -> Result<Vector, VectorError> {
        if self.deterministic {
            let seed = identifier_seed(id) ^ self.seed.unwrap_or(0);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            random_vector(self.vector_type, self.dimension, self.seed_length, &mut rng)
        } else {
            random_vector(self.vector_type, self.dimension, self.seed_length, &mut self.rng)
        }
    }

    /// The vector type produced.
    #[must_use]
    pub fn vector_type(&self) -> VectorType {
        self.vector_type
    }

    /// The dimension of produced vectors.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The number of non-zero analogues per vector.
    #[must_use]
    pub fn seed_length(&self) -> usize {
        self.seed_length
    }

    /// Whether vectors are derived from identifier hashes.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_seed_is_fnv1a() {
        // FNV-1a test vectors
        assert_eq!(identifier_seed(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(identifier_seed("a"), 0xaf63_dc4c_8601_ec8c);
        assert_ne!(identifier_seed("cat"), identifier_seed("act"));
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(matches!(
            ElementalVectorGenerator::new(VectorType::Real, 0, 1),
            Err(VectorError::InvalidDimension { .. })
        ));
        assert!(matches!(
            ElementalVectorGenerator::new(VectorType::Real, 10, 0),
            Err(VectorError::InvalidParameter(_))
        ));
        assert!(matches!(
            ElementalVectorGenerator::new(VectorType::Real, 10, 11),
            Err(VectorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn balanced_for_every_type() {
        for ty in [VectorType::Real, VectorType::Binary, VectorType::Complex] {
            let mut generator =
                ElementalVectorGenerator::new(ty, 128, 8).unwrap().with_seed(Some(7));
            for id in ["a", "b", "c"] {
                let v = generator.generate(id).unwrap();
                assert_eq!(v.vector_type(), ty);
                assert_eq!(v.polarity_counts(), (4, 4));
            }
        }
    }

    #[test]
    fn odd_seed_length_differs_by_one() {
        let mut generator =
            ElementalVectorGenerator::new(VectorType::Real, 50, 7).unwrap().with_seed(Some(1));
        assert_eq!(generator.generate("x").unwrap().polarity_counts(), (4, 3));
    }

    #[test]
    fn full_seed_length_fills_every_position() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let v = random_vector(VectorType::Real, 6, 6, &mut rng).unwrap();
        assert_eq!(v.polarity_counts(), (3, 3));
    }

    #[test]
    fn deterministic_ignores_generation_order() {
        let mut first = ElementalVectorGenerator::new(VectorType::Binary, 256, 20)
            .unwrap()
            .deterministic(true);
        let mut second = first.clone();

        let a = first.generate("alpha").unwrap();
        let _ = second.generate("beta").unwrap();
        let b = second.generate("alpha").unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn seeded_stream_is_reproducible() {
        let make = || {
            ElementalVectorGenerator::new(VectorType::Complex, 64, 6).unwrap().with_seed(Some(42))
        };
        let (mut g1, mut g2) = (make(), make());
        for id in ["x", "y", "z"] {
            assert_eq!(g1.generate(id).unwrap(), g2.generate(id).unwrap());
        }
    }
}
