//! Bit-packed binary vectors with majority-vote superposition.
//!
//! Bits are stored in `u64` words, lowest bit index in the least significant
//! position. Superposition does not touch the bits directly: every voting bit
//! of the superposed vector adds `+weight` (bit set) or `-weight` (bit clear)
//! to a per-bit counter, and [`BinaryVector::normalize`] collapses the
//! counters back into bits.
//!
//! Elemental vectors are sparse: they carry a support mask, and only bits
//! inside the support vote.
//!
//! # Example
//!
//! ```
//! use semvec_vector::types::BinaryVector;
//!
//! let a = BinaryVector::new(vec![0b1111_0000u64], 8).unwrap();
//! let b = BinaryVector::new(vec![0b1010_1010u64], 8).unwrap();
//!
//! let mut acc = BinaryVector::accumulator(8).unwrap();
//! acc.superpose(&a, 2.0, None).unwrap();
//! acc.superpose(&b, 1.0, None).unwrap();
//! acc.normalize();
//!
//! // `a` carries twice the weight, so its bits win every disagreement.
//! assert_eq!(acc.data()[0], 0b1111_0000u64);
//! ```

use super::UNIT_TOLERANCE;
use crate::distance::binary::hamming_distance;
use crate::error::VectorError;
use crate::permutation::Permutation;

/// A binary vector represented as bit-packed `u64` values.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryVector {
    /// Bit-packed data. Each u64 stores 64 bits.
    data: Vec<u64>,
    /// The actual number of bits in this vector.
    dimension: usize,
    /// Positions that vote when this vector is superposed. `None` means all.
    support: Option<Vec<u64>>,
    /// Per-bit vote counters while the vector is accumulating.
    votes: Option<Vec<f32>>,
}

impl BinaryVector {
    /// Create a new binary vector from bit-packed data.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `dimension` is zero
    /// - `data.len()` does not match the number of words the dimension needs
    /// - unused bits in the last word are set
    pub fn new(data: Vec<u64>, dimension: usize) -> Result<Self, VectorError> {
        if dimension == 0 {
            return Err(VectorError::InvalidDimension { expected: 1, actual: 0 });
        }

        let required_u64s = dimension.div_ceil(64);
        if data.len() != required_u64s {
            return Err(VectorError::DimensionMismatch {
                expected: required_u64s,
                actual: data.len(),
            });
        }

        // Verify unused bits in the last u64 are zero
        let unused_bits = data.len() * 64 - dimension;
        if unused_bits > 0 {
            let mask = !0u64 << (64 - unused_bits);
            if data[data.len() - 1] & mask != 0 {
                return Err(VectorError::InvalidParameter(
                    "unused bits in last u64 must be zero".to_string(),
                ));
            }
        }

        Ok(Self { data, dimension, support: None, votes: None })
    }

    /// Create a binary vector with all bits clear.
    ///
    /// # Errors
    ///
    /// Returns an error if `dimension` is zero.
    pub fn zeros(dimension: usize) -> Result<Self, VectorError> {
        if dimension == 0 {
            return Err(VectorError::InvalidDimension { expected: 1, actual: 0 });
        }

        let num_u64s = dimension.div_ceil(64);
        Ok(Self { data: vec![0u64; num_u64s], dimension, support: None, votes: None })
    }

    /// Create an empty accumulator: all vote counters start at zero.
    ///
    /// This is the starting point for a derived vector.
    ///
    /// # Errors
    ///
    /// Returns an error if `dimension` is zero.
    pub fn accumulator(dimension: usize) -> Result<Self, VectorError> {
        let mut vector = Self::zeros(dimension)?;
        vector.votes = Some(vec![0.0; dimension]);
        Ok(vector)
    }

    /// Create a sparse vector that votes only at `positive` (bit set) and
    /// `negative` (bit clear) positions.
    ///
    /// # Errors
    ///
    /// Returns an error if `dimension` is zero or a position is out of range.
    pub fn sparse(
        dimension: usize,
        positive: &[usize],
        negative: &[usize],
    ) -> Result<Self, VectorError> {
        let mut vector = Self::zeros(dimension)?;
        let mut support = vec![0u64; vector.data.len()];

        for (&index, bit) in
            positive.iter().map(|i| (i, true)).chain(negative.iter().map(|i| (i, false)))
        {
            if index >= dimension {
                return Err(VectorError::InvalidParameter(format!(
                    "bit index {index} out of range for dimension {dimension}"
                )));
            }
            support[index / 64] |= 1u64 << (index % 64);
            if bit {
                vector.data[index / 64] |= 1u64 << (index % 64);
            }
        }

        vector.support = Some(support);
        Ok(vector)
    }

    /// Rebuild a sparse vector from its bits and support mask, as written by
    /// a store.
    ///
    /// # Errors
    ///
    /// Returns an error if either word array does not fit `dimension`, or a
    /// bit is set outside the support.
    pub fn with_support(
        data: Vec<u64>,
        support: Vec<u64>,
        dimension: usize,
    ) -> Result<Self, VectorError> {
        let mask = Self::new(support, dimension)?;
        let mut vector = Self::new(data, dimension)?;
        if vector.data.iter().zip(&mask.data).any(|(bits, support)| bits & !support != 0) {
            return Err(VectorError::InvalidParameter(
                "set bits must lie inside the support mask".to_string(),
            ));
        }
        vector.support = Some(mask.data);
        Ok(vector)
    }

    /// Get the dimension (number of bits) of this vector.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get the raw bit-packed data.
    ///
    /// While the vector is accumulating these are the bits it started from;
    /// call [`normalize`](Self::normalize) to fold the votes in.
    #[must_use]
    pub fn data(&self) -> &[u64] {
        &self.data
    }

    /// The support mask of a sparse vector, if any.
    #[must_use]
    pub fn support(&self) -> Option<&[u64]> {
        self.support.as_deref()
    }

    /// Whether vote counters are pending normalization.
    #[must_use]
    pub fn is_accumulating(&self) -> bool {
        self.votes.is_some()
    }

    /// Get a specific bit by index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= dimension`.
    #[must_use]
    pub fn get_bit(&self, index: usize) -> bool {
        assert!(index < self.dimension, "bit index out of bounds");
        (self.data[index / 64] >> (index % 64)) & 1 == 1
    }

    /// Count the number of 1-bits in this vector.
    #[must_use]
    pub fn count_ones(&self) -> u32 {
        self.data.iter().map(|&w| w.count_ones()).sum()
    }

    /// Mask of the bits of word `word` that lie inside the dimension.
    fn word_mask(&self, word: usize) -> u64 {
        let used = self.dimension - word * 64;
        if used >= 64 {
            !0u64
        } else {
            (1u64 << used) - 1
        }
    }

    fn voting_mask(&self, word: usize) -> u64 {
        self.support.as_ref().map_or_else(|| self.word_mask(word), |s| s[word])
    }

    /// Counters seeded from the current bits, one vote per voting bit.
    fn seed_votes(&self) -> Vec<f32> {
        let mut votes = vec![0.0; self.dimension];
        for (index, vote) in votes.iter_mut().enumerate() {
            let (word, bit) = (index / 64, index % 64);
            if (self.voting_mask(word) >> bit) & 1 == 1 {
                *vote = if (self.data[word] >> bit) & 1 == 1 { 1.0 } else { -1.0 };
            }
        }
        votes
    }

    fn votes_mut(&mut self) -> &mut [f32] {
        if self.votes.is_none() {
            let seeded = self.seed_votes();
            self.support = None;
            self.votes = Some(seeded);
        }
        self.votes.as_deref_mut().unwrap_or_default()
    }

    /// Add the votes of `permuted(other)`, each scaled by `weight`.
    ///
    /// Permutations act on whole words, so a permutation must have one entry
    /// per `u64` word and the dimension must be a multiple of 64.
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
        if self.dimension != other.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: other.dimension,
            });
        }
        if let Some(p) = permutation {
            if p.len() != self.data.len() {
                return Err(VectorError::DimensionMismatch {
                    expected: self.data.len(),
                    actual: p.len(),
                });
            }
            if self.dimension % 64 != 0 {
                return Err(VectorError::InvalidParameter(format!(
                    "binary permutations need a dimension divisible by 64, got {}",
                    self.dimension
                )));
            }
        }

        let dimension = self.dimension;
        let votes = self.votes_mut();
        for (word, &bits) in other.data.iter().enumerate() {
            let mask = other.voting_mask(word);
            if mask == 0 {
                continue;
            }
            let base = permutation.map_or(word, |p| p.target(word)) * 64;
            for bit in 0..64 {
                if (mask >> bit) & 1 == 0 || base + bit >= dimension {
                    continue;
                }
                votes[base + bit] += if (bits >> bit) & 1 == 1 { weight } else { -weight };
            }
        }
        Ok(())
    }

    /// Collapse the vote counters into bits.
    ///
    /// Positive counts set the bit, negative counts clear it and an exact tie
    /// clears it as well. A vector that is not accumulating is left unchanged.
    pub fn normalize(&mut self) {
        let Some(votes) = self.votes.take() else {
            return;
        };

        self.data.iter_mut().for_each(|w| *w = 0);
        for (index, &vote) in votes.iter().enumerate() {
            if vote > 0.0 {
                self.data[index / 64] |= 1u64 << (index % 64);
            }
        }
        self.support = None;
    }

    /// Hamming-derived similarity in `[-1, 1]`: `1 - 2 * hamming / dimension`.
    ///
    /// Pending votes are tallied on a copy first.
    #[must_use]
    pub fn similarity(&self, other: &Self) -> f32 {
        debug_assert_eq!(self.dimension, other.dimension, "binary vectors must have same dimension");

        let distance = match (self.is_accumulating(), other.is_accumulating()) {
            (false, false) => hamming_distance(&self.data, &other.data),
            _ => {
                let (mut a, mut b) = (self.clone(), other.clone());
                a.normalize();
                b.normalize();
                hamming_distance(&a.data, &b.data)
            }
        };

        let similarity = 1.0 - 2.0 * f64::from(distance) / self.dimension as f64;
        if (similarity - 1.0).abs() <= UNIT_TOLERANCE {
            1.0
        } else {
            similarity as f32
        }
    }

    /// Number of positive and negative voting positions.
    ///
    /// For an accumulating vector these are the positive and negative
    /// counters; otherwise the set and clear bits inside the voting mask.
    #[must_use]
    pub fn polarity_counts(&self) -> (usize, usize) {
        if let Some(votes) = &self.votes {
            let positive = votes.iter().filter(|&&v| v > 0.0).count();
            let negative = votes.iter().filter(|&&v| v < 0.0).count();
            return (positive, negative);
        }

        let mut positive = 0;
        let mut negative = 0;
        for (word, &bits) in self.data.iter().enumerate() {
            let mask = self.voting_mask(word);
            positive += (bits & mask).count_ones() as usize;
            negative += (!bits & mask).count_ones() as usize;
        }
        (positive, negative)
    }

    /// Whether no bit is set and no vote is pending.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match &self.votes {
            Some(votes) => votes.iter().all(|&v| v == 0.0),
            None => self.count_ones() == 0,
        }
    }
}
