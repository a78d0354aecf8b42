//! Permutations and positional encoding.
//!
//! A [`Permutation`] is a bijection on component indices; superposing a
//! vector under a permutation moves component `i` to `target(i)`. Cyclic
//! shifts are the only permutations training needs, one per relative offset
//! inside the context window. [`PermutationCache`] builds them once per run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VectorError;
use crate::types::VectorType;

/// A bijection on `0..len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    targets: Vec<usize>,
}

impl Permutation {
    /// Cyclic shift by `offset`: component `i` moves to `(i + offset) mod len`.
    ///
    /// Negative offsets shift left.
    ///
    /// ```
    /// use semvec_vector::permutation::Permutation;
    ///
    /// let right = Permutation::shift(4, 1);
    /// assert_eq!(right.target(3), 0);
    ///
    /// let left = Permutation::shift(4, -1);
    /// assert_eq!(left.target(0), 3);
    /// ```
    #[must_use]
    pub fn shift(len: usize, offset: isize) -> Self {
        if len == 0 {
            return Self { targets: Vec::new() };
        }
        let n = len as isize;
        Self { targets: (0..n).map(|i| (i + offset).rem_euclid(n) as usize).collect() }
    }

    /// Number of positions permuted.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether this permutation is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Where position `index` moves to.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    #[must_use]
    pub fn target(&self, index: usize) -> usize {
        self.targets[index]
    }
}

/// How word order is encoded in term-term training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionalMethod {
    /// No positional encoding.
    #[default]
    #[serde(rename = "none", alias = "basic")]
    Basic,
    /// One permutation for "before the focus" and one for "after".
    Directional,
    /// One cyclic shift per relative offset.
    Permutation,
    /// Like [`Permutation`](Self::Permutation), with an unpermuted
    /// superposition added for every co-occurrence.
    PermutationPlusBasic,
}

impl PositionalMethod {
    /// Whether the method applies any permutation.
    #[must_use]
    pub const fn uses_permutation(self) -> bool {
        !matches!(self, Self::Basic)
    }

    /// Whether the unpermuted elemental vector is superposed as well.
    #[must_use]
    pub const fn includes_basic(self) -> bool {
        matches!(self, Self::PermutationPlusBasic)
    }

    /// Configuration name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "none",
            Self::Directional => "directional",
            Self::Permutation => "permutation",
            Self::PermutationPlusBasic => "permutation_plus_basic",
        }
    }
}

impl fmt::Display for PositionalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionalMethod {
    type Err = VectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "basic" => Ok(Self::Basic),
            "directional" => Ok(Self::Directional),
            "permutation" => Ok(Self::Permutation),
            "permutation_plus_basic" => Ok(Self::PermutationPlusBasic),
            other => Err(VectorError::InvalidParameter(format!(
                "unknown positional method: {other}. Valid methods: none, basic, directional, \
                 permutation, permutation_plus_basic"
            ))),
        }
    }
}

/// Permutations for every relative offset a training run can see.
#[derive(Debug, Clone)]
pub struct PermutationCache {
    method: PositionalMethod,
    radius: usize,
    entries: Vec<Permutation>,
}

impl PermutationCache {
    /// Build the cache for a window and vector space.
    ///
    /// Binary vectors are permuted word by word, so their permutations have
    /// `dimension / 64` positions.
    ///
    /// # Errors
    ///
    /// Returns an error if a binary dimension is not a multiple of 64 while
    /// the method needs permutations.
    pub fn new(
        method: PositionalMethod,
        window_size: usize,
        vector_type: VectorType,
        dimension: usize,
    ) -> Result<Self, VectorError> {
        let radius = window_size / 2;
        if !method.uses_permutation() {
            return Ok(Self { method, radius, entries: Vec::new() });
        }

        let len = Self::permutation_length(vector_type, dimension)?;
        let entries = match method {
            PositionalMethod::Basic => Vec::new(),
            PositionalMethod::Directional => {
                vec![Permutation::shift(len, -1), Permutation::shift(len, 1)]
            }
            PositionalMethod::Permutation | PositionalMethod::PermutationPlusBasic => {
                let r = radius as isize;
                (-r..=r).map(|offset| Permutation::shift(len, offset)).collect()
            }
        };

        tracing::debug!(%method, window_size, entries = entries.len(), "built permutation cache");
        Ok(Self { method, radius, entries })
    }

    /// Number of positions a permutation of this space acts on.
    ///
    /// # Errors
    ///
    /// Returns an error for a binary dimension that is not a multiple of 64.
    pub fn permutation_length(
        vector_type: VectorType,
        dimension: usize,
    ) -> Result<usize, VectorError> {
        match vector_type {
            VectorType::Binary if dimension % 64 != 0 => Err(VectorError::InvalidParameter(
                format!("binary permutations need a dimension divisible by 64, got {dimension}"),
            )),
            VectorType::Binary => Ok(dimension / 64),
            VectorType::Real | VectorType::Complex => Ok(dimension),
        }
    }

    /// The permutation for `offset = cursor - focus`.
    ///
    /// Directional encoding depends only on the sign of the offset; offset 0
    /// and the basic method have no permutation.
    #[must_use]
    pub fn for_offset(&self, offset: isize) -> Option<&Permutation> {
        match self.method {
            PositionalMethod::Basic => None,
            PositionalMethod::Directional => match offset.signum() {
                -1 => self.entries.first(),
                1 => self.entries.get(1),
                _ => None,
            },
            PositionalMethod::Permutation | PositionalMethod::PermutationPlusBasic => {
                let index = offset.checked_add(self.radius as isize)?;
                usize::try_from(index).ok().and_then(|i| self.entries.get(i))
            }
        }
    }

    /// Offsets covered by the cache, in ascending order.
    #[must_use]
    pub fn offsets(&self) -> Vec<isize> {
        match self.method {
            PositionalMethod::Basic => Vec::new(),
            PositionalMethod::Directional => vec![-1, 1],
            PositionalMethod::Permutation | PositionalMethod::PermutationPlusBasic => {
                let r = self.radius as isize;
                (-r..=r).collect()
            }
        }
    }

    /// The positional method the cache was built for.
    #[must_use]
    pub fn method(&self) -> PositionalMethod {
        self.method
    }

    /// Half the window size: the furthest offset scanned from the focus.
    #[must_use]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Number of cached permutations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no permutation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
