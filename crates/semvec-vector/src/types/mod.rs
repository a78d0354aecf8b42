//! Core vector types.
//!
//! Three algebraic vector spaces share one contract (`superpose`,
//! `normalize`, `similarity`):
//!
//! - [`RealVector`] - dense `f32` components
//! - [`BinaryVector`] - bit-packed `u64` words with majority-vote superposition
//! - [`ComplexVector`] - dense complex components normalized to unit phase
//!
//! [`Vector`] is the tagged union used by stores and training engines, and
//! [`VectorType`] names the variant a run is configured for.

mod binary;
mod complex;
mod real;
mod vector;


pub use binary::BinaryVector;
pub use complex::ComplexVector;
pub use real::RealVector;
pub use vector::{Vector, VectorType};

/// Norms within this distance of 1.0 are treated as already normalized.
pub(crate) const UNIT_TOLERANCE: f64 = 1e-6;
