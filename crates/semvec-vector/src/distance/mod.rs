//! Dense kernels and similarity functions.
//!
//! The real-valued kernels come in two implementations with the same
//! signatures:
//!
//! - `simd` (default): portable SIMD through the `wide` crate, 8 floats at a
//!   time with a scalar tail
//! - `scalar`: plain loops, selected by the `scalar` feature or when `simd`
//!   is disabled
//!
//! Binary vectors compare by popcount of the XOR, see [`binary`].

pub mod binary;

#[cfg(all(feature = "simd", not(feature = "scalar")))]
mod simd;

#[cfg(any(not(feature = "simd"), feature = "scalar"))]
mod scalar;

#[cfg(all(feature = "simd", not(feature = "scalar")))]
pub use simd::{add_scaled, cosine_similarity, dot_product, l2_norm, sum_of_squares};

#[cfg(any(not(feature = "simd"), feature = "scalar"))]
pub use scalar::{add_scaled, cosine_similarity, dot_product, l2_norm, sum_of_squares};
