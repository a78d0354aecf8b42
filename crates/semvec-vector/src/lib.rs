//! `semvec` Vector
//!
//! This crate provides the vector algebra and vector storage underneath
//! Random Indexing and Reflective Random Indexing.
//!
//! # Overview
//!
//! The vector crate provides:
//!
//! - **Vector algebra**: Real, binary and complex vectors sharing one
//!   superpose / normalize / similarity contract
//! - **Elemental vectors**: Sparse ternary random vectors, optionally derived
//!   deterministically from their identifier
//! - **Positional encoding**: Permutations and the per-run permutation cache
//! - **Vector stores**: Identifier to vector maps with binary and text
//!   serialization
//!
//! # Example
//!
//! ```
//! use semvec_vector::generator::ElementalVectorGenerator;
//! use semvec_vector::types::{Vector, VectorType};
//!
//! let mut generator = ElementalVectorGenerator::new(VectorType::Real, 200, 10).unwrap();
//! let doc1 = generator.generate("0").unwrap();
//! let doc2 = generator.generate("1").unwrap();
//!
//! // A term seen twice in doc1 and once in doc2
//! let mut term = Vector::zero(VectorType::Real, 200).unwrap();
//! term.superpose(&doc1, 2.0, None).unwrap();
//! term.superpose(&doc2, 1.0, None).unwrap();
//! term.normalize();
//!
//! assert!(term.similarity(&doc1).unwrap() > term.similarity(&doc2).unwrap());
//! ```
//!
//! # Modules
//!
//! - [`types`] - Core types ([`Vector`], [`RealVector`], [`BinaryVector`], [`ComplexVector`])
//! - [`generator`] - Elemental vector generation
//! - [`permutation`] - Permutations and [`PermutationCache`]
//! - [`store`] - In-memory [`VectorStore`]
//! - [`encoding`] - Binary and text store formats
//! - [`distance`] - Dense kernels and Hamming distance
//! - [`error`] - Error types

#![deny(clippy::unwrap_used)]

pub mod distance;
pub mod encoding;
pub mod error;
pub mod generator;
pub mod permutation;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use encoding::{RecordLayout, StoreFormat, StoreHeader};
pub use error::VectorError;
pub use generator::ElementalVectorGenerator;
pub use permutation::{Permutation, PermutationCache, PositionalMethod};
pub use store::VectorStore;
pub use types::{BinaryVector, ComplexVector, RealVector, Vector, VectorType};
