//! In-memory vector storage.
//!
//! A [`VectorStore`] maps identifiers to vectors of one type and dimension.
//! Elemental stores are populated once, by random generation or by loading a
//! serialized store, and are read-only afterwards. Derived stores start empty
//! and receive one `put` per completed vector.
//!
//! # Example
//!
//! ```
//! use semvec_vector::generator::ElementalVectorGenerator;
//! use semvec_vector::store::VectorStore;
//! use semvec_vector::types::VectorType;
//!
//! let mut generator = ElementalVectorGenerator::new(VectorType::Real, 100, 4).unwrap();
//! let store = VectorStore::numbered_random(3, &mut generator).unwrap();
//!
//! assert_eq!(store.len(), 3);
//! assert!(store.contains("2"));
//! ```

mod vector_store;

pub use vector_store::VectorStore;
