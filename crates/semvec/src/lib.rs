//! `semvec`
//!
//! Random Indexing and Reflective Random Indexing over an inverted index.
//!
//! # Overview
//!
//! `semvec` turns a document collection into term and document vectors
//! whose similarity reflects how terms are used:
//!
//! - **Document training**: A term is the sum of the random elemental vectors
//!   of the documents it occurs in
//! - **Term-term training**: A term is the sum of the elemental vectors of the
//!   terms around it, optionally permuted to encode word order
//! - **Reflective training**: Each cycle's output becomes the next cycle's
//!   elemental input
//! - **Artifacts**: Term and document vector stores in binary or text form
//!
//! # Example
//!
//! ```
//! use semvec::{IndexBuilder, MemoryCorpus, TrainingConfig, TrainingMode};
//! use semvec_vector::PositionalMethod;
//!
//! let corpus = MemoryCorpus::builder()
//!     .text("a.txt", "contents", "the quick brown fox jumps over the lazy dog")
//!     .text("b.txt", "contents", "the lazy dog sleeps")
//!     .build();
//!
//! let config = TrainingConfig::default()
//!     .with_dimension(128)
//!     .with_mode(TrainingMode::TermTerm)
//!     .with_positional_method(PositionalMethod::Permutation)
//!     .with_training_cycles(2)
//!     .with_seed(Some(1));
//!
//! let run = IndexBuilder::new(&corpus, config).unwrap().train().unwrap();
//! assert_eq!(run.snapshots().len(), 2);
//! assert!(run.term_vectors().contains("fox"));
//! ```
//!
//! # Modules
//!
//! - [`corpus`] - The [`CorpusIndex`] trait, term filtering and [`MemoryCorpus`]
//! - [`config`] - [`TrainingConfig`]
//! - [`train`] - Training engines and [`IndexBuilder`]
//! - [`output`] - Artifact naming
//! - [`progress`] - Progress reporting
//! - [`error`] - Error types

#![deny(clippy::unwrap_used)]

pub mod config;
pub mod corpus;
pub mod error;
pub mod output;
pub mod progress;
pub mod train;

// Re-export commonly used types
pub use config::{DocIndexing, InitialTermVectors, TrainingConfig, TrainingMode};
pub use corpus::{CorpusIndex, MemoryCorpus, TermFilter};
pub use error::{BuildError, BuildResult};
pub use progress::{ProgressEvent, ProgressReporter, SilentProgress, TracingProgress};
pub use train::{CycleSnapshot, DocumentTrainer, IndexBuilder, TermTermTrainer, TrainingRun};
