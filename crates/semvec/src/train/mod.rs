//! Training engines and the reflective training loop.
//!
//! - [`DocumentTrainer`] - term vectors from document co-occurrence
//! - [`TermTermTrainer`] - term vectors from a sliding window, with optional
//!   positional encoding
//! - [`doc_vectors`] / [`incremental`] - document vectors from term vectors,
//!   held in memory or streamed to disk
//! - [`seed`] - starting term vectors for term-based reflective training
//! - [`IndexBuilder`] - runs the cycles and writes the artifacts

mod builder;
pub mod doc_vectors;
mod document;
pub mod incremental;
pub mod seed;
mod term_term;

pub use builder::{CycleSnapshot, IndexBuilder, TrainingRun};
pub use document::DocumentTrainer;
pub use term_term::TermTermTrainer;

use std::collections::HashMap;

use semvec_vector::{StoreHeader, Vector, VectorStore};
use tracing::debug;

use crate::corpus::{CorpusIndex, Term, TermFilter};
use crate::error::{BuildError, BuildResult};

/// Fail unless every filter field stores term positions.
pub(crate) fn require_positions<C: CorpusIndex + ?Sized>(
    corpus: &C,
    filter: &TermFilter,
) -> BuildResult<()> {
    match filter.fields.iter().find(|field| !corpus.has_positions(field)) {
        Some(field) => Err(BuildError::UnsupportedIndex { field: field.clone() }),
        None => Ok(()),
    }
}

/// Terms of every filter field that pass the filter, in field then index
/// order.
pub(crate) fn filtered_terms<C: CorpusIndex + ?Sized>(
    corpus: &C,
    filter: &TermFilter,
) -> BuildResult<Vec<Term>> {
    let mut accepted = Vec::new();
    for field in &filter.fields {
        let terms = corpus.terms(field)?;
        let before = accepted.len();
        let total = terms.len();
        for term in terms {
            if filter.accepts(corpus, &term)? {
                accepted.push(term);
            }
        }
        debug!(field = %field, total, accepted = accepted.len() - before, "filtered terms");
    }
    Ok(accepted)
}

/// Vectors under construction, one slot per identifier.
///
/// A term occurring in several fields shares one slot.
pub(crate) struct Accumulators {
    header: StoreHeader,
    ids: Vec<String>,
    index: HashMap<String, usize>,
    vectors: Vec<Vector>,
}

impl Accumulators {
    pub(crate) fn new(header: StoreHeader) -> Self {
        Self { header, ids: Vec::new(), index: HashMap::new(), vectors: Vec::new() }
    }

    /// The slot for `id`, created as a zero vector on first use.
    pub(crate) fn slot(&mut self, id: &str) -> BuildResult<usize> {
        if let Some(&slot) = self.index.get(id) {
            return Ok(slot);
        }
        let slot = self.vectors.len();
        self.vectors.push(Vector::zero(self.header.vector_type, self.header.dimension)?);
        self.ids.push(id.to_string());
        self.index.insert(id.to_string(), slot);
        Ok(slot)
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn vector_mut(&mut self, slot: usize) -> &mut Vector {
        &mut self.vectors[slot]
    }

    /// Normalize every vector and move them into a store, in slot order.
    pub(crate) fn into_store(self) -> BuildResult<VectorStore> {
        let mut store = VectorStore::with_header(self.header);
        for (id, mut vector) in self.ids.into_iter().zip(self.vectors) {
            vector.normalize();
            store.put(id, vector)?;
        }
        Ok(store)
    }
}
