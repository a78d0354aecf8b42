//! Corpus access.
//!
//! Training never reads text directly. It consumes an inverted index through
//! the [`CorpusIndex`] trait: the terms of each field, the postings of each
//! term, and, for windowed training, the ordered term positions of each
//! document. [`MemoryCorpus`] is an in-memory implementation for embedding
//! and tests.

mod filter;
mod memory;

pub use filter::TermFilter;
pub use memory::{MemoryCorpus, MemoryCorpusBuilder};

use thiserror::Error;

/// Document number: dense, `0..document_count()`.
pub type DocId = usize;

/// A term of one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Term {
    /// The field the term was indexed in.
    pub field: String,
    /// The term text.
    pub text: String,
}

impl Term {
    /// Create a term.
    #[must_use]
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self { field: field.into(), text: text.into() }
    }
}

/// One document containing a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    /// The document.
    pub doc: DocId,
    /// Occurrences of the term in the document.
    pub frequency: u32,
}

/// The terms of one field of one document, with their positions.
///
/// The three vectors are parallel: `terms[i]` occurs `frequencies[i]` times,
/// at `positions[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermPositionVector {
    /// Distinct terms in the field.
    pub terms: Vec<String>,
    /// Occurrence count of each term.
    pub frequencies: Vec<u32>,
    /// Token positions of each term.
    pub positions: Vec<Vec<usize>>,
}

impl TermPositionVector {
    /// Largest position of any term, if any term occurs.
    #[must_use]
    pub fn max_position(&self) -> Option<usize> {
        self.positions.iter().flatten().copied().max()
    }

    /// Iterate over `(term, frequency)` pairs.
    pub fn term_frequencies(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.terms.iter().map(String::as_str).zip(self.frequencies.iter().copied())
    }
}

/// Errors raised by a corpus implementation.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The field is not indexed.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The document number is out of range.
    #[error("unknown document: {0}")]
    UnknownDocument(DocId),

    /// The index could not be read.
    #[error("index read failed: {0}")]
    Read(String),
}

/// Read access to an inverted index over a document collection.
pub trait CorpusIndex {
    /// Number of documents.
    fn document_count(&self) -> usize;

    /// External name of a document, used to key written document vectors.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not exist.
    fn document_path(&self, doc: DocId) -> Result<String, CorpusError> {
        if doc < self.document_count() {
            Ok(doc.to_string())
        } else {
            Err(CorpusError::UnknownDocument(doc))
        }
    }

    /// Terms of a field, in the index's stable order.
    ///
    /// # Errors
    ///
    /// Returns an error if the field cannot be read.
    fn terms(&self, field: &str) -> Result<Vec<Term>, CorpusError>;

    /// Documents containing a term, with in-document frequencies.
    ///
    /// # Errors
    ///
    /// Returns an error if the postings cannot be read.
    fn postings(&self, term: &Term) -> Result<Vec<Posting>, CorpusError>;

    /// Total occurrences of a term across the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the postings cannot be read.
    fn term_frequency(&self, term: &Term) -> Result<u64, CorpusError>;

    /// Whether term positions are stored for a field.
    fn has_positions(&self, field: &str) -> bool;

    /// Positional term data of one field of one document.
    ///
    /// Returns `None` when the document has nothing indexed in the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not exist or cannot be read.
    fn term_positions(
        &self,
        doc: DocId,
        field: &str,
    ) -> Result<Option<TermPositionVector>, CorpusError>;
}
