//! Document-level training.

use semvec_vector::VectorStore;
use tracing::{debug, info};

use super::Accumulators;
use crate::corpus::{CorpusIndex, TermFilter};
use crate::error::{BuildError, BuildResult};
use crate::progress::{is_checkpoint, ProgressEvent, ProgressReporter, SilentProgress};

/// Trains term vectors as frequency-weighted sums of the elemental vectors
/// of the documents each term occurs in.
///
/// Elemental document vectors are keyed by document number, `"0"` to
/// `"n - 1"`.
///
/// # Example
///
/// ```
/// use semvec::corpus::{MemoryCorpus, TermFilter};
/// use semvec::train::DocumentTrainer;
/// use semvec_vector::{ElementalVectorGenerator, VectorStore, VectorType};
///
/// let corpus = MemoryCorpus::builder()
///     .text("a.txt", "contents", "red apple")
///     .text("b.txt", "contents", "green apple")
///     .build();
/// let filter = TermFilter::default();
///
/// let mut generator = ElementalVectorGenerator::new(VectorType::Real, 64, 4)
///     .unwrap()
///     .with_seed(Some(7));
/// let elemental = VectorStore::numbered_random(2, &mut generator).unwrap();
///
/// let terms = DocumentTrainer::new(&corpus, &filter).train(&elemental).unwrap();
/// assert_eq!(terms.len(), 3);
/// ```
pub struct DocumentTrainer<'a, C: CorpusIndex + ?Sized> {
    corpus: &'a C,
    filter: &'a TermFilter,
    progress: &'a dyn ProgressReporter,
}

impl<'a, C: CorpusIndex + ?Sized> DocumentTrainer<'a, C> {
    /// Create a trainer over `corpus`, restricted to terms passing `filter`.
    #[must_use]
    pub fn new(corpus: &'a C, filter: &'a TermFilter) -> Self {
        Self { corpus, filter, progress: &SilentProgress }
    }

    /// Report progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Train one term vector per accepted term.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ConfigMismatch`] before any work if `elemental`
    /// does not hold exactly one vector per document, and
    /// [`BuildError::MissingVector`] if a document number has no vector.
    pub fn train(&self, elemental: &VectorStore) -> BuildResult<VectorStore> {
        let documents = self.corpus.document_count();
        if elemental.len() != documents {
            return Err(BuildError::ConfigMismatch {
                expected: documents,
                actual: elemental.len(),
            });
        }

        let mut accumulators = Accumulators::new(elemental.header());
        let mut processed = 0usize;
        for field in &self.filter.fields {
            let terms = self.corpus.terms(field)?;
            debug!(field = %field, terms = terms.len(), "training term vectors from documents");
            for term in terms {
                if !self.filter.accepts(self.corpus, &term)? {
                    continue;
                }
                if is_checkpoint(processed) {
                    self.progress.report(&ProgressEvent::TermsProcessed { count: processed });
                }
                processed += 1;

                let slot = accumulators.slot(&term.text)?;
                for posting in self.corpus.postings(&term)? {
                    let id = posting.doc.to_string();
                    let doc = elemental.get(&id).ok_or_else(|| {
                        BuildError::MissingVector(format!("elemental document vector '{id}'"))
                    })?;
                    #[allow(clippy::cast_precision_loss)]
                    let weight = posting.frequency as f32;
                    accumulators.vector_mut(slot).superpose(doc, weight, None)?;
                }
            }
        }

        let store = accumulators.into_store()?;
        info!(terms = store.len(), documents, "trained term vectors from documents");
        Ok(store)
    }
}
