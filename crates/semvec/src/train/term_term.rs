//! Sliding-window term-term training.

use std::collections::HashSet;

use semvec_vector::{PermutationCache, Vector, VectorStore};
use tracing::{debug, info, warn};

use super::{filtered_terms, require_positions, Accumulators};
use crate::corpus::{CorpusIndex, TermFilter};
use crate::error::{BuildError, BuildResult};
use crate::progress::{is_checkpoint, ProgressEvent, ProgressReporter, SilentProgress};

/// Trains term vectors from the terms around each occurrence.
///
/// For every occurrence of a vocabulary term (the focus), each vocabulary
/// term within `window_size / 2` positions contributes its elemental vector,
/// permuted according to its offset from the focus by the
/// [`PermutationCache`].
pub struct TermTermTrainer<'a, C: CorpusIndex + ?Sized> {
    corpus: &'a C,
    filter: &'a TermFilter,
    cache: &'a PermutationCache,
    progress: &'a dyn ProgressReporter,
}

impl<'a, C: CorpusIndex + ?Sized> TermTermTrainer<'a, C> {
    /// Create a trainer.
    #[must_use]
    pub fn new(corpus: &'a C, filter: &'a TermFilter, cache: &'a PermutationCache) -> Self {
        Self { corpus, filter, cache, progress: &SilentProgress }
    }

    /// Report progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Fail unless every trained field stores term positions.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnsupportedIndex`] naming the first field
    /// without positions.
    pub fn check_positions(&self) -> BuildResult<()> {
        require_positions(self.corpus, self.filter)
    }

    /// Distinct texts of the accepted terms across all fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the corpus cannot be read.
    pub fn vocabulary(&self) -> BuildResult<Vec<String>> {
        let mut seen = HashSet::new();
        Ok(filtered_terms(self.corpus, self.filter)?
            .into_iter()
            .map(|term| term.text)
            .filter(|text| seen.insert(text.clone()))
            .collect())
    }

    /// Whether the elemental vectors used must be kept to reproduce the
    /// positional encoding.
    #[must_use]
    pub fn persists_elemental(&self) -> bool {
        self.cache.method().uses_permutation()
    }

    /// Train one vector per vocabulary term against `elemental`.
    ///
    /// Context terms without an elemental vector are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnsupportedIndex`] before any work if a field
    /// has no positions, or a vector error if `elemental` has a different
    /// shape than the permutations.
    pub fn train(&self, elemental: &VectorStore) -> BuildResult<VectorStore> {
        self.check_positions()?;
        let vocabulary = self.vocabulary()?;

        let mut accumulators = Accumulators::new(elemental.header());
        for text in &vocabulary {
            accumulators.slot(text)?;
        }
        let elementals: Vec<Option<&Vector>> =
            vocabulary.iter().map(|text| elemental.get(text)).collect();
        let missing = elementals.iter().filter(|v| v.is_none()).count();
        if missing > 0 {
            warn!(missing, "vocabulary terms without elemental vectors are skipped as context");
        }

        let radius = self.cache.radius();
        let include_basic = self.cache.method().includes_basic();

        for doc in 0..self.corpus.document_count() {
            if is_checkpoint(doc) {
                self.progress.report(&ProgressEvent::DocumentsProcessed { count: doc });
            }
            for field in &self.filter.fields {
                let Some(tpv) = self.corpus.term_positions(doc, field)? else {
                    continue;
                };
                let Some(max_position) = tpv.max_position() else {
                    continue;
                };

                // Vocabulary slot at each position of this field, dropped with the field.
                let mut table: Vec<Option<usize>> = vec![None; max_position + 1];
                for (text, positions) in tpv.terms.iter().zip(&tpv.positions) {
                    let Some(slot) = accumulators.index_of(text) else {
                        continue;
                    };
                    for &position in positions {
                        table[position] = Some(slot);
                    }
                }

                for focus in 0..table.len() {
                    let Some(focus_slot) = table[focus] else {
                        continue;
                    };
                    let start = focus.saturating_sub(radius);
                    let end = (focus + radius).min(table.len() - 1);
                    for cursor in start..=end {
                        if cursor == focus {
                            continue;
                        }
                        let context = table[cursor].and_then(|slot| elementals[slot]);
                        let Some(context) = context else {
                            continue;
                        };
                        #[allow(clippy::cast_possible_wrap)]
                        let offset = cursor as isize - focus as isize;
                        let target = accumulators.vector_mut(focus_slot);
                        if include_basic {
                            target.superpose(context, 1.0, None)?;
                        }
                        target.superpose(context, 1.0, self.cache.for_offset(offset))?;
                    }
                }
            }
        }

        debug!(
            method = %self.cache.method(),
            radius,
            vocabulary = vocabulary.len(),
            "finished window scan"
        );
        let store = accumulators.into_store()?;
        info!(
            terms = store.len(),
            documents = self.corpus.document_count(),
            "trained term vectors from context windows"
        );
        Ok(store)
    }
}
