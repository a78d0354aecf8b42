//! In-memory document vectors.
//!
//! A document vector is the frequency-weighted sum of the vectors of the
//! accepted terms it contains. During training documents are keyed by
//! number; [`rekey_by_path`] produces the store that is written out.

use semvec_vector::{Vector, VectorStore};
use tracing::info;

use crate::corpus::{CorpusIndex, TermFilter};
use crate::error::BuildResult;
use crate::progress::{is_checkpoint, ProgressEvent, ProgressReporter};

/// Build one vector per document, keyed `"0"` to `"n - 1"`.
///
/// Terms without a term vector are skipped; a document with no such term
/// gets a zero vector.
///
/// # Errors
///
/// Returns an error if the corpus cannot be read.
pub fn build_document_vectors<C: CorpusIndex + ?Sized>(
    corpus: &C,
    filter: &TermFilter,
    term_vectors: &VectorStore,
    progress: &dyn ProgressReporter,
) -> BuildResult<VectorStore> {
    let header = term_vectors.header();
    let documents = corpus.document_count();
    let mut vectors = (0..documents)
        .map(|_| Vector::zero(header.vector_type, header.dimension))
        .collect::<Result<Vec<_>, _>>()?;

    let mut processed = 0usize;
    for field in &filter.fields {
        for term in corpus.terms(field)? {
            if !filter.accepts(corpus, &term)? {
                continue;
            }
            let Some(term_vector) = term_vectors.get(&term.text) else {
                continue;
            };
            if is_checkpoint(processed) {
                progress.report(&ProgressEvent::TermsProcessed { count: processed });
            }
            processed += 1;

            for posting in corpus.postings(&term)? {
                let Some(doc) = vectors.get_mut(posting.doc) else {
                    continue;
                };
                #[allow(clippy::cast_precision_loss)]
                let weight = posting.frequency as f32;
                doc.superpose(term_vector, weight, None)?;
            }
        }
    }

    let mut store = VectorStore::with_header(header);
    for (doc, mut vector) in vectors.into_iter().enumerate() {
        vector.normalize();
        store.put(doc.to_string(), vector)?;
    }
    info!(documents, "built document vectors");
    Ok(store)
}

/// Re-key a store of numbered document vectors by document path.
///
/// # Errors
///
/// Returns an error if a document path cannot be read.
pub fn rekey_by_path<C: CorpusIndex + ?Sized>(
    corpus: &C,
    doc_vectors: &VectorStore,
) -> BuildResult<VectorStore> {
    let mut store = VectorStore::with_header(doc_vectors.header());
    for doc in 0..corpus.document_count() {
        if let Some(vector) = doc_vectors.get(&doc.to_string()) {
            store.put(corpus.document_path(doc)?, vector.clone())?;
        }
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use semvec_vector::{RealVector, VectorType};

    use super::*;
    use crate::corpus::MemoryCorpus;
    use crate::progress::SilentProgress;

    fn real(data: Vec<f32>) -> Vector {
        Vector::from(RealVector::new(data).unwrap())
    }

    #[test]
    fn weighted_sum_of_term_vectors() {
        let corpus = MemoryCorpus::builder()
            .text("a.txt", "contents", "x x y")
            .text("b.txt", "contents", "zz")
            .build();
        let mut terms = VectorStore::new(VectorType::Real, 2);
        terms.put("x", real(vec![1.0, 0.0])).unwrap();
        terms.put("y", real(vec![0.0, 1.0])).unwrap();

        let docs =
            build_document_vectors(&corpus, &TermFilter::default(), &terms, &SilentProgress)
                .unwrap();
        assert_eq!(docs.len(), 2);
        let d0 = docs.get("0").unwrap().as_real().unwrap().as_slice().to_vec();
        let norm = 5f32.sqrt();
        assert!((d0[0] - 2.0 / norm).abs() < 1e-6);
        assert!((d0[1] - 1.0 / norm).abs() < 1e-6);
        assert!(docs.get("1").unwrap().is_zero());

        let by_path = rekey_by_path(&corpus, &docs).unwrap();
        assert_eq!(by_path.ids().collect::<Vec<_>>(), vec!["a.txt", "b.txt"]);
    }
}
