//! Streamed document vectors.
//!
//! [`write_document_vectors`] builds each document vector from the
//! document's own term frequencies and writes it before moving to the next,
//! so only one document vector is held at a time. [`retrain_term_vectors`]
//! reads such a file back, one record at a time, to train the next cycle's
//! term vectors.

use std::path::Path;

use semvec_vector::encoding::{StoreReader, StoreWriter};
use semvec_vector::{StoreFormat, StoreHeader, Vector, VectorError, VectorStore};
use tracing::info;

use super::{filtered_terms, require_positions, Accumulators};
use crate::corpus::{CorpusIndex, TermFilter};
use crate::error::{BuildError, BuildResult};
use crate::progress::{is_checkpoint, ProgressEvent, ProgressReporter};

/// Stream one vector per document, keyed by document path, to `path`.
///
/// Returns the number of vectors written.
///
/// # Errors
///
/// Returns [`BuildError::UnsupportedIndex`] before writing if a field has no
/// positional data, and [`BuildError::Io`] if the file cannot be written.
pub fn write_document_vectors<C: CorpusIndex + ?Sized>(
    corpus: &C,
    filter: &TermFilter,
    term_vectors: &VectorStore,
    path: &Path,
    format: StoreFormat,
    progress: &dyn ProgressReporter,
) -> BuildResult<usize> {
    require_positions(corpus, filter)?;
    let header = term_vectors.header();
    let mut writer = StoreWriter::create(path, format, header)
        .map_err(|err| BuildError::with_path(err, "create document vectors", path))?;

    for doc in 0..corpus.document_count() {
        if is_checkpoint(doc) {
            progress.report(&ProgressEvent::DocumentsProcessed { count: doc });
        }
        let mut vector = Vector::zero(header.vector_type, header.dimension)?;
        for field in &filter.fields {
            let Some(tpv) = corpus.term_positions(doc, field)? else {
                continue;
            };
            for (text, frequency) in tpv.term_frequencies() {
                if let Some(term_vector) = term_vectors.get(text) {
                    #[allow(clippy::cast_precision_loss)]
                    let weight = frequency as f32;
                    vector.superpose(term_vector, weight, None)?;
                }
            }
        }
        vector.normalize();
        writer
            .write_vector(&corpus.document_path(doc)?, &vector)
            .map_err(|err| BuildError::with_path(err, "write document vectors", path))?;
    }

    let count = writer.count();
    writer.finish().map_err(|err| BuildError::with_path(err, "write document vectors", path))?;
    info!(path = %path.display(), documents = count, "streamed document vectors");
    progress.report(&ProgressEvent::VectorsWritten { path: path.to_path_buf(), count });
    Ok(count)
}

/// Train term vectors from a document vector file written by
/// [`write_document_vectors`].
///
/// Records are matched to documents by position; each document vector is
/// added to every accepted term it contains, weighted by frequency.
///
/// # Errors
///
/// Returns [`BuildError::Format`] if the file's header differs from
/// `expected` or a record is not the document expected at its position, and
/// [`BuildError::ConfigMismatch`] if the record count differs from the
/// document count.
pub fn retrain_term_vectors<C: CorpusIndex + ?Sized>(
    corpus: &C,
    filter: &TermFilter,
    path: &Path,
    format: StoreFormat,
    expected: StoreHeader,
    progress: &dyn ProgressReporter,
) -> BuildResult<VectorStore> {
    require_positions(corpus, filter)?;
    let mut reader = StoreReader::open(path, format)
        .map_err(|err| BuildError::with_path(err, "open document vectors", path))?;
    reader.header().ensure_matches(&expected)?;

    let mut accumulators = Accumulators::new(expected);
    for term in filtered_terms(corpus, filter)? {
        accumulators.slot(&term.text)?;
    }

    let documents = corpus.document_count();
    let mut doc = 0usize;
    let read_error = |err: VectorError| BuildError::with_path(err, "read document vectors", path);
    while let Some((id, doc_vector)) = reader.read_vector().map_err(read_error)? {
        if doc >= documents {
            return Err(BuildError::ConfigMismatch { expected: documents, actual: doc + 1 });
        }
        let path_at = corpus.document_path(doc)?;
        if id != path_at {
            return Err(BuildError::Format(format!(
                "document vector {doc} is '{id}', expected '{path_at}'"
            )));
        }
        if is_checkpoint(doc) {
            progress.report(&ProgressEvent::DocumentsProcessed { count: doc });
        }

        for field in &filter.fields {
            let Some(tpv) = corpus.term_positions(doc, field)? else {
                continue;
            };
            for (text, frequency) in tpv.term_frequencies() {
                if let Some(slot) = accumulators.index_of(text) {
                    #[allow(clippy::cast_precision_loss)]
                    let weight = frequency as f32;
                    accumulators.vector_mut(slot).superpose(&doc_vector, weight, None)?;
                }
            }
        }
        doc += 1;
    }

    if doc != documents {
        return Err(BuildError::ConfigMismatch { expected: documents, actual: doc });
    }
    let store = accumulators.into_store()?;
    info!(path = %path.display(), terms = store.len(), "retrained term vectors from documents");
    Ok(store)
}
