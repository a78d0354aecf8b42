//! Starting term vectors for term-based reflective training.

use semvec_vector::{ElementalVectorGenerator, StoreFormat, StoreHeader, VectorStore};
use tracing::info;

use super::filtered_terms;
use crate::config::InitialTermVectors;
use crate::corpus::{CorpusIndex, TermFilter};
use crate::error::{BuildError, BuildResult};

/// Produce the term vectors a term-based reflective build starts from.
///
/// `Random` generates an elemental vector for every accepted term; `File`
/// loads a store that must match `expected`.
///
/// # Errors
///
/// Returns [`BuildError::Format`] if a loaded store has another type or
/// dimension, and [`BuildError::Io`] if it cannot be read.
pub fn seed_term_vectors<C: CorpusIndex + ?Sized>(
    corpus: &C,
    filter: &TermFilter,
    initial: &InitialTermVectors,
    generator: &mut ElementalVectorGenerator,
    format: StoreFormat,
    expected: StoreHeader,
) -> BuildResult<VectorStore> {
    let store = match initial {
        InitialTermVectors::Random => {
            let mut store = VectorStore::with_header(expected);
            let texts = filtered_terms(corpus, filter)?.into_iter().map(|term| term.text);
            store.populate_random(texts, generator)?;
            store
        }
        InitialTermVectors::File(path) => VectorStore::load(path, format, expected)
            .map_err(|err| BuildError::with_path(err, "load initial term vectors", path))?,
    };
    info!(terms = store.len(), "seeded term vectors");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use semvec_vector::VectorType;

    use super::*;
    use crate::corpus::MemoryCorpus;

    fn corpus() -> MemoryCorpus {
        MemoryCorpus::builder().text("d0", "contents", "a b a").text("d1", "contents", "c").build()
    }

    #[test]
    fn random_seed_covers_accepted_terms() {
        let header = StoreHeader::new(VectorType::Real, 16);
        let mut generator =
            ElementalVectorGenerator::new(VectorType::Real, 16, 4).unwrap().with_seed(Some(1));
        let store = seed_term_vectors(
            &corpus(),
            &TermFilter::default().with_min_frequency(2),
            &InitialTermVectors::Random,
            &mut generator,
            StoreFormat::Binary,
            header,
        )
        .unwrap();
        assert_eq!(store.ids().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(store.get("a").unwrap().polarity_counts(), (2, 2));
    }

    #[test]
    fn file_seed_must_match_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.txt");
        let mut generator = ElementalVectorGenerator::new(VectorType::Real, 16, 4).unwrap();
        let mut written = VectorStore::new(VectorType::Real, 16);
        written.populate_random(["a", "b"], &mut generator).unwrap();
        written.write(&path, StoreFormat::Text).unwrap();

        let initial = InitialTermVectors::File(path);
        let loaded = seed_term_vectors(
            &corpus(),
            &TermFilter::default(),
            &initial,
            &mut generator,
            StoreFormat::Text,
            StoreHeader::new(VectorType::Real, 16),
        )
        .unwrap();
        assert_eq!(loaded.len(), 2);

        let err = seed_term_vectors(
            &corpus(),
            &TermFilter::default(),
            &initial,
            &mut generator,
            StoreFormat::Text,
            StoreHeader::new(VectorType::Complex, 16),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::Format(_)));
    }
}
