//! End-to-end training scenarios.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use std::cell::RefCell;
use std::sync::Arc;

use semvec::{
    BuildError, DocIndexing, IndexBuilder, InitialTermVectors, MemoryCorpus, ProgressEvent,
    ProgressReporter, TrainingConfig, TrainingMode,
};
use semvec_vector::{
    ElementalVectorGenerator, Permutation, PermutationCache, PositionalMethod, RealVector,
    StoreFormat, Vector, VectorStore, VectorType,
};
use tempfile::TempDir;

#[derive(Default)]
struct Recorder {
    events: RefCell<Vec<ProgressEvent>>,
}

impl ProgressReporter for Recorder {
    fn report(&self, event: &ProgressEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

fn real(data: &[f32]) -> Vector {
    Vector::from(RealVector::new(data.to_vec()).unwrap())
}

fn components(store: &VectorStore, id: &str) -> Vec<f32> {
    store.get(id).unwrap().as_real().unwrap().as_slice().to_vec()
}

fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-4, "{actual:?} != {expected:?}");
    }
}

fn sample_corpus() -> MemoryCorpus {
    MemoryCorpus::builder()
        .text("a.txt", "contents", "the cat sat on the mat with another cat")
        .text("b.txt", "contents", "the dog sat on the log")
        .text("c.txt", "contents", "a cat and a dog met on a mat")
        .build()
}

fn term_elementals(dimension: usize, terms: &[&str]) -> VectorStore {
    let mut generator =
        ElementalVectorGenerator::new(VectorType::Real, dimension, 4).unwrap().with_seed(Some(3));
    let mut store = VectorStore::new(VectorType::Real, dimension);
    store.populate_random(terms.iter().copied(), &mut generator).unwrap();
    store
}

fn expected_window(
    elemental: &VectorStore,
    dimension: usize,
    contributions: &[(&str, isize)],
) -> Vec<f32> {
    let mut v = Vector::zero(VectorType::Real, dimension).unwrap();
    for (term, shift) in contributions {
        let permutation = Permutation::shift(dimension, *shift);
        v.superpose(elemental.get(term).unwrap(), 1.0, Some(&permutation)).unwrap();
    }
    v.normalize();
    v.as_real().unwrap().as_slice().to_vec()
}

#[test]
fn document_superposition() {
    let corpus = MemoryCorpus::builder()
        .document("d1", "contents", ["t", "t"])
        .document("d2", "contents", ["t"])
        .build();
    let mut elemental = VectorStore::new(VectorType::Real, 5);
    elemental.put("0", real(&[1.0, 0.0, -1.0, 0.0, 0.0])).unwrap();
    elemental.put("1", real(&[0.0, 1.0, 0.0, -1.0, 0.0])).unwrap();

    let config = TrainingConfig::default().with_dimension(5).with_seed_length(2);
    let run = IndexBuilder::new(&corpus, config)
        .unwrap()
        .with_elemental_doc_vectors(elemental)
        .train()
        .unwrap();

    assert_eq!(run.snapshots().len(), 1);
    assert_close(
        &components(run.term_vectors(), "t"),
        &[0.6325, 0.3162, -0.6325, -0.3162, 0.0],
    );
}

#[test]
fn directional_encoding_depends_on_side_only() {
    let corpus = MemoryCorpus::builder().document("d0", "contents", ["a", "b", "c"]).build();
    let elemental = term_elementals(8, &["a", "b", "c"]);
    let config = TrainingConfig::default()
        .with_dimension(8)
        .with_seed_length(4)
        .with_mode(TrainingMode::TermTerm)
        .with_window_size(4)
        .with_positional_method(PositionalMethod::Directional);

    let cache =
        PermutationCache::new(PositionalMethod::Directional, 4, VectorType::Real, 8).unwrap();
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.for_offset(-2), cache.for_offset(-1));
    assert_eq!(cache.for_offset(2), cache.for_offset(1));
    assert!(cache.for_offset(0).is_none());

    let run = IndexBuilder::new(&corpus, config)
        .unwrap()
        .with_elemental_term_vectors(elemental.clone())
        .train()
        .unwrap();
    let terms = run.term_vectors();

    // a sees b and c to its right, both shifted right by one
    assert_close(&components(terms, "a"), &expected_window(&elemental, 8, &[("b", 1), ("c", 1)]));
    // c sees a and b to its left, both shifted left by one
    assert_close(
        &components(terms, "c"),
        &expected_window(&elemental, 8, &[("a", -1), ("b", -1)]),
    );
}

#[test]
fn permutation_encoding_uses_exact_offsets() {
    let corpus = MemoryCorpus::builder().document("d0", "contents", ["a", "b", "c"]).build();
    let elemental = term_elementals(8, &["a", "b", "c"]);
    let config = TrainingConfig::default()
        .with_dimension(8)
        .with_seed_length(4)
        .with_mode(TrainingMode::TermTerm)
        .with_window_size(5)
        .with_positional_method(PositionalMethod::Permutation);

    let cache =
        PermutationCache::new(PositionalMethod::Permutation, 5, VectorType::Real, 8).unwrap();
    assert_eq!(cache.len(), 5);
    assert_eq!(cache.offsets(), vec![-2, -1, 0, 1, 2]);
    assert_eq!(cache.for_offset(-2), Some(&Permutation::shift(8, -2)));
    assert_eq!(cache.for_offset(1), Some(&Permutation::shift(8, 1)));
    assert!(cache.for_offset(3).is_none());

    let run = IndexBuilder::new(&corpus, config)
        .unwrap()
        .with_elemental_term_vectors(elemental.clone())
        .train()
        .unwrap();
    let terms = run.term_vectors();

    assert_close(
        &components(terms, "c"),
        &expected_window(&elemental, 8, &[("a", -2), ("b", -1)]),
    );
    assert_close(
        &components(terms, "b"),
        &expected_window(&elemental, 8, &[("a", -1), ("c", 1)]),
    );
}

#[test]
fn single_cycle_has_no_retraining() {
    let corpus = sample_corpus();
    let config = TrainingConfig::default().with_dimension(64).with_seed(Some(5));
    let run = IndexBuilder::new(&corpus, config).unwrap().train().unwrap();

    assert_eq!(run.snapshots().len(), 1);
    let only = run.final_snapshot();
    assert_eq!(only.cycle, 1);
    assert_eq!(only.elemental.len(), 3);
    assert!(run.artifacts().is_empty());
}

#[test]
fn document_cycles_feed_document_vectors_forward() {
    let corpus = sample_corpus();
    let config =
        TrainingConfig::default().with_dimension(64).with_seed(Some(5)).with_training_cycles(3);
    let run = IndexBuilder::new(&corpus, config).unwrap().train().unwrap();

    let snapshots = run.snapshots();
    assert_eq!(snapshots.len(), 3);
    for pair in snapshots.windows(2) {
        let previous = pair[0].doc_vectors.as_ref().unwrap();
        assert!(Arc::ptr_eq(&pair[1].elemental, previous));
    }
    assert_eq!(snapshots.iter().map(|s| s.cycle).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn term_term_cycles_feed_term_vectors_forward() {
    let corpus = sample_corpus();
    let config = TrainingConfig::default()
        .with_dimension(64)
        .with_seed(Some(5))
        .with_mode(TrainingMode::TermTerm)
        .with_training_cycles(3);
    let run = IndexBuilder::new(&corpus, config).unwrap().train().unwrap();

    let snapshots = run.snapshots();
    assert_eq!(snapshots.len(), 3);
    assert!(Arc::ptr_eq(&snapshots[1].elemental, &snapshots[0].term_vectors));
    assert!(Arc::ptr_eq(&snapshots[2].elemental, &snapshots[1].term_vectors));
    assert!(snapshots[..2].iter().all(|s| s.doc_vectors.is_none()));
    assert_eq!(run.doc_vectors().unwrap().len(), 3);
}

#[test]
fn no_document_indexing_drops_final_document_vectors() {
    let corpus = sample_corpus();
    let config = TrainingConfig::default()
        .with_dimension(64)
        .with_training_cycles(2)
        .with_doc_indexing(DocIndexing::None);
    let run = IndexBuilder::new(&corpus, config).unwrap().train().unwrap();

    assert!(run.snapshots()[0].doc_vectors.is_some());
    assert!(run.doc_vectors().is_none());
}

#[test]
fn frequency_filter_boundary() {
    let corpus = MemoryCorpus::builder()
        .text("d0", "contents", "pair pair single")
        .text("d1", "contents", "triple triple triple")
        .build();
    let config = TrainingConfig::default().with_dimension(32).with_min_frequency(2);
    let run = IndexBuilder::new(&corpus, config).unwrap().train().unwrap();

    let terms = run.term_vectors();
    assert!(terms.contains("pair"));
    assert!(terms.contains("triple"));
    assert!(!terms.contains("single"));
}

#[test]
fn wrong_elemental_store_size_is_a_config_mismatch() {
    let corpus = sample_corpus();
    let mut generator = ElementalVectorGenerator::new(VectorType::Real, 64, 10).unwrap();
    let elemental = VectorStore::numbered_random(2, &mut generator).unwrap();

    let recorder = Recorder::default();
    let err = IndexBuilder::new(&corpus, TrainingConfig::default().with_dimension(64))
        .unwrap()
        .with_progress(&recorder)
        .with_elemental_doc_vectors(elemental)
        .train()
        .unwrap_err();

    assert!(matches!(err, BuildError::ConfigMismatch { expected: 3, actual: 2 }));
    let events = recorder.events.borrow();
    assert!(!events.iter().any(|e| matches!(e, ProgressEvent::TermsProcessed { .. })));
}

#[test]
fn term_term_requires_positions() {
    let corpus = MemoryCorpus::builder()
        .text("a.txt", "contents", "no positions here")
        .without_positions("contents")
        .build();
    let config = TrainingConfig::default().with_mode(TrainingMode::TermTerm);

    let recorder = Recorder::default();
    let err = IndexBuilder::new(&corpus, config)
        .unwrap()
        .with_progress(&recorder)
        .train()
        .unwrap_err();

    assert!(matches!(err, BuildError::UnsupportedIndex { ref field } if field == "contents"));
    assert!(recorder.events.borrow().is_empty());
}

#[test]
fn supplied_store_of_another_shape_is_rejected() {
    let corpus = sample_corpus();
    let mut generator = ElementalVectorGenerator::new(VectorType::Real, 32, 4).unwrap();
    let elemental = VectorStore::numbered_random(3, &mut generator).unwrap();

    let err = IndexBuilder::new(&corpus, TrainingConfig::default().with_dimension(64))
        .unwrap()
        .with_elemental_doc_vectors(elemental)
        .train()
        .unwrap_err();
    assert!(matches!(err, BuildError::Format(_)));
}

#[test]
fn deterministic_vectors_reproduce_runs() {
    let corpus = sample_corpus();
    let config = TrainingConfig::default()
        .with_dimension(64)
        .with_mode(TrainingMode::TermTerm)
        .with_deterministic_vectors(true);

    let first = IndexBuilder::new(&corpus, config.clone()).unwrap().train().unwrap();
    let second = IndexBuilder::new(&corpus, config).unwrap().train().unwrap();
    for (id, vector) in first.term_vectors().iter() {
        let other = second.term_vectors().get(id).unwrap();
        assert_eq!(vector.as_real().unwrap().as_slice(), other.as_real().unwrap().as_slice());
    }
}

#[test]
fn term_based_reflective_training() {
    let corpus = sample_corpus();
    let config = TrainingConfig::default()
        .with_dimension(64)
        .with_seed(Some(9))
        .with_initial_term_vectors(Some(InitialTermVectors::Random));
    let run = IndexBuilder::new(&corpus, config).unwrap().train().unwrap();

    let seed = run.initial_term_vectors().unwrap();
    assert_eq!(seed.len(), run.term_vectors().len());
    // cycle 1 trains against document vectors derived from the seed
    assert_eq!(run.final_snapshot().elemental.len(), 3);
}

#[test]
fn binary_and_complex_builds() {
    let corpus = sample_corpus();
    for (vector_type, seed_length) in [(VectorType::Binary, 16), (VectorType::Complex, 8)] {
        for mode in [TrainingMode::Document, TrainingMode::TermTerm] {
            let config = TrainingConfig::default()
                .with_vector_type(vector_type)
                .with_dimension(128)
                .with_seed_length(seed_length)
                .with_mode(mode)
                .with_positional_method(PositionalMethod::PermutationPlusBasic)
                .with_training_cycles(2)
                .with_seed(Some(21));
            let run = IndexBuilder::new(&corpus, config).unwrap().train().unwrap();

            let terms = run.term_vectors();
            assert_eq!(terms.vector_type(), vector_type);
            let cat = terms.get("cat").unwrap();
            assert!(cat.similarity(cat).unwrap() > 0.99);
        }
    }
}

#[test]
fn build_writes_reflective_artifacts() {
    let dir = TempDir::new().unwrap();
    let corpus = sample_corpus();
    let config = TrainingConfig::default()
        .with_dimension(64)
        .with_training_cycles(2)
        .with_output_dir(dir.path());
    let recorder = Recorder::default();
    let run =
        IndexBuilder::new(&corpus, config).unwrap().with_progress(&recorder).build().unwrap();

    let terms_path = dir.path().join("termvectors2.bin");
    let docs_path = dir.path().join("docvectors2.bin");
    assert_eq!(run.artifacts(), [terms_path.clone(), docs_path.clone()]);

    let terms = VectorStore::read(&terms_path, StoreFormat::Binary).unwrap();
    assert_eq!(terms.len(), run.term_vectors().len());
    let docs = VectorStore::read(&docs_path, StoreFormat::Binary).unwrap();
    assert_eq!(docs.ids().collect::<Vec<_>>(), vec!["a.txt", "b.txt", "c.txt"]);

    let events = recorder.events.borrow();
    assert!(events.contains(&ProgressEvent::CycleStarted { cycle: 2, total: 2 }));
    assert!(events.contains(&ProgressEvent::VectorsWritten { path: docs_path, count: 3 }));
}

#[test]
fn build_persists_permutation_elementals() {
    let dir = TempDir::new().unwrap();
    let corpus = sample_corpus();
    let config = TrainingConfig::default()
        .with_dimension(64)
        .with_mode(TrainingMode::TermTerm)
        .with_positional_method(PositionalMethod::Permutation)
        .with_doc_indexing(DocIndexing::None)
        .with_format(StoreFormat::Text)
        .with_output_dir(dir.path());
    let run = IndexBuilder::new(&corpus, config).unwrap().build().unwrap();

    let elemental_path = dir.path().join("randomvectors.txt");
    assert_eq!(run.artifacts(), [elemental_path.clone(), dir.path().join("termvectors.txt")]);

    let persisted = VectorStore::read(&elemental_path, StoreFormat::Text).unwrap();
    let used = &run.final_snapshot().elemental;
    assert_eq!(persisted.len(), used.len());
    for (id, vector) in persisted.iter() {
        let sim = vector.similarity(used.get(id).unwrap()).unwrap();
        assert!((sim - 1.0).abs() < 1e-5);
    }
}

#[test]
fn persisted_binary_elementals_reproduce_the_encoding() {
    let dir = TempDir::new().unwrap();
    let corpus = sample_corpus();
    let config = TrainingConfig::default()
        .with_vector_type(VectorType::Binary)
        .with_dimension(128)
        .with_seed_length(8)
        .with_mode(TrainingMode::TermTerm)
        .with_positional_method(PositionalMethod::Permutation)
        .with_doc_indexing(DocIndexing::None)
        .with_output_dir(dir.path());
    let run = IndexBuilder::new(&corpus, config.clone()).unwrap().build().unwrap();

    let persisted = VectorStore::read(dir.path().join("randomvectors.bin"), StoreFormat::Binary)
        .unwrap();
    assert_eq!(&persisted, run.final_snapshot().elemental.as_ref());
    for (_, v) in &persisted {
        assert_eq!(v.polarity_counts(), (4, 4));
    }

    let retrained = IndexBuilder::new(&corpus, config)
        .unwrap()
        .with_elemental_term_vectors(persisted)
        .train()
        .unwrap();
    assert_eq!(retrained.term_vectors().as_ref(), run.term_vectors().as_ref());
}

#[test]
fn build_streams_incremental_document_vectors() {
    let dir = TempDir::new().unwrap();
    let corpus = sample_corpus();
    let config = TrainingConfig::default()
        .with_dimension(64)
        .with_training_cycles(2)
        .with_doc_indexing(DocIndexing::Incremental)
        .with_output_dir(dir.path());
    let run = IndexBuilder::new(&corpus, config).unwrap().build().unwrap();

    let names: Vec<_> = run
        .artifacts()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "incremental_docvectors.bin",
            "incremental_docvectors2.bin",
            "termvectors.bin",
            "incremental_termvectors2.bin",
        ]
    );
    assert!(run.doc_vectors().is_none());

    let docs_path = dir.path().join("incremental_docvectors2.bin");
    let docs = VectorStore::read(docs_path, StoreFormat::Binary).unwrap();
    assert_eq!(docs.len(), 3);
    assert!(docs.contains("b.txt"));
}

#[test]
fn configuration_from_json_drives_a_build() {
    let corpus = sample_corpus();
    let config = TrainingConfig::from_json_str(
        r#"{
            "dimension": 64,
            "mode": "term_term",
            "positional_method": "directional",
            "window_size": 3,
            "doc_indexing": "none",
            "seed": 17
        }"#,
    )
    .unwrap();
    let run = IndexBuilder::new(&corpus, config).unwrap().train().unwrap();
    assert!(run.term_vectors().contains("mat"));
    assert!(run.doc_vectors().is_none());
}

#[test]
fn invalid_configuration_is_rejected_up_front() {
    let corpus = sample_corpus();
    let config = TrainingConfig::default().with_vector_type(VectorType::Binary).with_dimension(100);
    assert!(matches!(
        IndexBuilder::new(&corpus, config),
        Err(BuildError::InvalidParameter(_))
    ));
}
