//! The reflective training loop.

use std::path::PathBuf;
use std::sync::Arc;

use semvec_vector::{ElementalVectorGenerator, PermutationCache, StoreHeader, VectorStore};
use tracing::{debug, info};

use super::doc_vectors::{build_document_vectors, rekey_by_path};
use super::incremental::{retrain_term_vectors, write_document_vectors};
use super::seed::seed_term_vectors;
use super::{require_positions, DocumentTrainer, TermTermTrainer};
use crate::config::{DocIndexing, InitialTermVectors, TrainingConfig, TrainingMode};
use crate::corpus::{CorpusIndex, TermFilter};
use crate::error::{BuildError, BuildResult};
use crate::output::OutputLayout;
use crate::progress::{ProgressEvent, ProgressReporter, TracingProgress};

/// The stores produced by one training cycle.
///
/// `elemental` is the input of the cycle; for every cycle after the first it
/// is the same allocation as an output of the previous cycle.
#[derive(Debug, Clone)]
pub struct CycleSnapshot {
    /// 1-based cycle number.
    pub cycle: usize,
    /// Elemental vectors the cycle trained against.
    pub elemental: Arc<VectorStore>,
    /// Term vectors trained in the cycle.
    pub term_vectors: Arc<VectorStore>,
    /// Document vectors keyed by document number, when held in memory.
    pub doc_vectors: Option<Arc<VectorStore>>,
}

/// The outcome of a build: every cycle's stores and the files written.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    initial_term_vectors: Option<Arc<VectorStore>>,
    snapshots: Vec<CycleSnapshot>,
    artifacts: Vec<PathBuf>,
}

impl TrainingRun {
    /// Snapshots in cycle order; never empty.
    #[must_use]
    pub fn snapshots(&self) -> &[CycleSnapshot] {
        &self.snapshots
    }

    /// The last cycle, whose output is canonical.
    #[must_use]
    pub fn final_snapshot(&self) -> &CycleSnapshot {
        &self.snapshots[self.snapshots.len() - 1]
    }

    /// Final term vectors.
    #[must_use]
    pub fn term_vectors(&self) -> &Arc<VectorStore> {
        &self.final_snapshot().term_vectors
    }

    /// Final document vectors, keyed by document number.
    #[must_use]
    pub fn doc_vectors(&self) -> Option<&Arc<VectorStore>> {
        self.final_snapshot().doc_vectors.as_ref()
    }

    /// Seed term vectors of a term-based reflective build.
    #[must_use]
    pub fn initial_term_vectors(&self) -> Option<&Arc<VectorStore>> {
        self.initial_term_vectors.as_ref()
    }

    /// Files written, in write order. Empty for [`IndexBuilder::train`].
    #[must_use]
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }
}

/// Runs a full build over a corpus.
///
/// # Example
///
/// ```
/// use semvec::config::TrainingConfig;
/// use semvec::corpus::MemoryCorpus;
/// use semvec::train::IndexBuilder;
///
/// let corpus = MemoryCorpus::builder()
///     .text("a.txt", "contents", "the cat sat on the mat")
///     .text("b.txt", "contents", "the dog sat on the log")
///     .build();
/// let config = TrainingConfig::default().with_dimension(64).with_seed(Some(42));
///
/// let run = IndexBuilder::new(&corpus, config).unwrap().train().unwrap();
/// assert!(run.term_vectors().contains("cat"));
/// assert_eq!(run.doc_vectors().unwrap().len(), 2);
/// ```
pub struct IndexBuilder<'a, C: CorpusIndex + ?Sized> {
    corpus: &'a C,
    config: TrainingConfig,
    filter: TermFilter,
    progress: Box<dyn ProgressReporter + 'a>,
    elemental_doc_vectors: Option<VectorStore>,
    elemental_term_vectors: Option<VectorStore>,
}

impl<'a, C: CorpusIndex + ?Sized> IndexBuilder<'a, C> {
    /// Create a builder, validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidParameter`] for an invalid configuration.
    pub fn new(corpus: &'a C, config: TrainingConfig) -> BuildResult<Self> {
        config.validate()?;
        let filter = config.term_filter();
        Ok(Self {
            corpus,
            config,
            filter,
            progress: Box::new(TracingProgress),
            elemental_doc_vectors: None,
            elemental_term_vectors: None,
        })
    }

    /// Report progress to `progress` instead of `tracing`.
    #[must_use]
    pub fn with_progress(mut self, progress: impl ProgressReporter + 'a) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// Use these elemental document vectors for the first document cycle.
    #[must_use]
    pub fn with_elemental_doc_vectors(mut self, store: VectorStore) -> Self {
        self.elemental_doc_vectors = Some(store);
        self
    }

    /// Use these elemental term vectors for the first term-term cycle.
    #[must_use]
    pub fn with_elemental_term_vectors(mut self, store: VectorStore) -> Self {
        self.elemental_term_vectors = Some(store);
        self
    }

    /// The configuration of the build.
    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Run every cycle in memory without writing anything.
    ///
    /// # Errors
    ///
    /// Returns the first error of any cycle; no partial result survives.
    pub fn train(self) -> BuildResult<TrainingRun> {
        self.run(None)
    }

    /// Run every cycle and write the artifacts under the configured output
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns the first error of any cycle or write.
    pub fn build(self) -> BuildResult<TrainingRun> {
        let layout = OutputLayout::new(&self.config);
        std::fs::create_dir_all(layout.dir()).map_err(|source| BuildError::Io {
            context: "create output directory",
            path: layout.dir().to_path_buf(),
            source,
        })?;
        self.run(Some(&layout))
    }

    fn run(self, layout: Option<&OutputLayout>) -> BuildResult<TrainingRun> {
        let Self {
            corpus,
            config,
            filter,
            progress,
            elemental_doc_vectors,
            elemental_term_vectors,
        } = self;
        info!(
            mode = ?config.mode,
            vector_type = %config.vector_type,
            dimension = config.dimension,
            cycles = config.training_cycles,
            documents = corpus.document_count(),
            "starting build"
        );

        let pass = Pass {
            corpus,
            config: &config,
            filter: &filter,
            progress: progress.as_ref(),
            layout,
            header: config.store_header(),
            generator: config.generator()?,
            artifacts: Vec::new(),
        };
        let run = match config.mode {
            TrainingMode::Document => pass.document(elemental_doc_vectors)?,
            TrainingMode::TermTerm => pass.term_term(elemental_term_vectors)?,
        };
        info!(cycles = run.snapshots.len(), artifacts = run.artifacts.len(), "build finished");
        Ok(run)
    }
}

/// State of one build while its cycles run.
struct Pass<'p, C: CorpusIndex + ?Sized> {
    corpus: &'p C,
    config: &'p TrainingConfig,
    filter: &'p TermFilter,
    progress: &'p dyn ProgressReporter,
    layout: Option<&'p OutputLayout>,
    header: StoreHeader,
    generator: ElementalVectorGenerator,
    artifacts: Vec<PathBuf>,
}

impl<'p, C: CorpusIndex + ?Sized> Pass<'p, C> {
    /// The layout, if document vectors are streamed to disk.
    fn streaming(&self) -> Option<&'p OutputLayout> {
        self.layout.filter(|_| self.config.doc_indexing == DocIndexing::Incremental)
    }

    fn document(mut self, supplied: Option<VectorStore>) -> BuildResult<TrainingRun> {
        if self.streaming().is_some() {
            require_positions(self.corpus, self.filter)?;
        }

        let (initial_term_vectors, mut elemental) = match &self.config.initial_term_vectors {
            Some(initial) => {
                let seed = Arc::new(seed_term_vectors(
                    self.corpus,
                    self.filter,
                    initial,
                    &mut self.generator,
                    self.config.format,
                    self.header,
                )?);
                let docs =
                    build_document_vectors(self.corpus, self.filter, &seed, self.progress)?;
                (Some(seed), Arc::new(docs))
            }
            None => (None, Arc::new(self.elemental_documents(supplied)?)),
        };

        let cycles = self.config.training_cycles;
        let trainer = DocumentTrainer::new(self.corpus, self.filter).with_progress(self.progress);
        let mut snapshots = Vec::with_capacity(cycles);
        for cycle in 1..=cycles {
            self.progress.report(&ProgressEvent::CycleStarted { cycle, total: cycles });
            let last = cycle == cycles;

            let term_vectors = Arc::new(match self.streaming() {
                Some(layout) if cycle > 1 => retrain_term_vectors(
                    self.corpus,
                    self.filter,
                    &layout.doc_vectors_for_cycle(cycle - 1),
                    layout.format(),
                    self.header,
                    self.progress,
                )?,
                _ => trainer.train(&elemental)?,
            });

            let doc_vectors = if let Some(layout) = self.streaming() {
                let path = layout.doc_vectors_for_cycle(cycle);
                let format = layout.format();
                write_document_vectors(
                    self.corpus,
                    self.filter,
                    &term_vectors,
                    &path,
                    format,
                    self.progress,
                )?;
                self.artifacts.push(path);
                None
            } else if !last || self.config.doc_indexing != DocIndexing::None {
                let docs =
                    build_document_vectors(self.corpus, self.filter, &term_vectors, self.progress)?;
                Some(Arc::new(docs))
            } else {
                None
            };

            let next = if self.streaming().is_some() {
                Some(Arc::clone(&term_vectors))
            } else {
                doc_vectors.clone()
            };
            debug!(cycle, terms = term_vectors.len(), "document cycle finished");
            snapshots.push(CycleSnapshot {
                cycle,
                elemental: Arc::clone(&elemental),
                term_vectors,
                doc_vectors,
            });
            if let Some(next) = next {
                elemental = next;
            }
        }

        if self.streaming().is_some() && cycles > 1 {
            if let Some(layout) = self.layout {
                let first = Arc::clone(&snapshots[0].term_vectors);
                self.write(&first, layout.term_vectors_for_cycle(1))?;
            }
        }
        self.finish(initial_term_vectors, snapshots)
    }

    fn term_term(mut self, supplied: Option<VectorStore>) -> BuildResult<TrainingRun> {
        require_positions(self.corpus, self.filter)?;
        let cache = PermutationCache::new(
            self.config.positional_method,
            self.config.window_size,
            self.header.vector_type,
            self.header.dimension,
        )?;
        let progress = self.progress;
        let trainer =
            TermTermTrainer::new(self.corpus, self.filter, &cache).with_progress(progress);

        let mut elemental = Arc::new(match (supplied, &self.config.initial_term_vectors) {
            (Some(store), _) => {
                store.header().ensure_matches(&self.header)?;
                store
            }
            (None, Some(InitialTermVectors::File(path))) => {
                VectorStore::load(path, self.config.format, self.header).map_err(|err| {
                    BuildError::with_path(err, "load elemental term vectors", path)
                })?
            }
            (None, _) => {
                let mut store = VectorStore::with_header(self.header);
                store.populate_random(trainer.vocabulary()?, &mut self.generator)?;
                store
            }
        });

        let cycles = self.config.training_cycles;
        let mut snapshots = Vec::with_capacity(cycles);
        for cycle in 1..=cycles {
            progress.report(&ProgressEvent::CycleStarted { cycle, total: cycles });
            let last = cycle == cycles;
            let term_vectors = Arc::new(trainer.train(&elemental)?);

            if let Some(layout) = self.layout {
                if trainer.persists_elemental() {
                    self.write(&elemental.normalized(), layout.elemental_vectors(cycle))?;
                }
            }

            let doc_vectors = match self.streaming() {
                Some(layout) if last => {
                    let path = layout.doc_vectors();
                    let format = layout.format();
                    write_document_vectors(
                        self.corpus,
                        self.filter,
                        &term_vectors,
                        &path,
                        format,
                        progress,
                    )?;
                    self.artifacts.push(path);
                    None
                }
                None if last && self.config.doc_indexing != DocIndexing::None => {
                    let docs =
                        build_document_vectors(self.corpus, self.filter, &term_vectors, progress)?;
                    Some(Arc::new(docs))
                }
                _ => None,
            };

            debug!(cycle, terms = term_vectors.len(), "term-term cycle finished");
            snapshots.push(CycleSnapshot {
                cycle,
                elemental,
                term_vectors: Arc::clone(&term_vectors),
                doc_vectors,
            });
            elemental = term_vectors;
        }
        self.finish(None, snapshots)
    }

    /// Elemental document vectors for the first document cycle: supplied,
    /// loaded from the configured file, or generated.
    fn elemental_documents(&mut self, supplied: Option<VectorStore>) -> BuildResult<VectorStore> {
        if let Some(store) = supplied {
            store.header().ensure_matches(&self.header)?;
            return Ok(store);
        }
        if let Some(path) = &self.config.initial_doc_vectors {
            let context = "load elemental document vectors";
            return VectorStore::load(path, self.config.format, self.header)
                .map_err(|err| BuildError::with_path(err, context, path));
        }
        Ok(VectorStore::numbered_random(self.corpus.document_count(), &mut self.generator)?)
    }

    /// Write the final stores and assemble the run.
    fn finish(
        mut self,
        initial_term_vectors: Option<Arc<VectorStore>>,
        snapshots: Vec<CycleSnapshot>,
    ) -> BuildResult<TrainingRun> {
        if let (Some(layout), Some(last)) = (self.layout, snapshots.last()) {
            self.write(&last.term_vectors, layout.term_vectors())?;
            if let Some(docs) = &last.doc_vectors {
                let by_path = rekey_by_path(self.corpus, docs)?;
                self.write(&by_path, layout.doc_vectors())?;
            }
        }
        Ok(TrainingRun { initial_term_vectors, snapshots, artifacts: self.artifacts })
    }

    fn write(&mut self, store: &VectorStore, path: PathBuf) -> BuildResult<()> {
        store
            .write(&path, self.config.format)
            .map_err(|err| BuildError::with_path(err, "write vectors", &path))?;
        let count = store.len();
        self.progress.report(&ProgressEvent::VectorsWritten { path: path.clone(), count });
        self.artifacts.push(path);
        Ok(())
    }
}
