//! Artifact naming.
//!
//! A single-cycle build writes `<base>.<ext>`. A reflective build writes the
//! final cycle as `<base><cycles>.<ext>`. Incremental document indexing
//! prefixes its artifacts with `incremental_`, and persisted permutation
//! elemental vectors go to `randomvectors.<ext>` for cycle 1 and
//! `randomvectors<cycle>.<ext>` after.

use std::path::{Path, PathBuf};

use semvec_vector::StoreFormat;

use crate::config::{DocIndexing, TrainingConfig, TrainingMode};

const INCREMENTAL_PREFIX: &str = "incremental_";
const ELEMENTAL_BASE: &str = "randomvectors";

/// Resolves artifact paths for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    dir: PathBuf,
    term_base: String,
    doc_base: String,
    format: StoreFormat,
    cycles: usize,
    incremental: bool,
    incremental_terms: bool,
}

impl OutputLayout {
    /// Layout described by a configuration.
    #[must_use]
    pub fn new(config: &TrainingConfig) -> Self {
        let incremental = config.doc_indexing == DocIndexing::Incremental;
        Self {
            dir: config.output_dir.clone(),
            term_base: config.term_vectors_file.clone(),
            doc_base: config.doc_vectors_file.clone(),
            format: config.format,
            cycles: config.training_cycles,
            incremental,
            incremental_terms: incremental && config.mode == TrainingMode::Document,
        }
    }

    /// The output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{}", self.format.extension()))
    }

    fn suffix(cycle: usize) -> String {
        if cycle > 1 {
            cycle.to_string()
        } else {
            String::new()
        }
    }

    const fn prefix(enabled: bool) -> &'static str {
        if enabled {
            INCREMENTAL_PREFIX
        } else {
            ""
        }
    }

    /// Final term vectors.
    #[must_use]
    pub fn term_vectors(&self) -> PathBuf {
        self.term_vectors_for_cycle(self.cycles)
    }

    /// Final document vectors.
    #[must_use]
    pub fn doc_vectors(&self) -> PathBuf {
        self.doc_vectors_for_cycle(self.cycles)
    }

    /// Term vectors after `cycle`.
    ///
    /// Only term vectors retrained from a streamed document file carry the
    /// incremental prefix; cycle 1 comes from the ordinary engines.
    #[must_use]
    pub fn term_vectors_for_cycle(&self, cycle: usize) -> PathBuf {
        let prefix = Self::prefix(self.incremental_terms && cycle > 1);
        self.file(&format!("{prefix}{}{}", self.term_base, Self::suffix(cycle)))
    }

    /// Document vectors after `cycle`.
    #[must_use]
    pub fn doc_vectors_for_cycle(&self, cycle: usize) -> PathBuf {
        let prefix = Self::prefix(self.incremental);
        self.file(&format!("{prefix}{}{}", self.doc_base, Self::suffix(cycle)))
    }

    /// Persisted elemental vectors of `cycle`.
    #[must_use]
    pub fn elemental_vectors(&self, cycle: usize) -> PathBuf {
        self.file(&format!("{ELEMENTAL_BASE}{}", Self::suffix(cycle)))
    }

    /// The store format of every artifact.
    #[must_use]
    pub const fn format(&self) -> StoreFormat {
        self.format
    }
}
