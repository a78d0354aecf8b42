//! Training configuration.
//!
//! [`TrainingConfig`] holds every knob of a build. It is plain data: it can
//! be assembled with the `with_*` builders or loaded from JSON, where missing
//! keys take their defaults.
//!
//! ```
//! use semvec::config::{TrainingConfig, TrainingMode};
//! use semvec_vector::PositionalMethod;
//!
//! let config = TrainingConfig::from_json_str(
//!     r#"{ "mode": "term_term", "positional_method": "permutation", "window_size": 5 }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.mode, TrainingMode::TermTerm);
//! assert_eq!(config.positional_method, PositionalMethod::Permutation);
//! assert_eq!(config.dimension, 200);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use semvec_vector::{
    ElementalVectorGenerator, PositionalMethod, StoreFormat, StoreHeader, VectorType,
};
use serde::{Deserialize, Serialize};

use crate::corpus::TermFilter;
use crate::error::{BuildError, BuildResult};

/// Which co-occurrence model trains the term vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingMode {
    /// Terms are sums of the elemental vectors of the documents they occur in.
    #[default]
    Document,
    /// Terms are sums of the elemental vectors of their window neighbours.
    TermTerm,
}

/// How document vectors are produced and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocIndexing {
    /// Stream document vectors to disk one document at a time.
    Incremental,
    /// Build all document vectors in memory.
    #[default]
    InMemory,
    /// Write term vectors only.
    None,
}

impl fmt::Display for DocIndexing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incremental => write!(f, "incremental"),
            Self::InMemory => write!(f, "inmemory"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Starting term vectors for term-based reflective training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InitialTermVectors {
    /// Random elemental vectors for every accepted term.
    Random,
    /// Term vectors read from a store file.
    File(PathBuf),
}

impl From<String> for InitialTermVectors {
    fn from(value: String) -> Self {
        if value == "random" {
            Self::Random
        } else {
            Self::File(PathBuf::from(value))
        }
    }
}

impl From<InitialTermVectors> for String {
    fn from(value: InitialTermVectors) -> Self {
        match value {
            InitialTermVectors::Random => "random".to_string(),
            InitialTermVectors::File(path) => path.to_string_lossy().into_owned(),
        }
    }
}

/// Configuration for one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Vector space of every vector built.
    pub vector_type: VectorType,
    /// Dimension of every vector built.
    pub dimension: usize,
    /// Non-zero entries per elemental vector.
    pub seed_length: usize,
    /// Smallest collection frequency of a trained term.
    pub min_frequency: u64,
    /// Largest collection frequency of a trained term.
    pub max_frequency: u64,
    /// Non-alphabetic characters a trained term may contain; `None` for any.
    pub max_non_alphabet_chars: Option<usize>,
    /// Skip terms that parse as numbers.
    pub filter_numbers: bool,
    /// Index fields to train on.
    pub fields: Vec<String>,
    /// Co-occurrence model.
    pub mode: TrainingMode,
    /// Width of the sliding context window (term-term mode).
    pub window_size: usize,
    /// Word-order encoding (term-term mode).
    pub positional_method: PositionalMethod,
    /// Number of training cycles; 1 means no reflective retraining.
    pub training_cycles: usize,
    /// Derive elemental vectors from identifier hashes.
    pub deterministic_vectors: bool,
    /// Base seed of the elemental vector RNG.
    pub seed: Option<u64>,
    /// Document vector strategy.
    pub doc_indexing: DocIndexing,
    /// Start from given term vectors instead of elemental document vectors.
    pub initial_term_vectors: Option<InitialTermVectors>,
    /// Elemental document vectors to use instead of random ones.
    pub initial_doc_vectors: Option<PathBuf>,
    /// Directory artifacts are written to.
    pub output_dir: PathBuf,
    /// Base name of the term vector artifact.
    pub term_vectors_file: String,
    /// Base name of the document vector artifact.
    pub doc_vectors_file: String,
    /// Format of written and read stores.
    pub format: StoreFormat,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            vector_type: VectorType::Real,
            dimension: 200,
            seed_length: 10,
            min_frequency: 0,
            max_frequency: u64::MAX,
            max_non_alphabet_chars: Some(0),
            filter_numbers: false,
            fields: vec!["contents".to_string()],
            mode: TrainingMode::Document,
            window_size: 5,
            positional_method: PositionalMethod::Basic,
            training_cycles: 1,
            deterministic_vectors: false,
            seed: None,
            doc_indexing: DocIndexing::InMemory,
            initial_term_vectors: None,
            initial_doc_vectors: None,
            output_dir: PathBuf::from("."),
            term_vectors_file: "termvectors".to_string(),
            doc_vectors_file: "docvectors".to_string(),
            format: StoreFormat::Binary,
        }
    }
}

impl TrainingConfig {
    /// Create a configuration with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Config`] for malformed JSON or unknown enum
    /// names, and [`BuildError::InvalidParameter`] if validation fails.
    pub fn from_json_str(json: &str) -> BuildResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> BuildResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| BuildError::Io {
            context: "read configuration",
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Set the vector type.
    #[must_use]
    pub const fn with_vector_type(mut self, vector_type: VectorType) -> Self {
        self.vector_type = vector_type;
        self
    }

    /// Set the dimension.
    #[must_use]
    pub const fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set the seed length.
    #[must_use]
    pub const fn with_seed_length(mut self, seed_length: usize) -> Self {
        self.seed_length = seed_length;
        self
    }

    /// Set the minimum term frequency.
    #[must_use]
    pub const fn with_min_frequency(mut self, min_frequency: u64) -> Self {
        self.min_frequency = min_frequency;
        self
    }

    /// Set the maximum term frequency.
    #[must_use]
    pub const fn with_max_frequency(mut self, max_frequency: u64) -> Self {
        self.max_frequency = max_frequency;
        self
    }

    /// Set the non-alphabetic character limit.
    #[must_use]
    pub const fn with_max_non_alphabet_chars(mut self, limit: Option<usize>) -> Self {
        self.max_non_alphabet_chars = limit;
        self
    }

    /// Skip numeric terms.
    #[must_use]
    pub const fn with_filter_numbers(mut self, filter_numbers: bool) -> Self {
        self.filter_numbers = filter_numbers;
        self
    }

    /// Set the fields to train on.
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the training mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: TrainingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the context window width.
    #[must_use]
    pub const fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the positional method.
    #[must_use]
    pub const fn with_positional_method(mut self, method: PositionalMethod) -> Self {
        self.positional_method = method;
        self
    }

    /// Set the number of training cycles.
    #[must_use]
    pub const fn with_training_cycles(mut self, training_cycles: usize) -> Self {
        self.training_cycles = training_cycles;
        self
    }

    /// Derive elemental vectors from identifier hashes.
    #[must_use]
    pub const fn with_deterministic_vectors(mut self, deterministic: bool) -> Self {
        self.deterministic_vectors = deterministic;
        self
    }

    /// Set the base RNG seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Set the document indexing strategy.
    #[must_use]
    pub const fn with_doc_indexing(mut self, doc_indexing: DocIndexing) -> Self {
        self.doc_indexing = doc_indexing;
        self
    }

    /// Start from given term vectors.
    #[must_use]
    pub fn with_initial_term_vectors(mut self, initial: Option<InitialTermVectors>) -> Self {
        self.initial_term_vectors = initial;
        self
    }

    /// Use elemental document vectors from a store file.
    #[must_use]
    pub fn with_initial_doc_vectors(mut self, path: Option<PathBuf>) -> Self {
        self.initial_doc_vectors = path;
        self
    }

    /// Set the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the store format.
    #[must_use]
    pub const fn with_format(mut self, format: StoreFormat) -> Self {
        self.format = format;
        self
    }

    /// Check the configuration for values no build can use.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidParameter`] naming the first bad value.
    pub fn validate(&self) -> BuildResult<()> {
        if self.dimension == 0 {
            return Err(BuildError::invalid_parameter("dimension must be positive"));
        }
        if self.seed_length == 0 || self.seed_length > self.dimension {
            return Err(BuildError::invalid_parameter(format!(
                "seed_length must be in 1..={}, got {}",
                self.dimension, self.seed_length
            )));
        }
        if self.vector_type == VectorType::Binary && self.dimension % 64 != 0 {
            return Err(BuildError::invalid_parameter(format!(
                "binary dimension must be a multiple of 64, got {}",
                self.dimension
            )));
        }
        if self.window_size == 0 {
            return Err(BuildError::invalid_parameter("window_size must be positive"));
        }
        if self.training_cycles == 0 {
            return Err(BuildError::invalid_parameter("training_cycles must be at least 1"));
        }
        if self.fields.is_empty() {
            return Err(BuildError::invalid_parameter("at least one field is required"));
        }
        if self.min_frequency > self.max_frequency {
            return Err(BuildError::invalid_parameter(format!(
                "min_frequency {} exceeds max_frequency {}",
                self.min_frequency, self.max_frequency
            )));
        }
        if self.term_vectors_file.is_empty() || self.doc_vectors_file.is_empty() {
            return Err(BuildError::invalid_parameter("artifact base names must not be empty"));
        }
        Ok(())
    }

    /// The term filter described by this configuration.
    #[must_use]
    pub fn term_filter(&self) -> TermFilter {
        TermFilter::new(self.fields.clone())
            .with_min_frequency(self.min_frequency)
            .with_max_frequency(self.max_frequency)
            .with_max_non_alphabet_chars(self.max_non_alphabet_chars)
            .with_filter_numbers(self.filter_numbers)
    }

    /// An elemental vector generator for this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidParameter`] for an invalid shape.
    pub fn generator(&self) -> BuildResult<ElementalVectorGenerator> {
        Ok(ElementalVectorGenerator::new(self.vector_type, self.dimension, self.seed_length)?
            .with_seed(self.seed)
            .deterministic(self.deterministic_vectors))
    }

    /// Header shared by every store of this build.
    #[must_use]
    pub const fn store_header(&self) -> StoreHeader {
        StoreHeader::new(self.vector_type, self.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.vector_type, VectorType::Real);
        assert_eq!(config.dimension, 200);
        assert_eq!(config.seed_length, 10);
        assert_eq!(config.max_non_alphabet_chars, Some(0));
        assert_eq!(config.fields, vec!["contents"]);
        assert_eq!(config.window_size, 5);
        assert_eq!(config.positional_method, PositionalMethod::Basic);
        assert_eq!(config.training_cycles, 1);
        assert_eq!(config.doc_indexing, DocIndexing::InMemory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_partial_and_enums() {
        let config = TrainingConfig::from_json_str(
            r#"{
                "vector_type": "binary",
                "dimension": 512,
                "doc_indexing": "incremental",
                "initial_term_vectors": "random",
                "max_non_alphabet_chars": null
            }"#,
        )
        .unwrap();
        assert_eq!(config.vector_type, VectorType::Binary);
        assert_eq!(config.doc_indexing, DocIndexing::Incremental);
        assert_eq!(config.initial_term_vectors, Some(InitialTermVectors::Random));
        assert_eq!(config.max_non_alphabet_chars, None);
        assert_eq!(config.seed_length, 10);

        let config =
            TrainingConfig::from_json_str(r#"{ "initial_term_vectors": "tv.bin" }"#).unwrap();
        assert_eq!(
            config.initial_term_vectors,
            Some(InitialTermVectors::File(PathBuf::from("tv.bin")))
        );
    }

    #[test]
    fn json_rejects_unknown_names() {
        let err = TrainingConfig::from_json_str(r#"{ "positional_method": "sideways" }"#);
        assert!(matches!(err, Err(BuildError::Config(_))));
    }

    #[test]
    fn json_roundtrip() {
        let config = TrainingConfig::default()
            .with_mode(TrainingMode::TermTerm)
            .with_positional_method(PositionalMethod::PermutationPlusBasic)
            .with_initial_term_vectors(Some(InitialTermVectors::Random));
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(TrainingConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn validation() {
        let bad = [
            TrainingConfig::default().with_dimension(0),
            TrainingConfig::default().with_seed_length(0),
            TrainingConfig::default().with_dimension(8).with_seed_length(9),
            TrainingConfig::default().with_vector_type(VectorType::Binary).with_dimension(100),
            TrainingConfig::default().with_window_size(0),
            TrainingConfig::default().with_training_cycles(0),
            TrainingConfig::default().with_fields(Vec::<String>::new()),
            TrainingConfig::default().with_min_frequency(5).with_max_frequency(4),
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(BuildError::InvalidParameter(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn missing_file() {
        let err = TrainingConfig::from_json_file("/nonexistent/semvec.json").unwrap_err();
        assert!(matches!(err, BuildError::Io { context: "read configuration", .. }));
    }
}
