//! Error types for index building.
//!
//! This module provides the [`enum@BuildError`] type covering every failure
//! from configuration through training to artifact output. Any error ends the
//! pass: partially trained stores are never returned.

use std::path::PathBuf;

use semvec_vector::VectorError;
use thiserror::Error;

use crate::corpus::CorpusError;

/// Errors that can occur while building semantic vectors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A configuration value is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A supplied elemental store does not fit the corpus.
    #[error("configuration mismatch: expected {expected} elemental vectors, got {actual}")]
    ConfigMismatch {
        /// Number of documents in the corpus.
        expected: usize,
        /// Number of vectors supplied.
        actual: usize,
    },

    /// The corpus lacks positional data that training needs.
    #[error("index does not store term positions for field '{field}'")]
    UnsupportedIndex {
        /// The field without positions.
        field: String,
    },

    /// A vector store file is malformed or was written for another configuration.
    #[error("format error: {0}")]
    Format(String),

    /// A vector that training relies on is missing from a store.
    #[error("missing vector: {0}")]
    MissingVector(String),

    /// An I/O operation on an artifact failed.
    #[error("failed to {context} '{}': {source}", path.display())]
    Io {
        /// The operation that failed.
        context: &'static str,
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The corpus collaborator failed.
    #[error("corpus error: {0}")]
    Corpus(#[from] CorpusError),

    /// A vector operation failed.
    #[error("vector error: {0}")]
    Vector(VectorError),

    /// A configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl BuildError {
    /// Create an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Attach a file and operation to a store error.
    ///
    /// I/O failures become [`BuildError::Io`]; every other kind converts as
    /// through `From`.
    #[must_use]
    pub fn with_path(err: VectorError, context: &'static str, path: impl Into<PathBuf>) -> Self {
        match err {
            VectorError::Io(source) => Self::Io { context, path: path.into(), source },
            other => other.into(),
        }
    }
}

impl From<VectorError> for BuildError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::Format(msg) => Self::Format(msg),
            VectorError::InvalidParameter(msg) => Self::InvalidParameter(msg),
            other => Self::Vector(other),
        }
    }
}

/// A specialized `Result` type for build operations.
pub type BuildResult<T> = std::result::Result<T, BuildError>;
