//! Errors raised by vector algebra and store I/O.

use thiserror::Error;

use crate::types::VectorType;

/// Failure of a vector, permutation or store operation.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Two operands disagree on dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the receiver.
        expected: usize,
        /// Dimension of the argument.
        actual: usize,
    },

    /// A dimension below the allowed minimum.
    #[error("invalid dimension: expected at least {expected}, got {actual}")]
    InvalidDimension {
        /// Smallest allowed dimension.
        expected: usize,
        /// Requested dimension.
        actual: usize,
    },

    /// Real, binary and complex vectors were mixed.
    #[error("vector type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Type of the receiver.
        expected: VectorType,
        /// Type of the argument.
        actual: VectorType,
    },

    /// A construction parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A component is not finite.
    #[error("component {index} is {value}: {reason}")]
    InvalidValue {
        /// Component index.
        index: usize,
        /// Offending value.
        value: f32,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A serialized vector store is malformed or does not match the
    /// expected header.
    #[error("vector store format error: {0}")]
    Format(String),

    /// Reading or writing a store failed.
    #[error("vector store I/O error: {0}")]
    Io(#[from] std::io::Error),
}
