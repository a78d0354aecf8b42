//! Vector store serialization.
//!
//! Two interchangeable formats carry the same content: a header naming the
//! vector type and dimension, then one `(identifier, vector)` record per
//! stored vector in store order.
//!
//! - [`StoreFormat::Binary`]: big-endian, bit-exact. See [`binary`].
//! - [`StoreFormat::Text`]: one `|`-separated line per record. See [`text`].
//!
//! [`StoreWriter`] and [`StoreReader`] stream records one at a time, so a
//! store never has to be materialized to be written or scanned.
//!
//! Binary stores holding sparse elemental vectors use
//! [`RecordLayout::Sparse`]: the header is flagged `|sparse` and every record
//! carries its support mask after its bits.

pub mod binary;
pub mod text;

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::VectorError;
use crate::types::{BinaryVector, Vector, VectorType};

pub use binary::{BinaryStoreReader, BinaryStoreWriter};
pub use text::{TextStoreReader, TextStoreWriter};

/// Buffer size for store files (default: 64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// On-disk representation of a vector store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    /// Big-endian binary records.
    #[default]
    Binary,
    /// Pipe-separated text lines.
    Text,
}

impl StoreFormat {
    /// Conventional file extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Binary => "bin",
            Self::Text => "txt",
        }
    }

    /// Infer the format from a path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "bin" => Some(Self::Binary),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

impl fmt::Display for StoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary => write!(f, "binary"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// The shape shared by every vector in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHeader {
    /// Type of every stored vector.
    pub vector_type: VectorType,
    /// Dimension of every stored vector.
    pub dimension: usize,
}

impl StoreHeader {
    /// Create a header.
    #[must_use]
    pub const fn new(vector_type: VectorType, dimension: usize) -> Self {
        Self { vector_type, dimension }
    }

    /// Check that a vector fits this header.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::TypeMismatch`] or
    /// [`VectorError::DimensionMismatch`].
    pub fn check(&self, vector: &Vector) -> Result<(), VectorError> {
        if vector.vector_type() != self.vector_type {
            return Err(VectorError::TypeMismatch {
                expected: self.vector_type,
                actual: vector.vector_type(),
            });
        }
        if vector.dimension() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.dimension(),
            });
        }
        Ok(())
    }

    /// Check that a header read from disk matches the active configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::Format`] on any difference.
    pub fn ensure_matches(&self, expected: &Self) -> Result<(), VectorError> {
        if self != expected {
            return Err(VectorError::Format(format!(
                "store holds {} vectors of dimension {}, expected {} vectors of dimension {}",
                self.vector_type, self.dimension, expected.vector_type, expected.dimension
            )));
        }
        Ok(())
    }

    /// Number of `u64` words in a binary vector of this dimension.
    pub(crate) fn words(&self) -> usize {
        self.dimension.div_ceil(64)
    }
}

/// How binary records carry their voting positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordLayout {
    /// Bits only; every bit votes.
    #[default]
    Dense,
    /// Bits followed by a support mask. Binary stores only.
    Sparse,
}

impl RecordLayout {
    /// Header flag of the sparse layout.
    pub const SPARSE_FLAG: &'static str = "sparse";

    /// Check that the layout can carry vectors of `header`.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::InvalidParameter`] for a sparse layout on a
    /// real or complex store.
    pub fn check(self, header: &StoreHeader) -> Result<(), VectorError> {
        match (self, header.vector_type) {
            (Self::Sparse, VectorType::Real | VectorType::Complex) => {
                Err(VectorError::InvalidParameter(format!(
                    "sparse record layout needs binary vectors, not {}",
                    header.vector_type
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Support words written for a sparse record. A vector without a mask votes
/// on every bit of its dimension.
pub(crate) fn support_words(vector: &BinaryVector) -> Cow<'_, [u64]> {
    vector.support().map_or_else(|| Cow::Owned(full_support(vector.dimension())), Cow::Borrowed)
}

fn full_support(dimension: usize) -> Vec<u64> {
    let mut words = vec![!0u64; dimension.div_ceil(64)];
    if let Some(last) = words.last_mut() {
        let used = dimension % 64;
        if used != 0 {
            *last = (1u64 << used) - 1;
        }
    }
    words
}

/// Rebuild a binary vector read in the sparse layout.
pub(crate) fn sparse_binary(
    data: Vec<u64>,
    support: Vec<u64>,
    dimension: usize,
) -> Result<BinaryVector, VectorError> {
    if support == full_support(dimension) {
        BinaryVector::new(data, dimension)
    } else {
        BinaryVector::with_support(data, support, dimension)
    }
}

/// Streaming writer for either format.
#[derive(Debug)]
pub enum StoreWriter<W: Write> {
    /// Binary records.
    Binary(BinaryStoreWriter<W>),
    /// Text lines.
    Text(TextStoreWriter<W>),
}

impl StoreWriter<BufWriter<File>> {
    /// Create (or truncate) a store file and write its header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn create(
        path: impl AsRef<Path>,
        format: StoreFormat,
        header: StoreHeader,
    ) -> Result<Self, VectorError> {
        Self::create_with_layout(path, format, header, RecordLayout::Dense)
    }

    /// Like [`create`](Self::create), with an explicit record layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout does not fit the header or the file
    /// cannot be created or written.
    pub fn create_with_layout(
        path: impl AsRef<Path>,
        format: StoreFormat,
        header: StoreHeader,
        layout: RecordLayout,
    ) -> Result<Self, VectorError> {
        layout.check(&header)?;
        let file = File::create(path.as_ref())?;
        Self::with_layout(BufWriter::with_capacity(BUFFER_SIZE, file), format, header, layout)
    }
}

impl<W: Write> StoreWriter<W> {
    /// Wrap a writer and write the header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written.
    pub fn new(writer: W, format: StoreFormat, header: StoreHeader) -> Result<Self, VectorError> {
        Self::with_layout(writer, format, header, RecordLayout::Dense)
    }

    /// Wrap a writer and write a header announcing `layout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout does not fit the header or the header
    /// cannot be written.
    pub fn with_layout(
        writer: W,
        format: StoreFormat,
        header: StoreHeader,
        layout: RecordLayout,
    ) -> Result<Self, VectorError> {
        Ok(match format {
            StoreFormat::Binary => {
                Self::Binary(BinaryStoreWriter::with_layout(writer, header, layout)?)
            }
            StoreFormat::Text => Self::Text(TextStoreWriter::with_layout(writer, header, layout)?),
        })
    }

    /// Append one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector does not fit the header, cannot be
    /// represented in the format, or the write fails.
    pub fn write_vector(&mut self, id: &str, vector: &Vector) -> Result<(), VectorError> {
        match self {
            Self::Binary(w) => w.write_vector(id, vector),
            Self::Text(w) => w.write_vector(id, vector),
        }
    }

    /// Number of records written so far.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Binary(w) => w.count(),
            Self::Text(w) => w.count(),
        }
    }

    /// Flush and return the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn finish(self) -> Result<W, VectorError> {
        match self {
            Self::Binary(w) => w.finish(),
            Self::Text(w) => w.finish(),
        }
    }
}

/// Streaming reader for either format.
#[derive(Debug)]
pub enum StoreReader<R: BufRead> {
    /// Binary records.
    Binary(BinaryStoreReader<R>),
    /// Text lines.
    Text(TextStoreReader<R>),
}

impl StoreReader<BufReader<File>> {
    /// Open a store file and read its header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the header is malformed.
    pub fn open(path: impl AsRef<Path>, format: StoreFormat) -> Result<Self, VectorError> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::with_capacity(BUFFER_SIZE, file), format)
    }
}

impl<R: BufRead> StoreReader<R> {
    /// Wrap a reader and read the header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is malformed.
    pub fn new(reader: R, format: StoreFormat) -> Result<Self, VectorError> {
        Ok(match format {
            StoreFormat::Binary => Self::Binary(BinaryStoreReader::new(reader)?),
            StoreFormat::Text => Self::Text(TextStoreReader::new(reader)?),
        })
    }

    /// The header read from the input.
    #[must_use]
    pub fn header(&self) -> StoreHeader {
        match self {
            Self::Binary(r) => r.header(),
            Self::Text(r) => r.header(),
        }
    }

    /// The record layout announced by the header.
    #[must_use]
    pub fn layout(&self) -> RecordLayout {
        match self {
            Self::Binary(r) => r.layout(),
            Self::Text(r) => r.layout(),
        }
    }

    /// Read the next record, or `None` at a clean end of input.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::Format`] for truncated or malformed records.
    pub fn read_vector(&mut self) -> Result<Option<(String, Vector)>, VectorError> {
        match self {
            Self::Binary(r) => r.read_vector(),
            Self::Text(r) => r.read_vector(),
        }
    }
}

impl<R: BufRead> Iterator for StoreReader<R> {
    type Item = Result<(String, Vector), VectorError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_vector().transpose()
    }
}

/// Check that every component of a vector is finite before it is written.
pub(crate) fn ensure_finite(id: &str, vector: &Vector) -> Result<(), VectorError> {
    let finite = match vector {
        Vector::Real(v) => v.iter().all(|x| x.is_finite()),
        Vector::Complex(v) => v.as_slice().iter().all(|c| c.re.is_finite() && c.im.is_finite()),
        Vector::Binary(_) => true,
    };
    if finite {
        Ok(())
    } else {
        Err(VectorError::Format(format!("vector '{id}' has non-finite components")))
    }
}

/// Reject binary vectors that still carry unresolved votes.
pub(crate) fn ensure_settled(id: &str, vector: &Vector) -> Result<(), VectorError> {
    match vector {
        Vector::Binary(v) if v.is_accumulating() => Err(VectorError::Format(format!(
            "binary vector '{id}' must be normalized before it is written"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_extension() {
        assert_eq!(StoreFormat::Binary.extension(), "bin");
        assert_eq!(StoreFormat::Text.extension(), "txt");
        assert_eq!(StoreFormat::from_path(Path::new("termvectors.txt")), Some(StoreFormat::Text));
        assert_eq!(StoreFormat::from_path(Path::new("termvectors")), None);
    }

    #[test]
    fn header_mismatch_is_format_error() {
        let stored = StoreHeader::new(VectorType::Real, 200);
        assert!(stored.ensure_matches(&StoreHeader::new(VectorType::Real, 200)).is_ok());
        assert!(matches!(
            stored.ensure_matches(&StoreHeader::new(VectorType::Real, 100)),
            Err(VectorError::Format(_))
        ));
        assert!(matches!(
            stored.ensure_matches(&StoreHeader::new(VectorType::Binary, 200)),
            Err(VectorError::Format(_))
        ));
    }

    #[test]
    fn sparse_layout_is_binary_only() {
        let binary = StoreHeader::new(VectorType::Binary, 64);
        assert!(RecordLayout::Sparse.check(&binary).is_ok());
        assert!(RecordLayout::Sparse.check(&StoreHeader::new(VectorType::Real, 64)).is_err());
        assert!(RecordLayout::Dense.check(&StoreHeader::new(VectorType::Complex, 64)).is_ok());
    }

    #[test]
    fn dense_vectors_vote_everywhere_in_sparse_records() {
        let dense = BinaryVector::new(vec![0, 0b1], 70).unwrap();
        assert_eq!(support_words(&dense).as_ref(), &[!0u64, 0b11_1111]);
        let back = sparse_binary(vec![0, 0b1], vec![!0u64, 0b11_1111], 70).unwrap();
        assert_eq!(back, dense);
    }

    #[test]
    fn header_check_vector() {
        let header = StoreHeader::new(VectorType::Real, 4);
        assert!(header.check(&Vector::zero(VectorType::Real, 4).unwrap()).is_ok());
        assert!(header.check(&Vector::zero(VectorType::Real, 5).unwrap()).is_err());
        assert!(header.check(&Vector::zero(VectorType::Complex, 4).unwrap()).is_err());
    }
}
