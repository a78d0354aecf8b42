//! Vector store implementation.

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::encoding::{RecordLayout, StoreFormat, StoreHeader, StoreReader, StoreWriter};
use crate::error::VectorError;
use crate::generator::ElementalVectorGenerator;
use crate::types::{Vector, VectorType};

/// Identifier to vector mapping with a fixed type and dimension.
///
/// Iteration and serialization follow insertion order; overwriting an
/// existing identifier keeps its original position.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorStore {
    header: StoreHeader,
    index: HashMap<String, usize>,
    entries: Vec<(String, Vector)>,
}

impl VectorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(vector_type: VectorType, dimension: usize) -> Self {
        Self::with_header(StoreHeader::new(vector_type, dimension))
    }

    /// Create an empty store for a header.
    #[must_use]
    pub fn with_header(header: StoreHeader) -> Self {
        Self { header, index: HashMap::new(), entries: Vec::new() }
    }

    /// Create a store of random elemental vectors named `"0"` to `"count - 1"`.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    pub fn numbered_random(
        count: usize,
        generator: &mut ElementalVectorGenerator,
    ) -> Result<Self, VectorError> {
        let mut store = Self::new(generator.vector_type(), generator.dimension());
        store.populate_random((0..count).map(|i| i.to_string()), generator)?;
        Ok(store)
    }

    /// The type and dimension of every stored vector.
    #[must_use]
    pub fn header(&self) -> StoreHeader {
        self.header
    }

    /// The type of every stored vector.
    #[must_use]
    pub fn vector_type(&self) -> VectorType {
        self.header.vector_type
    }

    /// The dimension of every stored vector.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.header.dimension
    }

    /// Look up a vector.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Vector> {
        self.index.get(id).map(|&i| &self.entries[i].1)
    }

    /// Whether a vector is stored under `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Store a vector, replacing any vector already stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector's type or dimension differ from the store's.
    pub fn put(&mut self, id: impl Into<String>, vector: Vector) -> Result<(), VectorError> {
        self.header.check(&vector)?;

        let id = id.into();
        match self.index.get(&id) {
            Some(&i) => self.entries[i].1 = vector,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, vector));
            }
        }
        Ok(())
    }

    /// Number of stored vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(identifier, vector)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Vector)> + '_ {
        self.entries.iter().map(|(id, v)| (id.as_str(), v))
    }

    /// Iterate over identifiers in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// Generate an elemental vector for every identifier not yet stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the generator's shape differs from the store's.
    pub fn populate_random<I, S>(
        &mut self,
        ids: I,
        generator: &mut ElementalVectorGenerator,
    ) -> Result<(), VectorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.len();
        for id in ids {
            let id = id.into();
            if self.contains(&id) {
                continue;
            }
            let vector = generator.generate(&id)?;
            self.put(id, vector)?;
        }
        debug!(generated = self.len() - before, "populated random elemental vectors");
        Ok(())
    }

    /// A copy of the store with every vector normalized.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut copy = self.clone();
        for (_, v) in &mut copy.entries {
            v.normalize();
        }
        copy
    }

    /// The record layout that preserves every stored vector: sparse as soon
    /// as one binary vector carries a support mask.
    #[must_use]
    pub fn record_layout(&self) -> RecordLayout {
        let sparse =
            self.iter().any(|(_, v)| v.as_binary().is_some_and(|b| b.support().is_some()));
        if sparse {
            RecordLayout::Sparse
        } else {
            RecordLayout::Dense
        }
    }

    /// Serialize the store to a writer.
    ///
    /// Returns the writer once flushed.
    ///
    /// # Errors
    ///
    /// Returns an error if a vector cannot be represented in the format or the
    /// write fails.
    pub fn write_to<W: Write>(&self, writer: W, format: StoreFormat) -> Result<W, VectorError> {
        let layout = self.record_layout();
        let mut writer = StoreWriter::with_layout(writer, format, self.header, layout)?;
        for (id, v) in self.iter() {
            writer.write_vector(id, v)?;
        }
        writer.finish()
    }

    /// Write the store to a file, creating or truncating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, path: impl AsRef<Path>, format: StoreFormat) -> Result<(), VectorError> {
        let path = path.as_ref();
        let layout = self.record_layout();
        let mut writer = StoreWriter::create_with_layout(path, format, self.header, layout)?;
        for (id, v) in self.iter() {
            writer.write_vector(id, v)?;
        }
        writer.finish()?;
        info!(path = %path.display(), %format, vectors = self.len(), "wrote vector store");
        Ok(())
    }

    /// Read a serialized store.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::Format`] if the input is malformed.
    pub fn read_from<R: BufRead>(reader: R, format: StoreFormat) -> Result<Self, VectorError> {
        Self::collect(StoreReader::new(reader, format)?)
    }

    /// Read a store file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is malformed.
    pub fn read(path: impl AsRef<Path>, format: StoreFormat) -> Result<Self, VectorError> {
        let path = path.as_ref();
        let store = Self::collect(StoreReader::open(path, format)?)?;
        info!(
            path = %path.display(),
            %format,
            vectors = store.len(),
            vector_type = %store.vector_type(),
            dimension = store.dimension(),
            "read vector store"
        );
        Ok(store)
    }

    /// Read a store file whose header must match `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::Format`] if the stored type or dimension differ
    /// from `expected`, or if the file is malformed.
    pub fn load(
        path: impl AsRef<Path>,
        format: StoreFormat,
        expected: StoreHeader,
    ) -> Result<Self, VectorError> {
        let path = path.as_ref();
        let reader = StoreReader::open(path, format)?;
        reader.header().ensure_matches(&expected)?;
        let store = Self::collect(reader)?;
        info!(path = %path.display(), vectors = store.len(), "loaded vector store");
        Ok(store)
    }

    fn collect<R: BufRead>(reader: StoreReader<R>) -> Result<Self, VectorError> {
        let mut store = Self::with_header(reader.header());
        for record in reader {
            let (id, vector) = record?;
            if store.contains(&id) {
                warn!(id = %id, "duplicate identifier in vector store, keeping the last vector");
            }
            store.put(id, vector)?;
        }
        Ok(store)
    }
}

impl<'a> IntoIterator for &'a VectorStore {
    type Item = (&'a str, &'a Vector);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Vector)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
