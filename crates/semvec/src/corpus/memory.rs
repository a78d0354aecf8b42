//! In-memory corpus.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::{CorpusError, CorpusIndex, DocId, Posting, Term, TermPositionVector};

#[derive(Debug, Clone, Default)]
struct Document {
    path: String,
    fields: BTreeMap<String, Vec<String>>,
}

/// A small inverted index held in memory.
///
/// Terms are ordered lexicographically per field and positions are token
/// offsets within the field.
///
/// # Example
///
/// ```
/// use semvec::corpus::{CorpusIndex, MemoryCorpus, Term};
///
/// let corpus = MemoryCorpus::builder()
///     .text("a.txt", "contents", "the cat sat")
///     .text("b.txt", "contents", "the dog sat on the cat")
///     .build();
///
/// assert_eq!(corpus.document_count(), 2);
/// let the = Term::new("contents", "the");
/// assert_eq!(corpus.term_frequency(&the).unwrap(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    documents: Vec<Document>,
    fields: BTreeSet<String>,
    unpositioned: HashSet<String>,
    postings: BTreeMap<Term, Vec<Posting>>,
}

impl MemoryCorpus {
    /// Start building a corpus.
    #[must_use]
    pub fn builder() -> MemoryCorpusBuilder {
        MemoryCorpusBuilder::default()
    }

    fn document(&self, doc: DocId) -> Result<&Document, CorpusError> {
        self.documents.get(doc).ok_or(CorpusError::UnknownDocument(doc))
    }

    fn check_field(&self, field: &str) -> Result<(), CorpusError> {
        if self.fields.contains(field) {
            Ok(())
        } else {
            Err(CorpusError::UnknownField(field.to_string()))
        }
    }
}

impl CorpusIndex for MemoryCorpus {
    fn document_count(&self) -> usize {
        self.documents.len()
    }

    fn document_path(&self, doc: DocId) -> Result<String, CorpusError> {
        Ok(self.document(doc)?.path.clone())
    }

    fn terms(&self, field: &str) -> Result<Vec<Term>, CorpusError> {
        self.check_field(field)?;
        Ok(self.postings.keys().filter(|t| t.field == field).cloned().collect())
    }

    fn postings(&self, term: &Term) -> Result<Vec<Posting>, CorpusError> {
        self.check_field(&term.field)?;
        Ok(self.postings.get(term).cloned().unwrap_or_default())
    }

    fn term_frequency(&self, term: &Term) -> Result<u64, CorpusError> {
        Ok(self.postings(term)?.iter().map(|p| u64::from(p.frequency)).sum())
    }

    fn has_positions(&self, field: &str) -> bool {
        !self.unpositioned.contains(field)
    }

    fn term_positions(
        &self,
        doc: DocId,
        field: &str,
    ) -> Result<Option<TermPositionVector>, CorpusError> {
        self.check_field(field)?;
        let document = self.document(doc)?;
        if !self.has_positions(field) {
            return Ok(None);
        }
        let Some(tokens) = document.fields.get(field) else {
            return Ok(None);
        };

        let mut by_term: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (position, token) in tokens.iter().enumerate() {
            by_term.entry(token.as_str()).or_default().push(position);
        }

        let mut tpv = TermPositionVector::default();
        for (term, positions) in by_term {
            tpv.terms.push(term.to_string());
            tpv.frequencies.push(u32::try_from(positions.len()).unwrap_or(u32::MAX));
            tpv.positions.push(positions);
        }
        Ok(Some(tpv))
    }
}

/// Builder for [`MemoryCorpus`].
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpusBuilder {
    documents: Vec<Document>,
    unpositioned: HashSet<String>,
}

impl MemoryCorpusBuilder {
    /// Add a document with one field of pre-tokenized text.
    #[must_use]
    pub fn document<I, S>(mut self, path: impl Into<String>, field: &str, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.documents.push(Document { path: path.into(), fields: BTreeMap::new() });
        self.field(field, tokens)
    }

    /// Add a field to the most recently added document.
    ///
    /// Does nothing if no document has been added.
    #[must_use]
    pub fn field<I, S>(mut self, field: &str, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(document) = self.documents.last_mut() {
            document
                .fields
                .entry(field.to_string())
                .or_default()
                .extend(tokens.into_iter().map(Into::into));
        }
        self
    }

    /// Add a document, splitting `text` on whitespace and lowercasing tokens.
    #[must_use]
    pub fn text(self, path: impl Into<String>, field: &str, text: &str) -> Self {
        self.document(path, field, text.split_whitespace().map(str::to_lowercase))
    }

    /// Index `field` without term positions.
    #[must_use]
    pub fn without_positions(mut self, field: &str) -> Self {
        self.unpositioned.insert(field.to_string());
        self
    }

    /// Build the inverted index.
    #[must_use]
    pub fn build(self) -> MemoryCorpus {
        let mut fields = BTreeSet::new();
        let mut postings: BTreeMap<Term, Vec<Posting>> = BTreeMap::new();

        for (doc, document) in self.documents.iter().enumerate() {
            for (field, tokens) in &document.fields {
                fields.insert(field.clone());
                let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
                for token in tokens {
                    *counts.entry(token.as_str()).or_default() += 1;
                }
                for (text, frequency) in counts {
                    postings.entry(Term::new(field.as_str(), text)).or_default().push(Posting {
                        doc,
                        frequency,
                    });
                }
            }
        }

        let Self { documents, unpositioned } = self;
        MemoryCorpus { documents, fields, unpositioned, postings }
    }
}
