//! Term filtering.

use serde::{Deserialize, Serialize};

use super::{CorpusError, CorpusIndex, Term};

/// Decides which index terms receive vectors.
///
/// A term passes if its field is listed, its collection frequency lies in
/// `min_frequency..=max_frequency`, it has at most `max_non_alphabet_chars`
/// non-alphabetic characters, and, with `filter_numbers`, it does not parse
/// as a number.
///
/// # Example
///
/// ```
/// use semvec::corpus::TermFilter;
///
/// let filter = TermFilter::new(vec!["contents".to_string()])
///     .with_min_frequency(2)
///     .with_max_non_alphabet_chars(Some(0));
///
/// assert!(filter.accepts_text("apple", 2));
/// assert!(!filter.accepts_text("apple", 1));
/// assert!(!filter.accepts_text("r2d2", 5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermFilter {
    /// Fields whose terms are considered.
    pub fields: Vec<String>,
    /// Smallest accepted collection frequency.
    pub min_frequency: u64,
    /// Largest accepted collection frequency.
    pub max_frequency: u64,
    /// Most non-alphabetic characters a term may contain; `None` for no limit.
    pub max_non_alphabet_chars: Option<usize>,
    /// Reject terms that parse as numbers.
    pub filter_numbers: bool,
}

impl TermFilter {
    /// Accept every term of `fields` made only of letters.
    #[must_use]
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            min_frequency: 0,
            max_frequency: u64::MAX,
            max_non_alphabet_chars: Some(0),
            filter_numbers: false,
        }
    }

    /// Set the minimum collection frequency (inclusive).
    #[must_use]
    pub const fn with_min_frequency(mut self, min_frequency: u64) -> Self {
        self.min_frequency = min_frequency;
        self
    }

    /// Set the maximum collection frequency (inclusive).
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

    /// Reject numeric terms.
    #[must_use]
    pub const fn with_filter_numbers(mut self, filter_numbers: bool) -> Self {
        self.filter_numbers = filter_numbers;
        self
    }

    /// Whether `field` is one of the filter's fields.
    #[must_use]
    pub fn covers_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    fn accepts_shape(&self, text: &str) -> bool {
        if let Some(limit) = self.max_non_alphabet_chars {
            if text.chars().filter(|c| !c.is_alphabetic()).count() > limit {
                return false;
            }
        }
        !(self.filter_numbers && text.trim().parse::<f64>().is_ok())
    }

    /// Check a term's text and collection frequency, ignoring its field.
    #[must_use]
    pub fn accepts_text(&self, text: &str, frequency: u64) -> bool {
        (self.min_frequency..=self.max_frequency).contains(&frequency) && self.accepts_shape(text)
    }

    /// Check a term of `corpus`.
    ///
    /// The collection frequency is only looked up for terms that pass the
    /// cheaper checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the term frequency cannot be read.
    pub fn accepts<C: CorpusIndex + ?Sized>(
        &self,
        corpus: &C,
        term: &Term,
    ) -> Result<bool, CorpusError> {
        if !self.covers_field(&term.field) || !self.accepts_shape(&term.text) {
            return Ok(false);
        }
        let frequency = corpus.term_frequency(term)?;
        Ok((self.min_frequency..=self.max_frequency).contains(&frequency))
    }
}

impl Default for TermFilter {
    fn default() -> Self {
        Self::new(vec!["contents".to_string()])
    }
}
