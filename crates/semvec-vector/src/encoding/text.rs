//! Text store format.
//!
//! ```text
//! -dimensions|<n>[|binary[|sparse]|complex]
//! <id>|<c1>|<c2>|...|<cn>
//! ```
//!
//! Real components are printed with Rust's shortest round-trip float
//! formatting, complex components as `re|im` pairs and binary components as
//! one `0`/`1` per bit. In a sparse binary store a bit outside the support
//! mask is written `.`. Blank lines are ignored on read.

use std::io::{BufRead, Write};

use num_complex::Complex32;

use super::binary::DIMENSIONS_TOKEN;
use super::{
    ensure_finite, ensure_settled, sparse_binary, support_words, RecordLayout, StoreHeader,
};
use crate::error::VectorError;
use crate::types::{BinaryVector, ComplexVector, RealVector, Vector, VectorType};

const SEPARATOR: char = '|';

const SILENT_BIT: char = '.';

/// Streaming writer for the text format.
#[derive(Debug)]
pub struct TextStoreWriter<W: Write> {
    writer: W,
    header: StoreHeader,
    layout: RecordLayout,
    count: usize,
    line: String,
}

impl<W: Write> TextStoreWriter<W> {
    /// Wrap a writer and write the header line.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn new(writer: W, header: StoreHeader) -> Result<Self, VectorError> {
        Self::with_layout(writer, header, RecordLayout::Dense)
    }

    /// Wrap a writer and write a header line announcing `layout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout does not fit the header or the write
    /// fails.
    pub fn with_layout(
        mut writer: W,
        header: StoreHeader,
        layout: RecordLayout,
    ) -> Result<Self, VectorError> {
        layout.check(&header)?;
        let dimension = header.dimension;
        match (header.vector_type, layout) {
            (VectorType::Real, _) => writeln!(writer, "{DIMENSIONS_TOKEN}|{dimension}")?,
            (other, RecordLayout::Dense) => {
                writeln!(writer, "{DIMENSIONS_TOKEN}|{dimension}|{other}")?;
            }
            (other, RecordLayout::Sparse) => writeln!(
                writer,
                "{DIMENSIONS_TOKEN}|{dimension}|{other}|{}",
                RecordLayout::SPARSE_FLAG
            )?,
        }
        Ok(Self { writer, header, layout, count: 0, line: String::new() })
    }

    /// Append one line.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier contains `|` or a line break, the
    /// vector does not fit the header, or the write fails.
    pub fn write_vector(&mut self, id: &str, vector: &Vector) -> Result<(), VectorError> {
        use std::fmt::Write as _;

        if id.contains([SEPARATOR, '\n', '\r']) {
            return Err(VectorError::Format(format!(
                "identifier {id:?} cannot be written as text: contains '|' or a line break"
            )));
        }
        self.header.check(vector)?;
        ensure_settled(id, vector)?;
        ensure_finite(id, vector)?;

        self.line.clear();
        self.line.push_str(id);
        // Writing into a String cannot fail.
        match vector {
            Vector::Real(v) => {
                for x in v.iter() {
                    let _ = write!(self.line, "{SEPARATOR}{x}");
                }
            }
            Vector::Complex(v) => {
                for c in v.as_slice() {
                    let _ = write!(self.line, "{SEPARATOR}{}{SEPARATOR}{}", c.re, c.im);
                }
            }
            Vector::Binary(v) => {
                let support = match self.layout {
                    RecordLayout::Dense => None,
                    RecordLayout::Sparse => Some(support_words(v)),
                };
                for i in 0..v.dimension() {
                    let votes =
                        support.as_ref().map_or(true, |s| (s[i / 64] >> (i % 64)) & 1 == 1);
                    self.line.push(SEPARATOR);
                    self.line.push(match (votes, v.get_bit(i)) {
                        (false, _) => SILENT_BIT,
                        (true, true) => '1',
                        (true, false) => '0',
                    });
                }
            }
        }
        self.line.push('\n');
        self.writer.write_all(self.line.as_bytes())?;
        self.count += 1;
        Ok(())
    }

    /// Number of records written.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Flush and return the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn finish(mut self) -> Result<W, VectorError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Streaming reader for the text format.
#[derive(Debug)]
pub struct TextStoreReader<R: BufRead> {
    reader: R,
    header: StoreHeader,
    layout: RecordLayout,
    line: String,
    line_number: usize,
}

impl<R: BufRead> TextStoreReader<R> {
    /// Wrap a reader and parse the header line.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::Format`] if the header is missing or malformed.
    pub fn new(mut reader: R) -> Result<Self, VectorError> {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(VectorError::Format("empty store file".to_string()));
        }
        let (header, layout) = parse_header(line.trim_end_matches(['\n', '\r']))?;
        Ok(Self { reader, header, layout, line, line_number: 1 })
    }

    /// The header read from the input.
    #[must_use]
    pub fn header(&self) -> StoreHeader {
        self.header
    }

    /// The record layout announced by the header line.
    #[must_use]
    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Read the next record, or `None` at the end of input.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::Format`] for malformed lines.
    pub fn read_vector(&mut self) -> Result<Option<(String, Vector)>, VectorError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let record = self.line.trim_end_matches(['\n', '\r']);
            if record.trim().is_empty() {
                continue;
            }
            return parse_record(record, self.header, self.layout, self.line_number).map(Some);
        }
    }
}

impl<R: BufRead> Iterator for TextStoreReader<R> {
    type Item = Result<(String, Vector), VectorError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_vector().transpose()
    }
}

fn parse_header(line: &str) -> Result<(StoreHeader, RecordLayout), VectorError> {
    let bad = || VectorError::Format(format!("malformed header line: {line:?}"));

    let mut parts = line.split(SEPARATOR);
    if parts.next() != Some(DIMENSIONS_TOKEN) {
        return Err(bad());
    }
    let dimension = parts
        .next()
        .and_then(|d| d.trim().parse::<usize>().ok())
        .filter(|&d| d > 0)
        .ok_or_else(bad)?;
    let vector_type = match parts.next() {
        None => VectorType::Real,
        Some(name) => name.trim().parse().map_err(|_| bad())?,
    };
    let layout = match parts.next().map(str::trim) {
        None => RecordLayout::Dense,
        Some(RecordLayout::SPARSE_FLAG) if vector_type == VectorType::Binary => {
            RecordLayout::Sparse
        }
        Some(_) => return Err(bad()),
    };
    if parts.next().is_some() {
        return Err(bad());
    }
    Ok((StoreHeader::new(vector_type, dimension), layout))
}

fn parse_record(
    line: &str,
    header: StoreHeader,
    layout: RecordLayout,
    line_number: usize,
) -> Result<(String, Vector), VectorError> {
    let bad = |what: String| VectorError::Format(format!("line {line_number}: {what}"));

    let mut fields = line.split(SEPARATOR);
    let id = fields.next().unwrap_or_default().to_string();
    let values: Vec<&str> = fields.collect();

    let expected = match header.vector_type {
        VectorType::Complex => header.dimension * 2,
        VectorType::Real | VectorType::Binary => header.dimension,
    };
    if values.len() != expected {
        return Err(bad(format!("expected {expected} components, found {}", values.len())));
    }

    let parse_f32 = |s: &str| -> Result<f32, VectorError> {
        let value: f32 = s.trim().parse().map_err(|_| bad(format!("invalid number {s:?}")))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(bad(format!("non-finite component {s:?}")))
        }
    };

    let vector = match header.vector_type {
        VectorType::Real => {
            let data = values.iter().map(|s| parse_f32(s)).collect::<Result<Vec<_>, _>>()?;
            Vector::Real(RealVector::new(data)?)
        }
        VectorType::Complex => {
            let data = values
                .chunks_exact(2)
                .map(|pair| Ok(Complex32::new(parse_f32(pair[0])?, parse_f32(pair[1])?)))
                .collect::<Result<Vec<_>, VectorError>>()?;
            Vector::Complex(ComplexVector::new(data)?)
        }
        VectorType::Binary => {
            let mut words = vec![0u64; header.words()];
            let mut support = vec![0u64; header.words()];
            for (i, s) in values.iter().enumerate() {
                let bit = 1u64 << (i % 64);
                match s.trim() {
                    "1" => {
                        words[i / 64] |= bit;
                        support[i / 64] |= bit;
                    }
                    "0" => support[i / 64] |= bit,
                    "." if layout == RecordLayout::Sparse => {}
                    other => return Err(bad(format!("invalid bit {other:?}"))),
                }
            }
            let vector = match layout {
                RecordLayout::Dense => BinaryVector::new(words, header.dimension)?,
                RecordLayout::Sparse => sparse_binary(words, support, header.dimension)?,
            };
            Vector::Binary(vector)
        }
    };
    Ok((id, vector))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_all(header: StoreHeader, records: &[(&str, Vector)]) -> String {
        let mut writer = TextStoreWriter::new(Vec::new(), header).unwrap();
        for (id, v) in records {
            writer.write_vector(id, v).unwrap();
        }
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn real_layout() {
        let v = Vector::from(RealVector::new(vec![0.5, -1.0]).unwrap());
        let text = write_all(StoreHeader::new(VectorType::Real, 2), &[("apple", v)]);
        assert_eq!(text, "-dimensions|2\napple|0.5|-1\n");
    }

    #[test]
    fn binary_layout() {
        let v = Vector::from(BinaryVector::new(vec![0b101], 4).unwrap());
        let text = write_all(StoreHeader::new(VectorType::Binary, 4), &[("b", v.clone())]);
        assert_eq!(text, "-dimensions|4|binary\nb|1|0|1|0\n");

        let out: Vec<_> = TextStoreReader::new(text.as_bytes())
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(out, vec![("b".to_string(), v)]);
    }

    #[test]
    fn sparse_binary_marks_silent_bits() {
        let header = StoreHeader::new(VectorType::Binary, 4);
        let v = Vector::from(BinaryVector::sparse(4, &[0], &[3]).unwrap());
        let mut writer =
            TextStoreWriter::with_layout(Vec::new(), header, RecordLayout::Sparse).unwrap();
        writer.write_vector("e", &v).unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(text, "-dimensions|4|binary|sparse\ne|1|.|.|0\n");

        let mut reader = TextStoreReader::new(text.as_bytes()).unwrap();
        assert_eq!(reader.layout(), RecordLayout::Sparse);
        let (_, back) = reader.read_vector().unwrap().unwrap();
        assert_eq!(back, v);
        assert_eq!(back.polarity_counts(), (1, 1));

        let dense_text = "-dimensions|4|binary\nb|1|.|0|0\n";
        let mut dense = TextStoreReader::new(dense_text.as_bytes()).unwrap();
        assert!(matches!(dense.read_vector(), Err(VectorError::Format(_))));
        assert!(TextStoreReader::new("-dimensions|4|real|sparse\n".as_bytes()).is_err());
    }

    #[test]
    fn real_and_complex_roundtrip_exactly() {
        let real = Vector::from(RealVector::new(vec![0.1, 1.0 / 3.0, -7.25e-12]).unwrap());
        let text = write_all(StoreHeader::new(VectorType::Real, 3), &[("r", real.clone())]);
        let mut reader = TextStoreReader::new(text.as_bytes()).unwrap();
        assert_eq!(reader.read_vector().unwrap(), Some(("r".to_string(), real)));
        assert_eq!(reader.read_vector().unwrap(), None);

        let complex = Vector::from(
            ComplexVector::new(vec![Complex32::new(0.6, -0.8), Complex32::new(0.0, 1.0)]).unwrap(),
        );
        let text = write_all(StoreHeader::new(VectorType::Complex, 2), &[("c", complex.clone())]);
        let mut reader = TextStoreReader::new(text.as_bytes()).unwrap();
        assert_eq!(reader.header(), StoreHeader::new(VectorType::Complex, 2));
        assert_eq!(reader.read_vector().unwrap(), Some(("c".to_string(), complex)));
    }

    #[test]
    fn rejects_separator_in_identifier() {
        let header = StoreHeader::new(VectorType::Real, 1);
        let mut writer = TextStoreWriter::new(Vec::new(), header).unwrap();
        let v = Vector::zero(VectorType::Real, 1).unwrap();
        assert!(matches!(writer.write_vector("a|b", &v), Err(VectorError::Format(_))));
        assert!(matches!(writer.write_vector("a\nb", &v), Err(VectorError::Format(_))));
        assert_eq!(writer.count(), 0);
    }

    #[test]
    fn skips_blank_lines() {
        let text = "-dimensions|1\n\nx|2\n\r\ny|3\n";
        let ids: Vec<String> = TextStoreReader::new(text.as_bytes())
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn malformed_input() {
        assert!(TextStoreReader::new("dimensions|3\n".as_bytes()).is_err());
        assert!(TextStoreReader::new("-dimensions|zero\n".as_bytes()).is_err());
        assert!(TextStoreReader::new("".as_bytes()).is_err());

        let mut short = TextStoreReader::new("-dimensions|3\nx|1|2\n".as_bytes()).unwrap();
        assert!(matches!(short.read_vector(), Err(VectorError::Format(_))));

        let mut nan = TextStoreReader::new("-dimensions|1\nx|NaN\n".as_bytes()).unwrap();
        assert!(matches!(nan.read_vector(), Err(VectorError::Format(_))));
    }
}
