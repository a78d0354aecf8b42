//! Binary store format.
//!
//! All integers are big-endian. Strings are a variable-length byte count
//! (7 bits per byte, low-order group first, high bit set on every byte but
//! the last) followed by UTF-8 bytes.
//!
//! ```text
//! header: string("-dimensions" | "-dimensions|binary" | "-dimensions|complex"
//!                | "-dimensions|binary|sparse")
//!         i32 dimension
//! record: string(identifier)
//!         real:    dimension x u32 (f32 bit pattern)
//!         complex: dimension x (u32 re, u32 im)
//!         binary:  ceil(dimension / 64) x u64 words
//!                  sparse: then ceil(dimension / 64) x u64 support words
//! ```
//!
//! A clean end of input at a record boundary ends the store; end of input
//! anywhere else is a truncated record.

use std::io::{self, BufRead, Write};

use num_complex::Complex32;

use super::{
    ensure_finite, ensure_settled, sparse_binary, support_words, RecordLayout, StoreHeader,
};
use crate::error::VectorError;
use crate::types::{BinaryVector, ComplexVector, RealVector, Vector, VectorType};

/// Header token of a store.
pub const DIMENSIONS_TOKEN: &str = "-dimensions";

/// Longest identifier accepted on read (1MB).
const MAX_STRING_LEN: usize = 1024 * 1024;

fn header_token(vector_type: VectorType, layout: RecordLayout) -> String {
    match (vector_type, layout) {
        (VectorType::Real, _) => DIMENSIONS_TOKEN.to_string(),
        (other, RecordLayout::Dense) => format!("{DIMENSIONS_TOKEN}|{other}"),
        (other, RecordLayout::Sparse) => {
            format!("{DIMENSIONS_TOKEN}|{other}|{}", RecordLayout::SPARSE_FLAG)
        }
    }
}

fn parse_header_token(token: &str) -> Result<(VectorType, RecordLayout), VectorError> {
    let Some(rest) = token.strip_prefix(DIMENSIONS_TOKEN) else {
        return Err(VectorError::Format(format!(
            "missing {DIMENSIONS_TOKEN} header, found {token:?}"
        )));
    };
    if rest.is_empty() {
        return Ok((VectorType::Real, RecordLayout::Dense));
    }

    let unknown = || VectorError::Format(format!("unknown header token: {token}"));
    let mut parts = rest.strip_prefix('|').ok_or_else(unknown)?.split('|');
    let vector_type: VectorType =
        parts.next().and_then(|name| name.parse().ok()).ok_or_else(unknown)?;
    let layout = match parts.next() {
        None => RecordLayout::Dense,
        Some(RecordLayout::SPARSE_FLAG) if vector_type == VectorType::Binary => {
            RecordLayout::Sparse
        }
        Some(_) => return Err(unknown()),
    };
    if parts.next().is_some() {
        return Err(unknown());
    }
    Ok((vector_type, layout))
}

/// Write a variable-length non-negative integer.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn write_vint<W: Write + ?Sized>(writer: &mut W, mut value: u32) -> io::Result<()> {
    let mut buf = [0u8; 5];
    let mut len = 0;
    while value >= 0x80 {
        buf[len] = (value & 0x7F) as u8 | 0x80;
        value >>= 7;
        len += 1;
    }
    buf[len] = value as u8;
    writer.write_all(&buf[..=len])
}

/// Write a length-prefixed UTF-8 string.
///
/// # Errors
///
/// Returns an error if the string is longer than `u32::MAX` bytes or the write fails.
pub fn write_string<W: Write + ?Sized>(writer: &mut W, s: &str) -> io::Result<()> {
    let len = u32::try_from(s.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string too long"))?;
    write_vint(writer, len)?;
    writer.write_all(s.as_bytes())
}

fn truncated(what: &str) -> VectorError {
    VectorError::Format(format!("truncated record while reading {what}"))
}

fn read_exact<R: BufRead + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    what: &str,
) -> Result<(), VectorError> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(truncated(what)),
        Err(e) => Err(e.into()),
    }
}

/// Read a variable-length integer.
///
/// Returns `None` if the input ends before the first byte.
///
/// # Errors
///
/// Returns an error for an overlong encoding or input ending mid-integer.
pub fn read_vint<R: BufRead + ?Sized>(reader: &mut R) -> Result<Option<u32>, VectorError> {
    let mut value = 0u32;
    for i in 0..5 {
        let mut byte = [0u8; 1];
        match reader.read_exact(&mut byte) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && i == 0 => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(truncated("string length"))
            }
            Err(e) => return Err(e.into()),
        }
        value |= u32::from(byte[0] & 0x7F) << (7 * i);
        if byte[0] & 0x80 == 0 {
            return Ok(Some(value));
        }
    }
    Err(VectorError::Format("variable-length integer longer than 5 bytes".to_string()))
}

/// Read a length-prefixed UTF-8 string, or `None` at a clean end of input.
///
/// # Errors
///
/// Returns an error for invalid UTF-8, an implausible length or truncated input.
pub fn read_string<R: BufRead + ?Sized>(reader: &mut R) -> Result<Option<String>, VectorError> {
    let Some(len) = read_vint(reader)? else {
        return Ok(None);
    };
    let len = len as usize;
    if len > MAX_STRING_LEN {
        return Err(VectorError::Format(format!("invalid string length: {len}")));
    }

    let mut bytes = vec![0u8; len];
    read_exact(reader, &mut bytes, "identifier")?;
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| VectorError::Format(format!("identifier is not UTF-8: {e}")))
}

/// Streaming writer for the binary format.
#[derive(Debug)]
pub struct BinaryStoreWriter<W: Write> {
    writer: W,
    header: StoreHeader,
    layout: RecordLayout,
    count: usize,
}

impl<W: Write> BinaryStoreWriter<W> {
    /// Wrap a writer and write the header.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimension does not fit an `i32` or the write fails.
    pub fn new(writer: W, header: StoreHeader) -> Result<Self, VectorError> {
        Self::with_layout(writer, header, RecordLayout::Dense)
    }

    /// Wrap a writer and write a header announcing `layout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout does not fit the header, the dimension
    /// does not fit an `i32` or the write fails.
    pub fn with_layout(
        mut writer: W,
        header: StoreHeader,
        layout: RecordLayout,
    ) -> Result<Self, VectorError> {
        layout.check(&header)?;
        let dimension = i32::try_from(header.dimension).map_err(|_| {
            VectorError::InvalidParameter(format!("dimension {} too large", header.dimension))
        })?;
        write_string(&mut writer, &header_token(header.vector_type, layout))?;
        writer.write_all(&dimension.to_be_bytes())?;
        Ok(Self { writer, header, layout, count: 0 })
    }

    fn write_words(&mut self, words: &[u64]) -> Result<(), VectorError> {
        for word in words {
            self.writer.write_all(&word.to_be_bytes())?;
        }
        Ok(())
    }

    /// Append one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector does not fit the header, is an
    /// unnormalized binary accumulator or has non-finite components.
    pub fn write_vector(&mut self, id: &str, vector: &Vector) -> Result<(), VectorError> {
        self.header.check(vector)?;
        ensure_settled(id, vector)?;
        ensure_finite(id, vector)?;

        write_string(&mut self.writer, id)?;
        match vector {
            Vector::Real(v) => {
                for x in v.iter() {
                    self.writer.write_all(&x.to_bits().to_be_bytes())?;
                }
            }
            Vector::Complex(v) => {
                for c in v.as_slice() {
                    self.writer.write_all(&c.re.to_bits().to_be_bytes())?;
                    self.writer.write_all(&c.im.to_bits().to_be_bytes())?;
                }
            }
            Vector::Binary(v) => {
                self.write_words(v.data())?;
                if self.layout == RecordLayout::Sparse {
                    self.write_words(&support_words(v))?;
                }
            }
        }
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

/// Streaming reader for the binary format.
#[derive(Debug)]
pub struct BinaryStoreReader<R: BufRead> {
    reader: R,
    header: StoreHeader,
    layout: RecordLayout,
}

impl<R: BufRead> BinaryStoreReader<R> {
    /// Wrap a reader and read the header.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::Format`] if the header is missing or malformed.
    pub fn new(mut reader: R) -> Result<Self, VectorError> {
        let token = read_string(&mut reader)?
            .ok_or_else(|| VectorError::Format("empty store file".to_string()))?;
        let (vector_type, layout) = parse_header_token(&token)?;

        let mut dimension = [0u8; 4];
        read_exact(&mut reader, &mut dimension, "header dimension")?;
        let dimension = i32::from_be_bytes(dimension);
        let dimension = usize::try_from(dimension)
            .ok()
            .filter(|&d| d > 0)
            .ok_or_else(|| VectorError::Format(format!("invalid dimension: {dimension}")))?;

        Ok(Self { reader, header: StoreHeader::new(vector_type, dimension), layout })
    }

    /// The header read from the input.
    #[must_use]
    pub fn header(&self) -> StoreHeader {
        self.header
    }

    /// The record layout announced by the header.
    #[must_use]
    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    fn read_words(&mut self) -> Result<Vec<u64>, VectorError> {
        let mut words = Vec::with_capacity(self.header.words());
        for _ in 0..self.header.words() {
            let mut buf = [0u8; 8];
            read_exact(&mut self.reader, &mut buf, "vector components")?;
            words.push(u64::from_be_bytes(buf));
        }
        Ok(words)
    }

    fn read_u32(&mut self) -> Result<u32, VectorError> {
        let mut buf = [0u8; 4];
        read_exact(&mut self.reader, &mut buf, "vector components")?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_f32(&mut self) -> Result<f32, VectorError> {
        let value = f32::from_bits(self.read_u32()?);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(VectorError::Format(format!("non-finite component: {value}")))
        }
    }

    /// Read the next record, or `None` at a clean end of input.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::Format`] for truncated or malformed records.
    pub fn read_vector(&mut self) -> Result<Option<(String, Vector)>, VectorError> {
        let Some(id) = read_string(&mut self.reader)? else {
            return Ok(None);
        };

        let dimension = self.header.dimension;
        let vector = match self.header.vector_type {
            VectorType::Real => {
                let data = (0..dimension).map(|_| self.read_f32()).collect::<Result<Vec<_>, _>>()?;
                Vector::Real(RealVector::new(data)?)
            }
            VectorType::Complex => {
                let data = (0..dimension)
                    .map(|_| Ok(Complex32::new(self.read_f32()?, self.read_f32()?)))
                    .collect::<Result<Vec<_>, VectorError>>()?;
                Vector::Complex(ComplexVector::new(data)?)
            }
            VectorType::Binary => {
                let words = self.read_words()?;
                let vector = match self.layout {
                    RecordLayout::Dense => BinaryVector::new(words, dimension),
                    RecordLayout::Sparse => sparse_binary(words, self.read_words()?, dimension),
                }
                .map_err(|e| VectorError::Format(format!("vector '{id}': {e}")))?;
                Vector::Binary(vector)
            }
        };
        Ok(Some((id, vector)))
    }
}

impl<R: BufRead> Iterator for BinaryStoreReader<R> {
    type Item = Result<(String, Vector), VectorError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_vector().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(header: StoreHeader, records: &[(&str, Vector)]) -> Vec<(String, Vector)> {
        let mut writer = BinaryStoreWriter::new(Vec::new(), header).unwrap();
        for (id, v) in records {
            writer.write_vector(id, v).unwrap();
        }
        let bytes = writer.finish().unwrap();
        let reader = BinaryStoreReader::new(bytes.as_slice()).unwrap();
        assert_eq!(reader.header(), header);
        reader.collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn vint_encoding() {
        let mut buf = Vec::new();
        write_vint(&mut buf, 0).unwrap();
        write_vint(&mut buf, 127).unwrap();
        write_vint(&mut buf, 128).unwrap();
        write_vint(&mut buf, 16_384).unwrap();
        assert_eq!(buf, vec![0x00, 0x7F, 0x80, 0x01, 0x80, 0x80, 0x01]);

        let mut input = buf.as_slice();
        for expected in [0, 127, 128, 16_384] {
            assert_eq!(read_vint(&mut input).unwrap(), Some(expected));
        }
        assert_eq!(read_vint(&mut input).unwrap(), None);
    }

    #[test]
    fn real_header_layout() {
        let writer =
            BinaryStoreWriter::new(Vec::new(), StoreHeader::new(VectorType::Real, 200)).unwrap();
        let bytes = writer.finish().unwrap();

        let mut expected = vec![11u8];
        expected.extend_from_slice(b"-dimensions");
        expected.extend_from_slice(&200i32.to_be_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn real_record_is_bit_exact() {
        let v = Vector::from(RealVector::new(vec![0.1, -2.5, 1e-30]).unwrap());
        let out = roundtrip(StoreHeader::new(VectorType::Real, 3), &[("café", v.clone())]);
        assert_eq!(out, vec![("café".to_string(), v)]);
    }

    #[test]
    fn binary_and_complex_records() {
        let b = Vector::from(BinaryVector::new(vec![0xDEAD_BEEF, 0x1], 65).unwrap());
        let out = roundtrip(StoreHeader::new(VectorType::Binary, 65), &[("b", b.clone())]);
        assert_eq!(out[0].1, b);

        let c = Vector::from(
            ComplexVector::new(vec![Complex32::new(0.6, 0.8), Complex32::new(-1.0, 0.0)]).unwrap(),
        );
        let out = roundtrip(StoreHeader::new(VectorType::Complex, 2), &[("c", c.clone())]);
        assert_eq!(out[0].1, c);
    }

    #[test]
    fn sparse_records_keep_their_support() {
        let header = StoreHeader::new(VectorType::Binary, 128);
        let elemental = Vector::from(BinaryVector::sparse(128, &[3, 90], &[7, 64]).unwrap());
        let derived = Vector::from(BinaryVector::new(vec![0xF0, 0x1], 128).unwrap());

        let mut writer =
            BinaryStoreWriter::with_layout(Vec::new(), header, RecordLayout::Sparse).unwrap();
        writer.write_vector("e", &elemental).unwrap();
        writer.write_vector("d", &derived).unwrap();
        let bytes = writer.finish().unwrap();

        let mut token = Vec::new();
        write_string(&mut token, "-dimensions|binary|sparse").unwrap();
        assert!(bytes.starts_with(&token));

        let reader = BinaryStoreReader::new(bytes.as_slice()).unwrap();
        assert_eq!(reader.layout(), RecordLayout::Sparse);
        let out = reader.collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(out, vec![("e".to_string(), elemental.clone()), ("d".to_string(), derived)]);
        assert_eq!(out[0].1.polarity_counts(), (2, 2));
    }

    #[test]
    fn sparse_flag_needs_binary_vectors() {
        let mut bytes = Vec::new();
        write_string(&mut bytes, "-dimensions|complex|sparse").unwrap();
        bytes.extend_from_slice(&8i32.to_be_bytes());
        assert!(matches!(BinaryStoreReader::new(bytes.as_slice()), Err(VectorError::Format(_))));

        let header = StoreHeader::new(VectorType::Real, 8);
        assert!(matches!(
            BinaryStoreWriter::with_layout(Vec::new(), header, RecordLayout::Sparse),
            Err(VectorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn bit_outside_support_is_format_error() {
        let mut bytes = Vec::new();
        write_string(&mut bytes, "-dimensions|binary|sparse").unwrap();
        bytes.extend_from_slice(&64i32.to_be_bytes());
        write_string(&mut bytes, "x").unwrap();
        bytes.extend_from_slice(&0b11u64.to_be_bytes());
        bytes.extend_from_slice(&0b01u64.to_be_bytes());

        let mut reader = BinaryStoreReader::new(bytes.as_slice()).unwrap();
        assert!(matches!(reader.read_vector(), Err(VectorError::Format(_))));
    }

    #[test]
    fn rejects_accumulating_binary() {
        let header = StoreHeader::new(VectorType::Binary, 64);
        let mut writer = BinaryStoreWriter::new(Vec::new(), header).unwrap();
        let acc = Vector::zero(VectorType::Binary, 64).unwrap();
        assert!(matches!(writer.write_vector("x", &acc), Err(VectorError::Format(_))));
    }

    #[test]
    fn truncated_record_is_format_error() {
        let header = StoreHeader::new(VectorType::Real, 4);
        let mut writer = BinaryStoreWriter::new(Vec::new(), header).unwrap();
        writer.write_vector("t", &Vector::zero(VectorType::Real, 4).unwrap()).unwrap();
        let mut bytes = writer.finish().unwrap();
        bytes.truncate(bytes.len() - 3);

        let mut reader = BinaryStoreReader::new(bytes.as_slice()).unwrap();
        assert!(matches!(reader.read_vector(), Err(VectorError::Format(_))));
    }

    #[test]
    fn non_finite_component_is_format_error() {
        let mut bytes = Vec::new();
        write_string(&mut bytes, "-dimensions").unwrap();
        bytes.extend_from_slice(&1i32.to_be_bytes());
        write_string(&mut bytes, "nan").unwrap();
        bytes.extend_from_slice(&f32::NAN.to_bits().to_be_bytes());

        let mut reader = BinaryStoreReader::new(bytes.as_slice()).unwrap();
        assert!(matches!(reader.read_vector(), Err(VectorError::Format(_))));
    }

    #[test]
    fn bad_header() {
        let mut bytes = Vec::new();
        write_string(&mut bytes, "-dimensions|quaternion").unwrap();
        bytes.extend_from_slice(&8i32.to_be_bytes());
        assert!(matches!(BinaryStoreReader::new(bytes.as_slice()), Err(VectorError::Format(_))));

        let mut bytes = Vec::new();
        write_string(&mut bytes, "apple").unwrap();
        assert!(matches!(BinaryStoreReader::new(bytes.as_slice()), Err(VectorError::Format(_))));

        assert!(matches!(BinaryStoreReader::new(&b""[..]), Err(VectorError::Format(_))));
    }
}
