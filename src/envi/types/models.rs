//! Core data structures for ENVI format components.
//!
//! This module defines the fundamental types used throughout the library:
//! - The parsed header field mapping
//! - Image dimensions
//! - Interleave and data-type enumerations

use super::error::{EnviError, Result};

/// A single header value: a scalar string or a brace-delimited list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Scalar(String),
    List(Vec<String>),
}

impl HeaderValue {
    /// Returns the scalar text, or `None` for list values.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            HeaderValue::Scalar(s) => Some(s),
            HeaderValue::List(_) => None,
        }
    }

    /// Returns the list elements, or `None` for scalar values.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            HeaderValue::Scalar(_) => None,
            HeaderValue::List(items) => Some(items),
        }
    }
}

/// Ordered mapping of normalized header keys to values.
///
/// Keys are stored in the order they appear in the header text. Lookups
/// return the first occurrence of a key. The mapping is immutable once
/// produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderFields {
    entries: Vec<(String, HeaderValue)>,
}

impl HeaderFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes a raw header key: trim, lower-case, and replace the
    /// FIRST space with an underscore.
    ///
    /// Only the first space is replaced, so `"band names"` becomes
    /// `band_names` but `"sensor type name"` becomes `sensor_type name`.
    /// Known quirk of the format's common two-word keys; lookups such as
    /// `band_names` depend on it, so it is preserved exactly.
    pub fn normalize_key(raw: &str) -> String {
        raw.trim().to_lowercase().replacen(' ', "_", 1)
    }

    pub(crate) fn insert(&mut self, key: String, value: HeaderValue) {
        self.entries.push((key, value));
    }

    /// Looks up a value by its normalized key (first occurrence wins).
    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Looks up a scalar value; returns `None` if absent or a list.
    pub fn get_scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(HeaderValue::as_scalar)
    }

    /// Looks up a list value; returns `None` if absent or a scalar.
    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(HeaderValue::as_list)
    }

    /// Iterates over `(key, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Image geometry: the three required positive integer dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub lines: u64,
    pub samples: u64,
    pub bands: u64,
}

impl Dimensions {
    /// Derives the dimensions from a parsed header.
    ///
    /// # Errors
    /// Returns [`EnviError::MissingDimensions`] if any of `lines`,
    /// `samples`, `bands` is absent or not a positive integer.
    pub fn from_header(header: &HeaderFields) -> Result<Self> {
        Ok(Self {
            lines: required_dimension(header, "lines")?,
            samples: required_dimension(header, "samples")?,
            bands: required_dimension(header, "bands")?,
        })
    }

    /// Total number of sample elements in the file (`lines * samples * bands`).
    pub fn element_count(&self) -> Result<u64> {
        self.lines
            .checked_mul(self.samples)
            .and_then(|v| v.checked_mul(self.bands))
            .ok_or_else(|| {
                EnviError::MissingDimensions(
                    "dimension product overflows a 64-bit element count".to_string(),
                )
            })
    }
}

fn required_dimension(header: &HeaderFields, key: &str) -> Result<u64> {
    let raw = header.get_scalar(key).ok_or_else(|| {
        EnviError::MissingDimensions(format!("header field '{}' is missing", key))
    })?;
    let value: u64 = raw.trim().parse().map_err(|_| {
        EnviError::MissingDimensions(format!(
            "header field '{}' is not a positive integer: '{}'",
            key, raw
        ))
    })?;
    if value == 0 {
        return Err(EnviError::MissingDimensions(format!(
            "header field '{}' must be greater than zero",
            key
        )));
    }
    Ok(value)
}

/// On-disk sample ordering of the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interleave {
    /// Band-interleaved-by-line: each line holds one run of samples per band.
    Bil,
    /// Band-interleaved-by-pixel: all bands of a pixel are adjacent.
    Bip,
    /// Band-sequential: each band is a full contiguous plane.
    Bsq,
}

impl Interleave {
    /// Element strides `[line, sample, band]` of the on-disk layout.
    pub fn file_strides(&self, dims: &Dimensions) -> [u64; 3] {
        match self {
            Interleave::Bil => [dims.samples * dims.bands, 1, dims.samples],
            Interleave::Bip => [dims.samples * dims.bands, dims.bands, 1],
            Interleave::Bsq => [dims.samples, 1, dims.lines * dims.samples],
        }
    }
}

impl TryFrom<&str> for Interleave {
    type Error = EnviError;

    /// Matches the literal lower-case tokens only; `BIL` and friends are
    /// rejected, matching the format's case-sensitive convention.
    fn try_from(token: &str) -> Result<Self> {
        match token {
            "bil" => Ok(Self::Bil),
            "bip" => Ok(Self::Bip),
            "bsq" => Ok(Self::Bsq),
            _ => Err(EnviError::UnsupportedInterleave(token.to_string())),
        }
    }
}

impl std::fmt::Display for Interleave {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Interleave::Bil => write!(f, "bil"),
            Interleave::Bip => write!(f, "bip"),
            Interleave::Bsq => write!(f, "bsq"),
        }
    }
}

/// ENVI sample data types.
///
/// The numeric codes and byte widths are fixed by the format. Complex types
/// store a (real, imaginary) pair of the underlying float width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Unsigned 8-bit integer (code 1)
    UInt8,
    /// Signed 16-bit integer (code 2)
    Int16,
    /// Signed 32-bit integer (code 3)
    Int32,
    /// 32-bit floating point (code 4)
    Float32,
    /// 64-bit floating point (code 5)
    Float64,
    /// Complex pair of 32-bit floats (code 6)
    Complex32,
    /// Complex pair of 64-bit floats (code 9)
    Complex64,
    /// Unsigned 16-bit integer (code 12)
    UInt16,
    /// Unsigned 32-bit integer (code 13)
    UInt32,
    /// Signed 64-bit integer (code 14)
    Int64,
    /// Unsigned 64-bit integer (code 15)
    UInt64,
}

impl DataType {
    /// Parse from an ENVI data-type code.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::UInt8),
            2 => Ok(Self::Int16),
            3 => Ok(Self::Int32),
            4 => Ok(Self::Float32),
            5 => Ok(Self::Float64),
            6 => Ok(Self::Complex32),
            9 => Ok(Self::Complex64),
            12 => Ok(Self::UInt16),
            13 => Ok(Self::UInt32),
            14 => Ok(Self::Int64),
            15 => Ok(Self::UInt64),
            _ => Err(EnviError::UnsupportedDataType(code.to_string())),
        }
    }

    /// The numeric code as written in header files.
    pub const fn code(self) -> i64 {
        match self {
            Self::UInt8 => 1,
            Self::Int16 => 2,
            Self::Int32 => 3,
            Self::Float32 => 4,
            Self::Float64 => 5,
            Self::Complex32 => 6,
            Self::Complex64 => 9,
            Self::UInt16 => 12,
            Self::UInt32 => 13,
            Self::Int64 => 14,
            Self::UInt64 => 15,
        }
    }

    /// Size of each sample element in bytes.
    pub const fn byte_width(self) -> u64 {
        match self {
            Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 | Self::Complex32 => 8,
            Self::Complex64 => 16,
        }
    }

    /// Short display name.
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::UInt8 => "u8",
            Self::Int16 => "i16",
            Self::Int32 => "i32",
            Self::Float32 => "f32",
            Self::Float64 => "f64",
            Self::Complex32 => "c32",
            Self::Complex64 => "c64",
            Self::UInt16 => "u16",
            Self::UInt32 => "u32",
            Self::Int64 => "i64",
            Self::UInt64 => "u64",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}
