//! High-level access to an ENVI image pair.

use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::WINDOWS_1252;
use log::{debug, info};

use super::format::{header, layout};
use super::source::{ByteRangeReader, FileSource};
use super::types::error::{EnviError, Result};
use super::types::models::{DataType, Dimensions, HeaderFields, HeaderValue, Interleave};

/// Accepted data file extensions (without the dot).
const DATA_EXTENSIONS: [&str; 3] = ["bil", "biq", "bsq"];

/// An opened ENVI image: a parsed header plus a byte-range source over the
/// companion data file.
///
/// Construction is two-phase and eager: [`EnviImage::open`] validates the
/// file-naming convention, reads and parses the header, and opens the data
/// file before returning. After that the header mapping is immutable;
/// dimensions, interleave and data type are re-derived from it on every
/// decode rather than cached.
#[derive(Debug)]
pub struct EnviImage {
    header_path: PathBuf,
    data_path: PathBuf,
    header: HeaderFields,
    source: FileSource,
}

impl EnviImage {
    /// Opens an ENVI image from its header and data file paths.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file names violate the pairing convention (same base name,
    ///   `.hdr` vs `.bil`/`.biq`/`.bsq` extensions, case-insensitive)
    /// - Either file cannot be opened
    /// - The header text is malformed or internally inconsistent
    pub fn open(header_path: impl AsRef<Path>, data_path: impl AsRef<Path>) -> Result<Self> {
        let header_path = header_path.as_ref();
        let data_path = data_path.as_ref();
        info!(
            "Opening ENVI image: header={}, data={}",
            header_path.display(),
            data_path.display()
        );

        validate_naming(header_path, data_path)?;

        let raw = fs::read(header_path)?;
        // Headers are ASCII in practice, but band names in the wild carry
        // Latin-1 bytes; WINDOWS_1252 decodes any byte sequence.
        let (text, _, _) = WINDOWS_1252.decode(&raw);
        let header = header::parse(&text)?;

        let source = FileSource::open(data_path)?;
        debug!("ENVI image opened: {} header fields", header.len());

        Ok(Self {
            header_path: header_path.to_path_buf(),
            data_path: data_path.to_path_buf(),
            header,
            source,
        })
    }

    /// Locates the companion data file for a header path by probing the
    /// accepted extensions next to it.
    pub fn find_data_file(header_path: impl AsRef<Path>) -> Result<PathBuf> {
        let header_path = header_path.as_ref();
        for ext in DATA_EXTENSIONS {
            for candidate_ext in [ext.to_string(), ext.to_uppercase()] {
                let candidate = header_path.with_extension(&candidate_ext);
                if candidate.is_file() {
                    debug!("found data file: {}", candidate.display());
                    return Ok(candidate);
                }
            }
        }
        Err(EnviError::NamingMismatch(format!(
            "no companion data file (.bil/.biq/.bsq) found for '{}'",
            header_path.display()
        )))
    }

    /// The parsed header field mapping.
    pub fn header(&self) -> &HeaderFields {
        &self.header
    }

    pub fn header_path(&self) -> &Path {
        &self.header_path
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Image dimensions, derived from the header on each call.
    pub fn dimensions(&self) -> Result<Dimensions> {
        Dimensions::from_header(&self.header)
    }

    /// On-disk interleave, derived from the header on each call.
    pub fn interleave(&self) -> Result<Interleave> {
        Interleave::try_from(self.header.get_scalar("interleave").unwrap_or(""))
    }

    /// Sample data type, derived from the header on each call.
    pub fn data_type(&self) -> Result<DataType> {
        layout::data_type_of(&self.header)
    }

    /// Band name list, if the header declares one.
    pub fn band_names(&self) -> Option<&[String]> {
        self.header.get_list("band_names")
    }

    /// Wavelength list, if the header declares one. Values are passed
    /// through as opaque strings.
    pub fn wavelengths(&self) -> Option<&[String]> {
        self.header.get_list("wavelength")
    }

    /// The `description` field, joined to a single string if it is a list.
    pub fn description(&self) -> Option<String> {
        match self.header.get("description")? {
            HeaderValue::Scalar(s) => Some(s.clone()),
            HeaderValue::List(items) => Some(items.join(" ")),
        }
    }

    /// Extracts the requested channels into a contiguous buffer.
    ///
    /// Channel order in the request determines channel order in the output;
    /// duplicates are preserved as repeated output channels. See
    /// [`layout::extract`] for the output layout and failure modes.
    pub fn read_bands(&self, channels: &[i64]) -> Result<Vec<u8>> {
        let file_size = self.source.size()?;
        layout::extract(&self.header, file_size, channels, &self.source)
    }

    /// Convenience wrapper extracting a single channel.
    pub fn read_band(&self, channel: i64) -> Result<Vec<u8>> {
        self.read_bands(&[channel])
    }
}

/// Splits a file name into (base, last-4-characters).
fn split_name(name: &str) -> Option<(&str, &str)> {
    if name.len() < 4 {
        return None;
    }
    let split = name.len() - 4;
    if !name.is_char_boundary(split) {
        return None;
    }
    Some(name.split_at(split))
}

fn file_name_str(path: &Path) -> Result<&str> {
    path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
        EnviError::NamingMismatch(format!("'{}' has no usable file name", path.display()))
    })
}

/// Enforces the header/data pairing convention: both names agree on all
/// characters except the last 4, the header ends in `.hdr` and the data
/// file in `.bil`, `.biq` or `.bsq` (extensions case-insensitive).
fn validate_naming(header_path: &Path, data_path: &Path) -> Result<()> {
    let header_name = file_name_str(header_path)?;
    let data_name = file_name_str(data_path)?;

    let (header_base, header_ext) = split_name(header_name).ok_or_else(|| {
        EnviError::NamingMismatch(format!("header file name '{}' is too short", header_name))
    })?;
    let (data_base, data_ext) = split_name(data_name).ok_or_else(|| {
        EnviError::NamingMismatch(format!("data file name '{}' is too short", data_name))
    })?;

    if !header_ext.eq_ignore_ascii_case(".hdr") {
        return Err(EnviError::NamingMismatch(format!(
            "header file '{}' must use a .hdr extension",
            header_name
        )));
    }
    let data_ext_ok = DATA_EXTENSIONS
        .iter()
        .any(|ext| data_ext.eq_ignore_ascii_case(&format!(".{}", ext)));
    if !data_ext_ok {
        return Err(EnviError::NamingMismatch(format!(
            "data file '{}' must use a .bil, .biq or .bsq extension",
            data_name
        )));
    }
    if header_base != data_base {
        return Err(EnviError::NamingMismatch(format!(
            "header '{}' and data '{}' do not share a base name",
            header_name, data_name
        )));
    }
    Ok(())
}
