//! ENVI header text parsing.
//!
//! # Header Structure
//! ```text
//! ENVI
//! description = {Sample scene}
//! samples = 640
//! lines = 480
//! bands = 224
//! data type = 2
//! interleave = bil
//! band names = {band 1,
//!   band 2,
//!   ...}
//! ```
//!
//! The first line is the literal `ENVI` marker. Every following line is a
//! `key = value` pair; a value whose trimmed text starts with `{` is a list
//! that may span several physical lines and ends on the line whose trimmed
//! text ends with `}`. Lines with no `=` are skipped as comments.

use log::{debug, info, trace, warn};

use crate::envi::types::error::{EnviError, Result};
use crate::envi::types::models::{HeaderFields, HeaderValue};

/// List fields whose length must match the declared `bands` count.
const BAND_COUNTED_LISTS: [&str; 2] = ["band_names", "wavelength"];

/// Parses ENVI header text into a field mapping.
///
/// Parsing is a pure function of the input text: no I/O, no state. The
/// returned mapping preserves field order and is immutable.
///
/// # Errors
/// Returns [`EnviError::HeaderFormat`] when the text is empty, the first
/// line is not the literal `ENVI` marker, or a `{...}` list value is never
/// closed. Returns [`EnviError::HeaderConsistency`] when `bands` parses as
/// an integer and a `band_names` or `wavelength` list has a different
/// number of entries.
pub fn parse(text: &str) -> Result<HeaderFields> {
    info!("Parsing ENVI header ({} bytes)", text.len());

    if text.is_empty() {
        return Err(EnviError::HeaderFormat("header text is empty".to_string()));
    }

    let mut lines = text.lines();
    match lines.next() {
        Some("ENVI") => {}
        first => {
            return Err(EnviError::HeaderFormat(format!(
                "first line must be 'ENVI', got {:?}",
                first.unwrap_or("")
            )));
        }
    }

    let mut fields = HeaderFields::new();
    while let Some(line) = lines.next() {
        // A line with no '=' is a comment or blank, not an error.
        let Some(eq) = line.find('=') else {
            continue;
        };

        let key = HeaderFields::normalize_key(&line[..eq]);
        let value = line[eq + 1..].trim();

        // List detection looks at the first character only.
        if value.starts_with('{') {
            let items = parse_list(&key, value, &mut lines)?;
            trace!("header list '{}': {} entries", key, items.len());
            fields.insert(key, HeaderValue::List(items));
        } else {
            trace!("header field '{}' = '{}'", key, value);
            fields.insert(key, HeaderValue::Scalar(value.to_string()));
        }
    }

    check_band_counts(&fields)?;

    info!("Header parsed: {} fields", fields.len());
    Ok(fields)
}

/// Consumes a `{...}` list value, concatenating trimmed physical lines
/// until the closing brace, then splits the inner text on commas.
fn parse_list<'a>(
    key: &str,
    first: &str,
    lines: &mut impl Iterator<Item = &'a str>,
) -> Result<Vec<String>> {
    let mut buf = first.to_string();
    while !buf.ends_with('}') {
        let Some(next) = lines.next() else {
            return Err(EnviError::HeaderFormat(format!(
                "unterminated list value for '{}'",
                key
            )));
        };
        buf.push_str(next.trim());
    }

    let inner = &buf[1..buf.len() - 1];
    Ok(inner.split(',').map(|item| item.trim().to_string()).collect())
}

/// Validates that band-counted list fields agree with the declared `bands`.
fn check_band_counts(fields: &HeaderFields) -> Result<()> {
    let Some(bands_raw) = fields.get_scalar("bands") else {
        return Ok(());
    };
    let Ok(expected) = bands_raw.trim().parse::<u64>() else {
        // A non-integer band count is caught later, when a decode derives
        // the dimensions; the cross-check only applies to a parsed count.
        warn!("'bands' field is not an integer: '{}'", bands_raw);
        return Ok(());
    };

    for list_key in BAND_COUNTED_LISTS {
        if let Some(list) = fields.get_list(list_key) {
            let found = list.len() as u64;
            debug!(
                "band-count check: '{}' has {} entries, bands = {}",
                list_key, found, expected
            );
            if found != expected {
                return Err(EnviError::HeaderConsistency {
                    list_key,
                    expected,
                    found,
                });
            }
        }
    }
    Ok(())
}
