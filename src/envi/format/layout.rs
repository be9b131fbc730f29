//! Interleave-aware extraction of band subsets from the raw data file.
//!
//! The data file is a 3-axis array indexed `(line, sample, band)` whose
//! physical element order depends on the interleave:
//!
//! ```text
//! interleave   line stride      sample stride   band stride   (elements)
//! bil          samples * bands  1               samples
//! bip          samples * bands  bands           1
//! bsq          samples          1               lines * samples
//! ```
//!
//! The output buffer always uses strides `[samples * K, 1, samples]` for
//! `(line, sample, channel)` over the K requested channels: each output
//! line holds one contiguous run of samples per requested channel, in
//! request order. Elements are copied verbatim, with no byte-order conversion.
//!
//! Each interleave gets its own copy routine because the cheap read
//! granularity differs. bil allows one contiguous line-run per band; bsq
//! one contiguous whole-plane read per band; bip permits nothing better
//! than single-element reads.

use log::{debug, trace};

use crate::envi::source::ByteRangeReader;
use crate::envi::types::error::{EnviError, Result};
use crate::envi::types::models::{DataType, Dimensions, HeaderFields, Interleave};

/// Extracts the requested channels into a freshly allocated buffer.
///
/// `channels` is an ordered selection of 0-based band indices; duplicates
/// are preserved as repeated output channels and the request order
/// determines the output order. The buffer holds exactly
/// `lines * samples * channels.len() * byte_width` bytes.
///
/// Validation happens in a fixed order before any byte is read:
/// dimensions, channel range, interleave, data type, file size.
///
/// # Errors
/// - [`EnviError::MissingDimensions`] if `lines`/`samples`/`bands` are absent
///   or non-numeric
/// - [`EnviError::ChannelOutOfRange`] for any index outside `0..bands`
/// - [`EnviError::UnsupportedInterleave`] / [`EnviError::UnsupportedDataType`]
///   for unknown tokens or codes
/// - [`EnviError::SizeMismatch`] if `file_size` is not exactly
///   `lines * samples * bands * byte_width`
/// - [`EnviError::Io`] propagated from the source
pub fn extract<R: ByteRangeReader + ?Sized>(
    header: &HeaderFields,
    file_size: u64,
    channels: &[i64],
    source: &R,
) -> Result<Vec<u8>> {
    let dims = Dimensions::from_header(header)?;

    for &index in channels {
        if index < 0 || index as u64 >= dims.bands {
            return Err(EnviError::ChannelOutOfRange {
                index,
                bands: dims.bands,
            });
        }
    }

    let token = header.get_scalar("interleave").unwrap_or("");
    let interleave = Interleave::try_from(token)?;
    let data_type = data_type_of(header)?;
    let width = data_type.byte_width();

    let elements = dims.element_count()?;
    let expected_bytes = elements.checked_mul(width).ok_or_else(|| {
        EnviError::MissingDimensions("image byte size overflows a 64-bit count".to_string())
    })?;
    if file_size % width != 0 || file_size / width != elements {
        return Err(EnviError::SizeMismatch {
            context: "image data",
            expected: expected_bytes,
            found: file_size,
        });
    }

    let out_bytes = dims
        .lines
        .checked_mul(dims.samples)
        .and_then(|v| v.checked_mul(channels.len() as u64))
        .and_then(|v| v.checked_mul(width))
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| {
            EnviError::MissingDimensions(
                "requested output size overflows the address space".to_string(),
            )
        })?;

    debug!(
        "Extracting {} channel(s): {}x{}x{} {}, {} ({} bytes/element), output {} bytes",
        channels.len(),
        dims.lines,
        dims.samples,
        dims.bands,
        interleave,
        data_type,
        width,
        out_bytes
    );

    let mut out = vec![0u8; out_bytes];
    match interleave {
        Interleave::Bil => extract_bil(&dims, channels, width, source, &mut out)?,
        Interleave::Bip => extract_bip(&dims, channels, width, source, &mut out)?,
        Interleave::Bsq => extract_bsq(&dims, channels, width, source, &mut out)?,
    }
    Ok(out)
}

/// Derives the data type from the header's `data_type` field.
pub fn data_type_of(header: &HeaderFields) -> Result<DataType> {
    let raw = header
        .get_scalar("data_type")
        .ok_or_else(|| EnviError::UnsupportedDataType("(missing)".to_string()))?;
    let code: i64 = raw
        .trim()
        .parse()
        .map_err(|_| EnviError::UnsupportedDataType(raw.to_string()))?;
    DataType::from_code(code)
}

/// Reads `start..end` and enforces the exact-length contract of the source.
fn read_exact_range<R: ByteRangeReader + ?Sized>(
    source: &R,
    start: u64,
    end: u64,
) -> Result<Vec<u8>> {
    let data = source.read_range(start, end)?;
    if data.len() as u64 != end - start {
        return Err(EnviError::SizeMismatch {
            context: "range read",
            expected: end - start,
            found: data.len() as u64,
        });
    }
    Ok(data)
}

/// bil: one contiguous run of `samples` elements per (line, channel).
fn extract_bil<R: ByteRangeReader + ?Sized>(
    dims: &Dimensions,
    channels: &[i64],
    width: u64,
    source: &R,
    out: &mut [u8],
) -> Result<()> {
    let Dimensions { lines, samples, bands } = *dims;
    let selected = channels.len() as u64;
    let run = (samples * width) as usize;

    for line in 0..lines {
        for (slot, &channel) in channels.iter().enumerate() {
            let src = (line * samples * bands + channel as u64 * samples) * width;
            trace!("bil read: line={} channel={} offset={}", line, channel, src);
            let data = read_exact_range(source, src, src + samples * width)?;
            let dst = ((line * samples * selected + slot as u64 * samples) * width) as usize;
            out[dst..dst + run].copy_from_slice(&data);
        }
    }
    Ok(())
}

/// bip: bands of a pixel are adjacent in the file, but only one of `bands`
/// channels is wanted per position, so every element is read on its own.
fn extract_bip<R: ByteRangeReader + ?Sized>(
    dims: &Dimensions,
    channels: &[i64],
    width: u64,
    source: &R,
    out: &mut [u8],
) -> Result<()> {
    let Dimensions { lines, samples, bands } = *dims;
    let selected = channels.len() as u64;
    let element = width as usize;

    for line in 0..lines {
        for (slot, &channel) in channels.iter().enumerate() {
            trace!("bip reads: line={} channel={}", line, channel);
            for sample in 0..samples {
                let src = (line * samples * bands + sample * bands + channel as u64) * width;
                let data = read_exact_range(source, src, src + width)?;
                let dst = ((line * samples * selected + slot as u64 * samples + sample) * width)
                    as usize;
                out[dst..dst + element].copy_from_slice(&data);
            }
        }
    }
    Ok(())
}

/// bsq: each band is a full contiguous plane of `lines * samples` elements,
/// read in one range request and scattered line-by-line.
fn extract_bsq<R: ByteRangeReader + ?Sized>(
    dims: &Dimensions,
    channels: &[i64],
    width: u64,
    source: &R,
    out: &mut [u8],
) -> Result<()> {
    let Dimensions { lines, samples, .. } = *dims;
    let selected = channels.len() as u64;
    let plane_bytes = lines * samples * width;
    let row = (samples * width) as usize;

    for (slot, &channel) in channels.iter().enumerate() {
        let src = channel as u64 * plane_bytes;
        trace!("bsq read: channel={} offset={} ({} bytes)", channel, src, plane_bytes);
        let plane = read_exact_range(source, src, src + plane_bytes)?;
        for line in 0..lines {
            let plane_off = (line * samples * width) as usize;
            let dst = ((line * samples * selected + slot as u64 * samples) * width) as usize;
            out[dst..dst + row].copy_from_slice(&plane[plane_off..plane_off + row]);
        }
    }
    Ok(())
}
