//! Custom error types for the envi-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum EnviError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The header text is structurally invalid (missing ENVI marker,
    /// unterminated list value, empty input).
    #[error("Invalid header: {0}")]
    HeaderFormat(String),

    /// A list field's length contradicts the declared band count.
    #[error("Header inconsistency: '{list_key}' has {found} entries, but the header declares {expected} bands")]
    HeaderConsistency {
        list_key: &'static str,
        expected: u64,
        found: u64,
    },

    /// One of `lines`, `samples`, `bands` is absent or not a positive integer.
    #[error("Missing or invalid image dimensions: {0}")]
    MissingDimensions(String),

    /// A requested band index falls outside `0..bands`.
    #[error("Band index {index} out of range for an image with {bands} bands")]
    ChannelOutOfRange { index: i64, bands: u64 },

    /// The `interleave` field is not one of the supported tokens
    /// (`bil`, `bip`, `bsq`).
    #[error("Unsupported interleave: '{0}'. Only bil, bip and bsq are supported.")]
    UnsupportedInterleave(String),

    /// The `data_type` field is absent, non-numeric, or an unknown code.
    #[error("Unsupported data type: '{0}'")]
    UnsupportedDataType(String),

    /// The data file's byte length contradicts the header geometry.
    #[error("Size mismatch for {context}: expected {expected} bytes, but found {found} bytes")]
    SizeMismatch {
        context: &'static str,
        expected: u64,
        found: u64,
    },

    /// Header and data file names violate the pairing convention
    /// (shared base name, `.hdr` vs `.bil`/`.biq`/`.bsq` extensions).
    #[error("File naming mismatch: {0}")]
    NamingMismatch(String),

    /// A mutex lock was poisoned, indicating a panic in another thread holding the lock.
    #[error("A mutex lock was poisoned, indicating a panic in another thread holding the lock.")]
    LockPoisoned,
}

/// A convenience `Result` type alias using the crate's `EnviError` type.
pub type Result<T> = std::result::Result<T, EnviError>;
