//! # envi-reader
//!
//! A reader for ENVI remote-sensing raster images: a plain-text `.hdr`
//! header describing image geometry, paired with a raw binary data file in
//! one of three interleave conventions (BIL, BIP, BSQ).
//!
//! The library parses and validates the header, then extracts arbitrary
//! band subsets into a contiguous buffer using interleave-specific stride
//! arithmetic and partial-file reads. Sample bytes are copied verbatim;
//! the source file's byte order is preserved.
pub mod envi;

// Re-export the main types for convenience
pub use envi::{
    ByteRangeReader, DataType, Dimensions, EnviError, EnviImage, FileSource, HeaderFields,
    HeaderValue, Interleave, Result,
};
