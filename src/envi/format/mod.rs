//! File format parsing layer for ENVI image pairs.
//!
//! - [`header`]: parses the plain-text `.hdr` file into a field mapping
//! - [`layout`]: extracts band subsets from the raw data file using
//!   interleave-specific stride arithmetic
//!
//! ```text
//! .hdr text ──header::parse()──▶ HeaderFields
//!                                    │
//! data file ──ByteRangeReader──▶ layout::extract() ──▶ band buffer
//! ```

pub mod header;
pub mod layout;
