//! Core ENVI reader module.

pub mod format;
pub mod source;
pub mod types;

mod reader;

pub use reader::EnviImage;
pub use source::{ByteRangeReader, FileSource};
pub use types::error::{EnviError, Result};
pub use types::models::{DataType, Dimensions, HeaderFields, HeaderValue, Interleave};
