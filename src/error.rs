use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::CatalogRef;

/// Errors raised while reading or writing map files and catalogs.
#[derive(Debug, Error)]
pub enum MapError {
    /// File I/O error
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File the operation was touching.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// JSON parse error in a catalog or config file
    #[error("JSON parse error in {}: {source}", path.display())]
    Json {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// The byte stream ended before a field could be read.
    #[error("map data truncated: needed {needed} bytes at offset {offset}")]
    Truncated {
        /// Bytes required by the field.
        needed: usize,
        /// Offset the field starts at.
        offset: usize,
    },

    /// The crop header is negative or does not fit the grid extent.
    #[error("invalid crop {width}x{height} at ({left}, {top})")]
    InvalidCrop {
        /// Stored crop left.
        left: i32,
        /// Stored crop top.
        top: i32,
        /// Stored crop width.
        width: i32,
        /// Stored crop height.
        height: i32,
    },

    /// A length-prefixed string was negative or not UTF-8.
    #[error("invalid string at offset {offset}")]
    InvalidString {
        /// Offset of the length prefix.
        offset: usize,
    },

    /// The placement count was negative.
    #[error("invalid placement count {0}")]
    InvalidCount(i32),

    /// Bytes remained after the last placement record.
    #[error("{count} unexpected trailing bytes after map data")]
    TrailingData {
        /// Number of unread bytes.
        count: usize,
    },

    /// A catalog reference id was malformed or points outside its catalog.
    #[error("invalid catalog reference '{0}'")]
    InvalidReference(String),
}

/// Errors raised while flattening nested instances.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// An instance contains itself, directly or through other instances.
    #[error("instance {reference} contains itself")]
    Cycle {
        /// The instance that was re-entered.
        reference: CatalogRef,
    },
}
