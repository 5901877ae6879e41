//! Error types for zip-unpack
//!
//! This module provides the error handling for the library, including:
//! - The [`Error`] enum covering archive parsing, filesystem, and
//!   cancellation failures
//! - The [`ExtractErrorKind`] classifier carried by archive-level errors
//! - Mapping of raw `zip` parser errors into typed errors with the original
//!   error preserved as the source for diagnostics

use thiserror::Error;
use zip::result::ZipError;

/// Result type alias for zip-unpack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for zip-unpack
#[derive(Debug, Error)]
pub enum Error {
    /// The archive could not be parsed as a ZIP container
    ///
    /// Raised when opening the archive or while scanning its entries. The
    /// raw parser error is preserved as the source.
    #[error("Corrupt ZIP: {source}")]
    CorruptZip {
        /// The underlying parser error
        source: ZipError,
    },

    /// No entry with the requested name exists in the archive
    #[error("{entry} not found inside zip")]
    EntryNotFound {
        /// The entry path that was requested
        entry: String,
    },

    /// The operation was cancelled before it completed
    #[error("operation cancelled")]
    Cancelled,

    /// I/O error from a filesystem collaborator (directory creation, sink
    /// write, permissions)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The background decoder worker terminated unexpectedly
    #[error("archive worker terminated unexpectedly")]
    WorkerGone,
}

/// Discriminant for archive-level extraction errors
///
/// Today every parser failure classifies as [`ExtractErrorKind::CorruptZip`];
/// [`ExtractErrorKind::Undefined`] is reserved for future discriminated
/// causes and is what non-archive errors report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractErrorKind {
    /// No specific classification
    Undefined,
    /// The archive failed to parse as a ZIP container
    CorruptZip,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ExtractErrorKind {
        match self {
            Error::CorruptZip { .. } => ExtractErrorKind::CorruptZip,
            _ => ExtractErrorKind::Undefined,
        }
    }

    /// Map a raw parser error to a typed extraction error
    ///
    /// Every parser error currently maps to [`Error::CorruptZip`]; the
    /// missing-end-of-central-directory case the classifier singles out is
    /// folded into the same kind until callers need to tell them apart.
    pub(crate) fn from_zip_error(source: ZipError) -> Self {
        Error::CorruptZip { source }
    }
}
