//! # zip-unpack
//!
//! Async ZIP extraction library with serialized disk writes and cooperative
//! cancellation.
//!
//! ## Design Philosophy
//!
//! zip-unpack is designed to be:
//! - **Bounded** - At most one file write is in flight per extraction, no
//!   matter how many entries the archive holds
//! - **Cancellable** - Extraction observes a cancellation token at every
//!   suspension point and releases the archive handle and write sink
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Streaming** - Entry bytes flow through bounded channels; the decoder
//!   never buffers an archive in memory
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use zip_unpack::{ExtractOptions, extract, read_entry_buffer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Extract an archive, scoped to its lib/ subtree
//!     let options = ExtractOptions {
//!         overwrite: true,
//!         source_path: Some("lib/".to_string()),
//!     };
//!     extract(Path::new("bundle.zip"), Path::new("/tmp/bundle"), &options).await?;
//!
//!     // Read one entry straight into memory
//!     let manifest = read_entry_buffer(Path::new("bundle.zip"), "manifest.json").await?;
//!     println!("{}", String::from_utf8_lossy(&manifest));
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Error types
pub mod error;
/// Extraction options
pub mod options;

mod archive;
mod extract;
mod mode;
mod read;
mod scope;
mod throttle;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod test_util;

// Re-export commonly used types
pub use archive::EntryStream;
pub use error::{Error, ExtractErrorKind, Result};
pub use extract::{extract, extract_cancellable};
pub use options::ExtractOptions;
pub use read::{read_entry_buffer, read_entry_stream};
