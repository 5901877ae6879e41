//! Reading a single named entry out of an archive

use std::path::Path;

use futures::StreamExt;
use tracing::debug;

use crate::archive::{ArchiveHandle, EntryStream};
use crate::error::{Error, Result};

/// Open the byte stream of one named entry
///
/// Scans entries in archive order and yields the stream of the first entry
/// whose name matches `entry_path` exactly; the scan stops there. The
/// archive stays open as long as the returned stream is alive and closes
/// when it is dropped.
///
/// # Returns
/// * `Ok(EntryStream)` - The matched entry's decompressed byte stream
/// * `Err(Error::EntryNotFound)` - The archive closed without a match
/// * `Err(Error::CorruptZip)` - The archive failed to parse
pub async fn read_entry_stream(archive_path: &Path, entry_path: &str) -> Result<EntryStream> {
    let handle = ArchiveHandle::open(archive_path).await?;
    loop {
        match handle.next_entry().await? {
            Some(entry) if entry.name == entry_path => {
                debug!(?archive_path, entry = %entry_path, "matched entry");
                return handle.open_entry_stream(entry.index).await;
            }
            Some(_) => {}
            None => {
                return Err(Error::EntryNotFound {
                    entry: entry_path.to_string(),
                });
            }
        }
    }
}

/// Read one named entry fully into memory
///
/// Layers on [`read_entry_stream`], concatenating every chunk in arrival
/// order into one contiguous buffer. Fails if the underlying stream errors
/// before ending.
pub async fn read_entry_buffer(archive_path: &Path, entry_path: &str) -> Result<Vec<u8>> {
    let mut stream = read_entry_stream(archive_path, entry_path).await?;
    let mut buffer = Vec::new();
    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(buffer)
}
