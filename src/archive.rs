//! Pull-based handle over an opened ZIP archive
//!
//! The `zip` decoder is blocking, so the archive lives on the blocking
//! pool: a worker owns the [`zip::ZipArchive`] and serves requests from the
//! async side over a channel, delivering entry records strictly in
//! central-directory order and ending with a single terminal signal (`None`
//! on exhaustion, an error otherwise). Entry bytes flow through a bounded
//! channel, so a slow consumer applies backpressure to the decoder instead
//! of letting it buffer the archive in memory.
//!
//! Dropping the last handle (and any live entry stream) shuts the worker
//! down, which closes the archive's file descriptor.

use std::io::Read;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::{mpsc, oneshot};
use tokio::task;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;
use zip::ZipArchive;

use crate::error::{Error, Result};

/// Bytes per chunk pushed through an entry stream
const CHUNK_SIZE: usize = 64 * 1024;
/// Chunks buffered per entry stream before the decoder blocks; this is the
/// decoder's run-ahead budget over the consumer
const CHUNK_BUFFER: usize = 8;
/// Requests buffered toward the decoder worker
const REQUEST_BUFFER: usize = 16;

/// One archive record, produced in central-directory order
#[derive(Clone, Debug)]
pub(crate) struct ArchiveEntry {
    /// Position in the central directory, used to open the entry's stream
    pub index: usize,
    /// Archive-internal path, `/`-separated; directories end with `/`
    pub name: String,
    /// Raw platform-specific attribute word; Unix archives store the file
    /// mode in the high 16 bits, other origins may store nothing meaningful
    pub external_attributes: u32,
    /// Uncompressed size in bytes
    pub size: u64,
}

impl ArchiveEntry {
    pub(crate) fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}

enum ArchiveRequest {
    NextEntry {
        reply: oneshot::Sender<Result<Option<ArchiveEntry>>>,
    },
    OpenStream {
        index: usize,
        reply: oneshot::Sender<Result<mpsc::Receiver<std::io::Result<Vec<u8>>>>>,
    },
}

/// Handle over an opened ZIP archive
///
/// Clones share the same decoder worker; the worker exits and the archive
/// descriptor closes once every clone (and entry stream) is gone.
#[derive(Clone, Debug)]
pub(crate) struct ArchiveHandle {
    requests: mpsc::Sender<ArchiveRequest>,
}

impl ArchiveHandle {
    /// Open an archive and start its decoder worker
    pub(crate) async fn open(path: &Path) -> Result<Self> {
        let path = path.to_path_buf();
        let archive = task::spawn_blocking(move || -> Result<ZipArchive<std::fs::File>> {
            let file = std::fs::File::open(&path)?;
            ZipArchive::new(file).map_err(Error::from_zip_error)
        })
        .await
        .map_err(|_| Error::WorkerGone)??;

        debug!(entries = archive.len(), "opened archive");

        let (requests, request_rx) = mpsc::channel(REQUEST_BUFFER);
        task::spawn_blocking(move || decode_worker(archive, request_rx));

        Ok(Self { requests })
    }

    /// Next entry record, or `None` once the archive is exhausted
    pub(crate) async fn next_entry(&self) -> Result<Option<ArchiveEntry>> {
        let (reply, reply_rx) = oneshot::channel();
        self.requests
            .send(ArchiveRequest::NextEntry { reply })
            .await
            .map_err(|_| Error::WorkerGone)?;
        reply_rx.await.map_err(|_| Error::WorkerGone)?
    }

    /// Open the byte stream of the entry at `index`
    pub(crate) async fn open_entry_stream(&self, index: usize) -> Result<EntryStream> {
        let (reply, reply_rx) = oneshot::channel();
        self.requests
            .send(ArchiveRequest::OpenStream { index, reply })
            .await
            .map_err(|_| Error::WorkerGone)?;
        let chunks = reply_rx.await.map_err(|_| Error::WorkerGone)??;
        Ok(EntryStream {
            chunks: ReceiverStream::new(chunks),
            _handle: self.clone(),
        })
    }
}

/// Decompressed byte stream of a single archive entry
///
/// Yields chunks in order as the decoder produces them. The stream keeps
/// the archive open until it is dropped.
pub struct EntryStream {
    chunks: ReceiverStream<std::io::Result<Vec<u8>>>,
    _handle: ArchiveHandle,
}

impl Stream for EntryStream {
    type Item = std::io::Result<Vec<u8>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.chunks).poll_next(cx)
    }
}

impl std::fmt::Debug for EntryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStream").finish_non_exhaustive()
    }
}

fn decode_worker(
    mut archive: ZipArchive<std::fs::File>,
    mut requests: mpsc::Receiver<ArchiveRequest>,
) {
    let mut cursor = 0usize;
    while let Some(request) = requests.blocking_recv() {
        match request {
            ArchiveRequest::NextEntry { reply } => {
                let record = read_entry_record(&mut archive, &mut cursor);
                let _ = reply.send(record);
            }
            ArchiveRequest::OpenStream { index, reply } => {
                let mut entry = match archive.by_index(index) {
                    Ok(entry) => entry,
                    Err(err) => {
                        let _ = reply.send(Err(Error::from_zip_error(err)));
                        continue;
                    }
                };
                let (chunks, chunk_rx) = mpsc::channel(CHUNK_BUFFER);
                if reply.send(Ok(chunk_rx)).is_err() {
                    continue;
                }
                stream_entry(&mut entry, &chunks);
            }
        }
    }
    // dropping the archive here closes its descriptor
}

fn read_entry_record(
    archive: &mut ZipArchive<std::fs::File>,
    cursor: &mut usize,
) -> Result<Option<ArchiveEntry>> {
    if *cursor >= archive.len() {
        return Ok(None);
    }
    let entry = archive.by_index(*cursor).map_err(Error::from_zip_error)?;
    let record = ArchiveEntry {
        index: *cursor,
        name: entry.name().to_string(),
        external_attributes: entry.unix_mode().map_or(0, |mode| mode << 16),
        size: entry.size(),
    };
    *cursor += 1;
    Ok(Some(record))
}

fn stream_entry(
    entry: &mut zip::read::ZipFile<'_>,
    chunks: &mpsc::Sender<std::io::Result<Vec<u8>>>,
) {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        match entry.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                // a dropped receiver means the consumer is gone; stop decoding
                if chunks.blocking_send(Ok(buffer[..n].to_vec())).is_err() {
                    break;
                }
            }
            Err(err) => {
                let _ = chunks.blocking_send(Err(err));
                break;
            }
        }
    }
}
