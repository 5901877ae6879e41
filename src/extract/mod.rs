//! Archive extraction driver
//!
//! Pulls entry records from the archive handle in order, decides each
//! entry's disposition (directory, file, or out of scope), and schedules
//! the matching filesystem operation. Directory creation runs unthrottled
//! (existence is a prerequisite for later writes, not a resource worth
//! serializing); file writes are funneled through the throttler one at a
//! time. The most recently scheduled operation is tracked in a single
//! join-handle slot: because the write queue is serial, that operation
//! cannot have settled until every earlier write settled, so joining it at
//! archive close is what makes overall completion well ordered.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::archive::{ArchiveHandle, EntryStream};
use crate::error::{Error, Result};
use crate::mode::mode_from_attributes;
use crate::options::ExtractOptions;
use crate::scope::scoped_path;
use crate::throttle::Throttler;


/// Concurrent file writes per extraction call
///
/// One at a time bounds open descriptors and disk write pressure no matter
/// how many entries the archive holds; the decoder still runs ahead and
/// enqueues.
const WRITE_CONCURRENCY: usize = 1;

/// Extract a ZIP archive onto the filesystem
///
/// Mirrors the archive's internal directory structure under `target_path`,
/// with the `source_path` prefix stripped when one is set. File permission
/// bits are derived from each entry's stored attributes; no other archive
/// metadata (timestamps, etc.) is reproduced.
///
/// # Arguments
/// * `archive_path` - Path to the ZIP archive
/// * `target_path` - Directory to extract into (created as needed)
/// * `options` - Overwrite and source-path scoping options
///
/// # Returns
/// * `Ok(())` - Every scheduled operation succeeded
/// * `Err(Error)` - `CorruptZip` for unparsable archives, or the first
///   filesystem error any scheduled operation hit
///
/// # Caveats
/// Entry names are not sanitized: an archive entry containing `..` segments
/// can write outside `target_path`. Do not extract untrusted archives into
/// sensitive locations. Partially written files are left in place when an
/// extraction fails mid-stream.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use zip_unpack::{ExtractOptions, extract};
///
/// # async fn example() -> zip_unpack::Result<()> {
/// extract(
///     Path::new("bundle.zip"),
///     Path::new("/tmp/bundle"),
///     &ExtractOptions::default(),
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn extract(
    archive_path: &Path,
    target_path: &Path,
    options: &ExtractOptions,
) -> Result<()> {
    extract_cancellable(archive_path, target_path, options, CancellationToken::new()).await
}

/// Extract a ZIP archive with an externally owned cancellation token
///
/// Behaves like [`extract`], and additionally observes `cancel`: once the
/// token fires, no further entries are scheduled, the in-flight write is
/// asked to stop at its next chunk boundary, the archive handle is closed,
/// and the call settles with [`Error::Cancelled`]. Work that already
/// completed is not rolled back. Cancelling after the call has settled has
/// no effect.
pub async fn extract_cancellable(
    archive_path: &Path,
    target_path: &Path,
    options: &ExtractOptions,
    cancel: CancellationToken,
) -> Result<()> {
    debug!(
        ?archive_path,
        ?target_path,
        overwrite = options.overwrite,
        source_path = options.source_path.as_deref().unwrap_or(""),
        "opening archive for extraction"
    );

    let handle = ArchiveHandle::open(archive_path).await?;

    if options.overwrite && fs::metadata(target_path).await.is_ok() {
        debug!(?target_path, "overwrite requested, removing target directory");
        fs::remove_dir_all(target_path).await?;
    }

    // first failure wins; the abort token only suppresses further
    // scheduling, it does not tear down work already in flight
    let failure = Arc::new(Mutex::new(None::<Error>));
    let abort = cancel.child_token();
    let throttler = Throttler::new(WRITE_CONCURRENCY, cancel.clone());

    let mut last_op: Option<JoinHandle<()>> = None;
    let mut scheduled = 0usize;

    loop {
        if abort.is_cancelled() {
            break;
        }
        let next = tokio::select! {
            _ = abort.cancelled() => break,
            next = handle.next_entry() => next,
        };
        let entry = match next {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(err) => {
                record_failure(&failure, &abort, err).await;
                break;
            }
        };

        let Some(relative) = scoped_path(&entry.name, options.source_path.as_deref()) else {
            debug!(entry = %entry.name, "entry outside source path, skipping");
            continue;
        };

        if entry.is_dir() {
            let dir = join_target(target_path, relative);
            let failure = Arc::clone(&failure);
            let abort = abort.clone();
            last_op = Some(tokio::spawn(async move {
                if let Err(err) = fs::create_dir_all(&dir).await {
                    record_failure(&failure, &abort, err.into()).await;
                }
            }));
        } else {
            let mode = mode_from_attributes(entry.external_attributes);
            let stream = match handle.open_entry_stream(entry.index).await {
                Ok(stream) => stream,
                Err(err) => {
                    record_failure(&failure, &abort, err).await;
                    break;
                }
            };

            debug!(entry = %entry.name, size = entry.size, mode, "queueing file write");
            let queued = throttler.queue(write_entry(
                stream,
                relative.to_string(),
                mode,
                target_path.to_path_buf(),
                cancel.clone(),
            ));
            let failure = Arc::clone(&failure);
            let abort = abort.clone();
            last_op = Some(tokio::spawn(async move {
                match queued.await {
                    Ok(Ok(())) | Ok(Err(Error::Cancelled)) | Err(Error::Cancelled) => {}
                    Ok(Err(err)) | Err(err) => record_failure(&failure, &abort, err).await,
                }
            }));
            scheduled += 1;
        }
    }

    // the last scheduled operation is authoritative for completion: the
    // serial write queue cannot have reached it before every earlier write
    // settled
    if let Some(op) = last_op {
        let _ = op.await;
    }
    drop(handle);

    if cancel.is_cancelled() {
        info!(?archive_path, "extraction cancelled");
        return Err(Error::Cancelled);
    }
    if let Some(err) = failure.lock().await.take() {
        warn!(?archive_path, error = %err, "extraction failed");
        return Err(err);
    }

    info!(?archive_path, ?target_path, scheduled, "extraction complete");
    Ok(())
}

/// Write one file entry: ensure its parent directory, open the sink with
/// the translated mode, and pipe the entry stream into it
async fn write_entry(
    mut stream: EntryStream,
    entry_name: String,
    mode: u32,
    target_path: PathBuf,
    cancel: CancellationToken,
) -> Result<()> {
    let file_path = join_target(&target_path, &entry_name);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut open_options = fs::OpenOptions::new();
    open_options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    open_options.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;
    let mut sink = open_options.open(&file_path).await?;

    loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => {
                // best-effort close; the cancellation outcome takes
                // precedence over anything the sink reports
                let _ = sink.shutdown().await;
                return Err(Error::Cancelled);
            }
            chunk = stream.next() => chunk,
        };
        match chunk {
            None => break,
            Some(Ok(bytes)) => sink.write_all(&bytes).await?,
            Some(Err(err)) => {
                let _ = sink.shutdown().await;
                return Err(err.into());
            }
        }
    }

    sink.flush().await?;
    Ok(())
}

/// Join an archive-relative path under the target directory
///
/// Entry names are `/`-separated; stripping a source-path prefix can leave
/// a leading separator, which must not re-anchor the join to the
/// filesystem root.
fn join_target(target_path: &Path, relative: &str) -> PathBuf {
    target_path.join(relative.trim_start_matches('/'))
}

async fn record_failure(failure: &Mutex<Option<Error>>, abort: &CancellationToken, err: Error) {
    let mut slot = failure.lock().await;
    if slot.is_none() {
        *slot = Some(err);
    }
    abort.cancel();
}
