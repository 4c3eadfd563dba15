//! Splitting an input stream into fixed-width hashed chunks.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use seine_types::{Chunk, Manifest, Sum224};
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::StreamError;
use crate::progress::Progress;
use crate::READ_BUFFER_SIZE;

/// Smallest accepted worker deadline.
const MIN_TIMEOUT: Duration = Duration::from_millis(1);

struct SplitState {
    progress: Progress,
    chunk_sums: Vec<Sum224>,
}

/// Handle to a stream being split into chunks.
///
/// Returned by [`split_stream`]. A background worker consumes the reader;
/// chunks arrive in input order through [`next`](Sequence::next).
pub struct Sequence {
    chunks: mpsc::Receiver<Chunk>,
    state: Arc<Mutex<SplitState>>,
    width: u64,
}

impl Sequence {
    /// Wait for the next chunk.
    ///
    /// Returns `None` exactly once, after the worker has stopped and every
    /// buffered chunk has been drained. The worker publishes its finished
    /// flag before closing the queue, so [`err`](Sequence::err) may report
    /// the sequence finished while chunks are still buffered here.
    pub async fn next(&mut self) -> Option<Chunk> {
        self.chunks.recv().await
    }

    /// SHA-224 of the whole input stream.
    ///
    /// Fails with [`StreamError::StillRunning`] until the worker has
    /// finished consuming the reader.
    pub fn sum224(&self) -> Result<Sum224, StreamError> {
        let state = self.state.lock().expect("split state lock poisoned");
        state.progress.sum224()
    }

    /// The metadata required to reconstruct the original stream.
    ///
    /// Fails with [`StreamError::StillRunning`] until the worker has
    /// finished. The contents are meaningful only when the split completed
    /// without error.
    pub fn metadata(&self) -> Result<Manifest, StreamError> {
        let state = self.state.lock().expect("split state lock poisoned");
        let top_sum = state.progress.sum224()?;
        Ok(Manifest {
            top_sum,
            chunk_sums: state.chunk_sums.clone(),
            width: self.width,
        })
    }

    /// Whether the worker has stopped, and the error it stopped with.
    ///
    /// The error is meaningful only when the first element is `true`.
    pub fn err(&self) -> (bool, Option<StreamError>) {
        let state = self.state.lock().expect("split state lock poisoned");
        state.progress.status()
    }
}

/// Split `reader` into chunks of `width` bytes.
///
/// A background worker starts consuming `reader` immediately; the returned
/// [`Sequence`] yields chunks as they are produced, with at most
/// `queue_capacity` of them buffered (a capacity of 0 is treated as 1).
/// The worker stops at EOF, on a read error, or when `timeout` expires,
/// and the final chunk may be shorter than `width`.
///
/// Returns `None` when `width` is zero or `timeout` is below one
/// millisecond.
pub fn split_stream<R>(
    reader: R,
    width: u64,
    queue_capacity: usize,
    timeout: Duration,
) -> Option<Sequence>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    if width < 1 || timeout < MIN_TIMEOUT {
        return None;
    }

    let (tx, rx) = mpsc::channel(queue_capacity.max(1));
    let state = Arc::new(Mutex::new(SplitState {
        progress: Progress::new(),
        chunk_sums: Vec::new(),
    }));

    let worker_state = Arc::clone(&state);
    tokio::spawn(async move {
        let reader = BufReader::with_capacity(READ_BUFFER_SIZE, reader);
        let outcome =
            tokio::time::timeout(timeout, read_chunks(reader, width, &tx, &worker_state)).await;
        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(_) => Some(StreamError::DeadlineExceeded),
        };

        {
            let mut state = worker_state.lock().expect("split state lock poisoned");
            match &error {
                None => debug!(chunks = state.chunk_sums.len(), "split stream finished"),
                Some(e) => warn!(error = %e, "split stream stopped"),
            }
            state.progress.finish(error);
        }

        // Dropping the sender closes the queue only after the finished
        // flag is visible, so a `None` from `next` implies `err` reports
        // finished.
        drop(tx);
    });

    Some(Sequence { chunks: rx, state, width })
}

async fn read_chunks<R>(
    mut reader: R,
    width: u64,
    tx: &mpsc::Sender<Chunk>,
    state: &Mutex<SplitState>,
) -> Result<(), StreamError>
where
    R: AsyncRead + Unpin,
{
    loop {
        let mut buf = vec![0u8; width as usize];
        let mut filled = 0;

        // Read exactly `width` bytes, or until EOF.
        while filled < buf.len() {
            let n = reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(());
        }
        buf.truncate(filled);

        let chunk = Chunk::new(buf);
        {
            let mut state = state.lock().expect("split state lock poisoned");
            state.progress.update(chunk.payload());
            state.chunk_sums.push(chunk.sum224());
        }

        if tx.send(chunk).await.is_err() {
            // The sequence handle was dropped; nobody is reading.
            return Ok(());
        }
    }
}
