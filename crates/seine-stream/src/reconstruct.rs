//! Metadata-driven ordered reassembly with per-chunk verification.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use seine_types::{Chunk, Sum224};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::StreamError;
use crate::progress::Progress;
use crate::reorder::ReorderBuffer;
use crate::WRITE_BUFFER_SIZE;

struct RecState {
    buffer: ReorderBuffer,
    submitted: HashSet<Sum224>,
    progress: Progress,
}

/// Handle for reassembling a stream whose chunk digests are known.
///
/// Chunks may be submitted in any order and from any task; a background
/// worker writes them to the sink strictly in manifest order, verifying
/// each payload against its recorded digest.
pub struct Reconstructor {
    signals: mpsc::UnboundedSender<usize>,
    indexes: HashMap<Sum224, Vec<usize>>,
    state: Arc<Mutex<RecState>>,
}

impl Reconstructor {
    /// Submit a chunk for reassembly.
    ///
    /// Fails with [`StreamError::UnknownChunk`] when the chunk's digest is
    /// not part of the manifest, and with [`StreamError::Finished`] once
    /// the reconstructor has terminated. Resubmitting an already accepted
    /// digest is a successful no-op, and one submission fills every
    /// manifest position carrying that digest.
    pub fn submit(&self, chunk: Chunk) -> Result<(), StreamError> {
        let sum = chunk.sum224();
        let indexes = match self.indexes.get(&sum) {
            Some(indexes) => indexes,
            None => return Err(StreamError::UnknownChunk),
        };

        {
            let mut state = self.state.lock().expect("reconstructor lock poisoned");
            if state.progress.finished() {
                return Err(StreamError::Finished);
            }
            if state.submitted.contains(&sum) {
                // Retried delivery of an accepted chunk; nothing to do.
                return Ok(());
            }
            state.submitted.insert(sum);
            for &index in indexes {
                state.buffer.push(chunk.clone(), index);
            }
        }

        // Wake the worker with the smallest affected index. The send fails
        // only when the worker has already exited, and then the finished
        // flag is (or is about to be) set.
        let _ = self.signals.send(indexes[0]);
        Ok(())
    }

    /// SHA-224 of everything written to the sink.
    ///
    /// Fails with [`StreamError::StillRunning`] until the reconstructor
    /// has finished.
    pub fn sum224(&self) -> Result<Sum224, StreamError> {
        let state = self.state.lock().expect("reconstructor lock poisoned");
        state.progress.sum224()
    }

    /// Whether the worker has stopped, and the error it stopped with.
    ///
    /// The error is meaningful only when the first element is `true`.
    pub fn err(&self) -> (bool, Option<StreamError>) {
        let state = self.state.lock().expect("reconstructor lock poisoned");
        state.progress.status()
    }
}

/// Start reassembling a stream with the given ordered chunk digests.
///
/// Every chunk submitted to the returned [`Reconstructor`], in any order,
/// is written to `writer` in manifest order. The worker owns `writer`,
/// flushes and shuts it down on successful completion, and stops early on
/// a checksum mismatch, a write error, or when `timeout` expires.
///
/// Returns `None` when `chunk_sums` is empty.
pub fn reconstruct<W>(
    writer: W,
    chunk_sums: Vec<Sum224>,
    timeout: Duration,
) -> Option<Reconstructor>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    if chunk_sums.is_empty() {
        return None;
    }

    let mut indexes: HashMap<Sum224, Vec<usize>> = HashMap::new();
    for (index, sum) in chunk_sums.iter().enumerate() {
        indexes.entry(*sum).or_default().push(index);
    }

    let (signal_tx, signal_rx) = mpsc::unbounded_channel();
    let state = Arc::new(Mutex::new(RecState {
        buffer: ReorderBuffer::new(),
        submitted: HashSet::new(),
        progress: Progress::new(),
    }));

    let total = chunk_sums.len();
    let worker_state = Arc::clone(&state);
    tokio::spawn(async move {
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, writer);
        let outcome = tokio::time::timeout(
            timeout,
            write_in_order(&mut writer, signal_rx, &worker_state, total),
        )
        .await;
        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(_) => Some(StreamError::DeadlineExceeded),
        };

        match &error {
            None => debug!(chunks = total, "reconstruction finished"),
            Some(e) => {
                warn!(error = %e, "reconstruction stopped");
                // The sink contents are undefined after a failure: close it
                // without flushing what remains buffered.
                let mut inner = writer.into_inner();
                let _ = inner.shutdown().await;
            }
        }

        let mut state = worker_state.lock().expect("reconstructor lock poisoned");
        state.progress.finish(error);
    });

    Some(Reconstructor {
        signals: signal_tx,
        indexes,
        state,
    })
}

async fn write_in_order<W>(
    writer: &mut BufWriter<W>,
    mut signals: mpsc::UnboundedReceiver<usize>,
    state: &Mutex<RecState>,
    total: usize,
) -> Result<(), StreamError>
where
    W: AsyncWrite + Unpin,
{
    let mut next_index = 0;
    while next_index < total {
        let index = match signals.recv().await {
            Some(index) => index,
            // Every handle is gone, so no submission can arrive anymore;
            // park until the deadline fires.
            None => return std::future::pending().await,
        };
        if index != next_index {
            continue;
        }

        while let Some(chunk) = pop_next(state, next_index) {
            writer.write_all(chunk.payload()).await?;

            {
                let mut state = state.lock().expect("reconstructor lock poisoned");
                state.progress.update(chunk.payload());
            }

            let actual = Sum224::from_data(chunk.payload());
            if !chunk.is_sum(actual.as_ref()) {
                warn!(index = next_index, sum = %chunk.sum224(), "chunk failed verification");
                return Err(StreamError::ChecksumMismatch);
            }
            next_index += 1;
        }
    }

    writer.flush().await?;
    writer.shutdown().await?;
    Ok(())
}

/// Take the buffered chunk for `index` if it is the smallest one pending.
fn pop_next(state: &Mutex<RecState>, index: usize) -> Option<Chunk> {
    let mut state = state.lock().expect("reconstructor lock poisoned");
    state.buffer.pop_if_next(index)
}
