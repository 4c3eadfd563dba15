//! Index-driven ordered reassembly without a manifest.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use seine_types::{Chunk, Sum224};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::StreamError;
use crate::progress::Progress;
use crate::reorder::ReorderBuffer;
use crate::WRITE_BUFFER_SIZE;

enum Signal {
    /// A chunk was queued for this index.
    Index(usize),
    /// Stop the worker; acknowledged once every earlier signal has been
    /// consumed.
    Close(oneshot::Sender<()>),
}

struct BlindState {
    buffer: ReorderBuffer,
    submitted: HashSet<usize>,
    progress: Progress,
}

/// Handle for reassembling a stream without metadata.
///
/// Chunks are submitted together with the index they occupy; a background
/// worker writes them to the sink in ascending index order. There is no
/// per-chunk verification: without a manifest, every chunk is trusted as
/// the authoritative content for its index, and integrity is the caller's
/// responsibility. The reconstructor has no notion of completeness either:
/// the caller ends it with [`close`](BlindReconstructor::close).
pub struct BlindReconstructor {
    signals: mpsc::UnboundedSender<Signal>,
    state: Arc<Mutex<BlindState>>,
}

impl BlindReconstructor {
    /// Submit the chunk occupying `index`.
    ///
    /// Fails with [`StreamError::ResubmitIndex`] when `index` was already
    /// accepted (even for identical content) and with
    /// [`StreamError::Finished`] once the reconstructor has terminated.
    /// Submitting the same content under different indices is permitted.
    pub fn submit(&self, chunk: Chunk, index: usize) -> Result<(), StreamError> {
        {
            let mut state = self.state.lock().expect("blind reconstructor lock poisoned");
            if state.submitted.contains(&index) {
                return Err(StreamError::ResubmitIndex);
            }
            if state.progress.finished() {
                return Err(StreamError::Finished);
            }
            state.submitted.insert(index);
            state.buffer.push(chunk, index);
        }

        let _ = self.signals.send(Signal::Index(index));
        Ok(())
    }

    /// Stop the reconstructor.
    ///
    /// The close signal is queued behind every prior submission, and this
    /// call waits only for the worker to take it, not for the flush that
    /// follows. Returns [`StreamError::UnprocessedChunks`] when chunks are
    /// still queued at that point, otherwise any error the worker stopped
    /// with earlier.
    pub async fn close(&self) -> Result<(), StreamError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.signals.send(Signal::Close(ack_tx)).is_ok() {
            // A dropped ack means the worker exited before taking the
            // signal; the state below is final either way.
            let _ = ack_rx.await;
        }

        let mut state = self.state.lock().expect("blind reconstructor lock poisoned");
        let error = if state.buffer.is_empty() {
            state.progress.error()
        } else {
            Some(StreamError::UnprocessedChunks)
        };
        state.progress.finish(error.clone());
        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// SHA-224 of everything written to the sink before the reconstructor
    /// stopped.
    ///
    /// Fails with [`StreamError::StillRunning`] until the reconstructor
    /// has finished.
    pub fn sum224(&self) -> Result<Sum224, StreamError> {
        let state = self.state.lock().expect("blind reconstructor lock poisoned");
        state.progress.sum224()
    }

    /// Whether the reconstructor has stopped, and the error it stopped
    /// with.
    ///
    /// The error is meaningful only when the first element is `true`.
    pub fn err(&self) -> (bool, Option<StreamError>) {
        let state = self.state.lock().expect("blind reconstructor lock poisoned");
        state.progress.status()
    }
}

/// Start reassembling a stream from caller-indexed chunks.
///
/// Every chunk submitted to the returned [`BlindReconstructor`], in any
/// order, is written to `writer` in ascending index order. The worker
/// owns `writer` and stops on [`close`](BlindReconstructor::close), a
/// write error, or when `timeout` expires; it flushes and shuts the sink
/// down on every exit path.
pub fn blind_reconstruct<W>(writer: W, timeout: Duration) -> BlindReconstructor
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    let (signal_tx, signal_rx) = mpsc::unbounded_channel();
    let state = Arc::new(Mutex::new(BlindState {
        buffer: ReorderBuffer::new(),
        submitted: HashSet::new(),
        progress: Progress::new(),
    }));

    let worker_state = Arc::clone(&state);
    tokio::spawn(run_worker(writer, signal_rx, worker_state, timeout));

    BlindReconstructor {
        signals: signal_tx,
        state,
    }
}

async fn run_worker<W>(
    writer: W,
    mut signals: mpsc::UnboundedReceiver<Signal>,
    state: Arc<Mutex<BlindState>>,
    timeout: Duration,
) where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, writer);
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    let mut next_index = 0;
    loop {
        let signal = tokio::select! {
            _ = &mut deadline => {
                finish(&state, Some(StreamError::DeadlineExceeded));
                break;
            }
            signal = signals.recv() => signal,
        };

        match signal {
            Some(Signal::Close(ack)) => {
                // close() marks the handle finished; only the flush is
                // left to do here.
                let _ = ack.send(());
                debug!(chunks = next_index, "blind reconstructor closed");
                break;
            }
            Some(Signal::Index(index)) if index == next_index => {
                while let Some(chunk) = pop_next(&state, next_index) {
                    if let Err(e) = write_chunk(&mut writer, &chunk, &state).await {
                        warn!(index = next_index, error = %e, "blind reconstruction stopped");
                        finish(&state, Some(e));
                        flush_and_close(writer).await;
                        return;
                    }
                    next_index += 1;
                }
            }
            Some(Signal::Index(_)) => {}
            None => {
                // Every handle is gone without a close; nothing more can
                // arrive. Wait out the deadline.
                deadline.as_mut().await;
                finish(&state, Some(StreamError::DeadlineExceeded));
                break;
            }
        }
    }

    flush_and_close(writer).await;
}

async fn write_chunk<W>(
    writer: &mut BufWriter<W>,
    chunk: &Chunk,
    state: &Mutex<BlindState>,
) -> Result<(), StreamError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(chunk.payload()).await?;
    let mut state = state.lock().expect("blind reconstructor lock poisoned");
    state.progress.update(chunk.payload());
    Ok(())
}

/// Take the buffered chunk for `index` if it is the smallest one pending.
fn pop_next(state: &Mutex<BlindState>, index: usize) -> Option<Chunk> {
    let mut state = state.lock().expect("blind reconstructor lock poisoned");
    state.buffer.pop_if_next(index)
}

fn finish(state: &Mutex<BlindState>, error: Option<StreamError>) {
    let mut state = state.lock().expect("blind reconstructor lock poisoned");
    state.progress.finish(error);
}

async fn flush_and_close<W>(mut writer: BufWriter<W>)
where
    W: AsyncWrite + Unpin,
{
    let _ = writer.flush().await;
    let _ = writer.shutdown().await;
}
