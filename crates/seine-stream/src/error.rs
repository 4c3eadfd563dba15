//! Error type shared by split sequences and reconstructors.

use std::io;
use std::sync::Arc;

/// Errors surfaced by [`Sequence`](crate::Sequence),
/// [`Reconstructor`](crate::Reconstructor), and
/// [`BlindReconstructor`](crate::BlindReconstructor).
///
/// Validation and state errors (`StillRunning`, `ResubmitIndex`,
/// `UnknownChunk`, `Finished`, `UnprocessedChunks`) are local to the caller
/// and leave the component running. `ChecksumMismatch`, `DeadlineExceeded`,
/// and `Io` are terminal: the component finishes with that error and every
/// later submission fails with `Finished`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StreamError {
    /// The worker is still consuming its input; the requested value is not
    /// available yet.
    #[error("input stream still running")]
    StillRunning,

    /// An index was submitted to a blind reconstructor more than once.
    #[error("processed index submitted again")]
    ResubmitIndex,

    /// The submitted chunk's digest does not appear in the manifest.
    #[error("chunk not registered in metadata")]
    UnknownChunk,

    /// The reconstructor has already terminated.
    #[error("finished reconstructor")]
    Finished,

    /// A chunk's payload did not hash to its recorded digest.
    #[error("chunk checksum error")]
    ChecksumMismatch,

    /// A blind reconstructor was closed while chunks were still queued.
    #[error("there are unprocessed chunks in the queue")]
    UnprocessedChunks,

    /// The worker's deadline expired before the stream completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Reader or writer failure.
    #[error("io error: {0}")]
    Io(#[from] Arc<io::Error>),
}

impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
