//! State every component publishes under its mutex.

use seine_types::{Sum224, SUM224_LEN};
use sha2::{Digest, Sha224};

use crate::error::StreamError;

/// Rolling top hash, finish flag, and stored error.
///
/// Embedded in each component's mutex-guarded state. The worker advances
/// `top` as bytes pass through it and calls [`finish`](Progress::finish)
/// exactly once; handles read the digest and status through the same
/// mutex.
pub(crate) struct Progress {
    top: Sha224,
    finished: bool,
    error: Option<StreamError>,
}

impl Progress {
    pub(crate) fn new() -> Self {
        Self {
            top: Sha224::new(),
            finished: false,
            error: None,
        }
    }

    /// Feed written payload bytes into the rolling top hash.
    pub(crate) fn update(&mut self, data: &[u8]) {
        self.top.update(data);
    }

    /// Mark the component finished with `error` (`None` for success).
    pub(crate) fn finish(&mut self, error: Option<StreamError>) {
        self.error = error;
        self.finished = true;
    }

    pub(crate) fn finished(&self) -> bool {
        self.finished
    }

    /// Current digest of everything hashed so far.
    ///
    /// Fails with [`StreamError::StillRunning`] until the component has
    /// finished.
    pub(crate) fn sum224(&self) -> Result<Sum224, StreamError> {
        if !self.finished {
            return Err(StreamError::StillRunning);
        }
        let digest: [u8; SUM224_LEN] = self.top.clone().finalize().into();
        Ok(Sum224::from(digest))
    }

    /// `(finished, error)`; the error is meaningful only when finished.
    pub(crate) fn status(&self) -> (bool, Option<StreamError>) {
        (self.finished, self.error.clone())
    }

    /// The stored terminal error, if any.
    pub(crate) fn error(&self) -> Option<StreamError> {
        self.error.clone()
    }
}
