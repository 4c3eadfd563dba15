//! A slice of a split stream together with its SHA-224.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::sum::Sum224;

/// A single chunk of a split stream.
///
/// A chunk pairs an immutable byte payload with the SHA-224 digest it was
/// created with. The payload is reference-counted, so cloning a chunk is
/// cheap and never copies the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    payload: Bytes,
    sum: Sum224,
}

impl Chunk {
    /// Create a chunk from payload bytes, hashing them.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let sum = Sum224::from_data(&payload);
        Self { payload, sum }
    }

    /// Create a chunk carrying a caller-declared digest.
    ///
    /// The digest is not checked against the payload here. A chunk built
    /// this way (e.g. from payload and digest received separately over a
    /// network) is verified by the metadata-aware reconstructor during
    /// writeout.
    pub fn from_parts(payload: impl Into<Bytes>, sum: Sum224) -> Self {
        Self {
            payload: payload.into(),
            sum,
        }
    }

    /// Read `reader` to EOF and build a chunk from everything read.
    ///
    /// Read errors are returned verbatim.
    pub async fn from_reader<R>(mut reader: R) -> std::io::Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload).await?;
        Ok(Self::new(payload))
    }

    /// Read-only view of the payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Number of payload bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The digest recorded when the chunk was created.
    pub fn sum224(&self) -> Sum224 {
        self.sum
    }

    /// Bytewise comparison of `digest` against the recorded digest.
    pub fn is_sum(&self, digest: &[u8]) -> bool {
        self.sum.eq_bytes(digest)
    }
}
