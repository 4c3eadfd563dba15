//! Reassembly metadata emitted by a successful split.

use serde::{Deserialize, Serialize};

use crate::sum::Sum224;

/// Everything required to reassemble a stream from its chunks.
///
/// The manifest's in-memory shape is fixed; callers choose their own wire
/// format when persisting or transmitting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// SHA-224 of the whole original stream.
    pub top_sum: Sum224,
    /// Per-chunk digests, position = chunk index.
    pub chunk_sums: Vec<Sum224>,
    /// Chunk width in bytes. Every chunk except possibly the last is
    /// exactly this wide; the last is at most this wide.
    pub width: u64,
}

impl Manifest {
    /// Number of chunks the original stream was split into.
    pub fn chunk_count(&self) -> usize {
        self.chunk_sums.len()
    }
}
