//! Streaming chunking and ordered reassembly.
//!
//! This crate provides:
//! - [`split_stream`]: cuts an async reader into fixed-width chunks, each
//!   hashed with SHA-224, delivered in order through a bounded queue while
//!   a background worker maintains the top digest and the manifest.
//! - [`reconstruct`]: reassembles a stream whose chunk digests are known,
//!   accepting out-of-order submissions and writing them to a sink in
//!   manifest order with per-chunk verification.
//! - [`blind_reconstruct`]: reassembles a stream from chunks tagged with
//!   caller-supplied indices, without a manifest and without verification;
//!   closed explicitly by the caller.
//!
//! Each component is a handle plus exactly one background worker task. The
//! worker owns the reader/writer; handles expose non-blocking status and
//! submission operations.

mod blind;
mod error;
mod progress;
mod reconstruct;
mod reorder;
mod split;

pub use blind::{blind_reconstruct, BlindReconstructor};
pub use error::StreamError;
pub use reconstruct::{reconstruct, Reconstructor};
pub use split::{split_stream, Sequence};

#[cfg(test)]
mod tests;

/// Read-side buffer placed in front of the input reader.
pub(crate) const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Write-side buffer placed in front of the output sink.
pub(crate) const WRITE_BUFFER_SIZE: usize = 1024 * 1024;
