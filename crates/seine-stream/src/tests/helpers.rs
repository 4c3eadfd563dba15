//! Shared test utilities for seine-stream tests.

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use seine_types::{Chunk, Sum224};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};

/// The 133-byte reference input used across tests, split at width 30 into
/// five chunks (30, 30, 30, 30, 13).
pub const SAMPLE: &[u8] = b"Package bytes implements functions for the manipulation of byte slices. It is analogous to the facilities of the strings package.";

/// SHA-224 of [`SAMPLE`].
pub const SAMPLE_TOP: &str = "6bcc3cb34fce8aeddf37c797df54ea04fe8a35363904463050dbfd87";

/// Per-chunk SHA-224 digests of [`SAMPLE`] at width 30, in order.
pub const SAMPLE_CHUNK_SUMS: [&str; 5] = [
    "d0b4d664a97100ce9fd81a8ddd0051b80dfdbdcefb0d98a56231909d",
    "0a159b778546794379682eef59eb6cec6da039dc9222e4c65660f98e",
    "8203d16e9251e47c7ae59613d858a191f05b7b88efe2f37d0cae9eb5",
    "7e06a68ee69e1c1944045fe17d71b99bc0714ea930310ca0c323b096",
    "fcbd8149fb4c6fcb49770ae28e5720e2f7e74e7bc60989829ccf68d6",
];

/// SHA-224 of the empty input.
pub const EMPTY_TOP: &str = "d14a028c2a3a2bc9476102bb288234c415a2b01f828ea62ac5b3e42f";

/// A 21-byte payload used for repeated-chunk manifests.
pub const REPEATED: &[u8] = b"This is repeated data";

/// SHA-224 of [`REPEATED`].
pub const REPEATED_SUM: &str = "773b42e98a8b235ccccaf49d7dd41943cfb57638ded6ab08aef19f52";

/// SHA-224 of [`REPEATED`] concatenated three times.
pub const REPEATED_X3_TOP: &str = "478745e3d663ce49a06aa6a897f5369bc575f380a0a954459d48a517";

/// [`SAMPLE`] split at width 30 into its five chunks.
pub fn sample_chunks() -> Vec<Chunk> {
    SAMPLE.chunks(30).map(Chunk::new).collect()
}

/// The five [`SAMPLE_CHUNK_SUMS`] parsed into digests.
pub fn sample_sums() -> Vec<Sum224> {
    SAMPLE_CHUNK_SUMS
        .iter()
        .map(|hex| Sum224::from_hex(hex).unwrap())
        .collect()
}

/// Generate deterministic, non-repeating test data.
pub fn test_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = 0xDEAD_BEEF;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

/// Poll `f` every 10 ms until it returns true, panicking after ~2 s.
pub async fn wait_for(mut f: impl FnMut() -> bool) {
    for _ in 0..200 {
        if f() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}

/// Simulate a slow, endless input stream: drips a few bytes every 10 ms
/// until the reading side goes away.
pub fn slow_endless_reader() -> DuplexStream {
    let (rx, mut tx) = tokio::io::duplex(64);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if tx.write_all(b"beep beep").await.is_err() {
                return;
            }
        }
    });
    rx
}

/// Reader that always fails with "some error".
pub struct ErrReader;

impl AsyncRead for ErrReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::other("some error")))
    }
}

/// In-memory sink whose contents stay inspectable after the worker has
/// taken ownership of its clone.
#[derive(Clone, Default)]
pub struct MemorySink(Arc<Mutex<Vec<u8>>>);

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl AsyncWrite for MemorySink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Sink that always fails with "sink closed".
pub struct FailingSink;

impl AsyncWrite for FailingSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::other("sink closed")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::other("sink closed")))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
