//! Per-connection byte accumulator.
//!
//! Holds bytes read from the socket that have not yet been consumed as a
//! complete request. New data is appended at the tail and framed requests
//! are removed from the front, so at any time the buffer contains zero or
//! more complete requests followed by at most one partial request.
//!
//! Consuming a prefix does not release memory on its own. To keep a
//! long-lived connection from holding on to a large allocation after one
//! big request, the buffer is compacted into a fresh allocation once the
//! capacity dwarfs the live content.

use bytes::{Bytes, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Initial (and post-compaction) capacity.
pub const INITIAL_CAPACITY: usize = 4 * 1024;

/// Minimum spare room reserved before each socket read.
const READ_CHUNK: usize = 1024;

/// Live content below which an oversized buffer is compacted.
const COMPACT_THRESHOLD: usize = 1024;

/// Growable buffer owned by a single connection.
#[derive(Debug)]
pub struct Accumulator {
    buf: BytesMut,
}

impl Accumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Append bytes to the tail.
    #[cfg(test)]
    pub fn append(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Perform one read from `reader` into the tail.
    ///
    /// Returns the number of bytes read; `0` means the peer closed the
    /// stream. Cancel safe: if the future is dropped before completion no
    /// bytes are lost.
    pub async fn fill<R>(&mut self, reader: &mut R) -> io::Result<usize>
    where
        R: AsyncRead + Unpin,
    {
        self.buf.reserve(READ_CHUNK);
        reader.read_buf(&mut self.buf).await
    }

    /// Live content, oldest byte first.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Number of live bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if there are no live bytes.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Allocated capacity.
    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Remove the first `n` bytes and return them as an owned handle.
    ///
    /// The returned bytes share the allocation until dropped.
    ///
    /// # Panics
    /// Panics if `n` exceeds the number of live bytes.
    pub fn consume(&mut self, n: usize) -> Bytes {
        let consumed = self.buf.split_to(n).freeze();
        self.compact();
        consumed
    }

    /// Reallocate if the capacity is much larger than what is still live.
    fn compact(&mut self) {
        if self.buf.capacity() > INITIAL_CAPACITY && self.buf.len() < COMPACT_THRESHOLD {
            let mut fresh = BytesMut::with_capacity(INITIAL_CAPACITY);
            fresh.extend_from_slice(&self.buf);
            self.buf = fresh;
        }
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_consume() {
        let mut acc = Accumulator::new();
        assert!(acc.is_empty());

        acc.append(b"hello ");
        acc.append(b"world");
        assert_eq!(acc.as_slice(), b"hello world");
        assert_eq!(acc.len(), 11);

        acc.consume(6);
        assert_eq!(acc.as_slice(), b"world");

        acc.consume(5);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_consume_returns_prefix() {
        let mut acc = Accumulator::new();
        acc.append(b"firstsecond");

        let first = acc.consume(5);
        assert_eq!(&first[..], b"first");
        assert_eq!(acc.as_slice(), b"second");
    }

    #[test]
    fn test_compacts_after_large_request() {
        let mut acc = Accumulator::new();
        let big = vec![b'x'; 64 * 1024];
        acc.append(&big);
        acc.append(b"tail");
        assert!(acc.capacity() >= 64 * 1024);

        acc.consume(big.len());
        assert_eq!(acc.as_slice(), b"tail");
        assert!(acc.capacity() < 64 * 1024);
    }

    #[test]
    fn test_no_compaction_while_content_is_large() {
        let mut acc = Accumulator::new();
        let big = vec![b'y'; 16 * 1024];
        acc.append(&big);

        acc.consume(1024);
        assert_eq!(acc.len(), 15 * 1024);
        assert!(acc.as_slice().iter().all(|&b| b == b'y'));
    }

    #[tokio::test]
    async fn test_fill_from_reader() {
        let mut reader = tokio_test::io::Builder::new()
            .read(b"GET / ")
            .read(b"HTTP/1.1\r\n\r\n")
            .build();
        let mut acc = Accumulator::new();

        assert_eq!(acc.fill(&mut reader).await.unwrap(), 6);
        assert_eq!(acc.fill(&mut reader).await.unwrap(), 12);
        assert_eq!(acc.as_slice(), b"GET / HTTP/1.1\r\n\r\n");

        // Script exhausted: peer closed
        assert_eq!(acc.fill(&mut reader).await.unwrap(), 0);
    }
}
