//! Source stream abstraction
//!
//! A publishing job owns exactly one finite, rewindable source with a single
//! read cursor. The orchestrator lends it to one adapter at a time and
//! rewinds it between platform attempts; adapters only ever read forward.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Read granularity for forward reads; chunk buffers are assembled from
/// reads of at most this size.
const READ_BUF_SIZE: usize = 64 * 1024;

/// A finite, rewindable byte source with a known total length.
#[async_trait]
pub trait MediaSource: Send {
    /// Total length in bytes, known up front.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reset the read cursor to offset 0.
    async fn rewind(&mut self) -> std::io::Result<()>;

    /// Read up to `max` bytes from the cursor. An empty buffer means EOF.
    async fn read_chunk(&mut self, max: usize) -> std::io::Result<Bytes>;
}

/// Read exactly `length` bytes from the source, or as many as remain.
/// Returns a short buffer when the source ends early; the caller decides
/// whether that is fatal.
pub async fn read_full(
    source: &mut (dyn MediaSource + '_),
    length: u64,
) -> std::io::Result<Bytes> {
    let mut buf = BytesMut::with_capacity(length.min(READ_BUF_SIZE as u64 * 16) as usize);
    while (buf.len() as u64) < length {
        let remaining = length - buf.len() as u64;
        let chunk = source
            .read_chunk(remaining.min(READ_BUF_SIZE as u64) as usize)
            .await?;
        if chunk.is_empty() {
            break;
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

/// File-backed source.
pub struct FileSource {
    file: File,
    len: u64,
}

impl FileSource {
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::open(path).await?;
        let len = file.metadata().await?.len();
        Ok(Self { file, len })
    }
}

#[async_trait]
impl MediaSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    async fn rewind(&mut self) -> std::io::Result<()> {
        self.file.seek(SeekFrom::Start(0)).await?;
        Ok(())
    }

    async fn read_chunk(&mut self, max: usize) -> std::io::Result<Bytes> {
        let mut buf = vec![0u8; max];
        let n = self.file.read(&mut buf).await?;
        buf.truncate(n);
        Ok(buf.into())
    }
}

/// In-memory source, mainly for tests and small payloads.
pub struct MemorySource {
    data: Bytes,
    pos: usize,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }
}

#[async_trait]
impl MediaSource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    async fn rewind(&mut self) -> std::io::Result<()> {
        self.pos = 0;
        Ok(())
    }

    async fn read_chunk(&mut self, max: usize) -> std::io::Result<Bytes> {
        let end = (self.pos + max).min(self.data.len());
        let chunk = self.data.slice(self.pos..end);
        self.pos = end;
        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_memory_source_reads_and_rewinds() {
        let mut source = MemorySource::new(&b"hello world"[..]);
        assert_eq!(source.len(), 11);

        let first = source.read_chunk(5).await.unwrap();
        assert_eq!(&first[..], b"hello");

        let rest = source.read_chunk(100).await.unwrap();
        assert_eq!(&rest[..], b" world");

        let eof = source.read_chunk(10).await.unwrap();
        assert!(eof.is_empty());

        source.rewind().await.unwrap();
        let again = source.read_chunk(5).await.unwrap();
        assert_eq!(&again[..], b"hello");
    }

    #[tokio::test]
    async fn test_read_full_exact_and_short() {
        let mut source = MemorySource::new(&b"0123456789"[..]);
        let buf = read_full(&mut source, 4).await.unwrap();
        assert_eq!(&buf[..], b"0123");

        // Only 6 bytes remain; asking for 10 yields a short buffer.
        let short = read_full(&mut source, 10).await.unwrap();
        assert_eq!(short.len(), 6);
    }

    #[tokio::test]
    async fn test_file_source() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"file contents here").unwrap();

        let mut source = FileSource::open(tmp.path()).await.unwrap();
        assert_eq!(source.len(), 18);

        let all = read_full(&mut source, 18).await.unwrap();
        assert_eq!(&all[..], b"file contents here");

        source.rewind().await.unwrap();
        let prefix = read_full(&mut source, 4).await.unwrap();
        assert_eq!(&prefix[..], b"file");
    }
}
