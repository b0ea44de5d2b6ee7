//! Chunk planning
//!
//! Pure byte-range arithmetic for chunked uploads. The destination service
//! validates the advertised chunk count against the ranges actually sent, so
//! planning must be deterministic: identical inputs produce identical plans.

use crosspost_core::PublishError;

/// One byte range of a chunked transfer.
///
/// `length` is stored instead of an inclusive end offset so the degenerate
/// zero-length chunk of an explicitly-permitted empty upload stays
/// representable; [`ChunkRange::end_inclusive`] derives the end offset for
/// `Content-Range` headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub index: usize,
    pub start: u64,
    pub length: u64,
    pub is_final: bool,
}

impl ChunkRange {
    /// Inclusive end offset. Meaningless for a zero-length range.
    pub fn end_inclusive(&self) -> u64 {
        self.start + self.length - 1
    }

    /// `Content-Range` declaration for this range out of `total` bytes,
    /// e.g. `bytes 0-9999999/50000123`.
    pub fn content_range_header(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end_inclusive(), total)
    }
}

/// Ordered, contiguous, non-overlapping ranges covering exactly
/// `[0, total_size)`. Every range but the last has `length == chunk_size`;
/// the last has length in `(0, chunk_size]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    total_size: u64,
    chunk_size: u64,
    ranges: Vec<ChunkRange>,
}

impl ChunkPlan {
    /// Plan a chunked transfer. Zero-length uploads are rejected here; a
    /// caller that really wants one must opt in via [`ChunkPlan::build_allow_empty`].
    pub fn build(total_size: u64, chunk_size: u64) -> Result<Self, PublishError> {
        if total_size == 0 || chunk_size == 0 {
            return Err(PublishError::InvalidSize {
                total_size,
                chunk_size,
            });
        }
        Ok(Self::plan(total_size, chunk_size))
    }

    /// Like [`ChunkPlan::build`] but a zero-length total yields exactly one
    /// zero-length final chunk instead of an error.
    pub fn build_allow_empty(total_size: u64, chunk_size: u64) -> Result<Self, PublishError> {
        if chunk_size == 0 {
            return Err(PublishError::InvalidSize {
                total_size,
                chunk_size,
            });
        }
        if total_size == 0 {
            return Ok(Self {
                total_size,
                chunk_size,
                ranges: vec![ChunkRange {
                    index: 0,
                    start: 0,
                    length: 0,
                    is_final: true,
                }],
            });
        }
        Ok(Self::plan(total_size, chunk_size))
    }

    fn plan(total_size: u64, chunk_size: u64) -> Self {
        // Ceiling division; truncating here under-counts whenever the total
        // is not an exact multiple of the chunk size.
        let count = total_size.div_ceil(chunk_size) as usize;

        let ranges = (0..count)
            .map(|index| {
                let start = index as u64 * chunk_size;
                let length = chunk_size.min(total_size - start);
                ChunkRange {
                    index,
                    start,
                    length,
                    is_final: index == count - 1,
                }
            })
            .collect();

        Self {
            total_size,
            chunk_size,
            ranges,
        }
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn chunk_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn ranges(&self) -> &[ChunkRange] {
        &self.ranges
    }
}
