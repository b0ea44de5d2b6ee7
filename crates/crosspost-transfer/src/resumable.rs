//! Chunked resumable upload session
//!
//! Drives sequential byte-range PUTs against an upload URL obtained from a
//! prior init exchange. The destination acknowledges every non-final chunk
//! with 206 Partial Content and the final chunk with 200 or 201; anything
//! else aborts the session. Chunk i+1 is never sent before chunk i is
//! acknowledged.

use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE};
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crosspost_core::PublishError;

use crate::chunk::{ChunkPlan, ChunkRange};
use crate::retry::RetryPolicy;
use crate::source::{read_full, MediaSource};

/// One chunked transfer against one upload URL.
///
/// The session assumes the source cursor is positioned at the start of the
/// first range and reads forward without seeking; the caller guarantees
/// gap-free sequential reads matching the plan.
pub struct ResumableUploadSession {
    client: reqwest::Client,
    upload_url: String,
    tracking_id: String,
    content_type: String,
    plan: ChunkPlan,
    retry: RetryPolicy,
}

impl ResumableUploadSession {
    pub fn new(
        client: reqwest::Client,
        upload_url: impl Into<String>,
        tracking_id: impl Into<String>,
        content_type: impl Into<String>,
        plan: ChunkPlan,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            upload_url: upload_url.into(),
            tracking_id: tracking_id.into(),
            content_type: content_type.into(),
            plan,
            retry,
        }
    }

    /// Transfer every planned chunk in order. On success returns the
    /// tracking id obtained at init time.
    pub async fn run(
        self,
        source: &mut (dyn MediaSource + '_),
        cancel: &CancellationToken,
    ) -> Result<String, PublishError> {
        let total = self.plan.total_size();
        let chunk_count = self.plan.chunk_count();

        for range in self.plan.ranges() {
            if cancel.is_cancelled() {
                return Err(PublishError::Cancelled);
            }

            let data = read_full(source, range.length).await?;
            let read = data.len() as u64;

            if read < range.length && !range.is_final {
                return Err(PublishError::TruncatedSource {
                    expected: range.length,
                    actual: read,
                });
            }
            if read == 0 && range.length > 0 {
                // Even the declared final chunk cannot be empty when the
                // plan promised bytes for it.
                return Err(PublishError::TruncatedSource {
                    expected: range.length,
                    actual: read,
                });
            }

            // The final chunk declares what was actually read; every other
            // chunk was verified complete above. A zero-length chunk (the
            // explicit empty-upload opt-in) has no satisfiable range.
            let content_range = if read == 0 {
                format!("bytes */{}", total)
            } else {
                format!("bytes {}-{}/{}", range.start, range.start + read - 1, total)
            };

            tracing::info!(
                tracking_id = %self.tracking_id,
                chunk = range.index + 1,
                chunks = chunk_count,
                content_range = %content_range,
                "Uploading chunk"
            );

            let label = format!("chunk {}/{}", range.index + 1, chunk_count);
            let (status, body) = self
                .retry
                .run(&label, cancel, || {
                    self.send_chunk(data.clone(), &content_range, cancel)
                })
                .await?;

            self.check_status(range, status, body)?;
        }

        tracing::info!(
            tracking_id = %self.tracking_id,
            chunks = chunk_count,
            "Chunked upload complete"
        );
        Ok(self.tracking_id)
    }

    async fn send_chunk(
        &self,
        data: Bytes,
        content_range: &str,
        cancel: &CancellationToken,
    ) -> Result<(StatusCode, String), PublishError> {
        let request = self
            .client
            .put(&self.upload_url)
            .header(CONTENT_TYPE, &self.content_type)
            .header(CONTENT_LENGTH, data.len())
            .header(CONTENT_RANGE, content_range)
            .body(data)
            .send();

        let response = tokio::select! {
            result = request => result.map_err(|e| PublishError::Transport(e.to_string()))?,
            _ = cancel.cancelled() => return Err(PublishError::Cancelled),
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }

    fn check_status(
        &self,
        range: &ChunkRange,
        status: StatusCode,
        body: String,
    ) -> Result<(), PublishError> {
        let accepted = if range.is_final {
            status == StatusCode::OK || status == StatusCode::CREATED
        } else {
            status == StatusCode::PARTIAL_CONTENT
        };

        if accepted {
            Ok(())
        } else {
            Err(PublishError::UnexpectedChunkStatus {
                index: range.index,
                status: status.as_u16(),
                body,
            })
        }
    }
}
