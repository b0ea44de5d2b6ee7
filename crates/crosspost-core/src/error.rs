//! Error types module
//!
//! All failures that can occur while publishing to a platform are unified
//! under the `PublishError` enum. The orchestrator converts every error into
//! the failing platform's attempt result; errors never cross platform
//! boundaries.

use crate::models::Platform;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Not authenticated with {platform}")]
    NotAuthenticated { platform: Platform },

    #[error("{platform} token expired at {expired_at}")]
    TokenExpired {
        platform: Platform,
        expired_at: DateTime<Utc>,
    },

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Invalid size: total {total_size} bytes, chunk {chunk_size} bytes")]
    InvalidSize { total_size: u64, chunk_size: u64 },

    #[error("Source ended early: expected {expected} bytes, read {actual}")]
    TruncatedSource { expected: u64, actual: u64 },

    #[error("Chunk {index} rejected with status {status}: {body}")]
    UnexpectedChunkStatus {
        index: usize,
        status: u16,
        body: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Timed out after {attempts} status checks")]
    TimedOut { attempts: u32 },

    #[error("Remote processing failed: {0}")]
    RemoteProcessingFailed(String),

    #[error("Failed to prepare source: {0}")]
    SourcePreparationFailed(String),

    #[error("Cancelled")]
    Cancelled,
}

impl PublishError {
    /// Whether a bounded retry may succeed. Only network-level failures
    /// qualify; protocol violations and precondition failures are final.
    pub fn is_transient(&self) -> bool {
        matches!(self, PublishError::Transport(_))
    }

    /// Stable machine-readable code for the display layer.
    pub fn code(&self) -> &'static str {
        match self {
            PublishError::NotAuthenticated { .. } => "NOT_AUTHENTICATED",
            PublishError::TokenExpired { .. } => "TOKEN_EXPIRED",
            PublishError::PreconditionFailed(_) => "PRECONDITION_FAILED",
            PublishError::InvalidSize { .. } => "INVALID_SIZE",
            PublishError::TruncatedSource { .. } => "TRUNCATED_SOURCE",
            PublishError::UnexpectedChunkStatus { .. } => "UNEXPECTED_CHUNK_STATUS",
            PublishError::Transport(_) => "TRANSPORT_ERROR",
            PublishError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            PublishError::Api { .. } => "API_ERROR",
            PublishError::TimedOut { .. } => "TIMED_OUT",
            PublishError::RemoteProcessingFailed(_) => "REMOTE_PROCESSING_FAILED",
            PublishError::SourcePreparationFailed(_) => "SOURCE_PREPARATION_FAILED",
            PublishError::Cancelled => "CANCELLED",
        }
    }
}

impl From<std::io::Error> for PublishError {
    fn from(err: std::io::Error) -> Self {
        PublishError::SourcePreparationFailed(err.to_string())
    }
}
