//! Per-platform attempt results and the aggregated job result

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Platform;
use crate::error::PublishError;

/// Terminal state of one platform attempt. Success carries the external
/// object id the platform assigned (video/post/reel id); failure carries a
/// stable code plus a human-readable message. Never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Published { external_id: String },
    Failed { code: String, message: String },
}

/// Immutable result of one platform attempt. Adapters return these as plain
/// values; nothing is mutated in place across code paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadAttemptResult {
    pub platform: Platform,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

impl UploadAttemptResult {
    pub fn published(platform: Platform, external_id: impl Into<String>) -> Self {
        Self {
            platform,
            outcome: AttemptOutcome::Published {
                external_id: external_id.into(),
            },
        }
    }

    pub fn failed(platform: Platform, error: &PublishError) -> Self {
        Self {
            platform,
            outcome: AttemptOutcome::Failed {
                code: error.code().to_string(),
                message: error.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Published { .. })
    }

    pub fn external_id(&self) -> Option<&str> {
        match &self.outcome {
            AttemptOutcome::Published { external_id } => Some(external_id),
            AttemptOutcome::Failed { .. } => None,
        }
    }
}

/// Aggregated outcome of one job, one entry per attempted platform in the
/// requested order. Partial success is a normal outcome, not a job failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: Uuid,
    pub attempts: Vec<UploadAttemptResult>,
}

impl JobResult {
    pub fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            attempts: Vec::new(),
        }
    }

    pub fn record(&mut self, attempt: UploadAttemptResult) {
        self.attempts.push(attempt);
    }

    pub fn get(&self, platform: Platform) -> Option<&UploadAttemptResult> {
        self.attempts.iter().find(|a| a.platform == platform)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &UploadAttemptResult> {
        self.attempts.iter().filter(|a| a.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &UploadAttemptResult> {
        self.attempts.iter().filter(|a| !a.is_success())
    }

    pub fn all_succeeded(&self) -> bool {
        !self.attempts.is_empty() && self.attempts.iter().all(|a| a.is_success())
    }
}
