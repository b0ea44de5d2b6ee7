//! Upload orchestration
//!
//! One job, one source stream, several platforms, strictly in the requested
//! order. The source has a single read cursor, so it is rewound and lent to
//! exactly one adapter at a time; failures are isolated per platform and a
//! job never fails as a whole.

use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crosspost_core::{
    CredentialStore, FileCredentialStore, JobResult, PublishConfig, PublishError, PublishRequest,
    UploadAttemptResult,
};
use crosspost_platforms::AdapterSet;
use crosspost_transfer::MediaSource;

pub struct Publisher {
    adapters: AdapterSet,
    credentials: Arc<dyn CredentialStore>,
}

impl Publisher {
    pub fn new(adapters: AdapterSet, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            adapters,
            credentials,
        }
    }

    /// Stock publisher: the three standard adapters plus the file-backed
    /// credential store from `config.credentials_dir`.
    pub fn from_config(config: &PublishConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            AdapterSet::standard(config)?,
            Arc::new(FileCredentialStore::new(config.credentials_dir.clone())),
        ))
    }

    /// Publish one job to every requested target, in order.
    ///
    /// Never fails as a whole: every per-platform error becomes that
    /// platform's attempt result. Cancelling `cancel` is job-scoped: the
    /// running attempt aborts as `Cancelled` and remaining targets are not
    /// attempted (and get no result entry). A cancelled attempt whose job
    /// token is still live (platform-scoped cancellation of the child
    /// token) is recorded and the job moves on.
    pub async fn run(
        &self,
        request: &PublishRequest,
        source: &mut (dyn MediaSource + '_),
        cancel: &CancellationToken,
    ) -> JobResult {
        let mut result = JobResult::new(request.id);

        tracing::info!(
            job_id = %request.id,
            targets = request.targets.len(),
            size = source.len(),
            "Starting publish job"
        );

        for target in &request.targets {
            let platform = target.platform;

            if cancel.is_cancelled() {
                tracing::info!(
                    job_id = %request.id,
                    platform = %platform,
                    "Job cancelled, remaining platforms not attempted"
                );
                break;
            }

            let attempt = self.attempt(request, target, source, cancel).await;

            match &attempt {
                Ok(external_id) => {
                    tracing::info!(
                        job_id = %request.id,
                        platform = %platform,
                        external_id = %external_id,
                        "Platform publish succeeded"
                    );
                    result.record(UploadAttemptResult::published(platform, external_id.clone()));
                }
                Err(err) => {
                    tracing::warn!(
                        job_id = %request.id,
                        platform = %platform,
                        error = %err,
                        "Platform publish failed"
                    );
                    result.record(UploadAttemptResult::failed(platform, err));
                }
            }
        }

        tracing::info!(
            job_id = %request.id,
            attempted = result.attempts.len(),
            succeeded = result.succeeded().count(),
            "Publish job finished"
        );
        result
    }

    async fn attempt(
        &self,
        request: &PublishRequest,
        target: &crosspost_core::PlatformTarget,
        source: &mut (dyn MediaSource + '_),
        cancel: &CancellationToken,
    ) -> Result<String, PublishError> {
        let platform = target.platform;

        let adapter = self.adapters.get(platform).ok_or_else(|| {
            PublishError::PreconditionFailed(format!("No adapter registered for {}", platform))
        })?;

        let token = self.credentials.token(platform).await?;
        if let Some(expired_at) = token.expires_at {
            if token.is_expired(Utc::now()) {
                return Err(PublishError::TokenExpired {
                    platform,
                    expired_at,
                });
            }
        }

        source
            .rewind()
            .await
            .map_err(|e| PublishError::SourcePreparationFailed(e.to_string()))?;

        // Each attempt observes a child of the job token: job-scoped
        // cancellation reaches the adapter, and a cancelled child alone
        // stays scoped to this platform.
        let attempt_cancel = cancel.child_token();
        adapter
            .publish(request, target, &token, source, &attempt_cancel)
            .await
    }
}
