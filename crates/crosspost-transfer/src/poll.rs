//! Submit-then-poll transfer
//!
//! After a container/submission exchange returns a tracking id, the remote
//! service processes the media asynchronously. The poller queries its status
//! on a fixed interval until it reports ready, reports a terminal failure,
//! or the attempt budget runs out.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crosspost_core::{PublishConfig, PublishError};

/// Remote processing state reported by a status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    /// Still processing; keep polling.
    Pending,
    /// Processing finished; the media is live.
    Ready,
    /// The remote job failed permanently; polling further is pointless.
    Failed(String),
}

/// Status query against one tracking id. Implemented per platform.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    async fn status(&self, tracking_id: &str) -> Result<PublishStatus, PublishError>;
}

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollConfig {
    pub fn from_config(config: &PublishConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_attempts: config.poll_max_attempts,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 30,
        }
    }
}

/// Bounded status poller.
pub struct AsyncPublishPoller {
    config: PollConfig,
}

impl AsyncPublishPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Poll until the remote job is ready, returning the tracking id as the
    /// external object id.
    ///
    /// A failed query (transport error or undecodable body) is transient:
    /// it consumes one attempt and polling continues. Exhausting every
    /// attempt yields [`PublishError::TimedOut`]. Cancellation is observed
    /// at every poll-wait boundary.
    pub async fn wait_until_ready(
        &self,
        probe: &dyn StatusProbe,
        tracking_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PublishError> {
        for attempt in 1..=self.config.max_attempts {
            tokio::select! {
                _ = sleep(self.config.interval) => {}
                _ = cancel.cancelled() => return Err(PublishError::Cancelled),
            }

            match probe.status(tracking_id).await {
                Ok(PublishStatus::Ready) => {
                    tracing::info!(
                        tracking_id = %tracking_id,
                        attempt,
                        "Remote processing finished"
                    );
                    return Ok(tracking_id.to_string());
                }
                Ok(PublishStatus::Failed(reason)) => {
                    return Err(PublishError::RemoteProcessingFailed(reason));
                }
                Ok(PublishStatus::Pending) => {
                    tracing::debug!(
                        tracking_id = %tracking_id,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        "Still processing"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        tracking_id = %tracking_id,
                        attempt,
                        error = %err,
                        "Status query failed, will poll again"
                    );
                }
            }
        }

        Err(PublishError::TimedOut {
            attempts: self.config.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedProbe {
        calls: AtomicU32,
        script: Box<dyn Fn(u32) -> Result<PublishStatus, PublishError> + Send + Sync>,
    }

    impl ScriptedProbe {
        fn new(
            script: impl Fn(u32) -> Result<PublishStatus, PublishError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                calls: AtomicU32::new(0),
                script: Box::new(script),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusProbe for ScriptedProbe {
        async fn status(&self, _tracking_id: &str) -> Result<PublishStatus, PublishError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            (self.script)(call)
        }
    }

    fn quick_poller(max_attempts: u32) -> AsyncPublishPoller {
        AsyncPublishPoller::new(PollConfig {
            interval: Duration::from_millis(1),
            max_attempts,
        })
    }

    #[tokio::test]
    async fn test_exhausts_exactly_max_attempts_then_times_out() {
        let probe = ScriptedProbe::new(|_| Ok(PublishStatus::Pending));
        let cancel = CancellationToken::new();

        let err = quick_poller(30)
            .wait_until_ready(&probe, "media-1", &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::TimedOut { attempts: 30 }));
        assert_eq!(probe.calls(), 30);
    }

    #[tokio::test]
    async fn test_ready_stops_immediately() {
        let probe = ScriptedProbe::new(|call| {
            if call < 4 {
                Ok(PublishStatus::Pending)
            } else {
                Ok(PublishStatus::Ready)
            }
        });
        let cancel = CancellationToken::new();

        let id = quick_poller(30)
            .wait_until_ready(&probe, "media-1", &cancel)
            .await
            .unwrap();

        assert_eq!(id, "media-1");
        // No further queries once ready.
        assert_eq!(probe.calls(), 4);
    }

    #[tokio::test]
    async fn test_query_failures_consume_attempts_without_aborting() {
        let probe = ScriptedProbe::new(|call| match call {
            1 => Err(PublishError::Transport("connection reset".to_string())),
            2 => Err(PublishError::MalformedResponse("not json".to_string())),
            _ => Ok(PublishStatus::Ready),
        });
        let cancel = CancellationToken::new();

        let id = quick_poller(5)
            .wait_until_ready(&probe, "media-1", &cancel)
            .await
            .unwrap();

        assert_eq!(id, "media-1");
        assert_eq!(probe.calls(), 3);
    }

    #[tokio::test]
    async fn test_terminal_failure_aborts_early() {
        let probe = ScriptedProbe::new(|_| Ok(PublishStatus::Failed("codec rejected".to_string())));
        let cancel = CancellationToken::new();

        let err = quick_poller(30)
            .wait_until_ready(&probe, "media-1", &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::RemoteProcessingFailed(_)));
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_at_wait_boundary() {
        let probe = ScriptedProbe::new(|_| Ok(PublishStatus::Pending));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let poller = AsyncPublishPoller::new(PollConfig {
            interval: Duration::from_secs(60),
            max_attempts: 30,
        });
        let err = poller
            .wait_until_ready(&probe, "media-1", &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Cancelled));
        assert_eq!(probe.calls(), 0);
    }
}
