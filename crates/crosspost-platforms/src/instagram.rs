//! Instagram adapter: submit-then-poll
//!
//! Reels are published through the Graph API's asynchronous container flow:
//! create a media container, then poll its status until the remote
//! processing pipeline reports FINISHED. The container id is the external
//! object id.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crosspost_core::{
    AccessToken, Platform, PlatformTarget, PublishConfig, PublishError, PublishRequest,
};
use crosspost_transfer::{AsyncPublishPoller, MediaSource, PollConfig, PublishStatus, StatusProbe};

use crate::adapter::PlatformAdapter;
use crate::http::{bearer_get, bearer_json_post, build_client};

const DEFAULT_BASE_URL: &str = "https://graph.instagram.com";
const GRAPH_VERSION: &str = "v22.0";
const SPOOL_BUF_SIZE: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct MediaResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status_code: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

pub struct InstagramAdapter {
    client: reqwest::Client,
    base_url: String,
    poll: PollConfig,
}

impl InstagramAdapter {
    pub fn new(config: &PublishConfig) -> anyhow::Result<Self> {
        Ok(Self {
            // Container creation and status queries are both small metadata
            // exchanges; the short timeout applies to everything here.
            client: build_client(config.init_timeout())?,
            base_url: DEFAULT_BASE_URL.to_string(),
            poll: PollConfig::from_config(config),
        })
    }

    /// Point the adapter at a different API host (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the polling cadence (tests).
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Spool the source into a temp file and hand back its locator for the
    /// container submission. The file must outlive the poll phase: the
    /// remote pipeline fetches the media while the container is processing.
    async fn spool_source(
        &self,
        source: &mut (dyn MediaSource + '_),
    ) -> Result<tempfile::NamedTempFile, PublishError> {
        let spool = tempfile::Builder::new()
            .prefix("instagram_upload_")
            .suffix(".mp4")
            .tempfile()
            .map_err(|e| PublishError::SourcePreparationFailed(e.to_string()))?;

        let mut file = tokio::fs::File::create(spool.path())
            .await
            .map_err(|e| PublishError::SourcePreparationFailed(e.to_string()))?;

        loop {
            let chunk = source.read_chunk(SPOOL_BUF_SIZE).await?;
            if chunk.is_empty() {
                break;
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| PublishError::SourcePreparationFailed(e.to_string()))?;
        }
        file.flush()
            .await
            .map_err(|e| PublishError::SourcePreparationFailed(e.to_string()))?;

        Ok(spool)
    }

    async fn create_container(
        &self,
        caption: &str,
        video_url: &str,
        token: &AccessToken,
        cancel: &CancellationToken,
    ) -> Result<String, PublishError> {
        let url = format!("{}/{}/me/media", self.base_url, GRAPH_VERSION);
        let body = json!({
            "media_type": "REELS",
            "video_url": video_url,
            "caption": caption,
        });

        let (status, text) =
            bearer_json_post(&self.client, &url, &token.secret, &body, cancel).await?;

        if !status.is_success() {
            return Err(PublishError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let parsed: MediaResponse =
            serde_json::from_str(&text).map_err(|e| PublishError::MalformedResponse(e.to_string()))?;

        if parsed.id.is_empty() {
            return Err(PublishError::MalformedResponse(
                "container response carried no media id".to_string(),
            ));
        }

        Ok(parsed.id)
    }
}

/// Status query against one media container.
struct ContainerStatusProbe {
    client: reqwest::Client,
    base_url: String,
    token: String,
    cancel: CancellationToken,
}

#[async_trait]
impl StatusProbe for ContainerStatusProbe {
    async fn status(&self, tracking_id: &str) -> Result<PublishStatus, PublishError> {
        let url = format!(
            "{}/{}/{}?fields=status_code,status",
            self.base_url, GRAPH_VERSION, tracking_id
        );

        let (status, text) = bearer_get(&self.client, &url, &self.token, &self.cancel).await?;
        if !status.is_success() {
            return Err(PublishError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let parsed: MediaResponse =
            serde_json::from_str(&text).map_err(|e| PublishError::MalformedResponse(e.to_string()))?;

        let code = parsed.status_code.or(parsed.status).unwrap_or_default();
        match code.as_str() {
            "FINISHED" => Ok(PublishStatus::Ready),
            "ERROR" | "EXPIRED" => Ok(PublishStatus::Failed(format!(
                "container reported {}",
                code
            ))),
            _ => Ok(PublishStatus::Pending),
        }
    }
}

#[async_trait]
impl PlatformAdapter for InstagramAdapter {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn publish(
        &self,
        request: &PublishRequest,
        target: &PlatformTarget,
        token: &AccessToken,
        source: &mut (dyn MediaSource + '_),
        cancel: &CancellationToken,
    ) -> Result<String, PublishError> {
        if source.is_empty() {
            return Err(PublishError::PreconditionFailed(
                "Cannot upload empty file".to_string(),
            ));
        }

        let caption = request.caption_for(target);

        let spool = self.spool_source(source).await?;
        let video_url = spool.path().display().to_string();

        tracing::info!(
            job_id = %request.id,
            spool = %video_url,
            "Creating Instagram media container"
        );

        let container_id = self
            .create_container(caption, &video_url, token, cancel)
            .await?;

        tracing::info!(
            job_id = %request.id,
            container_id = %container_id,
            "Container created, polling for readiness"
        );

        let probe = ContainerStatusProbe {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: token.secret.clone(),
            cancel: cancel.clone(),
        };

        let poller = AsyncPublishPoller::new(self.poll);
        let id = poller
            .wait_until_ready(&probe, &container_id, cancel)
            .await?;

        drop(spool);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_transfer::MemorySource;
    use std::time::Duration;

    fn adapter(server_url: &str, max_attempts: u32) -> InstagramAdapter {
        InstagramAdapter::new(&PublishConfig::default())
            .unwrap()
            .with_base_url(server_url)
            .with_poll_config(PollConfig {
                interval: Duration::from_millis(1),
                max_attempts,
            })
    }

    fn request() -> PublishRequest {
        PublishRequest::new(
            "clip.mp4",
            "video/mp4",
            "a reel caption",
            vec![PlatformTarget::new(Platform::Instagram)],
        )
    }

    fn token() -> AccessToken {
        AccessToken::new("ig.token")
    }

    #[tokio::test]
    async fn test_container_then_finished() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/v22.0/me/media")
            .match_header("authorization", "Bearer ig.token")
            .match_body(mockito::Matcher::PartialJson(json!({
                "media_type": "REELS",
                "caption": "a reel caption",
            })))
            .with_status(200)
            .with_body(json!({"id": "17890123"}).to_string())
            .create_async()
            .await;
        let status = server
            .mock("GET", "/v22.0/17890123")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(json!({"id": "17890123", "status_code": "FINISHED"}).to_string())
            .create_async()
            .await;

        let request = request();
        let target = &request.targets[0];
        let mut source = MemorySource::new(vec![3u8; 100]);
        let cancel = CancellationToken::new();

        let id = adapter(&server.url(), 5)
            .publish(&request, target, &token(), &mut source, &cancel)
            .await
            .unwrap();

        assert_eq!(id, "17890123");
        create.assert_async().await;
        status.assert_async().await;
    }

    #[tokio::test]
    async fn test_never_finished_times_out() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v22.0/me/media")
            .with_status(200)
            .with_body(json!({"id": "17890123"}).to_string())
            .create_async()
            .await;
        let status = server
            .mock("GET", "/v22.0/17890123")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(json!({"id": "17890123", "status_code": "IN_PROGRESS"}).to_string())
            .expect(3)
            .create_async()
            .await;

        let request = request();
        let target = &request.targets[0];
        let mut source = MemorySource::new(vec![3u8; 100]);
        let cancel = CancellationToken::new();

        let err = adapter(&server.url(), 3)
            .publish(&request, target, &token(), &mut source, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::TimedOut { attempts: 3 }));
        status.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_fails_fast() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v22.0/me/media")
            .with_status(200)
            .with_body(json!({"id": "17890123"}).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/v22.0/17890123")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(json!({"id": "17890123", "status_code": "ERROR"}).to_string())
            .expect(1)
            .create_async()
            .await;

        let request = request();
        let target = &request.targets[0];
        let mut source = MemorySource::new(vec![3u8; 100]);
        let cancel = CancellationToken::new();

        let err = adapter(&server.url(), 30)
            .publish(&request, target, &token(), &mut source, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::RemoteProcessingFailed(_)));
    }

    #[tokio::test]
    async fn test_container_rejection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v22.0/me/media")
            .with_status(400)
            .with_body(r#"{"error":{"message":"Invalid video_url"}}"#)
            .create_async()
            .await;

        let request = request();
        let target = &request.targets[0];
        let mut source = MemorySource::new(vec![3u8; 100]);
        let cancel = CancellationToken::new();

        let err = adapter(&server.url(), 5)
            .publish(&request, target, &token(), &mut source, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_container_without_id_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v22.0/me/media")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let request = request();
        let target = &request.targets[0];
        let mut source = MemorySource::new(vec![3u8; 100]);
        let cancel = CancellationToken::new();

        let err = adapter(&server.url(), 5)
            .publish(&request, target, &token(), &mut source, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::MalformedResponse(_)));
    }
}
