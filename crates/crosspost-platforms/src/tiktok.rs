//! TikTok adapter: chunked resumable upload
//!
//! Direct Post flow against the v2 content posting API: declare the total
//! size, chunk size and chunk count in an init exchange, receive a one-time
//! upload URL plus a publish id, then PUT sequential byte ranges until the
//! final chunk is acknowledged. The publish id is the external object id.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crosspost_core::{
    AccessToken, Platform, PlatformTarget, Privacy, PublishConfig, PublishError, PublishRequest,
};
use crosspost_transfer::{ChunkPlan, MediaSource, ResumableUploadSession, RetryPolicy};

use crate::adapter::PlatformAdapter;
use crate::http::{bearer_json_post, build_client};

const DEFAULT_BASE_URL: &str = "https://open.tiktokapis.com";

#[derive(Debug, Deserialize)]
struct InitResponse {
    #[serde(default)]
    data: InitData,
    #[serde(default)]
    error: ApiEnvelope,
}

#[derive(Debug, Default, Deserialize)]
struct InitData {
    #[serde(default)]
    publish_id: String,
    #[serde(default)]
    upload_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    log_id: String,
}

pub struct TiktokAdapter {
    init_client: reqwest::Client,
    upload_client: reqwest::Client,
    base_url: String,
    chunk_size: u64,
    retry: RetryPolicy,
}

impl TiktokAdapter {
    pub fn new(config: &PublishConfig) -> anyhow::Result<Self> {
        Ok(Self {
            init_client: build_client(config.init_timeout())?,
            upload_client: build_client(config.transfer_timeout())?,
            base_url: DEFAULT_BASE_URL.to_string(),
            chunk_size: config.chunk_size,
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Point the adapter at a different API host (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn privacy_level(privacy: Option<Privacy>) -> &'static str {
        match privacy.unwrap_or(Privacy::Private) {
            Privacy::Private => "SELF_ONLY",
            Privacy::Unlisted => "FOLLOWER_OF_CREATOR",
            Privacy::Public => "PUBLIC_TO_EVERYONE",
        }
    }

    async fn init_upload(
        &self,
        caption: &str,
        privacy: Option<Privacy>,
        plan: &ChunkPlan,
        token: &AccessToken,
        cancel: &CancellationToken,
    ) -> Result<(String, String), PublishError> {
        let body = json!({
            "post_info": {
                "title": caption,
                "privacy_level": Self::privacy_level(privacy),
                "disable_duet": false,
                "disable_comment": false,
                "disable_stitch": false,
            },
            "source_info": {
                "source": "FILE_UPLOAD",
                "video_size": plan.total_size(),
                "chunk_size": plan.chunk_size(),
                "total_chunk_count": plan.chunk_count(),
            },
        });

        let url = format!("{}/v2/post/publish/video/init/", self.base_url);
        let (status, text) =
            bearer_json_post(&self.init_client, &url, &token.secret, &body, cancel).await?;

        if !status.is_success() {
            return Err(PublishError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let parsed: InitResponse =
            serde_json::from_str(&text).map_err(|e| PublishError::MalformedResponse(e.to_string()))?;

        if !parsed.error.code.is_empty() && parsed.error.code != "ok" {
            return Err(PublishError::Api {
                status: status.as_u16(),
                message: format!(
                    "{} (code: {}, log: {})",
                    parsed.error.message, parsed.error.code, parsed.error.log_id
                ),
            });
        }

        if parsed.data.upload_url.is_empty() {
            return Err(PublishError::MalformedResponse(
                "init response carried no upload URL".to_string(),
            ));
        }
        if parsed.data.publish_id.is_empty() {
            return Err(PublishError::MalformedResponse(
                "init response carried no publish id".to_string(),
            ));
        }

        Ok((parsed.data.upload_url, parsed.data.publish_id))
    }
}

#[async_trait]
impl PlatformAdapter for TiktokAdapter {
    fn platform(&self) -> Platform {
        Platform::Tiktok
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

        let plan = ChunkPlan::build(source.len(), self.chunk_size)?;
        let caption = request.caption_for(target);

        tracing::info!(
            job_id = %request.id,
            video_size = plan.total_size(),
            chunk_size = plan.chunk_size(),
            total_chunk_count = plan.chunk_count(),
            "Initializing TikTok upload"
        );

        let (upload_url, publish_id) = self
            .init_upload(caption, target.privacy, &plan, token, cancel)
            .await?;

        tracing::info!(job_id = %request.id, publish_id = %publish_id, "TikTok init accepted");

        let session = ResumableUploadSession::new(
            self.upload_client.clone(),
            upload_url,
            publish_id,
            request.content_type.clone(),
            plan,
            self.retry,
        );

        session.run(source, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_transfer::MemorySource;

    fn adapter(server_url: &str) -> TiktokAdapter {
        let config = PublishConfig {
            chunk_size: 10,
            retry_max_attempts: 1,
            retry_base_delay_ms: 1,
            ..PublishConfig::default()
        };
        TiktokAdapter::new(&config)
            .unwrap()
            .with_base_url(server_url)
    }

    fn request() -> PublishRequest {
        PublishRequest::new(
            "clip.mp4",
            "video/mp4",
            "shared caption",
            vec![PlatformTarget::new(Platform::Tiktok)],
        )
    }

    fn token() -> AccessToken {
        AccessToken::new("act.token")
    }

    #[tokio::test]
    async fn test_init_then_chunks() {
        let mut server = mockito::Server::new_async().await;
        let init_body = json!({
            "data": {
                "publish_id": "v_pub_123",
                "upload_url": format!("{}/upload", server.url()),
            },
            "error": {"code": "ok", "message": "", "log_id": "log1"},
        });
        let init = server
            .mock("POST", "/v2/post/publish/video/init/")
            .match_header("authorization", "Bearer act.token")
            .match_body(mockito::Matcher::PartialJson(json!({
                "source_info": {
                    "source": "FILE_UPLOAD",
                    "video_size": 25,
                    "chunk_size": 10,
                    "total_chunk_count": 3,
                }
            })))
            .with_status(200)
            .with_body(init_body.to_string())
            .create_async()
            .await;
        let chunk1 = server
            .mock("PUT", "/upload")
            .match_header("content-range", "bytes 0-9/25")
            .with_status(206)
            .create_async()
            .await;
        let chunk2 = server
            .mock("PUT", "/upload")
            .match_header("content-range", "bytes 10-19/25")
            .with_status(206)
            .create_async()
            .await;
        let chunk3 = server
            .mock("PUT", "/upload")
            .match_header("content-range", "bytes 20-24/25")
            .with_status(200)
            .create_async()
            .await;

        let request = request();
        let target = &request.targets[0];
        let mut source = MemorySource::new(vec![9u8; 25]);
        let cancel = CancellationToken::new();

        let id = adapter(&server.url())
            .publish(&request, target, &token(), &mut source, &cancel)
            .await
            .unwrap();

        assert_eq!(id, "v_pub_123");
        init.assert_async().await;
        chunk1.assert_async().await;
        chunk2.assert_async().await;
        chunk3.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_envelope_in_ok_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v2/post/publish/video/init/")
            .with_status(200)
            .with_body(
                json!({
                    "data": {},
                    "error": {
                        "code": "spam_risk_too_many_posts",
                        "message": "Daily post cap reached",
                        "log_id": "log9",
                    },
                })
                .to_string(),
            )
            .create_async()
            .await;

        let request = request();
        let target = &request.targets[0];
        let mut source = MemorySource::new(vec![9u8; 25]);
        let cancel = CancellationToken::new();

        let err = adapter(&server.url())
            .publish(&request, target, &token(), &mut source, &cancel)
            .await
            .unwrap_err();

        match err {
            PublishError::Api { message, .. } => {
                assert!(message.contains("Daily post cap reached"));
                assert!(message.contains("spam_risk_too_many_posts"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_init_http_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v2/post/publish/video/init/")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let request = request();
        let target = &request.targets[0];
        let mut source = MemorySource::new(vec![9u8; 25]);
        let cancel = CancellationToken::new();

        let err = adapter(&server.url())
            .publish(&request, target, &token(), &mut source, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_missing_upload_url_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v2/post/publish/video/init/")
            .with_status(200)
            .with_body(
                json!({
                    "data": {"publish_id": "v_pub_123"},
                    "error": {"code": "ok"},
                })
                .to_string(),
            )
            .create_async()
            .await;

        let request = request();
        let target = &request.targets[0];
        let mut source = MemorySource::new(vec![9u8; 25]);
        let cancel = CancellationToken::new();

        let err = adapter(&server.url())
            .publish(&request, target, &token(), &mut source, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_source_fails_before_any_call() {
        let mut server = mockito::Server::new_async().await;
        let init = server
            .mock("POST", "/v2/post/publish/video/init/")
            .expect(0)
            .create_async()
            .await;

        let request = request();
        let target = &request.targets[0];
        let mut source = MemorySource::new(Vec::new());
        let cancel = CancellationToken::new();

        let err = adapter(&server.url())
            .publish(&request, target, &token(), &mut source, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::PreconditionFailed(_)));
        init.assert_async().await;
    }

    #[test]
    fn test_privacy_mapping() {
        assert_eq!(TiktokAdapter::privacy_level(None), "SELF_ONLY");
        assert_eq!(
            TiktokAdapter::privacy_level(Some(Privacy::Public)),
            "PUBLIC_TO_EVERYONE"
        );
        assert_eq!(
            TiktokAdapter::privacy_level(Some(Privacy::Unlisted)),
            "FOLLOWER_OF_CREATOR"
        );
    }
}
