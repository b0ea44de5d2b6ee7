//! YouTube adapter: direct upload
//!
//! No size tiering: metadata goes up in a single init exchange and the whole
//! body follows in one PUT against the session URI the init returns. Static
//! preconditions (title, extension, size ceiling) fail fast before any
//! network call.

use async_trait::async_trait;
use bytes::Bytes;
use futures::SinkExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crosspost_core::{
    AccessToken, Platform, PlatformTarget, Privacy, PublishConfig, PublishError, PublishRequest,
    UploadValidator,
};
use crosspost_transfer::MediaSource;

use crate::adapter::PlatformAdapter;
use crate::http::build_client;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const CATEGORY_PEOPLE_AND_BLOGS: &str = "22";
const FEED_BUF_SIZE: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct VideoResource {
    #[serde(default)]
    id: String,
}

pub struct YoutubeAdapter {
    init_client: reqwest::Client,
    upload_client: reqwest::Client,
    base_url: String,
    validator: UploadValidator,
}

impl YoutubeAdapter {
    pub fn new(config: &PublishConfig) -> anyhow::Result<Self> {
        Ok(Self {
            init_client: build_client(config.init_timeout())?,
            upload_client: build_client(config.transfer_timeout())?,
            base_url: DEFAULT_BASE_URL.to_string(),
            validator: UploadValidator::new(
                config.max_video_size_bytes,
                config.allowed_extensions.clone(),
            ),
        })
    }

    /// Point the adapter at a different API host (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn privacy_status(privacy: Option<Privacy>) -> &'static str {
        match privacy.unwrap_or(Privacy::Private) {
            Privacy::Private => "private",
            Privacy::Unlisted => "unlisted",
            Privacy::Public => "public",
        }
    }

    /// Open an upload session: metadata up front, session URI back in the
    /// `Location` header.
    async fn init_session(
        &self,
        title: &str,
        description: &str,
        privacy: Option<Privacy>,
        content_type: &str,
        total: u64,
        token: &AccessToken,
        cancel: &CancellationToken,
    ) -> Result<String, PublishError> {
        let url = format!(
            "{}/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status",
            self.base_url
        );
        let metadata = json!({
            "snippet": {
                "title": title,
                "description": description,
                "categoryId": CATEGORY_PEOPLE_AND_BLOGS,
            },
            "status": {
                "privacyStatus": Self::privacy_status(privacy),
            },
        });

        let request = self
            .init_client
            .post(&url)
            .bearer_auth(&token.secret)
            .header("X-Upload-Content-Type", content_type)
            .header("X-Upload-Content-Length", total)
            .json(&metadata)
            .send();

        let response = tokio::select! {
            result = request => result.map_err(|e| PublishError::Transport(e.to_string()))?,
            _ = cancel.cancelled() => return Err(PublishError::Cancelled),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("quotaExceeded") {
                return Err(PublishError::Api {
                    status: status.as_u16(),
                    message: "YouTube API quota exceeded, please try again later".to_string(),
                });
            }
            return Err(PublishError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                PublishError::MalformedResponse(
                    "upload session response carried no Location header".to_string(),
                )
            })
    }

    /// PUT the whole body against the session URI, feeding it from the
    /// source through a bounded channel so nothing is buffered in full.
    async fn upload_body(
        &self,
        session_uri: &str,
        content_type: &str,
        total: u64,
        token: &AccessToken,
        source: &mut (dyn MediaSource + '_),
        cancel: &CancellationToken,
    ) -> Result<String, PublishError> {
        let (mut tx, rx) = futures::channel::mpsc::channel::<Result<Bytes, std::io::Error>>(4);

        let send = self
            .upload_client
            .put(session_uri)
            .bearer_auth(&token.secret)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(rx))
            .send();

        let feed = async move {
            let mut sent: u64 = 0;
            loop {
                let chunk = source.read_chunk(FEED_BUF_SIZE).await?;
                if chunk.is_empty() {
                    break;
                }
                sent += chunk.len() as u64;
                if tx.send(Ok(chunk)).await.is_err() {
                    // Receiver hung up; the response carries the reason.
                    return Ok(None);
                }
            }
            Ok::<Option<u64>, std::io::Error>(Some(sent))
        };

        let (response, fed) = tokio::select! {
            pair = async { tokio::join!(send, feed) } => pair,
            _ = cancel.cancelled() => return Err(PublishError::Cancelled),
        };

        // A source that ran dry is the root cause of whatever the transfer
        // reported; surface it first.
        let fed = fed.map_err(|e| PublishError::SourcePreparationFailed(e.to_string()))?;
        if let Some(sent) = fed {
            if sent < total {
                return Err(PublishError::TruncatedSource {
                    expected: total,
                    actual: sent,
                });
            }
        }

        let response = response.map_err(|e| PublishError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(PublishError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let video: VideoResource =
            serde_json::from_str(&text).map_err(|e| PublishError::MalformedResponse(e.to_string()))?;
        if video.id.is_empty() {
            return Err(PublishError::MalformedResponse(
                "upload response carried no video id".to_string(),
            ));
        }
        Ok(video.id)
    }
}

#[async_trait]
impl PlatformAdapter for YoutubeAdapter {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    async fn publish(
        &self,
        request: &PublishRequest,
        target: &PlatformTarget,
        token: &AccessToken,
        source: &mut (dyn MediaSource + '_),
        cancel: &CancellationToken,
    ) -> Result<String, PublishError> {
        let title = target.title.as_deref().unwrap_or_default();
        self.validator
            .validate_all(&request.filename, title, source.len())?;

        let description = request.caption_for(target);
        let total = source.len();

        tracing::info!(
            job_id = %request.id,
            title = %title,
            size = total,
            "Starting YouTube upload"
        );

        let session_uri = self
            .init_session(
                title,
                description,
                target.privacy,
                &request.content_type,
                total,
                token,
                cancel,
            )
            .await?;

        let video_id = self
            .upload_body(
                &session_uri,
                &request.content_type,
                total,
                token,
                source,
                cancel,
            )
            .await?;

        tracing::info!(job_id = %request.id, video_id = %video_id, "YouTube upload complete");
        Ok(video_id)
    }
}
