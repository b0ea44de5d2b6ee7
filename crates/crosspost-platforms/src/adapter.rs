//! Platform adapter contract
//!
//! One capability trait bridges the orchestrator's uniform publish request
//! to each destination's own protocol (direct body, chunked ranges, or
//! submit-then-poll).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crosspost_core::{AccessToken, Platform, PlatformTarget, PublishConfig, PublishError, PublishRequest};
use crosspost_transfer::MediaSource;

use crate::instagram::InstagramAdapter;
use crate::tiktok::TiktokAdapter;
use crate::youtube::YoutubeAdapter;

/// Uploads one source to one platform.
///
/// The source cursor is positioned at offset 0 on entry; adapters read
/// forward only and never seek. On success the platform's external object id
/// (video/post/reel id) is returned. Every failure maps into the
/// [`PublishError`] taxonomy; the orchestrator turns it into that platform's
/// attempt result.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    async fn publish(
        &self,
        request: &PublishRequest,
        target: &PlatformTarget,
        token: &AccessToken,
        source: &mut (dyn MediaSource + '_),
        cancel: &CancellationToken,
    ) -> Result<String, PublishError>;
}

/// Fixed set of adapters keyed by platform, built once at startup.
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
}

impl AdapterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// All three stock adapters configured from `config`.
    pub fn standard(config: &PublishConfig) -> anyhow::Result<Self> {
        Ok(Self::new()
            .with(Arc::new(YoutubeAdapter::new(config)?))
            .with(Arc::new(TiktokAdapter::new(config)?))
            .with(Arc::new(InstagramAdapter::new(config)?)))
    }

    pub fn with(mut self, adapter: Arc<dyn PlatformAdapter>) -> Self {
        self.adapters.insert(adapter.platform(), adapter);
        self
    }

    pub fn get(&self, platform: Platform) -> Option<Arc<dyn PlatformAdapter>> {
        self.adapters.get(&platform).cloned()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
