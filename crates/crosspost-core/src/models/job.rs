//! Publish request and per-platform targets

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Platform;

/// Audience for the published video. Adapters translate this into their
/// platform's own vocabulary (e.g. TikTok `SELF_ONLY`, YouTube `private`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Private,
    Unlisted,
    Public,
}

/// One requested destination with its metadata overrides. Absent fields fall
/// back to the request-level defaults at publish time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformTarget {
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<Privacy>,
}

impl PlatformTarget {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            title: None,
            caption: None,
            privacy: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_privacy(mut self, privacy: Privacy) -> Self {
        self.privacy = Some(privacy);
        self
    }
}

/// One publishing job: a single source video fanned out to an ordered set of
/// targets. The source bytes travel separately (the orchestrator lends the
/// stream to one adapter at a time); this struct carries everything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    pub id: Uuid,
    /// Original filename of the source, used for extension preconditions.
    pub filename: String,
    /// MIME type declared on every transfer (e.g. `video/mp4`).
    pub content_type: String,
    /// Shared caption used wherever a target does not override it.
    pub caption: String,
    pub targets: Vec<PlatformTarget>,
}

impl PublishRequest {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        caption: impl Into<String>,
        targets: Vec<PlatformTarget>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            content_type: content_type.into(),
            caption: caption.into(),
            targets,
        }
    }

    /// Target lookup; the orchestrator iterates `targets` directly to keep
    /// the requested order.
    pub fn target(&self, platform: Platform) -> Option<&PlatformTarget> {
        self.targets.iter().find(|t| t.platform == platform)
    }

    /// Caption for a target, falling back to the shared caption.
    pub fn caption_for<'a>(&'a self, target: &'a PlatformTarget) -> &'a str {
        match &target.caption {
            Some(caption) if !caption.is_empty() => caption,
            _ => &self.caption,
        }
    }
}
