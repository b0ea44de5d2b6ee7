//! Bearer credentials
//!
//! Token refresh and the OAuth exchange live outside this crate; publishing
//! only consumes "a bearer credential for platform P" and treats an expired
//! one as a fatal precondition failure for that platform.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::PublishError;
use crate::models::Platform;

/// An opaque bearer credential with an optional expiry instant.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub secret: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expires_at: None,
        }
    }

    pub fn expiring(secret: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            secret: secret.into(),
            expires_at: Some(expires_at),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expiry) if now > expiry)
    }
}

/// Source of bearer credentials, one per platform.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn token(&self, platform: Platform) -> Result<AccessToken, PublishError>;
}

/// In-memory credential store for tests and embedding callers.
#[derive(Debug, Default)]
pub struct StaticCredentialStore {
    tokens: HashMap<Platform, AccessToken>,
}

impl StaticCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, platform: Platform, token: AccessToken) -> Self {
        self.tokens.insert(platform, token);
        self
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn token(&self, platform: Platform) -> Result<AccessToken, PublishError> {
        self.tokens
            .get(&platform)
            .cloned()
            .ok_or(PublishError::NotAuthenticated { platform })
    }
}

/// On-disk token layout: either a plain OAuth token object
/// (`access_token` + RFC 3339 `expiry`) or a platform token envelope that
/// carries only `access_token` and a relative `expires_in`.
#[derive(Debug, Deserialize)]
struct TokenFile {
    access_token: String,
    #[serde(default)]
    expiry: Option<DateTime<Utc>>,
}

/// Credential store reading `{platform}_token.json` files from a directory.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn token_path(&self, platform: Platform) -> PathBuf {
        self.dir.join(format!("{}_token.json", platform))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn token(&self, platform: Platform) -> Result<AccessToken, PublishError> {
        let path = self.token_path(platform);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|_| PublishError::NotAuthenticated { platform })?;

        let parsed: TokenFile = serde_json::from_str(&raw).map_err(|e| {
            tracing::warn!(
                platform = %platform,
                path = %path.display(),
                error = %e,
                "Unreadable token file"
            );
            PublishError::NotAuthenticated { platform }
        })?;

        if parsed.access_token.is_empty() {
            return Err(PublishError::NotAuthenticated { platform });
        }

        Ok(AccessToken {
            secret: parsed.access_token,
            expires_at: parsed.expiry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_token_without_expiry_never_expires() {
        let token = AccessToken::new("secret");
        assert!(!token.is_expired(Utc::now()));
    }

    #[test]
    fn test_token_expiry() {
        let now = Utc::now();
        let live = AccessToken::expiring("secret", now + Duration::hours(1));
        let dead = AccessToken::expiring("secret", now - Duration::hours(1));
        assert!(!live.is_expired(now));
        assert!(dead.is_expired(now));
    }

    #[tokio::test]
    async fn test_static_store_missing_platform() {
        let store = StaticCredentialStore::new()
            .with_token(Platform::Youtube, AccessToken::new("yt"));

        assert!(store.token(Platform::Youtube).await.is_ok());
        assert!(matches!(
            store.token(Platform::Tiktok).await,
            Err(PublishError::NotAuthenticated {
                platform: Platform::Tiktok
            })
        ));
    }

    #[tokio::test]
    async fn test_file_store_reads_oauth_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("youtube_token.json");
        std::fs::write(
            &path,
            r#"{"access_token":"ya29.abc","token_type":"Bearer","expiry":"2030-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let store = FileCredentialStore::new(dir.path());
        let token = store.token(Platform::Youtube).await.unwrap();
        assert_eq!(token.secret, "ya29.abc");
        assert!(token.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_file_store_reads_envelope_without_expiry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tiktok_token.json"),
            r#"{"access_token":"act.123","expires_in":86400,"open_id":"u1","scope":"video.publish"}"#,
        )
        .unwrap();

        let store = FileCredentialStore::new(dir.path());
        let token = store.token(Platform::Tiktok).await.unwrap();
        assert_eq!(token.secret, "act.123");
        assert!(token.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_file_store_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path());
        assert!(matches!(
            store.token(Platform::Instagram).await,
            Err(PublishError::NotAuthenticated { .. })
        ));

        std::fs::write(dir.path().join("instagram_token.json"), "not json").unwrap();
        assert!(matches!(
            store.token(Platform::Instagram).await,
            Err(PublishError::NotAuthenticated { .. })
        ));
    }
}
