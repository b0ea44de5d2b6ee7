//! Configuration module
//!
//! One explicit configuration value, constructed at startup and passed into
//! the publisher and adapters. Nothing here is process-global.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Defaults
const CHUNK_SIZE_BYTES: u64 = 10_000_000;
const INIT_TIMEOUT_SECS: u64 = 60;
const TRANSFER_TIMEOUT_SECS: u64 = 15 * 60;
const POLL_INTERVAL_SECS: u64 = 10;
const POLL_MAX_ATTEMPTS: u32 = 30;
const RETRY_MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 500;
const MAX_VIDEO_SIZE_BYTES: u64 = 256 * 1024 * 1024 * 1024;

/// Publishing configuration.
///
/// Timeouts are split per phase: init/metadata exchanges are quick and get a
/// short timeout; chunk and whole-body transfers can legitimately run for
/// minutes and get a long one.
#[derive(Clone, Debug)]
pub struct PublishConfig {
    pub chunk_size: u64,
    pub init_timeout_secs: u64,
    pub transfer_timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub poll_max_attempts: u32,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub max_video_size_bytes: u64,
    pub allowed_extensions: Vec<String>,
    /// Directory holding `{platform}_token.json` credential files.
    pub credentials_dir: PathBuf,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE_BYTES,
            init_timeout_secs: INIT_TIMEOUT_SECS,
            transfer_timeout_secs: TRANSFER_TIMEOUT_SECS,
            poll_interval_secs: POLL_INTERVAL_SECS,
            poll_max_attempts: POLL_MAX_ATTEMPTS,
            retry_max_attempts: RETRY_MAX_ATTEMPTS,
            retry_base_delay_ms: RETRY_BASE_DELAY_MS,
            max_video_size_bytes: MAX_VIDEO_SIZE_BYTES,
            allowed_extensions: vec!["mp4".to_string()],
            credentials_dir: PathBuf::from("."),
        }
    }
}

impl PublishConfig {
    /// Build configuration from `CROSSPOST_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let defaults = Self::default();

        Ok(Self {
            chunk_size: env_parse("CROSSPOST_CHUNK_SIZE", defaults.chunk_size)?,
            init_timeout_secs: env_parse("CROSSPOST_INIT_TIMEOUT_SECS", defaults.init_timeout_secs)?,
            transfer_timeout_secs: env_parse(
                "CROSSPOST_TRANSFER_TIMEOUT_SECS",
                defaults.transfer_timeout_secs,
            )?,
            poll_interval_secs: env_parse("CROSSPOST_POLL_INTERVAL_SECS", defaults.poll_interval_secs)?,
            poll_max_attempts: env_parse("CROSSPOST_POLL_MAX_ATTEMPTS", defaults.poll_max_attempts)?,
            retry_max_attempts: env_parse("CROSSPOST_RETRY_MAX_ATTEMPTS", defaults.retry_max_attempts)?,
            retry_base_delay_ms: env_parse(
                "CROSSPOST_RETRY_BASE_DELAY_MS",
                defaults.retry_base_delay_ms,
            )?,
            max_video_size_bytes: env_parse(
                "CROSSPOST_MAX_VIDEO_SIZE_BYTES",
                defaults.max_video_size_bytes,
            )?,
            allowed_extensions: match env::var("CROSSPOST_ALLOWED_EXTENSIONS") {
                Ok(raw) => raw
                    .split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect(),
                Err(_) => defaults.allowed_extensions,
            },
            credentials_dir: env::var("CROSSPOST_CREDENTIALS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.credentials_dir),
        })
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_secs(self.init_timeout_secs)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
