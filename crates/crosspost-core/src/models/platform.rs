//! Destination platform identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A destination platform. Each platform speaks a different upload protocol:
/// YouTube takes the whole body in one request, TikTok takes sequential byte
/// ranges against an init-issued URL, Instagram takes a container submission
/// followed by status polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Tiktok,
    Instagram,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
        }
    }

    /// All platforms, in the default publishing order.
    pub fn all() -> [Platform; 3] {
        [Platform::Youtube, Platform::Tiktok, Platform::Instagram]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "youtube" => Ok(Platform::Youtube),
            "tiktok" => Ok(Platform::Tiktok),
            "instagram" => Ok(Platform::Instagram),
            other => Err(format!("Unknown platform: {}", other)),
        }
    }
}
