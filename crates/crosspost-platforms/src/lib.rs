//! Platform adapters
//!
//! One module per destination, each bridging the uniform publish contract to
//! that platform's upload protocol: YouTube (direct body), TikTok (chunked
//! byte ranges), Instagram (submit a container, poll for readiness).

pub mod adapter;
pub mod http;
pub mod instagram;
pub mod tiktok;
pub mod youtube;

pub use adapter::{AdapterSet, PlatformAdapter};
pub use instagram::InstagramAdapter;
pub use tiktok::TiktokAdapter;
pub use youtube::YoutubeAdapter;
