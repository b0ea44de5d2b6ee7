//! Job orchestration: fan one source video out to the requested platforms
//! sequentially, aggregating per-platform outcomes into a single result.

pub mod publisher;

pub use publisher::Publisher;

// The full public surface an embedding caller needs.
pub use crosspost_core::{
    AccessToken, AttemptOutcome, CredentialStore, FileCredentialStore, JobResult, Platform,
    PlatformTarget, Privacy, PublishConfig, PublishError, PublishRequest, StaticCredentialStore,
    UploadAttemptResult,
};
pub use crosspost_platforms::{AdapterSet, PlatformAdapter};
pub use crosspost_transfer::{FileSource, MediaSource, MemorySource};
