//! Domain models

pub mod job;
pub mod platform;
pub mod result;

pub use job::{PlatformTarget, Privacy, PublishRequest};
pub use platform::Platform;
pub use result::{AttemptOutcome, JobResult, UploadAttemptResult};
