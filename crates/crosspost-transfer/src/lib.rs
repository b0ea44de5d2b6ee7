//! Transfer machinery shared by the platform adapters: chunk planning, the
//! chunked resumable session, the submit-then-poll driver, bounded retry,
//! and the single-cursor source abstraction.

pub mod chunk;
pub mod poll;
pub mod resumable;
pub mod retry;
pub mod source;

pub use chunk::{ChunkPlan, ChunkRange};
pub use poll::{AsyncPublishPoller, PollConfig, PublishStatus, StatusProbe};
pub use resumable::ResumableUploadSession;
pub use retry::RetryPolicy;
pub use source::{read_full, FileSource, MediaSource, MemorySource};
