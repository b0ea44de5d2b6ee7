//! Shared types for the crosspost publishing core: domain models, the error
//! taxonomy, configuration, credentials, and static upload validation.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod validation;

pub use auth::{AccessToken, CredentialStore, FileCredentialStore, StaticCredentialStore};
pub use config::PublishConfig;
pub use error::PublishError;
pub use models::{
    AttemptOutcome, JobResult, Platform, PlatformTarget, Privacy, PublishRequest,
    UploadAttemptResult,
};
pub use validation::UploadValidator;
