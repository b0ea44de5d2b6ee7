//! Static upload preconditions
//!
//! Checks that fail fast before any network call: required metadata, file
//! extension, and size ceilings.

use std::path::Path;

use crate::error::PublishError;

/// Validator for the direct-upload preconditions. Chunked and async
/// platforms reuse the size check; the extension and title rules are only as
/// strict as the target platform requires.
pub struct UploadValidator {
    max_file_size: u64,
    allowed_extensions: Vec<String>,
}

impl UploadValidator {
    pub fn new(max_file_size: u64, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
        }
    }

    pub fn validate_size(&self, size: u64) -> Result<(), PublishError> {
        if size == 0 {
            return Err(PublishError::PreconditionFailed(
                "Cannot upload empty file".to_string(),
            ));
        }
        if size > self.max_file_size {
            return Err(PublishError::PreconditionFailed(format!(
                "File size {} bytes exceeds the maximum of {} bytes",
                size, self.max_file_size
            )));
        }
        Ok(())
    }

    pub fn validate_extension(&self, filename: &str) -> Result<(), PublishError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| {
                PublishError::PreconditionFailed(format!("Invalid filename: {}", filename))
            })?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(PublishError::PreconditionFailed(format!(
                "Unsupported file type .{} (allowed: {})",
                extension,
                self.allowed_extensions.join(", ")
            )));
        }
        Ok(())
    }

    pub fn validate_title(&self, title: &str) -> Result<(), PublishError> {
        if title.trim().is_empty() {
            return Err(PublishError::PreconditionFailed(
                "Video title is required".to_string(),
            ));
        }
        Ok(())
    }

    /// All static checks for one upload.
    pub fn validate_all(&self, filename: &str, title: &str, size: u64) -> Result<(), PublishError> {
        self.validate_size(size)?;
        self.validate_extension(filename)?;
        self.validate_title(title)?;
        Ok(())
    }
}
