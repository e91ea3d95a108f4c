use std::path::Path;

use shared::domain::{Identifier, Role};
use thiserror::Error;

pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;
pub const RESUME_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("failed to read résumé '{path}': {message}")]
    Read { path: String, message: String },
    #[error("only PDF résumés are supported, got '{file_name}'")]
    NotPdf { file_name: String },
    #[error("résumé file is empty")]
    Empty,
    #[error("résumé is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },
    #[error("enter at least one target role")]
    NoTargetRoles,
}

/// A résumé that passed local checks and is ready for profile creation.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    file_name: String,
    bytes: Vec<u8>,
    target_roles: Vec<Role>,
}

impl ResumeUpload {
    pub fn new(
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        target_roles: &str,
    ) -> Result<Self, UploadError> {
        let file_name = file_name.into();
        if !file_name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(UploadError::NotPdf { file_name });
        }
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if bytes.len() > MAX_RESUME_BYTES {
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                limit: MAX_RESUME_BYTES,
            });
        }
        let target_roles = parse_target_roles(target_roles);
        if target_roles.is_empty() {
            return Err(UploadError::NoTargetRoles);
        }

        Ok(Self {
            file_name,
            bytes,
            target_roles,
        })
    }

    pub async fn from_path(path: &Path, target_roles: &str) -> Result<Self, UploadError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !file_name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(UploadError::NotPdf { file_name });
        }
        let bytes = tokio::fs::read(path).await.map_err(|err| UploadError::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::new(file_name, bytes, target_roles)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn target_roles(&self) -> &[Role] {
        &self.target_roles
    }

    /// Comma-separated form field the service splits back into roles.
    pub fn target_roles_field(&self) -> String {
        self.target_roles
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub fn parse_target_roles(raw: &str) -> Vec<Role> {
    raw.split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(Role::from)
        .collect()
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
