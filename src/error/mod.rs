// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod context;
mod exit_codes;
mod format;

pub use context::ErrorContext;
pub use exit_codes::get_exit_code;
pub use format::{format_error_chain, format_error_with_color};

use crate::container::ContainerError;
use crate::fingerprint::{Fingerprint, FingerprintError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Server returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid signed container '{artifact}': {source}")]
    Container {
        artifact: String,
        #[source]
        source: ContainerError,
    },

    #[error(
        "Signer of repository '{repo}' does not match the pinned fingerprint: expected \
         {expected}, acquired {actual}"
    )]
    TrustViolation {
        repo: String,
        expected: Fingerprint,
        actual: Fingerprint,
    },

    #[error("Checksum mismatch for '{artifact}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        artifact: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to parse '{artifact}': {message}")]
    Parse { artifact: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid fingerprint '{0}'")]
    InvalidFingerprint(String),

    #[error("Repository '{0}' is not configured")]
    RepoNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Sync cancelled")]
    Cancelled,

    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] attohttpc::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Transport failures are the only class a caller may retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::NetworkError(_) | SyncError::Http(_) => true,
            SyncError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Whether the failure came from signature or fingerprint checks.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            SyncError::Container { .. }
                | SyncError::TrustViolation { .. }
                | SyncError::ChecksumMismatch { .. }
                | SyncError::Fingerprint(_)
        )
    }

    pub fn is_parse_failure(&self) -> bool {
        matches!(self, SyncError::Parse { .. } | SyncError::Json(_))
    }

    pub(crate) fn container(artifact: impl Into<String>, source: ContainerError) -> Self {
        SyncError::Container {
            artifact: artifact.into(),
            source,
        }
    }

    pub(crate) fn parse(artifact: impl Into<String>, message: impl ToString) -> Self {
        SyncError::Parse {
            artifact: artifact.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
