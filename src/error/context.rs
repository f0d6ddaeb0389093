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

use crate::container::ContainerError;
use crate::error::SyncError;
use std::fmt;

pub struct ErrorContext<'a> {
    pub error: &'a SyncError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl<'a> ErrorContext<'a> {
    pub fn new(error: &'a SyncError) -> Self {
        let (suggestion, details) = match error {
            SyncError::TrustViolation {
                repo,
                expected,
                actual,
            } => {
                let suggestion = Some(format!(
                    "Do not use this repository until the new signer is confirmed with its \
                     maintainers. If the key rotation is legitimate, update the pinned \
                     fingerprint of '{repo}' in config.toml."
                ));
                let details = Some(format!(
                    "Expected: {}\nAcquired: {}",
                    expected.formatted(),
                    actual.formatted()
                ));
                (suggestion, details)
            }
            SyncError::Container { source, .. } => {
                let suggestion = match source {
                    ContainerError::Unsigned => Some(
                        "The repository did not sign its index. Ask the maintainers to publish a \
                         signed index."
                            .to_string(),
                    ),
                    ContainerError::MultipleSigners { .. } => Some(
                        "Indexes signed by more than one key are rejected. Contact the repository \
                         maintainers."
                            .to_string(),
                    ),
                    _ => Some(
                        "The download may be corrupted or tampered with. Try again later or use \
                         a different mirror."
                            .to_string(),
                    ),
                };
                (suggestion, Some(format!("Container check failed: {source}")))
            }
            SyncError::ChecksumMismatch { .. } => {
                let suggestion = Some(
                    "The mirror may be out of sync with the signed entry. Try again later."
                        .to_string(),
                );
                (suggestion, None)
            }
            SyncError::Parse { message, .. } => {
                let suggestion = Some(
                    "The repository published an index this client cannot read. Retry later or \
                     report it to the repository maintainers."
                        .to_string(),
                );
                (suggestion, Some(message.clone()))
            }
            SyncError::InvalidFingerprint(_) => {
                let suggestion = Some(
                    "A fingerprint is the SHA-256 of the signing certificate: 64 hexadecimal \
                     characters, optionally separated by spaces or colons."
                        .to_string(),
                );
                (suggestion, None)
            }
            SyncError::RepoNotFound(_) => {
                let suggestion =
                    Some("Run 'fdsync repo list' to see configured repositories.".to_string());
                (suggestion, None)
            }
            SyncError::NetworkError(msg) => {
                let suggestion = Some(
                    "Check your internet connection and proxy settings, then try again."
                        .to_string(),
                );
                (suggestion, Some(format!("Network issue: {msg}")))
            }
            SyncError::HttpStatus { status, .. } => {
                let suggestion = match status {
                    401 | 403 => Some(
                        "The repository requires credentials. Set username and password for it \
                         in config.toml."
                            .to_string(),
                    ),
                    404 => Some(
                        "Check the repository address. Legacy repositories only publish \
                         index-v1.jar."
                            .to_string(),
                    ),
                    429 => Some(
                        "Rate limit exceeded. Please wait a few minutes and try again.".to_string(),
                    ),
                    _ => Some("Try again later.".to_string()),
                };
                (suggestion, None)
            }
            SyncError::Http(http_err) => {
                let error_string = http_err.to_string();
                let suggestion = if error_string.contains("timeout")
                    || error_string.contains("Timeout")
                {
                    Some(
                        "Try increasing the timeout with the sync.timeout_secs setting."
                            .to_string(),
                    )
                } else {
                    Some("Check your internet connection and try again.".to_string())
                };
                (suggestion, Some(format!("HTTP error: {http_err}")))
            }
            SyncError::Io(io_err) => {
                let suggestion = match io_err.kind() {
                    std::io::ErrorKind::PermissionDenied => {
                        Some("Check permissions of the fdsync home directory.".to_string())
                    }
                    std::io::ErrorKind::NotFound => Some(
                        "Ensure the file or directory exists and the path is correct.".to_string(),
                    ),
                    _ => None,
                };
                (suggestion, Some(format!("I/O error: {io_err}")))
            }
            _ => (None, None),
        };

        ErrorContext {
            error,
            suggestion,
            details,
        }
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

impl<'a> fmt::Display for ErrorContext<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\n\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}
