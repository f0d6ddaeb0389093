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

use super::http_file_downloader::Validators;
use crate::error::Result;
use crate::sync::cancellation::CancellationToken;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default timeout for download operations
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Maximum allowed download size (1GB)
pub const MAX_DOWNLOAD_SIZE: u64 = 1_073_741_824;

/// Options for configuring download behavior
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Expected SHA-256 of the downloaded file, hex encoded
    pub checksum: Option<String>,

    /// Extra request headers (conditional validators, credentials)
    pub headers: Vec<(String, String)>,

    /// Maximum allowed file size
    pub max_size: u64,

    pub cancellation: Option<CancellationToken>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            checksum: None,
            headers: Vec::new(),
            max_size: MAX_DOWNLOAD_SIZE,
            cancellation: None,
        }
    }
}

impl DownloadOptions {
    pub(crate) fn check_cancelled(&self) -> Result<()> {
        match &self.cancellation {
            Some(token) => token.check(),
            None => Ok(()),
        }
    }
}

/// A downloaded artifact
pub struct DownloadResult {
    /// Path to the downloaded file
    pub path: PathBuf,

    pub validators: Validators,

    /// Temporary directory containing the file (will be cleaned up when dropped)
    pub(crate) _temp_dir: tempfile::TempDir,
}

impl DownloadResult {
    /// Get the path to the downloaded file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn new(path: PathBuf, validators: Validators, temp_dir: tempfile::TempDir) -> Self {
        Self {
            path,
            validators,
            _temp_dir: temp_dir,
        }
    }
}
