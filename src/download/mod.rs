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

/// Transport for repository artifacts
///
/// This module provides:
/// - A blocking HTTP client behind the `HttpClient` trait
/// - Conditional requests and `304 Not Modified` handling
/// - Checksum verification against signed entry data
/// - Progress reporting and cancellation inside the read loop
mod checksum;
mod client;
mod http_file_downloader;
mod options;
mod progress;

pub use checksum::{calculate_sha256, verify_checksum};
pub use client::{AttohttpcClient, HttpClient, HttpResponse};
pub use http_file_downloader::{DownloadStatus, HttpFileDownloader, ProgressReporter, Validators};
pub use options::{DEFAULT_TIMEOUT, DownloadOptions, DownloadResult, MAX_DOWNLOAD_SIZE};
pub use progress::{PercentProgressReporter, percent};

use crate::error::Result;

/// Outcome of fetching one artifact into a private temporary directory.
pub enum DownloadOutcome {
    Downloaded(DownloadResult),
    NotModified,
}

/// Download `url` into a fresh temporary directory as `file_name`
///
/// The directory, and the file with it, is removed when the returned
/// `DownloadResult` is dropped.
pub fn download_to_temp(
    downloader: &mut HttpFileDownloader,
    url: &str,
    file_name: &str,
    options: &DownloadOptions,
) -> Result<DownloadOutcome> {
    let temp_dir = tempfile::tempdir()?;
    let download_path = temp_dir.path().join(file_name);

    match downloader.download(url, &download_path, options)? {
        DownloadStatus::NotModified => Ok(DownloadOutcome::NotModified),
        DownloadStatus::Complete { validators, .. } => Ok(DownloadOutcome::Downloaded(
            DownloadResult::new(download_path, validators, temp_dir),
        )),
    }
}
