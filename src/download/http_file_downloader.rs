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

use crate::download::checksum::verify_checksum;
use crate::download::client::{AttohttpcClient, HttpClient, HttpResponse};
use crate::download::options::DownloadOptions;
use crate::error::{Result, SyncError};
use log::debug;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

const DOWNLOAD_CHUNK_SIZE: usize = 8192;

pub trait ProgressReporter: Send + Sync {
    /// `total_bytes` is 0 when the server did not announce a length.
    fn on_start(&mut self, total_bytes: u64);

    fn on_progress(&mut self, bytes_downloaded: u64);

    fn on_complete(&mut self);
}

/// Cache validators returned with a successful response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    Complete { bytes: u64, validators: Validators },
    NotModified,
}

pub struct HttpFileDownloader {
    pub(crate) http_client: Arc<dyn HttpClient>,
    progress_reporter: Option<Box<dyn ProgressReporter>>,
}

impl Default for HttpFileDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFileDownloader {
    pub fn new() -> Self {
        Self::with_client(Arc::new(AttohttpcClient::new()))
    }

    pub fn with_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            progress_reporter: None,
        }
    }

    pub fn with_progress_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Downloads `url` to `destination` through a temporary file in the same
    /// directory. Nothing is written when the server answers `304`.
    pub fn download(
        &mut self,
        url: &str,
        destination: &Path,
        options: &DownloadOptions,
    ) -> Result<DownloadStatus> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        options.check_cancelled()?;

        let response = self.http_client.get(url, options.headers.clone())?;
        if response.status() == 304 {
            debug!("{url} not modified");
            return Ok(DownloadStatus::NotModified);
        }
        self.validate_response(url, response.as_ref(), options.max_size)?;

        let total_size = get_total_size(response.as_ref());
        let validators = Validators {
            etag: response.header("ETag").map(str::to_string),
            last_modified: response.header("Last-Modified").map(str::to_string),
        };

        if let Some(reporter) = &mut self.progress_reporter {
            reporter.on_start(total_size);
        }

        let temp_file =
            NamedTempFile::new_in(destination.parent().unwrap_or_else(|| Path::new(".")))?;
        let bytes = self.download_to_file(response, temp_file.as_file(), options)?;

        if let Some(expected_checksum) = &options.checksum {
            verify_checksum(temp_file.path(), expected_checksum, url)?;
        }

        temp_file
            .persist(destination)
            .map_err(|e| SyncError::Io(e.error))?;

        if let Some(reporter) = &mut self.progress_reporter {
            reporter.on_complete();
        }

        Ok(DownloadStatus::Complete { bytes, validators })
    }

    fn validate_response(&self, url: &str, response: &dyn HttpResponse, max_size: u64) -> Result<()> {
        let status = response.status();

        if !(200..300).contains(&status) {
            return Err(SyncError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        if let Some(content_length) = response.header("Content-Length")
            && let Ok(length) = content_length.parse::<u64>()
            && length > max_size
        {
            return Err(SyncError::ValidationError(format!(
                "Download size {length} exceeds maximum allowed size {max_size}"
            )));
        }

        Ok(())
    }

    fn download_to_file(
        &mut self,
        mut response: Box<dyn HttpResponse>,
        file: &File,
        options: &DownloadOptions,
    ) -> Result<u64> {
        let mut writer = BufWriter::new(file);
        let mut downloaded = 0u64;
        let mut buffer = vec![0; DOWNLOAD_CHUNK_SIZE];

        loop {
            options.check_cancelled()?;
            match response.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    downloaded += n as u64;
                    if downloaded > options.max_size {
                        return Err(SyncError::ValidationError(format!(
                            "Download exceeds maximum allowed size {}",
                            options.max_size
                        )));
                    }
                    writer.write_all(&buffer[..n])?;

                    if let Some(reporter) = &mut self.progress_reporter {
                        reporter.on_progress(downloaded);
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(SyncError::NetworkError(format!(
                        "Connection lost while downloading: {e}"
                    )));
                }
            }
        }

        writer.flush()?;
        Ok(downloaded)
    }
}

fn get_total_size(response: &dyn HttpResponse) -> u64 {
    response
        .header("Content-Length")
        .and_then(|length| length.parse::<u64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "http_file_downloader_tests.rs"]
mod http_file_downloader_tests;
