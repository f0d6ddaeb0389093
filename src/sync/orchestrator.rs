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

//! Drives repositories from a conditional download of their signed
//! container to a committed index.

use crate::container::SignedContainer;
use crate::download::{
    DownloadOptions, DownloadOutcome, DownloadResult, HttpClient, HttpFileDownloader,
    MAX_DOWNLOAD_SIZE, PercentProgressReporter, Validators, download_to_temp,
};
use crate::error::{Result, SyncError};
use crate::fingerprint::Fingerprint;
use crate::models::{EntryFile, IndexFormat, IndexV2, Repo, RepoId};
use crate::negotiate::{self, FetchPlan};
use crate::parser::current::ENTRY_JSON;
use crate::parser::legacy::INDEX_V1_JSON;
use crate::parser::{parse_diff, parse_entry, parse_index, parse_index_v1};
use crate::patch::patch;
use crate::sync::cancellation::CancellationToken;
use crate::sync::inflight::InFlight;
use crate::sync::repo_lock::RepoLocks;
use crate::sync::state::{NoopObserver, Phase, SyncObserver, SyncOutcome, SyncReport, SyncState};
use crate::sync::storage::{CommitRequest, IndexStore};
use crate::trust;
use log::{debug, info, warn};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::sync::Arc;

pub const DEFAULT_CONCURRENCY: usize = 4;

pub struct Syncer {
    client: Arc<dyn HttpClient>,
    store: Arc<dyn IndexStore>,
    observer: Arc<dyn SyncObserver>,
    cancellation: CancellationToken,
    locks: RepoLocks,
    in_flight: InFlight<DownloadOutcome>,
    max_download_size: u64,
    concurrency: usize,
}

impl Syncer {
    pub fn new(client: Arc<dyn HttpClient>, store: Arc<dyn IndexStore>) -> Self {
        Self {
            client,
            store,
            observer: Arc::new(NoopObserver),
            cancellation: CancellationToken::new(),
            locks: RepoLocks::new(),
            in_flight: InFlight::new(),
            max_download_size: MAX_DOWNLOAD_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn with_max_download_size(mut self, max_download_size: u64) -> Self {
        self.max_download_size = max_download_size;
        self
    }

    /// Number of repositories [`sync_all`](Self::sync_all) works on at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Syncs one repository and emits its terminal state
    ///
    /// Nothing is committed unless the signer of the container is accepted
    /// and the index was parsed or patched completely. The returned report
    /// carries the repository as the caller should persist it.
    pub fn sync_repo(&self, repo: &Repo) -> Result<SyncReport> {
        let result = self.locked_sync(repo);

        let state = match &result {
            Ok(report) => {
                info!("{}: {}", repo.id, report.outcome);
                SyncState::Completed(report.outcome.clone())
            }
            Err(e) => {
                enter(repo, Phase::Failed);
                if e.is_verification_failure() {
                    warn!("{}: {e}", repo.id);
                } else {
                    debug!("{}: {e}", repo.id);
                }
                SyncState::from_error(e)
            }
        };
        self.observer.on_state(&repo.id, &state);
        result
    }

    /// Syncs every repository on a pool of [`with_concurrency`](Self::with_concurrency)
    /// threads. Results keep the order of `repos`.
    pub fn sync_all(&self, repos: &[Repo]) -> Vec<(RepoId, Result<SyncReport>)> {
        let sync = |repo: &Repo| (repo.id.clone(), self.sync_repo(repo));

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .build()
        {
            Ok(pool) => pool.install(|| repos.par_iter().map(sync).collect()),
            Err(e) => {
                warn!("Failed to start sync workers, syncing sequentially: {e}");
                repos.iter().map(sync).collect()
            }
        }
    }

    fn locked_sync(&self, repo: &Repo) -> Result<SyncReport> {
        let _guard = self.locks.acquire(&repo.id, &self.cancellation)?;
        enter(repo, Phase::Idle);

        if repo.format == IndexFormat::Current {
            match self.download_container(repo, IndexFormat::Current) {
                Err(SyncError::HttpStatus { status: 404, .. }) => info!(
                    "{} has no {}, falling back to {}",
                    repo.id,
                    IndexFormat::Current.container_name(),
                    IndexFormat::Legacy.container_name()
                ),
                result => return self.sync_current(repo, result?),
            }
        }

        let container = self.download_container(repo, IndexFormat::Legacy)?;
        self.sync_legacy(repo, container)
    }

    fn sync_current(&self, repo: &Repo, container: Arc<DownloadOutcome>) -> Result<SyncReport> {
        let DownloadOutcome::Downloaded(download) = container.as_ref() else {
            return Ok(not_modified(repo));
        };

        enter(repo, Phase::Verifying);
        let container_name = IndexFormat::Current.container_name();
        let mut container = SignedContainer::open(download.path())
            .map_err(|e| SyncError::container(container_name, e))?;
        let verified = trust::verify_entry(
            &mut container,
            ENTRY_JSON,
            repo.fingerprint.as_ref(),
            |reader| parse_entry(reader),
        )
        .map_err(|e| e.into_sync_error(repo.id.as_str(), container_name))?;
        let fingerprint = verified.fingerprint;
        let entry = verified.value?;
        self.cancellation.check()?;

        enter(repo, Phase::Negotiating);
        let base = self.store.load_index(&repo.id)?;
        let local_timestamp = local_timestamp(repo, base.as_ref());
        reject_stale(repo, local_timestamp, entry.timestamp)?;

        let index = match (negotiate::decide(&entry, local_timestamp), base) {
            (FetchPlan::UpToDate, _) => {
                return Ok(SyncReport {
                    repo: repo
                        .clone()
                        .with_fingerprint(Some(fingerprint))
                        .with_format(IndexFormat::Current),
                    outcome: SyncOutcome::UpToDate,
                });
            }
            (FetchPlan::Diff(diff), Some(base)) => match self.apply_diff(repo, &diff, base) {
                Err(SyncError::HttpStatus { status: 404, .. }) => {
                    info!("Diff {} is gone, fetching full index", diff.name);
                    self.fetch_index(repo, &entry.index)?
                }
                result => result?,
            },
            (FetchPlan::Diff(_), None) => self.fetch_index(repo, &entry.index)?,
            (FetchPlan::FullIndex(file), _) => self.fetch_index(repo, &file)?,
        };

        self.commit(
            repo,
            &fingerprint,
            index,
            entry.timestamp,
            &download.validators,
            IndexFormat::Current,
        )
    }

    fn sync_legacy(&self, repo: &Repo, container: Arc<DownloadOutcome>) -> Result<SyncReport> {
        let DownloadOutcome::Downloaded(download) = container.as_ref() else {
            return Ok(not_modified(repo));
        };

        enter(repo, Phase::Verifying);
        let container_name = IndexFormat::Legacy.container_name();
        let mut container = SignedContainer::open(download.path())
            .map_err(|e| SyncError::container(container_name, e))?;
        let verified = trust::verify_entry(
            &mut container,
            INDEX_V1_JSON,
            repo.fingerprint.as_ref(),
            |reader| parse_index_v1(reader),
        )
        .map_err(|e| e.into_sync_error(repo.id.as_str(), container_name))?;
        let index = verified.value?;
        self.cancellation.check()?;

        let timestamp = index.timestamp();
        reject_stale(repo, repo.version_info.timestamp, timestamp)?;

        self.commit(
            repo,
            &verified.fingerprint,
            index,
            timestamp,
            &download.validators,
            IndexFormat::Legacy,
        )
    }

    fn fetch_index(&self, repo: &Repo, file: &EntryFile) -> Result<IndexV2> {
        enter(repo, Phase::DownloadingIndex);
        let outcome = self.fetch(repo, &file.name, request_headers(repo, false), Some(&file.sha256))?;
        let download = downloaded(&outcome, &file.name)?;

        enter(repo, Phase::Parsing);
        Ok(parse_index(File::open(download.path())?)?)
    }

    fn apply_diff(&self, repo: &Repo, file: &EntryFile, base: IndexV2) -> Result<IndexV2> {
        enter(repo, Phase::DownloadingDiff);
        let outcome = self.fetch(repo, &file.name, request_headers(repo, false), Some(&file.sha256))?;
        let download = downloaded(&outcome, &file.name)?;

        enter(repo, Phase::Parsing);
        let diff = parse_diff(File::open(download.path())?, &file.name)?;

        enter(repo, Phase::Patching);
        Ok(patch(base, diff))
    }

    fn download_container(&self, repo: &Repo, format: IndexFormat) -> Result<Arc<DownloadOutcome>> {
        enter(repo, Phase::DownloadingEntry);
        self.fetch(repo, format.container_name(), request_headers(repo, true), None)
    }

    /// Downloads `name` relative to the repository address, sharing the
    /// transfer with any identical request already running.
    fn fetch(
        &self,
        repo: &Repo,
        name: &str,
        headers: Vec<(String, String)>,
        checksum: Option<&str>,
    ) -> Result<Arc<DownloadOutcome>> {
        self.cancellation.check()?;
        let url = repo.artifact_url(name);
        let key = dedup_key(&url, &headers, checksum);
        let file_name = name.rsplit('/').next().unwrap_or(name);

        self.in_flight.run(&key, &self.cancellation, || {
            let observer = Arc::clone(&self.observer);
            let repo_id = repo.id.clone();
            let reporter = PercentProgressReporter::new(move |percent| {
                observer.on_state(&repo_id, &SyncState::DownloadProgress(percent))
            });
            let mut downloader = HttpFileDownloader::with_client(Arc::clone(&self.client))
                .with_progress_reporter(Box::new(reporter));
            let options = DownloadOptions {
                checksum: checksum.map(str::to_string),
                headers,
                max_size: self.max_download_size,
                cancellation: Some(self.cancellation.clone()),
            };
            download_to_temp(&mut downloader, &url, file_name, &options)
        })
    }

    fn commit(
        &self,
        repo: &Repo,
        fingerprint: &Fingerprint,
        index: IndexV2,
        timestamp: i64,
        validators: &Validators,
        format: IndexFormat,
    ) -> Result<SyncReport> {
        // Last point at which a cancelled sync may still bail out.
        self.cancellation.check()?;

        enter(repo, Phase::Committing);
        let packages = index.packages.len();
        let request = CommitRequest {
            repo_id: repo.id.clone(),
            fingerprint: fingerprint.clone(),
            index,
            timestamp,
            etag: validators.etag.clone(),
            last_modified: validators.last_modified.clone(),
        };
        let version_info = request.version_info();
        self.store.commit(request)?;

        enter(repo, Phase::Done);
        Ok(SyncReport {
            repo: repo.committed(fingerprint, version_info).with_format(format),
            outcome: SyncOutcome::Updated {
                timestamp,
                packages,
            },
        })
    }
}

fn enter(repo: &Repo, phase: Phase) {
    debug!("[{}] {phase}", repo.id);
}

fn not_modified(repo: &Repo) -> SyncReport {
    SyncReport {
        repo: repo.clone(),
        outcome: SyncOutcome::NotModified,
    }
}

fn downloaded<'a>(outcome: &'a DownloadOutcome, name: &str) -> Result<&'a DownloadResult> {
    match outcome {
        DownloadOutcome::Downloaded(download) => Ok(download),
        DownloadOutcome::NotModified => Err(SyncError::ValidationError(format!(
            "Server answered 304 Not Modified to an unconditional request for {name}"
        ))),
    }
}

/// The repository's timestamp if the stored index is at that timestamp.
fn local_timestamp(repo: &Repo, base: Option<&IndexV2>) -> Option<i64> {
    let timestamp = repo.version_info.timestamp?;
    match base {
        Some(base) if base.timestamp() == timestamp => Some(timestamp),
        Some(base) => {
            info!(
                "Stored index of {} is at {}, not {timestamp}",
                repo.id,
                base.timestamp()
            );
            None
        }
        None => {
            info!("No stored index for {}", repo.id);
            None
        }
    }
}

fn reject_stale(repo: &Repo, local: Option<i64>, received: i64) -> Result<()> {
    match local {
        Some(local) if received < local => Err(SyncError::ValidationError(format!(
            "Index of {} is older than the local one: {received} < {local}",
            repo.id
        ))),
        _ => Ok(()),
    }
}

/// Validators of the last sync and credentials
///
/// Conditional validators go only on the signed container request, and only
/// when the repository has synced before. An ETag takes precedence over a
/// modification date.
pub fn request_headers(repo: &Repo, conditional: bool) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    let info = &repo.version_info;

    if conditional && info.timestamp.is_some() {
        if let Some(etag) = &info.etag {
            headers.push(("If-None-Match".to_string(), etag.clone()));
        } else if let Some(since) = info
            .last_modified
            .clone()
            .or_else(|| info.timestamp.and_then(http_date))
        {
            headers.push(("If-Modified-Since".to_string(), since));
        }
    }

    if let Some(auth) = &repo.authentication {
        headers.push(("Authorization".to_string(), auth.header_value()));
    }
    headers
}

/// RFC 7231 date of a millisecond timestamp.
pub fn http_date(timestamp_millis: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(timestamp_millis)
        .map(|time| time.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
}

/// Identical requests share a key. Headers are hashed so credentials never
/// show up in logs.
fn dedup_key(url: &str, headers: &[(String, String)], checksum: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    for (name, value) in headers {
        hasher.update(name.as_bytes());
        hasher.update(b":");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    hasher.update(checksum.unwrap_or_default().as_bytes());
    format!("{url}#{}", &hex::encode(hasher.finalize())[..16])
}
