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

use crate::error::SyncError;
use crate::fingerprint::Fingerprint;
use crate::models::{IndexFormat, Repo, RepoId};
use std::fmt;

/// Step a repository sync is in. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    DownloadingEntry,
    Verifying,
    Negotiating,
    DownloadingIndex,
    DownloadingDiff,
    Parsing,
    Patching,
    Committing,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::DownloadingEntry => "downloading entry",
            Phase::Verifying => "verifying",
            Phase::Negotiating => "negotiating",
            Phase::DownloadingIndex => "downloading index",
            Phase::DownloadingDiff => "downloading diff",
            Phase::Parsing => "parsing",
            Phase::Patching => "patching",
            Phase::Committing => "committing",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How a successful sync ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new index was committed.
    Updated { timestamp: i64, packages: usize },
    /// The entry matched the local index, nothing was committed.
    UpToDate,
    /// The server answered `304 Not Modified` for the signed container.
    NotModified,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Updated {
                timestamp,
                packages,
            } => write!(f, "updated to {timestamp} ({packages} packages)"),
            SyncOutcome::UpToDate => f.write_str("up to date"),
            SyncOutcome::NotModified => f.write_str("not modified"),
        }
    }
}

/// Result of one repository sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The repository as the caller should persist it: pinned fingerprint,
    /// advanced version info and the format that was actually used.
    pub repo: Repo,
    pub outcome: SyncOutcome,
}

impl SyncReport {
    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.repo.fingerprint.as_ref()
    }

    pub fn format(&self) -> IndexFormat {
        self.repo.format
    }
}

/// Event emitted while a repository syncs
///
/// Zero or more `DownloadProgress` events are followed by exactly one of the
/// other variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    /// Percentage of the current download, `-1` when its size is unknown.
    DownloadProgress(i32),
    VerificationFailed(String),
    ParseFailed(String),
    /// Transport, storage, validation and cancellation failures.
    Failed(String),
    Completed(SyncOutcome),
}

impl SyncState {
    /// Terminal event describing `error`.
    pub fn from_error(error: &SyncError) -> Self {
        if error.is_verification_failure() {
            SyncState::VerificationFailed(error.to_string())
        } else if error.is_parse_failure() {
            SyncState::ParseFailed(error.to_string())
        } else {
            SyncState::Failed(error.to_string())
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SyncState::DownloadProgress(_))
    }
}

/// Receives the state stream of every repository a [`Syncer`](super::Syncer)
/// works on. Called from worker threads.
pub trait SyncObserver: Send + Sync {
    fn on_state(&self, repo: &RepoId, state: &SyncState);
}

impl<F> SyncObserver for F
where
    F: Fn(&RepoId, &SyncState) + Send + Sync,
{
    fn on_state(&self, repo: &RepoId, state: &SyncState) {
        self(repo, state)
    }
}

/// Observer that drops every event.
pub struct NoopObserver;

impl SyncObserver for NoopObserver {
    fn on_state(&self, _repo: &RepoId, _state: &SyncState) {}
}
