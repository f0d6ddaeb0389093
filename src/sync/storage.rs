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

//! Persistence of reconciled indexes.

use crate::error::{Result, SyncError};
use crate::fingerprint::Fingerprint;
use crate::models::{IndexV2, RepoId, VersionInfo};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index-v2.json";
const STATE_FILE: &str = "state.json";

/// Everything a successful sync hands to storage, as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub repo_id: RepoId,
    pub fingerprint: Fingerprint,
    pub index: IndexV2,
    pub timestamp: i64,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl CommitRequest {
    pub fn version_info(&self) -> VersionInfo {
        VersionInfo {
            timestamp: Some(self.timestamp),
            etag: self.etag.clone(),
            last_modified: self.last_modified.clone(),
        }
    }
}

/// Storage collaborator of the sync engine.
pub trait IndexStore: Send + Sync {
    /// The last committed index of `repo`, if any.
    fn load_index(&self, repo: &RepoId) -> Result<Option<IndexV2>>;

    /// Persists a reconciled index. A sync only completes once this returns
    /// `Ok`.
    fn commit(&self, request: CommitRequest) -> Result<()>;
}

/// Sync cursor and signer stored next to each committed index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoState {
    pub fingerprint: Fingerprint,
    #[serde(flatten)]
    pub version_info: VersionInfo,
}

/// Stores every repository under `<root>/repos/<id>/`.
pub struct FileIndexStore {
    root: PathBuf,
}

impl FileIndexStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn repo_dir(&self, repo: &RepoId) -> PathBuf {
        self.root.join("repos").join(repo.as_str())
    }

    pub fn index_path(&self, repo: &RepoId) -> PathBuf {
        self.repo_dir(repo).join(INDEX_FILE)
    }

    fn state_path(&self, repo: &RepoId) -> PathBuf {
        self.repo_dir(repo).join(STATE_FILE)
    }

    /// The signer and cursor of the last commit, if any.
    pub fn load_state(&self, repo: &RepoId) -> Result<Option<RepoState>> {
        let path = self.state_path(repo);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path).map_err(|e| {
            SyncError::Storage(format!("Failed to read {}: {e}", path.display()))
        })?;
        let state = serde_json::from_str(&contents).map_err(|e| {
            SyncError::Storage(format!("Corrupt sync state {}: {e}", path.display()))
        })?;
        Ok(Some(state))
    }

    /// Removes everything stored for `repo`.
    pub fn remove(&self, repo: &RepoId) -> Result<()> {
        let dir = self.repo_dir(repo);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| {
                SyncError::Storage(format!("Failed to remove {}: {e}", dir.display()))
            })?;
        }
        Ok(())
    }
}

impl IndexStore for FileIndexStore {
    fn load_index(&self, repo: &RepoId) -> Result<Option<IndexV2>> {
        let path = self.index_path(repo);
        if !path.exists() {
            return Ok(None);
        }
        let file = fs::File::open(&path).map_err(|e| {
            SyncError::Storage(format!("Failed to open {}: {e}", path.display()))
        })?;
        let index = serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| {
            SyncError::Storage(format!("Corrupt stored index {}: {e}", path.display()))
        })?;
        Ok(Some(index))
    }

    fn commit(&self, request: CommitRequest) -> Result<()> {
        let dir = self.repo_dir(&request.repo_id);
        fs::create_dir_all(&dir).map_err(|e| {
            SyncError::Storage(format!("Failed to create {}: {e}", dir.display()))
        })?;

        let state = RepoState {
            fingerprint: request.fingerprint.clone(),
            version_info: request.version_info(),
        };
        let index_json = serde_json::to_vec(&request.index)?;
        let state_json = serde_json::to_vec_pretty(&state)?;

        // The index goes first: a state file never points past its index.
        write_atomic(&self.index_path(&request.repo_id), &index_json)?;
        write_atomic(&self.state_path(&request.repo_id), &state_json)?;

        debug!(
            "Committed index {} of {} ({} packages)",
            request.timestamp,
            request.repo_id,
            request.index.packages.len()
        );
        Ok(())
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    if temp_path.exists() {
        fs::remove_file(&temp_path).map_err(|e| {
            SyncError::Storage(format!("Failed to remove old temp file: {e}"))
        })?;
    }
    fs::write(&temp_path, contents).map_err(|e| {
        SyncError::Storage(format!("Failed to write {}: {e}", temp_path.display()))
    })?;
    fs::rename(&temp_path, path).map_err(|e| {
        SyncError::Storage(format!("Failed to rename {}: {e}", temp_path.display()))
    })
}
