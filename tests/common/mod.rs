//! Fixtures and doubles shared by the integration tests.
#![allow(dead_code)]

use fdsync::error::Result;
use fdsync::fingerprint::Fingerprint;
use fdsync::models::{IndexV2, Repo, RepoId, VersionInfo};
use fdsync::parser::parse_index;
use fdsync::sync::{CommitRequest, IndexStore, SyncObserver, SyncState};
use mockito::{Mock, ServerGuard};
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

/// Signer of `first/entry.jar`, `second/entry.jar` and `legacy/index-v1.jar`.
pub const FINGERPRINT_A: &str = "C3A121B852EAE62F27F8B96ECCE03426F57517948BBBCAB2F9D31816BB84AE79";
/// Signer of `first/entry-other.jar`.
pub const FINGERPRINT_B: &str = "4B51B30DD986CA2B0622EEAE161AD1997CF87006E45B1C2376AC4A9DE9D756AF";

pub fn fixture_path(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(path)
}

pub fn fixture_bytes(path: &str) -> Vec<u8> {
    fs::read(fixture_path(path)).unwrap()
}

pub fn fixture_index(path: &str) -> IndexV2 {
    parse_index(File::open(fixture_path(path)).unwrap()).unwrap()
}

pub fn fingerprint_a() -> Fingerprint {
    Fingerprint::parse(FINGERPRINT_A).unwrap()
}

pub fn fingerprint_b() -> Fingerprint {
    Fingerprint::parse(FINGERPRINT_B).unwrap()
}

/// Repository served from `<server>/repo`.
pub fn repo(server: &ServerGuard, name: &str) -> Repo {
    Repo::new(RepoId::new(name).unwrap(), &format!("{}/repo", server.url()))
}

pub fn synced_at(repo: Repo, timestamp: i64) -> Repo {
    repo.with_version_info(VersionInfo {
        timestamp: Some(timestamp),
        etag: None,
        last_modified: None,
    })
}

/// Serves a fixture file under `/repo/<name>`.
pub fn serve(server: &mut ServerGuard, name: &str, fixture: &str) -> Mock {
    let body = fixture_bytes(fixture);
    server
        .mock("GET", format!("/repo/{name}").as_str())
        .with_status(200)
        .with_header("content-length", &body.len().to_string())
        .with_body(body)
        .create()
}

pub fn serve_status(server: &mut ServerGuard, name: &str, status: usize) -> Mock {
    server
        .mock("GET", format!("/repo/{name}").as_str())
        .with_status(status)
        .create()
}

/// Index store kept in memory that records every commit.
#[derive(Default)]
pub struct MemoryStore {
    indexes: Mutex<HashMap<RepoId, IndexV2>>,
    commits: Mutex<Vec<CommitRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(self, repo: &Repo, index: IndexV2) -> Self {
        self.indexes.lock().unwrap().insert(repo.id.clone(), index);
        self
    }

    pub fn commits(&self) -> Vec<CommitRequest> {
        self.commits.lock().unwrap().clone()
    }

    pub fn index(&self, repo: &Repo) -> Option<IndexV2> {
        self.indexes.lock().unwrap().get(&repo.id).cloned()
    }
}

impl IndexStore for MemoryStore {
    fn load_index(&self, repo: &RepoId) -> Result<Option<IndexV2>> {
        Ok(self.indexes.lock().unwrap().get(repo).cloned())
    }

    fn commit(&self, request: CommitRequest) -> Result<()> {
        self.indexes
            .lock()
            .unwrap()
            .insert(request.repo_id.clone(), request.index.clone());
        self.commits.lock().unwrap().push(request);
        Ok(())
    }
}

/// Observer that keeps every event in arrival order.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(RepoId, SyncState)>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self, repo: &Repo) -> Vec<SyncState> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == repo.id)
            .map(|(_, state)| state.clone())
            .collect()
    }

    pub fn terminal(&self, repo: &Repo) -> Vec<SyncState> {
        self.states(repo)
            .into_iter()
            .filter(SyncState::is_terminal)
            .collect()
    }
}

impl SyncObserver for RecordingObserver {
    fn on_state(&self, repo: &RepoId, state: &SyncState) {
        self.events
            .lock()
            .unwrap()
            .push((repo.clone(), state.clone()));
    }
}
