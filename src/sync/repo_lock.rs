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

use crate::error::Result;
use crate::models::RepoId;
use crate::sync::cancellation::CancellationToken;
use log::debug;
use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Serializes syncs of the same repository inside one process.
#[derive(Default)]
pub struct RepoLocks {
    held: Mutex<HashSet<RepoId>>,
    released: Condvar,
}

impl RepoLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until no other sync holds `repo`, or `cancellation` fires.
    pub fn acquire(
        &self,
        repo: &RepoId,
        cancellation: &CancellationToken,
    ) -> Result<RepoLockGuard<'_>> {
        let mut held = self.lock();
        let mut waited = false;
        while held.contains(repo) {
            if !waited {
                debug!("Waiting for running sync of {repo}");
                waited = true;
            }
            cancellation.check()?;
            held = self
                .released
                .wait_timeout(held, WAIT_SLICE)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        cancellation.check()?;
        held.insert(repo.clone());
        Ok(RepoLockGuard {
            locks: self,
            repo: repo.clone(),
        })
    }

    /// Acquires `repo` only if nobody holds it.
    pub fn try_acquire(&self, repo: &RepoId) -> Option<RepoLockGuard<'_>> {
        let mut held = self.lock();
        if !held.insert(repo.clone()) {
            return None;
        }
        Some(RepoLockGuard {
            locks: self,
            repo: repo.clone(),
        })
    }

    pub fn is_held(&self, repo: &RepoId) -> bool {
        self.lock().contains(repo)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<RepoId>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the repository when dropped.
pub struct RepoLockGuard<'a> {
    locks: &'a RepoLocks,
    repo: RepoId,
}

impl RepoLockGuard<'_> {
    pub fn repo(&self) -> &RepoId {
        &self.repo
    }
}

impl Drop for RepoLockGuard<'_> {
    fn drop(&mut self) {
        self.locks.lock().remove(&self.repo);
        self.locks.released.notify_all();
    }
}
