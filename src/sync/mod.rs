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

//! Repository synchronization
//!
//! A sync downloads the signed container of a repository, verifies its
//! signer against the pinned fingerprint, negotiates between a diff and the
//! full index and hands the reconciled index to an [`IndexStore`].

pub mod cancellation;
mod inflight;
mod orchestrator;
pub mod probe;
mod repo_lock;
mod state;
pub mod storage;

pub use cancellation::{CancellationToken, signal_token};
pub use inflight::InFlight;
pub use orchestrator::{DEFAULT_CONCURRENCY, Syncer, http_date, request_headers};
pub use probe::{ResolvedAddress, resolve_address};
pub use repo_lock::{RepoLockGuard, RepoLocks};
pub use state::{NoopObserver, Phase, SyncObserver, SyncOutcome, SyncReport, SyncState};
pub use storage::{CommitRequest, FileIndexStore, IndexStore, RepoState};
