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

//! Deduplication of concurrent fetches of the same resource.

use crate::error::{Result, SyncError};
use crate::sync::cancellation::CancellationToken;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const WAIT_SLICE: Duration = Duration::from_millis(100);

type Shared<T> = std::result::Result<Arc<T>, Arc<SyncError>>;

struct Slot<T> {
    result: Mutex<Option<Shared<T>>>,
    ready: Condvar,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            ready: Condvar::new(),
        }
    }
}

/// Fetches keyed by resolved URL and request headers
///
/// The first caller for a key runs the fetch, callers arriving while it runs
/// wait and receive the same result. A key is forgotten as soon as its fetch
/// finishes, whether it succeeded or not.
pub struct InFlight<T> {
    slots: Mutex<HashMap<String, Arc<Slot<T>>>>,
}

impl<T> Default for InFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InFlight<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Number of fetches currently running.
    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `fetch` unless a fetch for `key` is already running, in which
    /// case its result is shared. Waiting stops early when `cancellation`
    /// fires.
    pub fn run(
        &self,
        key: &str,
        cancellation: &CancellationToken,
        fetch: impl FnOnce() -> Result<T>,
    ) -> Result<Arc<T>> {
        let (slot, leader) = {
            let mut slots = lock(&self.slots);
            match slots.get(key) {
                Some(slot) => (Arc::clone(slot), false),
                None => {
                    let slot = Arc::new(Slot::new());
                    slots.insert(key.to_string(), Arc::clone(&slot));
                    (slot, true)
                }
            }
        };

        if leader {
            let _release = Release {
                slots: &self.slots,
                slot: &slot,
                key,
            };
            let shared = fetch().map(Arc::new).map_err(Arc::new);
            *lock(&slot.result) = Some(shared.clone());
            return unshare(shared);
        }

        debug!("Joining in-flight fetch of {key}");
        let mut result = lock(&slot.result);
        loop {
            if let Some(shared) = result.as_ref() {
                return unshare(shared.clone());
            }
            cancellation.check()?;
            result = slot
                .ready
                .wait_timeout(result, WAIT_SLICE)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

/// Wakes the followers of a leader and forgets its key, including when the
/// fetch unwinds before producing a result.
struct Release<'a, T> {
    slots: &'a Mutex<HashMap<String, Arc<Slot<T>>>>,
    slot: &'a Slot<T>,
    key: &'a str,
}

impl<T> Drop for Release<'_, T> {
    fn drop(&mut self) {
        {
            let mut result = lock(&self.slot.result);
            if result.is_none() {
                *result = Some(Err(Arc::new(SyncError::NetworkError(format!(
                    "Fetch of {} was abandoned",
                    self.key
                )))));
            }
        }
        self.slot.ready.notify_all();
        lock(self.slots).remove(self.key);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unshare<T>(shared: Shared<T>) -> Result<Arc<T>> {
    shared.map_err(|error| match Arc::try_unwrap(error) {
        Ok(error) => error,
        Err(error) => replicate(&error),
    })
}

/// Copy of a failure handed to every caller of a shared fetch. Variants
/// that carry non-cloneable sources are flattened to their message.
fn replicate(error: &SyncError) -> SyncError {
    match error {
        SyncError::NetworkError(message) => SyncError::NetworkError(message.clone()),
        SyncError::HttpStatus { url, status } => SyncError::HttpStatus {
            url: url.clone(),
            status: *status,
        },
        SyncError::ChecksumMismatch {
            artifact,
            expected,
            actual,
        } => SyncError::ChecksumMismatch {
            artifact: artifact.clone(),
            expected: expected.clone(),
            actual: actual.clone(),
        },
        SyncError::ValidationError(message) => SyncError::ValidationError(message.clone()),
        SyncError::Storage(message) => SyncError::Storage(message.clone()),
        SyncError::Cancelled => SyncError::Cancelled,
        other => SyncError::NetworkError(other.to_string()),
    }
}
