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

//! Choice between a diff and the full index for a verified entry.

use crate::models::{Entry, EntryFile};
use log::{debug, info};

/// What has to be downloaded to bring a local catalog to the entry's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPlan {
    UpToDate,
    FullIndex(EntryFile),
    Diff(EntryFile),
}

/// Picks a diff when the entry offers one starting at `local_timestamp`.
/// Anything else, including an unknown or too old timestamp, degrades to the
/// full index.
pub fn decide(entry: &Entry, local_timestamp: Option<i64>) -> FetchPlan {
    let Some(local_timestamp) = local_timestamp else {
        debug!("No local catalog, fetching full index {}", entry.index.name);
        return FetchPlan::FullIndex(entry.index.clone());
    };

    if local_timestamp == entry.timestamp {
        return FetchPlan::UpToDate;
    }

    match entry.diff_from(local_timestamp) {
        Some(diff) if diff.name != entry.index.name => {
            debug!("Using diff {} from timestamp {local_timestamp}", diff.name);
            FetchPlan::Diff(diff.clone())
        }
        _ => {
            info!(
                "No diff from timestamp {local_timestamp} to {}, fetching full index",
                entry.timestamp
            );
            FetchPlan::FullIndex(entry.index.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn file(name: &str) -> EntryFile {
        EntryFile {
            name: name.to_string(),
            sha256: "00".repeat(32),
            size: 10,
            num_packages: 1,
        }
    }

    fn entry() -> Entry {
        Entry {
            timestamp: 300,
            version: 20002,
            max_age: None,
            index: file("/index-v2.json"),
            diffs: BTreeMap::from([(100, file("/diff/100.json")), (200, file("/diff/200.json"))]),
        }
    }

    #[test]
    fn test_no_local_catalog_fetches_full_index() {
        assert_eq!(
            decide(&entry(), None),
            FetchPlan::FullIndex(file("/index-v2.json"))
        );
    }

    #[test]
    fn test_same_timestamp_is_up_to_date() {
        assert_eq!(decide(&entry(), Some(300)), FetchPlan::UpToDate);
    }

    #[test]
    fn test_known_timestamp_uses_diff() {
        assert_eq!(
            decide(&entry(), Some(200)),
            FetchPlan::Diff(file("/diff/200.json"))
        );
        assert_eq!(
            decide(&entry(), Some(100)),
            FetchPlan::Diff(file("/diff/100.json"))
        );
    }

    #[test]
    fn test_unknown_timestamp_falls_back_to_full_index() {
        assert_eq!(
            decide(&entry(), Some(50)),
            FetchPlan::FullIndex(file("/index-v2.json"))
        );
        // Newer than the entry: still a full fetch, never an error.
        assert_eq!(
            decide(&entry(), Some(400)),
            FetchPlan::FullIndex(file("/index-v2.json"))
        );
    }

    #[test]
    fn test_diff_named_like_index_falls_back_to_full_index() {
        let mut entry = entry();
        entry.diffs.insert(250, file("/index-v2.json"));
        assert_eq!(
            decide(&entry, Some(250)),
            FetchPlan::FullIndex(file("/index-v2.json"))
        );
    }
}
