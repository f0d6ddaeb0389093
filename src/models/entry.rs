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

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Signed pointer document (`entry.json`) describing the current full index
/// and the diffs available from earlier timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub timestamp: i64,
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
    pub index: EntryFile,
    /// Keyed by the base timestamp each diff applies to.
    #[serde(default)]
    pub diffs: BTreeMap<i64, EntryFile>,
}

impl Entry {
    pub fn diff_from(&self, timestamp: i64) -> Option<&EntryFile> {
        self.diffs.get(&timestamp)
    }
}

/// A file referenced from the entry, relative to the repository address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFile {
    pub name: String,
    pub sha256: String,
    pub size: u64,
    #[serde(default)]
    pub num_packages: u64,
}
