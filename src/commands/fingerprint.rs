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
use crate::models::IndexFormat;
use crate::trust;
use std::path::Path;

/// Prints the signer fingerprint of a container on disk.
pub struct FingerprintCommand;

impl FingerprintCommand {
    pub fn new() -> Result<Self> {
        Ok(Self)
    }

    pub fn execute(&self, path: &Path, entry: Option<&str>, formatted: bool) -> Result<()> {
        let entry = entry.unwrap_or_else(|| default_entry(path));
        let artifact = path.display().to_string();
        let fingerprint = trust::fingerprint_of(path, entry)
            .map_err(|e| e.into_sync_error(&artifact, &artifact))?;

        if formatted {
            println!("{}", fingerprint.formatted());
        } else {
            println!("{fingerprint}");
        }
        Ok(())
    }
}

/// `index-v1.json` for legacy containers, `entry.json` otherwise.
fn default_entry(path: &Path) -> &'static str {
    let legacy = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == IndexFormat::Legacy.container_name());
    if legacy {
        IndexFormat::Legacy.signed_entry_name()
    } else {
        IndexFormat::Current.signed_entry_name()
    }
}
