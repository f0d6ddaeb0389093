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

use crate::error::{Result, SyncError};
use crate::fingerprint::Fingerprint;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a configured repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoId(String);

impl RepoId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\') {
            return Err(SyncError::ValidationError(format!(
                "Invalid repository name '{id}'"
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire format a repository publishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexFormat {
    /// Monolithic `index-v1.jar`.
    Legacy,
    /// `entry.jar` pointing at `index-v2.json` and diffs.
    #[default]
    Current,
}

impl IndexFormat {
    /// Name of the signed container fetched first.
    pub fn container_name(&self) -> &'static str {
        match self {
            IndexFormat::Legacy => "index-v1.jar",
            IndexFormat::Current => "entry.jar",
        }
    }

    /// Name of the signed member inside that container.
    pub fn signed_entry_name(&self) -> &'static str {
        match self {
            IndexFormat::Legacy => "index-v1.json",
            IndexFormat::Current => "entry.json",
        }
    }
}

impl fmt::Display for IndexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexFormat::Legacy => write!(f, "legacy"),
            IndexFormat::Current => write!(f, "current"),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
    pub username: String,
    pub password: String,
}

impl Authentication {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value for the `Authorization` header (HTTP Basic).
    pub fn header_value(&self) -> String {
        let credentials = format!("{}:{}", self.username, self.password);
        format!("Basic {}", BASE64.encode(credentials))
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authentication")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What was last committed for a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VersionInfo {
    /// Catalog timestamp of the committed index; `None` before the first sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    pub id: RepoId,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Authentication>,
    #[serde(default)]
    pub version_info: VersionInfo,
    #[serde(default)]
    pub format: IndexFormat,
}

impl Repo {
    pub fn new(id: RepoId, address: &str) -> Self {
        Self {
            id,
            address: normalize_address(address),
            fingerprint: None,
            authentication: None,
            version_info: VersionInfo::default(),
            format: IndexFormat::default(),
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: Option<Fingerprint>) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    pub fn with_authentication(mut self, authentication: Option<Authentication>) -> Self {
        self.authentication = authentication;
        self
    }

    pub fn with_format(mut self, format: IndexFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_version_info(mut self, version_info: VersionInfo) -> Self {
        self.version_info = version_info;
        self
    }

    /// Absolute URL of a file published by this repository.
    pub fn artifact_url(&self, name: &str) -> String {
        format!("{}/{}", self.address, name.trim_start_matches('/'))
    }

    /// The repository as it looks after a successful commit.
    pub fn committed(&self, fingerprint: &Fingerprint, version_info: VersionInfo) -> Self {
        Self {
            fingerprint: Some(fingerprint.clone()),
            version_info,
            ..self.clone()
        }
    }
}

/// Strips trailing slashes so artifact URLs join cleanly.
pub fn normalize_address(address: &str) -> String {
    address.trim().trim_end_matches('/').to_string()
}
