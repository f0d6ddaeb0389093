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

//! The reconciled repository catalog in the `index-v2.json` shape.
//!
//! Both wire formats are decoded into these types. Maps are ordered so that
//! equality, hashing and serialization are deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type LocalizedString = BTreeMap<String, String>;
pub type LocalizedIcon = BTreeMap<String, FileV2>;
pub type LocalizedFiles = BTreeMap<String, Vec<FileV2>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexV2 {
    pub repo: RepoV2,
    #[serde(default)]
    pub packages: BTreeMap<String, PackageV2>,
}

impl IndexV2 {
    pub fn timestamp(&self) -> i64 {
        self.repo.timestamp
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoV2 {
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_base_url: Option<String>,
    #[serde(default)]
    pub icon: LocalizedIcon,
    #[serde(default)]
    pub name: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub anti_features: BTreeMap<String, AntiFeatureV2>,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryV2>,
    #[serde(default)]
    pub release_channels: BTreeMap<String, ReleaseChannelV2>,
    #[serde(default)]
    pub mirrors: Vec<MirrorV2>,
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileV2 {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

impl FileV2 {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorV2 {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_primary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

/// Shared shape of anti-feature and category dictionary entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagV2 {
    #[serde(default)]
    pub icon: LocalizedIcon,
    #[serde(default)]
    pub name: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
}

pub type AntiFeatureV2 = TagV2;
pub type CategoryV2 = TagV2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseChannelV2 {
    #[serde(default)]
    pub name: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageV2 {
    #[serde(default)]
    pub metadata: MetadataV2,
    /// Keyed by the SHA-256 of the release artifact.
    #[serde(default)]
    pub versions: BTreeMap<String, VersionV2>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataV2 {
    #[serde(default)]
    pub name: LocalizedString,
    #[serde(default)]
    pub summary: LocalizedString,
    #[serde(default)]
    pub description: LocalizedString,
    #[serde(default)]
    pub icon: LocalizedIcon,
    #[serde(default)]
    pub added: i64,
    #[serde(default)]
    pub last_updated: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitcoin: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
    #[serde(default)]
    pub donate: Vec<String>,
    #[serde(default)]
    pub feature_graphic: LocalizedIcon,
    #[serde(rename = "flattrID", default, skip_serializing_if = "Option::is_none")]
    pub flattr_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_tracker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liberapay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub litecoin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_collective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_signer: Option<String>,
    #[serde(default)]
    pub promo_graphic: LocalizedIcon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshots: Option<ScreenshotsV2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default)]
    pub tv_banner: LocalizedIcon,
    #[serde(default)]
    pub video: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_site: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotsV2 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<LocalizedFiles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seven_inch: Option<LocalizedFiles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ten_inch: Option<LocalizedFiles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wear: Option<LocalizedFiles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tv: Option<LocalizedFiles>,
}

impl ScreenshotsV2 {
    pub fn is_empty(&self) -> bool {
        self.phone.is_none()
            && self.seven_inch.is_none()
            && self.ten_inch.is_none()
            && self.wear.is_none()
            && self.tv.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionV2 {
    #[serde(default)]
    pub added: i64,
    #[serde(default)]
    pub file: FileV2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<FileV2>,
    #[serde(default)]
    pub whats_new: LocalizedString,
    #[serde(default)]
    pub manifest: ManifestV2,
    #[serde(default)]
    pub anti_features: BTreeMap<String, LocalizedString>,
    #[serde(default)]
    pub release_channels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestV2 {
    #[serde(default)]
    pub version_name: String,
    #[serde(default)]
    pub version_code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<SignerV2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses_sdk: Option<UsesSdkV2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sdk_version: Option<i32>,
    #[serde(default)]
    pub uses_permission: Vec<PermissionV2>,
    #[serde(default)]
    pub uses_permission_sdk23: Vec<PermissionV2>,
    #[serde(default)]
    pub features: Vec<FeatureV2>,
    #[serde(default)]
    pub nativecode: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsesSdkV2 {
    pub min_sdk_version: i32,
    pub target_sdk_version: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionV2 {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sdk_version: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureV2 {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerV2 {
    pub sha256: Vec<String>,
    #[serde(default)]
    pub has_multiple_signers: bool,
}
