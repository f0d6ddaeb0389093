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

//! Partial updates between two published catalog timestamps.
//!
//! An absent or `null` field leaves the base value untouched. Inside keyed
//! maps a `null` value deletes the key, any other value inserts or updates it.
//! Every diff carries the timestamp of the catalog it produces.

use super::index::{
    AntiFeatureV2, CategoryV2, FileV2, LocalizedString, ManifestV2, MirrorV2, ReleaseChannelV2,
    ScreenshotsV2,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keyed upserts, `None` being a deletion.
pub type MapPatch<T> = BTreeMap<String, Option<T>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexV2Diff {
    pub repo: RepoV2Diff,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<MapPatch<PackageV2Diff>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoV2Diff {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<MapPatch<FileV2>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<MapPatch<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<MapPatch<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anti_features: Option<MapPatch<AntiFeatureV2>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<MapPatch<CategoryV2>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_channels: Option<MapPatch<ReleaseChannelV2>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirrors: Option<Vec<MirrorV2>>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageV2Diff {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataV2Diff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<MapPatch<VersionV2Diff>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataV2Diff {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<MapPatch<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<MapPatch<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<MapPatch<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<MapPatch<FileV2>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donate: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_graphic: Option<MapPatch<FileV2>>,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_graphic: Option<MapPatch<FileV2>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshots: Option<ScreenshotsV2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tv_banner: Option<MapPatch<FileV2>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<MapPatch<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_site: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionV2Diff {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileV2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<FileV2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whats_new: Option<MapPatch<String>>,
    /// Replaces the whole manifest when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestV2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anti_features: Option<MapPatch<LocalizedString>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_channels: Option<Vec<String>>,
}
