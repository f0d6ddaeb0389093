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

//! Application of an [`IndexV2Diff`] onto a cached [`IndexV2`].
//!
//! The repository timestamp always becomes the diff's timestamp. Other
//! scalars take the diff value when present. Keyed maps drop tombstoned keys
//! and upsert the rest; packages and versions that already exist are patched
//! in place, new ones are patched onto an empty default. Lists are replaced
//! wholesale.

use crate::models::{
    IndexV2, IndexV2Diff, MapPatch, MetadataV2, MetadataV2Diff, PackageV2, PackageV2Diff, RepoV2,
    RepoV2Diff, VersionV2, VersionV2Diff,
};
use std::collections::BTreeMap;

pub fn patch(base: IndexV2, diff: IndexV2Diff) -> IndexV2 {
    IndexV2 {
        repo: patch_repo(base.repo, diff.repo),
        packages: merge_with(base.packages, diff.packages, patch_package),
    }
}

fn patch_repo(base: RepoV2, diff: RepoV2Diff) -> RepoV2 {
    RepoV2 {
        address: diff.address.unwrap_or(base.address),
        web_base_url: diff.web_base_url.or(base.web_base_url),
        icon: merge(base.icon, diff.icon),
        name: merge(base.name, diff.name),
        description: merge(base.description, diff.description),
        anti_features: merge(base.anti_features, diff.anti_features),
        categories: merge(base.categories, diff.categories),
        release_channels: merge(base.release_channels, diff.release_channels),
        mirrors: diff.mirrors.unwrap_or(base.mirrors),
        timestamp: diff.timestamp,
    }
}

fn patch_package(base: PackageV2, diff: PackageV2Diff) -> PackageV2 {
    PackageV2 {
        metadata: match diff.metadata {
            Some(metadata) => patch_metadata(base.metadata, metadata),
            None => base.metadata,
        },
        versions: merge_with(base.versions, diff.versions, patch_version),
    }
}

fn patch_metadata(base: MetadataV2, diff: MetadataV2Diff) -> MetadataV2 {
    MetadataV2 {
        name: merge(base.name, diff.name),
        summary: merge(base.summary, diff.summary),
        description: merge(base.description, diff.description),
        icon: merge(base.icon, diff.icon),
        added: diff.added.unwrap_or(base.added),
        last_updated: diff.last_updated.unwrap_or(base.last_updated),
        author_email: diff.author_email.or(base.author_email),
        author_name: diff.author_name.or(base.author_name),
        author_phone: diff.author_phone.or(base.author_phone),
        author_website: diff.author_website.or(base.author_website),
        bitcoin: diff.bitcoin.or(base.bitcoin),
        categories: diff.categories.unwrap_or(base.categories),
        changelog: diff.changelog.or(base.changelog),
        donate: diff.donate.unwrap_or(base.donate),
        feature_graphic: merge(base.feature_graphic, diff.feature_graphic),
        flattr_id: diff.flattr_id.or(base.flattr_id),
        issue_tracker: diff.issue_tracker.or(base.issue_tracker),
        liberapay: diff.liberapay.or(base.liberapay),
        license: diff.license.or(base.license),
        litecoin: diff.litecoin.or(base.litecoin),
        open_collective: diff.open_collective.or(base.open_collective),
        preferred_signer: diff.preferred_signer.or(base.preferred_signer),
        promo_graphic: merge(base.promo_graphic, diff.promo_graphic),
        screenshots: diff.screenshots.or(base.screenshots),
        source_code: diff.source_code.or(base.source_code),
        translation: diff.translation.or(base.translation),
        tv_banner: merge(base.tv_banner, diff.tv_banner),
        video: merge(base.video, diff.video),
        web_site: diff.web_site.or(base.web_site),
    }
}

fn patch_version(base: VersionV2, diff: VersionV2Diff) -> VersionV2 {
    VersionV2 {
        added: diff.added.unwrap_or(base.added),
        file: diff.file.unwrap_or(base.file),
        src: diff.src.or(base.src),
        whats_new: merge(base.whats_new, diff.whats_new),
        manifest: diff.manifest.unwrap_or(base.manifest),
        anti_features: merge(base.anti_features, diff.anti_features),
        release_channels: diff.release_channels.unwrap_or(base.release_channels),
    }
}

/// Drops tombstoned keys and replaces or inserts the others.
fn merge<T: Default>(base: BTreeMap<String, T>, diff: Option<MapPatch<T>>) -> BTreeMap<String, T> {
    merge_with(base, diff, |_, value| value)
}

/// Drops tombstoned keys and folds the other changes into the existing value,
/// or into a default one for new keys.
fn merge_with<T: Default, D>(
    mut base: BTreeMap<String, T>,
    diff: Option<MapPatch<D>>,
    apply: impl Fn(T, D) -> T,
) -> BTreeMap<String, T> {
    let Some(diff) = diff else {
        return base;
    };
    for (key, change) in diff {
        match change {
            None => {
                base.remove(&key);
            }
            Some(change) => {
                let current = base.remove(&key).unwrap_or_default();
                base.insert(key, apply(current, change));
            }
        }
    }
    base
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
