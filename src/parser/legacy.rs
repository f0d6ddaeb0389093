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

//! Streaming decoder for the monolithic `index-v1.json` format.
//!
//! The document is visited key by key. Each app and each package version is
//! converted as soon as it is decoded, so only the converted catalog is kept
//! in memory. Because `repo` usually sorts after `apps` and `packages`, the
//! final assembly happens once the whole document has been read.

use super::ParseError;
use crate::models::legacy::{AppV1, LocalizedV1, PackageV1, PermissionV1, RepoV1};
use crate::models::{
    FeatureV2, FileV2, IndexV2, LocalizedFiles, LocalizedIcon, LocalizedString, ManifestV2,
    MetadataV2, MirrorV2, PackageV2, PermissionV2, RepoV2, ScreenshotsV2, SignerV2, TagV2,
    UsesSdkV2, VersionV2,
};
use log::debug;
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::io::{BufReader, Read};

pub const INDEX_V1_JSON: &str = "index-v1.json";

/// Locale assigned to text the legacy format does not localize.
const DEFAULT_LOCALE: &str = "en-US";

pub fn parse_index_v1<R: Read>(reader: R) -> Result<IndexV2, ParseError> {
    let mut deserializer = serde_json::Deserializer::from_reader(BufReader::new(reader));
    let builder = DocumentSeed
        .deserialize(&mut deserializer)
        .map_err(|e| ParseError::new(INDEX_V1_JSON, e))?;
    deserializer
        .end()
        .map_err(|e| ParseError::new(INDEX_V1_JSON, e))?;
    builder.finish()
}

struct ConvertedApp {
    metadata: MetadataV2,
    anti_features: Vec<String>,
    whats_new: LocalizedString,
}

struct ConvertedVersion {
    hash: String,
    signer: Option<String>,
    anti_features: Vec<String>,
    version: VersionV2,
}

#[derive(Default)]
struct IndexBuilder {
    repo: Option<RepoV1>,
    anti_features: BTreeSet<String>,
    categories: BTreeSet<String>,
    apps: BTreeMap<String, ConvertedApp>,
    versions: BTreeMap<String, Vec<ConvertedVersion>>,
}

impl IndexBuilder {
    fn add_app(&mut self, app: AppV1) {
        if self.apps.contains_key(&app.package_name) {
            debug!("Ignoring duplicate app entry for {}", app.package_name);
            return;
        }
        let anti_features = ordered_unique(app.anti_features.iter().cloned());
        self.anti_features.extend(anti_features.iter().cloned());
        self.categories.extend(app.categories.iter().cloned());

        let whats_new = localized_string(None, &app.localized, |l| l.whats_new.as_deref());
        let package_name = app.package_name.clone();
        self.apps.insert(
            package_name,
            ConvertedApp {
                metadata: convert_metadata(app),
                anti_features,
                whats_new,
            },
        );
    }

    fn add_version(&mut self, package_name: &str, package: PackageV1) {
        let anti_features = ordered_unique(package.anti_features.iter().cloned());
        self.anti_features.extend(anti_features.iter().cloned());

        let converted = ConvertedVersion {
            hash: package.hash.clone(),
            signer: package.signer.clone(),
            anti_features,
            version: convert_version(package),
        };
        self.versions
            .entry(package_name.to_string())
            .or_default()
            .push(converted);
    }

    fn finish(mut self) -> Result<IndexV2, ParseError> {
        let repo = self
            .repo
            .take()
            .ok_or_else(|| ParseError::new(INDEX_V1_JSON, "missing field `repo`"))?;

        let mut packages = BTreeMap::new();
        for (package_name, app) in std::mem::take(&mut self.apps) {
            let versions = self.versions.remove(&package_name).unwrap_or_default();
            packages.insert(package_name, assemble_package(app, versions));
        }
        if !self.versions.is_empty() {
            debug!(
                "Dropping versions of {} packages without app metadata",
                self.versions.len()
            );
        }

        Ok(IndexV2 {
            repo: convert_repo(repo, &self.anti_features, &self.categories),
            packages,
        })
    }
}

fn assemble_package(app: ConvertedApp, versions: Vec<ConvertedVersion>) -> PackageV2 {
    let ConvertedApp {
        mut metadata,
        anti_features,
        whats_new,
    } = app;
    metadata.preferred_signer = versions.first().and_then(|v| v.signer.clone());

    let versions = versions
        .into_iter()
        .map(|converted| {
            let mut version = converted.version;
            version.whats_new = whats_new.clone();
            version.anti_features = anti_features
                .iter()
                .chain(converted.anti_features.iter())
                .map(|name| (name.clone(), default_localized(name)))
                .collect();
            (converted.hash, version)
        })
        .collect();

    PackageV2 { metadata, versions }
}

fn convert_repo(
    repo: RepoV1,
    anti_features: &BTreeSet<String>,
    categories: &BTreeSet<String>,
) -> RepoV2 {
    let tag = |name: &String, icon: String| TagV2 {
        icon: BTreeMap::from([(DEFAULT_LOCALE.to_string(), FileV2::named(icon))]),
        name: default_localized(name),
        description: LocalizedString::new(),
    };

    let mirrors = ordered_unique(std::iter::once(repo.address.clone()).chain(repo.mirrors))
        .into_iter()
        .filter(|url| !url.is_empty())
        .map(|url| MirrorV2 {
            is_primary: (url == repo.address).then_some(true),
            url,
            country_code: None,
        })
        .collect();

    RepoV2 {
        web_base_url: None,
        icon: repo
            .icon
            .as_deref()
            .map(|icon| {
                BTreeMap::from([(
                    DEFAULT_LOCALE.to_string(),
                    FileV2::named(format!("/icons/{icon}")),
                )])
            })
            .unwrap_or_default(),
        name: non_empty_localized(&repo.name),
        description: non_empty_localized(&repo.description),
        anti_features: anti_features
            .iter()
            .map(|name| {
                let icon = format!("/icons/ic_antifeature_{}.png", normalize_tag(name));
                (name.clone(), tag(name, icon))
            })
            .collect(),
        categories: categories
            .iter()
            .map(|name| {
                let icon = format!("/icons/category_{}.png", normalize_tag(name));
                (name.clone(), tag(name, icon))
            })
            .collect(),
        release_channels: BTreeMap::new(),
        mirrors,
        timestamp: repo.timestamp,
        address: repo.address,
    }
}

fn convert_metadata(app: AppV1) -> MetadataV2 {
    let package = app.package_name.as_str();
    let localized = &app.localized;

    MetadataV2 {
        name: localized_string(app.name.as_deref(), localized, |l| l.name.as_deref()),
        summary: localized_string(app.summary.as_deref(), localized, |l| l.summary.as_deref()),
        description: localized_string(app.description.as_deref(), localized, |l| {
            l.description.as_deref()
        }),
        icon: localized_icon(package, app.icon.as_deref(), localized, |l| l.icon.as_deref()),
        added: app.added.unwrap_or(0),
        last_updated: app.last_updated.unwrap_or(0),
        author_email: app.author_email.clone(),
        author_name: app.author_name.clone(),
        author_phone: app.author_phone.clone(),
        author_website: app.author_web_site.clone().or_else(|| app.web_site.clone()),
        bitcoin: app.bitcoin.clone(),
        categories: ordered_unique(app.categories.iter().cloned()),
        changelog: app.changelog.clone(),
        donate: app.donate.clone().into_iter().collect(),
        feature_graphic: localized_icon(package, None, localized, |l| {
            l.feature_graphic.as_deref()
        }),
        flattr_id: app.flattr_id.clone(),
        issue_tracker: app.issue_tracker.clone(),
        liberapay: app.liberapay.clone(),
        license: Some(app.license.clone()).filter(|license| !license.is_empty()),
        litecoin: app.litecoin.clone(),
        open_collective: app.open_collective.clone(),
        preferred_signer: None,
        promo_graphic: localized_icon(package, None, localized, |l| l.promo_graphic.as_deref()),
        screenshots: screenshots(package, localized),
        source_code: app.source_code.clone(),
        translation: app.translation.clone(),
        tv_banner: localized_icon(package, None, localized, |l| l.tv_banner.as_deref()),
        video: localized_string(None, localized, |l| l.video.as_deref()),
        web_site: app.web_site.clone(),
    }
}

fn convert_version(package: PackageV1) -> VersionV2 {
    let signer = package.signer.as_ref().map(|signer| SignerV2 {
        sha256: vec![signer.clone()],
        has_multiple_signers: false,
    });
    let uses_sdk = match (package.min_sdk_version, package.target_sdk_version) {
        (None, None) => None,
        (min, target) => Some(UsesSdkV2 {
            min_sdk_version: min.unwrap_or(1),
            target_sdk_version: target.or(min).unwrap_or(1),
        }),
    };

    VersionV2 {
        added: package.added.unwrap_or(0),
        file: FileV2 {
            name: format!("/{}", package.apk_name),
            sha256: Some(package.hash),
            size: Some(package.size),
        },
        src: package.src_name.map(|src| FileV2::named(format!("/{src}"))),
        whats_new: LocalizedString::new(),
        manifest: ManifestV2 {
            version_name: package.version_name,
            version_code: package.version_code.unwrap_or(0),
            signer,
            uses_sdk,
            max_sdk_version: package.max_sdk_version,
            uses_permission: permissions(package.uses_permission),
            uses_permission_sdk23: permissions(package.uses_permission_sdk23),
            features: ordered_unique(package.features)
                .into_iter()
                .map(|name| FeatureV2 { name })
                .collect(),
            nativecode: package.nativecode,
        },
        anti_features: BTreeMap::new(),
        release_channels: Vec::new(),
    }
}

fn permissions(permissions: Vec<PermissionV1>) -> Vec<PermissionV2> {
    let mut seen = HashSet::new();
    permissions
        .into_iter()
        .filter(|p| seen.insert((p.name.clone(), p.max_sdk)))
        .map(|p| PermissionV2 {
            name: p.name,
            max_sdk_version: p.max_sdk,
        })
        .collect()
}

/// The unlocalized value under the default locale if present, otherwise every
/// locale that provides one.
fn localized_string(
    default: Option<&str>,
    localized: &BTreeMap<String, LocalizedV1>,
    select: impl Fn(&LocalizedV1) -> Option<&str>,
) -> LocalizedString {
    if let Some(value) = default {
        return default_localized(value);
    }
    localized
        .iter()
        .filter_map(|(locale, l)| select(l).map(|value| (locale.clone(), value.to_string())))
        .collect()
}

fn localized_icon(
    package: &str,
    default: Option<&str>,
    localized: &BTreeMap<String, LocalizedV1>,
    select: impl Fn(&LocalizedV1) -> Option<&str>,
) -> LocalizedIcon {
    if let Some(file) = default {
        return BTreeMap::from([(
            DEFAULT_LOCALE.to_string(),
            FileV2::named(format!("/{package}/{DEFAULT_LOCALE}/{file}")),
        )]);
    }
    localized
        .iter()
        .filter_map(|(locale, l)| {
            select(l).map(|file| {
                (
                    locale.clone(),
                    FileV2::named(format!("/{package}/{locale}/{file}")),
                )
            })
        })
        .collect()
}

fn screenshots(
    package: &str,
    localized: &BTreeMap<String, LocalizedV1>,
) -> Option<ScreenshotsV2> {
    let collect = |kind: &str, select: fn(&LocalizedV1) -> &Vec<String>| -> Option<LocalizedFiles> {
        let files: LocalizedFiles = localized
            .iter()
            .filter(|(_, l)| !select(l).is_empty())
            .map(|(locale, l)| {
                let files = select(l)
                    .iter()
                    .map(|file| FileV2::named(format!("/{package}/{locale}/{kind}/{file}")))
                    .collect();
                (locale.clone(), files)
            })
            .collect();
        (!files.is_empty()).then_some(files)
    };

    let screenshots = ScreenshotsV2 {
        phone: collect("phoneScreenshots", |l| &l.phone_screenshots),
        seven_inch: collect("sevenInchScreenshots", |l| &l.seven_inch_screenshots),
        ten_inch: collect("tenInchScreenshots", |l| &l.ten_inch_screenshots),
        wear: collect("wearScreenshots", |l| &l.wear_screenshots),
        tv: collect("tvScreenshots", |l| &l.tv_screenshots),
    };
    (!screenshots.is_empty()).then_some(screenshots)
}

fn default_localized(value: &str) -> LocalizedString {
    BTreeMap::from([(DEFAULT_LOCALE.to_string(), value.to_string())])
}

fn non_empty_localized(value: &str) -> LocalizedString {
    if value.is_empty() {
        LocalizedString::new()
    } else {
        default_localized(value)
    }
}

/// "Science & Education" becomes "science_education".
fn normalize_tag(name: &str) -> String {
    name.to_lowercase().replace(" & ", "_")
}

/// Removes repeated values, keeping the first occurrence of each.
fn ordered_unique(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

struct DocumentSeed;

impl<'de> DeserializeSeed<'de> for DocumentSeed {
    type Value = IndexBuilder;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_map(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = IndexBuilder;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an index-v1 document")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut builder = IndexBuilder::default();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "repo" => builder.repo = Some(map.next_value()?),
                "apps" => map.next_value_seed(AppsSeed(&mut builder))?,
                "packages" => map.next_value_seed(PackagesSeed(&mut builder))?,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        if builder.repo.is_none() {
            return Err(de::Error::missing_field("repo"));
        }
        Ok(builder)
    }
}

struct AppsSeed<'a>(&'a mut IndexBuilder);

impl<'de> DeserializeSeed<'de> for AppsSeed<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for AppsSeed<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a list of apps")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        while let Some(app) = seq.next_element::<AppV1>()? {
            self.0.add_app(app);
        }
        Ok(())
    }
}

struct PackagesSeed<'a>(&'a mut IndexBuilder);

impl<'de> DeserializeSeed<'de> for PackagesSeed<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for PackagesSeed<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of package versions")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let builder = self.0;
        while let Some(package_name) = map.next_key::<String>()? {
            map.next_value_seed(VersionsSeed {
                builder: &mut *builder,
                package_name: &package_name,
            })?;
        }
        Ok(())
    }
}

struct VersionsSeed<'a> {
    builder: &'a mut IndexBuilder,
    package_name: &'a str,
}

impl<'de> DeserializeSeed<'de> for VersionsSeed<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for VersionsSeed<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a list of package versions")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        while let Some(package) = seq.next_element::<PackageV1>()? {
            self.builder.add_version(self.package_name, package);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "legacy_tests.rs"]
mod tests;
