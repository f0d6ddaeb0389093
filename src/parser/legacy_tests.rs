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

use super::*;
use std::fs::File;
use std::path::PathBuf;

const LEGACY_HASH: &str = "eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
const SIGNER: &str = "cccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccc";

fn fixture_index() -> IndexV2 {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/legacy/index-v1.json");
    parse_index_v1(File::open(path).unwrap()).unwrap()
}

#[test]
fn test_repo_conversion() {
    let index = fixture_index();
    let repo = &index.repo;
    assert_eq!(repo.address, "https://legacy.example.org/fdroid/repo");
    assert_eq!(repo.timestamp, 1700000000000);
    assert_eq!(repo.name["en-US"], "Legacy Repository");
    assert_eq!(repo.icon["en-US"].name, "/icons/icon.png");

    assert_eq!(repo.mirrors.len(), 2);
    assert_eq!(repo.mirrors[0].url, repo.address);
    assert_eq!(repo.mirrors[0].is_primary, Some(true));
    assert_eq!(repo.mirrors[1].is_primary, None);
}

#[test]
fn test_tag_dictionaries_are_synthesized() {
    let index = fixture_index();
    let anti_features: Vec<&String> = index.repo.anti_features.keys().collect();
    assert_eq!(anti_features, ["Ads", "NonFreeNet", "Tracking"]);
    assert_eq!(
        index.repo.anti_features["Ads"].icon["en-US"].name,
        "/icons/ic_antifeature_ads.png"
    );
    assert_eq!(
        index.repo.categories["Internet"].icon["en-US"].name,
        "/icons/category_internet.png"
    );
}

#[test]
fn test_app_metadata_conversion() {
    let index = fixture_index();
    let metadata = &index.packages["org.legacy"].metadata;
    assert_eq!(metadata.name["en-US"], "Legacy");
    // The unlocalized summary wins over the localized ones.
    assert_eq!(metadata.summary.len(), 1);
    assert_eq!(metadata.summary["en-US"], "An application from the old days");
    assert_eq!(metadata.categories, ["System", "Internet"]);
    assert_eq!(metadata.donate, ["https://donate.example.org"]);
    assert_eq!(metadata.author_website.as_deref(), Some("https://legacy.example.org"));
    assert_eq!(metadata.icon["en-US"].name, "/org.legacy/en-US/org.legacy.png");
    assert_eq!(metadata.preferred_signer.as_deref(), Some(SIGNER));
    assert_eq!(metadata.added, 1600000000000);

    let phone = metadata
        .screenshots
        .as_ref()
        .and_then(|s| s.phone.as_ref())
        .unwrap();
    let names: Vec<&str> = phone["en-US"].iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "/org.legacy/en-US/phoneScreenshots/1.png",
            "/org.legacy/en-US/phoneScreenshots/2.png"
        ]
    );
}

#[test]
fn test_version_conversion() {
    let index = fixture_index();
    let package = &index.packages["org.legacy"];
    assert_eq!(package.versions.len(), 2);

    let version = &package.versions[LEGACY_HASH];
    assert_eq!(version.file.name, "/org.legacy_2.apk");
    assert_eq!(version.file.size, Some(4096));
    assert_eq!(version.whats_new["en-US"], "Bug fixes");
    assert_eq!(version.manifest.version_code, 2);
    assert_eq!(
        version.manifest.uses_sdk,
        Some(UsesSdkV2 {
            min_sdk_version: 21,
            target_sdk_version: 30
        })
    );
    assert_eq!(version.manifest.signer.as_ref().unwrap().sha256, [SIGNER]);

    let permissions: Vec<(&str, Option<i32>)> = version
        .manifest
        .uses_permission
        .iter()
        .map(|p| (p.name.as_str(), p.max_sdk_version))
        .collect();
    assert_eq!(
        permissions,
        [
            ("android.permission.INTERNET", None),
            ("android.permission.CAMERA", Some(28))
        ]
    );

    let anti_features: Vec<&String> = version.anti_features.keys().collect();
    assert_eq!(anti_features, ["Ads", "NonFreeNet", "Tracking"]);
}

#[test]
fn test_minimal_app_defaults() {
    let index = fixture_index();
    let package = &index.packages["org.minimal"];
    assert!(package.versions.is_empty());
    assert!(package.metadata.name.is_empty());
    assert_eq!(package.metadata.license.as_deref(), Some("MIT"));
    assert_eq!(package.metadata.added, 0);
    assert_eq!(package.metadata.screenshots, None);
    assert_eq!(package.metadata.preferred_signer, None);
}

#[test]
fn test_version_without_sdk_has_no_uses_sdk() {
    let index = fixture_index();
    let version = &index.packages["org.legacy"].versions
        ["ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"];
    assert_eq!(version.manifest.uses_sdk, None);
    assert_eq!(version.manifest.signer, None);
}

#[test]
fn test_target_sdk_defaults_to_min_sdk() {
    let json = br#"{
        "repo": {"address": "https://r.example.org/repo", "timestamp": 1},
        "apps": [{"packageName": "a.b", "license": "MIT"}],
        "packages": {"a.b": [{"apkName": "a.apk", "hash": "01", "hashType": "sha256",
            "size": 1, "versionName": "1", "minSdkVersion": 24}]}
    }"#;
    let index = parse_index_v1(&json[..]).unwrap();
    let uses_sdk = index.packages["a.b"].versions["01"].manifest.uses_sdk.clone();
    assert_eq!(
        uses_sdk,
        Some(UsesSdkV2 {
            min_sdk_version: 24,
            target_sdk_version: 24
        })
    );
}

#[test]
fn test_localized_text_without_default() {
    let json = br#"{
        "repo": {"timestamp": 1},
        "apps": [{"packageName": "a.b", "license": "MIT",
            "localized": {"de": {"name": "Name", "featureGraphic": "f.png"}, "fr": {"video": "v"}}}]
    }"#;
    let index = parse_index_v1(&json[..]).unwrap();
    let metadata = &index.packages["a.b"].metadata;
    assert_eq!(metadata.name.len(), 1);
    assert_eq!(metadata.name["de"], "Name");
    assert_eq!(metadata.feature_graphic["de"].name, "/a.b/de/f.png");
    assert_eq!(metadata.video["fr"], "v");
}

#[test]
fn test_key_order_does_not_matter() {
    let json = br#"{
        "packages": {"a.b": [{"apkName": "a.apk", "hash": "01", "size": 1, "versionName": "1",
            "signer": "ab"}]},
        "repo": {"address": "https://r.example.org/repo", "timestamp": 7},
        "apps": [{"packageName": "a.b", "license": "MIT", "antiFeatures": ["Ads"]}]
    }"#;
    let index = parse_index_v1(&json[..]).unwrap();
    assert_eq!(index.repo.timestamp, 7);
    let package = &index.packages["a.b"];
    assert_eq!(package.metadata.preferred_signer.as_deref(), Some("ab"));
    assert!(package.versions["01"].anti_features.contains_key("Ads"));
}

#[test]
fn test_version_only_anti_features_join_the_dictionary() {
    let json = br#"{
        "repo": {"address": "https://r.example.org/repo", "timestamp": 7},
        "apps": [{"packageName": "a.b", "license": "MIT", "antiFeatures": ["Ads"]}],
        "packages": {"a.b": [{"apkName": "a.apk", "hash": "01", "size": 1, "versionName": "1",
            "antiFeatures": ["KnownVuln"]}]}
    }"#;
    let index = parse_index_v1(&json[..]).unwrap();
    let anti_features: Vec<&String> = index.repo.anti_features.keys().collect();
    assert_eq!(anti_features, ["Ads", "KnownVuln"]);
    assert_eq!(
        index.repo.anti_features["KnownVuln"].icon["en-US"].name,
        "/icons/ic_antifeature_knownvuln.png"
    );
    assert!(index.packages["a.b"].versions["01"].anti_features.contains_key("KnownVuln"));
}

#[test]
fn test_missing_repo_is_an_error() {
    let error = parse_index_v1(&br#"{"apps": []}"#[..]).unwrap_err();
    assert_eq!(error.artifact, INDEX_V1_JSON);
}

#[test]
fn test_truncated_document_is_an_error() {
    let json = br#"{"repo": {"timestamp": 1}, "apps": [{"packageName": "a"#;
    assert!(parse_index_v1(&json[..]).is_err());
}

#[test]
fn test_trailing_garbage_is_an_error() {
    let json = br#"{"repo": {"timestamp": 1}} {"#;
    assert!(parse_index_v1(&json[..]).is_err());
}

#[test]
fn test_normalize_tag() {
    assert_eq!(normalize_tag("Science & Education"), "science_education");
    assert_eq!(normalize_tag("Internet"), "internet");
}
