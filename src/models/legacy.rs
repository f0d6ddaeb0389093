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

//! Wire shapes of the monolithic `index-v1.json` document.
//!
//! Unknown fields are ignored. These types are only an intermediate step; the
//! legacy parser converts them into [`IndexV2`](super::index::IndexV2).

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoV1 {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub mirrors: Vec<String>,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppV1 {
    pub package_name: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub anti_features: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub changelog: Option<String>,
    pub translation: Option<String>,
    pub issue_tracker: Option<String>,
    pub source_code: Option<String>,
    pub name: Option<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub author_web_site: Option<String>,
    pub author_phone: Option<String>,
    pub donate: Option<String>,
    pub liberapay: Option<String>,
    pub open_collective: Option<String>,
    pub bitcoin: Option<String>,
    pub litecoin: Option<String>,
    #[serde(rename = "flattrID")]
    pub flattr_id: Option<String>,
    #[serde(default)]
    pub license: String,
    pub web_site: Option<String>,
    pub added: Option<i64>,
    pub icon: Option<String>,
    pub last_updated: Option<i64>,
    #[serde(default)]
    pub localized: BTreeMap<String, LocalizedV1>,
}

/// Per-locale metadata of an app.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedV1 {
    pub name: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub whats_new: Option<String>,
    pub video: Option<String>,
    pub icon: Option<String>,
    pub feature_graphic: Option<String>,
    pub promo_graphic: Option<String>,
    pub tv_banner: Option<String>,
    #[serde(default)]
    pub phone_screenshots: Vec<String>,
    #[serde(default)]
    pub seven_inch_screenshots: Vec<String>,
    #[serde(default)]
    pub ten_inch_screenshots: Vec<String>,
    #[serde(default)]
    pub tv_screenshots: Vec<String>,
    #[serde(default)]
    pub wear_screenshots: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageV1 {
    pub added: Option<i64>,
    pub apk_name: String,
    pub hash: String,
    #[serde(default)]
    pub hash_type: String,
    pub min_sdk_version: Option<i32>,
    pub max_sdk_version: Option<i32>,
    pub target_sdk_version: Option<i32>,
    #[serde(default)]
    pub package_name: String,
    pub signer: Option<String>,
    #[serde(default)]
    pub size: i64,
    #[serde(rename = "srcname")]
    pub src_name: Option<String>,
    #[serde(rename = "uses-permission", default)]
    pub uses_permission: Vec<PermissionV1>,
    #[serde(rename = "uses-permission-sdk-23", default)]
    pub uses_permission_sdk23: Vec<PermissionV1>,
    pub version_code: Option<i64>,
    #[serde(default)]
    pub version_name: String,
    #[serde(default)]
    pub nativecode: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub anti_features: Vec<String>,
}

/// A `[name, maxSdk]` pair. `maxSdk` may be a number, a numeric string or
/// `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionV1 {
    pub name: String,
    pub max_sdk: Option<i32>,
}

impl<'de> Deserialize<'de> for PermissionV1 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PermissionVisitor;

        impl<'de> Visitor<'de> for PermissionVisitor {
            type Value = PermissionV1;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a [name, maxSdk] array")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let name: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let max_sdk: serde_json::Value = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(3, &self));
                }
                let max_sdk = match max_sdk {
                    serde_json::Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
                    serde_json::Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                };
                Ok(PermissionV1 { name, max_sdk })
            }
        }

        deserializer.deserialize_seq(PermissionVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_forms() {
        let permissions: Vec<PermissionV1> = serde_json::from_str(
            r#"[["android.permission.INTERNET", null], ["android.permission.CAMERA", "28"], ["a.B", 23]]"#,
        )
        .unwrap();
        assert_eq!(permissions[0].max_sdk, None);
        assert_eq!(permissions[1].max_sdk, Some(28));
        assert_eq!(permissions[2].max_sdk, Some(23));
    }

    #[test]
    fn test_permission_wrong_arity_is_rejected() {
        assert!(serde_json::from_str::<PermissionV1>(r#"["only.name"]"#).is_err());
        assert!(serde_json::from_str::<PermissionV1>(r#"["a", 1, 2]"#).is_err());
        assert!(serde_json::from_str::<PermissionV1>(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn test_app_ignores_unknown_fields() {
        let app: AppV1 = serde_json::from_str(
            r#"{"packageName": "org.x", "license": "MIT", "unknownField": {"a": 1}}"#,
        )
        .unwrap();
        assert_eq!(app.package_name, "org.x");
        assert!(app.categories.is_empty());
        assert!(app.localized.is_empty());
    }
}
