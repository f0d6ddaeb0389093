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

//! User-Agent strings sent with every request.

/// The fdsync package version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for repository index downloads
pub fn sync_client() -> String {
    for_feature("sync")
}

/// User-Agent for repository address probing
pub fn probe_client() -> String {
    for_feature("probe")
}

/// Get a User-Agent string for a specific feature
pub fn for_feature(feature: &str) -> String {
    format!("fdsync/{feature}/{VERSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agents() {
        assert_eq!(sync_client(), format!("fdsync/sync/{VERSION}"));
        assert_eq!(probe_client(), format!("fdsync/probe/{VERSION}"));
        assert_eq!(for_feature("custom"), format!("fdsync/custom/{VERSION}"));
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert_eq!(
            parts.len(),
            3,
            "Version should have 3 parts (major.minor.patch)"
        );

        for part in parts {
            assert!(
                part.parse::<u32>().is_ok(),
                "Version part should be a number"
            );
        }
    }
}
