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

pub mod diff;
pub mod entry;
pub mod index;
pub mod legacy;
pub mod repo;

pub use diff::{IndexV2Diff, MapPatch, MetadataV2Diff, PackageV2Diff, RepoV2Diff, VersionV2Diff};
pub use entry::{Entry, EntryFile};
pub use index::{
    AntiFeatureV2, CategoryV2, FeatureV2, FileV2, IndexV2, LocalizedFiles, LocalizedIcon,
    LocalizedString, ManifestV2, MetadataV2, MirrorV2, PackageV2, PermissionV2, ReleaseChannelV2,
    RepoV2, ScreenshotsV2, SignerV2, TagV2, UsesSdkV2, VersionV2,
};
pub use repo::{Authentication, IndexFormat, Repo, RepoId, VersionInfo, normalize_address};
