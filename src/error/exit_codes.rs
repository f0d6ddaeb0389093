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

use crate::error::SyncError;

pub fn get_exit_code(error: &SyncError) -> i32 {
    match error {
        SyncError::InvalidFingerprint(_)
        | SyncError::ConfigError(_)
        | SyncError::ValidationError(_) => 2,

        SyncError::RepoNotFound(_) => 3,

        SyncError::NetworkError(_) | SyncError::Http(_) | SyncError::HttpStatus { .. } => 20,

        SyncError::TrustViolation { .. } => 30,

        SyncError::Container { .. }
        | SyncError::ChecksumMismatch { .. }
        | SyncError::Fingerprint(_) => 31,

        SyncError::Parse { .. } | SyncError::Json(_) => 32,

        SyncError::Cancelled => 130,

        _ => 1,
    }
}
