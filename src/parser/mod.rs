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

//! Decoders for the two repository wire formats.
//!
//! Parsing is all-or-nothing: a truncated or malformed document yields a
//! [`ParseError`] and no partial catalog.

pub mod current;
pub mod legacy;

pub use crate::models::IndexFormat;
pub use current::{parse_diff, parse_entry, parse_index};
pub use legacy::parse_index_v1;

use crate::error::SyncError;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("failed to parse {artifact}: {message}")]
pub struct ParseError {
    pub artifact: String,
    pub message: String,
}

impl ParseError {
    pub fn new(artifact: &str, cause: impl fmt::Display) -> Self {
        Self {
            artifact: artifact.to_string(),
            message: cause.to_string(),
        }
    }
}

impl From<ParseError> for SyncError {
    fn from(error: ParseError) -> Self {
        SyncError::Parse {
            artifact: error.artifact,
            message: error.message,
        }
    }
}
