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

use super::ParseError;
use crate::models::{Entry, IndexV2, IndexV2Diff};
use serde::de::DeserializeOwned;
use std::io::{BufReader, Read};

pub const ENTRY_JSON: &str = "entry.json";
pub const INDEX_V2_JSON: &str = "index-v2.json";

/// Decodes the signed pointer document.
pub fn parse_entry<R: Read>(reader: R) -> Result<Entry, ParseError> {
    let entry: Entry = decode(reader, ENTRY_JSON)?;
    if entry.index.name.trim_start_matches('/').is_empty() {
        return Err(ParseError::new(ENTRY_JSON, "index file name is empty"));
    }
    Ok(entry)
}

pub fn parse_index<R: Read>(reader: R) -> Result<IndexV2, ParseError> {
    decode(reader, INDEX_V2_JSON)
}

/// Decodes a diff document. `name` is the artifact name used in errors.
pub fn parse_diff<R: Read>(reader: R, name: &str) -> Result<IndexV2Diff, ParseError> {
    decode(reader, name)
}

fn decode<T: DeserializeOwned, R: Read>(reader: R, artifact: &str) -> Result<T, ParseError> {
    serde_json::from_reader(BufReader::new(reader)).map_err(|e| ParseError::new(artifact, e))
}
