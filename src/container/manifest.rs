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

//! Parser for the `MANIFEST.MF` / `*.SF` attribute format used by signed JARs.
//!
//! Both files are a main section followed by per-entry sections separated by
//! blank lines. Lines longer than 72 bytes continue on the next line with a
//! single leading space. The raw bytes of every section are kept because
//! signature files digest them verbatim.

use super::ContainerError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Section {
    attributes: Vec<(String, String)>,
    raw: Vec<u8>,
}

impl Section {
    /// Attribute names are case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

#[derive(Debug, Clone, Default)]
pub struct Manifest {
    main: Section,
    entries: BTreeMap<String, Section>,
    raw: Vec<u8>,
}

impl Manifest {
    pub fn parse(bytes: &[u8]) -> Result<Self, ContainerError> {
        let mut sections = split_sections(bytes).into_iter();

        let main = match sections.next() {
            Some((lines, raw)) => Section {
                attributes: parse_attributes(&lines)?,
                raw,
            },
            None => Section::default(),
        };

        let mut entries = BTreeMap::new();
        for (lines, raw) in sections {
            let attributes = parse_attributes(&lines)?;
            let name = attributes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("Name"))
                .map(|(_, value)| value.clone())
                .ok_or_else(|| {
                    ContainerError::Corrupt("manifest section without a Name attribute".into())
                })?;
            entries.insert(name, Section { attributes, raw });
        }

        Ok(Self {
            main,
            entries,
            raw: bytes.to_vec(),
        })
    }

    pub fn main_attributes(&self) -> &Section {
        &self.main
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.entries.get(name)
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

/// Splits into `(lines, raw_bytes)` per section. The raw bytes of a section
/// include its terminating blank line.
fn split_sections(bytes: &[u8]) -> Vec<(Vec<Vec<u8>>, Vec<u8>)> {
    let mut sections = Vec::new();
    let mut lines: Vec<Vec<u8>> = Vec::new();
    let mut section_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        let eol = bytes[pos..]
            .iter()
            .position(|b| *b == b'\n' || *b == b'\r')
            .map(|offset| pos + offset)
            .unwrap_or(bytes.len());
        let next = match bytes.get(eol) {
            Some(b'\r') if bytes.get(eol + 1) == Some(&b'\n') => eol + 2,
            Some(_) => eol + 1,
            None => eol,
        };

        let line = &bytes[pos..eol];
        if line.is_empty() {
            if !lines.is_empty() {
                sections.push((std::mem::take(&mut lines), bytes[section_start..next].to_vec()));
            }
            section_start = next;
        } else {
            lines.push(line.to_vec());
        }
        pos = next;
    }

    if !lines.is_empty() {
        sections.push((lines, bytes[section_start..].to_vec()));
    }
    sections
}

fn parse_attributes(lines: &[Vec<u8>]) -> Result<Vec<(String, String)>, ContainerError> {
    let mut logical: Vec<Vec<u8>> = Vec::new();
    for line in lines {
        if let Some(continuation) = line.strip_prefix(b" ") {
            match logical.last_mut() {
                Some(previous) => previous.extend_from_slice(continuation),
                None => {
                    return Err(ContainerError::Corrupt(
                        "manifest starts with a continuation line".into(),
                    ));
                }
            }
        } else {
            logical.push(line.clone());
        }
    }

    logical
        .into_iter()
        .map(|line| {
            let text = String::from_utf8(line)
                .map_err(|_| ContainerError::Corrupt("manifest is not valid UTF-8".into()))?;
            let (key, value) = text.split_once(": ").ok_or_else(|| {
                ContainerError::Corrupt(format!("malformed manifest attribute '{text}'"))
            })?;
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}
