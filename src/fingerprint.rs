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

//! Canonical SHA-256 identity of a repository signing certificate.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Encoded certificates smaller than this are not plausibly X.509.
pub const MIN_CERTIFICATE_SIZE: usize = 256;

/// Hex length of a SHA-256 digest.
pub const FINGERPRINT_LENGTH: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("Certificate of {size} bytes is too small, at least {MIN_CERTIFICATE_SIZE} expected")]
    TooSmall { size: usize },
}

/// Uppercase hex SHA-256 of a DER encoded certificate.
///
/// Values are always stored uppercase, so the derived `PartialEq` is the
/// case-insensitive comparison callers expect.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn derive(certificate_der: &[u8]) -> Result<Self, FingerprintError> {
        if certificate_der.len() < MIN_CERTIFICATE_SIZE {
            return Err(FingerprintError::TooSmall {
                size: certificate_der.len(),
            });
        }
        let digest = Sha256::digest(certificate_der);
        Ok(Self(hex::encode_upper(digest)))
    }

    /// Accepts exactly 64 hex characters in any case.
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() != FINGERPRINT_LENGTH || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(text.to_ascii_uppercase()))
    }

    /// Like [`Fingerprint::parse`], but first drops the whitespace and colon
    /// separators that `keytool` and the formatted display insert.
    pub fn parse_lenient(text: &str) -> Option<Self> {
        let compact: String = text
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':')
            .collect();
        Self::parse(&compact)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.0.eq_ignore_ascii_case(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Space separated byte pairs, e.g. `C3 A1 21 ...`.
    pub fn formatted(&self) -> String {
        self.0
            .as_bytes()
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = crate::error::SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_lenient(s).ok_or_else(|| crate::error::SyncError::InvalidFingerprint(s.into()))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse_lenient(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid fingerprint '{text}'")))
    }
}
