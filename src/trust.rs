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

//! Acceptance of a container signer against an expected fingerprint.

use crate::container::{ContainerError, EntryReader, SignedContainer};
use crate::error::SyncError;
use crate::fingerprint::{Fingerprint, FingerprintError};
use log::{info, warn};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrustError {
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Certificate(#[from] FingerprintError),

    #[error("expected signer {expected}, acquired {actual}")]
    Mismatch {
        expected: Fingerprint,
        actual: Fingerprint,
    },
}

impl TrustError {
    /// Attaches the repository and artifact the check was made for.
    pub fn into_sync_error(self, repo: &str, artifact: &str) -> SyncError {
        match self {
            TrustError::Container(source) => SyncError::container(artifact, source),
            TrustError::Certificate(source) => SyncError::Fingerprint(source),
            TrustError::Mismatch { expected, actual } => SyncError::TrustViolation {
                repo: repo.to_string(),
                expected,
                actual,
            },
        }
    }
}

/// Content of an entry whose signer has been accepted.
#[derive(Debug)]
pub struct Verified<T> {
    pub fingerprint: Fingerprint,
    pub value: T,
}

/// Compares the derived fingerprint with the expected one. Without an
/// expectation the derived value is accepted as is (trust on first use).
pub fn decide(expected: Option<&Fingerprint>, actual: Fingerprint) -> Result<Fingerprint, TrustError> {
    match expected {
        None => {
            info!("No fingerprint pinned, trusting signer {actual} on first use");
            Ok(actual)
        }
        Some(expected) if *expected == actual => Ok(actual),
        Some(expected) => {
            warn!("Signer fingerprint mismatch: expected {expected}, acquired {actual}");
            Err(TrustError::Mismatch {
                expected: expected.clone(),
                actual,
            })
        }
    }
}

/// Streams `entry_name` through `consume`, then verifies its signer.
///
/// The value produced by `consume` is returned only when the signer is
/// accepted. A verification failure always wins over an error from
/// `consume`, so malformed content from an untrusted signer is reported as
/// a trust problem.
pub fn verify_entry<T, E>(
    container: &mut SignedContainer,
    entry_name: &str,
    expected: Option<&Fingerprint>,
    consume: impl FnOnce(&mut EntryReader<'_>) -> Result<T, E>,
) -> Result<Verified<Result<T, E>>, TrustError> {
    let mut reader = container.entry(entry_name)?;
    let value = consume(&mut reader);
    let certificate = reader.signer_certificate()?;
    let fingerprint = decide(expected, certificate.fingerprint()?)?;
    Ok(Verified { fingerprint, value })
}

/// Reads `entry_name` fully and returns its bytes once the signer is accepted.
pub fn read_verified(
    container: &mut SignedContainer,
    entry_name: &str,
    expected: Option<&Fingerprint>,
) -> Result<Verified<Vec<u8>>, TrustError> {
    let verified = verify_entry(container, entry_name, expected, |reader| {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map(|_| bytes)
    })?;
    let bytes = verified.value.map_err(ContainerError::Io)?;
    Ok(Verified {
        fingerprint: verified.fingerprint,
        value: bytes,
    })
}

/// Returns the accepted signer fingerprint of `entry_name`.
pub fn verify(
    container: &mut SignedContainer,
    entry_name: &str,
    expected: Option<&Fingerprint>,
) -> Result<Fingerprint, TrustError> {
    verify_entry(container, entry_name, expected, |_| Ok::<(), TrustError>(()))
        .map(|verified| verified.fingerprint)
}

/// Signer fingerprint of a container on disk, without any expectation.
pub fn fingerprint_of(path: &Path, entry_name: &str) -> Result<Fingerprint, TrustError> {
    let mut container = SignedContainer::open(path)?;
    verify(&mut container, entry_name, None)
}
