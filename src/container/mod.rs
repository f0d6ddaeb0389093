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

//! Reader for signed JAR containers (`entry.jar`, `index-v1.jar`).
//!
//! Opening a container reads only the central directory and the small
//! `META-INF/` signature members. Entry content is streamed through an
//! [`EntryReader`], which hashes what it reads. The signer certificate is
//! only handed out by [`EntryReader::signer_certificate`], which consumes
//! the reader after the entry has been read to its end and checked against
//! the manifest, the signature file and the PKCS#7 signature.

mod manifest;
mod signature;

pub use manifest::{Manifest, Section};
pub use signature::{DigestAlgorithm, SignatureBlock, SignatureFile};

use crate::fingerprint::{Fingerprint, FingerprintError};
use der::Encode;
use digest::DynDigest;
use log::{debug, trace};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

const MANIFEST_NAME: &str = "META-INF/MANIFEST.MF";
const SIGNATURE_BLOCK_EXTENSIONS: [&str; 3] = [".RSA", ".DSA", ".EC"];
const MAX_META_INF_SIZE: u64 = 4 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("container is not signed")]
    Unsigned,

    #[error("container is corrupt: {0}")]
    Corrupt(String),

    #[error("entry '{name}' not found in container")]
    EntryNotFound { name: String },

    #[error("entry '{name}' is not covered by the signature")]
    EntryNotSigned { name: String },

    #[error("container has {count} signers, exactly one is required")]
    MultipleSigners { count: usize },

    #[error("signer carries {count} certificates, exactly one is required")]
    MultipleCertificates { count: usize },

    #[error("digest of entry '{name}' does not match the manifest")]
    DigestMismatch { name: String },

    #[error("signature verification failed: {0}")]
    SignatureMismatch(String),

    #[error("unsupported algorithm {0}")]
    UnsupportedAlgorithm(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<ZipError> for ContainerError {
    fn from(error: ZipError) -> Self {
        match error {
            ZipError::Io(e) => ContainerError::Io(e),
            other => ContainerError::Corrupt(other.to_string()),
        }
    }
}

/// Certificate of the single code signer of a container.
#[derive(Debug, Clone)]
pub struct SignerCertificate {
    der: Vec<u8>,
}

impl SignerCertificate {
    pub fn fingerprint(&self) -> Result<Fingerprint, FingerprintError> {
        Fingerprint::derive(&self.der)
    }
}

pub struct SignedContainer {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    manifest: Manifest,
    signature: SignatureFile,
}

impl SignedContainer {
    pub fn open(path: &Path) -> Result<Self, ContainerError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let blocks: Vec<String> = archive
            .file_names()
            .filter(|name| is_signature_block(name))
            .map(str::to_string)
            .collect();
        let block_name = match blocks.as_slice() {
            [] => return Err(ContainerError::Unsigned),
            [single] => single.clone(),
            many => return Err(ContainerError::MultipleSigners { count: many.len() }),
        };
        debug!("Opening {} signed by {block_name}", path.display());

        let signature_file_name = signature_file_for(&block_name, archive.file_names())
            .ok_or_else(|| {
                ContainerError::Corrupt(format!("no signature file for {block_name}"))
            })?;

        let manifest = match read_member(&mut archive, MANIFEST_NAME) {
            Ok(bytes) => Manifest::parse(&bytes)?,
            Err(ContainerError::EntryNotFound { .. }) => return Err(ContainerError::Unsigned),
            Err(e) => return Err(e),
        };
        let block = SignatureBlock::parse(&read_member(&mut archive, &block_name)?)?;
        let signature = SignatureFile::new(read_member(&mut archive, &signature_file_name)?, block)?;

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            manifest,
            signature,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Streams one member. The returned reader must be fully consumed through
    /// [`EntryReader::signer_certificate`] before its content is trusted.
    pub fn entry(&mut self, name: &str) -> Result<EntryReader<'_>, ContainerError> {
        let Self {
            archive,
            manifest,
            signature,
            ..
        } = self;

        let file = archive.by_name(name).map_err(|e| match e {
            ZipError::FileNotFound => ContainerError::EntryNotFound { name: name.into() },
            other => other.into(),
        })?;
        let section = manifest
            .section(name)
            .ok_or_else(|| ContainerError::EntryNotSigned { name: name.into() })?;
        let (algorithm, expected) = signature::find_digest(section, "")
            .ok_or_else(|| ContainerError::EntryNotSigned { name: name.into() })??;
        trace!("Entry {name} is expected to have {} digest", algorithm.attribute_prefix());

        Ok(EntryReader {
            name: name.to_string(),
            inner: Box::new(file),
            hasher: algorithm.hasher(),
            expected,
            manifest,
            signature,
        })
    }
}

pub struct EntryReader<'a> {
    name: String,
    inner: Box<dyn Read + 'a>,
    hasher: Box<dyn DynDigest>,
    expected: Vec<u8>,
    manifest: &'a Manifest,
    signature: &'a SignatureFile,
}

impl EntryReader<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drains the rest of the entry, then verifies the entry digest, the
    /// signature file and the signer's signature, in that order.
    pub fn signer_certificate(mut self) -> Result<SignerCertificate, ContainerError> {
        io::copy(&mut self, &mut io::sink())?;

        let EntryReader {
            name,
            hasher,
            expected,
            manifest,
            signature,
            ..
        } = self;

        if *hasher.finalize() != *expected {
            return Err(ContainerError::DigestMismatch { name });
        }
        signature.covers(manifest, &name)?;
        let certificate = signature.verify()?;

        let der = certificate
            .to_der()
            .map_err(|e| ContainerError::Corrupt(format!("cannot encode certificate: {e}")))?;
        Ok(SignerCertificate { der })
    }
}

impl Read for EntryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

fn is_signature_block(name: &str) -> bool {
    let Some(file_name) = name.strip_prefix("META-INF/") else {
        return false;
    };
    !file_name.contains('/')
        && SIGNATURE_BLOCK_EXTENSIONS
            .iter()
            .any(|ext| file_name.to_ascii_uppercase().ends_with(ext))
}

fn signature_file_for<'a>(
    block_name: &str,
    mut names: impl Iterator<Item = &'a str>,
) -> Option<String> {
    let stem = block_name.rsplit_once('.')?.0;
    let wanted = format!("{stem}.SF");
    names
        .find(|name| name.eq_ignore_ascii_case(&wanted))
        .map(str::to_string)
}

fn read_member(
    archive: &mut ZipArchive<BufReader<File>>,
    name: &str,
) -> Result<Vec<u8>, ContainerError> {
    let file = archive.by_name(name).map_err(|e| match e {
        ZipError::FileNotFound => ContainerError::EntryNotFound { name: name.into() },
        other => other.into(),
    })?;
    let mut bytes = Vec::new();
    file.take(MAX_META_INF_SIZE).read_to_end(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_block_names() {
        assert!(is_signature_block("META-INF/REPO.RSA"));
        assert!(is_signature_block("META-INF/cert.ec"));
        assert!(is_signature_block("META-INF/KEY.DSA"));
        assert!(!is_signature_block("META-INF/REPO.SF"));
        assert!(!is_signature_block("META-INF/nested/REPO.RSA"));
        assert!(!is_signature_block("REPO.RSA"));
    }

    #[test]
    fn test_signature_file_lookup() {
        let names = ["META-INF/MANIFEST.MF", "META-INF/repo.sf", "META-INF/REPO.RSA"];
        assert_eq!(
            signature_file_for("META-INF/REPO.RSA", names.into_iter()),
            Some("META-INF/repo.sf".to_string())
        );
        assert_eq!(signature_file_for("META-INF/OTHER.RSA", names.into_iter()), None);
    }

    #[test]
    fn test_open_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = SignedContainer::open(&temp_dir.path().join("absent.jar"));
        assert!(matches!(result, Err(ContainerError::Io(_))));
    }

    #[test]
    fn test_open_non_zip_is_corrupt() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("entry.jar");
        std::fs::write(&path, b"this is not a zip archive").unwrap();
        assert!(matches!(
            SignedContainer::open(&path),
            Err(ContainerError::Corrupt(_))
        ));
    }
}
