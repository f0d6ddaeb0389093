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

use super::ContainerError;
use super::manifest::{Manifest, Section};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerIdentifier, SignerInfo};
use const_oid::ObjectIdentifier;
use der::asn1::OctetString;
use der::{Decode, Encode};
use digest::DynDigest;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;
use x509_cert::Certificate;

const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");
const ID_MESSAGE_DIGEST: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.4");
const ID_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");
const ID_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const SHA1_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");
const SHA256_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");

/// Digests that may appear in manifests and signer infos, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha256,
    Sha1,
}

impl DigestAlgorithm {
    const PREFERENCE: [DigestAlgorithm; 2] = [DigestAlgorithm::Sha256, DigestAlgorithm::Sha1];

    /// Attribute prefix used by `jarsigner`, as in `SHA-256-Digest`.
    pub fn attribute_prefix(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha1 => "SHA1",
        }
    }

    pub fn hasher(self) -> Box<dyn DynDigest> {
        match self {
            DigestAlgorithm::Sha256 => Box::new(Sha256::default()),
            DigestAlgorithm::Sha1 => Box::new(Sha1::default()),
        }
    }

    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize().into_vec()
    }

    fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        if *oid == ID_SHA256 {
            Some(DigestAlgorithm::Sha256)
        } else if *oid == ID_SHA1 {
            Some(DigestAlgorithm::Sha1)
        } else {
            None
        }
    }
}

/// Finds the strongest `<ALG>-Digest<suffix>` attribute of a section.
pub fn find_digest(
    section: &Section,
    suffix: &str,
) -> Option<Result<(DigestAlgorithm, Vec<u8>), ContainerError>> {
    DigestAlgorithm::PREFERENCE.iter().find_map(|algorithm| {
        let name = format!("{}-Digest{suffix}", algorithm.attribute_prefix());
        section.get(&name).map(|encoded| {
            STANDARD
                .decode(encoded.trim())
                .map(|digest| (*algorithm, digest))
                .map_err(|e| ContainerError::Corrupt(format!("invalid {name} value: {e}")))
        })
    })
}

/// A signature file (`*.SF`) together with its PKCS#7 block.
pub struct SignatureFile {
    bytes: Vec<u8>,
    attributes: Manifest,
    block: SignatureBlock,
}

impl SignatureFile {
    pub fn new(bytes: Vec<u8>, block: SignatureBlock) -> Result<Self, ContainerError> {
        let attributes = Manifest::parse(&bytes)?;
        Ok(Self {
            bytes,
            attributes,
            block,
        })
    }

    /// Checks that this signature file covers the manifest section of `entry`,
    /// either through the whole-manifest digest or the per-entry digest.
    pub fn covers(&self, manifest: &Manifest, entry: &str) -> Result<(), ContainerError> {
        if let Some(found) = find_digest(self.attributes.main_attributes(), "-Manifest") {
            let (algorithm, expected) = found?;
            if algorithm.digest(manifest.raw()) == expected {
                return Ok(());
            }
        }

        let section = manifest
            .section(entry)
            .ok_or_else(|| ContainerError::EntryNotSigned { name: entry.into() })?;
        let signed = self
            .attributes
            .section(entry)
            .ok_or_else(|| ContainerError::EntryNotSigned { name: entry.into() })?;
        let (algorithm, expected) = find_digest(signed, "").ok_or_else(|| {
            ContainerError::SignatureMismatch(format!("no digest for '{entry}' in signature file"))
        })??;

        if algorithm.digest(section.raw()) != expected {
            return Err(ContainerError::SignatureMismatch(format!(
                "manifest section of '{entry}' does not match the signature file"
            )));
        }
        Ok(())
    }

    pub fn verify(&self) -> Result<&Certificate, ContainerError> {
        self.block.verify(&self.bytes)?;
        Ok(&self.block.certificate)
    }
}

/// PKCS#7 `SignedData` with exactly one signer and one certificate.
pub struct SignatureBlock {
    signer: SignerInfo,
    certificate: Certificate,
}

impl SignatureBlock {
    pub fn parse(bytes: &[u8]) -> Result<Self, ContainerError> {
        let content_info = ContentInfo::from_der(bytes).map_err(corrupt)?;
        if content_info.content_type != ID_SIGNED_DATA {
            return Err(ContainerError::Corrupt(format!(
                "signature block holds {} instead of signed data",
                content_info.content_type
            )));
        }
        let signed_data =
            SignedData::from_der(&content_info.content.to_der().map_err(corrupt)?).map_err(corrupt)?;

        let signers = signed_data.signer_infos.0.len();
        if signers != 1 {
            return Err(ContainerError::MultipleSigners { count: signers });
        }
        let signer = signed_data
            .signer_infos
            .0
            .iter()
            .next()
            .cloned()
            .ok_or(ContainerError::Unsigned)?;

        let certificates: Vec<Certificate> = signed_data
            .certificates
            .iter()
            .flat_map(|set| set.0.iter())
            .filter_map(|choice| match choice {
                CertificateChoices::Certificate(cert) => Some(cert.clone()),
                _ => None,
            })
            .collect();
        let certificate = match <[Certificate; 1]>::try_from(certificates) {
            Ok([certificate]) => certificate,
            Err(found) if found.is_empty() => {
                return Err(ContainerError::Corrupt(
                    "signature block carries no certificate".into(),
                ));
            }
            Err(found) => {
                return Err(ContainerError::MultipleCertificates { count: found.len() });
            }
        };

        if let SignerIdentifier::IssuerAndSerialNumber(id) = &signer.sid
            && (id.issuer != certificate.tbs_certificate.issuer
                || id.serial_number != certificate.tbs_certificate.serial_number)
        {
            return Err(ContainerError::SignatureMismatch(
                "signer does not reference the embedded certificate".into(),
            ));
        }

        Ok(Self {
            signer,
            certificate,
        })
    }

    /// Verifies the RSA signature over `content` (the signature file bytes).
    pub fn verify(&self, content: &[u8]) -> Result<(), ContainerError> {
        let algorithm = DigestAlgorithm::from_oid(&self.signer.digest_alg.oid).ok_or_else(|| {
            ContainerError::UnsupportedAlgorithm(self.signer.digest_alg.oid.to_string())
        })?;

        let signed_bytes = match &self.signer.signed_attrs {
            Some(attributes) => {
                let message_digest = attributes
                    .iter()
                    .find(|attribute| attribute.oid == ID_MESSAGE_DIGEST)
                    .and_then(|attribute| attribute.values.iter().next())
                    .ok_or_else(|| {
                        ContainerError::SignatureMismatch("missing message digest".into())
                    })?
                    .decode_as::<OctetString>()
                    .map_err(corrupt)?;
                if message_digest.as_bytes() != algorithm.digest(content).as_slice() {
                    return Err(ContainerError::SignatureMismatch(
                        "signature file digest does not match the signed attributes".into(),
                    ));
                }
                attributes.to_der().map_err(corrupt)?
            }
            None => content.to_vec(),
        };

        let signature_oid = self.signer.signature_algorithm.oid;
        if ![RSA_ENCRYPTION, SHA1_WITH_RSA, SHA256_WITH_RSA].contains(&signature_oid) {
            return Err(ContainerError::UnsupportedAlgorithm(signature_oid.to_string()));
        }
        let public_key_info = &self.certificate.tbs_certificate.subject_public_key_info;
        if public_key_info.algorithm.oid != RSA_ENCRYPTION {
            return Err(ContainerError::UnsupportedAlgorithm(
                public_key_info.algorithm.oid.to_string(),
            ));
        }
        let public_key =
            RsaPublicKey::from_public_key_der(&public_key_info.to_der().map_err(corrupt)?)
                .map_err(|e| ContainerError::Corrupt(format!("invalid RSA public key: {e}")))?;

        let hashed = algorithm.digest(&signed_bytes);
        let scheme = match algorithm {
            DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            DigestAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
        };
        public_key
            .verify(scheme, &hashed, self.signer.signature.as_bytes())
            .map_err(|_| ContainerError::SignatureMismatch("RSA signature is invalid".into()))
    }
}

fn corrupt(error: der::Error) -> ContainerError {
    ContainerError::Corrupt(format!("malformed signature block: {error}"))
}
