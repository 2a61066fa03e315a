// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Elliptic-curve key loading.
//!
//! Accepts the PEM containers that certificate tooling commonly emits for EC keys:
//!
//! - PKCS#8 `PRIVATE KEY` with the `id-ecPublicKey` algorithm
//! - legacy SEC1 `EC PRIVATE KEY` key pairs (only the private scalar is used)
//!
//! P-256, P-384 and P-521 are supported. Loading is a pure parse with no caching.

use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use p256::elliptic_curve::sec1::ToEncodedPoint;
use pkcs8::{ObjectIdentifier, PrivateKeyInfo, SubjectPublicKeyInfoRef};
use sec1::EcPrivateKey;
use pem::Pem;
use tlsign_core::hash::hex_sha256;
use tlsign_core::{Error, Result};

const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

/// Elliptic curves that can sign a `Tl-Signature`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    /// NIST P-256, signs with ES256.
    P256,
    /// NIST P-384, signs with ES384.
    P384,
    /// NIST P-521, signs with ES512.
    P521,
}

impl Curve {
    /// JWS `alg` value for this curve.
    pub fn algorithm(self) -> &'static str {
        match self {
            Curve::P256 => "ES256",
            Curve::P384 => "ES384",
            Curve::P521 => "ES512",
        }
    }

    /// Resolve a curve from a JWS `alg` value.
    pub fn from_algorithm(alg: &str) -> Option<Self> {
        match alg {
            "ES256" => Some(Curve::P256),
            "ES384" => Some(Curve::P384),
            "ES512" => Some(Curve::P521),
            _ => None,
        }
    }

    fn from_oid(oid: ObjectIdentifier) -> Result<Self> {
        if oid == SECP256R1 {
            Ok(Curve::P256)
        } else if oid == SECP384R1 {
            Ok(Curve::P384)
        } else if oid == SECP521R1 {
            Ok(Curve::P521)
        } else {
            Err(Error::key_invalid(format!(
                "unsupported elliptic curve {oid}"
            )))
        }
    }

    /// SEC1 keys may omit the curve parameters, the scalar width still tells.
    fn from_scalar_len(len: usize) -> Result<Self> {
        match len {
            32 => Ok(Curve::P256),
            48 => Ok(Curve::P384),
            66 => Ok(Curve::P521),
            _ => Err(Error::key_invalid(format!(
                "cannot infer elliptic curve from a {len} byte private key"
            ))),
        }
    }
}

impl Display for Curve {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Curve::P256 => f.write_str("P-256"),
            Curve::P384 => f.write_str("P-384"),
            Curve::P521 => f.write_str("P-521"),
        }
    }
}

/// PEM labels that hold a private key, supported or not.
const PRIVATE_KEY_TAGS: [&str; 6] = [
    "PRIVATE KEY",
    "EC PRIVATE KEY",
    "ENCRYPTED PRIVATE KEY",
    "RSA PRIVATE KEY",
    "DSA PRIVATE KEY",
    "OPENSSH PRIVATE KEY",
];

/// Load an elliptic-curve private key from PEM.
///
/// Blocks that carry no private key, like the `EC PARAMETERS` block written
/// by `openssl ecparam -genkey` or a certificate bundled with the key, are
/// skipped. The first private-key block decides.
///
/// # Errors
///
/// Returns an error of kind [`tlsign_core::ErrorKind::KeyInvalid`] when the
/// input holds no PEM block, holds a key that is not elliptic-curve, is
/// encrypted, uses an unsupported curve or is structurally invalid.
pub fn load_private_key(pem: &str) -> Result<PrivateKey> {
    let blocks = parse_pem(pem)?;
    let Some(block) = blocks
        .iter()
        .find(|b| PRIVATE_KEY_TAGS.contains(&b.tag()))
    else {
        return match blocks.iter().find(|b| b.tag() != "EC PARAMETERS") {
            Some(other) => Err(Error::key_invalid(format!(
                "unsupported key container format: {}",
                other.tag()
            ))),
            None => Err(Error::key_invalid("no private key PEM block found")),
        };
    };

    let encrypted = block
        .headers()
        .get("Proc-Type")
        .is_some_and(|v| v.contains("ENCRYPTED"));
    if encrypted {
        return Err(Error::key_invalid("encrypted private keys are not supported"));
    }

    match block.tag() {
        "PRIVATE KEY" => PrivateKey::from_pkcs8_der(block.contents()),
        "EC PRIVATE KEY" => PrivateKey::from_sec1_der(block.contents()),
        "ENCRYPTED PRIVATE KEY" => Err(Error::key_invalid(
            "encrypted private keys are not supported",
        )),
        label => Err(Error::key_invalid(format!(
            "{label} is not an elliptic-curve private key"
        ))),
    }
}

/// An elliptic-curve private key ready for signing.
///
/// The handle is always complete: it only exists once the whole key parsed.
/// Cloning is cheap and shares the key.
#[derive(Clone)]
pub struct PrivateKey {
    inner: Arc<PrivateKeyInner>,
}

enum PrivateKeyInner {
    P256 {
        signing: p256::ecdsa::SigningKey,
        public: p256::PublicKey,
    },
    P384 {
        signing: p384::ecdsa::SigningKey,
        public: p384::PublicKey,
    },
    P521 {
        signing: p521::ecdsa::SigningKey,
        public: p521::PublicKey,
    },
}

impl PrivateKey {
    fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = PrivateKeyInfo::try_from(der)
            .map_err(|e| Error::key_invalid(format!("malformed PKCS#8 private key: {e}")))?;

        if info.algorithm.oid != ID_EC_PUBLIC_KEY {
            return Err(Error::key_invalid(format!(
                "PKCS#8 key with algorithm {} is not an elliptic-curve key",
                info.algorithm.oid
            )));
        }
        let curve_oid = info
            .algorithm
            .parameters_oid()
            .map_err(|e| Error::key_invalid(format!("missing elliptic curve parameters: {e}")))?;
        let curve = Curve::from_oid(curve_oid)?;

        let ec = EcPrivateKey::try_from(info.private_key)
            .map_err(|e| Error::key_invalid(format!("malformed EC private key: {e}")))?;
        if let Some(inner_oid) = ec.parameters.and_then(|p| p.named_curve()) {
            if inner_oid != curve_oid {
                return Err(Error::key_invalid(
                    "PKCS#8 algorithm and EC private key disagree on the curve",
                ));
            }
        }

        Self::from_scalar(curve, ec.private_key)
    }

    fn from_sec1_der(der: &[u8]) -> Result<Self> {
        let ec = EcPrivateKey::try_from(der)
            .map_err(|e| Error::key_invalid(format!("malformed EC private key: {e}")))?;
        let curve = match ec.parameters.and_then(|p| p.named_curve()) {
            Some(oid) => Curve::from_oid(oid)?,
            None => Curve::from_scalar_len(ec.private_key.len())?,
        };

        Self::from_scalar(curve, ec.private_key)
    }

    fn from_scalar(curve: Curve, scalar: &[u8]) -> Result<Self> {
        let invalid = |e: p256::elliptic_curve::Error| {
            Error::key_invalid(format!("invalid {curve} private key: {e}"))
        };

        let inner = match curve {
            Curve::P256 => {
                let secret = p256::SecretKey::from_slice(scalar).map_err(invalid)?;
                PrivateKeyInner::P256 {
                    signing: p256::ecdsa::SigningKey::from_slice(&secret.to_bytes())
                        .map_err(|e| Error::key_invalid(format!("invalid {curve} key: {e}")))?,
                    public: secret.public_key(),
                }
            }
            Curve::P384 => {
                let secret = p384::SecretKey::from_slice(scalar).map_err(invalid)?;
                PrivateKeyInner::P384 {
                    signing: p384::ecdsa::SigningKey::from_slice(&secret.to_bytes())
                        .map_err(|e| Error::key_invalid(format!("invalid {curve} key: {e}")))?,
                    public: secret.public_key(),
                }
            }
            Curve::P521 => {
                let secret = p521::SecretKey::from_slice(scalar).map_err(invalid)?;
                PrivateKeyInner::P521 {
                    signing: p521::ecdsa::SigningKey::from_slice(&secret.to_bytes())
                        .map_err(|e| Error::key_invalid(format!("invalid {curve} key: {e}")))?,
                    public: secret.public_key(),
                }
            }
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Curve of this key.
    pub fn curve(&self) -> Curve {
        match self.inner.as_ref() {
            PrivateKeyInner::P256 { .. } => Curve::P256,
            PrivateKeyInner::P384 { .. } => Curve::P384,
            PrivateKeyInner::P521 { .. } => Curve::P521,
        }
    }

    /// JWS `alg` this key signs with.
    pub fn algorithm(&self) -> &'static str {
        self.curve().algorithm()
    }

    /// Public counterpart of this key.
    pub fn public_key(&self) -> PublicKey {
        let inner = match self.inner.as_ref() {
            PrivateKeyInner::P256 { public, .. } => PublicKeyInner::P256(public.clone()),
            PrivateKeyInner::P384 { public, .. } => PublicKeyInner::P384(public.clone()),
            PrivateKeyInner::P521 { public, .. } => PublicKeyInner::P521(public.clone()),
        };
        PublicKey { inner }
    }

    /// Fingerprint of the public key, safe to log.
    pub fn fingerprint(&self) -> String {
        self.public_key().fingerprint()
    }

    /// Sign `message` with ECDSA over the curve's hash, returning raw `r||s`.
    pub(crate) fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let failed = |e: p256::ecdsa::Error| Error::signing_failed(format!("ECDSA signing failed: {e}"));

        match self.inner.as_ref() {
            PrivateKeyInner::P256 { signing, .. } => {
                use p256::ecdsa::signature::Signer;
                let sig: p256::ecdsa::Signature = signing.try_sign(message).map_err(failed)?;
                Ok(sig.to_bytes().to_vec())
            }
            PrivateKeyInner::P384 { signing, .. } => {
                use p384::ecdsa::signature::Signer;
                let sig: p384::ecdsa::Signature = signing.try_sign(message).map_err(failed)?;
                Ok(sig.to_bytes().to_vec())
            }
            PrivateKeyInner::P521 { signing, .. } => {
                use p521::ecdsa::signature::Signer;
                let sig: p521::ecdsa::Signature = signing.try_sign(message).map_err(failed)?;
                Ok(sig.to_bytes().to_vec())
            }
        }
    }
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("curve", &self.curve())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// An elliptic-curve public key, used to verify signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: PublicKeyInner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PublicKeyInner {
    P256(p256::PublicKey),
    P384(p384::PublicKey),
    P521(p521::PublicKey),
}

impl PublicKey {
    /// Load a public key from an SPKI `PUBLIC KEY` PEM block.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let blocks = parse_pem(pem)?;
        let Some(block) = blocks.iter().find(|b| b.tag() == "PUBLIC KEY") else {
            return Err(Error::key_invalid("no PUBLIC KEY PEM block found"));
        };

        let spki = SubjectPublicKeyInfoRef::try_from(block.contents())
            .map_err(|e| Error::key_invalid(format!("malformed public key: {e}")))?;
        if spki.algorithm.oid != ID_EC_PUBLIC_KEY {
            return Err(Error::key_invalid(format!(
                "public key with algorithm {} is not an elliptic-curve key",
                spki.algorithm.oid
            )));
        }
        let curve_oid = spki
            .algorithm
            .parameters_oid()
            .map_err(|e| Error::key_invalid(format!("missing elliptic curve parameters: {e}")))?;
        let point = spki.subject_public_key.raw_bytes();

        let invalid = |e: p256::elliptic_curve::Error| {
            Error::key_invalid(format!("invalid elliptic curve point: {e}"))
        };
        let inner = match Curve::from_oid(curve_oid)? {
            Curve::P256 => PublicKeyInner::P256(p256::PublicKey::from_sec1_bytes(point).map_err(invalid)?),
            Curve::P384 => PublicKeyInner::P384(p384::PublicKey::from_sec1_bytes(point).map_err(invalid)?),
            Curve::P521 => PublicKeyInner::P521(p521::PublicKey::from_sec1_bytes(point).map_err(invalid)?),
        };
        Ok(Self { inner })
    }

    /// Curve of this key.
    pub fn curve(&self) -> Curve {
        match &self.inner {
            PublicKeyInner::P256(_) => Curve::P256,
            PublicKeyInner::P384(_) => Curve::P384,
            PublicKeyInner::P521(_) => Curve::P521,
        }
    }

    /// Uncompressed SEC1 encoding of the public point.
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        match &self.inner {
            PublicKeyInner::P256(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
            PublicKeyInner::P384(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
            PublicKeyInner::P521(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
        }
    }

    /// Hex SHA-256 over the uncompressed public point.
    pub fn fingerprint(&self) -> String {
        hex_sha256(&self.to_sec1_bytes())
    }

    /// Verify a raw `r||s` ECDSA signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let malformed = |e: p256::ecdsa::Error| {
            Error::request_invalid(format!("malformed {} signature: {e}", self.curve()))
        };
        let mismatch = |_| Error::request_invalid("signature verification failed");
        let point = self.to_sec1_bytes();

        match &self.inner {
            PublicKeyInner::P256(_) => {
                use p256::ecdsa::signature::Verifier;
                let vk = p256::ecdsa::VerifyingKey::from_sec1_bytes(&point).map_err(malformed)?;
                let sig = p256::ecdsa::Signature::from_slice(signature).map_err(malformed)?;
                vk.verify(message, &sig).map_err(mismatch)
            }
            PublicKeyInner::P384(_) => {
                use p384::ecdsa::signature::Verifier;
                let vk = p384::ecdsa::VerifyingKey::from_sec1_bytes(&point).map_err(malformed)?;
                let sig = p384::ecdsa::Signature::from_slice(signature).map_err(malformed)?;
                vk.verify(message, &sig).map_err(mismatch)
            }
            PublicKeyInner::P521(_) => {
                use p521::ecdsa::signature::Verifier;
                let vk = p521::ecdsa::VerifyingKey::from_sec1_bytes(&point).map_err(malformed)?;
                let sig = p521::ecdsa::Signature::from_slice(signature).map_err(malformed)?;
                vk.verify(message, &sig).map_err(mismatch)
            }
        }
    }
}

/// Parse every PEM block in `input`, ignoring text around them.
fn parse_pem(input: &str) -> Result<Vec<Pem>> {
    let blocks = pem::parse_many(input)
        .map_err(|e| Error::key_invalid(format!("failed to parse PEM: {e}")))?;
    if blocks.is_empty() {
        return Err(Error::key_invalid("no PEM block found"));
    }
    Ok(blocks)
}
