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

//! Verification of `Tl-Signature` headers.
//!
//! This is the receiving side of [`RequestSigner`](crate::RequestSigner): it
//! rebuilds the signed payload from request parts and checks it against a
//! public key. Operators use it to self-check a key before rolling it out.

use crate::constants::*;
use crate::key::{Curve, PublicKey};
use crate::sign_request::{canonical_payload, JwsHeader};
use tlsign_core::hash::{base64_url_decode, base64_url_encode};
use tlsign_core::{Error, Result};

/// Verifier checks `Tl-Signature` values against one public key.
#[derive(Debug, Clone)]
pub struct Verifier {
    public_key: PublicKey,
}

impl Verifier {
    /// Create a verifier for `public_key`.
    pub fn new(public_key: PublicKey) -> Self {
        Self { public_key }
    }

    /// Verify `signature` over a request.
    ///
    /// Every header named in the JWS `tl_headers` must be present in
    /// `headers`; names match case-insensitively and the last value wins.
    /// A body that is not valid UTF-8 is verified as empty, the same way it
    /// was signed.
    pub fn verify(
        &self,
        signature: &str,
        method: &str,
        path: &str,
        headers: &[(String, String)],
        body: &[u8],
    ) -> Result<()> {
        let (encoded_header, header, raw_signature) = parse_detached(signature)?;

        match Curve::from_algorithm(&header.alg) {
            Some(curve) if curve == self.public_key.curve() => {}
            _ => {
                return Err(Error::request_invalid(format!(
                    "signature algorithm {} does not match a {} key",
                    header.alg,
                    self.public_key.curve()
                )))
            }
        }
        if header.tl_version != TL_VERSION {
            return Err(Error::request_invalid(format!(
                "unsupported tl_version {:?}",
                header.tl_version
            )));
        }

        let mut signed_headers = Vec::new();
        for name in header
            .tl_headers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let value = headers
                .iter()
                .rev()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
                .ok_or_else(|| {
                    Error::request_invalid(format!("signed header {name} is missing"))
                })?;
            signed_headers.push((name, value));
        }

        let body = std::str::from_utf8(body).unwrap_or_default();
        let payload = canonical_payload(method, path, &signed_headers, body)?;
        let signing_input = format!("{encoded_header}.{}", base64_url_encode(payload.as_bytes()));

        self.public_key
            .verify(signing_input.as_bytes(), &raw_signature)
    }
}

/// Read the `kid` of a `Tl-Signature` without verifying it.
pub fn extract_kid(signature: &str) -> Result<String> {
    let (_, header, _) = parse_detached(signature)?;
    Ok(header.kid)
}

fn parse_detached(signature: &str) -> Result<(&str, JwsHeader, Vec<u8>)> {
    let mut parts = signature.trim().split('.');
    let (Some(header), Some(payload), Some(sig), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::request_invalid(
            "signature is not a compact JWS with three segments",
        ));
    };
    if !payload.is_empty() {
        return Err(Error::request_invalid(
            "signature must have a detached payload",
        ));
    }

    let decoded = base64_url_decode(header)
        .map_err(|e| Error::request_invalid("JWS header is not base64url").with_source(e))?;
    let jws_header: JwsHeader = serde_json::from_slice(&decoded)
        .map_err(|e| Error::request_invalid("JWS header is not valid").with_source(e))?;
    let raw = base64_url_decode(sig)
        .map_err(|e| Error::request_invalid("JWS signature is not base64url").with_source(e))?;

    Ok((header, jws_header, raw))
}
