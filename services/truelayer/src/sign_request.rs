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

use crate::constants::*;
use crate::key::PrivateKey;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tlsign_core::hash::base64_url_encode;
use tlsign_core::Result;
use uuid::Uuid;

/// Protected header of a `Tl-Signature` JWS.
///
/// Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct JwsHeader {
    pub alg: String,
    pub kid: String,
    pub tl_version: String,
    pub tl_headers: String,
}

/// Result of signing one request.
///
/// Created per request and never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureArtifact {
    /// Value for the `Idempotency-Key` header, a UUID v4.
    pub idempotency_key: String,
    /// Value for the `Tl-Signature` header, a compact JWS with detached payload.
    pub signature: String,
}

/// RequestSigner produces TrueLayer request signatures (signing v2).
///
/// The signature covers the method, the path, the `Idempotency-Key` header
/// and the body.
///
/// - [TrueLayer request signing](https://docs.truelayer.com/docs/sign-your-payments-requests)
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestSigner {}

impl RequestSigner {
    /// Create a new signer.
    pub fn new() -> Self {
        Self {}
    }

    /// Sign a request with a freshly generated idempotency key.
    pub fn sign(
        &self,
        key_id: &str,
        key: &PrivateKey,
        method: &str,
        path: &str,
        body: &[u8],
    ) -> Result<SignatureArtifact> {
        let idempotency_key = Uuid::new_v4().to_string();
        self.sign_with_idempotency_key(key_id, key, method, path, body, &idempotency_key)
    }

    /// Sign a request with a caller supplied idempotency key.
    pub fn sign_with_idempotency_key(
        &self,
        key_id: &str,
        key: &PrivateKey,
        method: &str,
        path: &str,
        body: &[u8],
        idempotency_key: &str,
    ) -> Result<SignatureArtifact> {
        let body = match std::str::from_utf8(body) {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    "request body of {method} {path} is not valid UTF-8, signing over an empty body: {err}"
                );
                ""
            }
        };

        let header = JwsHeader {
            alg: key.algorithm().to_string(),
            kid: key_id.to_string(),
            tl_version: TL_VERSION.to_string(),
            tl_headers: IDEMPOTENCY_KEY.to_string(),
        };
        let payload = canonical_payload(method, path, &[(IDEMPOTENCY_KEY, idempotency_key)], body)?;

        let encoded_header = base64_url_encode(&serde_json::to_vec(&header)?);
        let signing_input = format!("{encoded_header}.{}", base64_url_encode(payload.as_bytes()));
        debug!(
            "signing {} {} with key {} ({})",
            method,
            path,
            key_id,
            key.algorithm()
        );

        let signature = key.sign(signing_input.as_bytes())?;
        Ok(SignatureArtifact {
            idempotency_key: idempotency_key.to_string(),
            signature: format!("{encoded_header}..{}", base64_url_encode(&signature)),
        })
    }
}

/// Build the signed payload: request line, signed headers, then the body.
///
/// The method is uppercased and an empty path becomes `/`. Anything else in
/// the path, the query string included, is signed as is.
pub(crate) fn canonical_payload(
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> Result<String> {
    let path = if path.is_empty() { "/" } else { path };

    let mut f = String::with_capacity(body.len() + 128);
    writeln!(f, "{} {}", method.to_uppercase(), path)?;
    for (name, value) in headers {
        writeln!(f, "{name}: {value}")?;
    }
    f.push_str(body);
    Ok(f)
}
