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
use crate::policy::{SigningDecision, SigningPolicy, SkipReason};
use crate::sign_request::RequestSigner;
use bytes::Bytes;
use log::{debug, error, warn};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tlsign_core::{InterceptRequest, OutboundRequest, Result};

/// RequestInterceptor adds `Idempotency-Key` and `Tl-Signature` to outbound
/// requests when the policy says so.
///
/// It never fails a request: whatever goes wrong while signing is logged and
/// the request goes out as it came in.
#[derive(Debug, Clone)]
pub struct RequestInterceptor {
    policy: Arc<SigningPolicy>,
    signer: RequestSigner,
}

impl RequestInterceptor {
    /// Create an interceptor reading decisions from `policy`.
    pub fn new(policy: Arc<SigningPolicy>) -> Self {
        Self {
            policy,
            signer: RequestSigner::new(),
        }
    }

    /// Policy this interceptor reads.
    pub fn policy(&self) -> &Arc<SigningPolicy> {
        &self.policy
    }

    /// Run the interceptor over `http` request parts.
    ///
    /// Only headers are rewritten. Fails if the parts carry headers that
    /// are not visible ASCII, in which case `parts` are left untouched.
    pub fn intercept_parts(&self, parts: &mut http::request::Parts, body: &Bytes) -> Result<()> {
        let req = OutboundRequest::build(parts, body.clone())?;
        self.on_request(req).apply(parts)
    }

    fn process(&self, req: &OutboundRequest) -> Result<Option<OutboundRequest>> {
        let (key_id, key) = match self.policy.evaluate(req) {
            SigningDecision::Skip(SkipReason::Disabled) => {
                debug!("{} {} sent unsigned: {}", req.method(), req.path(), SkipReason::Disabled);
                return Ok(None);
            }
            SigningDecision::Skip(reason) => {
                warn!("{} {} sent unsigned: {}", req.method(), req.path(), reason);
                return Ok(None);
            }
            SigningDecision::SignWith { key_id, key } => (key_id, key),
        };

        let artifact = self
            .signer
            .sign(&key_id, &key, req.method(), req.path(), req.body())?;

        Ok(Some(
            req.clone()
                .without_header(TL_SIGNATURE)
                .without_header(IDEMPOTENCY_KEY)
                .with_header(IDEMPOTENCY_KEY, artifact.idempotency_key)
                .with_header(TL_SIGNATURE, artifact.signature),
        ))
    }
}

impl InterceptRequest for RequestInterceptor {
    fn on_request(&self, req: OutboundRequest) -> OutboundRequest {
        match catch_unwind(AssertUnwindSafe(|| self.process(&req))) {
            Ok(Ok(Some(signed))) => signed,
            Ok(Ok(None)) => req,
            Ok(Err(err)) => {
                error!(
                    "failed to sign {} {}, sending unsigned: {err}",
                    req.method(),
                    req.path()
                );
                req
            }
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(
                    "signing {} {} panicked, sending unsigned: {msg}",
                    req.method(),
                    req.path()
                );
                req
            }
        }
    }
}
