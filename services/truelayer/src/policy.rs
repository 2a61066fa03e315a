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

use crate::config::Config;
use crate::key::{load_private_key, PrivateKey};
use log::debug;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock};
use tlsign_core::{OutboundRequest, Result};

/// Why a request is sent unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Signing is turned off.
    Disabled,
    /// Signing is on but no key id is configured.
    MissingKeyId,
    /// Signing is on but no private key is loaded.
    MissingKey,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Disabled => f.write_str("signing is disabled"),
            SkipReason::MissingKeyId => f.write_str("signing is enabled but no key id is configured"),
            SkipReason::MissingKey => {
                f.write_str("signing is enabled but no private key is loaded")
            }
        }
    }
}

/// Outcome of evaluating the policy for one request.
#[derive(Debug, Clone)]
pub enum SigningDecision {
    /// Send the request unchanged.
    Skip(SkipReason),
    /// Sign the request with this key.
    SignWith {
        /// Value for the JWS `kid` header.
        key_id: String,
        /// Key to sign with.
        key: PrivateKey,
    },
}

/// An immutable, fully parsed policy state.
///
/// `key` is absent when the config has no PEM, or when a stored PEM failed
/// to parse at startup.
#[derive(Debug, Clone, Default)]
pub struct PolicySnapshot {
    config: Config,
    key: Option<PrivateKey>,
}

impl PolicySnapshot {
    /// Snapshot holding `config` without a usable key.
    pub(crate) fn without_key(config: Config) -> Self {
        Self { config, key: None }
    }

    /// Config this snapshot was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parsed key, if any.
    pub fn key(&self) -> Option<&PrivateKey> {
        self.key.as_ref()
    }

    fn decide(&self) -> SigningDecision {
        if !self.config.enabled {
            return SigningDecision::Skip(SkipReason::Disabled);
        }
        if self.config.key_id.is_empty() {
            return SigningDecision::Skip(SkipReason::MissingKeyId);
        }
        match &self.key {
            Some(key) => SigningDecision::SignWith {
                key_id: self.config.key_id.clone(),
                key: key.clone(),
            },
            None => SigningDecision::Skip(SkipReason::MissingKey),
        }
    }
}

/// SigningPolicy decides whether and how to sign each request.
///
/// Readers take the current snapshot under a short read lock, writers parse
/// outside the lock and swap the whole snapshot in. A reader never observes
/// a key id from one configuration paired with the key of another.
#[derive(Debug, Default)]
pub struct SigningPolicy {
    snapshot: RwLock<Arc<PolicySnapshot>>,
}

impl SigningPolicy {
    /// Create a disabled policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and install `cfg`.
    ///
    /// On error the active snapshot is left as it was.
    pub fn configure(&self, cfg: Config) -> Result<()> {
        let snapshot = Self::prepare(cfg)?;
        self.install(snapshot);
        Ok(())
    }

    /// Parse `cfg` into a snapshot without installing it.
    pub fn prepare(cfg: Config) -> Result<PolicySnapshot> {
        let key = if cfg.private_key_pem.is_empty() {
            None
        } else {
            Some(load_private_key(&cfg.private_key_pem)?)
        };
        Ok(PolicySnapshot { config: cfg, key })
    }

    /// Replace the active snapshot.
    pub fn install(&self, snapshot: PolicySnapshot) {
        debug!(
            "installing signing policy: enabled={}, key_id={:?}, key={:?}",
            snapshot.config.enabled,
            snapshot.config.key_id,
            snapshot.key.as_ref().map(|k| k.fingerprint())
        );
        *self.snapshot.write().expect("lock poisoned") = Arc::new(snapshot);
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        self.snapshot.read().expect("lock poisoned").clone()
    }

    /// Decide how to handle `req`.
    ///
    /// The decision depends only on the active configuration today, the
    /// request is passed so per-request rules can be added without changing
    /// callers.
    pub fn evaluate(&self, _req: &OutboundRequest) -> SigningDecision {
        self.snapshot().decide()
    }
}
