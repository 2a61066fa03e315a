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
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use tlsign_core::utils::Redact;
use tlsign_core::{Context, Error, Result};

/// Config for Tl-Signature request signing.
///
/// The whole value is replaced on every save, never patched field by field.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sign outbound requests.
    #[serde(alias = "require_jws")]
    pub enabled: bool,
    /// Key identifier placed in the JWS `kid` header.
    #[serde(alias = "certificate_id")]
    pub key_id: String,
    /// PEM encoded elliptic-curve private key.
    #[serde(rename = "private_key")]
    pub private_key_pem: String,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("enabled", &self.enabled)
            .field("key_id", &self.key_id)
            .field("private_key_pem", &Redact::from(&self.private_key_pem))
            .finish()
    }
}

impl Config {
    /// Create a config that signs with `key_id` and `private_key_pem`.
    pub fn new(key_id: impl Into<String>, private_key_pem: impl Into<String>) -> Self {
        Self {
            enabled: true,
            key_id: key_id.into(),
            private_key_pem: private_key_pem.into(),
        }
    }

    /// Trim surrounding whitespace from the key id and PEM.
    pub fn normalize(mut self) -> Self {
        self.key_id = self.key_id.trim().to_string();
        self.private_key_pem = self.private_key_pem.trim().to_string();
        self
    }

    /// Reject a config that is enabled without a key id or key.
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.key_id.is_empty() {
            return Err(Error::config_invalid(
                "signing is enabled but no key id is configured",
            ));
        }
        if self.private_key_pem.is_empty() {
            return Err(Error::config_invalid(
                "signing is enabled but no private key is configured",
            ));
        }
        Ok(())
    }

    /// Load config from environment variables.
    pub async fn from_env(ctx: &Context) -> Result<Self> {
        Self::default().overlay_env(ctx).await
    }

    /// Overlay values from environment variables, keeping fields that are unset.
    ///
    /// `TL_SIGNATURE_PRIVATE_KEY` wins over `TL_SIGNATURE_PRIVATE_KEY_FILE`,
    /// a key file is read through the context with `~` expanded.
    pub async fn overlay_env(mut self, ctx: &Context) -> Result<Self> {
        if let Some(v) = ctx.env_var(TL_SIGNATURE_ENABLED) {
            self.enabled = parse_bool(&v);
        }
        if let Some(v) = ctx.env_var(TL_SIGNATURE_KEY_ID) {
            self.key_id = v;
        }
        if let Some(v) = ctx.env_var(TL_SIGNATURE_PRIVATE_KEY) {
            self.private_key_pem = v;
        } else if let Some(path) = ctx.env_var(TL_SIGNATURE_PRIVATE_KEY_FILE) {
            let path = ctx.expand_home_dir(&path).ok_or_else(|| {
                Error::unexpected(format!("failed to expand home directory in {path}"))
            })?;
            self.private_key_pem = ctx.file_read_as_string(&path).await?;
        }
        Ok(self)
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}
