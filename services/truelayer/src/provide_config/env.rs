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
use crate::constants::*;
use async_trait::async_trait;
use tlsign_core::{ConfigStore, Context, Error, Result};

/// EnvConfigStore loads signing config from environment variables.
///
/// This store looks for the following environment variables:
/// - `TL_SIGNATURE_ENABLED`: `true`, `1`, `on` or `yes` turns signing on
/// - `TL_SIGNATURE_KEY_ID`: The key id placed in the JWS `kid`
/// - `TL_SIGNATURE_PRIVATE_KEY`: The PEM encoded private key
/// - `TL_SIGNATURE_PRIVATE_KEY_FILE`: The path to the PEM file, used when
///   `TL_SIGNATURE_PRIVATE_KEY` is unset
///
/// The environment is read-only, saving always fails.
#[derive(Debug, Default, Clone)]
pub struct EnvConfigStore {}

impl EnvConfigStore {
    /// Create a new EnvConfigStore.
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl ConfigStore for EnvConfigStore {
    type Config = Config;

    async fn load(&self, ctx: &Context) -> Result<Option<Self::Config>> {
        let any_set = [
            TL_SIGNATURE_ENABLED,
            TL_SIGNATURE_KEY_ID,
            TL_SIGNATURE_PRIVATE_KEY,
            TL_SIGNATURE_PRIVATE_KEY_FILE,
        ]
        .iter()
        .any(|k| ctx.env_var(k).is_some());
        if !any_set {
            return Ok(None);
        }

        Config::from_env(ctx).await.map(Some)
    }

    async fn save(&self, _: &Context, _: &Self::Config) -> Result<()> {
        Err(Error::config_invalid(
            "environment config store is read-only",
        ))
    }
}
