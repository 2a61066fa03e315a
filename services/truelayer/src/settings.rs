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
use crate::key::{load_private_key, Curve};
use crate::policy::{PolicySnapshot, SigningPolicy};
use log::{error, info};
use std::sync::Arc;
use tokio::sync::Mutex;
use tlsign_core::{ConfigStore, Context, Error, Result};

/// Details of a key that passed validation, safe to show to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    /// Curve of the key.
    pub curve: Curve,
    /// JWS `alg` the key signs with.
    pub algorithm: &'static str,
    /// Hex SHA-256 of the public point.
    pub fingerprint: String,
}

/// Settings ties a config store to the signing policy.
///
/// It is the only writer of the policy: configuration reaches the policy
/// through [`Settings::load`] at startup and [`Settings::apply`] on save.
#[derive(Debug)]
pub struct Settings<S: ConfigStore<Config = Config>> {
    ctx: Context,
    store: S,
    policy: Arc<SigningPolicy>,
    write_lock: Mutex<()>,
}

impl<S: ConfigStore<Config = Config>> Settings<S> {
    /// Create settings over `store` driving `policy`.
    pub fn new(ctx: Context, store: S, policy: Arc<SigningPolicy>) -> Self {
        Self {
            ctx,
            store,
            policy,
            write_lock: Mutex::new(()),
        }
    }

    /// Policy driven by these settings.
    pub fn policy(&self) -> &Arc<SigningPolicy> {
        &self.policy
    }

    /// Store backing these settings.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the stored config into the policy.
    ///
    /// A stored key that no longer parses is logged and installed as missing:
    /// the enabled flag and key id are kept, so every request reports the
    /// missing key instead of silently going out unsigned. Only store errors
    /// are returned.
    pub async fn load(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let Some(cfg) = self.store.load(&self.ctx).await? else {
            info!("no stored signing config, signing stays disabled");
            return Ok(());
        };

        let cfg = cfg.normalize();
        match SigningPolicy::prepare(cfg.clone()) {
            Ok(snapshot) => self.policy.install(snapshot),
            Err(err) => {
                error!("stored private key is unusable, signing without a key: {err}");
                self.policy.install(PolicySnapshot::without_key(cfg));
            }
        }
        Ok(())
    }

    /// Apply a new config.
    ///
    /// The key is parsed before anything is persisted. On any error neither
    /// the store nor the policy changes. Concurrent calls run one at a time,
    /// so the store and the policy always end up with the same config.
    pub async fn apply(&self, cfg: Config) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let cfg = cfg.normalize();
        cfg.validate()?;
        let snapshot = SigningPolicy::prepare(cfg)?;

        self.store.save(&self.ctx, snapshot.config()).await?;
        self.policy.install(snapshot);
        Ok(())
    }

    /// Check that `pem` holds a usable key without changing anything.
    pub fn validate_key(&self, pem: &str) -> Result<KeyInfo> {
        let pem = pem.trim();
        if pem.is_empty() {
            return Err(Error::config_invalid("no private key provided"));
        }

        let key = load_private_key(pem)?;
        Ok(KeyInfo {
            curve: key.curve(),
            algorithm: key.algorithm(),
            fingerprint: key.fingerprint(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provide_config::StaticConfigStore;
    use crate::{SigningDecision, SkipReason};
    use tlsign_core::{ErrorKind, OutboundRequest};

    const P384_PKCS8: &str = include_str!("../tests/testdata/ec384_pkcs8.pem");
    const ED25519: &str = include_str!("../tests/testdata/ed25519.pem");

    fn settings(store: StaticConfigStore) -> Settings<StaticConfigStore> {
        Settings::new(Context::new(), store, Arc::new(SigningPolicy::new()))
    }

    #[tokio::test]
    async fn test_apply_persists_then_installs() -> anyhow::Result<()> {
        let settings = settings(StaticConfigStore::empty());
        settings
            .apply(Config::new(" kid-384 ", format!("\n{P384_PKCS8}\n")))
            .await?;

        let stored = settings.store().get().expect("config must be stored");
        assert_eq!(stored.key_id, "kid-384");
        assert_eq!(stored.private_key_pem, P384_PKCS8.trim());

        let decision = settings
            .policy()
            .evaluate(&OutboundRequest::new("GET", "/"));
        assert!(matches!(decision, SigningDecision::SignWith { key_id, .. } if key_id == "kid-384"));
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_invalid_key_changes_nothing() {
        let settings = settings(StaticConfigStore::new(Config::default()));

        let err = settings
            .apply(Config::new("kid", ED25519))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeyInvalid);
        assert_eq!(settings.store().get(), Some(Config::default()));
        assert!(matches!(
            settings.policy().evaluate(&OutboundRequest::new("GET", "/")),
            SigningDecision::Skip(SkipReason::Disabled)
        ));
    }

    #[tokio::test]
    async fn test_apply_enabled_without_key_id() {
        let err = settings(StaticConfigStore::empty())
            .apply(Config::new("   ", P384_PKCS8))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[tokio::test]
    async fn test_load_with_broken_stored_key_reports_missing_key() -> anyhow::Result<()> {
        let settings = settings(StaticConfigStore::new(Config::new("kid", "garbage")));
        settings.load().await?;

        let snapshot = settings.policy().snapshot();
        assert!(snapshot.key().is_none());
        assert!(snapshot.config().enabled);
        assert_eq!(snapshot.config().key_id, "kid");
        assert!(matches!(
            settings.policy().evaluate(&OutboundRequest::new("GET", "/")),
            SigningDecision::Skip(SkipReason::MissingKey)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_apply_keeps_store_and_policy_in_sync() -> anyhow::Result<()> {
        let settings = Arc::new(settings(StaticConfigStore::empty()));

        let mut tasks = Vec::new();
        for i in 0..8 {
            let settings = settings.clone();
            tasks.push(tokio::spawn(async move {
                settings
                    .apply(Config::new(format!("kid-{i}"), P384_PKCS8))
                    .await
            }));
        }
        for task in tasks {
            task.await??;
        }

        let stored = settings.store().get().expect("config must be stored");
        assert_eq!(settings.policy().snapshot().config(), &stored);
        Ok(())
    }

    #[test]
    fn test_validate_key() -> anyhow::Result<()> {
        let settings = settings(StaticConfigStore::empty());

        let info = settings.validate_key(P384_PKCS8)?;
        assert_eq!(info.curve, Curve::P384);
        assert_eq!(info.algorithm, "ES384");
        assert_eq!(info.fingerprint.len(), 64);

        assert_eq!(
            settings.validate_key("  \n").unwrap_err().kind(),
            ErrorKind::ConfigInvalid
        );
        assert_eq!(
            settings.validate_key(ED25519).unwrap_err().kind(),
            ErrorKind::KeyInvalid
        );
        Ok(())
    }
}
