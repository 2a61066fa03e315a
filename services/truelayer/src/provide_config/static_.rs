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
use async_trait::async_trait;
use std::sync::Mutex;
use tlsign_core::{ConfigStore, Context, Result};

/// StaticConfigStore keeps the config in memory.
///
/// Hosts that own persistence themselves seed it at startup and read it back
/// after a save.
#[derive(Debug, Default)]
pub struct StaticConfigStore {
    config: Mutex<Option<Config>>,
}

impl StaticConfigStore {
    /// Create a store holding `config`.
    pub fn new(config: Config) -> Self {
        Self {
            config: Mutex::new(Some(config)),
        }
    }

    /// Create a store holding nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The config currently held.
    pub fn get(&self) -> Option<Config> {
        self.config.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl ConfigStore for StaticConfigStore {
    type Config = Config;

    async fn load(&self, _: &Context) -> Result<Option<Self::Config>> {
        Ok(self.get())
    }

    async fn save(&self, _: &Context, config: &Self::Config) -> Result<()> {
        *self.config.lock().expect("lock poisoned") = Some(config.clone());
        Ok(())
    }
}
