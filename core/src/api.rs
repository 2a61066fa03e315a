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

use crate::{Context, OutboundRequest, Result};
use std::fmt::Debug;
use std::sync::Arc;

/// InterceptRequest is the single hook a host transport calls for every
/// outbound request.
///
/// The host applies the returned request in place of the original. Hosts
/// adapt their own request types to [`OutboundRequest`] in a thin adapter,
/// which keeps implementations free of host API types.
///
/// Implementations must not fail: anything that goes wrong while processing
/// a request is expected to degrade to returning `req` unchanged.
pub trait InterceptRequest: Debug + Send + Sync + 'static {
    /// Process an outbound request and return the request to send.
    fn on_request(&self, req: OutboundRequest) -> OutboundRequest;
}

impl<T: InterceptRequest> InterceptRequest for Arc<T> {
    fn on_request(&self, req: OutboundRequest) -> OutboundRequest {
        self.as_ref().on_request(req)
    }
}

/// ConfigStore is the get/set contract of an external configuration store.
///
/// The store technology is up to the implementation: environment variables,
/// files, a host preference API, or plain memory.
#[async_trait::async_trait]
pub trait ConfigStore: Debug + Send + Sync + Unpin + 'static {
    /// Configuration handled by this store.
    type Config: Send + Sync + Unpin + 'static;

    /// Load the configuration.
    ///
    /// Returns `Ok(None)` if the store holds nothing yet.
    async fn load(&self, ctx: &Context) -> Result<Option<Self::Config>>;

    /// Persist the configuration, replacing whatever the store held before.
    async fn save(&self, ctx: &Context, config: &Self::Config) -> Result<()>;
}
