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

//! TrueLayer `Tl-Signature` request signing.
//!
//! Outbound requests handed to [`RequestInterceptor`] get a fresh
//! `Idempotency-Key` and a detached JWS `Tl-Signature` whenever the
//! [`SigningPolicy`] is enabled and holds a key id and key.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tlsign_core::{Context, InterceptRequest, OsEnv, OutboundRequest};
//! use tlsign_file_tokio::{TokioFileRead, TokioFileWrite};
//! use tlsign_truelayer::{FileConfigStore, RequestInterceptor, Settings, SigningPolicy};
//!
//! #[tokio::main]
//! async fn main() -> tlsign_core::Result<()> {
//!     let ctx = Context::new()
//!         .with_file_read(TokioFileRead)
//!         .with_file_write(TokioFileWrite)
//!         .with_env(OsEnv);
//!
//!     let policy = Arc::new(SigningPolicy::new());
//!     let settings = Settings::new(
//!         ctx,
//!         FileConfigStore::new("~/.config/tlsign/settings.toml"),
//!         policy.clone(),
//!     );
//!     settings.load().await?;
//!
//!     let interceptor = RequestInterceptor::new(policy);
//!     let req = OutboundRequest::new("POST", "/v3/payments").with_body("{\"amount\":100}");
//!     let req = interceptor.on_request(req);
//!     println!("{:?}", req.header("Tl-Signature"));
//!     Ok(())
//! }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;

mod config;
pub use config::Config;

mod key;
pub use key::{load_private_key, Curve, PrivateKey, PublicKey};

mod policy;
pub use policy::{PolicySnapshot, SigningDecision, SigningPolicy, SkipReason};

mod sign_request;
pub use sign_request::{RequestSigner, SignatureArtifact};

mod verify;
pub use verify::{extract_kid, Verifier};

mod interceptor;
pub use interceptor::RequestInterceptor;

mod provide_config;
pub use provide_config::{EnvConfigStore, FileConfigStore, StaticConfigStore};

mod settings;
pub use settings::{KeyInfo, Settings};
