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

//! Core components for intercepting and signing outbound requests.
//!
//! This crate provides the host-independent types and traits shared by the
//! tlsign crates. It knows nothing about any particular signature scheme.
//!
//! ## Overview
//!
//! - **Context**: A container that holds implementations for file IO and environment access
//! - **OutboundRequest**: An immutable view of a request that is about to leave the host
//! - **Traits**: The host hook (`InterceptRequest`) and the configuration contract (`ConfigStore`)
//!
//! ## Example
//!
//! ```
//! use tlsign_core::{InterceptRequest, OutboundRequest};
//!
//! // A host adapter only needs something that implements `InterceptRequest`.
//! #[derive(Debug)]
//! struct AddTrace;
//!
//! impl InterceptRequest for AddTrace {
//!     fn on_request(&self, req: OutboundRequest) -> OutboundRequest {
//!         req.without_header("x-trace").with_header("x-trace", "on")
//!     }
//! }
//!
//! let req = OutboundRequest::new("GET", "/ping").with_header("X-Trace", "off");
//! let req = AddTrace.on_request(req);
//! assert_eq!(req.header("x-trace"), Some("on"));
//! assert_eq!(req.header_count("x-trace"), 1);
//! ```
//!
//! ## Traits
//!
//! - [`FileRead`] / [`FileWrite`]: For asynchronous file access
//! - [`Env`]: For environment variable access
//! - [`InterceptRequest`]: The single hook a host transport calls per request
//! - [`ConfigStore`]: For loading and persisting configuration
//!
//! ## Utilities
//!
//! - [`hash`]: Hashing and base64 helpers
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod utils;

mod context;
pub use context::Context;
pub use context::Env;
pub use context::FileRead;
pub use context::FileWrite;
pub use context::NoopEnv;
pub use context::NoopFileRead;
pub use context::NoopFileWrite;
pub use context::OsEnv;
pub use context::StaticEnv;

mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{ConfigStore, InterceptRequest};
mod request;
pub use request::OutboundRequest;
