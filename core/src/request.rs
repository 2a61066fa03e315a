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

use bytes::Bytes;
use http::header::HeaderName;
use http::HeaderMap;
use http::HeaderValue;

use crate::Result;

/// An outbound request as seen by an interceptor.
///
/// Headers keep their original order and spelling. Lookups are
/// case-insensitive and the last occurrence wins. The value is never
/// mutated in place: every `with_*`/`without_*` method returns a new request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutboundRequest {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl OutboundRequest {
    /// Create a request without headers or body.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Build an outbound request from `http::request::Parts` and a body.
    ///
    /// The path includes the query string, exactly as it goes on the wire.
    pub fn build(parts: &http::request::Parts, body: Bytes) -> Result<Self> {
        let path = parts
            .uri
            .path_and_query()
            .map(|paq| paq.as_str().to_string())
            .unwrap_or_default();

        let mut headers = Vec::with_capacity(parts.headers.len());
        for (name, value) in parts.headers.iter() {
            headers.push((name.as_str().to_string(), value.to_str()?.to_string()));
        }

        Ok(Self {
            method: parts.method.as_str().to_string(),
            path,
            headers,
            body,
        })
    }

    /// Write the headers of this request back into `http::request::Parts`.
    ///
    /// Method, URI and body are left as they are: interceptors only
    /// rewrite headers.
    pub fn apply(self, parts: &mut http::request::Parts) -> Result<()> {
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in self.headers {
            headers.append(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(&value)?,
            );
        }
        parts.headers = headers;
        Ok(())
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Append a header, keeping any existing header with the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Remove every header matching `name`, case-insensitively.
    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self
    }

    /// HTTP method as sent by the host.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request path, including the query string if any.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All headers in order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Get header value by name, case-insensitively.
    ///
    /// Returns the last matching header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Count headers matching `name`, case-insensitively.
    pub fn header_count(&self, name: &str) -> usize {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .count()
    }

    /// Request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}
