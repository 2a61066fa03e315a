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

//! Tokio-based file access for tlsign.
//!
//! This crate provides `TokioFileRead` and `TokioFileWrite`, which implement
//! the `FileRead` and `FileWrite` traits from `tlsign_core` using Tokio's
//! file system operations.
//!
//! Configuration stores use them to read key files and to persist settings.
//!
//! ## Example
//!
//! ```no_run
//! use tlsign_core::{Context, OsEnv};
//! use tlsign_file_tokio::{TokioFileRead, TokioFileWrite};
//!
//! #[tokio::main]
//! async fn main() {
//!     let ctx = Context::new()
//!         .with_file_read(TokioFileRead)
//!         .with_file_write(TokioFileWrite)
//!         .with_env(OsEnv);
//!
//!     match ctx.file_read("/path/to/tl-signature.toml").await {
//!         Ok(content) => println!("Read {} bytes", content.len()),
//!         Err(e) => eprintln!("Failed to read file: {}", e),
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tlsign_core::{Error, FileRead, FileWrite, Result};

/// Tokio-based implementation of the `FileRead` trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileRead;

#[async_trait]
impl FileRead for TokioFileRead {
    async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|e| {
            let err = match e.kind() {
                std::io::ErrorKind::NotFound => Error::not_found(format!("file {path} not found")),
                _ => Error::unexpected(format!("failed to read file {path}")),
            };
            err.with_source(e)
        })
    }
}

/// Tokio-based implementation of the `FileWrite` trait.
///
/// Parent directories are created on demand. The content goes to a uniquely
/// named temporary file next to the target and is then renamed over it, so
/// readers see either the old or the new file, never a truncated one. On Unix
/// the file is only readable by its owner, since it may hold a private key.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileWrite;

#[async_trait]
impl FileWrite for TokioFileWrite {
    async fn file_write(&self, path: &str, content: &[u8]) -> Result<()> {
        let path = path.to_string();
        let content = content.to_vec();
        tokio::task::spawn_blocking(move || write_private(&path, &content))
            .await
            .map_err(|e| Error::unexpected("file write task failed").with_source(e))?
    }
}

fn write_private(path: &str, content: &[u8]) -> Result<()> {
    let target = Path::new(path);
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| {
        Error::unexpected(format!("failed to create directory for {path}")).with_source(e)
    })?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| {
        Error::unexpected(format!("failed to create temporary file for {path}")).with_source(e)
    })?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o600))
            .map_err(|e| {
                Error::unexpected(format!("failed to restrict permissions of {path}")).with_source(e)
            })?;
    }
    tmp.write_all(content)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| Error::unexpected(format!("failed to write file {path}")).with_source(e))?;

    tmp.persist(target)
        .map_err(|e| Error::unexpected(format!("failed to replace file {path}")).with_source(e.error))?;
    Ok(())
}
