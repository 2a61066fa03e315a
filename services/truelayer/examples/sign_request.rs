//! Sign one request with a key from the environment and verify it.
//!
//! ```shell
//! TL_SIGNATURE_ENABLED=true \
//! TL_SIGNATURE_KEY_ID=my-kid \
//! TL_SIGNATURE_PRIVATE_KEY_FILE=~/keys/ec512-private.pem \
//! RUST_LOG=debug cargo run --example sign_request
//! ```

use anyhow::Result;
use bytes::Bytes;
use log::info;
use std::sync::Arc;
use tlsign_core::{Context, OsEnv};
use tlsign_file_tokio::TokioFileRead;
use tlsign_truelayer::{EnvConfigStore, RequestInterceptor, Settings, SigningPolicy, Verifier};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let ctx = Context::new().with_file_read(TokioFileRead).with_env(OsEnv);
    let policy = Arc::new(SigningPolicy::new());
    Settings::new(ctx, EnvConfigStore::new(), policy.clone())
        .load()
        .await?;

    let (mut parts, body) = http::Request::builder()
        .method("POST")
        .uri("https://api.truelayer-sandbox.com/v3/payments")
        .header("Content-Type", "application/json")
        .body(Bytes::from_static(br#"{"amount_in_minor":100,"currency":"GBP"}"#))?
        .into_parts();

    let interceptor = RequestInterceptor::new(policy.clone());
    interceptor.intercept_parts(&mut parts, &body)?;

    let Some(signature) = parts.headers.get("tl-signature") else {
        info!("request left unsigned, check TL_SIGNATURE_* variables");
        return Ok(());
    };
    println!("Idempotency-Key: {:?}", parts.headers.get("idempotency-key"));
    println!("Tl-Signature: {}", signature.to_str()?);

    if let Some(key) = policy.snapshot().key() {
        let headers: Vec<(String, String)> = parts
            .headers
            .iter()
            .map(|(k, v)| -> Result<(String, String)> { Ok((k.to_string(), v.to_str()?.to_string())) })
            .collect::<Result<_>>()?;
        Verifier::new(key.public_key()).verify(
            signature.to_str()?,
            parts.method.as_str(),
            parts.uri.path(),
            &headers,
            &body,
        )?;
        println!("signature verified with key {}", key.fingerprint());
    }
    Ok(())
}
