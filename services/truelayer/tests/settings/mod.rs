use super::*;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use tlsign_core::{ConfigStore, Context, ErrorKind, InterceptRequest, OutboundRequest, StaticEnv};
use tlsign_file_tokio::{TokioFileRead, TokioFileWrite};
use tlsign_truelayer::{EnvConfigStore, FileConfigStore, Settings};

fn file_ctx(home: &std::path::Path) -> Context {
    Context::new()
        .with_file_read(TokioFileRead)
        .with_file_write(TokioFileWrite)
        .with_env(StaticEnv {
            home_dir: Some(home.to_path_buf()),
            envs: HashMap::new(),
        })
}

#[tokio::test]
async fn test_apply_survives_restart() -> anyhow::Result<()> {
    init_test();
    let home = tempfile::tempdir()?;
    let path = "~/tlsign/settings.toml";

    let policy = Arc::new(SigningPolicy::new());
    let settings = Settings::new(file_ctx(home.path()), FileConfigStore::new(path), policy);
    settings.apply(Config::new("kid-521", EC521_PKCS8)).await?;

    // A fresh process reads the same file.
    let policy = Arc::new(SigningPolicy::new());
    let settings = Settings::new(
        file_ctx(home.path()),
        FileConfigStore::new(path),
        policy.clone(),
    );
    settings.load().await?;

    let snapshot = policy.snapshot();
    assert_eq!(snapshot.config().key_id, "kid-521");
    assert_eq!(
        snapshot.key().map(|k| k.algorithm()),
        Some("ES512")
    );
    Ok(())
}

#[tokio::test]
async fn test_failed_apply_keeps_file() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;
    let ctx = file_ctx(home.path());
    let store = FileConfigStore::new("~/settings.toml");
    let settings = Settings::new(ctx.clone(), store.clone(), Arc::new(SigningPolicy::new()));

    settings.apply(Config::new("kid", EC256_SEC1)).await?;
    let err = settings
        .apply(Config::new("kid-rsa", RSA_PKCS8))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyInvalid);

    let stored = store.load(&ctx).await?.expect("config must still be stored");
    assert_eq!(stored.key_id, "kid");
    Ok(())
}

#[tokio::test]
async fn test_load_from_env() -> anyhow::Result<()> {
    let ctx = Context::new().with_env(StaticEnv {
        home_dir: None,
        envs: HashMap::from([
            ("TL_SIGNATURE_ENABLED".to_string(), "true".to_string()),
            ("TL_SIGNATURE_KEY_ID".to_string(), "kid-env".to_string()),
            ("TL_SIGNATURE_PRIVATE_KEY".to_string(), EC384_SEC1.to_string()),
        ]),
    });

    let policy = Arc::new(SigningPolicy::new());
    Settings::new(ctx, EnvConfigStore::new(), policy.clone())
        .load()
        .await?;

    let interceptor = tlsign_truelayer::RequestInterceptor::new(policy);
    let signed = interceptor.on_request(OutboundRequest::new("GET", "/"));
    assert!(signed.header("Tl-Signature").is_some());
    Ok(())
}

#[tokio::test]
async fn test_load_with_unparseable_stored_key() -> anyhow::Result<()> {
    init_test();
    let home = tempfile::tempdir()?;
    std::fs::write(
        home.path().join("settings.toml"),
        "require_jws = true\ncertificate_id = \"kid\"\nprivate_key = \"not a key\"\n",
    )?;

    let policy = Arc::new(SigningPolicy::new());
    let settings = Settings::new(
        file_ctx(home.path()),
        FileConfigStore::new("~/settings.toml"),
        policy.clone(),
    );
    settings.load().await?;

    let snapshot = policy.snapshot();
    assert!(snapshot.config().enabled);
    assert_eq!(snapshot.config().key_id, "kid");
    assert!(snapshot.key().is_none());

    // Requests go out unsigned and report the missing key.
    let interceptor = tlsign_truelayer::RequestInterceptor::new(policy.clone());
    let req = OutboundRequest::new("GET", "/");
    assert_eq!(interceptor.on_request(req.clone()), req);
    assert!(matches!(
        policy.evaluate(&req),
        tlsign_truelayer::SigningDecision::Skip(tlsign_truelayer::SkipReason::MissingKey)
    ));
    Ok(())
}
