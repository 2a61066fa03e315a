use super::*;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use std::thread;
use tlsign_core::{InterceptRequest, OutboundRequest};
use tlsign_truelayer::{PublicKey, Verifier};

#[test]
fn test_disabled_is_identity() -> anyhow::Result<()> {
    let cfg = Config {
        enabled: false,
        ..Config::new("kid", EC256_SEC1)
    };
    let interceptor = interceptor_with(cfg)?;

    let req = OutboundRequest::new("PATCH", "/x")
        .with_header("Idempotency-Key", "caller-chosen")
        .with_body("body");
    assert_eq!(interceptor.on_request(req.clone()), req);
    Ok(())
}

#[test]
fn test_resigning_replaces_headers() -> anyhow::Result<()> {
    let interceptor = interceptor_with(Config::new("kid", EC256_SEC1))?;
    let req = OutboundRequest::new("POST", "/payments").with_body("{}");

    let first = interceptor.on_request(req);
    let second = interceptor.on_request(first.clone());

    assert_eq!(second.header_count("idempotency-key"), 1);
    assert_eq!(second.header_count("tl-signature"), 1);
    assert_ne!(
        first.header("Idempotency-Key"),
        second.header("Idempotency-Key")
    );

    let verifier = Verifier::new(PublicKey::from_pem(EC256_PUB)?);
    verifier.verify(
        second.header("Tl-Signature").unwrap(),
        second.method(),
        second.path(),
        second.headers(),
        second.body(),
    )?;
    Ok(())
}

#[test]
fn test_reconfigure_is_seen_by_next_request() -> anyhow::Result<()> {
    let interceptor = interceptor_with(Config::default())?;
    let req = OutboundRequest::new("GET", "/");
    assert!(interceptor.on_request(req.clone()).header("Tl-Signature").is_none());

    interceptor
        .policy()
        .configure(Config::new("kid", EC384_PKCS8))?;
    assert!(interceptor.on_request(req).header("Tl-Signature").is_some());
    Ok(())
}

#[test]
fn test_concurrent_requests_during_reconfigure() -> anyhow::Result<()> {
    let interceptor = interceptor_with(Config::new("kid-256", EC256_SEC1))?;
    let p256 = Verifier::new(PublicKey::from_pem(EC256_PUB)?);
    let p384 = Verifier::new(PublicKey::from_pem(EC384_PUB)?);

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..20 {
                    let signed = interceptor.on_request(OutboundRequest::new("GET", "/"));
                    let sig = signed.header("Tl-Signature").expect("always signed");
                    let kid = tlsign_truelayer::extract_kid(sig).unwrap();
                    let verifier = if kid == "kid-256" { &p256 } else { &p384 };
                    verifier
                        .verify(sig, "GET", "/", signed.headers(), b"")
                        .expect("kid and key come from the same config");
                }
            });
        }
        s.spawn(|| {
            for i in 0..20 {
                let cfg = if i % 2 == 0 {
                    Config::new("kid-384", EC384_SEC1)
                } else {
                    Config::new("kid-256", EC256_SEC1)
                };
                interceptor.policy().configure(cfg).unwrap();
            }
        });
    });
    Ok(())
}

#[test]
fn test_intercept_parts_rejects_nothing_when_disabled() -> anyhow::Result<()> {
    let interceptor = interceptor_with(Config::default())?;
    let (mut parts, body) = http::Request::builder()
        .method("GET")
        .uri("https://api.truelayer.com/v3/payments")
        .header("Idempotency-Key", "keep-me")
        .body(Bytes::new())?
        .into_parts();

    interceptor.intercept_parts(&mut parts, &body)?;
    assert_eq!(parts.headers.get("idempotency-key").unwrap(), "keep-me");
    assert!(parts.headers.get("tl-signature").is_none());
    Ok(())
}
