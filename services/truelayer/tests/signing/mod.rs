use super::*;
use pretty_assertions::assert_eq;
use serde_json::Value;
use test_case::test_case;
use tlsign_core::hash::base64_url_decode;
use tlsign_core::{InterceptRequest, OutboundRequest};
use tlsign_truelayer::{extract_kid, load_private_key, PublicKey, RequestSigner, Verifier};

fn verify(req: &OutboundRequest, public: &str) -> anyhow::Result<()> {
    let signature = req.header("Tl-Signature").expect("request must be signed");
    let verifier = Verifier::new(PublicKey::from_pem(public)?);
    verifier.verify(signature, req.method(), req.path(), req.headers(), req.body())?;
    Ok(())
}

#[test]
fn test_payment_request_p521() -> anyhow::Result<()> {
    let interceptor = interceptor_with(Config::new("kid-123", EC521_SEC1))?;
    let req = OutboundRequest::new("POST", "/payments")
        .with_header("Content-Type", "application/json")
        .with_body(r#"{"amount":100}"#);

    let signed = interceptor.on_request(req);
    verify(&signed, EC521_PUB)?;

    let signature = signed.header("Tl-Signature").unwrap();
    let (header, _) = signature.split_once("..").expect("detached JWS");
    let header: Value = serde_json::from_slice(&base64_url_decode(header)?)?;
    assert_eq!(header["alg"], "ES512");
    assert_eq!(header["kid"], "kid-123");
    assert_eq!(header["tl_version"], "2");
    assert_eq!(header["tl_headers"], "Idempotency-Key");
    assert_eq!(extract_kid(signature)?, "kid-123");
    Ok(())
}

#[test_case(EC256_PKCS8, EC256_PUB, "ES256" ; "p256")]
#[test_case(EC384_PKCS8, EC384_PUB, "ES384" ; "p384")]
#[test_case(EC521_PKCS8, EC521_PUB, "ES512" ; "p521")]
fn test_sign_verifies_per_curve(private: &str, public: &str, alg: &str) {
    let key = load_private_key(private).expect("key must load");
    assert_eq!(key.algorithm(), alg);

    let artifact = RequestSigner::new().sign(
        "kid",
        &key,
        "put",
        "/v3/mandates/1?expand=true",
        b"{\"status\":\"revoked\"}",
    )
    .expect("signing must succeed");
    let headers = vec![(
        "Idempotency-Key".to_string(),
        artifact.idempotency_key.clone(),
    )];

    let verifier = Verifier::new(PublicKey::from_pem(public).expect("public key must load"));
    verifier
        .verify(
            &artifact.signature,
            "PUT",
            "/v3/mandates/1?expand=true",
            &headers,
            b"{\"status\":\"revoked\"}",
        )
        .expect("signature must verify");
}

#[test]
fn test_non_utf8_body_is_signed_as_empty() -> anyhow::Result<()> {
    let interceptor = interceptor_with(Config::new("kid", EC256_SEC1))?;
    let req = OutboundRequest::new("POST", "/upload").with_body(vec![0xff, 0xfe, 0x00]);

    let signed = interceptor.on_request(req);
    let signature = signed.header("Tl-Signature").expect("request must be signed");
    let verifier = Verifier::new(PublicKey::from_pem(EC256_PUB)?);
    verifier.verify(signature, "POST", "/upload", signed.headers(), b"")?;
    assert_eq!(signed.body().as_ref(), &[0xff, 0xfe, 0x00]);
    Ok(())
}

#[test]
fn test_empty_path_signs_as_root() -> anyhow::Result<()> {
    let key = load_private_key(EC256_SEC1)?;
    let artifact =
        RequestSigner::new().sign_with_idempotency_key("kid", &key, "GET", "", b"", "idem")?;
    let headers = vec![("Idempotency-Key".to_string(), "idem".to_string())];

    Verifier::new(key.public_key()).verify(&artifact.signature, "GET", "/", &headers, b"")?;
    Ok(())
}

#[test]
fn test_signature_from_other_key_fails() -> anyhow::Result<()> {
    let interceptor = interceptor_with(Config::new("kid", EC256_SEC1))?;
    let signed = interceptor.on_request(OutboundRequest::new("GET", "/"));

    let other = load_private_key(EC384_SEC1)?;
    let signature = signed.header("Tl-Signature").unwrap();
    let result = Verifier::new(other.public_key()).verify(
        signature,
        "GET",
        "/",
        signed.headers(),
        b"",
    );
    assert!(result.is_err());
    Ok(())
}
