use super::*;
use test_case::test_case;
use tlsign_core::ErrorKind;
use tlsign_truelayer::{load_private_key, Curve, PublicKey};

#[test_case(EC256_SEC1, Curve::P256 ; "p256 sec1")]
#[test_case(EC256_PKCS8, Curve::P256 ; "p256 pkcs8")]
#[test_case(EC384_SEC1, Curve::P384 ; "p384 sec1")]
#[test_case(EC384_PKCS8, Curve::P384 ; "p384 pkcs8")]
#[test_case(EC521_SEC1, Curve::P521 ; "p521 sec1")]
#[test_case(EC521_PKCS8, Curve::P521 ; "p521 pkcs8")]
#[test_case(EC521_WITH_PARAMS, Curve::P521 ; "p521 after ec parameters")]
fn test_load_supported_key(pem: &str, curve: Curve) {
    let key = load_private_key(pem).expect("key must load");
    assert_eq!(key.curve(), curve);
    assert_eq!(key.algorithm(), curve.algorithm());
}

#[test_case(EC256_PKCS8, EC256_PUB ; "p256")]
#[test_case(EC384_SEC1, EC384_PUB ; "p384")]
#[test_case(EC521_PKCS8, EC521_PUB ; "p521")]
fn test_public_key_matches_openssl(private: &str, public: &str) {
    let key = load_private_key(private).expect("private key must load");
    let expected = PublicKey::from_pem(public).expect("public key must load");

    assert_eq!(key.public_key(), expected);
    assert_eq!(key.fingerprint(), expected.fingerprint());
}

#[test_case(RSA_PKCS8 ; "rsa")]
#[test_case(ED25519 ; "ed25519")]
#[test_case(K256_SEC1 ; "secp256k1")]
#[test_case(EC256_PUB ; "public key only")]
fn test_load_rejects_unsupported_key(pem: &str) {
    let err = load_private_key(pem).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyInvalid, "{err}");
}

#[test]
fn test_truncated_key_is_rejected() {
    let mut lines: Vec<&str> = EC384_SEC1.lines().collect();
    // Drop one base64 line from the middle of the body.
    lines.remove(2);
    let err = load_private_key(&lines.join("\n")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyInvalid);
}

#[test_case(EC256_PUB, EC256_SEC1 ; "public key before sec1 key")]
#[test_case(EC384_PUB, EC384_PKCS8 ; "public key before pkcs8 key")]
#[test_case(EC521_WITH_PARAMS, EC256_SEC1 ; "first private key wins")]
fn test_first_private_key_block_is_used(first: &str, second: &str) {
    let bundle = format!("{first}\n{second}");
    let key = load_private_key(&bundle).expect("bundle must load");

    let expected = if first.contains("PRIVATE KEY") { first } else { second };
    let expected = load_private_key(expected).expect("key must load");
    assert_eq!(key.fingerprint(), expected.fingerprint());
}
