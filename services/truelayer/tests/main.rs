mod interceptor;
mod keys;
mod settings;
mod signing;

use std::sync::Arc;
use tlsign_truelayer::{Config, RequestInterceptor, SigningPolicy};

pub const EC256_SEC1: &str = include_str!("testdata/ec256_sec1.pem");
pub const EC256_PKCS8: &str = include_str!("testdata/ec256_pkcs8.pem");
pub const EC256_PUB: &str = include_str!("testdata/ec256_pub.pem");
pub const EC384_SEC1: &str = include_str!("testdata/ec384_sec1.pem");
pub const EC384_PKCS8: &str = include_str!("testdata/ec384_pkcs8.pem");
pub const EC384_PUB: &str = include_str!("testdata/ec384_pub.pem");
pub const EC521_SEC1: &str = include_str!("testdata/ec521_sec1.pem");
pub const EC521_PKCS8: &str = include_str!("testdata/ec521_pkcs8.pem");
pub const EC521_PUB: &str = include_str!("testdata/ec521_pub.pem");
pub const EC521_WITH_PARAMS: &str = include_str!("testdata/ec521_with_params.pem");
pub const K256_SEC1: &str = include_str!("testdata/k256_sec1.pem");
pub const RSA_PKCS8: &str = include_str!("testdata/rsa_pkcs8.pem");
pub const ED25519: &str = include_str!("testdata/ed25519.pem");

/// Init logging for tests.
pub fn init_test() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build an interceptor over a policy configured with `cfg`.
pub fn interceptor_with(cfg: Config) -> anyhow::Result<RequestInterceptor> {
    init_test();

    let policy = Arc::new(SigningPolicy::new());
    policy.configure(cfg)?;
    Ok(RequestInterceptor::new(policy))
}
