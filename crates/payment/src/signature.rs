//! IYZWS request signing.
//!
//! Every request carries `Authorization: IYZWS {api_key}:{hash}` where
//! `hash = base64(sha1("[" + rnd + api_key + uri + body + secret_key + "]"))`
//! and `rnd` is also sent as `x-iyzi-rnd`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use sha1::{Digest, Sha1};

use crate::config::IyzicoConfig;

pub const AUTHORIZATION_SCHEME: &str = "IYZWS";

/// Returns a fresh numeric nonce for one request.
pub fn random_string() -> String {
    let n: u64 = rand::thread_rng().gen_range(100_000_000..u64::MAX / 10);
    n.to_string()
}

/// Builds the string the hash is computed over.
pub fn pki_string(config: &IyzicoConfig, random: &str, uri: &str, body: &str) -> String {
    format!(
        "[{random}{}{uri}{body}{}]",
        config.api_key, config.secret_key
    )
}

/// Computes the `Authorization` header value.
pub fn authorization_header(config: &IyzicoConfig, random: &str, uri: &str, body: &str) -> String {
    let digest = Sha1::digest(pki_string(config, random, uri, body).as_bytes());
    format!(
        "{AUTHORIZATION_SCHEME} {}:{}",
        config.api_key,
        STANDARD.encode(digest)
    )
}
