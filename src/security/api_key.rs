use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

/// Raw secret length in bytes (256 bits of entropy).
pub const SECRET_BYTES: usize = 32;

/// Generate a URL-safe API key secret (43 characters, no padding).
#[must_use]
pub fn generate_secret() -> String {
    use rand::Rng;

    let bytes: [u8; SECRET_BYTES] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Lowercase hex SHA-256 digest of a secret, the only form kept at rest.
#[must_use]
pub fn digest_secret(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    format!("{digest:x}")
}
