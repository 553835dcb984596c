use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;

/// JWT claims carried by an access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn subject(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).context("Token subject is not a user id")
    }
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: chrono::DateTime<Utc>,
}

/// Issues and verifies stateless access tokens. The only authority is the
/// signing key and the token's own `exp` claim.
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Builds the service from config. An empty `secret_key` yields a random
    /// key, so tokens will not survive a restart.
    pub fn from_config(config: &SecurityConfig) -> Result<Self> {
        let algorithm = parse_algorithm(&config.algorithm)?;
        let ttl = token_ttl(config.access_token_expire_minutes)?;

        let secret = if config.secret_key.is_empty() {
            tracing::warn!("No secret_key configured, generated a per-process signing key");
            random_signing_key()
        } else {
            config.secret_key.clone()
        };

        Ok(Self::new(algorithm, secret.as_bytes(), ttl))
    }

    #[must_use]
    pub fn new(algorithm: Algorithm, secret: &[u8], ttl: Duration) -> Self {
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, subject: Uuid) -> Result<AccessToken> {
        self.issue_with_ttl(subject, self.ttl)
    }

    pub fn issue_with_ttl(&self, subject: Uuid, ttl: Duration) -> Result<AccessToken> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .context("Token expiry overflows")?;

        let claims = Claims {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .context("Failed to generate token")?;

        Ok(AccessToken { token, expires_at })
    }

    /// Checks signature, algorithm and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }
}

pub fn parse_algorithm(name: &str) -> Result<Algorithm> {
    match name.to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => anyhow::bail!("Unsupported token algorithm '{other}' (expected HS256, HS384 or HS512)"),
    }
}

pub fn token_ttl(minutes: u64) -> Result<Duration> {
    i64::try_from(minutes)
        .ok()
        .and_then(Duration::try_minutes)
        .context("access_token_expire_minutes is too large")
}

fn random_signing_key() -> String {
    use rand::Rng;

    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}
