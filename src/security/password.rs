use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::Arc;
use tokio::task;

use crate::config::SecurityConfig;

/// Argon2id hashing with the configured cost parameters.
///
/// Hashing and verification are CPU-bound and always run on the blocking
/// pool so they never stall the async runtime.
#[derive(Clone)]
pub struct Passwords {
    params: Params,
    /// Hash of a throw-away password, verified against when an account is
    /// missing so both login failure paths cost one Argon2 verification.
    dummy_hash: Arc<str>,
}

impl Passwords {
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        let dummy_hash = hash_with_params(&params, "stockroom-dummy-password")?;

        Ok(Self {
            params,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    pub async fn hash(&self, password: &str) -> Result<String> {
        let params = self.params.clone();
        let password = password.to_string();

        task::spawn_blocking(move || hash_with_params(&params, &password))
            .await
            .context("Password hashing task panicked")?
    }

    pub async fn verify(&self, password: &str, password_hash: &str) -> Result<bool> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();

        task::spawn_blocking(move || verify_hash(&password, &password_hash))
            .await
            .context("Password verification task panicked")?
    }

    /// Burns one verification against the dummy hash. Always `false`.
    pub async fn verify_dummy(&self, password: &str) -> Result<bool> {
        let dummy = Arc::clone(&self.dummy_hash);
        let password = password.to_string();

        task::spawn_blocking(move || verify_hash(&password, &dummy))
            .await
            .context("Password verification task panicked")??;

        Ok(false)
    }
}

fn hash_with_params(params: &Params, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

fn verify_hash(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    // Cost parameters are read back from the PHC string
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passwords() -> Passwords {
        Passwords::new(&SecurityConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn hash_then_verify() {
        let passwords = passwords();
        let hash = passwords.hash("password123").await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("password123"));
        assert!(passwords.verify("password123", &hash).await.unwrap());
        assert!(!passwords.verify("password124", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_distinct_salts() {
        let passwords = passwords();
        let a = passwords.hash("password123").await.unwrap();
        let b = passwords.hash("password123").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn dummy_verification_never_succeeds() {
        let passwords = passwords();
        assert!(!passwords.verify_dummy("stockroom-dummy-password").await.unwrap());
        assert!(!passwords.verify_dummy("anything").await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        assert!(passwords().verify("password123", "not-a-phc-string").await.is_err());
    }

    #[test]
    fn rejects_invalid_params() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1,
            ..SecurityConfig::default()
        };
        assert!(Passwords::new(&config).is_err());
    }
}
