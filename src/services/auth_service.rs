//! Domain service for resolving callers into principals.
//!
//! Two schemes coexist: signed bearer tokens for interactive users and
//! `X-API-Key` secrets for machine clients. Role checks are plain functions
//! layered on top of a resolved user.

use thiserror::Error;
use uuid::Uuid;

use crate::entities::{api_keys, users};
use crate::security::AccessToken;

/// Errors specific to authentication and authorization.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Inactive user")]
    InactiveUser,

    #[error("Not authenticated")]
    MissingToken,

    #[error("Could not validate credentials")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("API key missing")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API key expired")]
    ApiKeyExpired,

    #[error("The user doesn't have enough privileges")]
    NotSuperuser,

    #[error("Insufficient privileges")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Checks an email/password pair and issues an access token.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] for an unknown email or wrong
    /// password (indistinguishable), [`AuthError::InactiveUser`] for a
    /// deactivated account.
    async fn login(&self, email: &str, password: &str) -> Result<AccessToken, AuthError>;

    /// Resolves a bearer token into an active user.
    async fn authenticate_bearer(&self, token: &str) -> Result<users::Model, AuthError>;

    /// Resolves a raw API key secret into an active, unexpired key.
    async fn authenticate_api_key(&self, secret: &str) -> Result<api_keys::Model, AuthError>;
}

pub fn require_superuser(user: &users::Model) -> Result<(), AuthError> {
    if user.is_superuser {
        Ok(())
    } else {
        Err(AuthError::NotSuperuser)
    }
}

/// A user may act on their own record; a superuser on anyone's.
pub fn require_self_or_superuser(user: &users::Model, target: Uuid) -> Result<(), AuthError> {
    if user.id == target || user.is_superuser {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
