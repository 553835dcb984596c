//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use crate::db::{Readable, Store};
use crate::entities::{api_keys, users};
use crate::security::{AccessToken, TokenService};
use crate::services::auth_service::{AuthError, AuthService};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: TokenService,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, tokens: TokenService) -> Self {
        Self { store, tokens }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<AccessToken, AuthError> {
        let Some(user) = self.store.users().authenticate(email, password).await? else {
            warn!("Login failed: incorrect email or password");
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_active {
            warn!(user_id = %user.id, "Login refused for inactive user");
            return Err(AuthError::InactiveUser);
        }

        Ok(self.tokens.issue(user.id)?)
    }

    async fn authenticate_bearer(&self, token: &str) -> Result<users::Model, AuthError> {
        let claims = self.tokens.verify(token).map_err(|e| {
            warn!(error = %e, "Rejected bearer token");
            AuthError::InvalidToken
        })?;

        let user_id = claims.subject().map_err(|_| {
            warn!("Rejected bearer token with malformed subject");
            AuthError::InvalidToken
        })?;

        let user = self
            .store
            .users()
            .get(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            warn!(user_id = %user.id, "Rejected token for inactive user");
            return Err(AuthError::InactiveUser);
        }

        Ok(user)
    }

    async fn authenticate_api_key(&self, secret: &str) -> Result<api_keys::Model, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::MissingApiKey);
        }

        let Some(key) = self.store.api_keys().get_active_by_secret(secret).await? else {
            warn!("Rejected unknown or inactive API key");
            return Err(AuthError::InvalidApiKey);
        };

        if key.is_expired_at(Utc::now()) {
            warn!(api_key_id = %key.id, "Rejected expired API key");
            return Err(AuthError::ApiKeyExpired);
        }

        Ok(key)
    }
}
