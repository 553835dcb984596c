use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::entities::{api_keys, users};
use crate::services::{AuthError, require_superuser};

pub const API_KEY_HEADER: &str = "X-API-Key";

// ============================================================================
// Principals
// ============================================================================

/// An active user resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub users::Model);

/// A `CurrentUser` that also passed the superuser check.
#[derive(Debug, Clone)]
pub struct SuperUser(pub users::Model);

/// The key that authenticated a machine request; placed in request
/// extensions by [`api_key_middleware`].
#[derive(Debug, Clone)]
pub struct ApiKeyPrincipal(pub api_keys::Model);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        let user = state.auth_service().authenticate_bearer(token).await?;

        tracing::Span::current().record("user_id", tracing::field::display(user.id));
        Ok(Self(user))
    }
}

impl FromRequestParts<Arc<AppState>> for SuperUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if let Err(e) = require_superuser(&user) {
            tracing::warn!(user_id = %user.id, "Superuser route refused");
            return Err(e.into());
        }

        Ok(Self(user))
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Guards machine routes: requires a valid, active, unexpired `X-API-Key`.
pub async fn api_key_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let secret = extract_api_key(request.headers()).ok_or(AuthError::MissingApiKey)?;

    let key = state.auth_service().authenticate_api_key(&secret).await?;

    let principal = format!("api-key:{}", key.id);
    tracing::Span::current().record("user_id", principal.as_str());
    request.extensions_mut().insert(ApiKeyPrincipal(key));

    Ok(next.run(request).await)
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ToString::to_string)
}

/// Token from an `Authorization: Bearer` header; the scheme is case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
