use axum::{Json, extract::State};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::extract::ApiForm;
use super::{ApiError, AppState, LoginForm, Token, UserPublic};
use crate::services::AuthError;

/// POST /login/access-token
/// OAuth2-style password form; `username` carries the email.
pub async fn access_token(
    State(state): State<Arc<AppState>>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<Json<Token>, ApiError> {
    let token = state
        .auth_service()
        .login(&form.username, &form.password)
        .await
        .map_err(|e| match e {
            // A deactivated account is a bad login here, not a forbidden request
            AuthError::InactiveUser => ApiError::bad_request(e.to_string()),
            other => other.into(),
        })?;

    Ok(Json(Token {
        access_token: token.token,
        token_type: "bearer".to_string(),
    }))
}

/// POST /login/test-token
pub async fn test_token(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(user.into())
}
