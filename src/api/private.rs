use axum::{Json, extract::State};
use std::sync::Arc;

use super::extract::ApiJson;
use super::validation::{validate_email, validate_full_name, validate_password};
use super::{ApiError, AppState, PrivateUserCreate, UserPublic};
use crate::db::Creatable;
use crate::models::UserCreate;

/// POST /private/users/
/// Unauthenticated user creation, mounted only in the local environment.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<PrivateUserCreate>,
) -> Result<Json<UserPublic>, ApiError> {
    let email = validate_email(&input.email)?;
    validate_password("password", &input.password)?;
    validate_full_name(input.full_name.as_deref())?;

    let create = UserCreate {
        full_name: input.full_name,
        ..UserCreate::regular(email, input.password)
    };
    let user = state
        .store()
        .users()
        .create(create)
        .await
        .map_err(|e| ApiError::from_write(e, "User already exists."))?;

    tracing::info!(user_id = %user.id, "User created through private route");
    Ok(Json(user.into()))
}
