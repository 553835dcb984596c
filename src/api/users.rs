use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;
use uuid::Uuid;

use super::auth::{CurrentUser, SuperUser};
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::validation::{validate_email, validate_full_name, validate_pagination, validate_password};
use super::{
    ApiError, AppState, Message, Page, Pagination, UpdatePassword, UserPublic, UserRegister,
    UserUpdateMe,
};
use crate::db::{Creatable, Deletable, Readable, Updatable};
use crate::models::{UserCreate, UserUpdate};
use crate::services::require_self_or_superuser;

const CREATE_EXISTS: &str = "User with this email already exists.";
const SIGNUP_EXISTS: &str = "User already exists.";
const EMAIL_IN_USE: &str = "Email already in use";
const EMAIL_EXISTS: &str = "Email already exists";

/// GET /users/
pub async fn list_users(
    _admin: SuperUser,
    State(state): State<Arc<AppState>>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<UserPublic>>, ApiError> {
    let (offset, limit) = validate_pagination(page.skip, page.limit)?;
    let users = state.store().users();

    let count = users.count().await?;
    let rows = users.list(offset, limit).await?;

    Ok(Json(Page::new(rows, count)))
}

/// POST /users/
pub async fn create_user(
    SuperUser(admin): SuperUser,
    State(state): State<Arc<AppState>>,
    ApiJson(mut input): ApiJson<UserCreate>,
) -> Result<(StatusCode, Json<UserPublic>), ApiError> {
    input.email = validate_email(&input.email)?;
    validate_password("password", &input.password)?;
    validate_full_name(input.full_name.as_deref())?;

    let users = state.store().users();

    if users.get_by_email(&input.email).await?.is_some() {
        return Err(ApiError::bad_request(CREATE_EXISTS));
    }

    let user = users
        .create(input)
        .await
        .map_err(|e| ApiError::from_write(e, CREATE_EXISTS))?;

    tracing::info!(user_id = %user.id, created_by = %admin.id, "User created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /users/signup
/// Self-service registration: always an active, non-superuser account.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<UserRegister>,
) -> Result<(StatusCode, Json<UserPublic>), ApiError> {
    let email = validate_email(&input.email)?;
    validate_password("password", &input.password)?;
    validate_full_name(input.full_name.as_deref())?;

    let users = state.store().users();

    if users.get_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request(SIGNUP_EXISTS));
    }

    let create = UserCreate {
        full_name: input.full_name,
        ..UserCreate::regular(email, input.password)
    };
    let user = users
        .create(create)
        .await
        .map_err(|e| ApiError::from_write(e, SIGNUP_EXISTS))?;

    tracing::info!(user_id = %user.id, "User signed up");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users/me
pub async fn read_me(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(user.into())
}

/// PATCH /users/me
pub async fn update_me(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<UserUpdateMe>,
) -> Result<Json<UserPublic>, ApiError> {
    let users = state.store().users();

    let email = match input.email {
        Some(email) => {
            let email = validate_email(&email)?;
            if let Some(existing) = users.get_by_email(&email).await?
                && existing.id != user.id
            {
                return Err(ApiError::conflict(EMAIL_IN_USE));
            }
            Some(email)
        }
        None => None,
    };
    if let Some(full_name) = &input.full_name {
        validate_full_name(full_name.as_deref())?;
    }

    let patch = UserUpdate {
        email,
        full_name: input.full_name,
        ..UserUpdate::default()
    };
    let updated = users
        .update(user, patch)
        .await
        .map_err(|e| ApiError::from_write(e, EMAIL_IN_USE))?;

    Ok(Json(updated.into()))
}

/// PATCH /users/me/password
pub async fn update_password_me(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<UpdatePassword>,
) -> Result<Json<Message>, ApiError> {
    validate_password("new_password", &body.new_password)?;
    let users = state.store().users();

    if !users.verify_password(&user, &body.current_password).await? {
        return Err(ApiError::bad_request("Incorrect current password"));
    }
    if body.current_password == body.new_password {
        return Err(ApiError::bad_request("New password must differ"));
    }

    let user = users.set_password(user, &body.new_password).await?;

    tracing::info!(user_id = %user.id, "Password changed");
    Ok(Json(Message::new("Password updated successfully")))
}

/// DELETE /users/me
pub async fn delete_me(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Message>, ApiError> {
    if user.is_superuser {
        return Err(ApiError::forbidden("Superusers cannot delete themselves"));
    }

    state.store().users().remove(user.id).await?;

    tracing::info!(user_id = %user.id, "User deleted own account");
    Ok(Json(Message::new("User deleted successfully")))
}

/// GET /users/{id}
pub async fn read_user(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<UserPublic>, ApiError> {
    require_self_or_superuser(&user, user_id)?;

    let target = state
        .store()
        .users()
        .get(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(target.into()))
}

/// PATCH /users/{id}
pub async fn update_user(
    _admin: SuperUser,
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(mut patch): ApiJson<UserUpdate>,
) -> Result<Json<UserPublic>, ApiError> {
    let users = state.store().users();

    let target = users
        .get(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if let Some(email) = patch.email.take() {
        let email = validate_email(&email)?;
        if let Some(existing) = users.get_by_email(&email).await?
            && existing.id != user_id
        {
            return Err(ApiError::conflict(EMAIL_EXISTS));
        }
        patch.email = Some(email);
    }
    if let Some(password) = &patch.password {
        validate_password("password", password)?;
    }
    if let Some(full_name) = &patch.full_name {
        validate_full_name(full_name.as_deref())?;
    }

    let updated = users
        .update(target, patch)
        .await
        .map_err(|e| ApiError::from_write(e, EMAIL_EXISTS))?;

    Ok(Json(updated.into()))
}

/// DELETE /users/{id}
pub async fn delete_user(
    SuperUser(admin): SuperUser,
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<Message>, ApiError> {
    let users = state.store().users();

    let target = users
        .get(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if target.id == admin.id {
        return Err(ApiError::forbidden("You can't delete yourself"));
    }

    users.remove(target.id).await?;

    tracing::info!(user_id = %target.id, deleted_by = %admin.id, "User deleted");
    Ok(Json(Message::new("User deleted successfully")))
}
