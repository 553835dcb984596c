use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;
use uuid::Uuid;

use super::auth::SuperUser;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::validation::{validate_key_name, validate_pagination};
use super::{ApiError, ApiKeyCreated, ApiKeyPublic, AppState, Message, Page, Pagination};
use crate::db::{Creatable, Readable};
use crate::models::ApiKeyCreate;

/// POST /api-keys/
/// The raw key is in this response and nowhere else.
pub async fn create_api_key(
    SuperUser(admin): SuperUser,
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<ApiKeyCreate>,
) -> Result<(StatusCode, Json<ApiKeyCreated>), ApiError> {
    validate_key_name(&input.name)?;

    let issued = state.store().api_keys().create(input).await?;

    tracing::info!(
        api_key_id = %issued.record.id,
        name = %issued.record.name,
        created_by = %admin.id,
        "API key created"
    );
    Ok((StatusCode::CREATED, Json(issued.into())))
}

/// GET /api-keys/
pub async fn list_api_keys(
    _admin: SuperUser,
    State(state): State<Arc<AppState>>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<ApiKeyPublic>>, ApiError> {
    let (offset, limit) = validate_pagination(page.skip, page.limit)?;
    let keys = state.store().api_keys();

    let count = keys.count().await?;
    let rows = keys.list(offset, limit).await?;

    Ok(Json(Page::new(rows, count)))
}

/// DELETE /api-keys/{id}
/// Revokes by clearing `is_active`; the row is kept.
pub async fn revoke_api_key(
    SuperUser(admin): SuperUser,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Message>, ApiError> {
    let keys = state.store().api_keys();

    let key = keys
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("API key not found"))?;
    let key = keys.deactivate(key).await?;

    tracing::info!(api_key_id = %key.id, revoked_by = %admin.id, "API key revoked");
    Ok(Json(Message::new("API key revoked successfully")))
}
